//! Per-file outcomes and the outcome log sink.
//!
//! Every logical file ends in exactly one final outcome, recorded once. The
//! sink is a line-oriented JSON log; opening and closing it belongs to the
//! caller, the orchestration layer only appends.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use gnss_common::time::Epoch;
use resolver::ProductKind;
use serde::{Deserialize, Serialize};

/// Result of working one candidate (or, for `Success`/`FatalSkip`, one whole
/// logical-file group). Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The file is in place, decompressed and converted.
    Success { local_path: PathBuf },
    /// This candidate is authoritatively absent; the next one is tried.
    NotFoundTryNext,
    /// A retryable failure on this candidate.
    TransientFailureRetry,
    /// Every candidate exhausted, or the pipeline failed. The group is
    /// abandoned; other groups are unaffected.
    FatalSkip { reason: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// One outcome log line: which logical file, for whom, and how it ended.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub logical_file: String,
    pub kind: ProductKind,
    pub agency: String,
    pub year: i32,
    pub doy: u32,
    pub hour: u32,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: FetchOutcome,
}

impl OutcomeRecord {
    pub fn new(
        logical_file: impl Into<String>,
        kind: ProductKind,
        agency: impl Into<String>,
        epoch: &Epoch,
        outcome: FetchOutcome,
    ) -> Self {
        Self {
            logical_file: logical_file.into(),
            kind,
            agency: agency.into(),
            year: epoch.year(),
            doy: epoch.doy(),
            hour: epoch.hour(),
            recorded_at: Utc::now(),
            outcome,
        }
    }
}

/// Whether an existing outcome log is truncated or continued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    Overwrite,
    Append,
}

pub trait OutcomeSink {
    fn record(&mut self, record: &OutcomeRecord) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// JSON-lines outcome log backed by a buffered file.
pub struct JsonlOutcomeSink {
    writer: BufWriter<File>,
}

impl JsonlOutcomeSink {
    pub fn open(path: &Path, mode: LogMode) -> io::Result<Self> {
        let file = match mode {
            LogMode::Overwrite => File::create(path)?,
            LogMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
        };
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl OutcomeSink for JsonlOutcomeSink {
    fn record(&mut self, record: &OutcomeRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: FetchOutcome) -> OutcomeRecord {
        let epoch = Epoch::from_year_doy(2021, 45).unwrap();
        OutcomeRecord::new("abmf0450.21o", ProductKind::Observation, "igs", &epoch, outcome)
    }

    #[test]
    fn test_record_serialization() {
        let json = serde_json::to_value(record(FetchOutcome::Success {
            local_path: PathBuf::from("/data/obs/abmf0450.21o"),
        }))
        .unwrap();
        assert_eq!(json["logical_file"], "abmf0450.21o");
        assert_eq!(json["kind"], "observation");
        assert_eq!(json["year"], 2021);
        assert_eq!(json["doy"], 45);
        assert_eq!(json["result"], "success");
        assert_eq!(json["local_path"], "/data/obs/abmf0450.21o");
    }

    #[test]
    fn test_append_mode_keeps_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outcomes.jsonl");

        for _ in 0..2 {
            let mut sink = JsonlOutcomeSink::open(&path, LogMode::Append).unwrap();
            sink.record(&record(FetchOutcome::FatalSkip {
                reason: "all candidates exhausted".to_string(),
            }))
            .unwrap();
            sink.flush().unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        let mut sink = JsonlOutcomeSink::open(&path, LogMode::Overwrite).unwrap();
        sink.record(&record(FetchOutcome::NotFoundTryNext)).unwrap();
        sink.flush().unwrap();
        drop(sink);
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
