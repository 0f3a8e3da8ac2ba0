//! The fetch orchestrator: candidate groups in, final outcomes out.
//!
//! Candidates sharing a local destination are alternatives for one logical
//! file and are worked strictly in priority order; distinct logical files run
//! concurrently on a bounded pool and never affect one another. A group ends
//! in exactly one `Success` or `FatalSkip`.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use resolver::CandidateLocator;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::fetcher::{FetchStatus, Fetcher};
use crate::outcome::{FetchOutcome, OutcomeRecord};
use crate::pipeline::{run_pipeline, ToolPaths};

/// Retry, concurrency and tool settings for one run.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Retries per candidate after the first attempt.
    pub max_retries: u32,
    /// Initial retry delay, doubled per retry.
    pub initial_retry_delay: Duration,
    pub max_retry_delay: Duration,
    /// Logical-file groups in flight at once.
    pub max_concurrent: usize,
    pub tools: ToolPaths,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_retry_delay: Duration::from_secs(2),
            max_retry_delay: Duration::from_secs(60),
            max_concurrent: 4,
            tools: ToolPaths::default(),
        }
    }
}

pub struct Orchestrator {
    config: RetrievalConfig,
}

impl Orchestrator {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    /// Work every logical file in `candidates` to a final outcome.
    ///
    /// Records come back in first-seen group order regardless of completion
    /// order, one per logical file.
    pub async fn run(
        &self,
        candidates: Vec<CandidateLocator>,
        fetcher: &dyn Fetcher,
    ) -> Vec<OutcomeRecord> {
        let groups = group_by_destination(candidates);
        info!(groups = groups.len(), "starting retrieval run");

        let mut indexed: Vec<(usize, OutcomeRecord)> = stream::iter(groups.into_iter().enumerate())
            .map(|(i, group)| async move { (i, self.run_group(group, fetcher).await) })
            .buffer_unordered(self.config.max_concurrent)
            .collect()
            .await;
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, record)| record).collect()
    }

    /// Work one logical file: candidates in order, bounded retries on
    /// transient failures, pipeline on the first successful transfer.
    #[instrument(skip_all, fields(file = %group[0].local_path.display()))]
    async fn run_group(&self, group: Vec<CandidateLocator>, fetcher: &dyn Fetcher) -> OutcomeRecord {
        let first = &group[0];
        let local_path = first.local_path.clone();
        let logical_file = file_name_of(&local_path);

        if local_path.exists() {
            info!("destination already present, skipping");
            return self.record(first, &logical_file, FetchOutcome::Success { local_path });
        }
        if let Some(parent) = local_path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                return self.record(
                    first,
                    &logical_file,
                    FetchOutcome::FatalSkip {
                        reason: format!("cannot create {}: {e}", parent.display()),
                    },
                );
            }
        }

        let temp = temp_path(&local_path);
        for candidate in &group {
            match self.try_candidate(candidate, &temp, fetcher).await {
                FetchOutcome::Success { .. } => match self.finish(candidate, &temp, &local_path).await {
                    Ok(()) => {
                        info!(url = %candidate.url(), "retrieved");
                        return self.record(
                            candidate,
                            &logical_file,
                            FetchOutcome::Success { local_path },
                        );
                    }
                    Err(reason) => {
                        warn!(url = %candidate.url(), reason = %reason, "post-processing failed");
                        return self.record(candidate, &logical_file, FetchOutcome::FatalSkip { reason });
                    }
                },
                FetchOutcome::NotFoundTryNext => {
                    debug!(url = %candidate.url(), "not on this archive, trying next candidate");
                }
                outcome => {
                    debug!(url = %candidate.url(), ?outcome, "candidate exhausted");
                }
            }
        }

        warn!(candidates = group.len(), "all candidates exhausted");
        self.record(
            first,
            &logical_file,
            FetchOutcome::FatalSkip {
                reason: "all candidates exhausted".to_string(),
            },
        )
    }

    /// Fetch one candidate with retries. Returns `Success` (file is at
    /// `temp`), `NotFoundTryNext`, or `TransientFailureRetry` once retries
    /// are spent.
    async fn try_candidate(
        &self,
        candidate: &CandidateLocator,
        temp: &Path,
        fetcher: &dyn Fetcher,
    ) -> FetchOutcome {
        let url = candidate.url();
        let mut delay = self.config.initial_retry_delay;
        for attempt in 0..=self.config.max_retries {
            match fetcher.fetch(&url, temp).await {
                FetchStatus::Success => {
                    return FetchOutcome::Success {
                        local_path: temp.to_path_buf(),
                    }
                }
                FetchStatus::NotFound => return FetchOutcome::NotFoundTryNext,
                FetchStatus::TransientFailure(reason) => {
                    if attempt == self.config.max_retries {
                        warn!(url = %url, reason = %reason, "retries exhausted");
                        return FetchOutcome::TransientFailureRetry;
                    }
                    warn!(
                        url = %url,
                        reason = %reason,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = std::cmp::min(delay * 2, self.config.max_retry_delay);
                }
            }
        }
        FetchOutcome::TransientFailureRetry
    }

    /// Pipeline the fetched artifact and move the result into place.
    async fn finish(
        &self,
        candidate: &CandidateLocator,
        temp: &Path,
        local_path: &Path,
    ) -> Result<(), String> {
        let processed = match run_pipeline(
            temp,
            candidate.compression,
            candidate.conversion,
            &self.config.tools,
        )
        .await
        {
            Ok(p) => p,
            // The raw artifact stays behind for inspection; nothing is ever
            // half-written under the canonical name.
            Err(e) => return Err(e.to_string()),
        };

        if let Err(e) = fs::rename(&processed, local_path).await {
            fs::remove_file(&processed).await.ok();
            fs::remove_file(temp).await.ok();
            return Err(format!("cannot move into {}: {e}", local_path.display()));
        }
        if processed != temp {
            fs::remove_file(temp).await.ok();
        }
        Ok(())
    }

    fn record(
        &self,
        candidate: &CandidateLocator,
        logical_file: &str,
        outcome: FetchOutcome,
    ) -> OutcomeRecord {
        OutcomeRecord::new(
            logical_file,
            candidate.kind,
            candidate.agency.clone(),
            &candidate.epoch,
            outcome,
        )
    }
}

/// Split candidates into logical-file groups, preserving both first-seen
/// group order and in-group priority order.
fn group_by_destination(candidates: Vec<CandidateLocator>) -> Vec<Vec<CandidateLocator>> {
    let mut order: Vec<PathBuf> = Vec::new();
    let mut groups: HashMap<PathBuf, Vec<CandidateLocator>> = HashMap::new();
    for c in candidates {
        let key = c.local_path.clone();
        let bucket = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        bucket.push(c);
    }
    let mut out = Vec::with_capacity(order.len());
    for key in order {
        if let Some(mut group) = groups.remove(&key) {
            group.sort_by_key(|c| c.priority_rank);
            out.push(group);
        }
    }
    out
}

fn temp_path(local: &Path) -> PathBuf {
    let mut os: OsString = local.as_os_str().to_os_string();
    os.push(".fetching");
    PathBuf::from(os)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
