//! Post-download processing: generic decompression, then Hatanaka conversion.
//!
//! Gzip is handled in-process with flate2. Legacy UNIX `.Z` compress and the
//! compact RINEX converter have no pure-Rust implementation worth carrying,
//! so both run as external tools with stdin/stdout redirection; their paths
//! come from configuration.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use flate2::read::GzDecoder;
use resolver::{Compression, Conversion};
use tokio::process::Command;
use tracing::debug;

/// Absolute (or PATH-resolved) locations of the external tools.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    /// Decompressor for `.Z` archives, invoked as `<tool> -dc < in > out`.
    pub uncompress: PathBuf,
    /// Compact RINEX converter, invoked as `<tool> - < in > out`.
    pub crx2rnx: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            uncompress: PathBuf::from("gzip"),
            crx2rnx: PathBuf::from("crx2rnx"),
        }
    }
}

/// A stage failure. The pre-stage artifact is left on disk untouched so the
/// operator can inspect what the archive actually delivered.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Decompression of {path} failed: {reason}")]
    Decompress { path: PathBuf, reason: String },
    #[error("Hatanaka conversion of {path} failed: {reason}")]
    Convert { path: PathBuf, reason: String },
}

/// Run both stages over a freshly fetched file and return the path of the
/// final artifact. Each stage is a no-op when its kind is `None`; the input
/// file itself is never deleted here.
pub async fn run_pipeline(
    raw: &Path,
    compression: Compression,
    conversion: Conversion,
    tools: &ToolPaths,
) -> Result<PathBuf, PipelineError> {
    let decompressed = match compression {
        Compression::None => raw.to_path_buf(),
        Compression::Gzip => gunzip(raw).await?,
        Compression::UnixCompress => {
            filter_through(&tools.uncompress, &["-dc"], raw, &stage_path(raw, ".dec"), Stage::Decompress).await?
        }
    };

    let converted = match conversion {
        Conversion::None => decompressed.clone(),
        Conversion::Hatanaka => {
            filter_through(&tools.crx2rnx, &["-"], &decompressed, &stage_path(&decompressed, ".rnx"), Stage::Convert).await?
        }
    };

    // Only the final artifact survives; the intermediate of a two-stage run
    // is removed once the second stage has succeeded.
    if converted != decompressed && decompressed != raw {
        tokio::fs::remove_file(&decompressed).await.ok();
    }
    debug!(raw = %raw.display(), out = %converted.display(), "pipeline complete");
    Ok(converted)
}

enum Stage {
    Decompress,
    Convert,
}

impl Stage {
    fn error(&self, path: &Path, reason: String) -> PipelineError {
        match self {
            Stage::Decompress => PipelineError::Decompress {
                path: path.to_path_buf(),
                reason,
            },
            Stage::Convert => PipelineError::Convert {
                path: path.to_path_buf(),
                reason,
            },
        }
    }
}

/// Sibling path with `suffix` appended to the full file name.
fn stage_path(input: &Path, suffix: &str) -> PathBuf {
    let mut os = input.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// In-process gzip decompression on the blocking pool.
async fn gunzip(raw: &Path) -> Result<PathBuf, PipelineError> {
    let input = raw.to_path_buf();
    let output = stage_path(raw, ".dec");
    let out_clone = output.clone();
    let result = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let file = std::fs::File::open(&input)?;
        let mut decoder = GzDecoder::new(std::io::BufReader::new(file));
        let mut out = std::fs::File::create(&out_clone)?;
        std::io::copy(&mut decoder, &mut out)?;
        Ok(())
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(output),
        Ok(Err(e)) => {
            tokio::fs::remove_file(&output).await.ok();
            Err(PipelineError::Decompress {
                path: raw.to_path_buf(),
                reason: e.to_string(),
            })
        }
        Err(e) => Err(PipelineError::Decompress {
            path: raw.to_path_buf(),
            reason: format!("blocking task failed: {e}"),
        }),
    }
}

/// Run an external filter tool with stdin from `input` and stdout to
/// `output`. Non-zero exit removes the partial output and fails the stage.
async fn filter_through(
    tool: &Path,
    args: &[&str],
    input: &Path,
    output: &Path,
    stage: Stage,
) -> Result<PathBuf, PipelineError> {
    let stdin = std::fs::File::open(input)
        .map_err(|e| stage.error(input, format!("cannot open input: {e}")))?;
    let stdout = std::fs::File::create(output)
        .map_err(|e| stage.error(input, format!("cannot create output: {e}")))?;

    let result = Command::new(tool)
        .args(args)
        .stdin(Stdio::from(stdin))
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::piped())
        .output()
        .await;

    let out = match result {
        Ok(o) => o,
        Err(e) => {
            tokio::fs::remove_file(output).await.ok();
            return Err(stage.error(input, format!("cannot run {}: {e}", tool.display())));
        }
    };
    if !out.status.success() {
        tokio::fs::remove_file(output).await.ok();
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(stage.error(
            input,
            format!("{} exited {}: {}", tool.display(), out.status, stderr.trim()),
        ));
    }
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const RINEX_SAMPLE: &[u8] = b"     3.04           OBSERVATION DATA    M\n";

    #[test]
    fn test_stage_path_appends_full_suffix() {
        assert_eq!(
            stage_path(Path::new("/d/abmf0450.21d.Z.fetching"), ".dec"),
            PathBuf::from("/d/abmf0450.21d.Z.fetching.dec")
        );
    }

    #[tokio::test]
    async fn test_no_stages_is_identity() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("igs20.atx");
        std::fs::write(&raw, b"ANTEX").unwrap();

        let out = run_pipeline(&raw, Compression::None, Conversion::None, &ToolPaths::default())
            .await
            .unwrap();
        assert_eq!(out, raw);
        assert_eq!(std::fs::read(&raw).unwrap(), b"ANTEX");
    }

    #[tokio::test]
    async fn test_gzip_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("brdc.rnx.gz.fetching");
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(RINEX_SAMPLE).unwrap();
        std::fs::write(&raw, encoder.finish().unwrap()).unwrap();

        let out = run_pipeline(&raw, Compression::Gzip, Conversion::None, &ToolPaths::default())
            .await
            .unwrap();
        assert_ne!(out, raw);
        assert_eq!(std::fs::read(&out).unwrap(), RINEX_SAMPLE);
        // The fetched artifact is the caller's to clean up.
        assert!(raw.exists());
    }

    #[tokio::test]
    async fn test_truncated_gzip_fails_and_keeps_input() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("bad.gz");
        std::fs::write(&raw, b"\x1f\x8b\x08 not really gzip").unwrap();

        let err = run_pipeline(&raw, Compression::Gzip, Conversion::None, &ToolPaths::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decompress { .. }));
        assert!(raw.exists());
        assert!(!stage_path(&raw, ".dec").exists());
    }

    #[tokio::test]
    async fn test_missing_tool_names_the_stage() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("file.Z");
        std::fs::write(&raw, b"compressed").unwrap();
        let tools = ToolPaths {
            uncompress: dir.path().join("no-such-tool"),
            crx2rnx: PathBuf::from("crx2rnx"),
        };

        let err = run_pipeline(&raw, Compression::UnixCompress, Conversion::None, &tools)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decompress { .. }));
        assert!(raw.exists());
    }
}
