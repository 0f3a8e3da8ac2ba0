//! The transfer seam: one URL to one local file.
//!
//! Orchestration code only ever talks to the [`Fetcher`] trait, so tests can
//! script archive behavior without a network. The production implementation
//! streams HTTP(S) bodies through reqwest and delegates FTP archives to an
//! external curl, which the IGS mirrors still require.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// What one transfer attempt produced.
///
/// `NotFound` is authoritative (the archive answered and does not carry the
/// file) and moves the caller to the next candidate; `TransientFailure` is
/// retryable on the same candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// The body was written to the destination path in full.
    Success,
    /// The archive definitively does not have this file.
    NotFound,
    /// Timeout, connection failure, server error; worth retrying.
    TransientFailure(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Transfer `url` into `dest`, overwriting any previous content.
    /// Failures are statuses, never panics.
    async fn fetch(&self, url: &str, dest: &Path) -> FetchStatus;
}

/// Production fetcher: reqwest for HTTP(S), external curl for FTP.
pub struct HttpFetcher {
    client: Client,
    curl_path: PathBuf,
    request_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(
        request_timeout: Duration,
        curl_path: impl Into<PathBuf>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self {
            client,
            curl_path: curl_path.into(),
            request_timeout,
        })
    }

    async fn fetch_http(&self, url: &str, dest: &Path) -> FetchStatus {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return FetchStatus::TransientFailure(format!("request failed: {e}")),
        };

        match classify_http(response.status()) {
            FetchStatus::Success => {}
            other => return other,
        }

        let mut file = match fs::File::create(dest).await {
            Ok(f) => f,
            Err(e) => {
                return FetchStatus::TransientFailure(format!(
                    "cannot open {}: {e}",
                    dest.display()
                ))
            }
        };
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    fs::remove_file(dest).await.ok();
                    return FetchStatus::TransientFailure(format!("body read failed: {e}"));
                }
            };
            if let Err(e) = file.write_all(&chunk).await {
                fs::remove_file(dest).await.ok();
                return FetchStatus::TransientFailure(format!("write failed: {e}"));
            }
        }
        if let Err(e) = file.flush().await {
            fs::remove_file(dest).await.ok();
            return FetchStatus::TransientFailure(format!("flush failed: {e}"));
        }
        debug!(url = %url, dest = %dest.display(), "http transfer complete");
        FetchStatus::Success
    }

    async fn fetch_ftp(&self, url: &str, dest: &Path) -> FetchStatus {
        let output = Command::new(&self.curl_path)
            .args(curl_args(url, dest, self.request_timeout))
            .stdin(Stdio::null())
            .output()
            .await;
        let output = match output {
            Ok(o) => o,
            Err(e) => {
                return FetchStatus::TransientFailure(format!(
                    "cannot run {}: {e}",
                    self.curl_path.display()
                ))
            }
        };
        let status = classify_curl_exit(output.status.code());
        if status != FetchStatus::Success {
            fs::remove_file(dest).await.ok();
            if let FetchStatus::TransientFailure(_) = status {
                warn!(
                    url = %url,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "ftp transfer failed"
                );
            }
        }
        status
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> FetchStatus {
        if url.starts_with("ftp://") {
            self.fetch_ftp(url, dest).await
        } else {
            self.fetch_http(url, dest).await
        }
    }
}

/// Build the curl invocation for an FTP transfer. `--max-time` bounds the
/// whole transfer with the same timeout the HTTP client uses; on expiry curl
/// exits 28, which classifies as a transient failure.
fn curl_args(url: &str, dest: &Path, timeout: Duration) -> Vec<std::ffi::OsString> {
    vec![
        "-sS".into(),
        "--fail".into(),
        "--max-time".into(),
        timeout.as_secs().max(1).to_string().into(),
        "-o".into(),
        dest.as_os_str().to_os_string(),
        url.into(),
    ]
}

/// Map an HTTP status to a transfer status. Only 404/410 count as
/// authoritative absence; everything else non-2xx is retryable.
fn classify_http(status: StatusCode) -> FetchStatus {
    if status.is_success() {
        FetchStatus::Success
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        FetchStatus::NotFound
    } else {
        FetchStatus::TransientFailure(format!("http status {status}"))
    }
}

/// Map a curl exit code. 9 (denied/absent on server), 19 (RETR failed) and
/// 78 (remote file not found) are authoritative absence.
fn classify_curl_exit(code: Option<i32>) -> FetchStatus {
    match code {
        Some(0) => FetchStatus::Success,
        Some(9) | Some(19) | Some(78) => FetchStatus::NotFound,
        Some(c) => FetchStatus::TransientFailure(format!("curl exit code {c}")),
        None => FetchStatus::TransientFailure("curl killed by signal".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classification() {
        assert_eq!(classify_http(StatusCode::OK), FetchStatus::Success);
        assert_eq!(classify_http(StatusCode::NOT_FOUND), FetchStatus::NotFound);
        assert_eq!(classify_http(StatusCode::GONE), FetchStatus::NotFound);
        assert!(matches!(
            classify_http(StatusCode::INTERNAL_SERVER_ERROR),
            FetchStatus::TransientFailure(_)
        ));
        assert!(matches!(
            classify_http(StatusCode::FORBIDDEN),
            FetchStatus::TransientFailure(_)
        ));
    }

    #[test]
    fn test_curl_exit_classification() {
        assert_eq!(classify_curl_exit(Some(0)), FetchStatus::Success);
        assert_eq!(classify_curl_exit(Some(78)), FetchStatus::NotFound);
        assert_eq!(classify_curl_exit(Some(19)), FetchStatus::NotFound);
        assert!(matches!(
            classify_curl_exit(Some(7)),
            FetchStatus::TransientFailure(_)
        ));
        assert!(matches!(
            classify_curl_exit(None),
            FetchStatus::TransientFailure(_)
        ));
    }

    #[test]
    fn test_ftp_transfers_are_time_bounded() {
        let args = curl_args(
            "ftp://igs.ign.fr/pub/igs/data/2021/045/abmf0450.21d.Z",
            Path::new("/tmp/abmf0450.21d.Z.fetching"),
            Duration::from_secs(600),
        );
        let pos = args
            .iter()
            .position(|a| a == "--max-time")
            .expect("curl must carry a transfer deadline");
        assert_eq!(args[pos + 1], "600");
        // A stalled mirror maps to a retryable status, not a hung worker.
        assert!(matches!(
            classify_curl_exit(Some(28)),
            FetchStatus::TransientFailure(_)
        ));
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let args = curl_args("ftp://example.org/f", Path::new("/tmp/f"), Duration::ZERO);
        let pos = args.iter().position(|a| a == "--max-time").unwrap();
        assert_eq!(args[pos + 1], "1");
    }
}
