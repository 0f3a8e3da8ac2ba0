//! The per-day download loop.
//!
//! One "day batch" resolves every enabled product for one calendar day,
//! creates the local product subdirectories, and hands the combined candidate
//! list to the orchestrator. Ctrl-C lands between batches: the current one
//! finishes, later ones are dropped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gnss_common::sites::{Roster, RosterSpec};
use gnss_common::time::Epoch;
use resolver::{
    resolve, ArchiveRegistry, CandidateLocator, ProductKind, ProductRequest, SchemeTable,
};
use retrieval::{Fetcher, Orchestrator, OutcomeRecord, OutcomeSink, RetrievalConfig};
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::config::Config;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub files: usize,
    pub succeeded: usize,
    pub skipped: usize,
}

impl RunSummary {
    fn tally(&mut self, records: &[OutcomeRecord]) {
        for record in records {
            self.files += 1;
            if record.outcome.is_success() {
                self.succeeded += 1;
            } else {
                self.skipped += 1;
            }
        }
    }
}

pub struct Runner {
    download_dir: PathBuf,
    start: Epoch,
    minus_add_1day: bool,
    requests: Vec<ProductRequest>,
    rosters: Vec<Roster>,
    table: SchemeTable,
    archives: ArchiveRegistry,
    orchestrator: Orchestrator,
}

impl Runner {
    /// Build a runner from validated configuration. Site lists are loaded
    /// here so a missing file aborts before any transfer starts.
    pub fn from_config(config: &Config) -> Result<Self> {
        let requests = config.requests();
        let mut rosters = Vec::with_capacity(requests.len());
        for request in &requests {
            rosters.push(load_roster(request, config.site_list.as_deref())?);
        }
        let retrieval: RetrievalConfig = config.retrieval_config();
        Ok(Self {
            download_dir: config.download_dir.clone(),
            start: config.start.epoch()?,
            minus_add_1day: config.minus_add_1day,
            requests,
            rosters,
            table: SchemeTable::standard(),
            archives: ArchiveRegistry::new(config.archive),
            orchestrator: Orchestrator::new(retrieval),
        })
    }

    /// Run every day batch to completion, or until shutdown is requested.
    pub async fn run(
        &self,
        fetcher: &dyn Fetcher,
        mut sink: Option<&mut dyn OutcomeSink>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let day_batches = self.requests.iter().map(|r| r.day_count).max().unwrap_or(0);

        for offset in 0..day_batches {
            if shutdown_requested(shutdown) {
                info!(completed_batches = offset, "shutdown requested, stopping");
                break;
            }
            let day = self.start.add_days(offset as i64);
            let candidates = self.resolve_day_batch(offset, &day).await?;
            let records = self.orchestrator.run(candidates, fetcher).await;
            summary.tally(&records);
            if let Some(ref mut s) = sink {
                for record in &records {
                    s.record(record).context("Failed to write outcome log")?;
                }
                s.flush().context("Failed to flush outcome log")?;
            }
        }
        Ok(summary)
    }

    /// Resolve all requests still active at `offset` for one day, bootstrap
    /// their local directories, and return the combined candidate list.
    #[instrument(skip_all, fields(year = day.year(), doy = day.doy()))]
    async fn resolve_day_batch(&self, offset: u32, day: &Epoch) -> Result<Vec<CandidateLocator>> {
        let mut candidates = Vec::new();
        for (request, roster) in self.requests.iter().zip(&self.rosters) {
            if offset >= request.day_count {
                continue;
            }
            for epoch in self.fetch_days(request.kind, day) {
                let dir = product_dir(&self.download_dir, request.kind, &epoch);
                tokio::fs::create_dir_all(&dir)
                    .await
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
                let mut resolved = resolve(request, &epoch, roster, &self.table, &self.archives, &dir)
                    .with_context(|| format!("Failed to resolve {} request", request.kind))?;
                candidates.append(&mut resolved);
            }
        }
        info!(candidates = candidates.len(), "day batch resolved");
        Ok(candidates)
    }

    /// The days actually fetched for one request day: just the day itself,
    /// or the bracketing days as well for boundary-sensitive products.
    fn fetch_days(&self, kind: ProductKind, day: &Epoch) -> Vec<Epoch> {
        if self.minus_add_1day && wants_bracketing_days(kind) {
            vec![day.add_days(-1), *day, day.add_days(1)]
        } else {
            vec![*day]
        }
    }
}

fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    use broadcast::error::TryRecvError;
    !matches!(
        shutdown.try_recv(),
        Err(TryRecvError::Empty) | Err(TryRecvError::Closed)
    )
}

fn load_roster(request: &ProductRequest, site_list: Option<&Path>) -> Result<Roster> {
    let roster = match &request.roster {
        RosterSpec::List(path) => Roster::load(path)
            .with_context(|| format!("Failed to load site list for {}", request.kind))?,
        RosterSpec::All(_) => match site_list {
            Some(path) => Roster::load(path).context("Failed to load master site list")?,
            None => Roster::core(),
        },
    };
    Ok(roster)
}

/// Consumers splice orbits, clocks and EOP across midnight; observations and
/// the rest stand alone.
fn wants_bracketing_days(kind: ProductKind) -> bool {
    matches!(kind, ProductKind::Orbit | ProductKind::Clock | ProductKind::Eop)
}

/// Local subdirectory for one product kind and day.
fn product_dir(root: &Path, kind: ProductKind, epoch: &Epoch) -> PathBuf {
    let year = format!("{:04}", epoch.year());
    let doy = format!("{:03}", epoch.doy());
    match kind {
        ProductKind::Observation => root.join("obs").join(year).join(doy),
        ProductKind::Navigation => root.join("nav").join(year),
        ProductKind::Orbit
        | ProductKind::Clock
        | ProductKind::Eop
        | ProductKind::Attitude
        | ProductKind::Bias
        | ProductKind::Sinex => root.join("orb").join(year),
        ProductKind::Ionosphere | ProductKind::Roti => root.join("ion").join(year),
        ProductKind::Troposphere => root.join("ztd").join(year).join(doy),
        ProductKind::Antex => root.join("tbl"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flate2::write::GzEncoder;
    use retrieval::{FetchStatus, JsonlOutcomeSink, LogMode};
    use std::io::Write;
    use std::sync::Mutex;

    /// Fetcher that answers every URL with a small gzip body.
    struct GzipBodyFetcher {
        urls: Mutex<Vec<String>>,
    }

    impl GzipBodyFetcher {
        fn new() -> Self {
            Self {
                urls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Fetcher for GzipBodyFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> FetchStatus {
            self.urls.lock().unwrap().push(url.to_string());
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(b"broadcast ephemeris").unwrap();
            std::fs::write(dest, encoder.finish().unwrap()).unwrap();
            FetchStatus::Success
        }
    }

    fn config(download_dir: &Path, extra: &str) -> Config {
        let yaml = format!(
            r#"
download_dir: {}
start:
  year: 2021
  doy: 45
{extra}
products:
  - kind: navigation
    agencies: ["igs"]
    cadence: daily
    day_count: 2
"#,
            download_dir.display()
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    #[tokio::test]
    async fn test_two_day_navigation_run() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), "");
        let runner = Runner::from_config(&cfg).unwrap();
        let fetcher = GzipBodyFetcher::new();
        let log_path = dir.path().join("outcomes.jsonl");
        let mut sink = JsonlOutcomeSink::open(&log_path, LogMode::Append).unwrap();

        let (_tx, mut rx) = broadcast::channel(1);
        let summary = runner
            .run(&fetcher, Some(&mut sink), &mut rx)
            .await
            .unwrap();

        // One logical file per day; the preferred long name wins first try.
        assert_eq!(summary, RunSummary { files: 2, succeeded: 2, skipped: 0 });
        for (doy, name) in [(45, "BRDC00IGS_R_20210450000_01D_MN.rnx"), (46, "BRDC00IGS_R_20210460000_01D_MN.rnx")] {
            let path = dir.path().join("nav/2021").join(name);
            assert!(path.exists(), "missing {} for doy {doy}", path.display());
        }
        assert_eq!(fetcher.urls.lock().unwrap().len(), 2);
        let log = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(log.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_between_batches() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), "");
        let runner = Runner::from_config(&cfg).unwrap();
        let fetcher = GzipBodyFetcher::new();

        let (tx, mut rx) = broadcast::channel(1);
        tx.send(()).unwrap();
        let summary = runner.run(&fetcher, None, &mut rx).await.unwrap();
        assert_eq!(summary.files, 0);
        assert!(fetcher.urls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_product_directory_layout() {
        let epoch = Epoch::from_year_doy(2021, 45).unwrap();
        let root = Path::new("/data");
        assert_eq!(
            product_dir(root, ProductKind::Observation, &epoch),
            PathBuf::from("/data/obs/2021/045")
        );
        assert_eq!(
            product_dir(root, ProductKind::Navigation, &epoch),
            PathBuf::from("/data/nav/2021")
        );
        assert_eq!(
            product_dir(root, ProductKind::Clock, &epoch),
            PathBuf::from("/data/orb/2021")
        );
        assert_eq!(
            product_dir(root, ProductKind::Troposphere, &epoch),
            PathBuf::from("/data/ztd/2021/045")
        );
        assert_eq!(product_dir(root, ProductKind::Antex, &epoch), PathBuf::from("/data/tbl"));
    }

    #[test]
    fn test_bracketing_days_only_for_orbit_class_products() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), "minus_add_1day: true");
        let runner = Runner::from_config(&cfg).unwrap();
        let day = Epoch::from_year_doy(2021, 45).unwrap();

        let days = runner.fetch_days(ProductKind::Orbit, &day);
        assert_eq!(days.iter().map(|e| e.doy()).collect::<Vec<_>>(), vec![44, 45, 46]);
        assert_eq!(runner.fetch_days(ProductKind::Navigation, &day).len(), 1);
        assert_eq!(runner.fetch_days(ProductKind::Observation, &day).len(), 1);
    }
}
