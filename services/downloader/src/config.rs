//! YAML configuration for a download run.
//!
//! The file supplies one entry per enabled product plus the global settings:
//! where files land, the day window, the preferred archive, concurrency and
//! retry limits, external tool locations, and the outcome log. Everything
//! wrong with it is a configuration error and aborts before any transfer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use gnss_common::time::Epoch;
use resolver::{ArchiveId, ProductRequest};
use retrieval::{LogMode, RetrievalConfig, ToolPaths};
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root of the local product tree (obs/, nav/, orb/, ...).
    pub download_dir: PathBuf,
    pub start: StartTime,
    /// When set, overrides `day_count` on every product entry.
    #[serde(default)]
    pub day_count: Option<u32>,
    #[serde(default = "default_archive")]
    pub archive: ArchiveId,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Also fetch the day before and after for orbit/clock/EOP products, so
    /// consumers have overlapping arcs at day boundaries.
    #[serde(default)]
    pub minus_add_1day: bool,
    /// Master station list used when a product's roster says `all`.
    #[serde(default)]
    pub site_list: Option<PathBuf>,
    #[serde(default)]
    pub log: Option<LogConfig>,
    #[serde(default)]
    pub tools: ToolsConfig,
    pub products: Vec<ProductRequest>,
}

/// Start of the day window, in either spelling.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StartTime {
    Civil { date: String },
    YearDoy { year: i32, doy: u32 },
}

impl StartTime {
    pub fn epoch(&self) -> Result<Epoch> {
        match self {
            StartTime::Civil { date } => {
                let mut parts = date.split('-');
                let (y, m, d) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
                    (Some(y), Some(m), Some(d), None) => (y, m, d),
                    _ => bail!("start date {date:?} is not YYYY-MM-DD"),
                };
                let year: i32 = y.parse().with_context(|| format!("bad year in {date:?}"))?;
                let month: u32 = m.parse().with_context(|| format!("bad month in {date:?}"))?;
                let day: u32 = d.parse().with_context(|| format!("bad day in {date:?}"))?;
                Epoch::from_civil(year, month, day, 0)
                    .with_context(|| format!("start date {date:?} out of range"))
            }
            StartTime::YearDoy { year, doy } => Epoch::from_year_doy(*year, *doy)
                .with_context(|| format!("start {year}/{doy} out of range")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub file: PathBuf,
    #[serde(default = "default_log_mode")]
    pub mode: LogMode,
}

/// External tool locations; bare names resolve through PATH.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_uncompress")]
    pub uncompress: PathBuf,
    #[serde(default = "default_crx2rnx")]
    pub crx2rnx: PathBuf,
    #[serde(default = "default_curl")]
    pub curl: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            uncompress: default_uncompress(),
            crx2rnx: default_crx2rnx(),
            curl: default_curl(),
        }
    }
}

fn default_archive() -> ArchiveId {
    ArchiveId::Cddis
}

fn default_max_concurrent() -> usize {
    4
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    600
}

fn default_log_mode() -> LogMode {
    LogMode::Append
}

fn default_uncompress() -> PathBuf {
    PathBuf::from("gzip")
}

fn default_crx2rnx() -> PathBuf {
    PathBuf::from("crx2rnx")
}

fn default_curl() -> PathBuf {
    PathBuf::from("curl")
}

impl Config {
    /// Load and validate a run configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        debug!(path = %path.display(), products = config.products.len(), "Loaded configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.products.is_empty() {
            bail!("configuration enables no products");
        }
        if self.max_concurrent == 0 {
            bail!("max_concurrent must be positive");
        }
        if self.day_count == Some(0) {
            bail!("day_count must be positive");
        }
        for product in &self.products {
            product
                .validate()
                .with_context(|| format!("invalid product entry for {}", product.kind))?;
        }
        self.start.epoch()?;
        Ok(())
    }

    /// Product requests with the global day-count override applied.
    pub fn requests(&self) -> Vec<ProductRequest> {
        let mut requests = self.products.clone();
        if let Some(days) = self.day_count {
            for r in &mut requests {
                r.day_count = days;
            }
        }
        for r in &requests {
            info!(kind = %r.kind, agencies = ?r.agencies, days = r.day_count, "enabled product");
        }
        requests
    }

    pub fn retrieval_config(&self) -> RetrievalConfig {
        RetrievalConfig {
            max_retries: self.max_retries,
            max_concurrent: self.max_concurrent,
            tools: ToolPaths {
                uncompress: self.tools.uncompress.clone(),
                crx2rnx: self.tools.crx2rnx.clone(),
            },
            ..RetrievalConfig::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
