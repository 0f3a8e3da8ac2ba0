//! Product, cadence, and encoding vocabulary shared by the table and resolver.

use serde::{Deserialize, Serialize};

/// The classes of space-geodesy data products this tool retrieves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// RINEX observation files (daily / hourly / high-rate).
    Observation,
    /// Broadcast ephemeris.
    Navigation,
    /// Precise satellite orbits (SP3).
    Orbit,
    /// Precise satellite clocks (CLK).
    Clock,
    /// Earth rotation/orientation parameters.
    Eop,
    /// ORBEX satellite attitude exchange files.
    Attitude,
    /// Differential code / observable-specific signal biases.
    Bias,
    /// Weekly SINEX solutions.
    Sinex,
    /// Global ionosphere maps.
    Ionosphere,
    /// Rate-of-TEC index maps.
    Roti,
    /// Zenith tropospheric delay products.
    Troposphere,
    /// ANTEX antenna phase-center calibrations.
    Antex,
}

impl ProductKind {
    /// Short tag used in log lines and local sub-directory names.
    pub fn tag(&self) -> &'static str {
        match self {
            ProductKind::Observation => "obs",
            ProductKind::Navigation => "nav",
            ProductKind::Orbit => "orb",
            ProductKind::Clock => "clk",
            ProductKind::Eop => "eop",
            ProductKind::Attitude => "obx",
            ProductKind::Bias => "bia",
            ProductKind::Sinex => "snx",
            ProductKind::Ionosphere => "ion",
            ProductKind::Roti => "roti",
            ProductKind::Troposphere => "ztd",
            ProductKind::Antex => "tbl",
        }
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Publication cadence requested for a product.
///
/// The native step of a sub-hourly product is agency knowledge and lives in
/// the scheme table, not here; a request only says "sub-hourly".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceClass {
    Daily,
    Hourly,
    HighRate,
    SubHourly,
}

impl CadenceClass {
    /// Whether this cadence resolves below the day level.
    pub fn intraday(&self) -> bool {
        !matches!(self, CadenceClass::Daily)
    }
}

/// Outer compression layer of a remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    None,
    /// `.gz`, handled in-process.
    Gzip,
    /// Legacy UNIX `.Z`, handled by an external tool.
    UnixCompress,
}

impl Compression {
    /// Filename suffix stripped by the decompression stage.
    pub fn suffix(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => ".gz",
            Compression::UnixCompress => ".Z",
        }
    }
}

/// Domain-specific conversion applied after decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    None,
    /// Hatanaka-compact observation files, restored with `crx2rnx`.
    Hatanaka,
}
