//! Site rosters for observation-type products.
//!
//! A roster is a line-oriented list of station identifiers (one per line,
//! `#` comments allowed). Entries may be 4-character short ids ("abmf") or
//! 9-character RINEX long names ("ABMF00GLP"); both spellings are kept so the
//! naming schemes can render either convention.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Failed to read site list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Site list {0} contains no sites")]
    Empty(PathBuf),
}

/// How a request names its sites: everything we know about, or an explicit
/// site-list file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RosterSpec {
    All(AllSentinel),
    List(PathBuf),
}

/// Serde helper so the YAML spelling `all` maps to [`RosterSpec::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllSentinel {
    #[serde(rename = "all")]
    All,
}

impl RosterSpec {
    /// Serde default: every known site.
    pub fn default_all() -> Self {
        RosterSpec::All(AllSentinel::All)
    }

    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("all") {
            RosterSpec::All(AllSentinel::All)
        } else {
            RosterSpec::List(PathBuf::from(s))
        }
    }
}

/// One station entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    raw: String,
}

impl Site {
    pub fn new(token: &str) -> Self {
        Self {
            raw: token.trim().to_string(),
        }
    }

    /// 4-character lowercase id used by short-name (RINEX 2) conventions.
    pub fn short_id(&self) -> String {
        self.raw.chars().take(4).collect::<String>().to_lowercase()
    }

    /// 9-character uppercase long name used by RINEX 3 conventions. Entries
    /// shorter than 9 characters are padded with the "00XXX" monument/country
    /// placeholder, matching what archives accept for unlisted receivers.
    pub fn long_name(&self) -> String {
        let upper = self.raw.to_uppercase();
        if upper.len() >= 9 {
            upper.chars().take(9).collect()
        } else {
            format!("{}00XXX", self.short_id().to_uppercase())
        }
    }
}

/// The set of sites a request applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    sites: Vec<Site>,
}

impl Roster {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    /// Load a `site.list` style file: one site per line, blank lines and
    /// `#`-prefixed comments ignored.
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let content = std::fs::read_to_string(path).map_err(|source| RosterError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let sites: Vec<Site> = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(Site::new)
            .collect();
        if sites.is_empty() {
            return Err(RosterError::Empty(path.to_path_buf()));
        }
        Ok(Self { sites })
    }

    /// Built-in IGS core subset used when a request says `all` and no master
    /// station list is configured.
    pub fn core() -> Self {
        const CORE: &[&str] = &[
            "ABMF00GLP",
            "ALGO00CAN",
            "BRUX00BEL",
            "CAS100ATA",
            "FAA100PYF",
            "GODE00USA",
            "HARB00ZAF",
            "KIRU00SWE",
            "KOKB00USA",
            "MGUE00ARG",
            "ONSA00SWE",
            "TOW200AUS",
            "WUH200CHN",
            "ZIM200CHE",
        ];
        Self {
            sites: CORE.iter().map(|s| Site::new(s)).collect(),
        }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_skips_comments_and_blanks() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# IGS subset").unwrap();
        writeln!(f, "abmf").unwrap();
        writeln!(f).unwrap();
        writeln!(f, "  ZIM200CHE  ").unwrap();
        let roster = Roster::load(f.path()).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.sites()[0].short_id(), "abmf");
        assert_eq!(roster.sites()[1].long_name(), "ZIM200CHE");
    }

    #[test]
    fn test_empty_list_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "# nothing here").unwrap();
        assert!(matches!(Roster::load(f.path()), Err(RosterError::Empty(_))));
    }

    #[test]
    fn test_site_name_conventions() {
        let long = Site::new("ABMF00GLP");
        assert_eq!(long.short_id(), "abmf");
        assert_eq!(long.long_name(), "ABMF00GLP");

        let short = Site::new("algo");
        assert_eq!(short.short_id(), "algo");
        assert_eq!(short.long_name(), "ALGO00XXX");
    }

    #[test]
    fn test_roster_spec_sentinel() {
        assert_eq!(RosterSpec::parse("all"), RosterSpec::All(AllSentinel::All));
        assert_eq!(
            RosterSpec::parse("/data/site.list"),
            RosterSpec::List(PathBuf::from("/data/site.list"))
        );
    }
}
