//! The path resolver: one request, one day, an ordered candidate list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use gnss_common::cadence::align;
use gnss_common::sites::{Roster, Site};
use gnss_common::time::Epoch;
use tracing::debug;

use crate::archives::ArchiveRegistry;
use crate::products::{CadenceClass, Compression, Conversion, ProductKind};
use crate::request::ProductRequest;
use crate::schemes::{final_local_name, render, Location, NamingScheme, SchemeTable};

/// A resolution failure. Always a configuration problem, surfaced before any
/// network activity; the table must be total for every declared pair.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Unknown product kind: {0}")]
    UnknownProductKind(ProductKind),
    #[error("No naming scheme for product {kind} from agency '{agency}' at cadence {cadence:?}")]
    UnknownAgency {
        kind: ProductKind,
        agency: String,
        cadence: CadenceClass,
    },
}

/// One concrete remote location a logical file may be fetched from.
///
/// Locators sharing `local_path` describe the same logical file; among those,
/// `priority_rank` defines the strict fallback order. Distinct logical files
/// are independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLocator {
    pub remote_host: String,
    pub remote_path: String,
    pub local_path: PathBuf,
    pub compression: Compression,
    pub conversion: Conversion,
    pub priority_rank: u32,
    pub kind: ProductKind,
    pub agency: String,
    pub epoch: Epoch,
}

impl CandidateLocator {
    /// Full remote URL.
    pub fn url(&self) -> String {
        format!("{}{}", self.remote_host, self.remote_path)
    }

    /// The logical-file key: candidates with equal keys are alternatives.
    pub fn logical_key(&self) -> &Path {
        &self.local_path
    }
}

/// Resolve one request for one epoch-day into ranked candidate locators.
///
/// Iteration order is fixed (member agency, publication hour, site, mirror,
/// naming variant), so resolving the same request twice yields an identical
/// sequence. Identical remote paths arising from union requests are emitted
/// once.
pub fn resolve(
    request: &ProductRequest,
    day: &Epoch,
    roster: &Roster,
    table: &SchemeTable,
    archives: &ArchiveRegistry,
    local_dir: &Path,
) -> Result<Vec<CandidateLocator>, ResolveError> {
    // Fail closed on any unknown agency before emitting a single locator.
    let mut entries = Vec::new();
    for agency in request.expanded_agencies() {
        let entry = table.lookup(request.kind, &agency, request.cadence)?;
        entries.push((agency, entry));
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut rank = 0u32;

    for (agency, entry) in &entries {
        // Each agency aligns the requested window to its own native step.
        let hours = align(entry.step_hours, request.start_hour, request.hour_count);
        debug!(
            kind = %request.kind,
            agency = %agency,
            step = entry.step_hours,
            hours = ?hours,
            "aligned publication hours"
        );
        for hour in hours {
            let epoch = day.at_hour(hour);
            let sites: Vec<Option<&Site>> = if entry.per_site {
                roster.sites().iter().map(Some).collect()
            } else {
                vec![None]
            };
            for site in sites {
                // Every variant of this logical file lands under one
                // canonical local name: the preferred scheme's final form.
                let canonical = final_local_name(&entry.schemes[0], &epoch, site);
                let local_path = local_dir.join(&canonical);

                for mirror_slot in archive_slots(&entry.schemes, archives) {
                    for scheme in &entry.schemes {
                        let Some((host, base)) = locate(scheme, mirror_slot, archives) else {
                            continue;
                        };
                        let dir = render(&scheme.dir, &epoch, site);
                        let file = render(&scheme.file, &epoch, site);
                        let remote_path = if dir.is_empty() {
                            format!("{base}/{file}")
                        } else {
                            format!("{base}/{dir}/{file}")
                        };
                        if !seen.insert((host.to_string(), remote_path.clone())) {
                            continue;
                        }
                        out.push(CandidateLocator {
                            remote_host: host.to_string(),
                            remote_path,
                            local_path: local_path.clone(),
                            compression: scheme.compression,
                            conversion: scheme.conversion,
                            priority_rank: rank,
                            kind: request.kind,
                            agency: agency.clone(),
                            epoch,
                        });
                        rank += 1;
                    }
                }
            }
        }
    }

    Ok(out)
}

/// Mirror iteration slots: one per registry mirror when any scheme is
/// mirrored, plus a single slot for fixed-host schemes. Preferred mirror
/// first, so archive preference dominates naming-variant preference.
fn archive_slots(schemes: &[NamingScheme], archives: &ArchiveRegistry) -> Vec<usize> {
    let mirrored = schemes
        .iter()
        .any(|s| !matches!(s.location, Location::Fixed { .. }));
    if mirrored {
        (0..archives.mirrors().len()).collect()
    } else {
        vec![0]
    }
}

/// Host and base path of a scheme for the given mirror slot. Fixed-host
/// schemes only occupy slot 0 so they are not repeated per mirror.
fn locate<'a>(
    scheme: &'a NamingScheme,
    slot: usize,
    archives: &'a ArchiveRegistry,
) -> Option<(&'a str, &'a str)> {
    match scheme.location {
        Location::Fixed { host, base } => (slot == 0).then_some((host, base)),
        Location::MirroredData => {
            let m = &archives.mirrors()[slot];
            Some((m.host, m.data_base))
        }
        Location::MirroredProducts => {
            let m = &archives.mirrors()[slot];
            Some((m.host, m.products_base))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archives::ArchiveId;
    use gnss_common::sites::RosterSpec;

    fn fixtures() -> (SchemeTable, ArchiveRegistry, Epoch) {
        (
            SchemeTable::standard(),
            ArchiveRegistry::new(ArchiveId::Cddis),
            Epoch::from_year_doy(2021, 45).unwrap(),
        )
    }

    fn obs_request(agencies: &[&str], cadence: CadenceClass) -> ProductRequest {
        ProductRequest {
            kind: ProductKind::Observation,
            agencies: agencies.iter().map(|s| s.to_string()).collect(),
            cadence,
            start_hour: 0,
            hour_count: 24,
            roster: RosterSpec::parse("all"),
            day_count: 1,
        }
    }

    fn two_sites() -> Roster {
        Roster::new(vec![Site::new("ABMF00GLP"), Site::new("ZIM200CHE")])
    }

    #[test]
    fn test_daily_obs_one_group_per_site() {
        let (table, archives, day) = fixtures();
        let req = obs_request(&["igs"], CadenceClass::Daily);
        let out = resolve(&req, &day, &two_sites(), &table, &archives, Path::new("/data/obs")).unwrap();

        // One scheme across three mirrors, per site.
        assert_eq!(out.len(), 6);
        let groups: HashSet<_> = out.iter().map(|c| c.local_path.clone()).collect();
        assert_eq!(groups.len(), 2);
        assert!(groups.contains(Path::new("/data/obs/abmf0450.21o")));

        // Within a group, preferred mirror comes first.
        let abmf: Vec<_> = out
            .iter()
            .filter(|c| c.local_path.ends_with("abmf0450.21o"))
            .collect();
        assert_eq!(abmf[0].remote_host, "https://cddis.nasa.gov");
        assert_eq!(
            abmf[0].remote_path,
            "/archive/gnss/data/daily/2021/045/21d/abmf0450.21d.Z"
        );
        assert!(abmf.windows(2).all(|w| w[0].priority_rank < w[1].priority_rank));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let (table, archives, day) = fixtures();
        let req = obs_request(&["igs+mgex"], CadenceClass::Daily);
        let roster = two_sites();
        let a = resolve(&req, &day, &roster, &table, &archives, Path::new("/d")).unwrap();
        let b = resolve(&req, &day, &roster, &table, &archives, Path::new("/d")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_union_is_deduplicated_concatenation() {
        let (table, archives, day) = fixtures();
        let roster = two_sites();
        let dir = Path::new("/d");

        let union = resolve(&obs_request(&["igs+mgex"], CadenceClass::Daily), &day, &roster, &table, &archives, dir).unwrap();
        let igs = resolve(&obs_request(&["igs"], CadenceClass::Daily), &day, &roster, &table, &archives, dir).unwrap();
        let mgex = resolve(&obs_request(&["mgex"], CadenceClass::Daily), &day, &roster, &table, &archives, dir).unwrap();

        let mut paths: HashSet<(String, String)> = HashSet::new();
        for c in igs.iter().chain(mgex.iter()) {
            paths.insert((c.remote_host.clone(), c.remote_path.clone()));
        }
        assert_eq!(union.len(), paths.len());

        // Member order is preserved: all igs locators precede mgex ones.
        let first_mgex = union.iter().position(|c| c.agency == "mgex").unwrap();
        assert!(union[..first_mgex].iter().all(|c| c.agency == "igs"));
    }

    #[test]
    fn test_unknown_agency_fails_closed() {
        let (table, archives, day) = fixtures();
        let req = obs_request(&["igs+bogus"], CadenceClass::Daily);
        let err = resolve(&req, &day, &two_sites(), &table, &archives, Path::new("/d")).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownAgency { .. }));
    }

    #[test]
    fn test_ultra_rapid_aligns_per_agency() {
        let (table, archives, day) = fixtures();
        let req = ProductRequest {
            kind: ProductKind::Orbit,
            agencies: vec!["esa_u+gfz_u".to_string()],
            cadence: CadenceClass::SubHourly,
            start_hour: 2,
            hour_count: 2,
            roster: RosterSpec::parse("all"),
            day_count: 1,
        };
        let out = resolve(&req, &day, &Roster::core(), &table, &archives, Path::new("/d")).unwrap();

        // esa_u (step 6) snaps 02 -> [06, 12]; gfz_u (step 3) -> [03, 06].
        let esa_hours: HashSet<u32> = out.iter().filter(|c| c.agency == "esa_u").map(|c| c.epoch.hour()).collect();
        let gfz_hours: HashSet<u32> = out.iter().filter(|c| c.agency == "gfz_u").map(|c| c.epoch.hour()).collect();
        assert_eq!(esa_hours, HashSet::from([6, 12]));
        assert_eq!(gfz_hours, HashSet::from([3, 6]));
    }

    #[test]
    fn test_variant_fallback_shares_local_destination() {
        let (table, archives, day) = fixtures();
        let req = ProductRequest {
            kind: ProductKind::Navigation,
            agencies: vec!["igs".to_string()],
            cadence: CadenceClass::Daily,
            start_hour: 0,
            hour_count: 24,
            roster: RosterSpec::parse("all"),
            day_count: 1,
        };
        let out = resolve(&req, &day, &Roster::core(), &table, &archives, Path::new("/nav/2021")).unwrap();

        // Long and short conventions over three mirrors, one logical file.
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(|c| c.local_path == out[0].local_path));
        assert_eq!(
            out[0].local_path,
            PathBuf::from("/nav/2021/BRDC00IGS_R_20210450000_01D_MN.rnx")
        );
        // First candidate is the preferred mirror's long name.
        assert!(out[0].remote_path.ends_with("BRDC00IGS_R_20210450000_01D_MN.rnx.gz"));
        assert!(out[1].remote_path.ends_with("brdc0450.21n.Z"));
    }

    #[test]
    fn test_fixed_host_not_repeated_per_mirror() {
        let (table, archives, day) = fixtures();
        let req = ProductRequest {
            kind: ProductKind::Ionosphere,
            agencies: vec!["cod".to_string()],
            cadence: CadenceClass::Daily,
            start_hour: 0,
            hour_count: 24,
            roster: RosterSpec::parse("all"),
            day_count: 1,
        };
        let out = resolve(&req, &day, &Roster::core(), &table, &archives, Path::new("/ion")).unwrap();

        // Mirrored short name x3 mirrors + the CODE archive copy once.
        let code_copies = out
            .iter()
            .filter(|c| c.remote_host == "http://ftp.aiub.unibe.ch")
            .count();
        assert_eq!(code_copies, 1);
        assert_eq!(out.len(), 4);
    }
}
