//! The immutable product request, as handed over by configuration.

use gnss_common::sites::RosterSpec;
use serde::{Deserialize, Serialize};

use crate::products::{CadenceClass, ProductKind};

/// One enabled product: what to fetch, from whom, over which window.
///
/// Constructed once from configuration and read-only afterwards; per-day
/// iteration happens outside the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRequest {
    pub kind: ProductKind,
    /// Source identifiers in priority order. A single element may itself be
    /// a "+"-joined union ("igs+mgex"), expanded at resolution time.
    pub agencies: Vec<String>,
    pub cadence: CadenceClass,
    #[serde(default)]
    pub start_hour: u32,
    #[serde(default = "default_hour_count")]
    pub hour_count: u32,
    /// Sites this request applies to; ignored for site-independent products.
    #[serde(default = "RosterSpec::default_all")]
    pub roster: RosterSpec,
    #[serde(default = "default_day_count")]
    pub day_count: u32,
}

fn default_hour_count() -> u32 {
    24
}

fn default_day_count() -> u32 {
    1
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Request for {kind} names no agency")]
    EmptyAgencySet { kind: ProductKind },
    #[error("Request for {kind}: start hour {start_hour} is past the end of day")]
    StartHourOutOfRange { kind: ProductKind, start_hour: u32 },
    #[error("Request for {kind}: hour count must be positive")]
    ZeroHourCount { kind: ProductKind },
    #[error("Request for {kind}: day count must be positive")]
    ZeroDayCount { kind: ProductKind },
}

impl ProductRequest {
    /// Validate the cross-field invariants configuration cannot express.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.agencies.is_empty() || self.agencies.iter().all(|a| a.trim().is_empty()) {
            return Err(RequestError::EmptyAgencySet { kind: self.kind });
        }
        if self.start_hour >= 24 {
            return Err(RequestError::StartHourOutOfRange {
                kind: self.kind,
                start_hour: self.start_hour,
            });
        }
        if self.hour_count == 0 {
            return Err(RequestError::ZeroHourCount { kind: self.kind });
        }
        if self.day_count == 0 {
            return Err(RequestError::ZeroDayCount { kind: self.kind });
        }
        Ok(())
    }

    /// Member agencies with "+"-joined unions expanded, order preserved.
    pub fn expanded_agencies(&self) -> Vec<String> {
        self.agencies
            .iter()
            .flat_map(|a| a.split('+'))
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_common::sites::RosterSpec;

    fn request(agencies: &[&str]) -> ProductRequest {
        ProductRequest {
            kind: ProductKind::Observation,
            agencies: agencies.iter().map(|s| s.to_string()).collect(),
            cadence: CadenceClass::Daily,
            start_hour: 0,
            hour_count: 24,
            roster: RosterSpec::parse("all"),
            day_count: 1,
        }
    }

    #[test]
    fn test_union_expansion() {
        let req = request(&["igs+mgex"]);
        assert_eq!(req.expanded_agencies(), vec!["igs", "mgex"]);

        let req = request(&["esa_u", "gfz_u+whu_u"]);
        assert_eq!(req.expanded_agencies(), vec!["esa_u", "gfz_u", "whu_u"]);
    }

    #[test]
    fn test_validation() {
        assert!(request(&["igs"]).validate().is_ok());
        assert!(matches!(
            request(&[]).validate(),
            Err(RequestError::EmptyAgencySet { .. })
        ));

        let mut req = request(&["igs"]);
        req.start_hour = 24;
        assert!(matches!(
            req.validate(),
            Err(RequestError::StartHourOutOfRange { .. })
        ));

        let mut req = request(&["igs"]);
        req.hour_count = 0;
        assert!(matches!(req.validate(), Err(RequestError::ZeroHourCount { .. })));
    }
}
