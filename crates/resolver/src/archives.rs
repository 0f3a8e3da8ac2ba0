//! The IGS data-center mirror registry.
//!
//! Three independent archives carry the same data and products trees under
//! different hosts and base paths. The registry is constructed once from the
//! operator's preferred archive and passed by reference into the resolver;
//! the preferred mirror is always tried first, the rest in fixed order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveId {
    /// NASA Crustal Dynamics Data Information System.
    Cddis,
    /// Institut national de l'information geographique et forestiere.
    Ign,
    /// Wuhan University.
    Whu,
}

/// One archive: host plus the base paths of its data and products trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mirror {
    pub id: ArchiveId,
    pub host: &'static str,
    pub data_base: &'static str,
    pub products_base: &'static str,
}

const CDDIS: Mirror = Mirror {
    id: ArchiveId::Cddis,
    host: "https://cddis.nasa.gov",
    data_base: "/archive/gnss/data",
    products_base: "/archive/gnss/products",
};

const IGN: Mirror = Mirror {
    id: ArchiveId::Ign,
    host: "ftp://igs.ign.fr",
    data_base: "/pub/igs/data",
    products_base: "/pub/igs/products",
};

const WHU: Mirror = Mirror {
    id: ArchiveId::Whu,
    host: "ftp://igs.gnsswhu.cn",
    data_base: "/pub/gps/data",
    products_base: "/pub/gps/products",
};

/// Immutable, constructed-once mirror list, preferred archive first.
#[derive(Debug, Clone)]
pub struct ArchiveRegistry {
    mirrors: Vec<Mirror>,
}

impl ArchiveRegistry {
    pub fn new(preferred: ArchiveId) -> Self {
        let mut mirrors = vec![CDDIS, IGN, WHU];
        mirrors.sort_by_key(|m| m.id != preferred);
        Self { mirrors }
    }

    /// Mirrors in fallback order.
    pub fn mirrors(&self) -> &[Mirror] {
        &self.mirrors
    }

    pub fn preferred(&self) -> &Mirror {
        &self.mirrors[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_mirror_is_first() {
        let reg = ArchiveRegistry::new(ArchiveId::Whu);
        assert_eq!(reg.preferred().id, ArchiveId::Whu);
        assert_eq!(reg.mirrors().len(), 3);
        // Remaining mirrors keep their fixed relative order.
        assert_eq!(reg.mirrors()[1].id, ArchiveId::Cddis);
        assert_eq!(reg.mirrors()[2].id, ArchiveId::Ign);
    }

    #[test]
    fn test_default_order_from_cddis() {
        let reg = ArchiveRegistry::new(ArchiveId::Cddis);
        let ids: Vec<_> = reg.mirrors().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![ArchiveId::Cddis, ArchiveId::Ign, ArchiveId::Whu]);
    }
}
