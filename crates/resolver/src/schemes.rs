//! The naming scheme table.
//!
//! Every archive's directory layout and filename convention lives here and
//! only here, as data: placeholder templates over epoch fields and the site
//! identifier, rendered with plain string substitution. A new agency or a
//! new naming variant is a new [`SchemeEntry`] or [`NamingScheme`]; the
//! resolver and orchestrator never change.
//!
//! Placeholders: `{yyyy}` year, `{yy}` 2-digit year, `{ddd}` day of year,
//! `{wwww}` GPS week, `{d}` GPS day of week, `{mm}` month, `{hh}` 2-digit
//! hour, `{h}` hourly session letter a-x, `{site}` 4-char lowercase id,
//! `{SITE}` 9-char uppercase long name.

use gnss_common::sites::Site;
use gnss_common::time::Epoch;

use crate::products::{CadenceClass, Compression, Conversion, ProductKind};
use crate::resolve::ResolveError;

/// Some products carry both a legacy short-name and a modern long-name
/// convention; both are acceptable and tried in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameVariant {
    Long,
    Short,
}

/// Which tree of which host serves a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The data tree of every IGS mirror.
    MirroredData,
    /// The products tree of every IGS mirror.
    MirroredProducts,
    /// A single fixed host outside the mirror set.
    Fixed {
        host: &'static str,
        base: &'static str,
    },
}

/// One path/filename convention for a product at one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingScheme {
    pub variant: NameVariant,
    pub location: Location,
    /// Directory template below the location base, no leading slash.
    pub dir: String,
    /// Filename template including the compression suffix.
    pub file: String,
    pub compression: Compression,
    pub conversion: Conversion,
}

/// All naming variants for one (kind, agency, cadence) product.
#[derive(Debug, Clone)]
pub struct SchemeEntry {
    pub kind: ProductKind,
    pub agency: &'static str,
    pub cadence: CadenceClass,
    /// Native publication interval in hours, fed to the cadence aligner.
    pub step_hours: u32,
    /// Whether filenames are parameterized by site identifier.
    pub per_site: bool,
    pub schemes: Vec<NamingScheme>,
}

/// Registry of every supported (kind, agency, cadence) product.
#[derive(Debug, Clone)]
pub struct SchemeTable {
    entries: Vec<SchemeEntry>,
}

fn sch(
    variant: NameVariant,
    location: Location,
    dir: &str,
    file: impl Into<String>,
    compression: Compression,
    conversion: Conversion,
) -> NamingScheme {
    NamingScheme {
        variant,
        location,
        dir: dir.to_string(),
        file: file.into(),
        compression,
        conversion,
    }
}

fn entry(
    kind: ProductKind,
    agency: &'static str,
    cadence: CadenceClass,
    step_hours: u32,
    per_site: bool,
    schemes: Vec<NamingScheme>,
) -> SchemeEntry {
    SchemeEntry {
        kind,
        agency,
        cadence,
        step_hours,
        per_site,
        schemes,
    }
}

use Compression::{Gzip, UnixCompress};
use Conversion::Hatanaka;
use Location::{Fixed, MirroredData as Data, MirroredProducts as Prod};
use NameVariant::{Long, Short};

const CODE_FTP: Location = Fixed {
    host: "http://ftp.aiub.unibe.ch",
    base: "/CODE",
};

const PPP_WIZARD: Location = Fixed {
    host: "http://www.ppp-wizard.net",
    base: "/products/REAL_TIME",
};

const IGS_FILES: Location = Fixed {
    host: "https://files.igs.org",
    base: "/pub/station/general",
};

const EPN_FTP: Location = Fixed {
    host: "ftp://ftp.epncb.oma.be",
    base: "/pub/obs",
};

const CUT_HTTP: Location = Fixed {
    host: "http://saegnss2.curtin.edu.au",
    base: "/ldc/rinex3obs",
};

const GA_FTP: Location = Fixed {
    host: "ftp://ftp.data.gnss.ga.gov.au",
    base: "",
};

const NGS_HTTP: Location = Fixed {
    host: "https://geodesy.noaa.gov",
    base: "/corsdata",
};

const PBO_V3: Location = Fixed {
    host: "https://data.unavco.org",
    base: "/archive/gnss/rinex3/obs",
};

const PBO_V2: Location = Fixed {
    host: "https://data.unavco.org",
    base: "/archive/gnss/rinex/obs",
};

impl SchemeTable {
    /// The standard product registry.
    pub fn standard() -> Self {
        use CadenceClass::{Daily, HighRate, Hourly, SubHourly};
        use Conversion::None as NoConv;
        use ProductKind::*;

        let mut entries = Vec::new();

        // --- observations ---------------------------------------------------
        entries.push(entry(Observation, "igs", Daily, 24, true, vec![
            sch(Short, Data, "daily/{yyyy}/{ddd}/{yy}d", "{site}{ddd}0.{yy}d.Z", UnixCompress, Hatanaka),
        ]));
        entries.push(entry(Observation, "igs", Hourly, 1, true, vec![
            sch(Short, Data, "hourly/{yyyy}/{ddd}/{hh}", "{site}{ddd}{h}.{yy}d.Z", UnixCompress, Hatanaka),
        ]));
        entries.push(entry(Observation, "igs", HighRate, 1, true, vec![
            sch(Short, Data, "highrate/{yyyy}/{ddd}/{yy}d/{hh}", "{site}{ddd}{h}00.{yy}d.Z", UnixCompress, Hatanaka),
        ]));
        entries.push(entry(Observation, "mgex", Daily, 24, true, vec![
            sch(Long, Data, "daily/{yyyy}/{ddd}/{yy}d", "{SITE}_R_{yyyy}{ddd}0000_01D_30S_MO.crx.gz", Gzip, Hatanaka),
        ]));
        entries.push(entry(Observation, "mgex", Hourly, 1, true, vec![
            sch(Long, Data, "hourly/{yyyy}/{ddd}/{hh}", "{SITE}_R_{yyyy}{ddd}{hh}00_01H_30S_MO.crx.gz", Gzip, Hatanaka),
        ]));
        entries.push(entry(Observation, "mgex", HighRate, 1, true, vec![
            sch(Long, Data, "highrate/{yyyy}/{ddd}/{yy}d/{hh}", "{SITE}_R_{yyyy}{ddd}{hh}00_01H_01S_MO.crx.gz", Gzip, Hatanaka),
        ]));
        entries.push(entry(Observation, "epn", Daily, 24, true, vec![
            sch(Long, EPN_FTP, "{yyyy}/{ddd}", "{SITE}_R_{yyyy}{ddd}0000_01D_30S_MO.crx.gz", Gzip, Hatanaka),
            sch(Short, EPN_FTP, "{yyyy}/{ddd}", "{site}{ddd}0.{yy}d.Z", UnixCompress, Hatanaka),
        ]));
        entries.push(entry(Observation, "cut", Daily, 24, true, vec![
            sch(Long, CUT_HTTP, "daily/{yyyy}/{ddd}", "{SITE}_R_{yyyy}{ddd}0000_01D_30S_MO.crx.gz", Gzip, Hatanaka),
        ]));
        entries.push(entry(Observation, "ga", Daily, 24, true, vec![
            sch(Long, GA_FTP, "daily/{yyyy}/{ddd}", "{SITE}_R_{yyyy}{ddd}0000_01D_30S_MO.crx.gz", Gzip, Hatanaka),
        ]));
        entries.push(entry(Observation, "ga", Hourly, 1, true, vec![
            sch(Long, GA_FTP, "hourly/{yyyy}/{ddd}/{hh}", "{SITE}_R_{yyyy}{ddd}{hh}00_01H_30S_MO.crx.gz", Gzip, Hatanaka),
        ]));
        entries.push(entry(Observation, "ga", HighRate, 1, true, vec![
            sch(Long, GA_FTP, "highrate/{yyyy}/{ddd}/{hh}", "{SITE}_R_{yyyy}{ddd}{hh}00_01H_01S_MO.crx.gz", Gzip, Hatanaka),
        ]));
        entries.push(entry(Observation, "ngs", Daily, 24, true, vec![
            sch(Short, NGS_HTTP, "rinex/{yyyy}/{ddd}/{site}", "{site}{ddd}0.{yy}d.gz", Gzip, Hatanaka),
        ]));
        // PBO serves RINEX 3 and 2 trees side by side; both are tried.
        entries.push(entry(Observation, "pbo", Daily, 24, true, vec![
            sch(Long, PBO_V3, "{yyyy}/{ddd}", "{SITE}_R_{yyyy}{ddd}0000_01D_15S_MO.crx.gz", Gzip, Hatanaka),
            sch(Short, PBO_V2, "{yyyy}/{ddd}", "{site}{ddd}0.{yy}d.Z", UnixCompress, Hatanaka),
        ]));

        // --- broadcast navigation -------------------------------------------
        entries.push(entry(Navigation, "igs", Daily, 24, false, vec![
            sch(Long, Data, "daily/{yyyy}/brdc", "BRDC00IGS_R_{yyyy}{ddd}0000_01D_MN.rnx.gz", Gzip, NoConv),
            sch(Short, Data, "daily/{yyyy}/brdc", "brdc{ddd}0.{yy}n.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Navigation, "igs", Hourly, 1, false, vec![
            sch(Short, Data, "hourly/{yyyy}/{ddd}/{hh}", "hour{ddd}{h}.{yy}n.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Navigation, "dlr", Daily, 24, false, vec![
            sch(Long, Data, "daily/{yyyy}/brdc", "BRDM00DLR_S_{yyyy}{ddd}0000_01D_MN.rnx.gz", Gzip, NoConv),
        ]));
        entries.push(entry(Navigation, "ign", Daily, 24, false, vec![
            sch(Long, Data, "daily/{yyyy}/brdc", "BRDC00IGN_R_{yyyy}{ddd}0000_01D_MN.rnx.gz", Gzip, NoConv),
        ]));
        entries.push(entry(Navigation, "gop", Daily, 24, false, vec![
            sch(Long, Fixed { host: "ftp://ftp.pecny.cz", base: "/LDC/orbits_brd/gop3" }, "{yyyy}", "BRDC00GOP_R_{yyyy}{ddd}0000_01D_MN.rnx.gz", Gzip, NoConv),
        ]));
        entries.push(entry(Navigation, "wrd", Daily, 24, false, vec![
            sch(Long, Fixed { host: "ftp://igs.bkg.bund.de", base: "/IGS/BRDC" }, "{yyyy}/{ddd}", "BRDC00WRD_R_{yyyy}{ddd}0000_01D_MN.rnx.gz", Gzip, NoConv),
        ]));

        // --- precise orbits -------------------------------------------------
        // Final combinations and per-AC finals, weekly directories.
        entries.push(entry(Orbit, "igs", Daily, 24, false, vec![
            sch(Long, Prod, "{wwww}", "IGS0OPSFIN_{yyyy}{ddd}0000_01D_15M_ORB.SP3.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "igs{wwww}{d}.sp3.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Orbit, "cod", Daily, 24, false, vec![
            sch(Long, Prod, "{wwww}", "COD0OPSFIN_{yyyy}{ddd}0000_01D_05M_ORB.SP3.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "cod{wwww}{d}.eph.Z", UnixCompress, NoConv),
        ]));
        for (ac, long_ac) in [
            ("emr", "EMR0OPSFIN"),
            ("esa", "ESA0OPSFIN"),
            ("gfz", "GFZ0OPSFIN"),
            ("grg", "GRG0OPSFIN"),
            ("jpl", "JPL0OPSFIN"),
            ("mit", "MIT0OPSFIN"),
        ] {
            entries.push(entry(Orbit, ac, Daily, 24, false, vec![
                sch(Long, Prod, "{wwww}", format!("{long_ac}_{{yyyy}}{{ddd}}0000_01D_15M_ORB.SP3.gz"), Gzip, NoConv),
                sch(Short, Prod, "{wwww}", format!("{ac}{{wwww}}{{d}}.sp3.Z"), UnixCompress, NoConv),
            ]));
        }
        // Rapids.
        entries.push(entry(Orbit, "igs_r", Daily, 24, false, vec![
            sch(Long, Prod, "{wwww}", "IGS0OPSRAP_{yyyy}{ddd}0000_01D_15M_ORB.SP3.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "igr{wwww}{d}.sp3.Z", UnixCompress, NoConv),
        ]));
        for (ac, long_ac, short_ac) in [
            ("cod_r", "COD0OPSRAP", "cod"),
            ("emr_r", "EMR0OPSRAP", "emr"),
            ("esa_r", "ESA0OPSRAP", "esa"),
            ("gfz_r", "GFZ0OPSRAP", "gfz"),
        ] {
            entries.push(entry(Orbit, ac, Daily, 24, false, vec![
                sch(Long, Prod, "{wwww}", format!("{long_ac}_{{yyyy}}{{ddd}}0000_01D_15M_ORB.SP3.gz"), Gzip, NoConv),
                sch(Short, Prod, "{wwww}", format!("{short_ac}{{wwww}}{{d}}.sp3.Z"), UnixCompress, NoConv),
            ]));
        }
        // Ultra-rapids: native step differs per analysis center.
        entries.push(entry(Orbit, "igs_u", SubHourly, 6, false, vec![
            sch(Long, Prod, "{wwww}", "IGS0OPSULT_{yyyy}{ddd}{hh}00_02D_15M_ORB.SP3.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "igu{wwww}{d}_{hh}.sp3.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Orbit, "esa_u", SubHourly, 6, false, vec![
            sch(Long, Prod, "{wwww}", "ESA0OPSULT_{yyyy}{ddd}{hh}00_02D_15M_ORB.SP3.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "esu{wwww}{d}_{hh}.sp3.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Orbit, "gfz_u", SubHourly, 3, false, vec![
            sch(Long, Prod, "{wwww}", "GFZ0OPSULT_{yyyy}{ddd}{hh}00_02D_15M_ORB.SP3.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "gfu{wwww}{d}_{hh}.sp3.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Orbit, "whu_u", SubHourly, 1, false, vec![
            sch(Long, Prod, "mgex/{wwww}", "WUM0MGXULA_{yyyy}{ddd}{hh}00_01D_05M_ORB.sp3.gz", Gzip, NoConv),
        ]));
        // MGEX multi-constellation finals.
        for (ac, long_ac) in [
            ("cod_m", "COD0MGXFIN_{yyyy}{ddd}0000_01D_05M_ORB.SP3.gz"),
            ("gfz_m", "GFZ0MGXRAP_{yyyy}{ddd}0000_01D_05M_ORB.SP3.gz"),
            ("grg_m", "GRG0MGXFIN_{yyyy}{ddd}0000_01D_15M_ORB.SP3.gz"),
            ("whu_m", "WUM0MGXFIN_{yyyy}{ddd}0000_01D_15M_ORB.SP3.gz"),
        ] {
            entries.push(entry(Orbit, ac, Daily, 24, false, vec![
                sch(Long, Prod, "mgex/{wwww}", long_ac, Gzip, NoConv),
            ]));
        }
        // CNES real-time archive.
        entries.push(entry(Orbit, "cnt", Daily, 24, false, vec![
            sch(Short, PPP_WIZARD, "", "cnt{wwww}{d}.sp3.gz", Gzip, NoConv),
        ]));

        // --- precise clocks -------------------------------------------------
        entries.push(entry(Clock, "igs", Daily, 24, false, vec![
            sch(Long, Prod, "{wwww}", "IGS0OPSFIN_{yyyy}{ddd}0000_01D_30S_CLK.CLK.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "igs{wwww}{d}.clk_30s.Z", UnixCompress, NoConv),
        ]));
        for (ac, long_ac, short_ac) in [
            ("cod", "COD0OPSFIN", "cod"),
            ("emr", "EMR0OPSFIN", "emr"),
            ("esa", "ESA0OPSFIN", "esa"),
            ("gfz", "GFZ0OPSFIN", "gfz"),
            ("grg", "GRG0OPSFIN", "grg"),
            ("jpl", "JPL0OPSFIN", "jpl"),
            ("mit", "MIT0OPSFIN", "mit"),
        ] {
            entries.push(entry(Clock, ac, Daily, 24, false, vec![
                sch(Long, Prod, "{wwww}", format!("{long_ac}_{{yyyy}}{{ddd}}0000_01D_30S_CLK.CLK.gz"), Gzip, NoConv),
                sch(Short, Prod, "{wwww}", format!("{short_ac}{{wwww}}{{d}}.clk.Z"), UnixCompress, NoConv),
            ]));
        }
        entries.push(entry(Clock, "igs_r", Daily, 24, false, vec![
            sch(Long, Prod, "{wwww}", "IGS0OPSRAP_{yyyy}{ddd}0000_01D_05M_CLK.CLK.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "igr{wwww}{d}.clk.Z", UnixCompress, NoConv),
        ]));
        for (ac, long_ac) in [
            ("cod_m", "COD0MGXFIN_{yyyy}{ddd}0000_01D_30S_CLK.CLK.gz"),
            ("gfz_m", "GFZ0MGXRAP_{yyyy}{ddd}0000_01D_30S_CLK.CLK.gz"),
            ("grg_m", "GRG0MGXFIN_{yyyy}{ddd}0000_01D_30S_CLK.CLK.gz"),
            ("whu_m", "WUM0MGXFIN_{yyyy}{ddd}0000_01D_30S_CLK.CLK.gz"),
        ] {
            entries.push(entry(Clock, ac, Daily, 24, false, vec![
                sch(Long, Prod, "mgex/{wwww}", long_ac, Gzip, NoConv),
            ]));
        }
        entries.push(entry(Clock, "cnt", Daily, 24, false, vec![
            sch(Short, PPP_WIZARD, "", "cnt{wwww}{d}.clk.gz", Gzip, NoConv),
        ]));

        // --- earth orientation ----------------------------------------------
        entries.push(entry(Eop, "igs", Daily, 24, false, vec![
            sch(Long, Prod, "{wwww}", "IGS0OPSFIN_{yyyy}{ddd}0000_07D_01D_ERP.ERP.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "igs{wwww}7.erp.Z", UnixCompress, NoConv),
        ]));
        for ac in ["cod", "emr", "esa", "gfz", "grg", "jpl", "mit"] {
            entries.push(entry(Eop, ac, Daily, 24, false, vec![
                sch(Short, Prod, "{wwww}", format!("{ac}{{wwww}}7.erp.Z"), UnixCompress, NoConv),
            ]));
        }
        entries.push(entry(Eop, "igs_u", SubHourly, 6, false, vec![
            sch(Short, Prod, "{wwww}", "igu{wwww}{d}_{hh}.erp.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Eop, "esa_u", SubHourly, 6, false, vec![
            sch(Short, Prod, "{wwww}", "esu{wwww}{d}_{hh}.erp.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Eop, "gfz_u", SubHourly, 3, false, vec![
            sch(Short, Prod, "{wwww}", "gfu{wwww}{d}_{hh}.erp.Z", UnixCompress, NoConv),
        ]));

        // --- ORBEX attitude -------------------------------------------------
        for (ac, long_ac) in [
            ("cod_m", "COD0MGXFIN_{yyyy}{ddd}0000_01D_30S_ATT.OBX.gz"),
            ("gfz_m", "GFZ0MGXRAP_{yyyy}{ddd}0000_01D_30S_ATT.OBX.gz"),
            ("grg_m", "GRG0MGXFIN_{yyyy}{ddd}0000_01D_30S_ATT.OBX.gz"),
            ("whu_m", "WUM0MGXFIN_{yyyy}{ddd}0000_01D_30S_ATT.OBX.gz"),
        ] {
            entries.push(entry(Attitude, ac, Daily, 24, false, vec![
                sch(Long, Prod, "mgex/{wwww}", long_ac, Gzip, NoConv),
            ]));
        }
        entries.push(entry(Attitude, "cnt", Daily, 24, false, vec![
            sch(Short, PPP_WIZARD, "", "cnt{wwww}{d}.obx.gz", Gzip, NoConv),
        ]));

        // --- biases ---------------------------------------------------------
        // CODE monthly P1-C1 DCB.
        entries.push(entry(Bias, "cod", Daily, 24, false, vec![
            sch(Short, CODE_FTP, "{yyyy}", "P1C1{yy}{mm}.DCB.Z", UnixCompress, NoConv),
        ]));
        // CAS daily DSB.
        entries.push(entry(Bias, "cas", Daily, 24, false, vec![
            sch(Long, Prod, "bias/{yyyy}", "CAS0MGXRAP_{yyyy}{ddd}0000_01D_01D_DCB.BSX.gz", Gzip, NoConv),
        ]));
        // MGEX observable-specific biases.
        for (ac, long_ac) in [
            ("cod_m", "COD0MGXFIN_{yyyy}{ddd}0000_01D_01D_OSB.BIA.gz"),
            ("gfz_m", "GFZ0MGXRAP_{yyyy}{ddd}0000_01D_01D_OSB.BIA.gz"),
            ("grg_m", "GRG0MGXFIN_{yyyy}{ddd}0000_01D_01D_OSB.BIA.gz"),
            ("whu_m", "WUM0MGXFIN_{yyyy}{ddd}0000_01D_01D_OSB.BIA.gz"),
        ] {
            entries.push(entry(Bias, ac, Daily, 24, false, vec![
                sch(Long, Prod, "mgex/{wwww}", long_ac, Gzip, NoConv),
            ]));
        }
        entries.push(entry(Bias, "cnt", Daily, 24, false, vec![
            sch(Short, PPP_WIZARD, "", "cnt{wwww}{d}.bia.gz", Gzip, NoConv),
        ]));

        // --- weekly SINEX ---------------------------------------------------
        entries.push(entry(Sinex, "igs", Daily, 24, false, vec![
            sch(Long, Prod, "{wwww}", "IGS0OPSSNX_{yyyy}{ddd}0000_07D_07D_SOL.SNX.gz", Gzip, NoConv),
            sch(Short, Prod, "{wwww}", "igs{yy}P{wwww}.snx.Z", UnixCompress, NoConv),
        ]));

        // --- ionosphere -----------------------------------------------------
        entries.push(entry(Ionosphere, "igs", Daily, 24, false, vec![
            sch(Long, Prod, "ionex/{yyyy}/{ddd}", "IGS0OPSFIN_{yyyy}{ddd}0000_01D_02H_GIM.INX.gz", Gzip, NoConv),
            sch(Short, Prod, "ionex/{yyyy}/{ddd}", "igsg{ddd}0.{yy}i.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Ionosphere, "cod", Daily, 24, false, vec![
            sch(Short, Prod, "ionex/{yyyy}/{ddd}", "codg{ddd}0.{yy}i.Z", UnixCompress, NoConv),
            sch(Short, CODE_FTP, "{yyyy}", "CODG{ddd}0.{yy}I.Z", UnixCompress, NoConv),
        ]));
        entries.push(entry(Ionosphere, "cas", Daily, 24, false, vec![
            sch(Short, Prod, "ionex/{yyyy}/{ddd}", "casg{ddd}0.{yy}i.Z", UnixCompress, NoConv),
        ]));

        // --- rate of TEC index ----------------------------------------------
        entries.push(entry(Roti, "igs", Daily, 24, false, vec![
            sch(Short, Prod, "ionex/{yyyy}/{ddd}", "roti{ddd}0.{yy}f.Z", UnixCompress, NoConv),
        ]));

        // --- troposphere ----------------------------------------------------
        entries.push(entry(Troposphere, "igs", Daily, 24, true, vec![
            sch(Long, Prod, "troposphere/zpd/{yyyy}/{ddd}", "{SITE}_R_{yyyy}{ddd}0000_01D_05M_TRO.TRO.gz", Gzip, NoConv),
            sch(Short, Prod, "troposphere/zpd/{yyyy}/{ddd}", "{site}{ddd}0.{yy}zpd.gz", Gzip, NoConv),
        ]));
        entries.push(entry(Troposphere, "cod", Daily, 24, false, vec![
            sch(Short, CODE_FTP, "{yyyy}", "COD{wwww}{d}.TRO.Z", UnixCompress, NoConv),
        ]));

        // --- ANTEX ----------------------------------------------------------
        // Frame-dependent; the current calibration is tried first.
        entries.push(entry(Antex, "igs", Daily, 24, false, vec![
            sch(Long, IGS_FILES, "", "igs20.atx", Compression::None, NoConv),
            sch(Short, IGS_FILES, "", "igs14.atx", Compression::None, NoConv),
        ]));

        Self { entries }
    }

    /// Look up the scheme entry for a (kind, agency, cadence) triple.
    ///
    /// A miss is a configuration error, never a transient: either the kind is
    /// entirely unknown or the agency/cadence pair is not declared for it.
    pub fn lookup(
        &self,
        kind: ProductKind,
        agency: &str,
        cadence: CadenceClass,
    ) -> Result<&SchemeEntry, ResolveError> {
        let mut kind_seen = false;
        for e in &self.entries {
            if e.kind != kind {
                continue;
            }
            kind_seen = true;
            if e.agency == agency && e.cadence == cadence {
                return Ok(e);
            }
        }
        if kind_seen {
            Err(ResolveError::UnknownAgency {
                kind,
                agency: agency.to_string(),
                cadence,
            })
        } else {
            Err(ResolveError::UnknownProductKind(kind))
        }
    }

    pub fn entries(&self) -> &[SchemeEntry] {
        &self.entries
    }
}

/// Render a placeholder template for an epoch and optional site.
///
/// Longer placeholders are substituted first so `{ddd}` never collides with
/// `{d}`, nor `{yyyy}` with `{yy}`.
pub fn render(template: &str, epoch: &Epoch, site: Option<&Site>) -> String {
    let mut out = template
        .replace("{yyyy}", &format!("{:04}", epoch.year()))
        .replace("{yy}", &format!("{:02}", epoch.yy()))
        .replace("{ddd}", &format!("{:03}", epoch.doy()))
        .replace("{wwww}", &format!("{:04}", epoch.gps_week()))
        .replace("{d}", &format!("{}", epoch.gps_dow()))
        .replace("{mm}", &format!("{:02}", epoch.month()))
        .replace("{hh}", &format!("{:02}", epoch.hour()))
        .replace("{h}", &epoch.hour_letter().to_string());
    if let Some(site) = site {
        out = out
            .replace("{site}", &site.short_id())
            .replace("{SITE}", &site.long_name());
    }
    out
}

/// Canonical local filename for a scheme: the rendered remote name with the
/// compression suffix stripped and the conversion's extension change applied.
/// All candidates of one logical file share the first scheme's result.
pub fn final_local_name(scheme: &NamingScheme, epoch: &Epoch, site: Option<&Site>) -> String {
    let rendered = render(&scheme.file, epoch, site);
    let stripped = rendered
        .strip_suffix(scheme.compression.suffix())
        .unwrap_or(&rendered)
        .to_string();
    match scheme.conversion {
        Conversion::None => stripped,
        Conversion::Hatanaka => {
            if let Some(stem) = stripped.strip_suffix(".crx") {
                format!("{stem}.rnx")
            } else if let Some(stem) = stripped.strip_suffix('d') {
                // Short-name Hatanaka files end in "d"; restored files in "o".
                format!("{stem}o")
            } else {
                stripped
            }
        }
    }
}
