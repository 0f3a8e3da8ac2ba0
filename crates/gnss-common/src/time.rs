//! Calendar/epoch handling for GNSS product paths.
//!
//! Remote archives stamp paths with several calendar representations of the
//! same instant (civil date, day of year, GPS week/day). `Epoch` normalizes
//! an instant to integer modified Julian day plus seconds of day and derives
//! the rest once at construction, so repeated day stepping never drifts.

use serde::{Deserialize, Serialize};

/// Modified Julian day of the GPS time origin, 1980-01-06 (week 0, day 0).
const GPS_EPOCH_MJD: i64 = 44244;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, thiserror::Error)]
pub enum TimeError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// A calendar instant normalized for remote path construction.
///
/// Derived fields are computed once at construction and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Epoch {
    mjd: i64,
    /// Seconds of day, 0..86400.
    sod: u32,
    year: i32,
    month: u32,
    day: u32,
    doy: u32,
    gps_week: i64,
    gps_dow: u32,
    hour: u32,
}

impl Epoch {
    /// Build from a civil date. Hours beyond 23 and years outside the
    /// 1980-2099 GPS calendar range are rejected.
    pub fn from_civil(year: i32, month: u32, day: u32, hour: u32) -> Result<Self, TimeError> {
        if !(1980..=2099).contains(&year) {
            return Err(TimeError::InvalidDate(format!(
                "year {year} outside supported range 1980-2099"
            )));
        }
        if !(1..=12).contains(&month) {
            return Err(TimeError::InvalidDate(format!("month {month} out of range")));
        }
        if day < 1 || day > days_in_month(year, month) {
            return Err(TimeError::InvalidDate(format!(
                "day {day} out of range for {year}-{month:02}"
            )));
        }
        if hour > 23 {
            return Err(TimeError::InvalidDate(format!("hour {hour} out of range")));
        }
        Ok(Self::from_mjd(civil_to_mjd(year, month, day), hour * 3600))
    }

    /// Build from a year and day-of-year (1-based).
    pub fn from_year_doy(year: i32, doy: u32) -> Result<Self, TimeError> {
        if !(1980..=2099).contains(&year) {
            return Err(TimeError::InvalidDate(format!(
                "year {year} outside supported range 1980-2099"
            )));
        }
        let max_doy = if is_leap_year(year) { 366 } else { 365 };
        if doy < 1 || doy > max_doy {
            return Err(TimeError::InvalidDate(format!(
                "day-of-year {doy} out of range for {year}"
            )));
        }
        Ok(Self::from_mjd(
            civil_to_mjd(year, 1, 1) + i64::from(doy) - 1,
            0,
        ))
    }

    /// Advance by a signed number of seconds. Day boundaries are handled with
    /// integer MJD arithmetic, so long chains of additions stay exact.
    pub fn add_seconds(&self, seconds: i64) -> Self {
        let total = self.mjd * SECONDS_PER_DAY + i64::from(self.sod) + seconds;
        let mjd = total.div_euclid(SECONDS_PER_DAY);
        let sod = total.rem_euclid(SECONDS_PER_DAY) as u32;
        Self::from_mjd(mjd, sod)
    }

    /// Advance by whole days.
    pub fn add_days(&self, days: i64) -> Self {
        self.add_seconds(days * SECONDS_PER_DAY)
    }

    fn from_mjd(mjd: i64, sod: u32) -> Self {
        let (year, month, day) = mjd_to_civil(mjd);
        let doy = (mjd - civil_to_mjd(year, 1, 1) + 1) as u32;
        Self {
            mjd,
            sod,
            year,
            month,
            day,
            doy,
            gps_week: (mjd - GPS_EPOCH_MJD).div_euclid(7),
            gps_dow: (mjd - GPS_EPOCH_MJD).rem_euclid(7) as u32,
            hour: sod / 3600,
        }
    }

    /// Same calendar day at the given hour.
    pub fn at_hour(&self, hour: u32) -> Self {
        Self::from_mjd(self.mjd, hour * 3600)
    }

    pub fn mjd(&self) -> i64 {
        self.mjd
    }

    pub fn seconds_of_day(&self) -> u32 {
        self.sod
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Two-digit year as used by short-name products.
    pub fn yy(&self) -> u32 {
        (self.year % 100) as u32
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn doy(&self) -> u32 {
        self.doy
    }

    pub fn gps_week(&self) -> i64 {
        self.gps_week
    }

    /// GPS day of week: 0 = Sunday .. 6 = Saturday.
    pub fn gps_dow(&self) -> u32 {
        self.gps_dow
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Hourly session letter 'a'..'x' used by hourly RINEX short names.
    pub fn hour_letter(&self) -> char {
        (b'a' + self.hour as u8) as char
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}Z (doy {:03}, wk {}/{})",
            self.year, self.month, self.day, self.hour, self.doy, self.gps_week, self.gps_dow
        )
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Fliegel-Van Flandern Julian day number, shifted to MJD.
fn civil_to_mjd(year: i32, month: u32, day: u32) -> i64 {
    let a = i64::from((14 - month) / 12);
    let y = i64::from(year) + 4800 - a;
    let m = i64::from(month) + 12 * a - 3;
    let jdn = i64::from(day) + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045;
    jdn - 2_400_001
}

fn mjd_to_civil(mjd: i64) -> (i32, u32, u32) {
    let jdn = mjd + 2_400_001;
    let a = jdn + 32044;
    let b = (4 * a + 3) / 146097;
    let c = a - 146097 * b / 4;
    let d = (4 * c + 3) / 1461;
    let e = c - 1461 * d / 4;
    let m = (5 * e + 2) / 153;
    let day = (e - (153 * m + 2) / 5 + 1) as u32;
    let month = (m + 3 - 12 * (m / 10)) as u32;
    let year = (100 * b + d - 4800 + m / 10) as i32;
    (year, month, day)
}
