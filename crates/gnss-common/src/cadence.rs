//! Alignment of requested hour windows to agency publication boundaries.
//!
//! Each analysis center publishes on its own fixed grid (every 1, 3, 6, or 24
//! hours starting at 00). A request for "start hour H, N slots" has to be
//! snapped onto that grid before any remote path can exist.

/// Align a requested window to an agency's publication boundaries.
///
/// Starting from hour 0, boundaries advance in `step_hours` increments. The
/// first boundary at or after `start_hour` becomes the effective start; from
/// there, one boundary per slot is emitted, stopping before
/// `effective_start + hour_count * step_hours` and always before hour 24.
/// Returns an empty list when the effective start already reaches 24; windows
/// never roll into the next day.
pub fn align(step_hours: u32, start_hour: u32, hour_count: u32) -> Vec<u32> {
    if step_hours == 0 {
        return Vec::new();
    }
    let mut effective = 0;
    while effective < start_hour {
        effective += step_hours;
    }
    let end = (effective + hour_count.saturating_mul(step_hours)).min(24);
    (effective..end).step_by(step_hours as usize).collect()
}
