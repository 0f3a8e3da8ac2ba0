//! Common types shared across the GNSS downloader crates.

pub mod cadence;
pub mod sites;
pub mod time;

pub use cadence::align;
pub use sites::{Roster, RosterError, RosterSpec};
pub use time::{Epoch, TimeError};
