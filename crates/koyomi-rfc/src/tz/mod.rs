//! The timezone subsystem: VTIMEZONE parsing, synthesis from the system
//! database, and TZID resolution.

mod emit;
mod resolve;
pub(crate) mod vtimezone;

pub use emit::vtimezone_component;
pub use resolve::{TimeZoneResolver, normalize_tzid};
pub use vtimezone::VTimeZone;
