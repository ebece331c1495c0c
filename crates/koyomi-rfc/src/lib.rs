//! Wire-format codecs for the koyomi calendar model: iCalendar
//! (RFC 5545) read/write, vCalendar 1.0 and xCal (RFC 6321) read-only,
//! plus the timezone subsystem and storage collaborators.

pub mod error;
pub mod format;
pub mod ical;
pub mod tz;
pub mod vcal;
pub mod xcal;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use format::{CalFormat, CalStorage, FileStorage};
pub use ical::ICalFormat;
pub use tz::{TimeZoneResolver, VTimeZone, normalize_tzid, vtimezone_component};
pub use vcal::VCalFormat;
pub use xcal::XCalFormat;
