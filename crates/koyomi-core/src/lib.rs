//! In-memory object model for calendar data (RFC 5545).
//!
//! This crate holds the incidence data model, the recurrence engine, the
//! calendar container and the occurrence iterator. Parsing and emitting
//! wire formats lives in `koyomi-rfc`.

pub mod alarm;
pub mod attachment;
pub mod attendee;
pub mod calendar;
pub mod calfilter;
pub mod conference;
pub mod customproperties;
pub mod datetime;
pub mod duration;
pub mod error;
pub mod format;
pub mod incidence;
pub mod occurrence;
pub mod period;
pub mod person;
pub mod recurrence;
pub mod scheduling;
pub mod sorting;

pub use alarm::{Alarm, AlarmAction, Trigger};
pub use attachment::Attachment;
pub use attendee::{Attendee, PartStat, Role};
pub use calendar::{AccessMode, AlarmEntry, Calendar, CalendarObserver, IncidencePtr};
pub use calfilter::CalFilter;
pub use conference::Conference;
pub use customproperties::{CustomProperties, CustomProperty};
pub use datetime::{CalDateTime, TimeSpec};
pub use duration::Duration;
pub use error::{CalendarError, CalendarResult};
pub use incidence::{
    Event, Field, FreeBusy, GEO_INVALID, Incidence, IncidenceBase, IncidenceCommon,
    IncidenceKind, IncidenceObserver, Journal, MIME_TEXT_CALENDAR, RelationType, Secrecy, Status,
    Todo, Transparency,
};
pub use occurrence::{Occurrence, OccurrenceIterator};
pub use period::Period;
pub use person::Person;
pub use recurrence::{Frequency, Recurrence, RecurrenceRule, WeekdayNum};
pub use scheduling::{ITipMethod, ScheduleMessage, ScheduleMessageStatus};
pub use sorting::{EventSortField, JournalSortField, SortDirection, TodoSortField};
