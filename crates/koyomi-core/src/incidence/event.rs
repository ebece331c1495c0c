//! Events (RFC 5545 VEVENT).

use std::ops::{Deref, DerefMut};

use crate::datetime::{CalDateTime, TimeSpec};
use crate::duration::Duration;
use crate::incidence::{Field, IncidenceCommon, Status};

/// Time transparency for busy searches (RFC 5545 TRANSP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Transparency {
    #[default]
    Opaque,
    Transparent,
}

impl Transparency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opaque => "OPAQUE",
            Self::Transparent => "TRANSPARENT",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OPAQUE" => Some(Self::Opaque),
            "TRANSPARENT" => Some(Self::Transparent),
            _ => None,
        }
    }
}

/// An event: an incidence with an end (explicit or by duration) and a
/// transparency.
///
/// dt-end and duration are mutually exclusive; setting one clears the
/// other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    common: IncidenceCommon,
    dt_end: Option<CalDateTime>,
    duration: Option<Duration>,
    transparency: Transparency,
}

impl Event {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn common(&self) -> &IncidenceCommon {
        &self.common
    }

    pub fn common_mut(&mut self) -> &mut IncidenceCommon {
        &mut self.common
    }

    #[must_use]
    pub fn has_end_date(&self) -> bool {
        self.dt_end.is_some()
    }

    #[must_use]
    pub fn has_duration(&self) -> bool {
        self.duration.is_some()
    }

    /// The stored end timestamp, if one was set explicitly.
    #[must_use]
    pub const fn dt_end(&self) -> Option<CalDateTime> {
        self.dt_end
    }

    /// The end of the event: explicit end, start plus duration, or the
    /// start itself for zero-length events.
    #[must_use]
    pub fn effective_dt_end(&self) -> Option<CalDateTime> {
        if let Some(end) = self.dt_end {
            return Some(end);
        }
        let start = self.common.dt_start()?;
        match self.duration {
            Some(d) => Some(d.end(&start)),
            None => Some(start),
        }
    }

    /// Sets the end timestamp, clearing any duration.
    pub fn set_dt_end(&mut self, dt_end: Option<CalDateTime>) {
        if self.common.is_read_only() || (self.dt_end == dt_end && self.duration.is_none()) {
            return;
        }
        self.common.update();
        self.dt_end = dt_end;
        self.duration = None;
        self.common.set_field_dirty(Field::DtEnd);
        self.common.updated();
    }

    #[must_use]
    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Sets the duration, clearing any explicit end.
    pub fn set_duration(&mut self, duration: Option<Duration>) {
        if self.common.is_read_only() || (self.duration == duration && self.dt_end.is_none()) {
            return;
        }
        self.common.update();
        self.duration = duration;
        self.dt_end = None;
        self.common.set_field_dirty(Field::Duration);
        self.common.updated();
    }

    #[must_use]
    pub const fn transparency(&self) -> Transparency {
        self.transparency
    }

    pub fn set_transparency(&mut self, transparency: Transparency) {
        if self.common.is_read_only() || self.transparency == transparency {
            return;
        }
        self.common.update();
        self.transparency = transparency;
        self.common.set_field_dirty(Field::Transparency);
        self.common.updated();
    }

    /// Sets the status; events accept none, tentative, confirmed,
    /// cancelled and X values. Anything else is discarded with a
    /// diagnostic.
    pub fn set_status(&mut self, status: Status) {
        match status {
            Status::None
            | Status::Tentative
            | Status::Confirmed
            | Status::Cancelled
            | Status::X(_) => self.common.set_status_unchecked(status),
            _ => {
                tracing::warn!(status = %status.as_str(), "invalid status for an event");
            }
        }
    }

    /// True when the event spans more than one day, viewed in its own
    /// zone.
    ///
    /// An event ending exactly at midnight belongs to the previous day;
    /// all-day events compare their date range directly.
    #[must_use]
    pub fn is_multi_day(&self) -> bool {
        let Some(start) = self.common.dt_start() else {
            return false;
        };
        let Some(end) = self.effective_dt_end() else {
            return false;
        };
        let end = end.to_spec(start.spec());
        if self.common.all_day() {
            return start.date() != end.date();
        }
        let mut end_date = end.date();
        if end.naive().time() == chrono::NaiveTime::MIN {
            end_date = end_date.pred_opt().unwrap_or(end_date);
        }
        start.date() < end_date
    }

    pub(crate) fn shift_times_event(&mut self, old: TimeSpec, new: TimeSpec) {
        self.common.shift_times(old, new);
        if let Some(end) = self.dt_end
            && end.spec() == old
        {
            self.dt_end = Some(end.reinterpret(new));
        }
    }
}

impl Deref for Event {
    type Target = IncidenceCommon;

    fn deref(&self) -> &Self::Target {
        &self.common
    }
}

impl DerefMut for Event {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> CalDateTime {
        CalDateTime::utc(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn dt_end_and_duration_are_exclusive() {
        let mut event = Event::new();
        event.set_dt_start(Some(utc(2016, 7, 9, 12, 0, 0)));
        event.set_dt_end(Some(utc(2016, 7, 9, 13, 0, 0)));
        assert!(event.has_end_date());
        event.set_duration(Some(Duration::Seconds(7200)));
        assert!(!event.has_end_date());
        assert!(event.has_duration());
        assert_eq!(event.effective_dt_end(), Some(utc(2016, 7, 9, 14, 0, 0)));
        event.set_dt_end(Some(utc(2016, 7, 9, 13, 0, 0)));
        assert!(!event.has_duration());
    }

    #[test]
    fn multi_day_detection() {
        let mut event = Event::new();
        event.set_dt_start(Some(utc(2016, 7, 9, 12, 0, 0)));

        event.set_dt_end(Some(utc(2016, 7, 9, 13, 0, 0)));
        assert!(!event.is_multi_day());

        // Ending exactly at midnight still counts as single-day.
        event.set_dt_end(Some(utc(2016, 7, 10, 0, 0, 0)));
        assert!(!event.is_multi_day());

        event.set_dt_end(Some(utc(2016, 7, 10, 12, 0, 0)));
        assert!(event.is_multi_day());

        event.set_dt_start(Some(utc(2016, 12, 31, 0, 0, 1)));
        event.set_dt_end(Some(utc(2017, 1, 1, 0, 0, 1)));
        assert!(event.is_multi_day());
    }

    #[test]
    fn all_day_multi_day_uses_date_range() {
        let mut event = Event::new();
        event.set_all_day(true);
        event.set_dt_start(Some(CalDateTime::floating(2016, 7, 9, 0, 0, 0).unwrap()));
        event.set_dt_end(Some(CalDateTime::floating(2016, 7, 9, 0, 0, 0).unwrap()));
        assert!(!event.is_multi_day());
        event.set_dt_end(Some(CalDateTime::floating(2016, 7, 10, 0, 0, 0).unwrap()));
        assert!(event.is_multi_day());
    }

    #[test]
    fn status_validity_for_events() {
        let mut event = Event::new();
        event.set_status(Status::Confirmed);
        assert_eq!(*event.status(), Status::Confirmed);
        event.set_status(Status::NeedsAction); // to-do only
        assert_eq!(*event.status(), Status::Confirmed);
        event.set_status(Status::X("X-PENDING".into()));
        assert_eq!(*event.status(), Status::X("X-PENDING".into()));
    }

    #[test]
    fn clone_equals_original() {
        let mut event = Event::new();
        event.set_dt_start(Some(utc(2016, 7, 9, 12, 0, 0)));
        event.set_summary("Picnic");
        event.set_transparency(Transparency::Transparent);
        let copy = event.clone();
        assert_eq!(copy, event);
        assert!(copy.dirty_fields().is_empty());
    }
}
