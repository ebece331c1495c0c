//! Free/busy blocks (RFC 5545 VFREEBUSY).

use std::ops::{Deref, DerefMut};

use crate::datetime::CalDateTime;
use crate::incidence::{Field, IncidenceBase};
use crate::period::Period;

/// A list of busy periods for one attendee or resource.
///
/// Free/busy blocks share the base payload with incidences but are not
/// incidences themselves: they carry no recurrence, alarms or attachments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeBusy {
    base: IncidenceBase,
    dt_end: Option<CalDateTime>,
    periods: Vec<Period>,
}

impl FreeBusy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A block spanning `[start, end]` with no busy periods yet.
    #[must_use]
    pub fn with_span(start: CalDateTime, end: CalDateTime) -> Self {
        let mut fb = Self::default();
        fb.base.set_dt_start(Some(start));
        fb.dt_end = Some(end);
        fb.base.reset_dirty_fields();
        fb
    }

    #[must_use]
    pub const fn base(&self) -> &IncidenceBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut IncidenceBase {
        &mut self.base
    }

    #[must_use]
    pub const fn dt_end(&self) -> Option<CalDateTime> {
        self.dt_end
    }

    pub fn set_dt_end(&mut self, dt_end: Option<CalDateTime>) {
        if self.base.is_read_only() || self.dt_end == dt_end {
            return;
        }
        self.base.update();
        self.dt_end = dt_end;
        self.base.set_field_dirty(Field::DtEnd);
        self.base.updated();
    }

    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn add_period(&mut self, period: Period) {
        if self.base.is_read_only() {
            return;
        }
        self.base.update();
        self.periods.push(period);
        self.base.set_field_dirty(Field::Periods);
        self.base.updated();
    }

    pub fn set_periods(&mut self, periods: Vec<Period>) {
        if self.base.is_read_only() || self.periods == periods {
            return;
        }
        self.base.update();
        self.periods = periods;
        self.base.set_field_dirty(Field::Periods);
        self.base.updated();
    }

    /// Sorts the busy periods chronologically.
    pub fn sort_periods(&mut self) {
        self.periods.sort();
    }
}

impl Deref for FreeBusy {
    type Target = IncidenceBase;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for FreeBusy {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration;

    #[test]
    fn periods_sort_chronologically() {
        let mut fb = FreeBusy::new();
        let late = CalDateTime::utc(2026, 1, 23, 14, 0, 0).unwrap();
        let early = CalDateTime::utc(2026, 1, 23, 9, 0, 0).unwrap();
        fb.add_period(Period::with_duration(late, Duration::Seconds(3600)));
        fb.add_period(Period::with_duration(early, Duration::Seconds(3600)));
        fb.sort_periods();
        assert_eq!(fb.periods()[0].start(), early);
    }

    #[test]
    fn span_constructor() {
        let start = CalDateTime::utc(2026, 1, 23, 0, 0, 0).unwrap();
        let end = CalDateTime::utc(2026, 1, 24, 0, 0, 0).unwrap();
        let fb = FreeBusy::with_span(start, end);
        assert_eq!(fb.dt_start(), Some(start));
        assert_eq!(fb.dt_end(), Some(end));
        assert!(fb.dirty_fields().is_empty());
    }
}
