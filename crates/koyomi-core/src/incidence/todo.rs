//! To-dos (RFC 5545 VTODO).

use std::ops::{Deref, DerefMut};

use chrono::NaiveTime;

use crate::datetime::{CalDateTime, TimeSpec};
use crate::incidence::{Field, IncidenceCommon, Status};

/// A to-do: an incidence with a due date, a completion percentage and an
/// optional completion timestamp.
///
/// A recurring to-do is never completed directly: completing it advances
/// the current occurrence instead (see [`set_completed`](Self::set_completed)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Todo {
    common: IncidenceCommon,
    dt_due: Option<CalDateTime>,
    /// Start-time identifier of the earliest uncompleted occurrence.
    dt_recurrence: Option<CalDateTime>,
    percent_complete: i32,
    completed: Option<CalDateTime>,
}

impl Todo {
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

    /// False until a due date is explicitly set.
    #[must_use]
    pub fn has_due_date(&self) -> bool {
        self.dt_due.is_some()
    }

    #[must_use]
    pub fn has_start_date(&self) -> bool {
        self.common.dt_start().is_some()
    }

    /// The due date.
    ///
    /// For a recurring to-do, `first` selects the stored due of the first
    /// occurrence; otherwise the due of the current occurrence is derived
    /// from the occurrence identifier. The legacy path (no dt-start)
    /// tracks occurrences by their due time directly.
    #[must_use]
    pub fn dt_due(&self, first: bool) -> Option<CalDateTime> {
        let due = self.dt_due?;
        if self.common.recurs() && !first {
            if let Some(current) = self.dt_recurrence {
                return match self.common.dt_start() {
                    Some(start) => Some(current.add_seconds(start.seconds_to(&due))),
                    None => Some(current),
                };
            }
        }
        Some(due)
    }

    /// Sets the due date.
    ///
    /// With `first` (or on a non-recurring to-do) the stored due moves;
    /// otherwise the current occurrence is re-anchored so that its due
    /// becomes `dt_due`.
    pub fn set_dt_due(&mut self, dt_due: Option<CalDateTime>, first: bool) {
        if self.common.is_read_only() {
            return;
        }
        if self.common.recurs() && !first {
            let Some(due) = dt_due else {
                return;
            };
            let current = match self.common.dt_start() {
                Some(start) => {
                    let delta = start.seconds_to(&self.dt_due.unwrap_or(due));
                    due.add_seconds(-delta)
                }
                None => due,
            };
            self.common.update();
            self.dt_recurrence = Some(current);
            self.common.set_field_dirty(Field::DtDue);
            self.common.updated();
            return;
        }
        if self.dt_due == dt_due {
            return;
        }
        self.common.update();
        self.dt_due = dt_due;
        self.common.set_field_dirty(Field::DtDue);
        self.common.updated();
    }

    /// The start of the current occurrence for recurring to-dos, the
    /// stored start otherwise.
    #[must_use]
    pub fn dt_start(&self, first: bool) -> Option<CalDateTime> {
        if self.common.recurs() && !first {
            if let Some(current) = self.dt_recurrence {
                return Some(current);
            }
        }
        self.common.dt_start()
    }

    /// The start-time identifier of the earliest uncompleted occurrence.
    #[must_use]
    pub const fn dt_recurrence(&self) -> Option<CalDateTime> {
        self.dt_recurrence
    }

    pub fn set_dt_recurrence(&mut self, dt: Option<CalDateTime>) {
        if self.common.is_read_only() || self.dt_recurrence == dt {
            return;
        }
        self.common.update();
        self.dt_recurrence = dt;
        self.common.set_field_dirty(Field::DtDue);
        self.common.updated();
    }

    #[must_use]
    pub const fn percent_complete(&self) -> i32 {
        self.percent_complete
    }

    /// Sets the completion percentage, clamped to 0..=100. Dropping below
    /// 100 demotes a completed status and clears the completion stamp.
    pub fn set_percent_complete(&mut self, percent: i32) {
        let percent = percent.clamp(0, 100);
        if self.common.is_read_only() || self.percent_complete == percent {
            return;
        }
        self.common.update();
        self.percent_complete = percent;
        if percent < 100 {
            self.completed = None;
        }
        self.common.set_field_dirty(Field::PercentComplete);
        self.common.updated();
        if percent < 100 && *self.common.status() == Status::Completed {
            self.common.set_status_unchecked(Status::None);
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.percent_complete == 100
    }

    /// The completion timestamp; may be absent even for a completed to-do.
    #[must_use]
    pub const fn completed(&self) -> Option<CalDateTime> {
        self.completed
    }

    /// Completes the to-do at `when`.
    ///
    /// A recurring to-do advances to its next occurrence instead and stays
    /// uncompleted: with a start date, start and due both shift by the
    /// recurrence step; a legacy to-do (due only) shifts just the due.
    /// `when` anchors the advancement: the new occurrence is the first one
    /// that is not yet over at that point.
    pub fn set_completed(&mut self, when: CalDateTime) {
        if self.common.is_read_only() {
            return;
        }
        if self.recur_todo(&when) {
            return;
        }
        self.common.update();
        self.percent_complete = 100;
        self.completed = Some(when);
        self.common.set_field_dirty(Field::Completed);
        self.common.updated();
    }

    /// Marks complete or incomplete without a timestamp.
    pub fn set_is_completed(&mut self, completed: bool) {
        if self.common.is_read_only() {
            return;
        }
        self.common.update();
        self.percent_complete = if completed { 100 } else { 0 };
        self.completed = None;
        self.common.set_field_dirty(Field::Completed);
        self.common.updated();
    }

    /// Advances a recurring to-do past `now`. Returns false when the
    /// to-do does not recur or has no further occurrences (in which case
    /// it genuinely completes).
    fn recur_todo(&mut self, now: &CalDateTime) -> bool {
        if !self.common.recurs() {
            return false;
        }
        let Some(anchor) = self.dt_start(false).or_else(|| self.dt_due(false)) else {
            return false;
        };
        let all_day = self.common.all_day();
        let legacy = self.common.dt_start().is_none();

        let threshold = if all_day {
            CalDateTime::new(now.to_spec(anchor.spec()).date().and_time(NaiveTime::MIN), anchor.spec())
        } else {
            *now
        };

        let mut next = {
            let Some(rec) = self.common.recurrence() else {
                return false;
            };
            let mut candidate = rec.next_occurrence(&anchor);
            loop {
                match candidate {
                    None => return false,
                    Some(c) if c < threshold => candidate = rec.next_occurrence(&c),
                    Some(c) => break c,
                }
            }
        };

        if legacy {
            // Occurrences are tracked by their due time.
            self.common.update();
            self.dt_recurrence = Some(next);
            self.common.set_field_dirty(Field::DtDue);
            self.common.updated();
            return true;
        }

        if all_day {
            // Keep the stored wall-clock time on the advanced date.
            if let Some(start) = self.common.dt_start() {
                next = CalDateTime::new(next.date().and_time(start.naive().time()), next.spec());
            }
        }
        self.common.update();
        self.dt_recurrence = Some(next);
        self.common.set_field_dirty(Field::DtStart);
        self.common.updated();
        true
    }

    /// Sets the status; to-dos accept none, completed, needs-action,
    /// cancelled, in-process and X values.
    pub fn set_status(&mut self, status: Status) {
        match status {
            Status::None
            | Status::Completed
            | Status::NeedsAction
            | Status::Cancelled
            | Status::InProcess
            | Status::X(_) => self.common.set_status_unchecked(status),
            _ => {
                tracing::warn!(status = %status.as_str(), "invalid status for a to-do");
            }
        }
    }

    pub(crate) fn shift_times_todo(&mut self, old: TimeSpec, new: TimeSpec) {
        self.common.shift_times(old, new);
        for slot in [&mut self.dt_due, &mut self.dt_recurrence, &mut self.completed] {
            if let Some(dt) = slot
                && dt.spec() == old
            {
                *slot = Some(dt.reinterpret(new));
            }
        }
    }
}

impl Deref for Todo {
    type Target = IncidenceCommon;

    fn deref(&self) -> &Self::Target {
        &self.common
    }
}

impl DerefMut for Todo {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Frequency, RecurrenceRule};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> CalDateTime {
        CalDateTime::utc(y, mo, d, h, mi, 0).unwrap()
    }

    fn make_daily(todo: &mut Todo) {
        let start = todo
            .common()
            .dt_start()
            .or_else(|| todo.dt_due(true))
            .unwrap();
        let rule = RecurrenceRule::new(Frequency::Daily, start);
        let rec = todo.recurrence_mut();
        rec.set_start(start);
        rec.add_rrule(rule);
    }

    #[test]
    fn has_due_date_only_when_set() {
        let mut todo = Todo::new();
        assert!(!todo.has_due_date());
        todo.set_dt_due(Some(utc(2026, 1, 23, 17, 0)), false);
        assert!(todo.has_due_date());
        todo.set_dt_due(None, true);
        assert!(!todo.has_due_date());
    }

    #[test]
    fn simple_completion() {
        let mut todo = Todo::new();
        let now = utc(2026, 1, 23, 12, 0);
        todo.set_completed(now);
        assert!(todo.is_completed());
        assert_eq!(todo.percent_complete(), 100);
        assert_eq!(todo.completed(), Some(now));
    }

    #[test]
    fn percent_below_hundred_clears_completion() {
        let mut todo = Todo::new();
        todo.set_completed(utc(2026, 1, 23, 12, 0));
        todo.set_status(Status::Completed);
        todo.set_percent_complete(80);
        assert!(!todo.is_completed());
        assert_eq!(todo.completed(), None);
        assert_eq!(*todo.status(), Status::None);
    }

    #[test]
    fn percent_is_clamped() {
        let mut todo = Todo::new();
        todo.set_percent_complete(150);
        assert_eq!(todo.percent_complete(), 100);
        todo.set_percent_complete(-3);
        assert_eq!(todo.percent_complete(), 0);
    }

    #[test]
    fn recurring_completion_advances_instead() {
        let mut todo = Todo::new();
        // Started yesterday relative to the completion call below.
        todo.set_dt_start(Some(utc(2013, 3, 9, 9, 0)));
        todo.set_dt_due(Some(utc(2013, 3, 10, 9, 0)), true);
        make_daily(&mut todo);

        let now = utc(2013, 3, 10, 8, 0); // before today's 09:00 occurrence
        todo.set_completed(now);

        assert!(!todo.is_completed());
        assert_eq!(todo.percent_complete(), 0);
        // Start advanced by one day, delta to due preserved.
        assert_eq!(todo.dt_start(false), Some(utc(2013, 3, 10, 9, 0)));
        assert_eq!(todo.dt_due(false), Some(utc(2013, 3, 11, 9, 0)));
        // The first occurrence stays addressable.
        assert_eq!(todo.dt_start(true), Some(utc(2013, 3, 9, 9, 0)));
        assert_eq!(todo.dt_due(true), Some(utc(2013, 3, 10, 9, 0)));
    }

    #[test]
    fn recurring_completion_twice_advances_twice() {
        let mut todo = Todo::new();
        todo.set_dt_start(Some(utc(2013, 3, 6, 9, 0)));
        todo.set_dt_due(Some(utc(2013, 3, 7, 9, 0)), true);
        make_daily(&mut todo);

        let now = utc(2013, 3, 10, 9, 30); // past today's occurrence
        todo.set_completed(now);
        assert_eq!(todo.dt_start(false), Some(utc(2013, 3, 11, 9, 0)));

        todo.set_completed(now);
        assert_eq!(todo.dt_start(false), Some(utc(2013, 3, 12, 9, 0)));
        assert!(!todo.is_completed());
    }

    #[test]
    fn legacy_recurring_todo_shifts_due_only() {
        let mut todo = Todo::new();
        todo.set_dt_due(Some(utc(2013, 3, 10, 17, 0)), true);
        make_daily(&mut todo);
        assert!(!todo.has_start_date());

        todo.set_completed(utc(2013, 3, 10, 18, 0));
        assert!(!todo.is_completed());
        assert_eq!(todo.dt_due(false), Some(utc(2013, 3, 11, 17, 0)));
        assert_eq!(todo.dt_due(true), Some(utc(2013, 3, 10, 17, 0)));
    }

    #[test]
    fn all_day_advances_to_today() {
        let mut todo = Todo::new();
        todo.set_all_day(true);
        todo.set_dt_start(Some(CalDateTime::floating(2013, 3, 9, 0, 0, 0).unwrap()));
        todo.set_dt_due(Some(CalDateTime::floating(2013, 3, 10, 0, 0, 0).unwrap()), true);
        make_daily(&mut todo);

        // "Now" is mid-day on the 10th; the occurrence of the 10th still
        // counts for an all-day to-do.
        todo.set_completed(CalDateTime::floating(2013, 3, 10, 14, 0, 0).unwrap());
        assert_eq!(
            todo.dt_start(false).map(|dt| dt.date()),
            chrono::NaiveDate::from_ymd_opt(2013, 3, 10)
        );
    }

    #[test]
    fn counted_recurrence_exhausts_and_completes() {
        let mut todo = Todo::new();
        todo.set_dt_start(Some(utc(2013, 3, 9, 9, 0)));
        todo.set_dt_due(Some(utc(2013, 3, 9, 17, 0)), true);
        let rule = {
            let mut r = RecurrenceRule::new(Frequency::Daily, utc(2013, 3, 9, 9, 0));
            r.set_duration(2);
            r
        };
        todo.recurrence_mut().add_rrule(rule);

        // Far past the last occurrence: completing really completes.
        todo.set_completed(utc(2014, 1, 1, 0, 0));
        assert!(todo.is_completed());
    }

    #[test]
    fn status_validity_for_todos() {
        let mut todo = Todo::new();
        todo.set_status(Status::InProcess);
        assert_eq!(*todo.status(), Status::InProcess);
        todo.set_status(Status::Confirmed); // event-only
        assert_eq!(*todo.status(), Status::InProcess);
    }
}
