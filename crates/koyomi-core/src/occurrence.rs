//! Iteration over every occurrence of a calendar's incidences in a time
//! window.
//!
//! Recurring incidences are expanded; exception instances replace the
//! occurrences they override (cancelled exceptions swallow them); a
//! this-and-future exception re-anchors every later occurrence by its own
//! start offset.

use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::calendar::{Calendar, IncidencePtr};
use crate::calfilter::{CalFilter, hides_completed_todos};
use crate::datetime::CalDateTime;
use crate::incidence::Status;

/// One concrete appearance of an incidence.
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// The incidence governing this occurrence (an exception instance
    /// where one applies).
    pub incidence: IncidencePtr,
    /// The timestamp this occurrence has in the main incidence's
    /// recurrence, if it stems from one.
    pub recurrence_id: Option<CalDateTime>,
    /// When this occurrence actually starts.
    pub start: Option<CalDateTime>,
}

/// Forward-only iterator over the occurrences in `[from, to]`.
///
/// Results are grouped per parent incidence in generation order, not
/// globally time-sorted.
pub struct OccurrenceIterator {
    occurrences: std::vec::IntoIter<Occurrence>,
}

impl OccurrenceIterator {
    /// Expands every incidence of the calendar over the window.
    #[must_use]
    pub fn new(calendar: &Calendar, from: &CalDateTime, to: &CalDateTime) -> Self {
        let spec = from.spec();
        let filter = calendar.filter();

        let mut candidates = calendar.raw_events_in_range(from.date_in(spec), to.date_in(spec), spec);
        candidates.extend(calendar.raw_todos_in_range(from.date_in(spec), to.date_in(spec), spec));
        candidates.extend(calendar.raw_journals_in_range(from.date_in(spec), to.date_in(spec), spec));
        if let Some(filter) = &filter {
            filter.apply(&mut candidates);
        }

        Self::from_candidates(calendar, filter.as_ref(), &candidates, from, to)
    }

    /// Expands a single incidence over the window.
    #[must_use]
    pub fn for_incidence(
        calendar: &Calendar,
        incidence: &IncidencePtr,
        from: &CalDateTime,
        to: &CalDateTime,
    ) -> Self {
        let filter = calendar.filter();
        let candidates = vec![Rc::clone(incidence)];
        Self::from_candidates(calendar, filter.as_ref(), &candidates, from, to)
    }

    fn from_candidates(
        calendar: &Calendar,
        filter: Option<&CalFilter>,
        candidates: &[IncidencePtr],
        from: &CalDateTime,
        to: &CalDateTime,
    ) -> Self {
        let mut occurrences = Vec::new();
        for candidate in candidates {
            if candidate.borrow().has_recurrence_id() {
                // Exceptions surface while expanding their main.
                continue;
            }
            if candidate.borrow().recurs() {
                expand_recurring(calendar, filter, candidate, from, to, &mut occurrences);
            } else {
                let inc = candidate.borrow();
                if !occurrence_is_hidden(calendar, filter, candidate, inc.dt_start().as_ref()) {
                    occurrences.push(Occurrence {
                        incidence: Rc::clone(candidate),
                        recurrence_id: None,
                        start: inc.dt_start(),
                    });
                }
            }
        }
        Self {
            occurrences: occurrences.into_iter(),
        }
    }
}

impl Iterator for OccurrenceIterator {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Self::Item> {
        self.occurrences.next()
    }
}

/// Expands one recurring main incidence, substituting exception instances.
fn expand_recurring(
    calendar: &Calendar,
    filter: Option<&CalFilter>,
    main: &IncidencePtr,
    from: &CalDateTime,
    to: &CalDateTime,
    out: &mut Vec<Occurrence>,
) {
    let exceptions: HashMap<DateTime<Utc>, IncidencePtr> = calendar
        .instances(main)
        .into_iter()
        .filter_map(|ptr| {
            let rid = ptr.borrow().recurrence_id()?;
            Some((rid.to_utc(), ptr))
        })
        .collect();

    let times = {
        let inc = main.borrow();
        let Some(recurrence) = inc.recurrence() else {
            return;
        };
        recurrence.times_in_interval(from, to)
    };

    // The incidence currently governing occurrences; switches to an
    // exception while one applies.
    let mut current: IncidencePtr = Rc::clone(main);
    // The governing this-and-future exception and its offset, carried
    // forward until a later one supersedes it.
    let mut carried: IncidencePtr = Rc::clone(main);
    let mut offset: i64 = 0;
    let mut carried_offset: i64 = 0;

    for recurrence_id in times {
        let mut start = recurrence_id;
        let mut reset_current = false;

        if let Some(exception) = exceptions.get(&recurrence_id.to_utc()) {
            if *exception.borrow().status() == Status::Cancelled {
                continue;
            }
            current = Rc::clone(exception);
            let exc = exception.borrow();
            start = exc.dt_start().unwrap_or(recurrence_id);
            reset_current = !exc.this_and_future();
            offset = exc
                .recurrence_id()
                .zip(exc.dt_start())
                .map_or(0, |(rid, dt)| rid.seconds_to(&dt));
            if exc.this_and_future() {
                carried = Rc::clone(exception);
                carried_offset = offset;
            }
        } else if !Rc::ptr_eq(main, &current) {
            // A this-and-future exception is active; shift this
            // occurrence by its offset.
            start = start.add_seconds(offset);
        }

        if !occurrence_is_hidden(calendar, filter, &current, Some(&start)) {
            out.push(Occurrence {
                incidence: Rc::clone(&current),
                recurrence_id: Some(recurrence_id),
                start: Some(start),
            });
        }

        if reset_current {
            current = Rc::clone(&carried);
            offset = carried_offset;
        }
    }
}

/// The filter cannot see individual occurrences, so completed-to-do
/// hiding is applied here per occurrence.
fn occurrence_is_hidden(
    calendar: &Calendar,
    filter: Option<&CalFilter>,
    incidence: &IncidencePtr,
    occurrence_start: Option<&CalDateTime>,
) -> bool {
    let inc = incidence.borrow();
    let Some(todo) = inc.as_todo() else {
        return false;
    };
    if !hides_completed_todos(filter) {
        return false;
    }
    if inc.recurs() {
        if let (Some(start), Some(due)) = (occurrence_start, todo.dt_due(false))
            && start.to_utc() < due.to_utc()
        {
            return true;
        }
    } else if inc.has_recurrence_id() {
        let completed_main = calendar.incidence(inc.uid()).is_some_and(|main| {
            main.borrow().as_todo().is_some_and(crate::incidence::Todo::is_completed)
        });
        if completed_main {
            return true;
        }
    } else {
        // Non-recurring plain to-do: hidden when itself completed.
        return todo.is_completed();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::TimeSpec;
    use crate::incidence::{Event, Todo};
    use crate::recurrence::{Frequency, RecurrenceRule};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> CalDateTime {
        CalDateTime::utc(y, mo, d, h, mi, 0).unwrap()
    }

    fn daily_event(uid: &str, start: CalDateTime, count: i32) -> Event {
        let mut event = Event::new();
        event.base_mut().set_uid(uid);
        event.set_dt_start(Some(start));
        event.set_dt_end(Some(start.add_seconds(3600)));
        let mut rule = RecurrenceRule::new(Frequency::Daily, start);
        rule.set_duration(count);
        event.recurrence_mut().add_rrule(rule);
        event
    }

    #[test]
    fn plain_event_yields_once() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let mut event = Event::new();
        event.base_mut().set_uid("e");
        event.set_dt_start(Some(utc(2013, 3, 10, 10, 0)));
        calendar.add_event(event).unwrap();

        let hits: Vec<_> =
            OccurrenceIterator::new(&calendar, &utc(2013, 3, 1, 0, 0), &utc(2013, 3, 31, 0, 0))
                .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start, Some(utc(2013, 3, 10, 10, 0)));
        assert_eq!(hits[0].recurrence_id, None);
    }

    #[test]
    fn exception_substitutes_single_occurrence() {
        let calendar = Calendar::new(TimeSpec::Utc);
        calendar
            .add_event(daily_event("A", utc(2013, 3, 10, 10, 0), -1))
            .unwrap();

        let mut exception = Event::new();
        exception.base_mut().set_uid("A");
        exception.set_recurrence_id(Some(utc(2013, 3, 11, 10, 0)));
        exception.set_dt_start(Some(utc(2013, 3, 11, 12, 0)));
        exception.set_dt_end(Some(utc(2013, 3, 11, 13, 0)));
        calendar.add_event(exception).unwrap();

        let hits: Vec<_> = OccurrenceIterator::new(
            &calendar,
            &utc(2013, 3, 10, 10, 0),
            &utc(2013, 3, 12, 11, 0),
        )
        .collect();

        let starts: Vec<_> = hits.iter().map(|o| o.start.unwrap()).collect();
        assert_eq!(
            starts,
            vec![
                utc(2013, 3, 10, 10, 0),
                utc(2013, 3, 11, 12, 0),
                utc(2013, 3, 12, 10, 0),
            ]
        );
        // The substituted occurrence reports the exception incidence.
        assert!(hits[1].incidence.borrow().has_recurrence_id());
        assert_eq!(hits[1].recurrence_id, Some(utc(2013, 3, 11, 10, 0)));
    }

    #[test]
    fn cancelled_exception_swallows_occurrence() {
        let calendar = Calendar::new(TimeSpec::Utc);
        calendar
            .add_event(daily_event("A", utc(2013, 3, 10, 10, 0), 3))
            .unwrap();

        let mut cancelled = Event::new();
        cancelled.base_mut().set_uid("A");
        cancelled.set_recurrence_id(Some(utc(2013, 3, 11, 10, 0)));
        cancelled.set_dt_start(Some(utc(2013, 3, 11, 10, 0)));
        cancelled.set_status(Status::Cancelled);
        calendar.add_event(cancelled).unwrap();

        let hits: Vec<_> =
            OccurrenceIterator::new(&calendar, &utc(2013, 3, 10, 0, 0), &utc(2013, 3, 13, 0, 0))
                .collect();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|o| o.start != Some(utc(2013, 3, 11, 10, 0))));
    }

    #[test]
    fn this_and_future_shifts_the_tail() {
        let calendar = Calendar::new(TimeSpec::Utc);
        calendar
            .add_event(daily_event("A", utc(2013, 3, 10, 10, 0), 5))
            .unwrap();

        let mut future = Event::new();
        future.base_mut().set_uid("A");
        future.set_recurrence_id(Some(utc(2013, 3, 12, 10, 0)));
        future.set_this_and_future(true);
        future.set_dt_start(Some(utc(2013, 3, 12, 14, 0)));
        future.set_dt_end(Some(utc(2013, 3, 12, 15, 0)));
        calendar.add_event(future).unwrap();

        let hits: Vec<_> =
            OccurrenceIterator::new(&calendar, &utc(2013, 3, 10, 0, 0), &utc(2013, 3, 15, 0, 0))
                .collect();
        let starts: Vec<_> = hits.iter().map(|o| o.start.unwrap()).collect();
        assert_eq!(
            starts,
            vec![
                utc(2013, 3, 10, 10, 0),
                utc(2013, 3, 11, 10, 0),
                utc(2013, 3, 12, 14, 0),
                utc(2013, 3, 13, 14, 0),
                utc(2013, 3, 14, 14, 0),
            ]
        );
    }

    #[test]
    fn completed_todos_hidden_by_filter() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let mut todo = Todo::new();
        todo.base_mut().set_uid("t");
        todo.set_dt_start(Some(utc(2013, 3, 10, 9, 0)));
        todo.set_dt_due(Some(utc(2013, 3, 10, 17, 0)), true);
        todo.set_is_completed(true);
        calendar.add_todo(todo).unwrap();

        let mut filter = CalFilter::new("f");
        filter.set_criteria(CalFilter::HIDE_COMPLETED_TODOS);
        calendar.set_filter(Some(filter));

        let hits: Vec<_> =
            OccurrenceIterator::new(&calendar, &utc(2013, 3, 1, 0, 0), &utc(2013, 3, 31, 0, 0))
                .collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn single_incidence_iteration() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let ptr = calendar
            .add_event(daily_event("A", utc(2013, 3, 10, 10, 0), 5))
            .unwrap();
        let hits: Vec<_> = OccurrenceIterator::for_incidence(
            &calendar,
            &ptr,
            &utc(2013, 3, 10, 0, 0),
            &utc(2013, 3, 12, 23, 0),
        )
        .collect();
        assert_eq!(hits.len(), 3);
    }
}
