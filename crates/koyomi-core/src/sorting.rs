//! Stable sort operations over incidence lists.
//!
//! Every sort breaks ties on the case-insensitive summary so repeated
//! sorting is deterministic.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

use crate::datetime::CalDateTime;
use crate::incidence::Incidence;

/// Sort direction shared by all sort operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Sort key for event lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSortField {
    #[default]
    StartDate,
    EndDate,
    Summary,
}

/// Sort key for to-do lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoSortField {
    #[default]
    StartDate,
    DueDate,
    Priority,
    PercentComplete,
    Summary,
    Created,
    Categories,
}

/// Sort key for journal lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalSortField {
    #[default]
    Date,
    Summary,
}

type Ptr = Rc<RefCell<Incidence>>;

fn cmp_opt_dt(a: Option<CalDateTime>, b: Option<CalDateTime>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.to_utc().cmp(&b.to_utc()),
    }
}

fn cmp_summary(a: &Incidence, b: &Incidence) -> Ordering {
    a.summary()
        .to_lowercase()
        .cmp(&b.summary().to_lowercase())
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Sorts events in place.
pub fn sort_events(events: &mut [Ptr], field: EventSortField, direction: SortDirection) {
    events.sort_by(|a, b| {
        let a = a.borrow();
        let b = b.borrow();
        let primary = match field {
            EventSortField::StartDate => cmp_opt_dt(a.dt_start(), b.dt_start()),
            EventSortField::EndDate => cmp_opt_dt(
                a.as_event().and_then(crate::incidence::Event::effective_dt_end),
                b.as_event().and_then(crate::incidence::Event::effective_dt_end),
            ),
            EventSortField::Summary => Ordering::Equal,
        };
        directed(primary.then_with(|| cmp_summary(&a, &b)), direction)
    });
}

/// Sorts to-dos in place. Lower priority integers sort first (they are
/// more urgent).
pub fn sort_todos(todos: &mut [Ptr], field: TodoSortField, direction: SortDirection) {
    todos.sort_by(|a, b| {
        let a = a.borrow();
        let b = b.borrow();
        let primary = match (field, a.as_todo(), b.as_todo()) {
            (TodoSortField::StartDate, Some(ta), Some(tb)) => {
                cmp_opt_dt(ta.dt_start(false), tb.dt_start(false))
            }
            (TodoSortField::DueDate, Some(ta), Some(tb)) => {
                cmp_opt_dt(ta.dt_due(false), tb.dt_due(false))
            }
            (TodoSortField::Priority, _, _) => a.priority().cmp(&b.priority()),
            (TodoSortField::PercentComplete, Some(ta), Some(tb)) => {
                ta.percent_complete().cmp(&tb.percent_complete())
            }
            (TodoSortField::Created, _, _) => cmp_opt_dt(a.created(), b.created()),
            (TodoSortField::Categories, _, _) => {
                a.categories().join(",").cmp(&b.categories().join(","))
            }
            _ => Ordering::Equal,
        };
        directed(primary.then_with(|| cmp_summary(&a, &b)), direction)
    });
}

/// Sorts journals in place.
pub fn sort_journals(journals: &mut [Ptr], field: JournalSortField, direction: SortDirection) {
    journals.sort_by(|a, b| {
        let a = a.borrow();
        let b = b.borrow();
        let primary = match field {
            JournalSortField::Date => cmp_opt_dt(a.dt_start(), b.dt_start()),
            JournalSortField::Summary => Ordering::Equal,
        };
        directed(primary.then_with(|| cmp_summary(&a, &b)), direction)
    });
}
