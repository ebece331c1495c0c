//! Filters deciding which incidences a view gets to see.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;

use crate::datetime::CalDateTime;
use crate::incidence::Incidence;

/// A criteria-driven incidence filter.
///
/// Criteria are a bit set; an incidence passes when no enabled criterion
/// rejects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalFilter {
    name: String,
    criteria: u32,
    categories: Vec<String>,
    emails: Vec<String>,
    enabled: bool,
    /// Days a completed to-do stays visible before `HIDE_COMPLETED_TODOS`
    /// kicks in.
    completed_time_span: i64,
}

impl CalFilter {
    /// Hide incidences that recur.
    pub const HIDE_RECURRING: u32 = 1;
    /// Hide completed to-dos once they are old enough.
    pub const HIDE_COMPLETED_TODOS: u32 = 2;
    /// Show only incidences matching the category list (instead of hiding
    /// them).
    pub const SHOW_CATEGORIES: u32 = 4;
    /// Hide to-dos that have not started yet or are already done.
    pub const HIDE_INACTIVE_TODOS: u32 = 8;
    /// Hide to-dos without an attendee from the email list.
    pub const HIDE_NO_MATCHING_ATTENDEE_TODOS: u32 = 16;

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            criteria: 0,
            categories: Vec::new(),
            emails: Vec::new(),
            enabled: true,
            completed_time_span: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub const fn criteria(&self) -> u32 {
        self.criteria
    }

    pub fn set_criteria(&mut self, criteria: u32) {
        self.criteria = criteria;
    }

    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.categories = categories;
    }

    #[must_use]
    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn set_emails(&mut self, emails: Vec<String>) {
        self.emails = emails;
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub const fn completed_time_span(&self) -> i64 {
        self.completed_time_span
    }

    pub fn set_completed_time_span(&mut self, days: i64) {
        self.completed_time_span = days;
    }

    /// True when the incidence passes the filter.
    #[must_use]
    pub fn filter_incidence(&self, incidence: &Incidence) -> bool {
        if !self.enabled {
            return true;
        }

        if self.criteria & Self::HIDE_RECURRING != 0 && incidence.recurs() {
            return false;
        }

        if let Incidence::Todo(todo) = incidence {
            if self.criteria & Self::HIDE_COMPLETED_TODOS != 0 && todo.is_completed() {
                let old_enough = todo.completed().is_none_or(|done| {
                    let now = CalDateTime::from_utc(Utc::now());
                    done.seconds_to(&now) >= self.completed_time_span * 86_400
                });
                if old_enough {
                    return false;
                }
            }
            if self.criteria & Self::HIDE_INACTIVE_TODOS != 0 {
                let now = CalDateTime::from_utc(Utc::now());
                let not_started = todo
                    .dt_start(false)
                    .is_some_and(|start| start.to_utc() > now.to_utc());
                if not_started || todo.is_completed() {
                    return false;
                }
            }
            if self.criteria & Self::HIDE_NO_MATCHING_ATTENDEE_TODOS != 0
                && !todo
                    .attendees()
                    .iter()
                    .any(|a| self.emails.iter().any(|e| e == a.email()))
            {
                return false;
            }
        }

        let matched = incidence
            .categories()
            .iter()
            .any(|c| self.categories.iter().any(|f| f.eq_ignore_ascii_case(c)));
        if self.criteria & Self::SHOW_CATEGORIES != 0 {
            matched
        } else {
            !matched
        }
    }

    /// Removes everything the filter rejects from `incidences`.
    pub fn apply(&self, incidences: &mut Vec<Rc<RefCell<Incidence>>>) {
        if !self.enabled {
            return;
        }
        incidences.retain(|inc| self.filter_incidence(&inc.borrow()));
    }
}

impl Default for CalFilter {
    fn default() -> Self {
        Self::new("")
    }
}

/// Convenience check used by the occurrence iterator.
#[must_use]
pub fn hides_completed_todos(filter: Option<&CalFilter>) -> bool {
    filter.is_some_and(|f| f.enabled() && f.criteria() & CalFilter::HIDE_COMPLETED_TODOS != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incidence::{Event, Todo};

    fn event_with_category(category: &str) -> Incidence {
        let mut event = Event::new();
        event.set_categories(vec![category.to_string()]);
        Incidence::Event(event)
    }

    #[test]
    fn disabled_filter_passes_everything() {
        let mut filter = CalFilter::new("off");
        filter.set_criteria(CalFilter::HIDE_RECURRING);
        filter.set_enabled(false);
        let event = event_with_category("work");
        assert!(filter.filter_incidence(&event));
    }

    #[test]
    fn hide_completed_todos() {
        let mut filter = CalFilter::new("f");
        filter.set_criteria(CalFilter::HIDE_COMPLETED_TODOS);
        let mut todo = Todo::new();
        todo.set_is_completed(true);
        assert!(!filter.filter_incidence(&Incidence::Todo(todo)));
        let open = Todo::new();
        assert!(filter.filter_incidence(&Incidence::Todo(open)));
    }

    #[test]
    fn category_show_and_hide_modes() {
        let mut filter = CalFilter::new("f");
        filter.set_categories(vec!["work".into()]);

        // Default mode hides matching categories.
        assert!(!filter.filter_incidence(&event_with_category("Work")));
        assert!(filter.filter_incidence(&event_with_category("home")));

        filter.set_criteria(CalFilter::SHOW_CATEGORIES);
        assert!(filter.filter_incidence(&event_with_category("Work")));
        assert!(!filter.filter_incidence(&event_with_category("home")));
    }

    #[test]
    fn hide_recurring() {
        use crate::recurrence::{Frequency, RecurrenceRule};

        let mut filter = CalFilter::new("f");
        filter.set_criteria(CalFilter::HIDE_RECURRING);
        let mut event = Event::new();
        let start = CalDateTime::utc(2026, 1, 5, 9, 0, 0).unwrap();
        event.set_dt_start(Some(start));
        event
            .recurrence_mut()
            .add_rrule(RecurrenceRule::new(Frequency::Weekly, start));
        assert!(!filter.filter_incidence(&Incidence::Event(event)));
    }
}
