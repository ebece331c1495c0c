//! The in-memory calendar: ownership, indexing and notification fan-out
//! for incidences.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use chrono::NaiveDate;

use crate::alarm::Alarm;
use crate::calfilter::CalFilter;
use crate::datetime::{CalDateTime, TimeSpec};
use crate::incidence::{
    Event, Incidence, IncidenceKind, IncidenceObserver, Journal, Status, Todo,
};
use crate::person::Person;

/// Shared handle to an incidence owned by a calendar.
pub type IncidencePtr = Rc<RefCell<Incidence>>;

/// Whether a calendar accepts writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    ReadOnly,
    #[default]
    ReadWrite,
}

/// Receives calendar-level change notifications.
///
/// Callbacks run synchronously inside the mutating call and must not
/// mutate the incidence that triggered them.
pub trait CalendarObserver {
    fn incidence_added(&self, incidence: &IncidencePtr) {
        let _ = incidence;
    }

    fn incidence_changed(&self, uid: &str) {
        let _ = uid;
    }

    fn incidence_about_to_be_deleted(&self, incidence: &IncidencePtr) {
        let _ = incidence;
    }

    fn incidence_deleted(&self, incidence: &IncidencePtr, calendar: &Calendar) {
        let _ = (incidence, calendar);
    }

    fn calendar_modified(&self, modified: bool, calendar: &Calendar) {
        let _ = (modified, calendar);
    }
}

/// One alarm that fires inside a queried window.
#[derive(Debug, Clone)]
pub struct AlarmEntry {
    pub incidence: IncidencePtr,
    pub alarm: Alarm,
    pub time: CalDateTime,
}

/// An in-memory calendar owning its incidences.
///
/// Incidences are indexed by their instance identifier (uid, or uid plus
/// recurrence-id for exception instances). The calendar registers itself
/// as observer on every incidence it owns, so any mutation through an
/// [`IncidencePtr`] flips the modified flag and reaches calendar
/// observers.
///
/// All state is interior-mutable: a calendar lives behind an `Rc` and is
/// driven from a single task (concurrent use is not supported).
pub struct Calendar {
    /// Back-reference to the owning `Rc`, for observer registration.
    self_weak: Weak<Calendar>,
    incidences: RefCell<BTreeMap<String, IncidencePtr>>,
    spec: Cell<TimeSpec>,
    product_id: RefCell<String>,
    owner: RefCell<Person>,
    modified: Cell<bool>,
    filter: RefCell<Option<CalFilter>>,
    observers: RefCell<Vec<Weak<dyn CalendarObserver>>>,
    observers_enabled: Cell<bool>,
    loading: Cell<bool>,
    name: RefCell<String>,
    icon: RefCell<String>,
    id: RefCell<String>,
    access_mode: Cell<AccessMode>,
}

impl Calendar {
    /// A new empty calendar with the given default timezone.
    #[must_use]
    pub fn new(spec: TimeSpec) -> Rc<Self> {
        Rc::new_cyclic(|self_weak| Self {
            self_weak: self_weak.clone(),
            incidences: RefCell::new(BTreeMap::new()),
            spec: Cell::new(spec),
            product_id: RefCell::new(crate::format::prod_id().to_string()),
            owner: RefCell::new(Person::default()),
            modified: Cell::new(false),
            filter: RefCell::new(None),
            observers: RefCell::new(Vec::new()),
            observers_enabled: Cell::new(true),
            loading: Cell::new(false),
            name: RefCell::new(String::new()),
            icon: RefCell::new(String::new()),
            id: RefCell::new(String::new()),
            access_mode: Cell::new(AccessMode::ReadWrite),
        })
    }

    /// The calendar's default timezone, used to interpret floating times.
    #[must_use]
    pub fn time_spec(&self) -> TimeSpec {
        self.spec.get()
    }

    pub fn set_time_spec(&self, spec: TimeSpec) {
        self.spec.set(spec);
    }

    /// Reinterprets every timestamp carried in `old` into `new`, keeping
    /// wall-clock values, across all owned incidences.
    pub fn shift_times(&self, old: TimeSpec, new: TimeSpec) {
        for incidence in self.incidences.borrow().values() {
            incidence.borrow_mut().shift_times(old, new);
        }
        self.set_modified(true);
    }

    #[must_use]
    pub fn product_id(&self) -> String {
        self.product_id.borrow().clone()
    }

    pub fn set_product_id(&self, product_id: impl Into<String>) {
        *self.product_id.borrow_mut() = product_id.into();
    }

    #[must_use]
    pub fn owner(&self) -> Person {
        self.owner.borrow().clone()
    }

    pub fn set_owner(&self, owner: Person) {
        *self.owner.borrow_mut() = owner;
        self.set_modified(true);
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    #[must_use]
    pub fn icon(&self) -> String {
        self.icon.borrow().clone()
    }

    pub fn set_icon(&self, icon: impl Into<String>) {
        *self.icon.borrow_mut() = icon.into();
    }

    #[must_use]
    pub fn id(&self) -> String {
        self.id.borrow().clone()
    }

    pub fn set_id(&self, id: impl Into<String>) {
        *self.id.borrow_mut() = id.into();
    }

    #[must_use]
    pub fn access_mode(&self) -> AccessMode {
        self.access_mode.get()
    }

    pub fn set_access_mode(&self, mode: AccessMode) {
        self.access_mode.set(mode);
    }

    /// True while a storage collaborator is populating the calendar.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified.get()
    }

    /// Sets the modified flag; observers hear about actual transitions.
    pub fn set_modified(&self, modified: bool) {
        if self.modified.replace(modified) != modified {
            self.notify(|o| o.calendar_modified(modified, self));
        }
    }

    #[must_use]
    pub fn filter(&self) -> Option<CalFilter> {
        self.filter.borrow().clone()
    }

    pub fn set_filter(&self, filter: Option<CalFilter>) {
        *self.filter.borrow_mut() = filter;
    }

    pub fn register_observer(&self, observer: &Rc<dyn CalendarObserver>) {
        let weak = Rc::downgrade(observer);
        let mut observers = self.observers.borrow_mut();
        if !observers.iter().any(|o| o.ptr_eq(&weak)) {
            observers.push(weak);
        }
    }

    pub fn unregister_observer(&self, observer: &Rc<dyn CalendarObserver>) {
        let weak = Rc::downgrade(observer);
        self.observers.borrow_mut().retain(|o| !o.ptr_eq(&weak));
    }

    /// Toggles calendar-observer broadcasting.
    pub fn set_observers_enabled(&self, enabled: bool) {
        self.observers_enabled.set(enabled);
    }

    fn notify(&self, f: impl Fn(&dyn CalendarObserver)) {
        if !self.observers_enabled.get() {
            return;
        }
        let observers: Vec<_> = self.observers.borrow().clone();
        for observer in observers {
            if let Some(observer) = observer.upgrade() {
                f(&*observer);
            }
        }
    }

    /// Adds an event. Returns the shared handle, or `None` for read-only
    /// calendars and duplicate instance identifiers.
    pub fn add_event(&self, event: Event) -> Option<IncidencePtr> {
        self.add_incidence(Incidence::Event(event))
    }

    pub fn add_todo(&self, todo: Todo) -> Option<IncidencePtr> {
        self.add_incidence(Incidence::Todo(todo))
    }

    pub fn add_journal(&self, journal: Journal) -> Option<IncidencePtr> {
        self.add_incidence(Incidence::Journal(journal))
    }

    /// Takes ownership of an incidence.
    pub fn add_incidence(&self, incidence: Incidence) -> Option<IncidencePtr> {
        if self.access_mode.get() == AccessMode::ReadOnly {
            tracing::warn!("rejecting add on read-only calendar");
            return None;
        }
        let key = incidence.instance_identifier();
        if self.incidences.borrow().contains_key(&key) {
            tracing::warn!(key = %key, "rejecting duplicate incidence");
            return None;
        }

        let ptr: IncidencePtr = Rc::new(RefCell::new(incidence));
        if let Some(rc) = self.self_weak.upgrade() {
            let observer: Rc<dyn IncidenceObserver> = rc;
            ptr.borrow_mut().base_mut().register_observer(&observer);
        }

        self.incidences.borrow_mut().insert(key, Rc::clone(&ptr));
        self.notify(|o| o.incidence_added(&ptr));
        self.set_modified(true);
        Some(ptr)
    }

    /// Removes an incidence by handle. Returns false when it is not in
    /// this calendar.
    pub fn delete_incidence(&self, incidence: &IncidencePtr) -> bool {
        if self.access_mode.get() == AccessMode::ReadOnly {
            return false;
        }
        let key = incidence.borrow().instance_identifier();
        let owned = self
            .incidences
            .borrow()
            .get(&key)
            .is_some_and(|existing| Rc::ptr_eq(existing, incidence));
        if !owned {
            return false;
        }
        self.notify(|o| o.incidence_about_to_be_deleted(incidence));
        let Some(removed) = self.incidences.borrow_mut().remove(&key) else {
            return false;
        };
        self.notify(|o| o.incidence_deleted(&removed, self));
        self.set_modified(true);
        true
    }

    /// Removes the main incidence with this uid (no recurrence-id).
    pub fn delete_incidence_by_uid(&self, uid: &str) -> bool {
        match self.incidence(uid) {
            Some(ptr) => self.delete_incidence(&ptr),
            None => false,
        }
    }

    /// The main incidence with this uid.
    #[must_use]
    pub fn incidence(&self, uid: &str) -> Option<IncidencePtr> {
        self.incidences.borrow().get(uid).cloned()
    }

    /// An incidence addressed by uid and optional recurrence-id.
    #[must_use]
    pub fn incidence_instance(
        &self,
        uid: &str,
        recurrence_id: Option<&CalDateTime>,
    ) -> Option<IncidencePtr> {
        let key = match recurrence_id {
            Some(rid) => format!("{uid}{rid}"),
            None => uid.to_string(),
        };
        self.incidences.borrow().get(&key).cloned()
    }

    /// All exception instances of the given incidence.
    #[must_use]
    pub fn instances(&self, incidence: &IncidencePtr) -> Vec<IncidencePtr> {
        let uid = incidence.borrow().uid().to_string();
        self.incidences
            .borrow()
            .values()
            .filter(|ptr| {
                let inc = ptr.borrow();
                inc.uid() == uid && inc.has_recurrence_id()
            })
            .cloned()
            .collect()
    }

    /// Finds an incidence by its scheduling id.
    #[must_use]
    pub fn incidence_from_scheduling_id(&self, scheduling_id: &str) -> Option<IncidencePtr> {
        self.incidences
            .borrow()
            .values()
            .find(|ptr| ptr.borrow().scheduling_id() == scheduling_id)
            .cloned()
    }

    fn of_kind(&self, kind: IncidenceKind) -> Vec<IncidencePtr> {
        self.incidences
            .borrow()
            .values()
            .filter(|ptr| ptr.borrow().kind() == kind)
            .cloned()
            .collect()
    }

    /// All events, unfiltered and unsorted.
    #[must_use]
    pub fn raw_events(&self) -> Vec<IncidencePtr> {
        self.of_kind(IncidenceKind::Event)
    }

    /// Events overlapping the date window `[from, to]` viewed in `spec`.
    #[must_use]
    pub fn raw_events_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        spec: TimeSpec,
    ) -> Vec<IncidencePtr> {
        self.of_kind(IncidenceKind::Event)
            .into_iter()
            .filter(|ptr| {
                let inc = ptr.borrow();
                let Some(event) = inc.as_event() else {
                    return false;
                };
                if inc.has_recurrence_id() {
                    // Exceptions surface through their main incidence.
                    return span_overlaps(
                        inc.dt_start(),
                        event.effective_dt_end(),
                        from,
                        to,
                        spec,
                    );
                }
                if inc.recurs() {
                    return recurrence_overlaps(&inc, from, to, spec);
                }
                span_overlaps(inc.dt_start(), event.effective_dt_end(), from, to, spec)
            })
            .collect()
    }

    /// All to-dos, unfiltered and unsorted.
    #[must_use]
    pub fn raw_todos(&self) -> Vec<IncidencePtr> {
        self.of_kind(IncidenceKind::Todo)
    }

    /// To-dos starting or due inside the date window `[from, to]`.
    #[must_use]
    pub fn raw_todos_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        spec: TimeSpec,
    ) -> Vec<IncidencePtr> {
        self.of_kind(IncidenceKind::Todo)
            .into_iter()
            .filter(|ptr| {
                let inc = ptr.borrow();
                let Some(todo) = inc.as_todo() else {
                    return false;
                };
                if inc.recurs() && !inc.has_recurrence_id() {
                    return recurrence_overlaps(&inc, from, to, spec);
                }
                span_overlaps(todo.dt_start(false), todo.dt_due(false), from, to, spec)
            })
            .collect()
    }

    /// All journals, unfiltered and unsorted.
    #[must_use]
    pub fn raw_journals(&self) -> Vec<IncidencePtr> {
        self.of_kind(IncidenceKind::Journal)
    }

    /// Journals whose start falls inside the date window `[from, to]`.
    #[must_use]
    pub fn raw_journals_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        spec: TimeSpec,
    ) -> Vec<IncidencePtr> {
        self.of_kind(IncidenceKind::Journal)
            .into_iter()
            .filter(|ptr| {
                let inc = ptr.borrow();
                inc.dt_start().is_some_and(|start| {
                    let date = start.date_in(spec);
                    date >= from && date <= to
                })
            })
            .collect()
    }

    /// Events with the calendar filter applied.
    #[must_use]
    pub fn events(&self) -> Vec<IncidencePtr> {
        let mut events = self.raw_events();
        if let Some(filter) = self.filter.borrow().as_ref() {
            filter.apply(&mut events);
        }
        events
    }

    /// To-dos with the calendar filter applied.
    #[must_use]
    pub fn todos(&self) -> Vec<IncidencePtr> {
        let mut todos = self.raw_todos();
        if let Some(filter) = self.filter.borrow().as_ref() {
            filter.apply(&mut todos);
        }
        todos
    }

    /// Journals with the calendar filter applied.
    #[must_use]
    pub fn journals(&self) -> Vec<IncidencePtr> {
        let mut journals = self.raw_journals();
        if let Some(filter) = self.filter.borrow().as_ref() {
            filter.apply(&mut journals);
        }
        journals
    }

    /// All alarms firing inside `[from, to]`, including repetitions and
    /// recurrence-expanded parents. Cancelled incidences contribute
    /// nothing.
    #[must_use]
    pub fn alarms(&self, from: &CalDateTime, to: &CalDateTime) -> Vec<AlarmEntry> {
        let mut entries = Vec::new();
        for ptr in self.incidences.borrow().values() {
            let inc = ptr.borrow();
            if *inc.status() == Status::Cancelled {
                continue;
            }
            if inc.recurs() && !inc.has_recurrence_id() {
                collect_recurring_alarms(ptr, &inc, from, to, &mut entries);
            } else {
                collect_plain_alarms(ptr, &inc, from, to, &mut entries);
            }
        }
        entries.sort_by(|a, b| a.time.to_utc().cmp(&b.time.to_utc()));
        entries
    }
}

impl IncidenceObserver for Calendar {
    fn incidence_updated(&self, uid: &str) {
        self.set_modified(true);
        self.notify(|o| o.incidence_changed(uid));
    }
}

/// True when `[start, end]` intersects the date window.
fn span_overlaps(
    start: Option<CalDateTime>,
    end: Option<CalDateTime>,
    from: NaiveDate,
    to: NaiveDate,
    spec: TimeSpec,
) -> bool {
    let Some(start) = start else {
        return false;
    };
    let end = end.unwrap_or(start);
    start.date_in(spec) <= to && end.date_in(spec) >= from
}

/// True when a recurring incidence has at least one occurrence in the
/// window.
fn recurrence_overlaps(inc: &Incidence, from: NaiveDate, to: NaiveDate, spec: TimeSpec) -> bool {
    let Some(recurrence) = inc.recurrence() else {
        return false;
    };
    let window_start = CalDateTime::new(from.and_hms_opt(0, 0, 0).unwrap_or_default(), spec);
    let window_end = CalDateTime::new(to.and_hms_opt(23, 59, 59).unwrap_or_default(), spec);
    if let Some(end) = recurrence.end_date()
        && end.to_utc() < window_start.to_utc()
    {
        return false;
    }
    if let Some(start) = recurrence.start()
        && start.to_utc() > window_end.to_utc()
    {
        return false;
    }
    true
}

/// Collects alarms of a non-recurring incidence (or exception instance).
fn collect_plain_alarms(
    ptr: &IncidencePtr,
    inc: &Incidence,
    from: &CalDateTime,
    to: &CalDateTime,
    entries: &mut Vec<AlarmEntry>,
) {
    let start = inc.dt_start();
    let end = inc.date_time_end();
    for alarm in inc.alarms() {
        if !alarm.enabled() {
            continue;
        }
        for time in alarm.times(start.as_ref(), end.as_ref()) {
            if time.to_utc() >= from.to_utc() && time.to_utc() <= to.to_utc() {
                entries.push(AlarmEntry {
                    incidence: Rc::clone(ptr),
                    alarm: alarm.clone(),
                    time,
                });
            }
        }
    }
}

/// Collects alarms of a recurring incidence by expanding its occurrences
/// over a window widened by the alarm offset and repetition span.
fn collect_recurring_alarms(
    ptr: &IncidencePtr,
    inc: &Incidence,
    from: &CalDateTime,
    to: &CalDateTime,
    entries: &mut Vec<AlarmEntry>,
) {
    let Some(recurrence) = inc.recurrence() else {
        return;
    };
    let start_to_end = match (inc.dt_start(), inc.date_time_end()) {
        (Some(s), Some(e)) => s.seconds_to(&e),
        _ => 0,
    };
    for alarm in inc.alarms() {
        if !alarm.enabled() {
            continue;
        }
        // Relative seconds from an occurrence start to the alarm time.
        let relative = match alarm.offset() {
            Some(offset) => {
                let base = if alarm.has_end_offset() { start_to_end } else { 0 };
                base + offset.as_seconds()
            }
            None => {
                // Absolute alarms of recurring incidences fire once.
                collect_plain_alarms(ptr, inc, from, to, entries);
                continue;
            }
        };
        let repeat_span = alarm.snooze_time().as_seconds() * i64::from(alarm.repeat_count().max(0));
        let window_start = from.add_seconds(-(relative + repeat_span));
        let occurrences = recurrence.times_in_interval(&window_start, to);
        for occurrence in occurrences {
            let first = occurrence.add_seconds(relative);
            let mut time = first;
            let mut remaining = alarm.repeat_count().max(0);
            loop {
                if time.to_utc() >= from.to_utc() && time.to_utc() <= to.to_utc() {
                    entries.push(AlarmEntry {
                        incidence: Rc::clone(ptr),
                        alarm: alarm.clone(),
                        time,
                    });
                }
                if remaining == 0 || alarm.snooze_time().is_zero() {
                    break;
                }
                time = alarm.snooze_time().end(&time);
                remaining -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration;
    use crate::recurrence::{Frequency, RecurrenceRule};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> CalDateTime {
        CalDateTime::utc(y, mo, d, h, mi, 0).unwrap()
    }

    fn simple_event(uid: &str, start: CalDateTime, hours: i64) -> Event {
        let mut event = Event::new();
        event.base_mut().set_uid(uid);
        event.set_dt_start(Some(start));
        event.set_dt_end(Some(start.add_seconds(hours * 3600)));
        event
    }

    #[test]
    fn add_and_lookup() {
        let calendar = Calendar::new(TimeSpec::Utc);
        calendar
            .add_event(simple_event("e1", utc(2026, 1, 23, 9, 0), 1))
            .unwrap();
        assert!(calendar.incidence("e1").is_some());
        assert!(calendar.incidence("nope").is_none());
        assert!(calendar.is_modified());
    }

    #[test]
    fn duplicate_instances_rejected() {
        let calendar = Calendar::new(TimeSpec::Utc);
        calendar
            .add_event(simple_event("e1", utc(2026, 1, 23, 9, 0), 1))
            .unwrap();
        assert!(calendar.add_event(simple_event("e1", utc(2026, 1, 24, 9, 0), 1)).is_none());
    }

    #[test]
    fn exception_instances_are_separate() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let main = simple_event("e1", utc(2013, 3, 10, 10, 0), 1);
        calendar.add_event(main).unwrap();

        let mut exception = simple_event("e1", utc(2013, 3, 11, 12, 0), 1);
        exception.set_recurrence_id(Some(utc(2013, 3, 11, 10, 0)));
        calendar.add_event(exception).unwrap();

        let main_ptr = calendar.incidence("e1").unwrap();
        assert_eq!(calendar.instances(&main_ptr).len(), 1);
        let rid = utc(2013, 3, 11, 10, 0);
        assert!(calendar.incidence_instance("e1", Some(&rid)).is_some());
    }

    #[test]
    fn delete_notifies_and_removes() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let ptr = calendar
            .add_event(simple_event("e1", utc(2026, 1, 23, 9, 0), 1))
            .unwrap();
        assert!(calendar.delete_incidence(&ptr));
        assert!(calendar.incidence("e1").is_none());
        assert!(!calendar.delete_incidence(&ptr));
    }

    #[test]
    fn mutation_through_handle_marks_calendar_modified() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let ptr = calendar
            .add_event(simple_event("e1", utc(2026, 1, 23, 9, 0), 1))
            .unwrap();
        calendar.set_modified(false);
        ptr.borrow_mut().set_summary("changed");
        assert!(calendar.is_modified());
    }

    #[test]
    fn raw_events_in_range_window() {
        let calendar = Calendar::new(TimeSpec::Utc);
        calendar
            .add_event(simple_event("in", utc(2026, 1, 23, 9, 0), 1))
            .unwrap();
        calendar
            .add_event(simple_event("out", utc(2026, 3, 1, 9, 0), 1))
            .unwrap();

        let from = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 1, 25).unwrap();
        let events = calendar.raw_events_in_range(from, to, TimeSpec::Utc);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].borrow().uid(), "in");
    }

    #[test]
    fn recurring_event_overlaps_window() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let start = utc(2026, 1, 1, 9, 0);
        let mut event = simple_event("r", start, 1);
        event
            .recurrence_mut()
            .add_rrule(RecurrenceRule::new(Frequency::Daily, start));
        calendar.add_event(event).unwrap();

        let from = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 6, 2).unwrap();
        assert_eq!(calendar.raw_events_in_range(from, to, TimeSpec::Utc).len(), 1);
    }

    #[test]
    fn alarms_in_window() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let mut event = simple_event("e1", utc(2026, 1, 23, 14, 0), 1);
        event.add_alarm(Alarm::display("reminder", Duration::Seconds(-900)));
        calendar.add_event(event).unwrap();

        let hits = calendar.alarms(&utc(2026, 1, 23, 13, 0), &utc(2026, 1, 23, 14, 0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].time, utc(2026, 1, 23, 13, 45));

        let misses = calendar.alarms(&utc(2026, 1, 23, 14, 0), &utc(2026, 1, 23, 15, 0));
        assert!(misses.is_empty());
    }

    #[test]
    fn recurring_alarms_expand() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let start = utc(2026, 1, 1, 9, 0);
        let mut event = simple_event("r", start, 1);
        let mut rule = RecurrenceRule::new(Frequency::Daily, start);
        rule.set_duration(10);
        event.recurrence_mut().add_rrule(rule);
        event.add_alarm(Alarm::display("daily nag", Duration::Seconds(-600)));
        calendar.add_event(event).unwrap();

        let hits = calendar.alarms(&utc(2026, 1, 2, 0, 0), &utc(2026, 1, 4, 23, 0));
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].time, utc(2026, 1, 2, 8, 50));
        assert_eq!(hits[2].time, utc(2026, 1, 4, 8, 50));
    }

    #[test]
    fn cancelled_incidences_contribute_no_alarms() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let mut event = simple_event("c", utc(2026, 1, 23, 14, 0), 1);
        event.add_alarm(Alarm::display("nope", Duration::Seconds(-900)));
        event.set_status(Status::Cancelled);
        calendar.add_event(event).unwrap();
        assert!(calendar
            .alarms(&utc(2026, 1, 23, 0, 0), &utc(2026, 1, 24, 0, 0))
            .is_empty());
    }

    #[test]
    fn shift_times_moves_floating() {
        let calendar = Calendar::new(TimeSpec::Floating);
        let mut event = Event::new();
        event.base_mut().set_uid("f");
        event.set_dt_start(Some(CalDateTime::floating(2026, 1, 23, 9, 0, 0).unwrap()));
        calendar.add_event(event).unwrap();

        calendar.shift_times(TimeSpec::Floating, TimeSpec::Zoned(chrono_tz::Europe::Prague));
        let ptr = calendar.incidence("f").unwrap();
        let start = ptr.borrow().dt_start().unwrap();
        assert_eq!(start.spec(), TimeSpec::Zoned(chrono_tz::Europe::Prague));
    }

    #[test]
    fn scheduling_id_lookup() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let mut event = simple_event("e1", utc(2026, 1, 23, 9, 0), 1);
        event.set_scheduling_id("ticket-42");
        calendar.add_event(event).unwrap();
        assert!(calendar.incidence_from_scheduling_id("ticket-42").is_some());
        assert!(calendar.incidence_from_scheduling_id("ticket-43").is_none());
    }
}
