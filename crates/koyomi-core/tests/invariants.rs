//! Cross-module invariants of the incidence model.

use koyomi_core::alarm::Alarm;
use koyomi_core::datetime::{CalDateTime, TimeSpec};
use koyomi_core::duration::Duration;
use koyomi_core::incidence::{Event, Field, GEO_INVALID, Incidence, Todo};
use koyomi_core::recurrence::{Frequency, RecurrenceRule};

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> CalDateTime {
    CalDateTime::utc(y, mo, d, h, mi, 0).unwrap()
}

fn populated_event() -> Event {
    let mut event = Event::new();
    event.set_dt_start(Some(utc(2026, 1, 23, 14, 0)));
    event.set_dt_end(Some(utc(2026, 1, 23, 15, 0)));
    event.set_summary("Deep copy me");
    event.set_categories(vec!["Work".into(), "travel".into()]);
    event.add_alarm(Alarm::display("soon", Duration::Seconds(-600)));
    event.set_geo(50.08, 14.42);
    let start = event.dt_start().unwrap();
    let mut rule = RecurrenceRule::new(Frequency::Weekly, start);
    rule.set_duration(8);
    event.recurrence_mut().add_rrule(rule);
    event
}

#[test_log::test]
fn clone_equals_and_is_clean() {
    let event = populated_event();
    assert!(!event.dirty_fields().is_empty());
    let copy = event.clone();
    assert_eq!(copy, event);
    assert!(copy.dirty_fields().is_empty());
    // The clone is deep: recurrence and alarms came along.
    assert!(copy.recurs());
    assert_eq!(copy.alarms().len(), 1);
}

#[test_log::test]
fn geo_coordinates_stand_or_fall_together() {
    let mut event = Event::new();
    event.set_geo(50.0, 400.0);
    assert!((event.geo_latitude() - GEO_INVALID).abs() < f64::EPSILON);
    assert!((event.geo_longitude() - GEO_INVALID).abs() < f64::EPSILON);

    event.set_geo(50.0, 14.0);
    event.set_geo(f64::NAN, 14.0);
    assert!(!event.has_geo());
    assert!((event.geo_longitude() - GEO_INVALID).abs() < f64::EPSILON);
}

#[test_log::test]
fn due_date_exists_only_when_set() {
    let mut todo = Todo::new();
    assert!(!todo.has_due_date());
    todo.set_summary("due-less");
    assert!(!todo.has_due_date());
    todo.set_dt_due(Some(utc(2026, 1, 30, 17, 0)), true);
    assert!(todo.has_due_date());
}

#[test_log::test]
fn setting_equal_start_is_not_dirty() {
    let mut event = Event::new();
    let start = utc(2026, 1, 23, 14, 0);
    event.set_dt_start(Some(start));
    event.base_mut().reset_dirty_fields();
    event.set_dt_start(Some(start));
    assert!(!event.field_dirty(Field::DtStart));
    event.set_dt_start(Some(start.add_seconds(60)));
    assert!(event.field_dirty(Field::DtStart));
}

#[test_log::test]
fn next_of_previous_returns_to_the_occurrence() {
    let event = populated_event();
    let recurrence = event.recurrence().unwrap();
    let occurrences = recurrence.times_in_interval(
        &utc(2026, 1, 1, 0, 0),
        &utc(2026, 12, 31, 0, 0),
    );
    assert_eq!(occurrences.len(), 8);
    for probe in occurrences.iter().skip(1) {
        let prev = recurrence
            .previous_occurrence(probe)
            .expect("every non-first occurrence has a predecessor");
        let next = recurrence
            .next_occurrence(&prev)
            .expect("a successor follows every non-final occurrence");
        assert!(next <= *probe, "next({prev}) = {next} overshoots {probe}");
    }
}

#[test_log::test]
fn duration_units_are_not_interchangeable() {
    assert_ne!(Duration::Days(7), Duration::Seconds(7 * 24 * 60 * 60));
    assert_eq!(Duration::Days(7), Duration::Days(7));
}

#[test_log::test]
fn alarm_equality_is_schedule_and_type() {
    let a = Alarm::display("wake", Duration::Seconds(-300));
    let mut b = Alarm::display("wake", Duration::Seconds(-300));
    assert_eq!(a, b);
    b.set_repeat(2, Duration::Seconds(60));
    assert_ne!(a, b);
}

#[test_log::test]
fn incidence_equality_distinguishes_instances() {
    let mut main = Event::new();
    main.base_mut().set_uid("shared");
    let mut exception = main.clone();
    exception.set_recurrence_id(Some(utc(2013, 3, 11, 10, 0)));

    let main = Incidence::Event(main);
    let exception = Incidence::Event(exception);
    assert_ne!(main, exception);
    assert_ne!(main.instance_identifier(), exception.instance_identifier());
}
