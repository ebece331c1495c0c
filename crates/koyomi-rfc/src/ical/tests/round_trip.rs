//! Round-trip tests: parse, emit, parse again, compare the models.

use std::rc::Rc;

use koyomi_core::calendar::Calendar;
use koyomi_core::datetime::TimeSpec;

use super::fixtures::{
    VEVENT_FULL, VEVENT_MINIMAL, VEVENT_RECURRING, VEVENT_ZONED, VJOURNAL_BASIC, VTODO_BASIC,
};
use crate::format::CalFormat;
use crate::ical::ICalFormat;

fn load(text: &str) -> Rc<Calendar> {
    let calendar = Calendar::new(TimeSpec::Utc);
    ICalFormat::new()
        .from_string(&calendar, text)
        .expect("fixture should parse");
    calendar
}

/// Parses, emits, re-parses, and compares every incidence structurally.
fn round_trip(input: &str) {
    let first = load(input);
    let emitted = ICalFormat::new().to_string(&first).expect("emission should succeed");
    let second = load(&emitted);

    let firsts = [first.raw_events(), first.raw_todos(), first.raw_journals()].concat();
    assert!(!firsts.is_empty(), "fixture contained no incidences");

    for ptr in firsts {
        let original = ptr.borrow();
        let reloaded = second
            .incidence_instance(original.uid(), original.recurrence_id().as_ref())
            .unwrap_or_else(|| panic!("{} lost in round trip\n{emitted}", original.uid()));
        let reloaded = reloaded.borrow();
        assert_eq!(*original, *reloaded, "mismatch after round trip:\n{emitted}");
    }
}

#[test]
fn minimal_event() {
    round_trip(VEVENT_MINIMAL);
}

#[test]
fn recurring_event() {
    round_trip(VEVENT_RECURRING);
}

#[test]
fn zoned_event_with_vtimezone() {
    round_trip(VEVENT_ZONED);
}

#[test]
fn basic_todo() {
    round_trip(VTODO_BASIC);
}

#[test]
fn basic_journal() {
    round_trip(VJOURNAL_BASIC);
}

#[test]
fn fully_populated_event() {
    round_trip(VEVENT_FULL);
}

#[test]
fn emitted_lines_are_folded() {
    let calendar = Calendar::new(TimeSpec::Utc);
    let mut event = koyomi_core::incidence::Event::new();
    event.base_mut().set_uid("long@example.com");
    event.set_dt_start(koyomi_core::CalDateTime::utc(2026, 1, 23, 9, 0, 0));
    event.set_description("d".repeat(400));
    calendar.add_event(event).unwrap();

    let emitted = ICalFormat::new().to_string(&calendar).unwrap();
    for line in emitted.split("\r\n") {
        assert!(line.len() <= 75, "line exceeds 75 octets: {line}");
    }
}

#[test]
fn all_day_end_survives_round_trip() {
    let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:allday@example.com\r\n\
DTSTAMP:20260123T120000Z\r\n\
DTSTART;VALUE=DATE:20260123\r\n\
DTEND;VALUE=DATE:20260125\r\n\
SUMMARY:Two whole days\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let first = load(input);
    let emitted = ICalFormat::new().to_string(&first).unwrap();
    // Inclusive end on day 24, emitted exclusive again as the 25th.
    assert!(emitted.contains("DTEND;VALUE=DATE:20260125"));
    round_trip(input);
}
