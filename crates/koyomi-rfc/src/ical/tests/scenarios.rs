//! End-to-end scenarios across parser, model and occurrence expansion.

use std::rc::Rc;

use koyomi_core::calendar::Calendar;
use koyomi_core::datetime::{CalDateTime, TimeSpec};
use koyomi_core::occurrence::OccurrenceIterator;

use crate::format::CalFormat;
use crate::ical::ICalFormat;

fn load(text: &str) -> Rc<Calendar> {
    let calendar = Calendar::new(TimeSpec::Utc);
    ICalFormat::new()
        .from_string(&calendar, text)
        .expect("input should parse");
    calendar
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> CalDateTime {
    CalDateTime::utc(y, mo, d, h, mi, 0).unwrap()
}

#[test_log::test]
fn recurring_event_with_single_exception() {
    let calendar = load(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:A\r\n\
DTSTAMP:20130310T000000Z\r\n\
DTSTART:20130310T100000Z\r\n\
DTEND:20130310T110000Z\r\n\
RRULE:FREQ=DAILY\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:A\r\n\
DTSTAMP:20130310T000000Z\r\n\
RECURRENCE-ID:20130311T100000Z\r\n\
DTSTART:20130311T120000Z\r\n\
DTEND:20130311T130000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
    );

    let starts: Vec<_> =
        OccurrenceIterator::new(&calendar, &utc(2013, 3, 10, 10, 0), &utc(2013, 3, 12, 11, 0))
            .map(|o| o.start.unwrap())
            .collect();
    assert_eq!(
        starts,
        vec![
            utc(2013, 3, 10, 10, 0),
            utc(2013, 3, 11, 12, 0),
            utc(2013, 3, 12, 10, 0),
        ]
    );
}

#[test_log::test]
fn this_and_future_override() {
    let calendar = load(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:A\r\n\
DTSTAMP:20130310T000000Z\r\n\
DTSTART:20130310T100000Z\r\n\
RRULE:FREQ=DAILY;COUNT=5\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:A\r\n\
DTSTAMP:20130310T000000Z\r\n\
RECURRENCE-ID;RANGE=THISANDFUTURE:20130312T100000Z\r\n\
DTSTART:20130312T140000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
    );

    let starts: Vec<_> =
        OccurrenceIterator::new(&calendar, &utc(2013, 3, 10, 0, 0), &utc(2013, 3, 15, 0, 0))
            .map(|o| o.start.unwrap())
            .collect();
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

#[test_log::test]
fn priority_compatibility_mapping() {
    let calendar = load(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//K Desktop Environment//NONSGML KOrganizer 3.3.0//EN\r\n\
X-KDE-ICAL-IMPLEMENTATION-VERSION:1.0\r\n\
BEGIN:VTODO\r\n\
UID:prio\r\n\
DTSTAMP:20130310T000000Z\r\n\
PRIORITY:3\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n",
    );
    let ptr = calendar.incidence("prio").unwrap();
    assert_eq!(ptr.borrow().priority(), 5);
}

#[test_log::test]
fn non_matching_start_gets_excluded_for_pre35() {
    // DTSTART on a Tuesday with a Monday-only rule: the pre-3.5 compat
    // appends an EXDATE at the start.
    let calendar = load(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//K Desktop Environment//NONSGML KOrganizer 3.4.9//EN\r\n\
X-KDE-ICAL-IMPLEMENTATION-VERSION:1.0\r\n\
BEGIN:VEVENT\r\n\
UID:pre35\r\n\
DTSTAMP:20130310T000000Z\r\n\
DTSTART:20260106T090000Z\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
    );
    let ptr = calendar.incidence("pre35").unwrap();
    let incidence = ptr.borrow();
    let recurrence = incidence.recurrence().unwrap();
    assert!(!recurrence.recurs_at(&utc(2026, 1, 6, 9, 0)));
    assert!(recurrence.recurs_at(&utc(2026, 1, 12, 9, 0)));
}

#[test_log::test]
fn outlook_alarm_offsets_are_negated() {
    let calendar = load(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Microsoft Corporation//Outlook 9.0 MIMEDIR//EN\r\n\
BEGIN:VEVENT\r\n\
UID:outlook\r\n\
DTSTAMP:20130310T000000Z\r\n\
DTSTART:20130310T100000Z\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:PT15M\r\n\
DESCRIPTION:Reminder\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
    );
    let ptr = calendar.incidence("outlook").unwrap();
    let incidence = ptr.borrow();
    assert_eq!(
        incidence.alarms()[0].trigger(),
        koyomi_core::Trigger::OffsetStart(koyomi_core::Duration::Seconds(-900))
    );
}

#[test_log::test]
fn vtimezone_emission_round_trip() {
    // Emit a VTIMEZONE for Prague and parse it back; summer 1985 must
    // still be UTC+2 with DST, winter UTC+1 without.
    let earliest = chrono::NaiveDate::from_ymd_opt(1979, 2, 1).unwrap();
    let component = crate::tz::vtimezone_component(chrono_tz::Europe::Prague, earliest);
    let parsed = crate::tz::VTimeZone::parse(&component).unwrap();

    let july = chrono::NaiveDate::from_ymd_opt(1985, 7, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    assert_eq!(parsed.offset_at(july), 7200);
    assert!(parsed.is_dst_at(july));

    let january = chrono::NaiveDate::from_ymd_opt(1985, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    assert_eq!(parsed.offset_at(january), 3600);
    assert!(!parsed.is_dst_at(january));
}

#[test_log::test]
fn scheduling_message_parsing() {
    let calendar = Calendar::new(TimeSpec::Utc);
    let message = ICalFormat::new()
        .parse_scheduling_message(
            &calendar,
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
METHOD:REQUEST\r\n\
BEGIN:VEVENT\r\n\
UID:invite-1\r\n\
DTSTAMP:20130310T000000Z\r\n\
DTSTART:20130310T100000Z\r\n\
SUMMARY:Lunch?\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        )
        .unwrap();
    assert_eq!(message.method(), koyomi_core::ITipMethod::Request);
    assert_eq!(
        message.status(),
        koyomi_core::ScheduleMessageStatus::RequestNew
    );
    assert_eq!(message.incidence().summary(), "Lunch?");
}

#[test_log::test]
fn scheduling_message_without_method_fails() {
    let calendar = Calendar::new(TimeSpec::Utc);
    let err = ICalFormat::new()
        .parse_scheduling_message(
            &calendar,
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x\r\n\
DTSTART:20130310T100000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        )
        .unwrap_err();
    assert_eq!(err, koyomi_core::CalendarError::ParseMethodProperty);
}

#[test_log::test]
fn empty_scheduling_message_fails() {
    let calendar = Calendar::new(TimeSpec::Utc);
    assert_eq!(
        ICalFormat::new()
            .parse_scheduling_message(&calendar, "\n")
            .unwrap_err(),
        koyomi_core::CalendarError::ParseEmptyMessage
    );
}
