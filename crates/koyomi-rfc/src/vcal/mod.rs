//! Legacy vCalendar 1.0 support (load only).
//!
//! vCalendar shares the content-line syntax with iCalendar but differs in
//! property vocabulary, in its enum-string recurrence notation and in how
//! timezones are declared (calendar-level TZ and DAYLIGHT properties).

use std::rc::Rc;

use chrono::{NaiveDateTime, NaiveTime};

use koyomi_core::alarm::{Alarm, AlarmAction, Trigger};
use koyomi_core::attendee::{Attendee, PartStat, Role};
use koyomi_core::calendar::Calendar;
use koyomi_core::datetime::{CalDateTime, TimeSpec};
use koyomi_core::error::{CalendarError, CalendarResult};
use koyomi_core::incidence::{Event, Incidence, RelationType, Secrecy, Status, Todo, Transparency};
use koyomi_core::person::Person;
use koyomi_core::recurrence::{Frequency, RecurrenceRule, WeekdayNum};

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::format::CalFormat;
use crate::ical::core::{Component, ComponentKind, ContentLine};
use crate::ical::parse::{parse as parse_tree, values};
use crate::tz::{TimeZoneResolver, VTimeZone};

/// Synthetic TZID for the calendar-level TZ/DAYLIGHT declaration.
const VCAL_TZID: &str = "vCalendar-Timezone";

/// The vCalendar 1.0 format. Writing is not supported.
#[derive(Debug, Default)]
pub struct VCalFormat;

impl VCalFormat {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CalFormat for VCalFormat {
    fn from_string(&mut self, calendar: &Rc<Calendar>, text: &str) -> CalendarResult<()> {
        if text.trim().is_empty() {
            return Err(CalendarError::ParseEmptyMessage);
        }
        let root = parse_tree(text)
            .map_err(|err| CalendarError::ParseVcal(err.to_string()))?;
        match root.property_value("VERSION") {
            Some("1.0") => {}
            Some("2.0") => return Err(CalendarError::CalVersion2),
            Some(other) => return Err(CalendarError::CalVersionUnknown(other.to_string())),
            None => return Err(CalendarError::VersionPropertyMissing),
        }

        if let Some(product_id) = root.property_value("PRODID") {
            calendar.set_product_id(product_id);
        }

        let local_spec = local_spec_from_tz(&root);

        calendar.set_loading(true);
        for child in &root.children {
            let incidence = match child.kind {
                ComponentKind::Event => read_event(child, local_spec),
                ComponentKind::Todo => read_todo(child, local_spec),
                _ => {
                    tracing::warn!(name = %child.name, "skipping unknown vCalendar component");
                    continue;
                }
            };
            match incidence {
                Ok(incidence) => {
                    if calendar.add_incidence(incidence).is_none() {
                        tracing::warn!("calendar rejected vCalendar incidence");
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed vCalendar incidence");
                }
            }
        }
        calendar.set_loading(false);
        Ok(())
    }

    fn to_string(&self, _calendar: &Rc<Calendar>) -> CalendarResult<String> {
        Err(CalendarError::ParseVcal("vCalendar writing is not supported".into()))
    }
}

/// Derives the spec for local (non-UTC) times from the calendar-level TZ
/// and DAYLIGHT properties: a synthetic VTIMEZONE resolved against the
/// system database.
fn local_spec_from_tz(root: &Component) -> TimeSpec {
    let Some(tz_value) = root.property_value("TZ") else {
        return TimeSpec::Floating;
    };
    let Ok(standard_offset) = values::parse_utc_offset(&pad_offset(tz_value), 0, 0) else {
        tracing::warn!(tz = tz_value, "malformed TZ property");
        return TimeSpec::Floating;
    };

    let component = synthesize_vtimezone(root, standard_offset);
    let as_of = component
        .children
        .first()
        .and_then(|phase| phase.property_value("DTSTART"))
        .and_then(|v| values::parse_datetime(v, 0, 0).ok())
        .map_or_else(|| NaiveDateTime::default(), |(naive, _)| naive);

    match VTimeZone::parse(&component) {
        Ok(vtimezone) => {
            let mut resolver = TimeZoneResolver::new();
            resolver.register_vtimezone(vtimezone);
            resolver.resolve(VCAL_TZID, as_of)
        }
        Err(err) => {
            tracing::warn!(error = %err, "unusable DAYLIGHT declaration");
            chrono::FixedOffset::east_opt(standard_offset)
                .map_or(TimeSpec::Floating, TimeSpec::Fixed)
        }
    }
}

/// vCalendar often writes `+02` style offsets; widen to `+0200`.
fn pad_offset(s: &str) -> String {
    match s.len() {
        3 => format!("{s}00"),
        _ => s.to_string(),
    }
}

/// Builds a VTIMEZONE component from TZ plus DAYLIGHT lines
/// (`TRUE;<dst-offset>;<start>;<end>;<std-name>;<dst-name>`).
fn synthesize_vtimezone(root: &Component, standard_offset: i32) -> Component {
    let mut component = Component::new(ComponentKind::Timezone);
    component.add_property(ContentLine::new("TZID", VCAL_TZID));

    let mut dst_starts = Vec::new();
    let mut dst_ends = Vec::new();
    let mut dst_offset = standard_offset;
    let mut std_name = String::new();
    let mut dst_name = String::new();

    for line in root.properties_named("DAYLIGHT") {
        let fields: Vec<&str> = line.value.split(';').collect();
        if fields.first().copied() != Some("TRUE") || fields.len() < 4 {
            continue;
        }
        if let Ok(offset) = values::parse_utc_offset(&pad_offset(fields[1]), 0, 0) {
            dst_offset = offset;
        }
        dst_starts.push(fields[2].to_string());
        dst_ends.push(fields[3].to_string());
        if let Some(name) = fields.get(4) {
            std_name = (*name).to_string();
        }
        if let Some(name) = fields.get(5) {
            dst_name = (*name).to_string();
        }
    }

    let format_offset = |seconds: i32| {
        let sign = if seconds < 0 { '-' } else { '+' };
        let abs = seconds.abs();
        format!("{sign}{:02}{:02}", abs / 3600, (abs % 3600) / 60)
    };

    if !dst_starts.is_empty() {
        let mut daylight = Component::new(ComponentKind::Daylight);
        daylight.add_property(ContentLine::new("DTSTART", dst_starts[0].clone()));
        if dst_starts.len() > 1 {
            daylight.add_property(ContentLine::new("RDATE", dst_starts.join(",")));
        }
        daylight.add_property(ContentLine::new("TZOFFSETFROM", format_offset(standard_offset)));
        daylight.add_property(ContentLine::new("TZOFFSETTO", format_offset(dst_offset)));
        if !dst_name.is_empty() {
            daylight.add_property(ContentLine::new("TZNAME", dst_name));
        }
        component.add_child(daylight);
    }

    let mut standard = Component::new(ComponentKind::Standard);
    let std_start = dst_ends
        .first()
        .cloned()
        .unwrap_or_else(|| "19700101T000000".to_string());
    standard.add_property(ContentLine::new("DTSTART", std_start));
    if dst_ends.len() > 1 {
        standard.add_property(ContentLine::new("RDATE", dst_ends.join(",")));
    }
    standard.add_property(ContentLine::new("TZOFFSETFROM", format_offset(dst_offset)));
    standard.add_property(ContentLine::new("TZOFFSETTO", format_offset(standard_offset)));
    if !std_name.is_empty() {
        standard.add_property(ContentLine::new("TZNAME", std_name));
    }
    component.add_child(standard);

    component
}

fn read_datetime(value: &str, local_spec: TimeSpec) -> ParseResult<CalDateTime> {
    if !value.contains('T') {
        let date = values::parse_date(value, 0, 0)?;
        return Ok(CalDateTime::new(date.and_time(NaiveTime::MIN), TimeSpec::Floating));
    }
    let (naive, is_utc) = values::parse_datetime(value, 0, 0)?;
    if is_utc {
        Ok(CalDateTime::new(naive, TimeSpec::Utc))
    } else {
        Ok(CalDateTime::new(naive, local_spec))
    }
}

/// vCalendar status strings use spaces; normalize and map.
fn read_status(value: &str) -> Status {
    Status::parse(&value.replace(' ', "-"))
}

fn read_event(component: &Component, local_spec: TimeSpec) -> CalendarResult<Incidence> {
    let mut event = Event::new();
    populate_common(&mut Wrap::Event(&mut event), component, local_spec)?;
    if let Some(value) = component.property_value("DTEND") {
        let end = read_datetime(value, local_spec)?;
        event.set_dt_end(Some(end));
    }
    if let Some(value) = component.property_value("TRANSP") {
        // Numeric in vCalendar: 0 opaque, >0 transparent.
        match values::parse_integer(value, 0, 0) {
            Ok(0) => event.set_transparency(Transparency::Opaque),
            Ok(_) => event.set_transparency(Transparency::Transparent),
            Err(_) => tracing::warn!(value, "malformed TRANSP"),
        }
    }
    let mut incidence = Incidence::Event(event);
    finish(&mut incidence, component, local_spec);
    Ok(incidence)
}

fn read_todo(component: &Component, local_spec: TimeSpec) -> CalendarResult<Incidence> {
    let mut todo = Todo::new();
    populate_common(&mut Wrap::Todo(&mut todo), component, local_spec)?;
    if let Some(value) = component.property_value("DUE") {
        let due = read_datetime(value, local_spec)?;
        todo.set_dt_due(Some(due), true);
    }
    if let Some(value) = component.property_value("COMPLETED") {
        let completed = read_datetime(value, local_spec)?;
        todo.set_completed(completed);
    }
    if component
        .property_value("STATUS")
        .is_some_and(|s| s.eq_ignore_ascii_case("COMPLETED"))
        && !todo.is_completed()
    {
        todo.set_is_completed(true);
    }
    let mut incidence = Incidence::Todo(todo);
    finish(&mut incidence, component, local_spec);
    Ok(incidence)
}

/// A temporary view over the concrete type for shared population.
enum Wrap<'a> {
    Event(&'a mut Event),
    Todo(&'a mut Todo),
}

impl Wrap<'_> {
    fn common_mut(&mut self) -> &mut koyomi_core::IncidenceCommon {
        match self {
            Self::Event(e) => e.common_mut(),
            Self::Todo(t) => t.common_mut(),
        }
    }

    fn set_status(&mut self, status: Status) {
        match self {
            Self::Event(e) => e.set_status(status),
            Self::Todo(t) => t.set_status(status),
        }
    }
}

fn populate_common(
    wrap: &mut Wrap<'_>,
    component: &Component,
    local_spec: TimeSpec,
) -> CalendarResult<()> {
    if let Some(value) = component.property_value("DTSTART") {
        let start = read_datetime(value, local_spec)?;
        let all_day = !value.contains('T');
        let common = wrap.common_mut();
        common.set_all_day(all_day);
        common.set_dt_start(Some(start));
    }

    for line in &component.properties {
        let common = wrap.common_mut();
        match line.name.as_str() {
            "UID" => common.base_mut().set_uid(&line.value),
            "SUMMARY" => common.set_summary(values::unescape_text(&line.value)),
            "DESCRIPTION" => common.set_description(values::unescape_text(&line.value)),
            "LOCATION" => common.set_location(values::unescape_text(&line.value)),
            "DCREATED" | "CREATED" => {
                let created = read_datetime(&line.value, local_spec)?;
                common.set_created(Some(created));
            }
            "LAST-MODIFIED" => {
                let modified = read_datetime(&line.value, local_spec)?;
                common.base_mut().set_last_modified(Some(modified));
            }
            "SEQUENCE" => {
                if let Ok(revision) = values::parse_integer(&line.value, 0, 0) {
                    common.set_revision(revision);
                }
            }
            "PRIORITY" => {
                if let Ok(priority) = values::parse_integer(&line.value, 0, 0) {
                    common.set_priority(priority);
                }
            }
            "CATEGORIES" => {
                // vCalendar separates with ';', some producers use ','.
                let categories = line
                    .value
                    .split([';', ','])
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(ToString::to_string)
                    .collect();
                common.set_categories(categories);
            }
            "CLASS" => {
                if let Some(secrecy) = Secrecy::parse(&line.value) {
                    common.set_secrecy(secrecy);
                }
            }
            "STATUS" => wrap.set_status(read_status(&line.value)),
            "ORGANIZER" => {
                let person = Person::from_full_name(line.value.trim_start_matches("MAILTO:"));
                wrap.common_mut().base_mut().set_organizer(person);
            }
            "ATTENDEE" => {
                let mut attendee = Attendee::from_person(Person::from_full_name(
                    line.value.trim_start_matches("MAILTO:"),
                ));
                if line
                    .param_value("ROLE")
                    .is_some_and(|r| r.eq_ignore_ascii_case("OWNER"))
                {
                    attendee.set_role(Role::Chair);
                }
                match line.param_value("STATUS").map(str::to_ascii_uppercase).as_deref() {
                    Some("ACCEPTED") => attendee.set_status(PartStat::Accepted),
                    Some("DECLINED") => attendee.set_status(PartStat::Declined),
                    Some("TENTATIVE") => attendee.set_status(PartStat::Tentative),
                    Some("DELEGATED") => attendee.set_status(PartStat::Delegated),
                    Some("COMPLETED") => attendee.set_status(PartStat::Completed),
                    Some("NEEDS ACTION" | "NEEDS-ACTION") => {
                        attendee.set_status(PartStat::NeedsAction);
                    }
                    _ => {}
                }
                if line.param_value("RSVP").is_some_and(|r| r.eq_ignore_ascii_case("YES")) {
                    attendee.set_rsvp(true);
                }
                wrap.common_mut().base_mut().add_attendee(attendee);
            }
            "RELATED-TO" => {
                common.set_related_to(line.value.clone(), RelationType::Parent);
            }
            "RRULE" => {
                let anchor = common.dt_start().unwrap_or_else(|| {
                    CalDateTime::new(NaiveDateTime::default(), TimeSpec::Floating)
                });
                match parse_vcal_rrule(&line.value, anchor, local_spec) {
                    Ok(rule) => common.recurrence_mut().add_rrule(rule),
                    Err(err) => {
                        tracing::warn!(error = %err, rule = %line.value, "dropping vCalendar rule");
                    }
                }
            }
            "EXDATE" => {
                for part in line.value.split([',', ';']) {
                    let part = part.trim();
                    if part.is_empty() {
                        continue;
                    }
                    if part.contains('T') {
                        if let Ok(dt) = read_datetime(part, local_spec) {
                            common.recurrence_mut().add_exdate_time(dt);
                        }
                    } else if let Ok(date) = values::parse_date(part, 0, 0) {
                        common.recurrence_mut().add_exdate(date);
                    } else {
                        tracing::warn!(part, "malformed EXDATE entry");
                    }
                }
            }
            "AALARM" | "DALARM" | "PALARM" | "MALARM" => {
                if let Some(alarm) = read_vcal_alarm(&line.name, &line.value, local_spec) {
                    common.add_alarm(alarm);
                }
            }
            name if name.starts_with("X-") => {
                common
                    .base_mut()
                    .custom_properties_mut()
                    .set(name, &line.value);
            }
            _ => {}
        }
    }
    Ok(())
}

fn finish(incidence: &mut Incidence, component: &Component, _local_spec: TimeSpec) {
    if incidence.summary().is_empty()
        && let Some(description) = component.property_value("DESCRIPTION")
    {
        let first_line = values::unescape_text(description);
        let first_line = first_line.lines().next().unwrap_or_default().to_string();
        incidence.set_summary(first_line);
    }
    incidence.base_mut().reset_dirty_fields();
}

/// Parses an alarm property of the form
/// `<run time>;<snooze duration>;<repeats>;<payload>`.
fn read_vcal_alarm(name: &str, value: &str, local_spec: TimeSpec) -> Option<Alarm> {
    let fields: Vec<&str> = value.split(';').collect();
    let run_time = fields.first().copied().unwrap_or_default();
    if run_time.is_empty() {
        return None;
    }
    let trigger_dt = read_datetime(run_time, local_spec).ok()?;

    let payload = fields.get(3).copied().unwrap_or_default().to_string();
    let action = match name {
        "AALARM" => AlarmAction::Audio { file: payload },
        "PALARM" => AlarmAction::Procedure { file: payload, args: String::new() },
        "MALARM" => AlarmAction::Email {
            subject: String::new(),
            text: String::new(),
            recipients: vec![Person::from_full_name(&payload)],
            attachments: Vec::new(),
        },
        _ => AlarmAction::Display { text: payload },
    };

    let mut alarm = Alarm::new(action);
    alarm.set_trigger(Trigger::Absolute(trigger_dt));
    let snooze = fields
        .get(1)
        .and_then(|v| values::parse_duration(v, 0, 0).ok())
        .unwrap_or_default();
    let repeats = fields
        .get(2)
        .and_then(|v| values::parse_integer(v, 0, 0).ok())
        .unwrap_or(0);
    if repeats > 0 {
        alarm.set_repeat(repeats, snooze);
    }
    Some(alarm)
}

/// Translates the vCalendar rule notation (`D1 #10`, `W2 MO TU #0`,
/// `MP1 1+ MO #5`, `MD1 3 #0`, `YM1 6 #0`, `YD1 100 #0`) into a rule.
fn parse_vcal_rrule(
    value: &str,
    anchor: CalDateTime,
    local_spec: TimeSpec,
) -> ParseResult<RecurrenceRule> {
    let err = || ParseError::new(ParseErrorKind::InvalidRRule, 0, 0);
    let mut tokens = value.split_ascii_whitespace().peekable();
    let head = tokens.next().ok_or_else(err)?;

    let (kind, interval_str) = head.split_at(
        head.find(|c: char| c.is_ascii_digit())
            .ok_or_else(err)?,
    );
    let interval: u16 = interval_str.parse().map_err(|_| err())?;

    let freq = match kind {
        "D" => Frequency::Daily,
        "W" => Frequency::Weekly,
        "MP" | "MD" => Frequency::Monthly,
        "YM" | "YD" => Frequency::Yearly,
        _ => return Err(err()),
    };

    let mut rule = RecurrenceRule::new(freq, anchor);
    rule.set_interval(interval.max(1));

    let mut by_day = Vec::new();
    let mut by_month_day = Vec::new();
    let mut by_month = Vec::new();
    let mut by_year_day = Vec::new();
    let mut pending_ordinal: Option<i16> = None;

    for token in tokens {
        if let Some(count) = token.strip_prefix('#') {
            let count: i32 = count.parse().map_err(|_| err())?;
            // #0 means forever, which is already the default.
            if count > 0 {
                rule.set_duration(count);
            }
            continue;
        }
        if token.contains('T') || token.len() == 8 {
            // An end date bounds the rule.
            let until = read_datetime(token, local_spec).map_err(|_| err())?;
            rule.set_until(until);
            continue;
        }
        if let Some(day) = values::parse_weekday(token) {
            match pending_ordinal.take() {
                Some(ordinal) if kind == "MP" => by_day.push(WeekdayNum::nth(ordinal, day)),
                _ => by_day.push(WeekdayNum::every(day)),
            }
            continue;
        }
        if token == "LD" {
            by_month_day.push(-1);
            continue;
        }
        // Numeric modifier, optionally with a +/- suffix ("1+", "2-").
        let (digits, sign) = match token.strip_suffix(['+', '-']) {
            Some(digits) => (digits, if token.ends_with('-') { -1 } else { 1 }),
            None => (token, 1),
        };
        let number: i16 = digits.parse().map_err(|_| err())?;
        let number = number * sign;
        match kind {
            "MP" => pending_ordinal = Some(number),
            "MD" => by_month_day.push(i8::try_from(number).map_err(|_| err())?),
            "YM" => by_month.push(u8::try_from(number).map_err(|_| err())?),
            "YD" => by_year_day.push(number),
            _ => return Err(err()),
        }
    }

    if !by_day.is_empty() {
        rule.set_by_day(by_day);
    }
    if !by_month_day.is_empty() {
        rule.set_by_month_day(by_month_day);
    }
    if !by_month.is_empty() {
        rule.set_by_month(by_month);
    }
    if !by_year_day.is_empty() {
        rule.set_by_year_day(by_year_day);
    }
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Rc<Calendar> {
        let calendar = Calendar::new(TimeSpec::Utc);
        VCalFormat::new().from_string(&calendar, text).unwrap();
        calendar
    }

    #[test]
    fn rejects_icalendar_input() {
        let calendar = Calendar::new(TimeSpec::Utc);
        let err = VCalFormat::new()
            .from_string(&calendar, "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n")
            .unwrap_err();
        assert_eq!(err, CalendarError::CalVersion2);
    }

    #[test]
    fn loads_simple_event() {
        let calendar = load(
            "BEGIN:VCALENDAR\r\n\
VERSION:1.0\r\n\
PRODID:-//Legacy//vCal//EN\r\n\
BEGIN:VEVENT\r\n\
UID:v1\r\n\
SUMMARY:Old style\r\n\
DTSTART:20000301T100000Z\r\n\
DTEND:20000301T110000Z\r\n\
DCREATED:20000201T000000Z\r\n\
CATEGORIES:WORK;TRAVEL\r\n\
STATUS:NEEDS ACTION\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let ptr = calendar.incidence("v1").unwrap();
        let incidence = ptr.borrow();
        assert_eq!(incidence.summary(), "Old style");
        assert_eq!(incidence.categories(), ["WORK", "TRAVEL"]);
        assert_eq!(incidence.created(), CalDateTime::utc(2000, 2, 1, 0, 0, 0));
        // NEEDS-ACTION is not valid on events and gets dropped.
        assert_eq!(*incidence.status(), Status::None);
    }

    #[test]
    fn daily_rule_with_count() {
        let calendar = load(
            "BEGIN:VCALENDAR\r\n\
VERSION:1.0\r\n\
BEGIN:VEVENT\r\n\
UID:r1\r\n\
DTSTART:20000301T100000Z\r\n\
RRULE:D1 #10\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let ptr = calendar.incidence("r1").unwrap();
        let incidence = ptr.borrow();
        let rule = incidence.recurrence().unwrap().default_rrule().unwrap().clone();
        assert_eq!(rule.frequency(), Frequency::Daily);
        assert_eq!(rule.duration(), 10);
    }

    #[test]
    fn weekly_rule_with_days_forever() {
        let calendar = load(
            "BEGIN:VCALENDAR\r\n\
VERSION:1.0\r\n\
BEGIN:VEVENT\r\n\
UID:w1\r\n\
DTSTART:20000306T100000Z\r\n\
RRULE:W1 MO TU #0\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let ptr = calendar.incidence("w1").unwrap();
        let incidence = ptr.borrow();
        let rule = incidence.recurrence().unwrap().default_rrule().unwrap().clone();
        assert_eq!(rule.frequency(), Frequency::Weekly);
        assert_eq!(rule.duration(), koyomi_core::recurrence::DURATION_FOREVER);
        assert_eq!(rule.by_day().len(), 2);
    }

    #[test]
    fn monthly_by_position_rule() {
        let calendar = load(
            "BEGIN:VCALENDAR\r\n\
VERSION:1.0\r\n\
BEGIN:VEVENT\r\n\
UID:mp1\r\n\
DTSTART:20000307T100000Z\r\n\
RRULE:MP1 1+ TU 1- FR #5\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let ptr = calendar.incidence("mp1").unwrap();
        let incidence = ptr.borrow();
        let rule = incidence.recurrence().unwrap().default_rrule().unwrap().clone();
        assert_eq!(rule.by_day()[0], WeekdayNum::nth(1, chrono::Weekday::Tue));
        assert_eq!(rule.by_day()[1], WeekdayNum::nth(-1, chrono::Weekday::Fri));
        assert_eq!(rule.duration(), 5);
    }

    #[test]
    fn display_alarm() {
        let calendar = load(
            "BEGIN:VCALENDAR\r\n\
VERSION:1.0\r\n\
BEGIN:VEVENT\r\n\
UID:al1\r\n\
DTSTART:20000301T100000Z\r\n\
DALARM:20000301T094500Z;PT5M;2;Get ready\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let ptr = calendar.incidence("al1").unwrap();
        let incidence = ptr.borrow();
        let alarm = &incidence.alarms()[0];
        assert_eq!(
            alarm.trigger(),
            Trigger::Absolute(CalDateTime::utc(2000, 3, 1, 9, 45, 0).unwrap())
        );
        assert_eq!(alarm.repeat_count(), 2);
        assert!(matches!(alarm.action(), AlarmAction::Display { text } if text == "Get ready"));
    }

    #[test]
    fn tz_property_zones_local_times() {
        let calendar = load(
            "BEGIN:VCALENDAR\r\n\
VERSION:1.0\r\n\
TZ:+01\r\n\
BEGIN:VEVENT\r\n\
UID:tz1\r\n\
DTSTART:20000301T100000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let ptr = calendar.incidence("tz1").unwrap();
        let incidence = ptr.borrow();
        let start = incidence.dt_start().unwrap();
        // Local time stays on the wall clock, one hour east of UTC.
        assert_eq!(start.naive().to_string(), "2000-03-01 10:00:00");
        assert_ne!(start.spec(), TimeSpec::Floating);
        assert_eq!(
            start.to_utc(),
            chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2000, 3, 1, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn todo_with_due_and_completion() {
        let calendar = load(
            "BEGIN:VCALENDAR\r\n\
VERSION:1.0\r\n\
BEGIN:VTODO\r\n\
UID:t1\r\n\
SUMMARY:File taxes\r\n\
DUE:20000415T235900Z\r\n\
STATUS:COMPLETED\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n",
        );
        let ptr = calendar.incidence("t1").unwrap();
        let incidence = ptr.borrow();
        let todo = incidence.as_todo().unwrap();
        assert!(todo.is_completed());
        assert!(todo.has_due_date());
    }
}
