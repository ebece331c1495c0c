//! Emission of model objects as RFC 5545 text.

pub mod escape;
pub mod fold;

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

use koyomi_core::alarm::{Alarm, AlarmAction, Trigger};
use koyomi_core::attachment::Attachment;
use koyomi_core::attendee::Attendee;
use koyomi_core::calendar::Calendar;
use koyomi_core::datetime::{CalDateTime, TimeSpec};
use koyomi_core::incidence::{Incidence, RelationType, Status};
use koyomi_core::period::Period;
use koyomi_core::person::Person;
use koyomi_core::recurrence::{Recurrence, RecurrenceRule};
use koyomi_core::scheduling::ITipMethod;

use self::escape::{escape_param_value, escape_text};
use self::fold::fold_line;
use crate::ical::core::{Component, ComponentKind, ContentLine};

/// Collects, per referenced zone, the earliest timestamp using it, so
/// emitted VTIMEZONEs cover the right transition range.
#[derive(Debug, Default)]
pub struct ZoneCollector {
    zones: BTreeMap<String, (Tz, NaiveDate)>,
}

impl ZoneCollector {
    fn note(&mut self, dt: &CalDateTime) {
        if let TimeSpec::Zoned(tz) = dt.spec() {
            let date = dt.date();
            self.zones
                .entry(tz.name().to_string())
                .and_modify(|(_, earliest)| {
                    if date < *earliest {
                        *earliest = date;
                    }
                })
                .or_insert((tz, date));
        }
    }

    fn into_components(self) -> Vec<Component> {
        self.zones
            .into_values()
            .map(|(tz, earliest)| crate::tz::vtimezone_component(tz, earliest))
            .collect()
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn format_naive(naive: NaiveDateTime) -> String {
    naive.format("%Y%m%dT%H%M%S").to_string()
}

/// Builds a date or date-time content line for a timestamp, carrying the
/// zone it was stored with. Fixed-offset pseudo-zones are emitted as UTC.
fn datetime_line(name: &str, dt: &CalDateTime, all_day: bool, zones: &mut ZoneCollector) -> ContentLine {
    if all_day {
        return ContentLine::new(name, format_date(dt.date())).param("VALUE", "DATE");
    }
    zones.note(dt);
    match dt.spec() {
        TimeSpec::Utc => ContentLine::new(name, format!("{}Z", format_naive(dt.naive()))),
        TimeSpec::Floating => ContentLine::new(name, format_naive(dt.naive())),
        TimeSpec::Zoned(tz) => {
            ContentLine::new(name, format_naive(dt.naive())).param("TZID", tz.name())
        }
        TimeSpec::Fixed(_) => {
            let utc = dt.to_spec(TimeSpec::Utc);
            ContentLine::new(name, format!("{}Z", format_naive(utc.naive())))
        }
    }
}

fn person_line(name: &str, person: &Person) -> ContentLine {
    let value = if person.email().is_empty() || person.email_synthesized() {
        person.email().to_string()
    } else {
        format!("mailto:{}", person.email())
    };
    let mut line = ContentLine::new(name, value);
    if !person.name().is_empty() {
        line = line.param("CN", escape_param_value(person.name()));
    }
    line
}

fn attendee_line(attendee: &Attendee) -> ContentLine {
    let mut line = person_line("ATTENDEE", attendee.person());
    line = line
        .param("ROLE", attendee.role().as_str())
        .param("PARTSTAT", attendee.status().as_str());
    if attendee.rsvp() {
        line = line.param("RSVP", "TRUE");
    }
    if !attendee.delegate().is_empty() {
        line = line.param("DELEGATED-TO", escape_param_value(attendee.delegate()));
    }
    if !attendee.delegator().is_empty() {
        line = line.param("DELEGATED-FROM", escape_param_value(attendee.delegator()));
    }
    if !attendee.uid().is_empty() {
        line = line.param("X-UID", attendee.uid());
    }
    line
}

fn attachment_line(attachment: &Attachment) -> ContentLine {
    let mut line = if attachment.is_binary() {
        ContentLine::new("ATTACH", attachment.data().unwrap_or_default())
            .param("ENCODING", "BASE64")
            .param("VALUE", "BINARY")
    } else {
        ContentLine::new("ATTACH", attachment.uri().unwrap_or_default())
    };
    if !attachment.mime_type().is_empty() {
        line = line.param("FMTTYPE", attachment.mime_type());
    }
    if !attachment.label().is_empty() {
        line = line.param("X-LABEL", escape_param_value(attachment.label()));
    }
    line
}

/// Serializes one RRULE value.
fn rrule_value(rule: &RecurrenceRule) -> String {
    let mut parts = vec![format!("FREQ={}", rule.frequency().as_str())];
    if rule.interval() != 1 {
        parts.push(format!("INTERVAL={}", rule.interval()));
    }
    if rule.duration() > 0 {
        parts.push(format!("COUNT={}", rule.duration()));
    } else if let Some(until) = rule.until() {
        let value = if rule.all_day() {
            format_date(until.date())
        } else {
            let utc = until.to_spec(TimeSpec::Utc);
            format!("{}Z", format_naive(utc.naive()))
        };
        parts.push(format!("UNTIL={value}"));
    } else {
        // Unbounded rule.
    }
    if rule.week_start() != chrono::Weekday::Mon {
        parts.push(format!("WKST={}", weekday_code(rule.week_start())));
    }
    push_num_list(&mut parts, "BYSECOND", rule.by_second());
    push_num_list(&mut parts, "BYMINUTE", rule.by_minute());
    push_num_list(&mut parts, "BYHOUR", rule.by_hour());
    if !rule.by_day().is_empty() {
        let days: Vec<String> = rule
            .by_day()
            .iter()
            .map(|wd| match wd.ordinal {
                Some(n) => format!("{n}{}", weekday_code(wd.weekday)),
                None => weekday_code(wd.weekday).to_string(),
            })
            .collect();
        parts.push(format!("BYDAY={}", days.join(",")));
    }
    push_num_list(&mut parts, "BYMONTHDAY", rule.by_month_day());
    push_num_list(&mut parts, "BYYEARDAY", rule.by_year_day());
    push_num_list(&mut parts, "BYWEEKNO", rule.by_week_no());
    push_num_list(&mut parts, "BYMONTH", rule.by_month());
    push_num_list(&mut parts, "BYSETPOS", rule.by_set_pos());
    parts.join(";")
}

fn push_num_list<T: std::fmt::Display>(parts: &mut Vec<String>, key: &str, list: &[T]) {
    if !list.is_empty() {
        let values: Vec<String> = list.iter().map(ToString::to_string).collect();
        parts.push(format!("{key}={}", values.join(",")));
    }
}

const fn weekday_code(weekday: chrono::Weekday) -> &'static str {
    match weekday {
        chrono::Weekday::Mon => "MO",
        chrono::Weekday::Tue => "TU",
        chrono::Weekday::Wed => "WE",
        chrono::Weekday::Thu => "TH",
        chrono::Weekday::Fri => "FR",
        chrono::Weekday::Sat => "SA",
        chrono::Weekday::Sun => "SU",
    }
}

fn period_value(period: &Period, zones: &mut ZoneCollector) -> String {
    let start = period.start();
    zones.note(&start);
    let start_str = match start.spec() {
        TimeSpec::Utc => format!("{}Z", format_naive(start.naive())),
        _ => format_naive(start.naive()),
    };
    if period.has_duration() {
        format!("{start_str}/{}", period.duration().to_ical_string())
    } else {
        let end = period.end();
        let end_str = match end.spec() {
            TimeSpec::Utc => format!("{}Z", format_naive(end.naive())),
            _ => format_naive(end.naive()),
        };
        format!("{start_str}/{end_str}")
    }
}

fn recurrence_lines(recurrence: &Recurrence, component: &mut Component, zones: &mut ZoneCollector) {
    for rule in recurrence.rrules() {
        component.add_property(ContentLine::new("RRULE", rrule_value(rule)));
    }
    for rule in recurrence.exrules() {
        component.add_property(ContentLine::new("EXRULE", rrule_value(rule)));
    }
    for date in recurrence.rdates() {
        component.add_property(ContentLine::new("RDATE", format_date(*date)).param("VALUE", "DATE"));
    }
    for dt in recurrence.rdate_times() {
        component.add_property(datetime_line("RDATE", dt, false, zones));
    }
    for period in recurrence.rdate_periods() {
        let mut line =
            ContentLine::new("RDATE", period_value(period, zones)).param("VALUE", "PERIOD");
        if let Some(tzid) = period.start().spec().tzid()
            && !period.start().is_utc()
        {
            line = line.param("TZID", tzid);
        }
        component.add_property(line);
    }
    for date in recurrence.exdates() {
        component
            .add_property(ContentLine::new("EXDATE", format_date(*date)).param("VALUE", "DATE"));
    }
    for dt in recurrence.exdate_times() {
        component.add_property(datetime_line("EXDATE", dt, false, zones));
    }
}

fn alarm_component(alarm: &Alarm, zones: &mut ZoneCollector) -> Component {
    let mut component = Component::new(ComponentKind::Alarm);
    component.add_property(ContentLine::new("ACTION", alarm.action().as_str()));

    match alarm.trigger() {
        Trigger::Absolute(dt) => {
            let mut line = datetime_line("TRIGGER", &dt, false, zones);
            line = line.param("VALUE", "DATE-TIME");
            component.add_property(line);
        }
        Trigger::OffsetStart(offset) => {
            component.add_property(ContentLine::new("TRIGGER", offset.to_ical_string()));
        }
        Trigger::OffsetEnd(offset) => {
            component.add_property(
                ContentLine::new("TRIGGER", offset.to_ical_string()).param("RELATED", "END"),
            );
        }
        Trigger::None => {}
    }

    match alarm.action() {
        AlarmAction::Display { text } => {
            component.add_property(ContentLine::new("DESCRIPTION", escape_text(text)));
        }
        AlarmAction::Audio { file } => {
            if !file.is_empty() {
                component.add_property(ContentLine::new("ATTACH", file));
            }
        }
        AlarmAction::Procedure { file, args } => {
            component.add_property(ContentLine::new("ATTACH", file));
            if !args.is_empty() {
                component.add_property(ContentLine::new("DESCRIPTION", escape_text(args)));
            }
        }
        AlarmAction::Email { subject, text, recipients, attachments } => {
            component.add_property(ContentLine::new("SUMMARY", escape_text(subject)));
            component.add_property(ContentLine::new("DESCRIPTION", escape_text(text)));
            for recipient in recipients {
                component.add_property(person_line("ATTENDEE", recipient));
            }
            for attachment in attachments {
                component.add_property(ContentLine::new("ATTACH", attachment));
            }
        }
        AlarmAction::Invalid => {}
    }

    if alarm.repeat_count() > 0 {
        component.add_property(ContentLine::new("REPEAT", alarm.repeat_count().to_string()));
        component.add_property(ContentLine::new("DURATION", alarm.snooze_time().to_ical_string()));
    }
    if !alarm.enabled() {
        component.add_property(ContentLine::new("X-KDE-KCALCORE-ENABLED", "FALSE"));
    }
    for (name, prop) in alarm.custom_properties().iter() {
        component.add_property(custom_line(name, prop));
    }

    component
}

fn custom_line(name: &str, prop: &koyomi_core::CustomProperty) -> ContentLine {
    match &prop.parameters {
        Some(params) => {
            // The stored parameter text is already in wire form.
            let mut line = ContentLine::new(name, &prop.value);
            if let Ok(parsed) =
                crate::ical::parse::lexer::parse_content_line(&format!("{name}{params}:"), 0)
            {
                line.params = parsed.params;
            }
            line
        }
        None => ContentLine::new(name, &prop.value),
    }
}

/// Builds the component for one incidence.
#[expect(clippy::too_many_lines, reason = "one block per RFC 5545 property")]
#[must_use]
pub fn incidence_component(incidence: &Incidence, zones: &mut ZoneCollector) -> Component {
    let kind = match incidence.kind() {
        koyomi_core::IncidenceKind::Event => ComponentKind::Event,
        koyomi_core::IncidenceKind::Todo => ComponentKind::Todo,
        koyomi_core::IncidenceKind::Journal => ComponentKind::Journal,
    };
    let mut component = Component::new(kind);
    let all_day = incidence.all_day();

    component.add_property(ContentLine::new("UID", incidence.uid()));
    component.add_property(ContentLine::new(
        "DTSTAMP",
        format!("{}Z", format_naive(chrono::Utc::now().naive_utc())),
    ));
    if let Some(created) = incidence.created() {
        component.add_property(datetime_line("CREATED", &created, false, zones));
    }
    if let Some(modified) = incidence.last_modified() {
        component.add_property(datetime_line("LAST-MODIFIED", &modified, false, zones));
    }
    if incidence.revision() != 0 {
        component.add_property(ContentLine::new("SEQUENCE", incidence.revision().to_string()));
    }
    if let Some(start) = incidence.dt_start() {
        component.add_property(datetime_line("DTSTART", &start, all_day, zones));
    }

    match incidence {
        Incidence::Event(event) => {
            if let Some(end) = event.dt_end() {
                if all_day {
                    // Stored inclusive, emitted exclusive.
                    let exclusive = end.date().succ_opt().unwrap_or(end.date());
                    component.add_property(
                        ContentLine::new("DTEND", format_date(exclusive)).param("VALUE", "DATE"),
                    );
                } else {
                    component.add_property(datetime_line("DTEND", &end, false, zones));
                }
            } else if let Some(duration) = event.duration() {
                component.add_property(ContentLine::new("DURATION", duration.to_ical_string()));
            }
            component.add_property(ContentLine::new("TRANSP", event.transparency().as_str()));
        }
        Incidence::Todo(todo) => {
            if let Some(due) = todo.dt_due(true) {
                component.add_property(datetime_line("DUE", &due, all_day, zones));
            }
            if let Some(completed) = todo.completed() {
                component.add_property(datetime_line("COMPLETED", &completed, false, zones));
            }
            if todo.percent_complete() != 0 {
                component.add_property(ContentLine::new(
                    "PERCENT-COMPLETE",
                    todo.percent_complete().to_string(),
                ));
            }
            if let Some(dt) = todo.dt_recurrence() {
                component.add_property(datetime_line(
                    "X-KDE-LIBKCAL-DTRECURRENCE",
                    &dt,
                    false,
                    zones,
                ));
            }
        }
        Incidence::Journal(_) => {}
    }

    if !incidence.summary().is_empty() {
        component.add_property(ContentLine::new("SUMMARY", escape_text(incidence.summary())));
    }
    if !incidence.description().is_empty() {
        component.add_property(ContentLine::new(
            "DESCRIPTION",
            escape_text(incidence.description()),
        ));
    }
    if !incidence.location().is_empty() {
        component.add_property(ContentLine::new("LOCATION", escape_text(incidence.location())));
    }
    if !incidence.categories().is_empty() {
        let categories: Vec<String> =
            incidence.categories().iter().map(|c| escape_text(c)).collect();
        component.add_property(ContentLine::new("CATEGORIES", categories.join(",")));
    }
    if !incidence.resources().is_empty() {
        let resources: Vec<String> =
            incidence.resources().iter().map(|c| escape_text(c)).collect();
        component.add_property(ContentLine::new("RESOURCES", resources.join(",")));
    }
    if *incidence.status() != Status::None {
        component.add_property(ContentLine::new("STATUS", incidence.status().as_str()));
    }
    component.add_property(ContentLine::new("CLASS", incidence.secrecy().as_str()));
    if incidence.priority() != 0 {
        component.add_property(ContentLine::new("PRIORITY", incidence.priority().to_string()));
    }
    if !incidence.organizer().is_empty() {
        component.add_property(person_line("ORGANIZER", incidence.organizer()));
    }
    for attendee in incidence.attendees() {
        component.add_property(attendee_line(attendee));
    }
    for contact in incidence.contacts() {
        component.add_property(ContentLine::new("CONTACT", escape_text(contact)));
    }
    for comment in incidence.comments() {
        component.add_property(ContentLine::new("COMMENT", escape_text(comment)));
    }
    if !incidence.url().is_empty() {
        component.add_property(ContentLine::new("URL", incidence.url()));
    }
    if !incidence.color().is_empty() {
        component.add_property(ContentLine::new("COLOR", incidence.color()));
    }
    if incidence.has_geo() {
        component.add_property(ContentLine::new(
            "GEO",
            format!("{};{}", incidence.geo_latitude(), incidence.geo_longitude()),
        ));
    }
    for conference in incidence.conferences() {
        let mut line = ContentLine::new("CONFERENCE", conference.uri()).param("VALUE", "URI");
        if !conference.label().is_empty() {
            line = line.param("LABEL", escape_param_value(conference.label()));
        }
        if !conference.features().is_empty() {
            line.params.push(crate::ical::core::Parameter::with_values(
                "FEATURE",
                conference.features().to_vec(),
            ));
        }
        if !conference.language().is_empty() {
            line = line.param("LANGUAGE", conference.language());
        }
        component.add_property(line);
    }
    for relation in [RelationType::Parent, RelationType::Child, RelationType::Sibling] {
        if let Some(uid) = incidence.related_to(relation) {
            let mut line = ContentLine::new("RELATED-TO", escape_text(uid));
            if relation != RelationType::Parent {
                line = line.param("RELTYPE", relation.as_str());
            }
            component.add_property(line);
        }
    }
    for attachment in incidence.attachments() {
        component.add_property(attachment_line(attachment));
    }
    if let Some(rid) = incidence.recurrence_id() {
        let mut line = datetime_line("RECURRENCE-ID", &rid, all_day, zones);
        if incidence.this_and_future() {
            line = line.param("RANGE", "THISANDFUTURE");
        }
        component.add_property(line);
    }
    if let Some(recurrence) = incidence.recurrence() {
        recurrence_lines(recurrence, &mut component, zones);
    }
    if incidence.scheduling_id() != incidence.uid() {
        component.add_property(ContentLine::new(
            "X-KDE-LIBKCAL-ID",
            incidence.scheduling_id(),
        ));
    }
    for (name, prop) in incidence.custom_properties().iter() {
        component.add_property(custom_line(name, prop));
    }
    for alarm in incidence.alarms() {
        component.add_child(alarm_component(alarm, zones));
    }

    component
}

/// Serializes a raw component tree with CRLF line endings and folding.
pub fn serialize_component(component: &Component, out: &mut String) {
    out.push_str("BEGIN:");
    out.push_str(&component.name);
    out.push_str("\r\n");
    for line in &component.properties {
        let logical = format!("{}{}:{}", line.name, line.params_wire(), line.value);
        out.push_str(&fold_line(&logical));
        out.push_str("\r\n");
    }
    for child in &component.children {
        serialize_component(child, out);
    }
    out.push_str("END:");
    out.push_str(&component.name);
    out.push_str("\r\n");
}

/// Serializes a whole calendar, emitting a VTIMEZONE per referenced zone.
#[must_use]
pub fn calendar_to_string(calendar: &Calendar, method: Option<ITipMethod>) -> String {
    let mut zones = ZoneCollector::default();
    let mut incidence_components = Vec::new();

    let mut pointers = calendar.raw_events();
    pointers.extend(calendar.raw_todos());
    pointers.extend(calendar.raw_journals());
    for ptr in pointers {
        incidence_components.push(incidence_component(&ptr.borrow(), &mut zones));
    }

    components_to_string(&incidence_components, zones, &calendar.product_id(), method)
}

/// Serializes pre-built incidence components under a fresh VCALENDAR.
#[must_use]
pub fn components_to_string(
    incidences: &[Component],
    zones: ZoneCollector,
    product_id: &str,
    method: Option<ITipMethod>,
) -> String {
    let mut root = Component::new(ComponentKind::Calendar);
    root.add_property(ContentLine::new("PRODID", product_id));
    root.add_property(ContentLine::new("VERSION", "2.0"));
    root.add_property(ContentLine::new("X-KDE-ICAL-IMPLEMENTATION-VERSION", "1.0"));
    if let Some(method) = method
        && method != ITipMethod::NoMethod
    {
        root.add_property(ContentLine::new("METHOD", method.as_str()));
    }
    for tz_component in zones.into_components() {
        root.add_child(tz_component);
    }
    for component in incidences {
        root.add_child(component.clone());
    }

    let mut out = String::new();
    serialize_component(&root, &mut out);
    out
}
