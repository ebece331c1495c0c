//! Conversion from the parsed component tree into model objects.

pub mod compat;

use std::rc::Rc;

use chrono::{NaiveDateTime, NaiveTime};

use koyomi_core::alarm::{Alarm, AlarmAction, Trigger};
use koyomi_core::attachment::Attachment;
use koyomi_core::attendee::{Attendee, PartStat, Role};
use koyomi_core::calendar::Calendar;
use koyomi_core::conference::Conference;
use koyomi_core::datetime::{CalDateTime, TimeSpec};
use koyomi_core::error::{CalendarError, CalendarResult};
use koyomi_core::incidence::{
    Event, FreeBusy, Incidence, Journal, RelationType, Secrecy, Status, Todo, Transparency,
};
use koyomi_core::period::Period;
use koyomi_core::person::Person;
use koyomi_core::scheduling::ITipMethod;

use self::compat::Compat;
use crate::ical::core::{Component, ComponentKind, ContentLine};
use crate::ical::parse::values;
use crate::tz::{TimeZoneResolver, VTimeZone};

/// Custom property carrying the scheduling id.
const SCHEDULING_ID_PROPERTY: &str = "X-KDE-LIBKCAL-ID";
/// Custom property marking disabled alarms.
const ALARM_ENABLED_PROPERTY: &str = "X-KDE-KCALCORE-ENABLED";
/// VCALENDAR property carrying the writing library's version.
const IMPLEMENTATION_VERSION_PROPERTY: &str = "X-KDE-ICAL-IMPLEMENTATION-VERSION";
/// Custom property carrying a recurring to-do's current occurrence.
const DT_RECURRENCE_PROPERTY: &str = "X-KDE-LIBKCAL-DTRECURRENCE";

/// Properties that must be applied after everything else has been set.
#[derive(Default)]
struct Stash {
    dt_stamp: Option<CalDateTime>,
    last_modified: Option<CalDateTime>,
    sequence: Option<i32>,
}

/// Shared state for reading one VCALENDAR.
pub struct Reader {
    resolver: TimeZoneResolver,
    compat: Box<dyn Compat>,
}

impl Reader {
    /// Prepares a reader for one VCALENDAR component: sniffs the producer
    /// and registers its embedded timezones.
    #[must_use]
    pub fn for_calendar(root: &Component) -> Self {
        let product_id = root.property_value("PRODID").unwrap_or_default();
        let implementation_version = root
            .property_value(IMPLEMENTATION_VERSION_PROPERTY)
            .unwrap_or_default();
        let compat = compat::pick_compat(product_id, implementation_version);

        let mut resolver = TimeZoneResolver::new();
        for tz_component in root.timezones() {
            match VTimeZone::parse(tz_component) {
                Ok(vtimezone) => resolver.register_vtimezone(vtimezone),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed VTIMEZONE");
                }
            }
        }

        Self { resolver, compat }
    }

    /// Checks the VERSION property of a VCALENDAR.
    ///
    /// ## Errors
    /// vCalendar input and unknown versions are rejected with the
    /// matching error code.
    pub fn check_version(root: &Component) -> CalendarResult<()> {
        match root.property_value("VERSION") {
            Some("2.0") => Ok(()),
            Some("1.0") => Err(CalendarError::CalVersion1),
            Some(other) => Err(CalendarError::CalVersionUnknown(other.to_string())),
            None => Err(CalendarError::VersionPropertyMissing),
        }
    }

    /// Reads every incidence of the VCALENDAR into the calendar.
    ///
    /// ## Errors
    /// Fails on version mismatches; individual malformed incidences are
    /// skipped with a diagnostic.
    pub fn populate(root: &Component, calendar: &Rc<Calendar>) -> CalendarResult<ITipMethod> {
        Self::check_version(root)?;
        let mut reader = Self::for_calendar(root);

        if let Some(product_id) = root.property_value("PRODID") {
            calendar.set_product_id(product_id);
        }
        let method = ITipMethod::parse(root.property_value("METHOD").unwrap_or_default());

        for child in &root.children {
            match child.kind {
                ComponentKind::Event | ComponentKind::Todo | ComponentKind::Journal => {
                    match reader.read_incidence(child) {
                        Ok(incidence) => {
                            if calendar.add_incidence(incidence).is_none() {
                                tracing::warn!(
                                    uid = child.property_value("UID").unwrap_or_default(),
                                    "calendar rejected incidence"
                                );
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "skipping malformed incidence");
                        }
                    }
                }
                ComponentKind::Timezone => {}
                ComponentKind::FreeBusy => {
                    tracing::debug!("VFREEBUSY outside a scheduling message ignored");
                }
                _ => {
                    tracing::warn!(name = %child.name, "skipping unknown component");
                }
            }
        }

        Ok(method)
    }

    /// Reads one VEVENT/VTODO/VJOURNAL into a model incidence.
    ///
    /// ## Errors
    /// Returns an error for components that are not incidences or whose
    /// date values are unparseable.
    pub fn read_incidence(&mut self, component: &Component) -> CalendarResult<Incidence> {
        let mut incidence = match component.kind {
            ComponentKind::Event => Incidence::Event(Event::new()),
            ComponentKind::Todo => Incidence::Todo(Todo::new()),
            ComponentKind::Journal => Incidence::Journal(Journal::new()),
            _ => return Err(CalendarError::ParseNotIncidence(component.name.clone())),
        };

        // The start anchors timezone resolution and recurrence rules, so
        // it is read first.
        let all_day = component
            .property("DTSTART")
            .is_some_and(|p| p.value_type() == Some("DATE"));
        let dt_start = component
            .property("DTSTART")
            .map(|p| self.read_datetime(p))
            .transpose()?;
        incidence.set_all_day(all_day);
        incidence.set_dt_start(dt_start);

        let mut stash = Stash::default();

        for line in &component.properties {
            self.read_incidence_property(&mut incidence, component, line, &mut stash)?;
        }

        for alarm_component in component.alarms() {
            match self.read_alarm(alarm_component) {
                Ok(alarm) => incidence.add_alarm(alarm),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed VALARM");
                }
            }
        }

        self.compat.fix_alarms(&mut incidence);
        self.compat.fix_recurrence(&mut incidence);
        self.compat.fix_empty_summary(&mut incidence);
        if incidence.created().is_none() {
            self.compat.set_created_to_dt_stamp(&mut incidence, stash.dt_stamp);
        }

        // Revision and last-modified go in last: every tracked write above
        // bumps them.
        incidence.set_revision(stash.sequence.unwrap_or(0));
        incidence.base_mut().set_last_modified(stash.last_modified);

        incidence.base_mut().reset_dirty_fields();
        Ok(incidence)
    }

    #[expect(clippy::too_many_lines, reason = "one arm per RFC 5545 property")]
    fn read_incidence_property(
        &mut self,
        incidence: &mut Incidence,
        component: &Component,
        line: &ContentLine,
        stash: &mut Stash,
    ) -> CalendarResult<()> {
        match line.name.as_str() {
            "UID" => incidence.base_mut().set_uid(&line.value),
            "DTSTAMP" => stash.dt_stamp = Some(self.read_datetime(line)?),
            "CREATED" => {
                let created = self.read_datetime(line)?;
                incidence.set_created(Some(created));
            }
            "LAST-MODIFIED" => {
                stash.last_modified = Some(self.read_datetime(line)?);
            }
            "SEQUENCE" => {
                stash.sequence = values::parse_integer(&line.value, 0, 0).ok();
            }
            "SUMMARY" => {
                incidence.set_summary(values::unescape_text(&line.value));
            }
            "DESCRIPTION" => {
                incidence.set_description(values::unescape_text(&line.value));
            }
            "LOCATION" => {
                incidence.set_location(values::unescape_text(&line.value));
            }
            "CATEGORIES" => {
                let categories = line
                    .value
                    .split(',')
                    .map(values::unescape_text)
                    .filter(|c| !c.is_empty())
                    .collect();
                incidence.set_categories(categories);
            }
            "RESOURCES" => {
                let resources = line
                    .value
                    .split(',')
                    .map(values::unescape_text)
                    .filter(|c| !c.is_empty())
                    .collect();
                incidence.set_resources(resources);
            }
            "STATUS" => {
                let status = Status::parse(&line.value);
                match incidence {
                    Incidence::Event(e) => e.set_status(status),
                    Incidence::Todo(t) => t.set_status(status),
                    Incidence::Journal(j) => j.set_status(status),
                }
            }
            "CLASS" => {
                if let Some(secrecy) = Secrecy::parse(&line.value) {
                    incidence.set_secrecy(secrecy);
                }
            }
            "PRIORITY" => {
                if let Ok(priority) = values::parse_integer(&line.value, 0, 0) {
                    incidence.set_priority(self.compat.fix_priority(priority));
                }
            }
            "ORGANIZER" => {
                incidence.base_mut().set_organizer(read_person(line));
            }
            "ATTENDEE" => {
                incidence.base_mut().add_attendee(read_attendee(line));
            }
            "CONTACT" => incidence.base_mut().add_contact(values::unescape_text(&line.value)),
            "COMMENT" => incidence.base_mut().add_comment(values::unescape_text(&line.value)),
            "URL" => incidence.base_mut().set_url(&line.value),
            "COLOR" => incidence.set_color(&line.value),
            "GEO" => read_geo(incidence, &line.value),
            "CONFERENCE" => incidence.add_conference(read_conference(line)),
            "ATTACH" => incidence.add_attachment(read_attachment(line)),
            "RELATED-TO" => {
                let relation = line
                    .param_value("RELTYPE")
                    .and_then(RelationType::parse)
                    .unwrap_or(RelationType::Parent);
                incidence.set_related_to(values::unescape_text(&line.value), relation);
            }
            "RECURRENCE-ID" => {
                let rid = self.read_datetime(line)?;
                incidence.set_recurrence_id(Some(rid));
                if line
                    .param_value("RANGE")
                    .is_some_and(|r| r.eq_ignore_ascii_case("THISANDFUTURE"))
                {
                    incidence.set_this_and_future(true);
                }
            }
            "RRULE" | "EXRULE" => self.read_rule(incidence, component, line),
            "RDATE" => self.read_rdate(incidence, line)?,
            "EXDATE" => self.read_exdate(incidence, line)?,
            "DTEND" => {
                if let Incidence::Event(event) = incidence {
                    let end = self.read_end_date(line)?;
                    event.set_dt_end(Some(end));
                }
            }
            "DURATION" => {
                if let Incidence::Event(event) = incidence {
                    let duration = values::parse_duration(&line.value, 0, 0)?;
                    event.set_duration(Some(duration));
                }
            }
            "DUE" => {
                if let Incidence::Todo(todo) = incidence {
                    let due = self.read_datetime(line)?;
                    todo.set_dt_due(Some(due), true);
                }
            }
            "COMPLETED" => {
                if let Incidence::Todo(todo) = incidence {
                    let completed = self.read_datetime(line)?;
                    todo.set_completed(completed);
                }
            }
            "PERCENT-COMPLETE" => {
                if let Incidence::Todo(todo) = incidence
                    && let Ok(percent) = values::parse_integer(&line.value, 0, 0)
                {
                    todo.set_percent_complete(percent);
                }
            }
            "TRANSP" => {
                if let Incidence::Event(event) = incidence
                    && let Some(transparency) = Transparency::parse(&line.value)
                {
                    event.set_transparency(transparency);
                }
            }
            "DTSTART" | "BEGIN" | "END" | "METHOD" | "PRODID" | "VERSION" => {}
            name if name == SCHEDULING_ID_PROPERTY => {
                incidence.set_scheduling_id(&line.value);
            }
            name if name == DT_RECURRENCE_PROPERTY => {
                if let Incidence::Todo(todo) = incidence {
                    let dt = self.read_datetime(line)?;
                    todo.set_dt_recurrence(Some(dt));
                }
            }
            _ => {
                // Unknown properties survive round trips in the custom bag.
                let params = line.params_wire();
                incidence.base_mut().custom_properties_mut().set_with_parameters(
                    &line.name,
                    &line.value,
                    (!params.is_empty()).then_some(params),
                );
            }
        }
        Ok(())
    }

    /// Reads a date or date-time property into a [`CalDateTime`],
    /// resolving any TZID against the document's timezones.
    fn read_datetime(&mut self, line: &ContentLine) -> CalendarResult<CalDateTime> {
        if line.value_type() == Some("DATE") || (!line.value.contains('T') && line.value.len() == 8)
        {
            let date = values::parse_date(&line.value, 0, 0)?;
            return Ok(CalDateTime::new(date.and_time(NaiveTime::MIN), TimeSpec::Floating));
        }
        let (naive, is_utc) = values::parse_datetime(&line.value, 0, 0)?;
        Ok(self.attach_spec(naive, is_utc, line.tzid()))
    }

    fn attach_spec(&mut self, naive: NaiveDateTime, is_utc: bool, tzid: Option<&str>) -> CalDateTime {
        if is_utc {
            return CalDateTime::new(naive, TimeSpec::Utc);
        }
        match tzid {
            Some(tzid) if self.compat.use_timezone_shift() => {
                let spec = self.resolver.resolve(tzid, naive);
                CalDateTime::new(naive, spec)
            }
            // Prerelease producers wrote local times with bogus zone
            // markers; keep them floating.
            _ => CalDateTime::new(naive, TimeSpec::Floating),
        }
    }

    /// All-day DTEND is exclusive on the wire but stored inclusive; the
    /// compat hook undoes this for producers that already wrote it
    /// inclusive.
    fn read_end_date(&mut self, line: &ContentLine) -> CalendarResult<CalDateTime> {
        if line.value_type() == Some("DATE") {
            let date = values::parse_date(&line.value, 0, 0)?;
            let inclusive = date.pred_opt().unwrap_or(date);
            let fixed = self.compat.fix_floating_end(inclusive);
            return Ok(CalDateTime::new(fixed.and_time(NaiveTime::MIN), TimeSpec::Floating));
        }
        self.read_datetime(line)
    }

    fn read_rule(&mut self, incidence: &mut Incidence, component: &Component, line: &ContentLine) {
        let start = self.rule_anchor(incidence, component);
        match values::parse_rrule(&line.value, start, 0, 0) {
            Ok(rule) => {
                let recurrence = incidence.recurrence_mut();
                if line.name == "RRULE" {
                    recurrence.add_rrule(rule);
                } else {
                    recurrence.add_exrule(rule);
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, rule = %line.value, "dropping malformed rule");
            }
        }
    }

    /// Recurrence rules anchor at the start, or at the due date for
    /// legacy to-dos without one.
    fn rule_anchor(&mut self, incidence: &Incidence, component: &Component) -> CalDateTime {
        if let Some(start) = incidence.dt_start() {
            return start;
        }
        if let Incidence::Todo(todo) = incidence
            && let Some(due) = todo.dt_due(true)
        {
            return due;
        }
        component
            .property("DUE")
            .and_then(|line| self.read_datetime(line).ok())
            .unwrap_or_else(|| CalDateTime::new(NaiveDateTime::default(), TimeSpec::Floating))
    }

    fn read_rdate(&mut self, incidence: &mut Incidence, line: &ContentLine) -> CalendarResult<()> {
        for part in line.value.split(',') {
            let part = part.trim();
            if line.value_type() == Some("PERIOD") || part.contains('/') {
                let ((start_naive, start_utc), end) = values::parse_period(part, 0, 0)?;
                let start = self.attach_spec(start_naive, start_utc, line.tzid());
                let period = match end {
                    values::PeriodEnd::End(naive, is_utc) => {
                        Period::new(start, self.attach_spec(naive, is_utc, line.tzid()))
                    }
                    values::PeriodEnd::Duration(duration) => Period::with_duration(start, duration),
                };
                incidence.recurrence_mut().add_rdate_period(period);
            } else if line.value_type() == Some("DATE") || !part.contains('T') {
                let date = values::parse_date(part, 0, 0)?;
                incidence.recurrence_mut().add_rdate(date);
            } else {
                let (naive, is_utc) = values::parse_datetime(part, 0, 0)?;
                let dt = self.attach_spec(naive, is_utc, line.tzid());
                incidence.recurrence_mut().add_rdate_time(dt);
            }
        }
        Ok(())
    }

    fn read_exdate(&mut self, incidence: &mut Incidence, line: &ContentLine) -> CalendarResult<()> {
        for part in line.value.split(',') {
            let part = part.trim();
            if line.value_type() == Some("DATE") || !part.contains('T') {
                let date = values::parse_date(part, 0, 0)?;
                incidence.recurrence_mut().add_exdate(date);
            } else {
                let (naive, is_utc) = values::parse_datetime(part, 0, 0)?;
                let dt = self.attach_spec(naive, is_utc, line.tzid());
                incidence.recurrence_mut().add_exdate_time(dt);
            }
        }
        Ok(())
    }

    /// Reads a VALARM component.
    ///
    /// ## Errors
    /// Returns an error when the trigger is unparseable.
    pub fn read_alarm(&mut self, component: &Component) -> CalendarResult<Alarm> {
        let action = component.property_value("ACTION").unwrap_or_default();
        let description =
            values::unescape_text(component.property_value("DESCRIPTION").unwrap_or_default());
        let attach = component.property_value("ATTACH").unwrap_or_default();

        let action = match action.to_ascii_uppercase().as_str() {
            "DISPLAY" => AlarmAction::Display { text: description },
            "AUDIO" => AlarmAction::Audio { file: attach.to_string() },
            "PROCEDURE" => AlarmAction::Procedure {
                file: attach.to_string(),
                args: description,
            },
            "EMAIL" => {
                let recipients = component
                    .properties_named("ATTENDEE")
                    .iter()
                    .map(|a| read_person(a))
                    .collect();
                let attachments = component
                    .properties_named("ATTACH")
                    .iter()
                    .map(|a| a.value.clone())
                    .collect();
                AlarmAction::Email {
                    subject: values::unescape_text(
                        component.property_value("SUMMARY").unwrap_or_default(),
                    ),
                    text: description,
                    recipients,
                    attachments,
                }
            }
            _ => AlarmAction::Invalid,
        };

        let mut alarm = Alarm::new(action);

        if let Some(trigger) = component.property("TRIGGER") {
            if trigger.value_type() == Some("DATE-TIME") || trigger.value.contains('T') {
                let (naive, is_utc) = values::parse_datetime(&trigger.value, 0, 0)?;
                alarm.set_trigger(Trigger::Absolute(self.attach_spec(naive, is_utc, trigger.tzid())));
            } else {
                let offset = values::parse_duration(&trigger.value, 0, 0)?;
                let related_end = trigger
                    .param_value("RELATED")
                    .is_some_and(|r| r.eq_ignore_ascii_case("END"));
                alarm.set_trigger(if related_end {
                    Trigger::OffsetEnd(offset)
                } else {
                    Trigger::OffsetStart(offset)
                });
            }
        }

        let repeat = component
            .property_value("REPEAT")
            .and_then(|v| values::parse_integer(v, 0, 0).ok())
            .unwrap_or(0);
        let snooze = component
            .property_value("DURATION")
            .and_then(|v| values::parse_duration(v, 0, 0).ok())
            .unwrap_or_default();
        if repeat > 0 {
            alarm.set_repeat(repeat, snooze);
        }

        for line in &component.properties {
            if line.name.starts_with("X-") {
                let params = line.params_wire();
                alarm.custom_properties_mut().set_with_parameters(
                    &line.name,
                    &line.value,
                    (!params.is_empty()).then_some(params),
                );
            }
        }
        if alarm.custom_properties().get(ALARM_ENABLED_PROPERTY) == Some("FALSE") {
            alarm.set_enabled(false);
            alarm.custom_properties_mut().remove(ALARM_ENABLED_PROPERTY);
        }

        Ok(alarm)
    }

    /// Reads a VFREEBUSY component.
    ///
    /// ## Errors
    /// Returns an error when a period value is unparseable.
    pub fn read_freebusy(&mut self, component: &Component) -> CalendarResult<FreeBusy> {
        let mut freebusy = FreeBusy::new();
        if let Some(uid) = component.property_value("UID") {
            freebusy.base_mut().set_uid(uid);
        }
        if let Some(line) = component.property("DTSTART") {
            let start = self.read_datetime(line)?;
            freebusy.base_mut().set_dt_start(Some(start));
        }
        if let Some(line) = component.property("DTEND") {
            let end = self.read_datetime(line)?;
            freebusy.set_dt_end(Some(end));
        }
        if let Some(line) = component.property("ORGANIZER") {
            freebusy.base_mut().set_organizer(read_person(line));
        }
        for line in component.properties_named("ATTENDEE") {
            freebusy.base_mut().add_attendee(read_attendee(line));
        }
        for line in component.properties_named("FREEBUSY") {
            for part in line.value.split(',') {
                let ((start_naive, start_utc), end) = values::parse_period(part.trim(), 0, 0)?;
                let start = self.attach_spec(start_naive, start_utc, line.tzid());
                let period = match end {
                    values::PeriodEnd::End(naive, is_utc) => {
                        Period::new(start, self.attach_spec(naive, is_utc, line.tzid()))
                    }
                    values::PeriodEnd::Duration(duration) => Period::with_duration(start, duration),
                };
                freebusy.add_period(period);
            }
        }
        freebusy.sort_periods();
        freebusy.base_mut().reset_dirty_fields();
        Ok(freebusy)
    }
}

fn read_person(line: &ContentLine) -> Person {
    let email = line.value.trim_start_matches("mailto:").trim_start_matches("MAILTO:");
    let name = line.param_value("CN").unwrap_or_default();
    Person::new(name, email)
}

fn read_attendee(line: &ContentLine) -> Attendee {
    let mut attendee = Attendee::from_person(read_person(line));
    if let Some(role) = line.param_value("ROLE").and_then(Role::parse) {
        attendee.set_role(role);
    }
    if let Some(status) = line.param_value("PARTSTAT").and_then(PartStat::parse) {
        attendee.set_status(status);
    }
    if let Some(rsvp) = line.param_value("RSVP") {
        attendee.set_rsvp(rsvp.eq_ignore_ascii_case("TRUE"));
    }
    if let Some(delegate) = line.param_value("DELEGATED-TO") {
        attendee.set_delegate(delegate);
    }
    if let Some(delegator) = line.param_value("DELEGATED-FROM") {
        attendee.set_delegator(delegator);
    }
    if let Some(uid) = line.param_value("X-UID") {
        attendee.set_uid(uid);
    }
    attendee
}

fn read_geo(incidence: &mut Incidence, value: &str) {
    let Some((lat, lon)) = value.split_once(';') else {
        tracing::warn!(value, "malformed GEO value");
        return;
    };
    match (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon)) => incidence.set_geo(lat, lon),
        _ => tracing::warn!(value, "malformed GEO coordinates"),
    }
}

fn read_conference(line: &ContentLine) -> Conference {
    let mut conference = Conference::new(&line.value, line.param_value("LABEL").unwrap_or_default());
    if let Some(features) = line.get_param("FEATURE") {
        conference.set_features(features.values.clone());
    }
    if let Some(language) = line.param_value("LANGUAGE") {
        conference.set_language(language);
    }
    conference
}

fn read_attachment(line: &ContentLine) -> Attachment {
    let mime = line.param_value("FMTTYPE").unwrap_or_default();
    let binary = line.value_type() == Some("BINARY")
        || line
            .param_value("ENCODING")
            .is_some_and(|e| e.eq_ignore_ascii_case("BASE64"));
    let mut attachment = if binary {
        Attachment::from_base64(&line.value, mime)
    } else {
        Attachment::from_uri(&line.value, mime)
    };
    if let Some(label) = line.param_value("X-LABEL") {
        attachment.set_label(label);
    }
    attachment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::parse::parse;
    use koyomi_core::datetime::TimeSpec;

    fn read_single(input: &str) -> Incidence {
        let root = parse(input).unwrap();
        let mut reader = Reader::for_calendar(&root);
        let child = root
            .children
            .iter()
            .find(|c| {
                matches!(
                    c.kind,
                    ComponentKind::Event | ComponentKind::Todo | ComponentKind::Journal
                )
            })
            .unwrap();
        reader.read_incidence(child).unwrap()
    }

    #[test]
    fn reads_basic_event() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:e1@example.com\r\n\
DTSTAMP:20260123T120000Z\r\n\
DTSTART:20260123T140000Z\r\n\
DTEND:20260123T150000Z\r\n\
SUMMARY:Meeting\\, important\r\n\
LOCATION:Room 12\r\n\
STATUS:CONFIRMED\r\n\
TRANSP:TRANSPARENT\r\n\
CLASS:PRIVATE\r\n\
PRIORITY:4\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        assert_eq!(incidence.uid(), "e1@example.com");
        assert_eq!(incidence.summary(), "Meeting, important");
        assert_eq!(incidence.location(), "Room 12");
        assert_eq!(*incidence.status(), Status::Confirmed);
        assert_eq!(incidence.secrecy(), Secrecy::Private);
        assert_eq!(incidence.priority(), 4);
        let event = incidence.as_event().unwrap();
        assert_eq!(event.transparency(), Transparency::Transparent);
        assert_eq!(
            event.dt_end(),
            CalDateTime::utc(2026, 1, 23, 15, 0, 0)
        );
        assert!(incidence.dirty_fields().is_empty());
    }

    #[test]
    fn resolves_tzid_from_document() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:z1\r\n\
DTSTART;TZID=Europe/Prague:20160709T120000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let start = incidence.dt_start().unwrap();
        assert_eq!(start.spec(), TimeSpec::Zoned(chrono_tz::Europe::Prague));
        assert_eq!(start.naive().to_string(), "2016-07-09 12:00:00");
    }

    #[test]
    fn all_day_end_becomes_inclusive() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:a1\r\n\
DTSTART;VALUE=DATE:20260123\r\n\
DTEND;VALUE=DATE:20260125\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        assert!(incidence.all_day());
        let event = incidence.as_event().unwrap();
        assert_eq!(
            event.dt_end().map(|dt| dt.date()),
            chrono::NaiveDate::from_ymd_opt(2026, 1, 24)
        );
    }

    #[test]
    fn priority_compat_applies() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//K Desktop Environment//NONSGML KOrganizer 3.3.2//EN\r\n\
X-KDE-ICAL-IMPLEMENTATION-VERSION:1.0\r\n\
BEGIN:VTODO\r\n\
UID:p1\r\n\
PRIORITY:3\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n",
        );
        assert_eq!(incidence.priority(), 5);
    }

    #[test]
    fn attendees_and_organizer() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:at1\r\n\
ORGANIZER;CN=Jane Doe:mailto:jane@example.com\r\n\
ATTENDEE;CN=Bob;ROLE=OPT-PARTICIPANT;PARTSTAT=ACCEPTED;RSVP=TRUE:mailto:bob@e\r\n\
 xample.com\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        assert_eq!(incidence.organizer().email(), "jane@example.com");
        let attendee = &incidence.attendees()[0];
        assert_eq!(attendee.email(), "bob@example.com");
        assert_eq!(attendee.role(), Role::Optional);
        assert_eq!(attendee.status(), PartStat::Accepted);
        assert!(attendee.rsvp());
    }

    #[test]
    fn recurrence_with_exdates() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:r1\r\n\
DTSTART:20260123T090000Z\r\n\
RRULE:FREQ=DAILY;COUNT=10\r\n\
EXDATE:20260125T090000Z,20260127T090000Z\r\n\
RDATE;VALUE=DATE:20260220\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let recurrence = incidence.recurrence().unwrap();
        assert_eq!(recurrence.rrules().len(), 1);
        assert_eq!(recurrence.exdate_times().len(), 2);
        assert_eq!(recurrence.rdates().len(), 1);
        assert!(!recurrence.recurs_at(&CalDateTime::utc(2026, 1, 25, 9, 0, 0).unwrap()));
        assert!(recurrence.recurs_at(&CalDateTime::utc(2026, 1, 24, 9, 0, 0).unwrap()));
    }

    #[test]
    fn alarm_with_repeat() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:al1\r\n\
DTSTART:20260123T090000Z\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT15M\r\n\
DESCRIPTION:Wake up\r\n\
REPEAT:2\r\n\
DURATION:PT5M\r\n\
X-LOCATION-RADIUS:250\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        let alarm = &incidence.alarms()[0];
        assert_eq!(alarm.trigger(), Trigger::OffsetStart(koyomi_core::Duration::Seconds(-900)));
        assert_eq!(alarm.repeat_count(), 2);
        assert_eq!(alarm.location_radius(), Some(250));
        assert!(matches!(alarm.action(), AlarmAction::Display { text } if text == "Wake up"));
    }

    #[test]
    fn unknown_properties_preserved() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x1\r\n\
X-APPLE-TRAVEL-ADVISORY-BEHAVIOR:AUTOMATIC\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        assert_eq!(
            incidence.custom_properties().get("X-APPLE-TRAVEL-ADVISORY-BEHAVIOR"),
            Some("AUTOMATIC")
        );
    }

    #[test]
    fn this_and_future_range() {
        let incidence = read_single(
            "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:taf\r\n\
DTSTART:20130312T140000Z\r\n\
RECURRENCE-ID;RANGE=THISANDFUTURE:20130312T100000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n",
        );
        assert!(incidence.this_and_future());
        assert_eq!(
            incidence.recurrence_id(),
            CalDateTime::utc(2013, 3, 12, 10, 0, 0)
        );
    }

    #[test]
    fn version_checks() {
        let v1 = parse("BEGIN:VCALENDAR\r\nVERSION:1.0\r\nEND:VCALENDAR\r\n").unwrap();
        assert_eq!(Reader::check_version(&v1), Err(CalendarError::CalVersion1));
        let none = parse("BEGIN:VCALENDAR\r\nPRODID:x\r\nEND:VCALENDAR\r\n").unwrap();
        assert_eq!(
            Reader::check_version(&none),
            Err(CalendarError::VersionPropertyMissing)
        );
    }
}
