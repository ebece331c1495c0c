//! Fixups for calendar files written by older or broken producers.
//!
//! The producer is sniffed from PRODID; each known-broken generation gets
//! a compat implementation that corrects its output while loading. Fixes
//! stack: a later generation inherits the fixes of the earlier ones it
//! still needs.

use chrono::{Datelike, NaiveDate};

use koyomi_core::alarm::Trigger;
use koyomi_core::datetime::CalDateTime;
use koyomi_core::incidence::Incidence;

/// Load-time fixups applied to incidences from a specific producer.
///
/// The default methods are the no-op behavior of a well-formed producer.
pub trait Compat {
    /// Repairs the recurrence of an incidence.
    fn fix_recurrence(&self, incidence: &mut Incidence) {
        let _ = incidence;
    }

    /// Copies the first description line into an empty summary. Some
    /// exporters put the one display field into DESCRIPTION.
    fn fix_empty_summary(&self, incidence: &mut Incidence) {
        if !incidence.summary().is_empty() || incidence.description().is_empty() {
            return;
        }
        let description = incidence.description().trim().to_string();
        let first_line = description.lines().next().unwrap_or_default().to_string();
        let consumed_whole = first_line == description;
        incidence.set_summary(first_line);
        if consumed_whole {
            incidence.set_description("");
        }
    }

    /// Repairs the alarms of an incidence.
    fn fix_alarms(&self, incidence: &mut Incidence) {
        let _ = incidence;
    }

    /// Repairs the end date of a floating all-day event.
    fn fix_floating_end(&self, date: NaiveDate) -> NaiveDate {
        date
    }

    /// Repairs a PRIORITY value.
    fn fix_priority(&self, priority: i32) -> i32 {
        priority
    }

    /// Whether zone-attached times from this producer can be trusted.
    fn use_timezone_shift(&self) -> bool {
        true
    }

    /// Backfills CREATED from DTSTAMP where the producer omitted it.
    fn set_created_to_dt_stamp(&self, incidence: &mut Incidence, dt_stamp: Option<CalDateTime>) {
        let _ = (incidence, dt_stamp);
    }
}

/// A well-behaved producer: only the shared default fixes apply.
#[derive(Debug, Default)]
pub struct CompatDefault;

impl Compat for CompatDefault {}

/// Producers before 3.5 did not count a non-matching DTSTART as an
/// occurrence; restore that by excluding the start when it does not match
/// the rule.
#[derive(Debug, Default)]
pub struct CompatPre35;

fn pre35_fix_recurrence(incidence: &mut Incidence) {
    let Some(start) = incidence.dt_start() else {
        return;
    };
    let needs_exdate = incidence
        .recurrence()
        .and_then(|rec| rec.default_rrule().map(|rule| !rule.matches(&start)))
        .unwrap_or(false);
    if needs_exdate {
        incidence.recurrence_mut().add_exdate_time(start);
    }
}

impl Compat for CompatPre35 {
    fn fix_recurrence(&self, incidence: &mut Incidence) {
        pre35_fix_recurrence(incidence);
    }
}

/// Producers before 3.4 wrote priorities 1..5; stretch them over the
/// RFC's 1..9 scale.
#[derive(Debug, Default)]
pub struct CompatPre34;

fn pre34_fix_priority(priority: i32) -> i32 {
    if (1..6).contains(&priority) {
        2 * priority - 1
    } else {
        priority
    }
}

impl Compat for CompatPre34 {
    fn fix_recurrence(&self, incidence: &mut Incidence) {
        pre35_fix_recurrence(incidence);
    }

    fn fix_priority(&self, priority: i32) -> i32 {
        pre34_fix_priority(priority)
    }
}

/// Producers before 3.2 counted EXDATE-excluded instances into the
/// recurrence duration.
#[derive(Debug, Default)]
pub struct CompatPre32;

fn pre32_fix_recurrence(incidence: &mut Incidence) {
    let adjustment = incidence.recurrence().and_then(|rec| {
        let excluded = rec.exdates().len() + rec.exdate_times().len();
        (rec.recurs() && rec.duration() > 0 && excluded > 0)
            .then(|| rec.duration() + i32::try_from(excluded).unwrap_or(0))
    });
    if let Some(duration) = adjustment {
        incidence.recurrence_mut().set_duration(duration);
    }
    pre35_fix_recurrence(incidence);
}

impl Compat for CompatPre32 {
    fn fix_recurrence(&self, incidence: &mut Incidence) {
        pre32_fix_recurrence(incidence);
    }

    fn fix_priority(&self, priority: i32) -> i32 {
        pre34_fix_priority(priority)
    }
}

/// Producers before 3.1: floating all-day events ended at 0:00 of their
/// last day, and yearly day-number recurrences stored day-of-year values
/// that need converting to months.
#[derive(Debug, Default)]
pub struct CompatPre31;

impl Compat for CompatPre31 {
    fn fix_floating_end(&self, date: NaiveDate) -> NaiveDate {
        date.succ_opt().unwrap_or(date)
    }

    fn fix_recurrence(&self, incidence: &mut Incidence) {
        pre32_fix_recurrence(incidence);

        // Yearly day numbers were stored with a leap-year fudge; convert
        // them to plain months.
        let conversion = incidence.recurrence().and_then(|rec| {
            let rule = rec.default_rrule()?;
            if rule.by_year_day().is_empty() {
                return None;
            }
            let year = rule.start().date().year();
            let mut months: Vec<u8> = rule.by_month().to_vec();
            for month in rule.by_month() {
                let day_number = i64::from(*month);
                let converted = NaiveDate::from_ymd_opt(year, 1, 1)
                    .and_then(|jan1| jan1.checked_add_signed(chrono::Duration::days(day_number - 1)))
                    .map(|d| u8::try_from(d.month()).unwrap_or(1))?;
                if !months.contains(&converted) {
                    months.push(converted);
                }
            }
            Some(months)
        });
        if let Some(months) = conversion {
            let rec = incidence.recurrence_mut();
            if let Some(rule) = rec.default_rrule_mut() {
                rule.set_by_month(months);
                rule.set_by_year_day(Vec::new());
            }
        }
    }

    fn fix_priority(&self, priority: i32) -> i32 {
        pre34_fix_priority(priority)
    }
}

/// Outlook 9 wrote alarm offsets with the wrong sign.
#[derive(Debug, Default)]
pub struct CompatOutlook9;

impl Compat for CompatOutlook9 {
    fn fix_alarms(&self, incidence: &mut Incidence) {
        let fixed: Vec<_> = incidence
            .alarms()
            .iter()
            .cloned()
            .map(|mut alarm| {
                if let Trigger::OffsetStart(offset) = alarm.trigger()
                    && !offset.is_negative()
                    && !offset.is_zero()
                {
                    alarm.set_trigger(Trigger::OffsetStart(-offset));
                }
                alarm
            })
            .collect();
        incidence.clear_alarms();
        for alarm in fixed {
            incidence.add_alarm(alarm);
        }
    }
}

/// The 3.2 prerelease builds wrote zone-attached times that must not be
/// shifted on load.
#[derive(Debug, Default)]
pub struct Compat32Prerelease;

impl Compat for Compat32Prerelease {
    fn use_timezone_shift(&self) -> bool {
        false
    }
}

/// Producers before 4.10 omitted CREATED; decorator backfilling it from
/// DTSTAMP on top of whatever other compat applies.
pub struct CompatPre410 {
    inner: Box<dyn Compat>,
}

impl std::fmt::Debug for CompatPre410 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompatPre410").finish_non_exhaustive()
    }
}

impl CompatPre410 {
    #[must_use]
    pub fn new(inner: Box<dyn Compat>) -> Self {
        Self { inner }
    }
}

impl Compat for CompatPre410 {
    fn fix_recurrence(&self, incidence: &mut Incidence) {
        self.inner.fix_recurrence(incidence);
    }

    fn fix_empty_summary(&self, incidence: &mut Incidence) {
        self.inner.fix_empty_summary(incidence);
    }

    fn fix_alarms(&self, incidence: &mut Incidence) {
        self.inner.fix_alarms(incidence);
    }

    fn fix_floating_end(&self, date: NaiveDate) -> NaiveDate {
        self.inner.fix_floating_end(date)
    }

    fn fix_priority(&self, priority: i32) -> i32 {
        self.inner.fix_priority(priority)
    }

    fn use_timezone_shift(&self) -> bool {
        self.inner.use_timezone_shift()
    }

    fn set_created_to_dt_stamp(&self, incidence: &mut Incidence, dt_stamp: Option<CalDateTime>) {
        if let Some(dt_stamp) = dt_stamp {
            incidence.set_created(Some(dt_stamp));
        }
    }
}

/// Picks the compat chain for a PRODID and implementation version.
#[must_use]
pub fn pick_compat(product_id: &str, implementation_version: &str) -> Box<dyn Compat> {
    let mut compat: Box<dyn Compat> = if let Some(version) = korganizer_version(product_id) {
        match version {
            (num, _) if num < 30_100 => Box::new(CompatPre31),
            (num, _) if num < 30_200 => Box::new(CompatPre32),
            (30_200, true) => {
                tracing::debug!("using 3.2 prerelease compatibility");
                Box::new(Compat32Prerelease)
            }
            (num, _) if num < 30_400 => Box::new(CompatPre34),
            (num, _) if num < 30_500 => Box::new(CompatPre35),
            _ => Box::new(CompatDefault),
        }
    } else if product_id.contains("Outlook 9.0") {
        tracing::debug!("using Outlook < 2000 compatibility");
        Box::new(CompatOutlook9)
    } else {
        Box::new(CompatDefault)
    };

    // Files from the affected suites that predate implementation
    // versioning also need CREATED backfilled.
    if implementation_version.is_empty()
        && ["libkcal", "KOrganizer", "KAlarm"]
            .iter()
            .any(|p| product_id.contains(p))
    {
        compat = Box::new(CompatPre410::new(compat));
    }

    compat
}

/// Extracts `(major*10000 + minor*100 + patch, is_prerelease)` from a
/// PRODID mentioning KOrganizer.
fn korganizer_version(product_id: &str) -> Option<(i32, bool)> {
    let idx = product_id.find("KOrganizer")?;
    let rest = &product_id[idx + "KOrganizer".len()..];
    let rest = rest.trim_start();
    let version_end = rest
        .find(|c: char| c != '.' && !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let version = &rest[..version_end];
    if version.is_empty() {
        return None;
    }
    let mut parts = version.split('.');
    let major: i32 = parts.next()?.parse().ok()?;
    let minor: i32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let patch: i32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let prerelease = rest[version_end..].trim_start().starts_with("pre")
        || rest[version_end..].starts_with("/pre");
    Some((major * 10_000 + minor * 100 + patch, prerelease))
}

#[cfg(test)]
mod tests {
    use super::*;
    use koyomi_core::duration::Duration;
    use koyomi_core::incidence::Event;
    use koyomi_core::recurrence::{Frequency, RecurrenceRule};

    #[test]
    fn version_extraction() {
        assert_eq!(
            korganizer_version("-//K Desktop Environment//NONSGML KOrganizer 3.3.1//EN"),
            Some((30_301, false))
        );
        assert_eq!(
            korganizer_version("-//KDE//NONSGML KOrganizer 3.2 pre//EN"),
            Some((30_200, true))
        );
        assert_eq!(korganizer_version("-//Apple//CalendarServer//EN"), None);
    }

    #[test]
    fn priority_mapping_pre34() {
        assert_eq!(pre34_fix_priority(1), 1);
        assert_eq!(pre34_fix_priority(2), 3);
        assert_eq!(pre34_fix_priority(3), 5);
        assert_eq!(pre34_fix_priority(4), 7);
        assert_eq!(pre34_fix_priority(5), 9);
        assert_eq!(pre34_fix_priority(7), 7);
        assert_eq!(pre34_fix_priority(0), 0);
    }

    #[test]
    fn pick_compat_by_prodid() {
        let compat = pick_compat("-//KDE//NONSGML KOrganizer 3.3.0//EN", "1.0");
        assert_eq!(compat.fix_priority(3), 5);

        let compat = pick_compat("-//KDE//NONSGML KOrganizer 3.5.0//EN", "1.0");
        assert_eq!(compat.fix_priority(3), 3);

        let compat = pick_compat("-//KDE//NONSGML KOrganizer 3.2 pre//EN", "1.0");
        assert!(!compat.use_timezone_shift());
    }

    #[test]
    fn pre410_wraps_missing_implementation_version() {
        let compat = pick_compat("-//KDE//NONSGML KOrganizer 3.3.0//EN", "");
        let mut incidence = Incidence::Event(Event::new());
        let stamp = CalDateTime::utc(2010, 5, 1, 12, 0, 0);
        compat.set_created_to_dt_stamp(&mut incidence, stamp);
        assert_eq!(incidence.created(), stamp);
        // Inner fixes still apply through the decorator.
        assert_eq!(compat.fix_priority(2), 3);
    }

    #[test]
    fn pre35_adds_exdate_for_non_matching_start() {
        // Start on a Tuesday, rule only recurs on Mondays.
        let start = CalDateTime::utc(2026, 1, 6, 9, 0, 0).unwrap();
        let mut event = Event::new();
        event.set_dt_start(Some(start));
        let mut rule = RecurrenceRule::new(Frequency::Weekly, start);
        rule.set_by_day(vec![koyomi_core::recurrence::WeekdayNum::every(
            chrono::Weekday::Mon,
        )]);
        event.recurrence_mut().add_rrule(rule);
        let mut incidence = Incidence::Event(event);

        CompatPre35.fix_recurrence(&mut incidence);
        assert_eq!(incidence.recurrence().unwrap().exdate_times(), [start]);
        assert!(!incidence.recurrence().unwrap().recurs_at(&start));
    }

    #[test]
    fn outlook9_negates_positive_offsets() {
        let mut event = Event::new();
        event.add_alarm(koyomi_core::Alarm::display("x", Duration::Seconds(900)));
        let mut incidence = Incidence::Event(event);
        CompatOutlook9.fix_alarms(&mut incidence);
        assert_eq!(
            incidence.alarms()[0].trigger(),
            Trigger::OffsetStart(Duration::Seconds(-900))
        );
    }

    #[test]
    fn empty_summary_backfilled_from_description() {
        let mut event = Event::new();
        event.set_description("Only line");
        let mut incidence = Incidence::Event(event);
        CompatDefault.fix_empty_summary(&mut incidence);
        assert_eq!(incidence.summary(), "Only line");
        assert_eq!(incidence.description(), "");

        let mut event = Event::new();
        event.set_description("First\nSecond");
        let mut incidence = Incidence::Event(event);
        CompatDefault.fix_empty_summary(&mut incidence);
        assert_eq!(incidence.summary(), "First");
        assert_eq!(incidence.description(), "First\nSecond");
    }

    #[test]
    fn pre32_duration_counts_exdates() {
        let start = CalDateTime::utc(2026, 1, 5, 9, 0, 0).unwrap();
        let mut event = Event::new();
        event.set_dt_start(Some(start));
        let mut rule = RecurrenceRule::new(Frequency::Daily, start);
        rule.set_duration(5);
        event.recurrence_mut().add_rrule(rule);
        event
            .recurrence_mut()
            .add_exdate_time(CalDateTime::utc(2026, 1, 6, 9, 0, 0).unwrap());
        let mut incidence = Incidence::Event(event);

        CompatPre32.fix_recurrence(&mut incidence);
        assert_eq!(incidence.recurrence().unwrap().duration(), 6);
    }
}
