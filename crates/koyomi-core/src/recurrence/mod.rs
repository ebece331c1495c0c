//! The full recurrence set of one incidence: rules, explicit dates and
//! exceptions, merged into one ordered occurrence stream.

mod rule;

pub use rule::{
    DURATION_FOREVER, DURATION_UNTIL, Frequency, RecurrenceRule, WeekdayNum,
};

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::datetime::{CalDateTime, TimeSpec};
use crate::period::Period;

/// Iteration guard for the next/previous search loops.
const MAX_SEARCH: usize = 10_000;

/// The recurrence of an incidence.
///
/// Holds the start timestamp, the RRULE/EXRULE lists and the explicit
/// include and exclude dates. The resulting occurrence set is the union of
/// the rule streams, the RDATEs and the start itself, minus everything the
/// EXRULE and EXDATE streams name. A `DATE`-typed EXDATE excludes every
/// occurrence on that local date; a `DATE-TIME` EXDATE excludes only the
/// exact instant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recurrence {
    start: Option<CalDateTime>,
    all_day: bool,
    rrules: Vec<RecurrenceRule>,
    exrules: Vec<RecurrenceRule>,
    rdate_times: Vec<CalDateTime>,
    rdate_periods: Vec<Period>,
    rdates: Vec<NaiveDate>,
    exdate_times: Vec<CalDateTime>,
    exdates: Vec<NaiveDate>,
}

impl Recurrence {
    #[must_use]
    pub fn new(start: CalDateTime) -> Self {
        Self {
            start: Some(start),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn start(&self) -> Option<CalDateTime> {
        self.start
    }

    /// Moves the recurrence start; child rules follow.
    pub fn set_start(&mut self, start: CalDateTime) {
        self.start = Some(start);
        for rule in self.rrules.iter_mut().chain(self.exrules.iter_mut()) {
            rule.set_start(start);
        }
    }

    #[must_use]
    pub const fn all_day(&self) -> bool {
        self.all_day
    }

    /// Toggles the all-day flag; propagated to every child rule.
    pub fn set_all_day(&mut self, all_day: bool) {
        self.all_day = all_day;
        for rule in self.rrules.iter_mut().chain(self.exrules.iter_mut()) {
            rule.set_all_day(all_day);
        }
    }

    /// True when any rule or include-date is present.
    #[must_use]
    pub fn recurs(&self) -> bool {
        !self.rrules.is_empty()
            || !self.rdate_times.is_empty()
            || !self.rdates.is_empty()
            || !self.rdate_periods.is_empty()
    }

    pub fn add_rrule(&mut self, mut rule: RecurrenceRule) {
        if let Some(start) = self.start {
            rule.set_start(start);
        }
        rule.set_all_day(self.all_day);
        self.rrules.push(rule);
    }

    pub fn add_exrule(&mut self, mut rule: RecurrenceRule) {
        if let Some(start) = self.start {
            rule.set_start(start);
        }
        rule.set_all_day(self.all_day);
        self.exrules.push(rule);
    }

    #[must_use]
    pub fn rrules(&self) -> &[RecurrenceRule] {
        &self.rrules
    }

    #[must_use]
    pub fn exrules(&self) -> &[RecurrenceRule] {
        &self.exrules
    }

    /// The first RRULE, which nearly all real-world data uses exclusively.
    #[must_use]
    pub fn default_rrule(&self) -> Option<&RecurrenceRule> {
        self.rrules.first()
    }

    pub fn default_rrule_mut(&mut self) -> Option<&mut RecurrenceRule> {
        self.rrules.first_mut()
    }

    pub fn clear_rrules(&mut self) {
        self.rrules.clear();
    }

    pub fn add_rdate(&mut self, date: NaiveDate) {
        self.rdates.push(date);
    }

    pub fn add_rdate_time(&mut self, dt: CalDateTime) {
        self.rdate_times.push(dt);
    }

    pub fn add_rdate_period(&mut self, period: Period) {
        self.rdate_periods.push(period);
    }

    pub fn add_exdate(&mut self, date: NaiveDate) {
        self.exdates.push(date);
    }

    pub fn add_exdate_time(&mut self, dt: CalDateTime) {
        self.exdate_times.push(dt);
    }

    #[must_use]
    pub fn rdates(&self) -> &[NaiveDate] {
        &self.rdates
    }

    #[must_use]
    pub fn rdate_times(&self) -> &[CalDateTime] {
        &self.rdate_times
    }

    #[must_use]
    pub fn rdate_periods(&self) -> &[Period] {
        &self.rdate_periods
    }

    #[must_use]
    pub fn exdates(&self) -> &[NaiveDate] {
        &self.exdates
    }

    #[must_use]
    pub fn exdate_times(&self) -> &[CalDateTime] {
        &self.exdate_times
    }

    /// The duration of the default rule: `-1` forever, `0` until-bounded,
    /// positive count. `0` with no rule means "does not recur".
    #[must_use]
    pub fn duration(&self) -> i32 {
        self.default_rrule().map_or(0, RecurrenceRule::duration)
    }

    /// Sets the occurrence count on the default rule, clearing its
    /// until-date.
    pub fn set_duration(&mut self, duration: i32) {
        if let Some(rule) = self.default_rrule_mut() {
            rule.set_duration(duration);
        } else {
            tracing::warn!("set_duration on a recurrence without rules");
        }
    }

    /// The end of the recurrence, or `None` when it runs forever.
    #[must_use]
    pub fn end_date(&self) -> Option<CalDateTime> {
        if !self.recurs() {
            return self.start;
        }
        let mut end: Option<CalDateTime> = None;
        for rule in &self.rrules {
            match rule.end_date() {
                // One infinite rule makes the whole set infinite.
                None => return None,
                Some(rule_end) => {
                    end = Some(end.map_or(rule_end, |e| e.max(rule_end)));
                }
            }
        }
        for dt in &self.rdate_times {
            end = Some(end.map_or(*dt, |e| e.max(*dt)));
        }
        for p in &self.rdate_periods {
            end = Some(end.map_or(p.start(), |e| e.max(p.start())));
        }
        for date in &self.rdates {
            let dt = self.date_occurrence(*date);
            end = Some(end.map_or(dt, |e| e.max(dt)));
        }
        end.or(self.start)
    }

    /// Bounds the default rule by an until-date, clearing its count.
    pub fn set_end_date(&mut self, end: CalDateTime) {
        if let Some(rule) = self.default_rrule_mut() {
            rule.set_until(end);
        } else {
            tracing::warn!("set_end_date on a recurrence without rules");
        }
    }

    /// The occurrence a date-only RDATE stands for: the start's wall-clock
    /// time on that date (midnight for all-day recurrences).
    fn date_occurrence(&self, date: NaiveDate) -> CalDateTime {
        let (time, spec) = match self.start {
            Some(start) if !self.all_day => (start.naive().time(), start.spec()),
            Some(start) => (NaiveTime::MIN, start.spec()),
            None => (NaiveTime::MIN, TimeSpec::Floating),
        };
        CalDateTime::new(date.and_time(time), spec)
    }

    /// True when `dt` is excluded by an EXDATE or EXRULE.
    fn is_excluded(&self, dt: &CalDateTime) -> bool {
        let instant = dt.to_utc();
        if self.exdate_times.iter().any(|ex| ex.to_utc() == instant) {
            return true;
        }
        let spec = self.start.map_or(TimeSpec::Floating, |s| s.spec());
        let local_date = dt.date_in(spec);
        if self.exdates.contains(&local_date) {
            return true;
        }
        self.exrules.iter().any(|rule| rule.matches(dt))
    }

    /// All occurrences in `[from, to]`, inclusive, ordered and
    /// de-duplicated by instant.
    #[must_use]
    pub fn times_in_interval(&self, from: &CalDateTime, to: &CalDateTime) -> Vec<CalDateTime> {
        let mut merged: BTreeMap<DateTime<Utc>, CalDateTime> = BTreeMap::new();
        let from_utc = from.to_utc();
        let to_utc = to.to_utc();

        let mut push = |dt: CalDateTime| {
            let instant = dt.to_utc();
            if instant >= from_utc && instant <= to_utc {
                merged.entry(instant).or_insert(dt);
            }
        };

        // The start itself is an occurrence unless excluded below.
        if let Some(start) = self.start {
            push(start);
        }
        for rule in &self.rrules {
            for dt in rule.times_in_interval(from, to) {
                push(dt);
            }
        }
        for dt in &self.rdate_times {
            push(*dt);
        }
        for p in &self.rdate_periods {
            push(p.start());
        }
        for date in &self.rdates {
            push(self.date_occurrence(*date));
        }

        merged
            .into_values()
            .filter(|dt| !self.is_excluded(dt))
            .collect()
    }

    /// True when an occurrence happens exactly at `dt`.
    #[must_use]
    pub fn recurs_at(&self, dt: &CalDateTime) -> bool {
        !self.times_in_interval(dt, dt).is_empty()
    }

    /// True when at least one occurrence overlaps the local date `date`
    /// viewed in `spec`.
    #[must_use]
    pub fn recurs_on(&self, date: NaiveDate, spec: TimeSpec) -> bool {
        let day_start = CalDateTime::new(date.and_time(NaiveTime::MIN), spec);
        let day_end = CalDateTime::new(
            date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)),
            spec,
        );
        !self.times_in_interval(&day_start, &day_end).is_empty()
    }

    /// The first occurrence strictly after `after`, or `None`.
    #[must_use]
    pub fn next_occurrence(&self, after: &CalDateTime) -> Option<CalDateTime> {
        let mut probe = *after;
        for _ in 0..MAX_SEARCH {
            let candidate = self.next_candidate(&probe)?;
            if !self.is_excluded(&candidate) {
                return Some(candidate);
            }
            probe = candidate;
        }
        None
    }

    fn next_candidate(&self, after: &CalDateTime) -> Option<CalDateTime> {
        let after_utc = after.to_utc();
        let mut best: Option<CalDateTime> = None;
        let mut consider = |dt: CalDateTime| {
            if dt.to_utc() > after_utc && best.is_none_or(|b| dt.to_utc() < b.to_utc()) {
                best = Some(dt);
            }
        };
        if let Some(start) = self.start {
            consider(start);
        }
        for rule in &self.rrules {
            if let Some(dt) = rule.next_after(after) {
                consider(dt);
            }
        }
        for dt in &self.rdate_times {
            consider(*dt);
        }
        for p in &self.rdate_periods {
            consider(p.start());
        }
        for date in &self.rdates {
            consider(self.date_occurrence(*date));
        }
        best
    }

    /// The last occurrence strictly before `before`, or `None`.
    #[must_use]
    pub fn previous_occurrence(&self, before: &CalDateTime) -> Option<CalDateTime> {
        let mut probe = *before;
        for _ in 0..MAX_SEARCH {
            let candidate = self.prev_candidate(&probe)?;
            if !self.is_excluded(&candidate) {
                return Some(candidate);
            }
            probe = candidate;
        }
        None
    }

    fn prev_candidate(&self, before: &CalDateTime) -> Option<CalDateTime> {
        let before_utc = before.to_utc();
        let mut best: Option<CalDateTime> = None;
        let mut consider = |dt: CalDateTime| {
            if dt.to_utc() < before_utc && best.is_none_or(|b| dt.to_utc() > b.to_utc()) {
                best = Some(dt);
            }
        };
        if let Some(start) = self.start {
            consider(start);
        }
        for rule in &self.rrules {
            if let Some(dt) = rule.prev_before(before) {
                consider(dt);
            }
        }
        for dt in &self.rdate_times {
            consider(*dt);
        }
        for p in &self.rdate_periods {
            consider(p.start());
        }
        for date in &self.rdates {
            consider(self.date_occurrence(*date));
        }
        best
    }

    /// Reinterprets every timestamp carried in `old` into `new`, keeping
    /// wall-clock values.
    pub fn shift_times(&mut self, old: TimeSpec, new: TimeSpec) {
        let shift = |dt: &mut CalDateTime| {
            if dt.spec() == old {
                *dt = dt.reinterpret(new);
            }
        };
        if let Some(start) = self.start.as_mut() {
            shift(start);
        }
        for dt in &mut self.rdate_times {
            shift(dt);
        }
        for dt in &mut self.exdate_times {
            shift(dt);
        }
        for rule in self.rrules.iter_mut().chain(self.exrules.iter_mut()) {
            let mut start = rule.start();
            shift(&mut start);
            rule.set_start(start);
            if let Some(mut until) = rule.until() {
                shift(&mut until);
                rule.set_until(until);
            }
        }
    }
}
