//! A single recurrence rule (one RRULE line).
//!
//! The rule stores the RFC 5545 RECUR fields and delegates expansion to the
//! `rrule` crate, pinned at the rule's own start timestamp. Conversion back
//! and forth keeps the start's zone flavour so wall-clock recurrence
//! survives DST transitions.

use chrono::{DateTime, Month, TimeZone, Weekday};

use crate::datetime::{CalDateTime, TimeSpec};

/// Hard cap on backend expansion, so hostile SECONDLY rules stay bounded.
const MAX_EXPANSION: u16 = u16::MAX;

/// Recurrence frequency (RFC 5545 §3.3.10 FREQ).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Parses the FREQ value (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Some(Self::Secondly),
            "MINUTELY" => Some(Self::Minutely),
            "HOURLY" => Some(Self::Hourly),
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "MONTHLY" => Some(Self::Monthly),
            "YEARLY" => Some(Self::Yearly),
            _ => None,
        }
    }

    fn to_backend(self) -> rrule::Frequency {
        match self {
            Self::Secondly => rrule::Frequency::Secondly,
            Self::Minutely => rrule::Frequency::Minutely,
            Self::Hourly => rrule::Frequency::Hourly,
            Self::Daily => rrule::Frequency::Daily,
            Self::Weekly => rrule::Frequency::Weekly,
            Self::Monthly => rrule::Frequency::Monthly,
            Self::Yearly => rrule::Frequency::Yearly,
        }
    }
}

/// A weekday with an optional ordinal, e.g. `MO`, `1MO`, `-1FR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    pub ordinal: Option<i16>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    #[must_use]
    pub const fn every(weekday: Weekday) -> Self {
        Self { ordinal: None, weekday }
    }

    #[must_use]
    pub const fn nth(ordinal: i16, weekday: Weekday) -> Self {
        Self { ordinal: Some(ordinal), weekday }
    }
}

/// How a rule ends.
///
/// Stored the way the original wire format stores it: `-1` runs forever,
/// `0` means the until-date bounds the rule, positive is an occurrence
/// count.
pub const DURATION_FOREVER: i32 = -1;
pub const DURATION_UNTIL: i32 = 0;

/// One recurrence rule pinned at a start timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    freq: Frequency,
    interval: u16,
    duration: i32,
    until: Option<CalDateTime>,
    week_start: Weekday,
    by_second: Vec<u8>,
    by_minute: Vec<u8>,
    by_hour: Vec<u8>,
    by_day: Vec<WeekdayNum>,
    by_month_day: Vec<i8>,
    by_year_day: Vec<i16>,
    by_week_no: Vec<i8>,
    by_month: Vec<u8>,
    by_set_pos: Vec<i32>,
    start: CalDateTime,
    all_day: bool,
    read_only: bool,
}

impl RecurrenceRule {
    #[must_use]
    pub fn new(freq: Frequency, start: CalDateTime) -> Self {
        Self {
            freq,
            interval: 1,
            duration: DURATION_FOREVER,
            until: None,
            week_start: Weekday::Mon,
            by_second: Vec::new(),
            by_minute: Vec::new(),
            by_hour: Vec::new(),
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_year_day: Vec::new(),
            by_week_no: Vec::new(),
            by_month: Vec::new(),
            by_set_pos: Vec::new(),
            start,
            all_day: false,
            read_only: false,
        }
    }

    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        self.freq
    }

    pub fn set_frequency(&mut self, freq: Frequency) {
        if !self.read_only {
            self.freq = freq;
        }
    }

    #[must_use]
    pub const fn interval(&self) -> u16 {
        self.interval
    }

    pub fn set_interval(&mut self, interval: u16) {
        if !self.read_only {
            self.interval = interval.max(1);
        }
    }

    /// `-1` = forever, `0` = bounded by the until-date, positive = count.
    #[must_use]
    pub const fn duration(&self) -> i32 {
        self.duration
    }

    /// Sets the duration; any non-zero value clears the until-date.
    pub fn set_duration(&mut self, duration: i32) {
        if self.read_only {
            return;
        }
        self.duration = duration.max(DURATION_FOREVER);
        if self.duration != DURATION_UNTIL {
            self.until = None;
        }
    }

    #[must_use]
    pub const fn until(&self) -> Option<CalDateTime> {
        self.until
    }

    /// Sets the until-date and switches the duration to until-bounded.
    pub fn set_until(&mut self, until: CalDateTime) {
        if self.read_only {
            return;
        }
        self.until = Some(until);
        self.duration = DURATION_UNTIL;
    }

    #[must_use]
    pub const fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn set_week_start(&mut self, weekday: Weekday) {
        if !self.read_only {
            self.week_start = weekday;
        }
    }

    #[must_use]
    pub const fn start(&self) -> CalDateTime {
        self.start
    }

    pub fn set_start(&mut self, start: CalDateTime) {
        if !self.read_only {
            self.start = start;
        }
    }

    #[must_use]
    pub const fn all_day(&self) -> bool {
        self.all_day
    }

    pub fn set_all_day(&mut self, all_day: bool) {
        if !self.read_only {
            self.all_day = all_day;
        }
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    #[must_use]
    pub fn by_second(&self) -> &[u8] {
        &self.by_second
    }

    pub fn set_by_second(&mut self, list: Vec<u8>) {
        if !self.read_only {
            self.by_second = list;
        }
    }

    #[must_use]
    pub fn by_minute(&self) -> &[u8] {
        &self.by_minute
    }

    pub fn set_by_minute(&mut self, list: Vec<u8>) {
        if !self.read_only {
            self.by_minute = list;
        }
    }

    #[must_use]
    pub fn by_hour(&self) -> &[u8] {
        &self.by_hour
    }

    pub fn set_by_hour(&mut self, list: Vec<u8>) {
        if !self.read_only {
            self.by_hour = list;
        }
    }

    #[must_use]
    pub fn by_day(&self) -> &[WeekdayNum] {
        &self.by_day
    }

    pub fn set_by_day(&mut self, list: Vec<WeekdayNum>) {
        if !self.read_only {
            self.by_day = list;
        }
    }

    #[must_use]
    pub fn by_month_day(&self) -> &[i8] {
        &self.by_month_day
    }

    pub fn set_by_month_day(&mut self, list: Vec<i8>) {
        if !self.read_only {
            self.by_month_day = list;
        }
    }

    #[must_use]
    pub fn by_year_day(&self) -> &[i16] {
        &self.by_year_day
    }

    pub fn set_by_year_day(&mut self, list: Vec<i16>) {
        if !self.read_only {
            self.by_year_day = list;
        }
    }

    #[must_use]
    pub fn by_week_no(&self) -> &[i8] {
        &self.by_week_no
    }

    pub fn set_by_week_no(&mut self, list: Vec<i8>) {
        if !self.read_only {
            self.by_week_no = list;
        }
    }

    #[must_use]
    pub fn by_month(&self) -> &[u8] {
        &self.by_month
    }

    pub fn set_by_month(&mut self, list: Vec<u8>) {
        if !self.read_only {
            self.by_month = list;
        }
    }

    #[must_use]
    pub fn by_set_pos(&self) -> &[i32] {
        &self.by_set_pos
    }

    pub fn set_by_set_pos(&mut self, list: Vec<i32>) {
        if !self.read_only {
            self.by_set_pos = list;
        }
    }

    /// Converts a timestamp into the expansion frame.
    ///
    /// Zoned and UTC starts expand in their real zone; floating and
    /// fixed-offset starts expand on the naive wall clock (constant offset,
    /// so instant and wall-clock arithmetic agree).
    fn to_expansion(&self, dt: &CalDateTime) -> Option<DateTime<rrule::Tz>> {
        match self.start.spec() {
            TimeSpec::Utc => Some(rrule::Tz::UTC.from_utc_datetime(&dt.to_utc().naive_utc())),
            TimeSpec::Zoned(tz) => Some(
                dt.to_utc()
                    .with_timezone(&rrule::Tz::Tz(tz)),
            ),
            TimeSpec::Floating | TimeSpec::Fixed(_) => {
                let local = dt.to_spec(self.start.spec());
                Some(rrule::Tz::UTC.from_utc_datetime(&local.naive()))
            }
        }
    }

    /// Converts a backend timestamp back into the start's zone flavour.
    fn from_expansion(&self, dt: &DateTime<rrule::Tz>) -> CalDateTime {
        match self.start.spec() {
            TimeSpec::Utc => CalDateTime::new(dt.naive_utc(), TimeSpec::Utc),
            TimeSpec::Zoned(tz) => CalDateTime::new(dt.naive_local(), TimeSpec::Zoned(tz)),
            spec @ (TimeSpec::Floating | TimeSpec::Fixed(_)) => {
                CalDateTime::new(dt.naive_utc(), spec)
            }
        }
    }

    /// Builds the backend rule set, or `None` when the fields don't form a
    /// valid rule (logged and treated as "recurs never", per the lenient
    /// parse policy).
    fn backend(&self) -> Option<rrule::RRuleSet> {
        let mut rule = rrule::RRule::new(self.freq.to_backend()).interval(self.interval);

        if self.duration > 0 {
            rule = rule.count(self.duration.unsigned_abs());
        } else if let Some(until) = self.until {
            // The backend insists on a UTC until; express the bound as the
            // same instant in the expansion frame's UTC reading.
            let until_utc = match self.start.spec() {
                TimeSpec::Utc | TimeSpec::Zoned(_) => until.to_utc().naive_utc(),
                TimeSpec::Floating | TimeSpec::Fixed(_) => {
                    until.to_spec(self.start.spec()).naive()
                }
            };
            rule = rule.until(rrule::Tz::UTC.from_utc_datetime(&until_utc));
        } else {
            // Unbounded.
        }

        if !self.by_second.is_empty() {
            rule = rule.by_second(self.by_second.clone());
        }
        if !self.by_minute.is_empty() {
            rule = rule.by_minute(self.by_minute.clone());
        }
        if !self.by_hour.is_empty() {
            rule = rule.by_hour(self.by_hour.clone());
        }
        if !self.by_day.is_empty() {
            let weekdays = self
                .by_day
                .iter()
                .map(|wd| match wd.ordinal {
                    Some(n) => rrule::NWeekday::Nth(n, wd.weekday),
                    None => rrule::NWeekday::Every(wd.weekday),
                })
                .collect();
            rule = rule.by_weekday(weekdays);
        }
        if !self.by_month_day.is_empty() {
            rule = rule.by_month_day(self.by_month_day.clone());
        }
        if !self.by_year_day.is_empty() {
            rule = rule.by_year_day(self.by_year_day.clone());
        }
        if !self.by_week_no.is_empty() {
            rule = rule.by_week_no(self.by_week_no.clone());
        }
        if !self.by_month.is_empty() {
            let months: Vec<Month> = self
                .by_month
                .iter()
                .filter_map(|m| Month::try_from(*m).ok())
                .collect();
            rule = rule.by_month(&months);
        }
        if !self.by_set_pos.is_empty() {
            rule = rule.by_set_pos(self.by_set_pos.clone());
        }

        rule = rule.week_start(self.week_start);

        let dt_start = self.to_expansion(&self.start)?;
        match rule.build(dt_start) {
            Ok(set) => Some(set),
            Err(err) => {
                tracing::warn!(error = %err, "dropping invalid recurrence rule");
                None
            }
        }
    }

    /// All occurrences in `[from, to]`, inclusive and ordered.
    ///
    /// The window is widened by a second on each side before asking the
    /// backend, then trimmed precisely, so bound-inclusiveness never
    /// depends on the backend's conventions.
    #[must_use]
    pub fn times_in_interval(&self, from: &CalDateTime, to: &CalDateTime) -> Vec<CalDateTime> {
        let Some(set) = self.backend() else {
            return Vec::new();
        };
        let (Some(lower), Some(upper)) = (
            self.to_expansion(&from.add_seconds(-1)),
            self.to_expansion(&to.add_seconds(1)),
        ) else {
            return Vec::new();
        };
        let result = set.after(lower).before(upper).all(MAX_EXPANSION);
        if result.limited {
            tracing::warn!("recurrence expansion truncated");
        }
        let from_utc = from.to_utc();
        let to_utc = to.to_utc();
        result
            .dates
            .iter()
            .map(|dt| self.from_expansion(dt))
            .filter(|occ| occ.to_utc() >= from_utc && occ.to_utc() <= to_utc)
            .collect()
    }

    /// The first occurrence strictly after `after`.
    #[must_use]
    pub fn next_after(&self, after: &CalDateTime) -> Option<CalDateTime> {
        let set = self.backend()?;
        let lower = self.to_expansion(after)?;
        let after_utc = after.to_utc();
        // A couple of occurrences suffice: the bound may be inclusive.
        let result = set.after(lower).all(8);
        result
            .dates
            .iter()
            .map(|dt| self.from_expansion(dt))
            .find(|occ| occ.to_utc() > after_utc)
    }

    /// The last occurrence strictly before `before`.
    #[must_use]
    pub fn prev_before(&self, before: &CalDateTime) -> Option<CalDateTime> {
        let set = self.backend()?;
        let upper = self.to_expansion(before)?;
        let before_utc = before.to_utc();
        let result = set.before(upper).all(MAX_EXPANSION);
        if result.limited {
            tracing::warn!("recurrence history truncated");
        }
        result
            .dates
            .iter()
            .map(|dt| self.from_expansion(dt))
            .filter(|occ| occ.to_utc() < before_utc)
            .next_back()
    }

    /// The last occurrence, or `None` when the rule runs forever (or is
    /// until-bounded with no until-date set).
    #[must_use]
    pub fn end_date(&self) -> Option<CalDateTime> {
        if self.duration == DURATION_FOREVER {
            return None;
        }
        if self.duration == DURATION_UNTIL {
            return self.until;
        }
        let set = self.backend()?;
        let result = set.all(MAX_EXPANSION);
        result.dates.last().map(|dt| self.from_expansion(dt))
    }

    /// True when `dt` is an occurrence of this rule.
    #[must_use]
    pub fn matches(&self, dt: &CalDateTime) -> bool {
        let Some(set) = self.backend() else {
            return false;
        };
        let (Some(lower), Some(upper)) = (
            self.to_expansion(&dt.add_seconds(-1)),
            self.to_expansion(&dt.add_seconds(1)),
        ) else {
            return false;
        };
        let dt_utc = dt.to_utc();
        set.after(lower)
            .before(upper)
            .all(8)
            .dates
            .iter()
            .any(|occ| self.from_expansion(occ).to_utc() == dt_utc)
    }
}
