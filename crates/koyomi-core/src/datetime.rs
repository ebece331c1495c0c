//! Date-time values carrying the zone they were parsed with.
//!
//! Calendar data mixes four flavours of timestamps: UTC, zone-attached
//! local times, fixed-offset times and floating times with no zone at all.
//! `CalDateTime` keeps the wall-clock value and the flavour together so the
//! codec can serialize a value exactly the way it arrived.

use std::cmp::Ordering;
use std::fmt;

use chrono::{
    DateTime, Duration as ChronoDuration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime,
    NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;

/// The zone flavour of a [`CalDateTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeSpec {
    /// An instant in UTC (serialized with a trailing `Z`).
    Utc,
    /// A wall-clock time in a named IANA zone.
    Zoned(Tz),
    /// A wall-clock time at a fixed UTC offset (pseudo-zones like `UTC+01:00`).
    Fixed(FixedOffset),
    /// A wall-clock time with no zone; interpreted in the viewer's zone.
    #[default]
    Floating,
}

impl TimeSpec {
    /// Returns the zone identifier used when serializing, if any.
    #[must_use]
    pub fn tzid(&self) -> Option<String> {
        match self {
            Self::Utc | Self::Floating => None,
            Self::Zoned(tz) => Some(tz.name().to_string()),
            Self::Fixed(offset) => {
                let secs = offset.local_minus_utc();
                let sign = if secs < 0 { '-' } else { '+' };
                let abs = secs.abs();
                Some(format!("UTC{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60))
            }
        }
    }

    /// Stable key for ordering tie-breaks between equal instants.
    fn sort_key(&self) -> (u8, i64, &'static str) {
        match self {
            Self::Utc => (0, 0, ""),
            Self::Zoned(tz) => (1, 0, tz.name()),
            Self::Fixed(offset) => (2, i64::from(offset.local_minus_utc()), ""),
            Self::Floating => (3, 0, ""),
        }
    }
}

/// A date-time with an attached [`TimeSpec`].
///
/// Ordering and the instant-comparison helpers convert to UTC first;
/// floating values are interpreted as UTC for that purpose. Structural
/// equality requires the same wall-clock value *and* the same spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalDateTime {
    naive: NaiveDateTime,
    spec: TimeSpec,
}

impl CalDateTime {
    /// Creates a value from a wall-clock time and a spec.
    #[must_use]
    pub const fn new(naive: NaiveDateTime, spec: TimeSpec) -> Self {
        Self { naive, spec }
    }

    /// Creates a UTC value from calendar fields.
    ///
    /// Returns `None` for out-of-range fields.
    #[must_use]
    pub fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(hour, min, sec)?;
        Some(Self::new(date.and_time(time), TimeSpec::Utc))
    }

    /// Creates a floating value from calendar fields.
    #[must_use]
    pub fn floating(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Self::utc(year, month, day, hour, min, sec).map(|dt| dt.with_spec(TimeSpec::Floating))
    }

    /// Creates a zone-attached value from calendar fields.
    #[must_use]
    pub fn zoned(tz: Tz, year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Self::utc(year, month, day, hour, min, sec).map(|dt| dt.with_spec(TimeSpec::Zoned(tz)))
    }

    /// Wraps a chrono UTC instant.
    #[must_use]
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::new(dt.naive_utc(), TimeSpec::Utc)
    }

    /// Midnight at the start of `date`, floating.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::MIN), TimeSpec::Floating)
    }

    /// The wall-clock value, without zone interpretation.
    #[must_use]
    pub const fn naive(&self) -> NaiveDateTime {
        self.naive
    }

    /// The zone flavour.
    #[must_use]
    pub const fn spec(&self) -> TimeSpec {
        self.spec
    }

    /// Returns the same wall-clock value with a different spec.
    #[must_use]
    pub const fn with_spec(mut self, spec: TimeSpec) -> Self {
        self.spec = spec;
        self
    }

    /// The wall-clock date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.naive.date()
    }

    #[must_use]
    pub fn is_utc(&self) -> bool {
        self.spec == TimeSpec::Utc
    }

    #[must_use]
    pub fn is_floating(&self) -> bool {
        self.spec == TimeSpec::Floating
    }

    /// Converts to a UTC instant. Floating values are read as UTC.
    ///
    /// Ambiguous local times (DST fold) resolve to the earlier instant;
    /// non-existent local times (DST gap) are shifted forward by the gap.
    #[must_use]
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self.spec {
            TimeSpec::Utc | TimeSpec::Floating => Utc.from_utc_datetime(&self.naive),
            TimeSpec::Zoned(tz) => local_to_utc(&self.naive, &tz),
            TimeSpec::Fixed(offset) => local_to_utc(&self.naive, &offset),
        }
    }

    /// Re-expresses this instant in another zone (same point in time,
    /// different wall clock). Floating values are first read as UTC.
    #[must_use]
    pub fn to_spec(&self, spec: TimeSpec) -> Self {
        let utc = self.to_utc();
        let naive = match spec {
            TimeSpec::Utc | TimeSpec::Floating => utc.naive_utc(),
            TimeSpec::Zoned(tz) => utc.with_timezone(&tz).naive_local(),
            TimeSpec::Fixed(offset) => utc.with_timezone(&offset).naive_local(),
        };
        Self::new(naive, spec)
    }

    /// The wall-clock date this instant falls on when viewed in `spec`.
    #[must_use]
    pub fn date_in(&self, spec: TimeSpec) -> NaiveDate {
        self.to_spec(spec).date()
    }

    /// Reinterprets the wall-clock value in a different zone (same local
    /// time, different point in time). Used by `Calendar::shift_times`.
    #[must_use]
    pub const fn reinterpret(&self, spec: TimeSpec) -> Self {
        Self::new(self.naive, spec)
    }

    /// Adds wall-clock seconds (instant arithmetic; the local time shifts
    /// across DST transitions).
    #[must_use]
    pub fn add_seconds(&self, secs: i64) -> Self {
        let shifted = self.to_utc() + ChronoDuration::seconds(secs);
        Self::from_utc(shifted).to_spec(self.spec)
    }

    /// Adds calendar days, preserving the local wall-clock time across DST
    /// transitions.
    #[must_use]
    pub fn add_days(&self, days: i64) -> Self {
        let naive = self.naive + ChronoDuration::days(days);
        Self::new(naive, self.spec)
    }

    /// Signed seconds from `self` to `other` (instant difference).
    #[must_use]
    pub fn seconds_to(&self, other: &Self) -> i64 {
        (other.to_utc() - self.to_utc()).num_seconds()
    }

    /// True when both values denote the same instant, regardless of spec.
    #[must_use]
    pub fn same_instant(&self, other: &Self) -> bool {
        self.to_utc() == other.to_utc()
    }
}

/// Converts a local wall-clock time to UTC in `tz`, resolving DST folds to
/// the earlier instant and shifting DST gaps forward by one hour.
fn local_to_utc<Z: TimeZone>(naive: &NaiveDateTime, tz: &Z) -> DateTime<Utc> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = *naive + ChronoDuration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
                LocalResult::None => Utc.from_utc_datetime(naive),
            }
        }
    }
}

impl PartialOrd for CalDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CalDateTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc()
            .cmp(&other.to_utc())
            .then_with(|| self.naive.cmp(&other.naive))
            .then_with(|| self.spec.sort_key().cmp(&other.spec.sort_key()))
    }
}

impl fmt::Display for CalDateTime {
    /// ISO-8601, e.g. `2013-03-11T10:00:00Z` or `2013-03-11T10:00:00+01:00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.spec {
            TimeSpec::Utc => write!(f, "{}Z", self.naive.format("%Y-%m-%dT%H:%M:%S")),
            TimeSpec::Floating => write!(f, "{}", self.naive.format("%Y-%m-%dT%H:%M:%S")),
            TimeSpec::Fixed(offset) => {
                write!(f, "{}{offset}", self.naive.format("%Y-%m-%dT%H:%M:%S"))
            }
            TimeSpec::Zoned(tz) => {
                let offset = local_to_utc(&self.naive, &tz)
                    .with_timezone(&tz)
                    .offset()
                    .fix();
                write!(f, "{}{offset}", self.naive.format("%Y-%m-%dT%H:%M:%S"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_instant_roundtrip() {
        let dt = CalDateTime::utc(2013, 3, 10, 10, 0, 0).unwrap();
        assert_eq!(dt.to_utc(), Utc.with_ymd_and_hms(2013, 3, 10, 10, 0, 0).unwrap());
    }

    #[test]
    fn zoned_to_utc() {
        let dt = CalDateTime::zoned(chrono_tz::Europe::Prague, 2016, 7, 9, 12, 0, 0).unwrap();
        // CEST in July is UTC+2
        assert_eq!(dt.to_utc(), Utc.with_ymd_and_hms(2016, 7, 9, 10, 0, 0).unwrap());
    }

    #[test]
    fn ordering_is_by_instant() {
        let utc = CalDateTime::utc(2016, 7, 9, 10, 0, 0).unwrap();
        let prague = CalDateTime::zoned(chrono_tz::Europe::Prague, 2016, 7, 9, 12, 0, 0).unwrap();
        // Same instant, different wall clocks: neither strictly precedes.
        assert!(utc.same_instant(&prague));
        assert_ne!(utc, prague);
        let later = CalDateTime::utc(2016, 7, 9, 10, 0, 1).unwrap();
        assert!(utc < later);
        assert!(prague < later);
    }

    #[test]
    fn add_days_keeps_wall_clock_over_dst() {
        // 2016-03-26 09:00 Prague, the day before the spring DST change.
        let dt = CalDateTime::zoned(chrono_tz::Europe::Prague, 2016, 3, 26, 9, 0, 0).unwrap();
        let next = dt.add_days(1);
        assert_eq!(next.naive().time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        // The instant moved 23 hours, not 24.
        assert_eq!(dt.seconds_to(&next), 23 * 3600);
    }

    #[test]
    fn add_seconds_shifts_wall_clock_over_dst() {
        let dt = CalDateTime::zoned(chrono_tz::Europe::Prague, 2016, 3, 26, 9, 0, 0).unwrap();
        let next = dt.add_seconds(24 * 3600);
        assert_eq!(next.naive().time(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    }

    #[test]
    fn dst_gap_shifts_forward() {
        // 02:30 on 2016-03-27 does not exist in Prague.
        let dt = CalDateTime::zoned(chrono_tz::Europe::Prague, 2016, 3, 27, 2, 30, 0).unwrap();
        assert_eq!(dt.to_utc(), Utc.with_ymd_and_hms(2016, 3, 27, 1, 30, 0).unwrap());
    }

    #[test]
    fn fixed_offset_tzid() {
        let spec = TimeSpec::Fixed(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap());
        assert_eq!(spec.tzid().as_deref(), Some("UTC+05:30"));
        let spec = TimeSpec::Fixed(FixedOffset::west_opt(8 * 3600).unwrap());
        assert_eq!(spec.tzid().as_deref(), Some("UTC-08:00"));
    }

    #[test]
    fn display_iso8601() {
        let dt = CalDateTime::utc(2013, 3, 11, 10, 0, 0).unwrap();
        assert_eq!(dt.to_string(), "2013-03-11T10:00:00Z");
        let floating = dt.with_spec(TimeSpec::Floating);
        assert_eq!(floating.to_string(), "2013-03-11T10:00:00");
    }

    #[test]
    fn reinterpret_changes_instant() {
        let floating = CalDateTime::floating(2016, 1, 15, 10, 0, 0).unwrap();
        let prague = floating.reinterpret(TimeSpec::Zoned(chrono_tz::Europe::Prague));
        assert_eq!(prague.naive(), floating.naive());
        // Prague winter is UTC+1, so the instant moved back one hour.
        assert_eq!(prague.to_utc(), Utc.with_ymd_and_hms(2016, 1, 15, 9, 0, 0).unwrap());
    }

    #[test]
    fn zoned_display_carries_offset() {
        let dt = CalDateTime::zoned(chrono_tz::Europe::Prague, 2016, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(dt.to_string(), "2016-01-15T10:00:00+01:00");
    }
}
