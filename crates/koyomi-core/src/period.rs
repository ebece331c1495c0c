//! Time periods, bounded by an end timestamp or by a duration.

use std::cmp::Ordering;

use crate::datetime::CalDateTime;
use crate::duration::Duration;

/// A span of time starting at a fixed timestamp.
///
/// A period remembers whether it was given with an explicit end or with a
/// duration, so it serializes back the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    start: CalDateTime,
    end: PeriodEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PeriodEnd {
    At(CalDateTime),
    For(Duration),
}

impl Period {
    /// A period with an explicit end.
    #[must_use]
    pub const fn new(start: CalDateTime, end: CalDateTime) -> Self {
        Self { start, end: PeriodEnd::At(end) }
    }

    /// A period with a duration.
    #[must_use]
    pub const fn with_duration(start: CalDateTime, duration: Duration) -> Self {
        Self { start, end: PeriodEnd::For(duration) }
    }

    #[must_use]
    pub const fn start(&self) -> CalDateTime {
        self.start
    }

    /// The end of the period, computed for duration-bounded periods.
    #[must_use]
    pub fn end(&self) -> CalDateTime {
        match self.end {
            PeriodEnd::At(end) => end,
            PeriodEnd::For(d) => d.end(&self.start),
        }
    }

    /// True when the period was given as a duration.
    #[must_use]
    pub const fn has_duration(&self) -> bool {
        matches!(self.end, PeriodEnd::For(_))
    }

    /// The duration of the period, derived for end-bounded periods.
    #[must_use]
    pub fn duration(&self) -> Duration {
        match self.end {
            PeriodEnd::For(d) => d,
            PeriodEnd::At(end) => Duration::between(&self.start, &end),
        }
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    /// Orders by start, then by end.
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end().cmp(&other.end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_period_end() {
        let start = CalDateTime::utc(2026, 1, 23, 9, 0, 0).unwrap();
        let p = Period::with_duration(start, Duration::Seconds(8 * 3600));
        assert_eq!(p.end(), CalDateTime::utc(2026, 1, 23, 17, 0, 0).unwrap());
        assert!(p.has_duration());
    }

    #[test]
    fn explicit_period_duration() {
        let start = CalDateTime::utc(2026, 1, 23, 9, 0, 0).unwrap();
        let end = CalDateTime::utc(2026, 1, 23, 10, 30, 0).unwrap();
        let p = Period::new(start, end);
        assert!(!p.has_duration());
        assert_eq!(p.duration(), Duration::Seconds(5400));
    }

    #[test]
    fn ordering_by_start_then_end() {
        let s1 = CalDateTime::utc(2026, 1, 23, 9, 0, 0).unwrap();
        let s2 = CalDateTime::utc(2026, 1, 23, 10, 0, 0).unwrap();
        let short = Period::with_duration(s1, Duration::Seconds(600));
        let long = Period::with_duration(s1, Duration::Seconds(1200));
        let later = Period::with_duration(s2, Duration::Seconds(600));
        assert!(short < long);
        assert!(long < later);
    }
}
