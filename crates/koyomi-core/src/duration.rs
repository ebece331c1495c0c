//! Signed durations that remember whether they were given in days or
//! seconds.
//!
//! A days-duration is not interchangeable with the equivalent number of
//! seconds: adding "one day" to a timestamp keeps the wall-clock time even
//! across a DST transition, while adding 86400 seconds does not. The unit
//! therefore survives arithmetic and equality.

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::datetime::CalDateTime;

/// A signed length of time in one of two units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Duration {
    /// Wall-clock seconds.
    Seconds(i64),
    /// Calendar days.
    Days(i64),
}

impl Duration {
    /// The number of seconds in a nominal day, used when coercing.
    const SECONDS_PER_DAY: i64 = 86_400;

    /// Duration between two timestamps, in seconds.
    #[must_use]
    pub fn between(start: &CalDateTime, end: &CalDateTime) -> Self {
        Self::Seconds(start.seconds_to(end))
    }

    /// The raw count in the duration's own unit.
    #[must_use]
    pub const fn value(&self) -> i64 {
        match *self {
            Self::Seconds(n) | Self::Days(n) => n,
        }
    }

    #[must_use]
    pub const fn is_daily(&self) -> bool {
        matches!(self, Self::Days(_))
    }

    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.value() < 0
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.value() == 0
    }

    /// The duration as seconds, coercing days at 24h.
    #[must_use]
    pub const fn as_seconds(&self) -> i64 {
        match *self {
            Self::Seconds(n) => n,
            Self::Days(n) => n * Self::SECONDS_PER_DAY,
        }
    }

    /// The duration as whole days, truncating seconds.
    #[must_use]
    pub const fn as_days(&self) -> i64 {
        match *self {
            Self::Seconds(n) => n / Self::SECONDS_PER_DAY,
            Self::Days(n) => n,
        }
    }

    /// The end of the duration starting at `start`.
    ///
    /// Days use calendar arithmetic (wall-clock preserved over DST),
    /// seconds use instant arithmetic.
    #[must_use]
    pub fn end(&self, start: &CalDateTime) -> CalDateTime {
        match *self {
            Self::Seconds(n) => start.add_seconds(n),
            Self::Days(n) => start.add_days(n),
        }
    }

    /// RFC 5545 serialization, e.g. `P7D`, `PT3600S`, `-PT900S`.
    #[must_use]
    pub fn to_ical_string(&self) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        match *self {
            Self::Days(n) => format!("{sign}P{}D", n.abs()),
            Self::Seconds(n) => format!("{sign}PT{}S", n.abs()),
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::Seconds(0)
    }
}

impl Neg for Duration {
    type Output = Self;

    fn neg(self) -> Self {
        match self {
            Self::Seconds(n) => Self::Seconds(-n),
            Self::Days(n) => Self::Days(-n),
        }
    }
}

impl Add for Duration {
    type Output = Self;

    /// Same-unit addition stays in the unit; mixed units coerce to seconds.
    fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Seconds(a), Self::Seconds(b)) => Self::Seconds(a + b),
            (Self::Days(a), Self::Days(b)) => Self::Days(a + b),
            _ => Self::Seconds(self.as_seconds() + rhs.as_seconds()),
        }
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul<i64> for Duration {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self {
        match self {
            Self::Seconds(n) => Self::Seconds(n * rhs),
            Self::Days(n) => Self::Days(n * rhs),
        }
    }
}

impl Div<i64> for Duration {
    type Output = Self;

    fn div(self, rhs: i64) -> Self {
        match self {
            Self::Seconds(n) => Self::Seconds(n / rhs),
            Self::Days(n) => Self::Days(n / rhs),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ical_string())
    }
}
