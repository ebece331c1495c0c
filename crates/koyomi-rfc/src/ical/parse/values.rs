//! Value type parsers (RFC 5545 §3.3) producing koyomi-core model types.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use koyomi_core::datetime::{CalDateTime, TimeSpec};
use koyomi_core::duration::Duration;
use koyomi_core::recurrence::{Frequency, RecurrenceRule, WeekdayNum};

use crate::error::{ParseError, ParseErrorKind, ParseResult};

/// Parses a DATE value, `YYYYMMDD`.
///
/// ## Errors
/// Returns an error unless the string is a valid 8-digit date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }
    let year: i32 = s[0..4]
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    let month: u32 = s[4..6]
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    let day: u32 = s[6..8]
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDate, line, col))
}

/// Parses a TIME value, `HHMMSS[Z]`. Returns the time and the UTC marker.
///
/// ## Errors
/// Returns an error unless the string is a valid 6-digit time.
pub fn parse_time(s: &str, line: usize, col: usize) -> ParseResult<(NaiveTime, bool)> {
    let (time_str, is_utc) = match s.strip_suffix('Z') {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };
    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, col));
    }
    let hour: u32 = time_str[0..2]
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;
    let minute: u32 = time_str[2..4]
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;
    let second: u32 = time_str[4..6]
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;
    // Leap seconds fold to :59.
    let second = second.min(59);
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;
    Ok((time, is_utc))
}

/// Parses a DATE-TIME value, `YYYYMMDD"T"HHMMSS[Z]`. Returns the naive
/// wall-clock value and the UTC marker; TZID handling happens at the
/// property level.
///
/// ## Errors
/// Returns an error unless the string is a valid date-time.
pub fn parse_datetime(s: &str, line: usize, col: usize) -> ParseResult<(NaiveDateTime, bool)> {
    let t_pos = s
        .find('T')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime, line, col))?;
    let date = parse_date(&s[..t_pos], line, col)?;
    let (time, is_utc) = parse_time(&s[t_pos + 1..], line, col + t_pos + 1)?;
    Ok((date.and_time(time), is_utc))
}

/// Resolves a parsed date-time into a [`CalDateTime`] given the TZID
/// resolution outcome for the enclosing property.
#[must_use]
pub fn datetime_with_spec(naive: NaiveDateTime, is_utc: bool, tz: Option<TimeSpec>) -> CalDateTime {
    if is_utc {
        CalDateTime::new(naive, TimeSpec::Utc)
    } else {
        CalDateTime::new(naive, tz.unwrap_or(TimeSpec::Floating))
    }
}

/// Parses a UTC-OFFSET value, `(+|-)HHMM[SS]`, to offset seconds.
///
/// ## Errors
/// Returns an error unless the string is a valid UTC offset.
pub fn parse_utc_offset(s: &str, line: usize, col: usize) -> ParseResult<i32> {
    if s.len() < 5 {
        return Err(ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col));
    }
    let sign = match s.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col)),
    };
    let hours: i32 = s[1..3]
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col))?;
    let minutes: i32 = s[3..5]
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col))?;
    let seconds: i32 = if s.len() >= 7 {
        s[5..7]
            .parse()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col))?
    } else {
        0
    };
    Ok(sign * (hours * 3600 + minutes * 60 + seconds))
}

/// Parses a DURATION value, `[+|-]P[nW]` or `[+|-]P[nD][T[nH][nM][nS]]`.
///
/// Durations made of whole days or weeks become day-durations; anything
/// with a time part becomes a seconds-duration.
///
/// ## Errors
/// Returns an error unless the string is a valid duration.
pub fn parse_duration(s: &str, line: usize, col: usize) -> ParseResult<Duration> {
    let err = || ParseError::new(ParseErrorKind::InvalidDuration, line, col);

    let (rest, negative) = match s.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (s.strip_prefix('+').unwrap_or(s), false),
    };
    let rest = rest.strip_prefix('P').ok_or_else(err)?;

    let mut days: i64 = 0;
    let mut seconds: i64 = 0;
    let mut has_time_part = false;
    let mut in_time = false;
    let mut num = String::new();

    for c in rest.chars() {
        if c.is_ascii_digit() {
            num.push(c);
            continue;
        }
        match c {
            'T' => {
                if !num.is_empty() {
                    return Err(err());
                }
                in_time = true;
            }
            'W' if !in_time => {
                days += 7 * num.parse::<i64>().map_err(|_| err())?;
                num.clear();
            }
            'D' if !in_time => {
                days += num.parse::<i64>().map_err(|_| err())?;
                num.clear();
            }
            'H' if in_time => {
                seconds += 3600 * num.parse::<i64>().map_err(|_| err())?;
                has_time_part = true;
                num.clear();
            }
            'M' if in_time => {
                seconds += 60 * num.parse::<i64>().map_err(|_| err())?;
                has_time_part = true;
                num.clear();
            }
            'S' if in_time => {
                seconds += num.parse::<i64>().map_err(|_| err())?;
                has_time_part = true;
                num.clear();
            }
            _ => return Err(err()),
        }
    }
    if !num.is_empty() {
        return Err(err());
    }

    let sign = if negative { -1 } else { 1 };
    if has_time_part || seconds != 0 {
        Ok(Duration::Seconds(sign * (days * 86_400 + seconds)))
    } else {
        Ok(Duration::Days(sign * days))
    }
}

/// Parses one half of a PERIOD value after the start: either an explicit
/// end date-time or a duration.
pub enum PeriodEnd {
    End(NaiveDateTime, bool),
    Duration(Duration),
}

/// Parses a PERIOD value, `start "/" (end | duration)`.
///
/// ## Errors
/// Returns an error unless both halves parse.
pub fn parse_period(
    s: &str,
    line: usize,
    col: usize,
) -> ParseResult<((NaiveDateTime, bool), PeriodEnd)> {
    let slash = s
        .find('/')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidPeriod, line, col))?;
    let start = parse_datetime(&s[..slash], line, col)?;
    let end_str = &s[slash + 1..];
    let end = if end_str.starts_with(['P', '+', '-']) {
        PeriodEnd::Duration(parse_duration(end_str, line, col + slash + 1)?)
    } else {
        let (naive, is_utc) = parse_datetime(end_str, line, col + slash + 1)?;
        PeriodEnd::End(naive, is_utc)
    };
    Ok((start, end))
}

/// Parses an INTEGER value.
///
/// ## Errors
/// Returns an error unless the string is a valid integer.
pub fn parse_integer(s: &str, line: usize, col: usize) -> ParseResult<i32> {
    s.parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, line, col))
}

/// Parses a FLOAT value.
///
/// ## Errors
/// Returns an error unless the string is a valid float.
pub fn parse_float(s: &str, line: usize, col: usize) -> ParseResult<f64> {
    s.parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidFloat, line, col))
}

/// Parses a BOOLEAN value.
///
/// ## Errors
/// Returns an error unless the string is TRUE or FALSE.
pub fn parse_boolean(s: &str, line: usize, col: usize) -> ParseResult<bool> {
    match s.to_ascii_uppercase().as_str() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(ParseError::new(ParseErrorKind::InvalidBoolean, line, col)),
    }
}

/// Unescapes TEXT values: `\\` `\,` `\;` `\n` `\N`.
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(',') => out.push(','),
            Some(';') => out.push(';'),
            Some('\\') | None => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

/// Parses a weekday code, `MO`..`SU`.
#[must_use]
pub fn parse_weekday(s: &str) -> Option<chrono::Weekday> {
    match s.to_ascii_uppercase().as_str() {
        "MO" => Some(chrono::Weekday::Mon),
        "TU" => Some(chrono::Weekday::Tue),
        "WE" => Some(chrono::Weekday::Wed),
        "TH" => Some(chrono::Weekday::Thu),
        "FR" => Some(chrono::Weekday::Fri),
        "SA" => Some(chrono::Weekday::Sat),
        "SU" => Some(chrono::Weekday::Sun),
        _ => None,
    }
}

/// Parses a RECUR value (RFC 5545 §3.3.10) into a rule pinned at `start`.
///
/// ## Errors
/// Returns an error when FREQ is missing or a rule part is malformed.
pub fn parse_rrule(s: &str, start: CalDateTime, line: usize, col: usize) -> ParseResult<RecurrenceRule> {
    let mut freq = None;
    let mut parts = Vec::new();
    for part in s.split(';') {
        if part.is_empty() {
            continue;
        }
        let eq = part
            .find('=')
            .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?;
        let key = part[..eq].to_ascii_uppercase();
        let value = &part[eq + 1..];
        if key == "FREQ" {
            freq = Some(
                Frequency::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, col))?,
            );
        } else {
            parts.push((key, value.to_string()));
        }
    }
    let freq = freq.ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, col))?;

    let mut rule = RecurrenceRule::new(freq, start);
    for (key, value) in parts {
        apply_rrule_part(&mut rule, &key, &value, start, line, col)?;
    }
    Ok(rule)
}

fn apply_rrule_part(
    rule: &mut RecurrenceRule,
    key: &str,
    value: &str,
    start: CalDateTime,
    line: usize,
    col: usize,
) -> ParseResult<()> {
    let err = |kind| ParseError::new(kind, line, col);
    match key {
        "INTERVAL" => {
            let interval: u16 = value.parse().map_err(|_| err(ParseErrorKind::InvalidRRule))?;
            rule.set_interval(interval);
        }
        "COUNT" => {
            if rule.until().is_some() {
                return Err(err(ParseErrorKind::UntilCountConflict));
            }
            let count: i32 = value.parse().map_err(|_| err(ParseErrorKind::InvalidRRule))?;
            rule.set_duration(count.max(0));
        }
        "UNTIL" => {
            if rule.duration() > 0 {
                return Err(err(ParseErrorKind::UntilCountConflict));
            }
            let until = if value.contains('T') {
                let (naive, is_utc) = parse_datetime(value, line, col)?;
                datetime_with_spec(naive, is_utc, Some(start.spec()))
            } else {
                let date = parse_date(value, line, col)?;
                // Date-only UNTIL bounds inclusively to the end of day.
                CalDateTime::new(
                    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()),
                    start.spec(),
                )
            };
            rule.set_until(until);
        }
        "WKST" => {
            let weekday =
                parse_weekday(value).ok_or_else(|| err(ParseErrorKind::InvalidWeekday))?;
            rule.set_week_start(weekday);
        }
        "BYSECOND" => rule.set_by_second(parse_num_list(value, line, col)?),
        "BYMINUTE" => rule.set_by_minute(parse_num_list(value, line, col)?),
        "BYHOUR" => rule.set_by_hour(parse_num_list(value, line, col)?),
        "BYDAY" => {
            let days = value
                .split(',')
                .map(|v| parse_weekday_num(v.trim(), line, col))
                .collect::<ParseResult<_>>()?;
            rule.set_by_day(days);
        }
        "BYMONTHDAY" => rule.set_by_month_day(parse_num_list(value, line, col)?),
        "BYYEARDAY" => rule.set_by_year_day(parse_num_list(value, line, col)?),
        "BYWEEKNO" => rule.set_by_week_no(parse_num_list(value, line, col)?),
        "BYMONTH" => rule.set_by_month(parse_num_list(value, line, col)?),
        "BYSETPOS" => rule.set_by_set_pos(parse_num_list(value, line, col)?),
        _ => {
            // Unknown rule parts are ignored, like unknown properties.
            tracing::debug!(key, "ignoring unknown RRULE part");
        }
    }
    Ok(())
}

fn parse_num_list<T: std::str::FromStr>(s: &str, line: usize, col: usize) -> ParseResult<Vec<T>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .trim_start_matches('+')
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))
        })
        .collect()
}

/// Parses a BYDAY entry with optional ordinal, e.g. `MO`, `1MO`, `-1FR`.
fn parse_weekday_num(s: &str, line: usize, col: usize) -> ParseResult<WeekdayNum> {
    if s.len() < 2 {
        return Err(ParseError::new(ParseErrorKind::InvalidWeekday, line, col));
    }
    let (ordinal_str, weekday_str) = s.split_at(s.len() - 2);
    let weekday = parse_weekday(weekday_str)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?;
    if ordinal_str.is_empty() {
        return Ok(WeekdayNum::every(weekday));
    }
    let ordinal: i16 = ordinal_str
        .trim_start_matches('+')
        .parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?;
    Ok(WeekdayNum::nth(ordinal, weekday))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> CalDateTime {
        CalDateTime::utc(2026, 1, 23, 9, 0, 0).unwrap()
    }

    #[test]
    fn date_basic() {
        let d = parse_date("20260123", 1, 1).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2026, 1, 23).unwrap());
        assert!(parse_date("2026012", 1, 1).is_err());
        assert!(parse_date("20261301", 1, 1).is_err());
    }

    #[test]
    fn time_utc_marker() {
        assert!(parse_time("120000Z", 1, 1).unwrap().1);
        assert!(!parse_time("133000", 1, 1).unwrap().1);
        assert!(parse_time("250000", 1, 1).is_err());
    }

    #[test]
    fn datetime_basic() {
        let (naive, is_utc) = parse_datetime("20130310T100000Z", 1, 1).unwrap();
        assert_eq!(naive.to_string(), "2013-03-10 10:00:00");
        assert!(is_utc);
    }

    #[test]
    fn utc_offset_values() {
        assert_eq!(parse_utc_offset("+0530", 1, 1).unwrap(), 5 * 3600 + 30 * 60);
        assert_eq!(parse_utc_offset("-0800", 1, 1).unwrap(), -8 * 3600);
        assert_eq!(parse_utc_offset("+013007", 1, 1).unwrap(), 5407);
        assert!(parse_utc_offset("0530", 1, 1).is_err());
    }

    #[test]
    fn duration_day_form_stays_daily() {
        assert_eq!(parse_duration("P7D", 1, 1).unwrap(), Duration::Days(7));
        assert_eq!(parse_duration("P2W", 1, 1).unwrap(), Duration::Days(14));
        assert_eq!(parse_duration("-P1D", 1, 1).unwrap(), Duration::Days(-1));
    }

    #[test]
    fn duration_time_form_is_seconds() {
        assert_eq!(
            parse_duration("P1DT2H30M", 1, 1).unwrap(),
            Duration::Seconds(86_400 + 2 * 3600 + 30 * 60)
        );
        assert_eq!(parse_duration("-PT15M", 1, 1).unwrap(), Duration::Seconds(-900));
        assert_eq!(parse_duration("PT0S", 1, 1).unwrap(), Duration::Seconds(0));
    }

    #[test]
    fn duration_garbage_rejected() {
        assert!(parse_duration("P1X", 1, 1).is_err());
        assert!(parse_duration("1D", 1, 1).is_err());
        assert!(parse_duration("PT5", 1, 1).is_err());
    }

    #[test]
    fn period_both_forms() {
        let ((start, _), end) = parse_period("20260123T090000Z/20260123T170000Z", 1, 1).unwrap();
        assert_eq!(start.to_string(), "2026-01-23 09:00:00");
        assert!(matches!(end, PeriodEnd::End(_, true)));

        let (_, end) = parse_period("20260123T090000Z/PT8H", 1, 1).unwrap();
        match end {
            PeriodEnd::Duration(d) => assert_eq!(d, Duration::Seconds(8 * 3600)),
            PeriodEnd::End(..) => panic!("expected duration"),
        }
    }

    #[test]
    fn text_unescaping() {
        assert_eq!(unescape_text("a\\, b\\; c\\nd\\\\e"), "a, b; c\nd\\e");
    }

    #[test]
    fn rrule_count() {
        let rule = parse_rrule("FREQ=DAILY;COUNT=10", start(), 1, 1).unwrap();
        assert_eq!(rule.frequency(), Frequency::Daily);
        assert_eq!(rule.duration(), 10);
    }

    #[test]
    fn rrule_until_date_only() {
        let rule = parse_rrule("FREQ=DAILY;UNTIL=20260131", start(), 1, 1).unwrap();
        let until = rule.until().unwrap();
        assert_eq!(until.date(), NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
    }

    #[test]
    fn rrule_byday_ordinals() {
        let rule = parse_rrule("FREQ=MONTHLY;BYDAY=-1FR,+2MO", start(), 1, 1).unwrap();
        assert_eq!(rule.by_day()[0].ordinal, Some(-1));
        assert_eq!(rule.by_day()[1].ordinal, Some(2));
    }

    #[test]
    fn rrule_until_count_conflict() {
        assert!(parse_rrule("FREQ=DAILY;COUNT=10;UNTIL=20260131", start(), 1, 1).is_err());
    }

    #[test]
    fn rrule_missing_freq() {
        assert!(parse_rrule("COUNT=10", start(), 1, 1).is_err());
    }
}
