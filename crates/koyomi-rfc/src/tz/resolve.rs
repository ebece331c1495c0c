//! TZID resolution against the system timezone database.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and for IANA alias
//! canonicalization.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{Duration as ChronoDuration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{OffsetComponents, TZ_VARIANTS, Tz};
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;

use koyomi_core::datetime::TimeSpec;

use super::vtimezone::VTimeZone;

/// Resolves TZIDs to concrete time specs.
///
/// Embedded VTIMEZONE definitions are registered up front; resolution
/// then works through the three-step policy: system database lookup,
/// offset/DST matching of the VTIMEZONE against the system database, and
/// a fixed-offset pseudo-zone as last resort. Successful resolutions are
/// cached.
#[derive(Debug, Default)]
pub struct TimeZoneResolver {
    cache: HashMap<String, TimeSpec>,
    vtimezones: HashMap<String, VTimeZone>,
}

impl TimeZoneResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a VTIMEZONE parsed from the same document.
    pub fn register_vtimezone(&mut self, vtimezone: VTimeZone) {
        self.vtimezones
            .insert(vtimezone.tzid().to_string(), vtimezone);
    }

    #[must_use]
    pub fn vtimezone(&self, tzid: &str) -> Option<&VTimeZone> {
        self.vtimezones.get(tzid)
    }

    #[must_use]
    pub fn has_vtimezone(&self, tzid: &str) -> bool {
        self.vtimezones.contains_key(tzid)
    }

    /// Resolves a TZID to a time spec, anchored at `as_of` (a naive UTC
    /// instant near the timestamps being interpreted).
    pub fn resolve(&mut self, tzid: &str, as_of: NaiveDateTime) -> TimeSpec {
        if let Some(spec) = self.cache.get(tzid) {
            return *spec;
        }

        let spec = self.resolve_uncached(tzid, as_of);
        self.cache.insert(tzid.to_string(), spec);
        spec
    }

    fn resolve_uncached(&self, tzid: &str, as_of: NaiveDateTime) -> TimeSpec {
        // Step 1: the system database knows the (normalized) name.
        let normalized = normalize_tzid(tzid);
        if let Ok(tz) = Tz::from_str(&normalized) {
            return TimeSpec::Zoned(tz);
        }

        // Step 2: match the embedded definition against system zones by
        // offset and DST state.
        if let Some(vtimezone) = self.vtimezones.get(tzid) {
            let offset = vtimezone.offset_at(as_of);
            let dst = vtimezone.is_dst_at(as_of);
            if let Some(tz) = find_zone_by_offset(offset, dst, as_of) {
                tracing::debug!(tzid, matched = tz.name(), "matched VTIMEZONE to system zone");
                return TimeSpec::Zoned(tz);
            }
            // Step 3: fixed-offset pseudo-zone.
            if let Some(fixed) = FixedOffset::east_opt(offset) {
                return TimeSpec::Fixed(fixed);
            }
        }

        tracing::warn!(tzid, "unresolvable TZID, treating times as floating");
        TimeSpec::Floating
    }
}

/// Finds a system zone with the given total offset and DST state at
/// `as_of`, preferring one that still matches half a year later (which
/// weeds out accidental matches across hemispheres).
fn find_zone_by_offset(offset: i32, dst: bool, as_of: NaiveDateTime) -> Option<Tz> {
    let utc = Utc.from_utc_datetime(&as_of);
    let later = utc + ChronoDuration::days(182);
    let mut fallback = None;
    for tz in TZ_VARIANTS {
        let tz_offset = tz.offset_from_utc_datetime(&utc.naive_utc());
        let total = (tz_offset.base_utc_offset() + tz_offset.dst_offset()).num_seconds();
        let tz_dst = !tz_offset.dst_offset().is_zero();
        if total == i64::from(offset) && tz_dst == dst {
            if fallback.is_none() {
                fallback = Some(tz);
            }
            let later_offset = tz.offset_from_utc_datetime(&later.naive_utc());
            if (later_offset.base_utc_offset() + later_offset.dst_offset()).num_seconds()
                != i64::from(offset)
            {
                // The zone changes offsets over the year, like a real
                // DST-observing zone; take it.
                return Some(tz);
            }
        }
    }
    fallback
}

/// Normalizes vendor TZIDs to IANA names: strips legacy prefixes, maps
/// Windows display names and canonicalizes IANA aliases.
#[must_use]
pub fn normalize_tzid(tzid: &str) -> String {
    let stripped = tzid
        .strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .or_else(|| tzid.strip_prefix("/freeassociation.sourceforge.net/"))
        .unwrap_or(tzid);

    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(stripped, None) {
        let iana_parser = IanaParserExtended::new();
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    let iana_parser = IanaParserExtended::new();
    let parsed = iana_parser.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ical::parse::parse;

    fn july_1985() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("1985-07-01T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn direct_iana_lookup() {
        let mut resolver = TimeZoneResolver::new();
        assert_eq!(
            resolver.resolve("Europe/Prague", july_1985()),
            TimeSpec::Zoned(chrono_tz::Europe::Prague)
        );
    }

    #[test]
    fn windows_names_map_to_iana() {
        assert_eq!(normalize_tzid("Eastern Standard Time"), "America/New_York");
        assert_eq!(normalize_tzid("W. Europe Standard Time"), "Europe/Berlin");
    }

    #[test]
    fn mozilla_prefix_stripped() {
        assert_eq!(normalize_tzid("/mozilla.org/America/New_York"), "America/New_York");
    }

    #[test]
    fn iana_aliases_canonicalized() {
        assert_eq!(normalize_tzid("Europe/Kiev"), "Europe/Kyiv");
        assert_eq!(normalize_tzid("US/Eastern"), "America/New_York");
    }

    #[test]
    fn custom_vtimezone_matches_by_offset() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Custom/Central-Europe\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19701025T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU\r\n\
END:STANDARD\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:19700329T020000\r\n\
TZOFFSETFROM:+0100\r\n\
TZOFFSETTO:+0200\r\n\
RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU\r\n\
END:DAYLIGHT\r\n\
END:VTIMEZONE\r\n\
END:VCALENDAR\r\n";
        let root = parse(input).unwrap();
        let vtz = VTimeZone::parse(root.timezones()[0]).unwrap();
        let mut resolver = TimeZoneResolver::new();
        resolver.register_vtimezone(vtz);

        let spec = resolver.resolve("Custom/Central-Europe", july_1985());
        match spec {
            TimeSpec::Zoned(tz) => {
                let utc = Utc.from_utc_datetime(&july_1985());
                let offset = tz.offset_from_utc_datetime(&utc.naive_utc());
                assert_eq!(
                    (offset.base_utc_offset() + offset.dst_offset()).num_seconds(),
                    7200
                );
            }
            other => panic!("expected a zoned spec, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tzid_without_vtimezone_floats() {
        let mut resolver = TimeZoneResolver::new();
        assert_eq!(resolver.resolve("Not/A-Zone", july_1985()), TimeSpec::Floating);
    }

    #[test]
    fn resolution_is_cached() {
        let mut resolver = TimeZoneResolver::new();
        resolver.resolve("Europe/Prague", july_1985());
        assert!(resolver.cache.contains_key("Europe/Prague"));
    }
}
