//! Synthesizing VTIMEZONE components from system timezone data.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{OffsetComponents, OffsetName, Tz};

use crate::ical::core::{Component, ComponentKind, ContentLine};

/// Transition scan stops at the end of this year.
const HORIZON_YEAR: i32 = 2037;
/// Probe stride while scanning for offset changes.
const PROBE_DAYS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ZoneState {
    total_offset: i32,
    dst: bool,
    abbrev: String,
}

fn state_at(tz: Tz, utc: DateTime<Utc>) -> ZoneState {
    let offset = tz.offset_from_utc_datetime(&utc.naive_utc());
    #[expect(clippy::cast_possible_truncation, reason = "zone offsets fit in i32")]
    let total_offset = (offset.base_utc_offset() + offset.dst_offset()).num_seconds() as i32;
    ZoneState {
        total_offset,
        dst: !offset.dst_offset().is_zero(),
        abbrev: offset.abbreviation().unwrap_or_default().to_string(),
    }
}

/// One observed offset change.
#[derive(Debug, Clone)]
struct Transition {
    utc: DateTime<Utc>,
    from: ZoneState,
    to: ZoneState,
}

/// Scans the zone for offset changes from `earliest` to the horizon.
fn scan_transitions(tz: Tz, earliest: NaiveDate) -> (ZoneState, Vec<Transition>) {
    let start = Utc.from_utc_datetime(&earliest.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end = Utc.from_utc_datetime(
        &NaiveDate::from_ymd_opt(HORIZON_YEAR, 12, 31)
            .unwrap_or(earliest)
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default(),
    );

    let initial = state_at(tz, start);
    let mut transitions = Vec::new();
    let mut prev_probe = start;
    let mut prev_state = initial.clone();

    let mut probe = start + ChronoDuration::days(PROBE_DAYS);
    while prev_probe < end {
        let state = state_at(tz, probe);
        if state != prev_state {
            let instant = bisect_transition(tz, prev_probe, probe, &prev_state);
            transitions.push(Transition {
                utc: instant,
                from: prev_state,
                to: state.clone(),
            });
            prev_state = state;
        }
        prev_probe = probe;
        probe += ChronoDuration::days(PROBE_DAYS);
    }

    (initial, transitions)
}

/// Narrows an offset change between two probes to second precision.
fn bisect_transition(
    tz: Tz,
    mut before: DateTime<Utc>,
    mut after: DateTime<Utc>,
    before_state: &ZoneState,
) -> DateTime<Utc> {
    while (after - before).num_seconds() > 1 {
        let mid = before + (after - before) / 2;
        if state_at(tz, mid) == *before_state {
            before = mid;
        } else {
            after = mid;
        }
    }
    after
}

fn format_naive(naive: NaiveDateTime) -> String {
    naive.format("%Y%m%dT%H%M%S").to_string()
}

fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.abs();
    format!("{sign}{:02}{:02}", abs / 3600, (abs % 3600) / 60)
}

/// Builds a VTIMEZONE component for a system zone, listing transitions
/// from `earliest` forward.
///
/// Transitions are grouped into STANDARD/DAYLIGHT sub-components by their
/// offset pair; each group carries its onsets as DTSTART plus an RDATE
/// list, in the pre-transition local frame.
#[must_use]
pub fn vtimezone_component(tz: Tz, earliest: NaiveDate) -> Component {
    let mut component = Component::new(ComponentKind::Timezone);
    component.add_property(ContentLine::new("TZID", tz.name()));

    let (initial, transitions) = scan_transitions(tz, earliest);

    if transitions.is_empty() {
        // Fixed zone: a single standard phase.
        let mut standard = Component::new(ComponentKind::Standard);
        let local = earliest
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            + ChronoDuration::seconds(i64::from(initial.total_offset));
        standard.add_property(ContentLine::new("DTSTART", format_naive(local)));
        standard.add_property(ContentLine::new(
            "TZOFFSETFROM",
            format_offset(initial.total_offset),
        ));
        standard.add_property(ContentLine::new(
            "TZOFFSETTO",
            format_offset(initial.total_offset),
        ));
        if !initial.abbrev.is_empty() {
            standard.add_property(ContentLine::new("TZNAME", &initial.abbrev));
        }
        component.add_child(standard);
        return component;
    }

    // Group transitions by (from-offset, to-offset, dst, name).
    let mut groups: Vec<((i32, i32, bool, String), Vec<NaiveDateTime>)> = Vec::new();
    for transition in &transitions {
        let key = (
            transition.from.total_offset,
            transition.to.total_offset,
            transition.to.dst,
            transition.to.abbrev.clone(),
        );
        // Onset in the pre-transition local frame.
        let local = transition.utc.naive_utc()
            + ChronoDuration::seconds(i64::from(transition.from.total_offset));
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, onsets)) => onsets.push(local),
            None => groups.push((key, vec![local])),
        }
    }

    for ((offset_from, offset_to, dst, abbrev), onsets) in groups {
        let kind = if dst {
            ComponentKind::Daylight
        } else {
            ComponentKind::Standard
        };
        let mut phase = Component::new(kind);
        phase.add_property(ContentLine::new("DTSTART", format_naive(onsets[0])));
        phase.add_property(ContentLine::new("TZOFFSETFROM", format_offset(offset_from)));
        phase.add_property(ContentLine::new("TZOFFSETTO", format_offset(offset_to)));
        if !abbrev.is_empty() {
            phase.add_property(ContentLine::new("TZNAME", &abbrev));
        }
        if onsets.len() > 1 {
            let rdates: Vec<String> = onsets.iter().map(|o| format_naive(*o)).collect();
            phase.add_property(ContentLine::new("RDATE", rdates.join(",")));
        }
        component.add_child(phase);
    }

    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tz::vtimezone::VTimeZone;

    #[test]
    fn prague_roundtrip_offsets() {
        let earliest = NaiveDate::from_ymd_opt(1979, 2, 1).unwrap();
        let component = vtimezone_component(chrono_tz::Europe::Prague, earliest);
        assert_eq!(component.property_value("TZID"), Some("Europe/Prague"));

        let parsed = VTimeZone::parse(&component).unwrap();
        // 1985-07-01 12:00 local is CEST, UTC+2.
        let july_utc =
            NaiveDateTime::parse_from_str("1985-07-01T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(parsed.offset_at(july_utc), 7200);
        assert!(parsed.is_dst_at(july_utc));

        let jan_utc =
            NaiveDateTime::parse_from_str("1985-01-15T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert_eq!(parsed.offset_at(jan_utc), 3600);
        assert!(!parsed.is_dst_at(jan_utc));
    }

    #[test]
    fn utc_emits_single_standard_phase() {
        let earliest = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let component = vtimezone_component(chrono_tz::UTC, earliest);
        assert_eq!(component.children.len(), 1);
        assert_eq!(component.children[0].kind, ComponentKind::Standard);
        assert_eq!(component.children[0].property_value("TZOFFSETTO"), Some("+0000"));
    }

    #[test]
    fn transition_scan_finds_dst_changes() {
        // Some tz databases report a spurious transition around
        // 1978-12-31; scanning from 1979 keeps clear of it, and the group
        // count stays small either way.
        let earliest = NaiveDate::from_ymd_opt(1979, 2, 1).unwrap();
        let (_, transitions) = scan_transitions(chrono_tz::Europe::Prague, earliest);
        // Two transitions a year through 2037.
        assert!(transitions.len() > 100);
        assert!(transitions.len() < 130);
    }
}
