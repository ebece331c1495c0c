//! Parsing VTIMEZONE components into an offset lookup table.

use chrono::{Duration as ChronoDuration, NaiveDateTime};

use koyomi_core::datetime::{CalDateTime, TimeSpec};

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{Component, ComponentKind};
use crate::ical::parse::values;

/// Horizon for expanding unbounded phase rules.
const HORIZON_YEAR: i32 = 2037;

/// One UTC instant at which the zone's offset changes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Transition {
    utc: NaiveDateTime,
    offset: i32,
    dst: bool,
    abbrev: String,
}

/// A timezone defined by an embedded VTIMEZONE component.
///
/// The phase sub-components are expanded into a sorted transition table
/// at parse time; lookups are binary searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VTimeZone {
    tzid: String,
    /// Offset in effect before the first transition.
    initial_offset: i32,
    transitions: Vec<Transition>,
}

impl VTimeZone {
    /// Parses a VTIMEZONE component.
    ///
    /// ## Errors
    /// Returns an error when the TZID is missing; malformed phases are
    /// dropped with a diagnostic.
    pub fn parse(component: &Component) -> ParseResult<Self> {
        let tzid = component
            .property_value("TZID")
            .ok_or_else(|| {
                ParseError::new(ParseErrorKind::InvalidValue, 1, 1).with_context("VTIMEZONE without TZID")
            })?
            .to_string();

        let mut transitions = Vec::new();
        let mut initial_offset = None;

        for child in &component.children {
            let dst = match child.kind {
                ComponentKind::Standard => false,
                ComponentKind::Daylight => true,
                _ => {
                    tracing::debug!(name = %child.name, "skipping unknown VTIMEZONE child");
                    continue;
                }
            };
            match expand_phase(child, dst) {
                Ok((offset_from, phase_transitions)) => {
                    initial_offset.get_or_insert(offset_from);
                    transitions.extend(phase_transitions);
                }
                Err(err) => {
                    tracing::warn!(tzid = %tzid, error = %err, "dropping malformed VTIMEZONE phase");
                }
            }
        }

        transitions.sort_by(|a, b| a.utc.cmp(&b.utc));
        transitions.dedup_by(|a, b| a.utc == b.utc);

        Ok(Self {
            tzid,
            initial_offset: initial_offset.unwrap_or(0),
            transitions,
        })
    }

    #[must_use]
    pub fn tzid(&self) -> &str {
        &self.tzid
    }

    fn transition_at(&self, utc: NaiveDateTime) -> Option<&Transition> {
        match self.transitions.partition_point(|t| t.utc <= utc) {
            0 => None,
            n => self.transitions.get(n - 1),
        }
    }

    /// The UTC offset in seconds at a UTC instant.
    #[must_use]
    pub fn offset_at(&self, utc: NaiveDateTime) -> i32 {
        self.transition_at(utc).map_or(self.initial_offset, |t| t.offset)
    }

    /// Whether daylight time is in effect at a UTC instant.
    #[must_use]
    pub fn is_dst_at(&self, utc: NaiveDateTime) -> bool {
        self.transition_at(utc).is_some_and(|t| t.dst)
    }

    /// The zone abbreviation at a UTC instant, if the phase declared one.
    #[must_use]
    pub fn abbreviation_at(&self, utc: NaiveDateTime) -> Option<&str> {
        self.transition_at(utc)
            .map(|t| t.abbrev.as_str())
            .filter(|a| !a.is_empty())
    }

    /// Converts a wall-clock time in this zone to naive UTC.
    #[must_use]
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        // First guess with the local time read as UTC, then refine once.
        let guess = self.offset_at(local);
        let utc = local - ChronoDuration::seconds(i64::from(guess));
        let offset = self.offset_at(utc);
        local - ChronoDuration::seconds(i64::from(offset))
    }
}

/// Expands one STANDARD/DAYLIGHT phase into transitions. Returns the
/// phase's TZOFFSETFROM and the transition list.
fn expand_phase(phase: &Component, dst: bool) -> ParseResult<(i32, Vec<Transition>)> {
    let dtstart = phase.property("DTSTART").ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidValue, 1, 1).with_context("phase without DTSTART")
    })?;
    let (start_local, _) = values::parse_datetime(&dtstart.value, 1, 1)?;

    let offset_from = phase
        .property_value("TZOFFSETFROM")
        .map(|v| values::parse_utc_offset(v, 1, 1))
        .transpose()?
        .unwrap_or(0);
    let offset_to = phase
        .property_value("TZOFFSETTO")
        .map(|v| values::parse_utc_offset(v, 1, 1))
        .transpose()?
        .unwrap_or(offset_from);
    let abbrev = phase.property_value("TZNAME").unwrap_or("").to_string();

    // Onsets are wall-clock times in the pre-transition (TZOFFSETFROM)
    // frame.
    let mut onsets = vec![start_local];
    for rdate in phase.properties_named("RDATE") {
        for part in rdate.value.split(',') {
            match values::parse_datetime(part.trim(), 1, 1) {
                Ok((naive, _)) => onsets.push(naive),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping malformed RDATE in VTIMEZONE");
                }
            }
        }
    }
    if let Some(rrule) = phase.property("RRULE") {
        let start = CalDateTime::new(start_local, TimeSpec::Floating);
        let rule = values::parse_rrule(&rrule.value, start, 1, 1)?;
        let horizon = CalDateTime::floating(HORIZON_YEAR, 12, 31, 23, 59, 59)
            .unwrap_or(start);
        for occurrence in rule.times_in_interval(&start, &horizon) {
            onsets.push(occurrence.naive());
        }
    }

    onsets.sort_unstable();
    onsets.dedup();

    let transitions = onsets
        .into_iter()
        .map(|local| Transition {
            utc: local - ChronoDuration::seconds(i64::from(offset_from)),
            offset: offset_to,
            dst,
            abbrev: abbrev.clone(),
        })
        .collect();

    Ok((offset_from, transitions))
}
