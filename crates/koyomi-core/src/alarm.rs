//! Alarms attached to incidences (RFC 5545 §3.6.6).
//!
//! Alarms do not hold a reference to their parent incidence. Every
//! computation that needs the parent's schedule takes the parent's start
//! and end timestamps as arguments instead, which keeps ownership a plain
//! tree.

use crate::customproperties::CustomProperties;
use crate::datetime::CalDateTime;
use crate::duration::Duration;
use crate::person::Person;

/// Custom property carrying the location radius in meters.
const LOCATION_RADIUS_PROPERTY: &str = "X-LOCATION-RADIUS";

/// What the alarm does when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AlarmAction {
    /// No action set; such alarms never fire.
    #[default]
    Invalid,
    /// Show a text message.
    Display { text: String },
    /// Play a sound file.
    Audio { file: String },
    /// Run a program.
    Procedure { file: String, args: String },
    /// Send a mail.
    Email {
        subject: String,
        text: String,
        recipients: Vec<Person>,
        attachments: Vec<String>,
    },
}

impl AlarmAction {
    /// The RFC 5545 ACTION property value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "NONE",
            Self::Display { .. } => "DISPLAY",
            Self::Audio { .. } => "AUDIO",
            Self::Procedure { .. } => "PROCEDURE",
            Self::Email { .. } => "EMAIL",
        }
    }
}

/// When the alarm fires, relative to its parent incidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trigger {
    /// No trigger set.
    #[default]
    None,
    /// A fixed point in time.
    Absolute(CalDateTime),
    /// A signed offset from the parent's start.
    OffsetStart(Duration),
    /// A signed offset from the parent's end (due date for to-dos).
    OffsetEnd(Duration),
}

/// An alarm owned by an incidence.
#[derive(Debug, Clone, Default)]
pub struct Alarm {
    action: AlarmAction,
    trigger: Trigger,
    /// Number of repetitions after the initial trigger.
    repeat_count: i32,
    /// Pause between repetitions.
    snooze_time: Duration,
    enabled: bool,
    custom_properties: CustomProperties,
}

impl Alarm {
    #[must_use]
    pub fn new(action: AlarmAction) -> Self {
        Self {
            action,
            enabled: true,
            ..Self::default()
        }
    }

    /// A display alarm firing `offset` relative to the parent's start.
    #[must_use]
    pub fn display(text: impl Into<String>, offset: Duration) -> Self {
        let mut alarm = Self::new(AlarmAction::Display { text: text.into() });
        alarm.trigger = Trigger::OffsetStart(offset);
        alarm
    }

    #[must_use]
    pub const fn action(&self) -> &AlarmAction {
        &self.action
    }

    pub fn set_action(&mut self, action: AlarmAction) {
        self.action = action;
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.action != AlarmAction::Invalid && self.trigger != Trigger::None
    }

    #[must_use]
    pub const fn trigger(&self) -> Trigger {
        self.trigger
    }

    pub fn set_trigger(&mut self, trigger: Trigger) {
        self.trigger = trigger;
    }

    #[must_use]
    pub const fn has_start_offset(&self) -> bool {
        matches!(self.trigger, Trigger::OffsetStart(_))
    }

    #[must_use]
    pub const fn has_end_offset(&self) -> bool {
        matches!(self.trigger, Trigger::OffsetEnd(_))
    }

    /// The offset relative to the parent, if the trigger is relative.
    #[must_use]
    pub const fn offset(&self) -> Option<Duration> {
        match self.trigger {
            Trigger::OffsetStart(d) | Trigger::OffsetEnd(d) => Some(d),
            Trigger::Absolute(_) | Trigger::None => None,
        }
    }

    #[must_use]
    pub const fn repeat_count(&self) -> i32 {
        self.repeat_count
    }

    #[must_use]
    pub const fn snooze_time(&self) -> Duration {
        self.snooze_time
    }

    /// Configures `count` repetitions spaced `snooze` apart.
    pub fn set_repeat(&mut self, count: i32, snooze: Duration) {
        self.repeat_count = count.max(0);
        self.snooze_time = snooze;
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub const fn custom_properties(&self) -> &CustomProperties {
        &self.custom_properties
    }

    pub fn custom_properties_mut(&mut self) -> &mut CustomProperties {
        &mut self.custom_properties
    }

    /// Radius in meters around the parent's location within which the alarm
    /// is relevant.
    #[must_use]
    pub fn location_radius(&self) -> Option<i64> {
        self.custom_properties
            .get(LOCATION_RADIUS_PROPERTY)
            .and_then(|v| v.parse().ok())
    }

    pub fn set_location_radius(&mut self, meters: i64) {
        self.custom_properties
            .set(LOCATION_RADIUS_PROPERTY, meters.to_string());
    }

    /// The first time the alarm fires, given the parent's schedule.
    ///
    /// Returns `None` when the trigger is unset or relative to a schedule
    /// edge the parent does not have.
    #[must_use]
    pub fn time(
        &self,
        parent_start: Option<&CalDateTime>,
        parent_end: Option<&CalDateTime>,
    ) -> Option<CalDateTime> {
        match self.trigger {
            Trigger::None => None,
            Trigger::Absolute(t) => Some(t),
            Trigger::OffsetStart(d) => parent_start.map(|s| d.end(s)),
            Trigger::OffsetEnd(d) => parent_end.map(|e| d.end(e)),
        }
    }

    /// All times the alarm fires (initial trigger plus repetitions).
    #[must_use]
    pub fn times(
        &self,
        parent_start: Option<&CalDateTime>,
        parent_end: Option<&CalDateTime>,
    ) -> Vec<CalDateTime> {
        let Some(first) = self.time(parent_start, parent_end) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(usize::try_from(self.repeat_count).unwrap_or(0) + 1);
        out.push(first);
        if !self.snooze_time.is_zero() {
            let mut t = first;
            for _ in 0..self.repeat_count {
                t = self.snooze_time.end(&t);
                out.push(t);
            }
        }
        out
    }

    /// The last time the alarm fires, counting repetitions.
    #[must_use]
    pub fn end_time(
        &self,
        parent_start: Option<&CalDateTime>,
        parent_end: Option<&CalDateTime>,
    ) -> Option<CalDateTime> {
        self.times(parent_start, parent_end).last().copied()
    }
}

impl PartialEq for Alarm {
    /// Alarms compare by action (which carries the type-specific fields)
    /// and schedule; custom properties stay out of it.
    fn eq(&self, other: &Self) -> bool {
        self.action == other.action
            && self.trigger == other.trigger
            && self.repeat_count == other.repeat_count
            && self.snooze_time == other.snooze_time
            && self.enabled == other.enabled
    }
}

impl Eq for Alarm {}
