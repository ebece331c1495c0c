//! Scheduling (iTIP) value types (RFC 5546).
//!
//! Only the enumerations and the parsed-message carrier live here; the
//! transport is out of scope.

use crate::incidence::Incidence;

/// The iTIP method of a scheduling message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum ITipMethod {
    Publish,
    Request,
    Refresh,
    Cancel,
    Add,
    Reply,
    Counter,
    DeclineCounter,
    #[default]
    NoMethod,
}

impl ITipMethod {
    /// The METHOD property value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "PUBLISH",
            Self::Request => "REQUEST",
            Self::Refresh => "REFRESH",
            Self::Cancel => "CANCEL",
            Self::Add => "ADD",
            Self::Reply => "REPLY",
            Self::Counter => "COUNTER",
            Self::DeclineCounter => "DECLINECOUNTER",
            Self::NoMethod => "NOMETHOD",
        }
    }

    /// Parses a METHOD property value (case-insensitive); anything unknown
    /// maps to [`ITipMethod::NoMethod`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PUBLISH" => Self::Publish,
            "REQUEST" => Self::Request,
            "REFRESH" => Self::Refresh,
            "CANCEL" => Self::Cancel,
            "ADD" => Self::Add,
            "REPLY" => Self::Reply,
            "COUNTER" => Self::Counter,
            "DECLINECOUNTER" => Self::DeclineCounter,
            _ => Self::NoMethod,
        }
    }
}

/// What a received scheduling message means relative to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScheduleMessageStatus {
    PublishNew,
    PublishUpdate,
    Obsolete,
    RequestNew,
    RequestUpdate,
    #[default]
    Unknown,
}

/// A parsed scheduling message: the transported incidence plus method and
/// disposition.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleMessage {
    incidence: Incidence,
    method: ITipMethod,
    status: ScheduleMessageStatus,
}

impl ScheduleMessage {
    #[must_use]
    pub fn new(incidence: Incidence, method: ITipMethod, status: ScheduleMessageStatus) -> Self {
        Self { incidence, method, status }
    }

    #[must_use]
    pub const fn incidence(&self) -> &Incidence {
        &self.incidence
    }

    #[must_use]
    pub fn into_incidence(self) -> Incidence {
        self.incidence
    }

    #[must_use]
    pub const fn method(&self) -> ITipMethod {
        self.method
    }

    #[must_use]
    pub const fn status(&self) -> ScheduleMessageStatus {
        self.status
    }
}
