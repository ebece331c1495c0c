//! Attendees of calendar incidences (RFC 5545 §3.8.4.1).

use serde::{Deserialize, Serialize};

use crate::customproperties::CustomProperties;
use crate::person::Person;

/// The role of an attendee in a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    Chair,
    #[default]
    Required,
    Optional,
    NonParticipant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chair => "CHAIR",
            Self::Required => "REQ-PARTICIPANT",
            Self::Optional => "OPT-PARTICIPANT",
            Self::NonParticipant => "NON-PARTICIPANT",
        }
    }

    /// Parses the RFC 5545 ROLE parameter value (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CHAIR" => Some(Self::Chair),
            "REQ-PARTICIPANT" => Some(Self::Required),
            "OPT-PARTICIPANT" => Some(Self::Optional),
            "NON-PARTICIPANT" => Some(Self::NonParticipant),
            _ => None,
        }
    }
}

/// The participation status of an attendee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartStat {
    #[default]
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
    Delegated,
    Completed,
    InProcess,
}

impl PartStat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NeedsAction => "NEEDS-ACTION",
            Self::Accepted => "ACCEPTED",
            Self::Declined => "DECLINED",
            Self::Tentative => "TENTATIVE",
            Self::Delegated => "DELEGATED",
            Self::Completed => "COMPLETED",
            Self::InProcess => "IN-PROCESS",
        }
    }

    /// Parses the RFC 5545 PARTSTAT parameter value (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Some(Self::NeedsAction),
            "ACCEPTED" => Some(Self::Accepted),
            "DECLINED" => Some(Self::Declined),
            "TENTATIVE" => Some(Self::Tentative),
            "DELEGATED" => Some(Self::Delegated),
            "COMPLETED" => Some(Self::Completed),
            "IN-PROCESS" => Some(Self::InProcess),
            _ => None,
        }
    }
}

/// A person invited to an incidence, with scheduling state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attendee {
    person: Person,
    role: Role,
    status: PartStat,
    rsvp: bool,
    uid: String,
    delegate: String,
    delegator: String,
    custom_properties: CustomProperties,
}

impl Attendee {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            person: Person::new(name, email),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_person(person: Person) -> Self {
        Self { person, ..Self::default() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.person.name()
    }

    #[must_use]
    pub fn email(&self) -> &str {
        self.person.email()
    }

    #[must_use]
    pub const fn person(&self) -> &Person {
        &self.person
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    #[must_use]
    pub const fn status(&self) -> PartStat {
        self.status
    }

    pub fn set_status(&mut self, status: PartStat) {
        self.status = status;
    }

    #[must_use]
    pub const fn rsvp(&self) -> bool {
        self.rsvp
    }

    pub fn set_rsvp(&mut self, rsvp: bool) {
        self.rsvp = rsvp;
    }

    /// The attendee's own UID, distinct from any incidence uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn set_uid(&mut self, uid: impl Into<String>) {
        self.uid = uid.into();
    }

    /// Who this attendee delegated their attendance to (DELEGATED-TO).
    #[must_use]
    pub fn delegate(&self) -> &str {
        &self.delegate
    }

    pub fn set_delegate(&mut self, delegate: impl Into<String>) {
        self.delegate = delegate.into();
    }

    /// Who delegated attendance to this attendee (DELEGATED-FROM).
    #[must_use]
    pub fn delegator(&self) -> &str {
        &self.delegator
    }

    pub fn set_delegator(&mut self, delegator: impl Into<String>) {
        self.delegator = delegator.into();
    }

    #[must_use]
    pub const fn custom_properties(&self) -> &CustomProperties {
        &self.custom_properties
    }

    pub fn custom_properties_mut(&mut self) -> &mut CustomProperties {
        &mut self.custom_properties
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        self.person.full_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_roundtrip() {
        for role in [Role::Chair, Role::Required, Role::Optional, Role::NonParticipant] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("req-participant"), Some(Role::Required));
        assert!(Role::parse("SOMETHING").is_none());
    }

    #[test]
    fn partstat_parse_roundtrip() {
        for s in [
            PartStat::NeedsAction,
            PartStat::Accepted,
            PartStat::Declined,
            PartStat::Tentative,
            PartStat::Delegated,
            PartStat::Completed,
            PartStat::InProcess,
        ] {
            assert_eq!(PartStat::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn defaults() {
        let a = Attendee::new("Jane", "jane@example.com");
        assert_eq!(a.role(), Role::Required);
        assert_eq!(a.status(), PartStat::NeedsAction);
        assert!(!a.rsvp());
    }

    #[test]
    fn delegation_links() {
        let mut a = Attendee::new("Jane", "jane@example.com");
        a.set_delegate("mailto:bob@example.com");
        a.set_delegator("mailto:alice@example.com");
        assert_eq!(a.delegate(), "mailto:bob@example.com");
        assert_eq!(a.delegator(), "mailto:alice@example.com");
    }
}
