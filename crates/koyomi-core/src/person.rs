//! People referenced from calendar data (organizers, contacts).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A person with a display name and an email address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Person {
    name: String,
    email: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    email_synthesized: bool,
}

impl PartialEq for Person {
    /// The synthesized-email marker is metadata, not identity.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.email == other.email
    }
}

impl Eq for Person {}

impl std::hash::Hash for Person {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.email.hash(state);
    }
}

impl Person {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            email_synthesized: false,
        }
    }

    /// Parses free text of the forms `Name <email>`, `<email>`, `email` or
    /// bare `Name`.
    ///
    /// When only a name without an `@` is given, an address is synthesized
    /// by replacing spaces with dots (historic behavior kept for
    /// compatibility with old address books); such addresses are flagged
    /// with [`email_synthesized`](Self::email_synthesized) so callers can
    /// refuse to send mail to them.
    #[must_use]
    pub fn from_full_name(full_name: &str) -> Self {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Self::default();
        }

        if let Some(open) = full_name.rfind('<') {
            let close = full_name.rfind('>').unwrap_or(full_name.len());
            let email = full_name[open + 1..close].trim().to_string();
            let name = full_name[..open].trim().trim_matches('"').to_string();
            return Self::new(name, email);
        }

        if full_name.contains('@') {
            return Self::new(String::new(), full_name);
        }

        // Bare name: fabricate an address from the name.
        let email = full_name.replace(' ', ".");
        Self {
            name: full_name.to_string(),
            email,
            email_synthesized: true,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.email_synthesized = false;
    }

    /// True when the address was fabricated from the display name and must
    /// not be used as a real mailto target.
    #[must_use]
    pub const fn email_synthesized(&self) -> bool {
        self.email_synthesized
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty()
    }

    /// `Name <email>` form, or whichever half is present.
    #[must_use]
    pub fn full_name(&self) -> String {
        match (self.name.is_empty(), self.email.is_empty()) {
            (true, true) => String::new(),
            (true, false) => self.email.clone(),
            (false, true) => self.name.clone(),
            (false, false) => format!("{} <{}>", self.name, self.email),
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_name_and_email() {
        let p = Person::from_full_name("Jane Doe <jane@example.com>");
        assert_eq!(p.name(), "Jane Doe");
        assert_eq!(p.email(), "jane@example.com");
        assert!(!p.email_synthesized());
    }

    #[test]
    fn parse_bracketed_email_only() {
        let p = Person::from_full_name("<jane@example.com>");
        assert_eq!(p.name(), "");
        assert_eq!(p.email(), "jane@example.com");
    }

    #[test]
    fn parse_bare_email() {
        let p = Person::from_full_name("jane@example.com");
        assert_eq!(p.name(), "");
        assert_eq!(p.email(), "jane@example.com");
    }

    #[test]
    fn parse_bare_name_synthesizes_email() {
        let p = Person::from_full_name("Jane Mary Doe");
        assert_eq!(p.name(), "Jane Mary Doe");
        assert_eq!(p.email(), "Jane.Mary.Doe");
        assert!(p.email_synthesized());
    }

    #[test]
    fn set_email_clears_synthesized_flag() {
        let mut p = Person::from_full_name("Jane Doe");
        assert!(p.email_synthesized());
        p.set_email("jane@example.com");
        assert!(!p.email_synthesized());
    }

    #[test]
    fn full_name_roundtrip() {
        let p = Person::new("Jane Doe", "jane@example.com");
        assert_eq!(p.full_name(), "Jane Doe <jane@example.com>");
        assert_eq!(Person::from_full_name(&p.full_name()), p);
    }
}
