//! Extensible bag of `X-` properties carried by calendar entities.

use std::collections::BTreeMap;

/// A custom (`X-`) property value with its raw parameter string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomProperty {
    pub value: String,
    /// Raw parameter text as it appeared on the content line, if any.
    pub parameters: Option<String>,
}

/// Typed key/value bag for non-standard properties.
///
/// Keys are stored uppercase in a `BTreeMap` so serialization order is
/// deterministic. Keys starting with `X-KDE-VOLATILE` are held in a sidecar
/// map that is neither serialized nor part of equality.
#[derive(Debug, Clone, Default)]
pub struct CustomProperties {
    properties: BTreeMap<String, CustomProperty>,
    volatile: BTreeMap<String, CustomProperty>,
}

const VOLATILE_PREFIX: &str = "X-KDE-VOLATILE";

impl CustomProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom property. Keys are uppercased; keys not starting with
    /// `X-` are rejected silently.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.set_with_parameters(key, value, None);
    }

    /// Sets a custom property keeping its raw parameter string.
    pub fn set_with_parameters(
        &mut self,
        key: &str,
        value: impl Into<String>,
        parameters: Option<String>,
    ) {
        let key = key.to_ascii_uppercase();
        if !key.starts_with("X-") {
            tracing::warn!(key, "ignoring custom property without X- prefix");
            return;
        }
        let prop = CustomProperty { value: value.into(), parameters };
        if key.starts_with(VOLATILE_PREFIX) {
            self.volatile.insert(key, prop);
        } else {
            self.properties.insert(key, prop);
        }
    }

    /// Returns the value for `key`, looking in both maps.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_uppercase();
        self.entry(&key).map(|p| p.value.as_str())
    }

    fn entry(&self, key: &str) -> Option<&CustomProperty> {
        if key.starts_with(VOLATILE_PREFIX) {
            self.volatile.get(key)
        } else {
            self.properties.get(key)
        }
    }

    pub fn remove(&mut self, key: &str) {
        let key = key.to_ascii_uppercase();
        if key.starts_with(VOLATILE_PREFIX) {
            self.volatile.remove(&key);
        } else {
            self.properties.remove(&key);
        }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterates the serializable (non-volatile) properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomProperty)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges another bag into this one, overwriting on key collisions.
    pub fn merge(&mut self, other: &Self) {
        for (k, v) in &other.properties {
            self.properties.insert(k.clone(), v.clone());
        }
    }
}

impl PartialEq for CustomProperties {
    /// Volatile entries do not participate in equality.
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties
    }
}

impl Eq for CustomProperties {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_uppercased() {
        let mut props = CustomProperties::new();
        props.set("x-location-radius", "250");
        assert_eq!(props.get("X-LOCATION-RADIUS"), Some("250"));
        assert_eq!(props.get("x-location-radius"), Some("250"));
    }

    #[test]
    fn non_x_keys_rejected() {
        let mut props = CustomProperties::new();
        props.set("LOCATION", "nope");
        assert!(props.get("LOCATION").is_none());
        assert!(props.is_empty());
    }

    #[test]
    fn volatile_keys_do_not_compare() {
        let mut a = CustomProperties::new();
        let mut b = CustomProperties::new();
        a.set("X-FOO", "1");
        b.set("X-FOO", "1");
        a.set("X-KDE-VOLATILE-CACHE", "scratch");
        assert_eq!(a, b);
        assert_eq!(a.get("X-KDE-VOLATILE-CACHE"), Some("scratch"));
        assert!(!a.iter().any(|(k, _)| k.starts_with("X-KDE-VOLATILE")));
    }

    #[test]
    fn parameters_preserved() {
        let mut props = CustomProperties::new();
        props.set_with_parameters("X-THING", "v", Some("FMTTYPE=text/plain".into()));
        let (_, prop) = props.iter().next().unwrap();
        assert_eq!(prop.parameters.as_deref(), Some("FMTTYPE=text/plain"));
    }
}
