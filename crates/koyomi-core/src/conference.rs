//! Conference access information (RFC 7986 §5.11).

/// A way to join an incidence remotely: a URI plus descriptive metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Conference {
    uri: String,
    label: String,
    features: Vec<String>,
    language: String,
}

impl Conference {
    #[must_use]
    pub fn new(uri: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = uri.into();
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// FEATURE parameter values (AUDIO, VIDEO, CHAT, ...).
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn add_feature(&mut self, feature: impl Into<String>) {
        self.features.push(feature.into());
    }

    pub fn set_features(&mut self, features: Vec<String>) {
        self.features = features;
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction() {
        let mut c = Conference::new("https://meet.example.com/room", "Weekly sync");
        c.add_feature("AUDIO");
        c.add_feature("VIDEO");
        assert_eq!(c.uri(), "https://meet.example.com/room");
        assert_eq!(c.features(), ["AUDIO", "VIDEO"]);
    }
}
