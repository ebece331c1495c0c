//! Attachments referenced from or embedded in incidences.

use std::cell::OnceCell;

use base64::{Engine, engine::general_purpose::STANDARD};

/// An attachment: either a URI reference or inline base64 data, tagged with
/// a MIME type.
#[derive(Debug, Clone, Default)]
pub struct Attachment {
    uri: Option<String>,
    /// Base64 text as it appears on the wire.
    data: Option<String>,
    mime_type: String,
    show_inline: bool,
    label: String,
    local: bool,
    /// Decoded byte length, computed on first use.
    decoded_size: OnceCell<usize>,
}

impl Attachment {
    /// An attachment referencing external data by URI.
    #[must_use]
    pub fn from_uri(uri: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    /// An inline attachment from already-encoded base64 text.
    #[must_use]
    pub fn from_base64(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    /// An inline attachment from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        let attachment = Self::from_base64(STANDARD.encode(bytes), mime_type);
        let _ = attachment.decoded_size.set(bytes.len());
        attachment
    }

    #[must_use]
    pub fn is_uri(&self) -> bool {
        self.uri.is_some()
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.data.is_some()
    }

    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// The base64 payload of an inline attachment.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Decodes the inline payload. Returns `None` for URI attachments or
    /// undecodable data.
    #[must_use]
    pub fn decoded(&self) -> Option<Vec<u8>> {
        let data = self.data.as_deref()?;
        STANDARD.decode(data).ok()
    }

    /// The decoded byte length of an inline attachment; 0 for URI
    /// attachments. Cached after the first call.
    #[must_use]
    pub fn size(&self) -> usize {
        *self
            .decoded_size
            .get_or_init(|| self.decoded().map_or(0, |b| b.len()))
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) {
        self.mime_type = mime_type.into();
    }

    /// Whether a viewer should display the attachment inline.
    #[must_use]
    pub const fn show_inline(&self) -> bool {
        self.show_inline
    }

    pub fn set_show_inline(&mut self, show: bool) {
        self.show_inline = show;
    }

    /// A display label for the attachment.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Whether the URI points at a local file.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.local
    }

    pub fn set_local(&mut self, local: bool) {
        self.local = local;
    }
}

impl PartialEq for Attachment {
    /// The cached size does not participate in equality.
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
            && self.data == other.data
            && self.mime_type == other.mime_type
            && self.show_inline == other.show_inline
            && self.label == other.label
            && self.local == other.local
    }
}

impl Eq for Attachment {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_attachment() {
        let a = Attachment::from_uri("https://example.com/agenda.pdf", "application/pdf");
        assert!(a.is_uri());
        assert!(!a.is_binary());
        assert_eq!(a.size(), 0);
    }

    #[test]
    fn binary_attachment_size_is_lazy() {
        let a = Attachment::from_base64("SGVsbG8gV29ybGQ=", "text/plain");
        assert!(a.is_binary());
        assert_eq!(a.size(), 11);
        assert_eq!(a.decoded().unwrap(), b"Hello World");
    }

    #[test]
    fn from_bytes_roundtrip() {
        let a = Attachment::from_bytes(b"Hello World", "text/plain");
        assert_eq!(a.data(), Some("SGVsbG8gV29ybGQ="));
        assert_eq!(a.size(), 11);
    }

    #[test]
    fn equality_ignores_size_cache() {
        let a = Attachment::from_base64("SGVsbG8gV29ybGQ=", "text/plain");
        let b = Attachment::from_base64("SGVsbG8gV29ybGQ=", "text/plain");
        let _ = a.size();
        assert_eq!(a, b);
    }
}
