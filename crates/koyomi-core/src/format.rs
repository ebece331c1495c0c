//! Process-wide identity used when emitting calendars.
//!
//! The embedding application may set its name and product id exactly once,
//! before the first emission; otherwise the library defaults apply.

use std::sync::OnceLock;

const DEFAULT_APPLICATION: &str = "libkoyomi";
const DEFAULT_PROD_ID: &str = "-//Koyomi//NONSGML Koyomi Calendar Library//EN";

static APPLICATION: OnceLock<(String, String)> = OnceLock::new();

/// Sets the application name and PRODID used for emitted calendars.
///
/// Returns false when the identity was already set (the first caller
/// wins).
pub fn set_application(name: impl Into<String>, prod_id: impl Into<String>) -> bool {
    APPLICATION.set((name.into(), prod_id.into())).is_ok()
}

/// The application name, or the library default.
#[must_use]
pub fn application_name() -> &'static str {
    APPLICATION.get().map_or(DEFAULT_APPLICATION, |(name, _)| name)
}

/// The PRODID written into emitted calendars.
#[must_use]
pub fn prod_id() -> &'static str {
    APPLICATION.get().map_or(DEFAULT_PROD_ID, |(_, prod_id)| prod_id)
}

/// A globally unique identifier for a new incidence.
#[must_use]
pub fn create_unique_uid() -> String {
    uuid::Uuid::new_v4().to_string()
}
