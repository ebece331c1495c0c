use thiserror::Error;

/// Errors produced while loading, parsing or saving calendar data.
///
/// Every parse failure maps to exactly one variant; message arguments are
/// carried in the variant payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Load error: {0}")]
    Load(String),

    #[error("Save error: {0}")]
    Save(String),

    #[error("Parse error in the iCalendar parser: {0}")]
    ParseIcal(String),

    #[error("Parse error in the vCalendar parser: {0}")]
    ParseVcal(String),

    #[error("Component is not an incidence: {0}")]
    ParseNotIncidence(String),

    #[error("Scheduling message is empty")]
    ParseEmptyMessage,

    #[error("Unable to parse input: {0}")]
    ParseUnableToParse(String),

    #[error("Scheduling message has no METHOD property")]
    ParseMethodProperty,

    #[error("Input contains no VCALENDAR component")]
    NoCalendar,

    #[error("Expected iCalendar, got vCalendar (version 1.0)")]
    CalVersion1,

    #[error("Expected vCalendar, got iCalendar (version 2.0)")]
    CalVersion2,

    #[error("Unknown calendar format version: {0}")]
    CalVersionUnknown(String),

    #[error("Restriction violation: {0}")]
    Restriction(String),

    #[error("Operation cancelled by user")]
    UserCancel,

    #[error("No writable resource found")]
    NoWritableFound,

    #[error("Cannot open file for saving: {0}")]
    SaveErrorOpenFile(String),

    #[error("Cannot write file: {0}")]
    SaveErrorSaveFile(String),

    #[error("Internal iCalendar library error: {0}")]
    LibIcalError(String),

    #[error("Calendar has no VERSION property")]
    VersionPropertyMissing,

    #[error("Expected calendar version 2.0, got {0}")]
    ExpectedCalVersion2(String),

    #[error("Expected calendar version 2.0, version is unrecognizable")]
    ExpectedCalVersion2Unknown,
}

pub type CalendarResult<T> = std::result::Result<T, CalendarError>;
