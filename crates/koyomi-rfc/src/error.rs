use thiserror::Error;

/// What went wrong while lexing or parsing wire-format text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    MissingBegin,
    MissingEnd,
    MismatchedComponent,
    MissingPropertyName,
    MissingColon,
    InvalidPropertyName,
    InvalidParameter,
    UnclosedQuote,
    InvalidDate,
    InvalidTime,
    InvalidDateTime,
    InvalidDuration,
    InvalidPeriod,
    InvalidUtcOffset,
    InvalidInteger,
    InvalidFloat,
    InvalidBoolean,
    InvalidRRule,
    InvalidFrequency,
    InvalidWeekday,
    UntilCountConflict,
    InvalidValue,
    InvalidXml,
}

impl ParseErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingBegin => "missing BEGIN",
            Self::MissingEnd => "missing END",
            Self::MismatchedComponent => "mismatched component",
            Self::MissingPropertyName => "missing property name",
            Self::MissingColon => "missing ':' separator",
            Self::InvalidPropertyName => "invalid property name",
            Self::InvalidParameter => "invalid parameter",
            Self::UnclosedQuote => "unclosed quote",
            Self::InvalidDate => "invalid DATE value",
            Self::InvalidTime => "invalid TIME value",
            Self::InvalidDateTime => "invalid DATE-TIME value",
            Self::InvalidDuration => "invalid DURATION value",
            Self::InvalidPeriod => "invalid PERIOD value",
            Self::InvalidUtcOffset => "invalid UTC-OFFSET value",
            Self::InvalidInteger => "invalid INTEGER value",
            Self::InvalidFloat => "invalid FLOAT value",
            Self::InvalidBoolean => "invalid BOOLEAN value",
            Self::InvalidRRule => "invalid recurrence rule",
            Self::InvalidFrequency => "invalid FREQ value",
            Self::InvalidWeekday => "invalid weekday",
            Self::UntilCountConflict => "UNTIL and COUNT are exclusive",
            Self::InvalidValue => "invalid value",
            Self::InvalidXml => "invalid XML",
        }
    }
}

/// A parse error with its position in the input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} at line {line}, column {col}{}", context.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub col: usize,
    pub context: Option<String>,
}

impl ParseError {
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, col: usize) -> Self {
        Self { kind, line, col, context: None }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

impl From<ParseError> for koyomi_core::CalendarError {
    fn from(err: ParseError) -> Self {
        Self::ParseIcal(err.to_string())
    }
}
