//! Content line lexer (RFC 5545 §3.1): unfolding and tokenization.

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{ContentLine, Parameter};

/// Splits input into logical content lines, merging folded continuations.
///
/// A line starting with SPACE or HTAB continues the previous line; the
/// line break and the single whitespace character are removed. Bare LF is
/// accepted alongside CRLF. Returns each line with its 1-based input line
/// number.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            let continuation = &line[1..];
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(continuation);
            } else {
                lines.push((i + 1, continuation.to_string()));
            }
        } else {
            lines.push((i + 1, line.to_string()));
        }
    }

    lines
}

/// Parses one content line: `name *(";" param) ":" value`.
///
/// ## Errors
/// Returns an error when the line has no name, no colon, or malformed
/// parameters.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let bytes = line.as_bytes();
    let mut pos = 0;

    // Property name runs to ';' or ':'.
    while pos < bytes.len() {
        let c = bytes[pos];
        if c == b';' || c == b':' {
            break;
        }
        if !c.is_ascii_alphanumeric() && c != b'-' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidPropertyName,
                line_num,
                pos + 1,
            ));
        }
        pos += 1;
    }

    if pos == 0 {
        return Err(ParseError::new(ParseErrorKind::MissingPropertyName, line_num, 1));
    }
    if pos == bytes.len() {
        return Err(ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()));
    }

    let name = line[..pos].to_ascii_uppercase();

    let mut params = Vec::new();
    while bytes[pos] == b';' {
        pos += 1;
        let (param, next) = parse_parameter(line, pos, line_num)?;
        params.push(param);
        pos = next;
        if pos >= bytes.len() {
            return Err(ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()));
        }
    }

    // pos is at the ':'.
    let value = &line[pos + 1..];

    Ok(ContentLine::with_params(name, params, value))
}

/// Parses one `name=value[,value...]` parameter starting at `start`.
/// Returns the parameter and the index of the terminating ';' or ':'.
fn parse_parameter(line: &str, start: usize, line_num: usize) -> ParseResult<(Parameter, usize)> {
    let bytes = line.as_bytes();
    let mut pos = start;

    while pos < bytes.len() && bytes[pos] != b'=' {
        let c = bytes[pos];
        if !c.is_ascii_alphanumeric() && c != b'-' {
            return Err(ParseError::new(ParseErrorKind::InvalidParameter, line_num, pos + 1));
        }
        pos += 1;
    }
    if pos == start || pos >= bytes.len() {
        return Err(ParseError::new(ParseErrorKind::InvalidParameter, line_num, start + 1));
    }

    let name = &line[start..pos];
    pos += 1; // consume '='

    let mut values = Vec::new();
    loop {
        let (value, next) = parse_param_value(line, pos, line_num)?;
        values.push(value);
        pos = next;
        match bytes.get(pos) {
            Some(b',') => pos += 1,
            Some(b';' | b':') => return Ok((Parameter::with_values(name, values), pos)),
            Some(_) => {
                return Err(ParseError::new(ParseErrorKind::InvalidParameter, line_num, pos + 1));
            }
            None => {
                return Err(ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()));
            }
        }
    }
}

/// Parses a single parameter value, possibly quoted, with RFC 6868 caret
/// decoding inside quotes. Returns the value and the index past it.
fn parse_param_value(line: &str, start: usize, line_num: usize) -> ParseResult<(String, usize)> {
    let bytes = line.as_bytes();

    if bytes.get(start) == Some(&b'"') {
        let mut value = String::new();
        let mut chars = line[start + 1..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Ok((value, start + 1 + i + 1)),
                '^' => match chars.next() {
                    Some((_, '^')) => value.push('^'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, '\'')) => value.push('"'),
                    Some((_, other)) => {
                        value.push('^');
                        value.push(other);
                    }
                    None => value.push('^'),
                },
                _ => value.push(c),
            }
        }
        return Err(ParseError::new(ParseErrorKind::UnclosedQuote, line_num, start + 1));
    }

    let mut end = start;
    while end < bytes.len() && !matches!(bytes[end], b',' | b';' | b':') {
        end += 1;
    }
    Ok((line[start..end].to_string(), end))
}
