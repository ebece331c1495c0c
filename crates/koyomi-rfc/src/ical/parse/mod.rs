//! iCalendar text parsing: lexer, value parsers and the document parser.

pub mod lexer;
pub mod values;

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{Component, ComponentKind, ContentLine};

/// Parses an iCalendar document into its component tree.
///
/// The root must be a VCALENDAR. Values stay in wire form; typed
/// extraction happens in the `read` module.
///
/// ## Errors
/// Returns an error for structurally invalid input (unbalanced
/// BEGIN/END, malformed content lines).
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<Component> {
    let lines = lexer::split_lines(input);
    if lines.is_empty() {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1));
    }
    tracing::debug!(count = lines.len(), "parsing content lines");

    let mut content_lines = Vec::with_capacity(lines.len());
    for (line_num, line) in lines {
        content_lines.push((line_num, lexer::parse_content_line(&line, line_num)?));
    }

    let mut iter = content_lines.into_iter().peekable();
    let root = parse_component(&mut iter)?;

    if root.kind != ComponentKind::Calendar {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1)
            .with_context(format!("expected VCALENDAR, got {}", root.name)));
    }
    if iter.peek().is_some() {
        tracing::warn!("trailing content after END:VCALENDAR ignored");
    }

    Ok(root)
}

/// Parses one component starting at its BEGIN line.
fn parse_component(
    iter: &mut std::iter::Peekable<impl Iterator<Item = (usize, ContentLine)>>,
) -> ParseResult<Component> {
    let (line_num, begin) = iter
        .next()
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;
    if begin.name != "BEGIN" {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1));
    }
    parse_component_body(iter, line_num, &begin.value.to_ascii_uppercase())
}

/// Parses properties and nested components until the matching END.
fn parse_component_body(
    iter: &mut std::iter::Peekable<impl Iterator<Item = (usize, ContentLine)>>,
    begin_line: usize,
    name: &str,
) -> ParseResult<Component> {
    let mut component = Component::custom(name);
    let mut last_line = begin_line;

    loop {
        let Some((line_num, line)) = iter.next() else {
            return Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
                .with_context(format!("missing END:{name}")));
        };
        last_line = line_num;

        match line.name.as_str() {
            "BEGIN" => {
                let child =
                    parse_component_body(iter, line_num, &line.value.to_ascii_uppercase())?;
                component.add_child(child);
            }
            "END" => {
                let end_name = line.value.to_ascii_uppercase();
                if end_name != name {
                    return Err(ParseError::new(
                        ParseErrorKind::MismatchedComponent,
                        line_num,
                        1,
                    )
                    .with_context(format!("expected END:{name}, got END:{end_name}")));
                }
                return Ok(component);
            }
            _ => component.add_property(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:test-uid-123@example.com\r\n\
DTSTAMP:20260123T120000Z\r\n\
DTSTART:20260123T140000Z\r\n\
SUMMARY:Test Event\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT15M\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parses_nested_components() {
        let root = parse(SIMPLE).unwrap();
        assert_eq!(root.kind, ComponentKind::Calendar);
        assert_eq!(root.property_value("VERSION"), Some("2.0"));
        let events = root.children_of_kind(ComponentKind::Event);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].property_value("UID"), Some("test-uid-123@example.com"));
        assert_eq!(events[0].alarms().len(), 1);
    }

    #[test]
    fn missing_begin_is_an_error() {
        assert!(parse("VERSION:2.0\r\n").is_err());
    }

    #[test]
    fn mismatched_end_is_an_error() {
        let input = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VEVENT\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MismatchedComponent);
    }

    #[test]
    fn unterminated_component_is_an_error() {
        let input = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\n";
        let err = parse(input).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingEnd);
    }

    #[test]
    fn x_components_are_kept() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:X-CUSTOM\r\n\
X-PROP:1\r\n\
END:X-CUSTOM\r\n\
END:VCALENDAR\r\n";
        let root = parse(input).unwrap();
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "X-CUSTOM");
        assert_eq!(root.children[0].kind, ComponentKind::Unknown);
    }
}
