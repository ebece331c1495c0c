//! xCal support (load only): RFC 6321 and the earlier draft dialect.
//!
//! Both dialects are converted into the shared component tree and then
//! read by the regular iCalendar reader, so property handling stays in
//! one place.

use std::rc::Rc;

use quick_xml::Reader as XmlReader;
use quick_xml::events::Event as XmlEvent;

use koyomi_core::calendar::Calendar;
use koyomi_core::error::{CalendarError, CalendarResult};

use crate::error::{ParseError, ParseErrorKind, ParseResult};
use crate::format::CalFormat;
use crate::ical::core::{Component, ContentLine, Parameter};
use crate::ical::read::Reader;
use crate::ical::write::escape::escape_text;

/// RFC 6321 namespace.
const NS_RFC6321: &str = "urn:ietf:params:xml:ns:icalendar-2.0";
/// The legacy draft namespace.
const NS_LEGACY: &str = "urn:ietf:params:xml:ns:xcal";

/// The xCal XML format. Writing is not supported.
#[derive(Debug, Default)]
pub struct XCalFormat;

impl XCalFormat {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CalFormat for XCalFormat {
    fn from_string(&mut self, calendar: &Rc<Calendar>, text: &str) -> CalendarResult<()> {
        if text.trim().is_empty() {
            return Err(CalendarError::ParseEmptyMessage);
        }
        let root = parse_xml(text).map_err(CalendarError::from)?;

        let namespace = root
            .attr("xmlns")
            .map(ToString::to_string)
            .unwrap_or_default();
        let vcalendars = find_vcalendars(&root);
        if vcalendars.is_empty() {
            return Err(CalendarError::NoCalendar);
        }

        for node in vcalendars {
            let mut component = if namespace == NS_RFC6321 {
                convert_rfc6321(node)
            } else if namespace == NS_LEGACY || root.name.eq_ignore_ascii_case("icalendar") {
                convert_legacy(node)
            } else {
                tracing::warn!(namespace = %namespace, "unknown xCal namespace, trying the legacy dialect");
                convert_legacy(node)
            };
            // xCal documents routinely omit VERSION; it is implied.
            if component.property("VERSION").is_none() {
                component.add_property(ContentLine::new("VERSION", "2.0"));
            }
            calendar.set_loading(true);
            let result = Reader::populate(&component, calendar);
            calendar.set_loading(false);
            result?;
        }
        Ok(())
    }

    fn to_string(&self, _calendar: &Rc<Calendar>) -> CalendarResult<String> {
        Err(CalendarError::ParseIcal("xCal writing is not supported".into()))
    }
}

/// A plain XML element tree.
#[derive(Debug, Clone, Default)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Parses XML into a node tree.
fn parse_xml(input: &str) -> ParseResult<XmlNode> {
    let mut reader = XmlReader::from_str(input);
    reader.config_mut().trim_text(true);

    let xml_err = |e: quick_xml::Error| {
        ParseError::new(ParseErrorKind::InvalidXml, 1, 1).with_context(e.to_string())
    };

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            XmlEvent::Start(start) => {
                let mut node = XmlNode {
                    name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                    ..XmlNode::default()
                };
                for attr in start.attributes().flatten() {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    node.attrs.push((key, value));
                }
                stack.push(node);
            }
            XmlEvent::Empty(start) => {
                let node = XmlNode {
                    name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
                    ..XmlNode::default()
                };
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            XmlEvent::Text(text) => {
                let decoded = String::from_utf8_lossy(text.as_ref()).into_owned();
                let unescaped = quick_xml::escape::unescape(&decoded)
                    .map(std::borrow::Cow::into_owned)
                    .unwrap_or(decoded);
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&unescaped);
                }
            }
            XmlEvent::End(_) => {
                let Some(node) = stack.pop() else {
                    return Err(ParseError::new(ParseErrorKind::InvalidXml, 1, 1)
                        .with_context("unbalanced end tag"));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidXml, 1, 1).with_context("no root element")
    })
}

/// Collects the vcalendar elements, whether the root is a wrapper or the
/// calendar itself.
fn find_vcalendars(root: &XmlNode) -> Vec<&XmlNode> {
    if root.name.eq_ignore_ascii_case("vcalendar") {
        return vec![root];
    }
    root.children
        .iter()
        .filter(|c| c.name.eq_ignore_ascii_case("vcalendar"))
        .collect()
}

/// Converts an RFC 6321 `<vcalendar>` element into a component.
fn convert_rfc6321(node: &XmlNode) -> Component {
    let mut component = Component::custom(canonical_component_name(&node.name));

    if let Some(properties) = node.child("properties") {
        for property in &properties.children {
            match convert_rfc6321_property(property) {
                Some(line) => component.add_property(line),
                None => {
                    tracing::warn!(element = %property.name, "skipping unknown xCal property");
                }
            }
        }
    }
    if let Some(components) = node.child("components") {
        for child in &components.children {
            component.add_child(convert_rfc6321(child));
        }
    }
    component
}

fn canonical_component_name(name: &str) -> String {
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "STANDARD" | "DAYLIGHT" => upper,
        _ if upper.starts_with('V') => upper,
        _ => format!("V{upper}"),
    }
}

/// Converts one RFC 6321 property element (typed value children, optional
/// `<parameters>`) into a content line.
fn convert_rfc6321_property(node: &XmlNode) -> Option<ContentLine> {
    let name = node.name.to_ascii_uppercase();

    let mut params = Vec::new();
    if let Some(parameters) = node.child("parameters") {
        for parameter in &parameters.children {
            let value = parameter
                .children
                .first()
                .map_or_else(|| parameter.text.clone(), |v| v.text.clone());
            params.push(Parameter::new(&parameter.name, value));
        }
    }

    let mut values = Vec::new();
    let mut value_kind = None;
    for value in &node.children {
        if value.name.eq_ignore_ascii_case("parameters") {
            continue;
        }
        value_kind = Some(value.name.to_ascii_lowercase());
        values.push(convert_rfc6321_value(value)?);
    }
    if values.is_empty() {
        return None;
    }

    match value_kind.as_deref() {
        Some("date") => params.push(Parameter::new("VALUE", "DATE")),
        Some("period") => params.push(Parameter::new("VALUE", "PERIOD")),
        Some("binary") => params.push(Parameter::new("VALUE", "BINARY")),
        _ => {}
    }

    Some(ContentLine::with_params(name, params, values.join(",")))
}

/// Converts one typed value element to its RFC 5545 text form.
fn convert_rfc6321_value(node: &XmlNode) -> Option<String> {
    let text = node.text.trim();
    match node.name.to_ascii_lowercase().as_str() {
        "text" => Some(escape_text(text)),
        "date-time" | "time" => Some(compact_datetime(text)),
        "date" => Some(text.replace('-', "")),
        "duration" | "utc-offset" | "uri" | "cal-address" | "integer" | "float" | "boolean"
        | "binary" | "unknown" => Some(text.to_string()),
        "period" => {
            let start = node.child("start").map(|n| compact_datetime(n.text.trim()))?;
            let end = node
                .child("end")
                .map(|n| compact_datetime(n.text.trim()))
                .or_else(|| node.child("duration").map(|n| n.text.trim().to_string()))?;
            Some(format!("{start}/{end}"))
        }
        "recur" => Some(convert_rfc6321_recur(node)),
        _ => None,
    }
}

/// Flattens a `<recur>` element into the semicolon rule notation.
fn convert_rfc6321_recur(node: &XmlNode) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut lists: Vec<(String, Vec<String>)> = Vec::new();
    for child in &node.children {
        let key = child.name.to_ascii_uppercase();
        let value = child.text.trim().to_string();
        if key == "UNTIL" {
            parts.push(format!("UNTIL={}", compact_datetime(&value)));
            continue;
        }
        match lists.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => lists.push((key, vec![value])),
        }
    }
    for (key, values) in lists {
        parts.push(format!("{key}={}", values.join(",")));
    }
    parts.join(";")
}

/// `2011-05-17T12:00:00Z` to `20110517T120000Z`.
fn compact_datetime(s: &str) -> String {
    s.replace(['-', ':'], "")
}

/// Converts a legacy draft `<vcalendar>` element: flat children whose
/// text content is already RFC 5545 serialized.
fn convert_legacy(node: &XmlNode) -> Component {
    let mut component = Component::custom(canonical_component_name(&node.name));
    for child in &node.children {
        if child.children.is_empty() {
            // Attributes carry the parameters in this dialect.
            let params: Vec<Parameter> = child
                .attrs
                .iter()
                .filter(|(k, _)| !k.eq_ignore_ascii_case("xmlns"))
                .map(|(k, v)| Parameter::new(k, v))
                .collect();
            let line = ContentLine {
                name: child.name.to_ascii_uppercase(),
                params,
                value: child.text.trim().to_string(),
            };
            component.add_property(line);
        } else {
            component.add_child(convert_legacy(child));
        }
    }
    component
}
