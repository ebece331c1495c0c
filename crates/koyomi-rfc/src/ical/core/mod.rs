//! The raw component tree all readers produce and the writer consumes.
//!
//! Content lines keep their wire value; typed extraction happens in the
//! `read` module once timezone definitions from the same document are
//! available.

/// Component kind for iCalendar (RFC 5545 §3.4-3.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// VCALENDAR wrapper component.
    Calendar,
    Event,
    Todo,
    Journal,
    FreeBusy,
    Timezone,
    /// VALARM, nested within VEVENT/VTODO.
    Alarm,
    /// STANDARD sub-component of VTIMEZONE.
    Standard,
    /// DAYLIGHT sub-component of VTIMEZONE.
    Daylight,
    /// Unknown/X-component.
    Unknown,
}

impl ComponentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::FreeBusy => "VFREEBUSY",
            Self::Timezone => "VTIMEZONE",
            Self::Alarm => "VALARM",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::Unknown => "X-UNKNOWN",
        }
    }

    /// Parses a component kind from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VTODO" => Self::Todo,
            "VJOURNAL" => Self::Journal,
            "VFREEBUSY" => Self::FreeBusy,
            "VTIMEZONE" => Self::Timezone,
            "VALARM" => Self::Alarm,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property parameter, e.g. `TZID=Europe/Prague`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name, normalized to uppercase.
    pub name: String,
    /// One or more values.
    pub values: Vec<String>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values: vec![value.into()],
        }
    }

    #[must_use]
    pub fn with_values(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            values,
        }
    }

    /// The first value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// A content line: property name, parameters and the raw wire value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Property name, normalized to uppercase.
    pub name: String,
    /// Parameters in order of appearance.
    pub params: Vec<Parameter>,
    /// Raw value (unfolded, not unescaped).
    pub value: String,
}

impl ContentLine {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn with_params(
        name: impl Into<String>,
        params: Vec<Parameter>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_ascii_uppercase(),
            params,
            value: value.into(),
        }
    }

    /// Adds a parameter and returns the line (builder style).
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(Parameter::new(name, value));
        self
    }

    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        let name = name.to_ascii_uppercase();
        self.params.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// The VALUE parameter, if present.
    #[must_use]
    pub fn value_type(&self) -> Option<&str> {
        self.param_value("VALUE")
    }

    /// The TZID parameter, if present.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.param_value("TZID")
    }

    /// Serializes the parameters back to their wire form.
    #[must_use]
    pub fn params_wire(&self) -> String {
        let mut out = String::new();
        for param in &self.params {
            out.push(';');
            out.push_str(&param.name);
            out.push('=');
            for (i, value) in param.values.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                if value.contains([';', ',', ':']) {
                    out.push('"');
                    out.push_str(value);
                    out.push('"');
                } else {
                    out.push_str(value);
                }
            }
        }
        out
    }
}

/// An iCalendar component: properties plus nested sub-components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Original component name, preserved for X-components.
    pub name: String,
    pub properties: Vec<ContentLine>,
    pub children: Vec<Component>,
}

impl Component {
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            name: kind.as_str().to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A component with a custom name (for X-components).
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into().to_ascii_uppercase();
        Self {
            kind: ComponentKind::parse(&name),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn add_property(&mut self, line: ContentLine) {
        self.properties.push(line);
    }

    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    /// The first property with the given name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ContentLine> {
        let name = name.to_ascii_uppercase();
        self.properties.iter().find(|p| p.name == name)
    }

    /// All properties with the given name.
    #[must_use]
    pub fn properties_named(&self, name: &str) -> Vec<&ContentLine> {
        let name = name.to_ascii_uppercase();
        self.properties.iter().filter(|p| p.name == name).collect()
    }

    /// The raw value of the first property with the given name.
    #[must_use]
    pub fn property_value(&self, name: &str) -> Option<&str> {
        self.property(name).map(|p| p.value.as_str())
    }

    #[must_use]
    pub fn children_of_kind(&self, kind: ComponentKind) -> Vec<&Component> {
        self.children.iter().filter(|c| c.kind == kind).collect()
    }

    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.children_of_kind(ComponentKind::Timezone)
    }

    #[must_use]
    pub fn alarms(&self) -> Vec<&Component> {
        self.children_of_kind(ComponentKind::Alarm)
    }
}
