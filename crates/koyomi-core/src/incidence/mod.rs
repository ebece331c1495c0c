//! Calendar incidences: events, to-dos and journals over a shared base.

mod base;
mod event;
mod freebusy;
mod journal;
mod todo;

pub use base::{Field, IncidenceBase, IncidenceObserver};
pub use event::{Event, Transparency};
pub use freebusy::FreeBusy;
pub use journal::Journal;
pub use todo::Todo;

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use crate::alarm::Alarm;
use crate::attachment::Attachment;
use crate::conference::Conference;
use crate::datetime::{CalDateTime, TimeSpec};
use crate::recurrence::Recurrence;

/// Sentinel reported for unset geographic coordinates.
pub const GEO_INVALID: f64 = 255.0;

/// MIME type of serialized calendars.
pub const MIME_TEXT_CALENDAR: &str = "text/calendar";

/// The concrete type of an incidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncidenceKind {
    Event,
    Todo,
    Journal,
}

impl IncidenceKind {
    /// The iCalendar component name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
        }
    }

    /// The item MIME type used by storage collaborators.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Event => "application/x-vnd.akonadi.calendar.event",
            Self::Todo => "application/x-vnd.akonadi.calendar.todo",
            Self::Journal => "application/x-vnd.akonadi.calendar.journal",
        }
    }
}

/// Classification of an incidence (RFC 5545 CLASS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Secrecy {
    #[default]
    Public,
    Private,
    Confidential,
}

impl Secrecy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Confidential => "CONFIDENTIAL",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PUBLIC" => Some(Self::Public),
            "PRIVATE" => Some(Self::Private),
            "CONFIDENTIAL" => Some(Self::Confidential),
            _ => None,
        }
    }
}

/// Status of an incidence (RFC 5545 STATUS).
///
/// Which values are accepted depends on the incidence type; see the
/// per-type `set_status` operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    None,
    Tentative,
    Confirmed,
    Completed,
    NeedsAction,
    Cancelled,
    InProcess,
    Draft,
    Final,
    /// A non-standard status value.
    X(String),
}

impl Status {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "",
            Self::Tentative => "TENTATIVE",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::NeedsAction => "NEEDS-ACTION",
            Self::Cancelled => "CANCELLED",
            Self::InProcess => "IN-PROCESS",
            Self::Draft => "DRAFT",
            Self::Final => "FINAL",
            Self::X(s) => s,
        }
    }

    /// Parses a STATUS value; anything unknown becomes [`Status::X`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "" => Self::None,
            "TENTATIVE" => Self::Tentative,
            "CONFIRMED" => Self::Confirmed,
            "COMPLETED" => Self::Completed,
            "NEEDS-ACTION" => Self::NeedsAction,
            "CANCELLED" => Self::Cancelled,
            "IN-PROCESS" => Self::InProcess,
            "DRAFT" => Self::Draft,
            "FINAL" => Self::Final,
            _ => Self::X(s.to_string()),
        }
    }
}

/// How two incidences relate (RFC 5545 RELTYPE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationType {
    Parent,
    Child,
    Sibling,
}

impl RelationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "PARENT",
            Self::Child => "CHILD",
            Self::Sibling => "SIBLING",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PARENT" => Some(Self::Parent),
            "CHILD" => Some(Self::Child),
            "SIBLING" => Some(Self::Sibling),
            _ => None,
        }
    }
}

/// The fields shared by events, to-dos and journals on top of
/// [`IncidenceBase`].
#[derive(Debug, Clone, PartialEq)]
pub struct IncidenceCommon {
    base: IncidenceBase,
    created: Option<CalDateTime>,
    revision: i32,
    summary: String,
    summary_rich: bool,
    description: String,
    description_rich: bool,
    location: String,
    location_rich: bool,
    color: String,
    categories: Vec<String>,
    resources: Vec<String>,
    priority: i32,
    status: Status,
    secrecy: Secrecy,
    alarms: Vec<Alarm>,
    attachments: Vec<Attachment>,
    conferences: Vec<Conference>,
    related_to: BTreeMap<RelationType, String>,
    geo: Option<(f64, f64)>,
    recurrence: Option<Box<Recurrence>>,
    recurrence_id: Option<CalDateTime>,
    this_and_future: bool,
    scheduling_id: String,
}

/// Crude check for markup so `set_summary` and friends can keep the
/// rich-text flag in sync with free-form input.
fn looks_like_rich_text(s: &str) -> bool {
    s.contains("</") || s.contains("<html") || s.contains("<br")
}

/// Strips tags from markup, leaving the text content.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

impl IncidenceCommon {
    #[must_use]
    pub fn new() -> Self {
        Self::from_base(IncidenceBase::new())
    }

    #[must_use]
    pub fn from_base(base: IncidenceBase) -> Self {
        Self {
            base,
            created: None,
            revision: 0,
            summary: String::new(),
            summary_rich: false,
            description: String::new(),
            description_rich: false,
            location: String::new(),
            location_rich: false,
            color: String::new(),
            categories: Vec::new(),
            resources: Vec::new(),
            priority: 0,
            status: Status::None,
            secrecy: Secrecy::Public,
            alarms: Vec::new(),
            attachments: Vec::new(),
            conferences: Vec::new(),
            related_to: BTreeMap::new(),
            geo: None,
            recurrence: None,
            recurrence_id: None,
            this_and_future: false,
            scheduling_id: String::new(),
        }
    }

    #[must_use]
    pub const fn base(&self) -> &IncidenceBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut IncidenceBase {
        &mut self.base
    }

    fn bump_revision(&mut self) {
        if !self.base.is_local_only() {
            self.revision += 1;
        }
    }

    /// Runs one tracked write: observer pre-call, mutation, dirty mark,
    /// observer post-call, revision bump.
    fn write(&mut self, field: Field, f: impl FnOnce(&mut Self)) {
        if self.base.is_read_only() {
            return;
        }
        self.base.update();
        f(self);
        self.base.set_field_dirty(field);
        self.base.updated();
        self.bump_revision();
    }

    /// Start of the incidence. Also moves the recurrence start.
    pub fn set_dt_start(&mut self, dt_start: Option<CalDateTime>) {
        if self.base.is_read_only() || self.base.dt_start() == dt_start {
            return;
        }
        self.base.set_dt_start(dt_start);
        if let Some(rec) = self.recurrence.as_deref_mut()
            && let Some(dt) = dt_start
        {
            rec.set_start(dt);
        }
        self.bump_revision();
    }

    /// Toggles the all-day flag; propagated to the recurrence.
    pub fn set_all_day(&mut self, all_day: bool) {
        if self.base.is_read_only() || self.base.all_day() == all_day {
            return;
        }
        self.base.set_all_day(all_day);
        if let Some(rec) = self.recurrence.as_deref_mut() {
            rec.set_all_day(all_day);
        }
        self.bump_revision();
    }

    #[must_use]
    pub const fn created(&self) -> Option<CalDateTime> {
        self.created
    }

    pub fn set_created(&mut self, created: Option<CalDateTime>) {
        if self.base.is_read_only() || self.base.is_local_only() || self.created == created {
            return;
        }
        self.write(Field::Created, |s| s.created = created);
    }

    #[must_use]
    pub const fn revision(&self) -> i32 {
        self.revision
    }

    pub fn set_revision(&mut self, revision: i32) {
        if self.base.is_read_only() || self.revision == revision {
            return;
        }
        self.base.update();
        self.revision = revision;
        self.base.set_field_dirty(Field::Revision);
        self.base.updated();
    }

    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    #[must_use]
    pub const fn summary_is_rich(&self) -> bool {
        self.summary_rich
    }

    /// The summary with markup stripped.
    #[must_use]
    pub fn plain_summary(&self) -> String {
        if self.summary_rich {
            strip_tags(&self.summary)
        } else {
            self.summary.clone()
        }
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        let summary = summary.into();
        let rich = looks_like_rich_text(&summary);
        self.set_summary_with_rich(summary, rich);
    }

    pub fn set_summary_with_rich(&mut self, summary: String, is_rich: bool) {
        if self.base.is_read_only()
            || (self.summary == summary && self.summary_rich == is_rich)
        {
            return;
        }
        self.write(Field::Summary, |s| {
            s.summary = summary;
            s.summary_rich = is_rich;
        });
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn description_is_rich(&self) -> bool {
        self.description_rich
    }

    #[must_use]
    pub fn plain_description(&self) -> String {
        if self.description_rich {
            strip_tags(&self.description)
        } else {
            self.description.clone()
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        let rich = looks_like_rich_text(&description);
        self.set_description_with_rich(description, rich);
    }

    pub fn set_description_with_rich(&mut self, description: String, is_rich: bool) {
        if self.base.is_read_only()
            || (self.description == description && self.description_rich == is_rich)
        {
            return;
        }
        self.write(Field::Description, |s| {
            s.description = description;
            s.description_rich = is_rich;
        });
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub const fn location_is_rich(&self) -> bool {
        self.location_rich
    }

    #[must_use]
    pub fn plain_location(&self) -> String {
        if self.location_rich {
            strip_tags(&self.location)
        } else {
            self.location.clone()
        }
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        let location = location.into();
        let rich = looks_like_rich_text(&location);
        self.set_location_with_rich(location, rich);
    }

    pub fn set_location_with_rich(&mut self, location: String, is_rich: bool) {
        if self.base.is_read_only()
            || (self.location == location && self.location_rich == is_rich)
        {
            return;
        }
        self.write(Field::Location, |s| {
            s.location = location;
            s.location_rich = is_rich;
        });
    }

    /// A CSS3 color name used by calendar views.
    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        let color = color.into();
        if self.base.is_read_only() || self.color == color {
            return;
        }
        self.write(Field::Color, |s| s.color = color);
    }

    /// Categories, order- and case-preserving.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn set_categories(&mut self, categories: Vec<String>) {
        if self.base.is_read_only() || self.categories == categories {
            return;
        }
        self.write(Field::Categories, |s| s.categories = categories);
    }

    #[must_use]
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    pub fn set_resources(&mut self, resources: Vec<String>) {
        if self.base.is_read_only() || self.resources == resources {
            return;
        }
        self.write(Field::Resources, |s| s.resources = resources);
    }

    /// Priority: 0 is unset, 1 highest, 9 lowest.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Sets the priority. Values outside 0..=9 are rejected with a
    /// diagnostic and no state change.
    pub fn set_priority(&mut self, priority: i32) {
        if !(0..=9).contains(&priority) {
            tracing::warn!(priority, uid = self.base.uid(), "rejecting out-of-range priority");
            return;
        }
        if self.base.is_read_only() || self.priority == priority {
            return;
        }
        self.write(Field::Priority, |s| s.priority = priority);
    }

    #[must_use]
    pub const fn status(&self) -> &Status {
        &self.status
    }

    /// Status writes are type-checked by the concrete incidence types; this
    /// is the shared tail they all use.
    pub(crate) fn set_status_unchecked(&mut self, status: Status) {
        if self.base.is_read_only() || self.status == status {
            return;
        }
        self.write(Field::Status, |s| s.status = status);
    }

    #[must_use]
    pub const fn secrecy(&self) -> Secrecy {
        self.secrecy
    }

    pub fn set_secrecy(&mut self, secrecy: Secrecy) {
        if self.base.is_read_only() || self.secrecy == secrecy {
            return;
        }
        self.write(Field::Secrecy, |s| s.secrecy = secrecy);
    }

    #[must_use]
    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    /// True when at least one enabled alarm is present.
    #[must_use]
    pub fn has_enabled_alarms(&self) -> bool {
        self.alarms.iter().any(Alarm::enabled)
    }

    pub fn add_alarm(&mut self, alarm: Alarm) {
        if self.base.is_read_only() {
            return;
        }
        self.write(Field::Alarms, |s| s.alarms.push(alarm));
    }

    pub fn clear_alarms(&mut self) {
        if self.base.is_read_only() || self.alarms.is_empty() {
            return;
        }
        self.write(Field::Alarms, |s| s.alarms.clear());
    }

    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn add_attachment(&mut self, attachment: Attachment) {
        if self.base.is_read_only() {
            return;
        }
        self.write(Field::Attachments, |s| s.attachments.push(attachment));
    }

    pub fn clear_attachments(&mut self) {
        if self.base.is_read_only() || self.attachments.is_empty() {
            return;
        }
        self.write(Field::Attachments, |s| s.attachments.clear());
    }

    #[must_use]
    pub fn conferences(&self) -> &[Conference] {
        &self.conferences
    }

    pub fn add_conference(&mut self, conference: Conference) {
        if self.base.is_read_only() {
            return;
        }
        self.write(Field::Conferences, |s| s.conferences.push(conference));
    }

    pub fn clear_conferences(&mut self) {
        if self.base.is_read_only() || self.conferences.is_empty() {
            return;
        }
        self.write(Field::Conferences, |s| s.conferences.clear());
    }

    /// The uid of the related incidence with the given relation, if any.
    #[must_use]
    pub fn related_to(&self, relation: RelationType) -> Option<&str> {
        self.related_to.get(&relation).map(String::as_str)
    }

    pub fn set_related_to(&mut self, uid: impl Into<String>, relation: RelationType) {
        let uid = uid.into();
        if self.base.is_read_only()
            || self.related_to.get(&relation).is_some_and(|u| *u == uid)
        {
            return;
        }
        self.write(Field::RelatedTo, |s| {
            if uid.is_empty() {
                s.related_to.remove(&relation);
            } else {
                s.related_to.insert(relation, uid);
            }
        });
    }

    #[must_use]
    pub fn has_geo(&self) -> bool {
        self.geo.is_some()
    }

    /// Latitude in degrees, or [`GEO_INVALID`].
    #[must_use]
    pub fn geo_latitude(&self) -> f64 {
        self.geo.map_or(GEO_INVALID, |(lat, _)| lat)
    }

    /// Longitude in degrees, or [`GEO_INVALID`].
    #[must_use]
    pub fn geo_longitude(&self) -> f64 {
        self.geo.map_or(GEO_INVALID, |(_, lon)| lon)
    }

    /// Sets both coordinates. Any out-of-range or non-finite component
    /// clears both.
    pub fn set_geo(&mut self, latitude: f64, longitude: f64) {
        if self.base.is_read_only() {
            return;
        }
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        let geo = valid.then_some((latitude, longitude));
        if !valid && self.geo.is_some() {
            tracing::warn!(latitude, longitude, uid = self.base.uid(), "clearing invalid geo");
        }
        if self.geo == geo {
            return;
        }
        self.write(Field::Geo, |s| s.geo = geo);
    }

    pub fn clear_geo(&mut self) {
        if self.base.is_read_only() || self.geo.is_none() {
            return;
        }
        self.write(Field::Geo, |s| s.geo = None);
    }

    /// The recurrence, if one was ever allocated.
    #[must_use]
    pub fn recurrence(&self) -> Option<&Recurrence> {
        self.recurrence.as_deref()
    }

    /// The recurrence, allocated on first access.
    ///
    /// Obtaining mutable access marks the recurrence field dirty; there is
    /// no back-channel from the recurrence to the incidence.
    pub fn recurrence_mut(&mut self) -> &mut Recurrence {
        let start = self.base.dt_start();
        let all_day = self.base.all_day();
        self.base.set_field_dirty(Field::Recurrence);
        self.recurrence.get_or_insert_with(|| {
            let mut rec = Recurrence::default();
            if let Some(dt) = start {
                rec.set_start(dt);
            }
            rec.set_all_day(all_day);
            Box::new(rec)
        })
    }

    /// True when the incidence has recurrence rules or extra dates.
    #[must_use]
    pub fn recurs(&self) -> bool {
        self.recurrence.as_deref().is_some_and(Recurrence::recurs)
    }

    /// The occurrence this exception instance overrides, if any.
    #[must_use]
    pub const fn recurrence_id(&self) -> Option<CalDateTime> {
        self.recurrence_id
    }

    #[must_use]
    pub fn has_recurrence_id(&self) -> bool {
        self.recurrence_id.is_some()
    }

    pub fn set_recurrence_id(&mut self, recurrence_id: Option<CalDateTime>) {
        if self.base.is_read_only() || self.recurrence_id == recurrence_id {
            return;
        }
        self.write(Field::RecurrenceId, |s| s.recurrence_id = recurrence_id);
    }

    /// True when this exception also replaces every later occurrence.
    #[must_use]
    pub const fn this_and_future(&self) -> bool {
        self.this_and_future
    }

    pub fn set_this_and_future(&mut self, this_and_future: bool) {
        if self.base.is_read_only() || self.this_and_future == this_and_future {
            return;
        }
        self.write(Field::RecurrenceId, |s| s.this_and_future = this_and_future);
    }

    /// The scheduling id used in invitations; falls back to the uid.
    #[must_use]
    pub fn scheduling_id(&self) -> &str {
        if self.scheduling_id.is_empty() {
            self.base.uid()
        } else {
            &self.scheduling_id
        }
    }

    pub fn set_scheduling_id(&mut self, scheduling_id: impl Into<String>) {
        let scheduling_id = scheduling_id.into();
        if self.base.is_read_only() || self.scheduling_id == scheduling_id {
            return;
        }
        self.write(Field::SchedulingId, |s| s.scheduling_id = scheduling_id);
    }

    /// uid plus the ISO-8601 recurrence-id; unique per instance.
    #[must_use]
    pub fn instance_identifier(&self) -> String {
        match self.recurrence_id {
            Some(rid) => format!("{}{}", self.base.uid(), rid),
            None => self.base.uid().to_string(),
        }
    }

    /// Reinterprets naive timestamps carried in `old` into `new`.
    pub fn shift_times(&mut self, old: TimeSpec, new: TimeSpec) {
        self.base.shift_times(old, new);
        if let Some(rid) = self.recurrence_id
            && rid.spec() == old
        {
            self.recurrence_id = Some(rid.reinterpret(new));
        }
        if let Some(rec) = self.recurrence.as_deref_mut() {
            rec.shift_times(old, new);
        }
    }
}

impl Default for IncidenceCommon {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for IncidenceCommon {
    type Target = IncidenceBase;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for IncidenceCommon {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

/// Any calendar incidence.
#[derive(Debug, Clone, PartialEq)]
pub enum Incidence {
    Event(Event),
    Todo(Todo),
    Journal(Journal),
}

impl Incidence {
    #[must_use]
    pub const fn kind(&self) -> IncidenceKind {
        match self {
            Self::Event(_) => IncidenceKind::Event,
            Self::Todo(_) => IncidenceKind::Todo,
            Self::Journal(_) => IncidenceKind::Journal,
        }
    }

    #[must_use]
    pub const fn common(&self) -> &IncidenceCommon {
        match self {
            Self::Event(e) => e.common(),
            Self::Todo(t) => t.common(),
            Self::Journal(j) => j.common(),
        }
    }

    pub fn common_mut(&mut self) -> &mut IncidenceCommon {
        match self {
            Self::Event(e) => e.common_mut(),
            Self::Todo(t) => t.common_mut(),
            Self::Journal(j) => j.common_mut(),
        }
    }

    #[must_use]
    pub const fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_event_mut(&mut self) -> Option<&mut Event> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_todo(&self) -> Option<&Todo> {
        match self {
            Self::Todo(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_todo_mut(&mut self) -> Option<&mut Todo> {
        match self {
            Self::Todo(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_journal(&self) -> Option<&Journal> {
        match self {
            Self::Journal(j) => Some(j),
            _ => None,
        }
    }

    pub fn as_journal_mut(&mut self) -> Option<&mut Journal> {
        match self {
            Self::Journal(j) => Some(j),
            _ => None,
        }
    }

    /// The end of the incidence's own span: dt-end for events, due for
    /// to-dos, the start for journals.
    #[must_use]
    pub fn date_time_end(&self) -> Option<CalDateTime> {
        match self {
            Self::Event(e) => e.effective_dt_end(),
            Self::Todo(t) => t.dt_due(false),
            Self::Journal(j) => j.dt_start(),
        }
    }

    pub fn shift_times(&mut self, old: TimeSpec, new: TimeSpec) {
        match self {
            Self::Event(e) => e.shift_times_event(old, new),
            Self::Todo(t) => t.shift_times_todo(old, new),
            Self::Journal(j) => j.common_mut().shift_times(old, new),
        }
    }
}

impl Deref for Incidence {
    type Target = IncidenceCommon;

    fn deref(&self) -> &Self::Target {
        self.common()
    }
}

impl DerefMut for Incidence {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.common_mut()
    }
}

impl From<Event> for Incidence {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

impl From<Todo> for Incidence {
    fn from(todo: Todo) -> Self {
        Self::Todo(todo)
    }
}

impl From<Journal> for Incidence {
    fn from(journal: Journal) -> Self {
        Self::Journal(journal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_is_all_or_nothing() {
        let mut common = IncidenceCommon::new();
        common.set_geo(48.2, 16.4);
        assert!(common.has_geo());
        common.set_geo(95.0, 16.4); // latitude out of range
        assert!(!common.has_geo());
        assert!((common.geo_latitude() - GEO_INVALID).abs() < f64::EPSILON);
        assert!((common.geo_longitude() - GEO_INVALID).abs() < f64::EPSILON);
        common.set_geo(f64::NAN, 0.0);
        assert!(!common.has_geo());
    }

    #[test]
    fn priority_out_of_range_rejected() {
        let mut common = IncidenceCommon::new();
        common.set_priority(5);
        common.set_priority(12);
        assert_eq!(common.priority(), 5);
        common.set_priority(-1);
        assert_eq!(common.priority(), 5);
    }

    #[test]
    fn scheduling_id_falls_back_to_uid() {
        let mut common = IncidenceCommon::new();
        let uid = common.uid().to_string();
        assert_eq!(common.scheduling_id(), uid);
        common.set_scheduling_id("sched-1");
        assert_eq!(common.scheduling_id(), "sched-1");
    }

    #[test]
    fn instance_identifier_includes_recurrence_id() {
        let mut common = IncidenceCommon::new();
        common.base_mut().set_uid("abc");
        assert_eq!(common.instance_identifier(), "abc");
        common.set_recurrence_id(CalDateTime::utc(2013, 3, 11, 10, 0, 0));
        assert_eq!(common.instance_identifier(), "abc2013-03-11T10:00:00Z");
    }

    #[test]
    fn recurrence_mut_allocates_with_start() {
        let mut common = IncidenceCommon::new();
        let start = CalDateTime::utc(2013, 3, 10, 10, 0, 0).unwrap();
        common.set_dt_start(Some(start));
        common.base_mut().reset_dirty_fields();
        let rec = common.recurrence_mut();
        assert_eq!(rec.start(), Some(start));
        assert!(common.base().field_dirty(Field::Recurrence));
    }

    #[test]
    fn set_dt_start_moves_recurrence() {
        let mut common = IncidenceCommon::new();
        let start = CalDateTime::utc(2013, 3, 10, 10, 0, 0).unwrap();
        common.set_dt_start(Some(start));
        let _ = common.recurrence_mut();
        let moved = CalDateTime::utc(2013, 4, 1, 10, 0, 0).unwrap();
        common.set_dt_start(Some(moved));
        assert_eq!(common.recurrence().unwrap().start(), Some(moved));
    }

    #[test]
    fn rich_text_detection_and_plain_fallback() {
        let mut common = IncidenceCommon::new();
        common.set_summary("<html><b>Big</b> meeting</html>");
        assert!(common.summary_is_rich());
        assert_eq!(common.plain_summary(), "Big meeting");
        common.set_summary("Plain meeting");
        assert!(!common.summary_is_rich());
    }

    #[test]
    fn revision_bumps_on_writes() {
        let mut common = IncidenceCommon::new();
        let before = common.revision();
        common.set_summary("one");
        assert!(common.revision() > before);
    }

    #[test]
    fn status_parse_unknown_is_x() {
        assert_eq!(Status::parse("confirmed"), Status::Confirmed);
        assert_eq!(Status::parse("X-WAITING"), Status::X("X-WAITING".into()));
    }
}
