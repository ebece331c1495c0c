//! The payload and change-tracking contract shared by every calendar
//! entity.

use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use chrono::Utc;

use crate::attendee::Attendee;
use crate::customproperties::CustomProperties;
use crate::datetime::{CalDateTime, TimeSpec};
use crate::person::Person;

/// A logical attribute tracked by the dirty-field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Uid,
    Organizer,
    DtStart,
    DtEnd,
    DtDue,
    Duration,
    AllDay,
    Attendees,
    Comments,
    Contacts,
    CustomProperties,
    Url,
    Created,
    Revision,
    Summary,
    Description,
    Location,
    Color,
    Categories,
    Resources,
    Priority,
    Status,
    Secrecy,
    Alarms,
    Attachments,
    Conferences,
    RelatedTo,
    Geo,
    Recurrence,
    RecurrenceId,
    SchedulingId,
    Completed,
    PercentComplete,
    Transparency,
    Periods,
}

/// Receives change notifications from an incidence it observes.
///
/// Callbacks run synchronously inside the mutating call; an observer must
/// not mutate the same incidence from within a callback.
pub trait IncidenceObserver {
    /// Called immediately before an observed field changes.
    fn incidence_update(&self, uid: &str) {
        let _ = uid;
    }

    /// Called immediately after an observed field changed.
    fn incidence_updated(&self, uid: &str) {
        let _ = uid;
    }
}

/// The fields shared by incidences and free/busy blocks, plus the
/// change-tracking machinery.
///
/// Every setter follows the same contract: a read-only entity silently
/// discards the write; an unchanged value is not a write at all; otherwise
/// observers see `incidence_update` before the change and
/// `incidence_updated` after it, the field lands in the dirty set, and
/// last-modified is stamped unless the entity is local-only.
#[derive(Debug)]
pub struct IncidenceBase {
    uid: String,
    organizer: Person,
    dt_start: Option<CalDateTime>,
    all_day: bool,
    last_modified: Option<CalDateTime>,
    attendees: Vec<Attendee>,
    comments: Vec<String>,
    contacts: Vec<String>,
    custom_properties: CustomProperties,
    url: String,
    read_only: bool,
    local_only: bool,
    dirty: BTreeSet<Field>,
    observers: Vec<Weak<dyn IncidenceObserver>>,
}

impl IncidenceBase {
    /// A fresh entity with a generated uid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_uid(crate::format::create_unique_uid())
    }

    #[must_use]
    pub fn with_uid(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            organizer: Person::default(),
            dt_start: None,
            all_day: false,
            last_modified: None,
            attendees: Vec::new(),
            comments: Vec::new(),
            contacts: Vec::new(),
            custom_properties: CustomProperties::new(),
            url: String::new(),
            read_only: false,
            local_only: false,
            dirty: BTreeSet::new(),
            observers: Vec::new(),
        }
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn set_uid(&mut self, uid: impl Into<String>) {
        let uid = uid.into();
        if self.read_only || self.uid == uid {
            return;
        }
        self.update();
        self.uid = uid;
        self.set_field_dirty(Field::Uid);
        self.updated();
    }

    #[must_use]
    pub const fn organizer(&self) -> &Person {
        &self.organizer
    }

    pub fn set_organizer(&mut self, organizer: Person) {
        if self.read_only || self.organizer == organizer {
            return;
        }
        self.update();
        self.organizer = organizer;
        self.set_field_dirty(Field::Organizer);
        self.updated();
    }

    #[must_use]
    pub const fn dt_start(&self) -> Option<CalDateTime> {
        self.dt_start
    }

    pub fn set_dt_start(&mut self, dt_start: Option<CalDateTime>) {
        if self.read_only || self.dt_start == dt_start {
            return;
        }
        self.update();
        self.dt_start = dt_start;
        self.set_field_dirty(Field::DtStart);
        self.updated();
    }

    #[must_use]
    pub const fn all_day(&self) -> bool {
        self.all_day
    }

    pub fn set_all_day(&mut self, all_day: bool) {
        if self.read_only || self.all_day == all_day {
            return;
        }
        self.update();
        self.all_day = all_day;
        self.set_field_dirty(Field::AllDay);
        self.updated();
    }

    #[must_use]
    pub const fn last_modified(&self) -> Option<CalDateTime> {
        self.last_modified
    }

    /// Stamps the last-modified time. Not a tracked change in itself.
    pub fn set_last_modified(&mut self, dt: Option<CalDateTime>) {
        self.last_modified = dt;
    }

    #[must_use]
    pub fn attendees(&self) -> &[Attendee] {
        &self.attendees
    }

    pub fn add_attendee(&mut self, attendee: Attendee) {
        if self.read_only {
            return;
        }
        self.update();
        self.attendees.push(attendee);
        self.set_field_dirty(Field::Attendees);
        self.updated();
    }

    pub fn set_attendees(&mut self, attendees: Vec<Attendee>) {
        if self.read_only || self.attendees == attendees {
            return;
        }
        self.update();
        self.attendees = attendees;
        self.set_field_dirty(Field::Attendees);
        self.updated();
    }

    pub fn clear_attendees(&mut self) {
        self.set_attendees(Vec::new());
    }

    /// Finds an attendee by email address.
    #[must_use]
    pub fn attendee_by_mail(&self, email: &str) -> Option<&Attendee> {
        self.attendees.iter().find(|a| a.email() == email)
    }

    #[must_use]
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn add_comment(&mut self, comment: impl Into<String>) {
        if self.read_only {
            return;
        }
        self.update();
        self.comments.push(comment.into());
        self.set_field_dirty(Field::Comments);
        self.updated();
    }

    /// Removes a comment; true when it was present.
    pub fn remove_comment(&mut self, comment: &str) -> bool {
        if self.read_only {
            return false;
        }
        let Some(pos) = self.comments.iter().position(|c| c == comment) else {
            return false;
        };
        self.update();
        self.comments.remove(pos);
        self.set_field_dirty(Field::Comments);
        self.updated();
        true
    }

    pub fn clear_comments(&mut self) {
        if self.read_only || self.comments.is_empty() {
            return;
        }
        self.update();
        self.comments.clear();
        self.set_field_dirty(Field::Comments);
        self.updated();
    }

    #[must_use]
    pub fn contacts(&self) -> &[String] {
        &self.contacts
    }

    pub fn add_contact(&mut self, contact: impl Into<String>) {
        if self.read_only {
            return;
        }
        self.update();
        self.contacts.push(contact.into());
        self.set_field_dirty(Field::Contacts);
        self.updated();
    }

    pub fn clear_contacts(&mut self) {
        if self.read_only || self.contacts.is_empty() {
            return;
        }
        self.update();
        self.contacts.clear();
        self.set_field_dirty(Field::Contacts);
        self.updated();
    }

    #[must_use]
    pub const fn custom_properties(&self) -> &CustomProperties {
        &self.custom_properties
    }

    /// Direct access for codecs populating an entity; bypasses tracking.
    pub fn custom_properties_mut(&mut self) -> &mut CustomProperties {
        &mut self.custom_properties
    }

    pub fn set_custom_property(&mut self, key: &str, value: impl Into<String>) {
        if self.read_only {
            return;
        }
        self.update();
        self.custom_properties.set(key, value);
        self.set_field_dirty(Field::CustomProperties);
        self.updated();
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.read_only || self.url == url {
            return;
        }
        self.update();
        self.url = url;
        self.set_field_dirty(Field::Url);
        self.updated();
    }

    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Local-only entities keep their revision and modification stamps
    /// untouched by writes.
    #[must_use]
    pub const fn is_local_only(&self) -> bool {
        self.local_only
    }

    pub fn set_local_only(&mut self, local_only: bool) {
        self.local_only = local_only;
    }

    #[must_use]
    pub fn dirty_fields(&self) -> &BTreeSet<Field> {
        &self.dirty
    }

    #[must_use]
    pub fn field_dirty(&self, field: Field) -> bool {
        self.dirty.contains(&field)
    }

    pub fn set_field_dirty(&mut self, field: Field) {
        self.dirty.insert(field);
    }

    /// Takes a checkpoint: the dirty set becomes empty.
    pub fn reset_dirty_fields(&mut self) {
        self.dirty.clear();
    }

    pub fn register_observer(&mut self, observer: &Rc<dyn IncidenceObserver>) {
        let weak = Rc::downgrade(observer);
        if !self.observers.iter().any(|o| o.ptr_eq(&weak)) {
            self.observers.push(weak);
        }
    }

    pub fn unregister_observer(&mut self, observer: &Rc<dyn IncidenceObserver>) {
        let weak = Rc::downgrade(observer);
        self.observers.retain(|o| !o.ptr_eq(&weak));
    }

    /// Notifies observers that a change is about to happen.
    pub(crate) fn update(&self) {
        for observer in &self.observers {
            if let Some(observer) = observer.upgrade() {
                observer.incidence_update(&self.uid);
            }
        }
    }

    /// Stamps last-modified (unless local-only) and notifies observers that
    /// a change happened.
    pub(crate) fn updated(&mut self) {
        if !self.local_only {
            self.last_modified = Some(CalDateTime::from_utc(Utc::now()));
        }
        self.observers.retain(|o| o.strong_count() > 0);
        for observer in &self.observers {
            if let Some(observer) = observer.upgrade() {
                observer.incidence_updated(&self.uid);
            }
        }
    }

    /// Reinterprets naive timestamps carried in `old` into `new`.
    pub fn shift_times(&mut self, old: TimeSpec, new: TimeSpec) {
        if let Some(dt) = self.dt_start
            && dt.spec() == old
        {
            self.dt_start = Some(dt.reinterpret(new));
        }
    }
}

impl Default for IncidenceBase {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for IncidenceBase {
    /// A clone is a fresh entity: same payload, no observers, clean dirty
    /// set.
    fn clone(&self) -> Self {
        Self {
            uid: self.uid.clone(),
            organizer: self.organizer.clone(),
            dt_start: self.dt_start,
            all_day: self.all_day,
            last_modified: self.last_modified,
            attendees: self.attendees.clone(),
            comments: self.comments.clone(),
            contacts: self.contacts.clone(),
            custom_properties: self.custom_properties.clone(),
            url: self.url.clone(),
            read_only: self.read_only,
            local_only: self.local_only,
            dirty: BTreeSet::new(),
            observers: Vec::new(),
        }
    }
}

impl PartialEq for IncidenceBase {
    /// Observers and the dirty set are bookkeeping, not payload.
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
            && self.organizer == other.organizer
            && self.dt_start == other.dt_start
            && self.all_day == other.all_day
            && self.last_modified == other.last_modified
            && self.attendees == other.attendees
            && self.comments == other.comments
            && self.contacts == other.contacts
            && self.custom_properties == other.custom_properties
            && self.url == other.url
    }
}
