//! iCalendar (RFC 5545) reading and writing.

pub mod core;
pub mod parse;
pub mod read;
pub mod write;

#[cfg(test)]
mod tests;

use std::rc::Rc;

use koyomi_core::calendar::Calendar;
use koyomi_core::error::{CalendarError, CalendarResult};
use koyomi_core::incidence::Incidence;
use koyomi_core::scheduling::{ITipMethod, ScheduleMessage, ScheduleMessageStatus};

use crate::format::CalFormat;
use crate::ical::core::ComponentKind;
use crate::ical::read::Reader;

/// The iCalendar 2.0 format.
///
/// Loading remembers the METHOD of the last parsed document, so callers
/// can tell scheduling messages from plain calendar files.
#[derive(Debug, Default)]
pub struct ICalFormat {
    loaded_method: ITipMethod,
}

impl ICalFormat {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The METHOD of the most recently loaded document.
    #[must_use]
    pub const fn loaded_method(&self) -> ITipMethod {
        self.loaded_method
    }

    /// Parses a scheduling message: a VCALENDAR with a METHOD and exactly
    /// one transported incidence. The disposition is derived by
    /// comparing revisions against what the calendar already has under
    /// the same scheduling id.
    ///
    /// ## Errors
    /// Fails on empty input, missing METHOD, or when no incidence is
    /// transported.
    pub fn parse_scheduling_message(
        &mut self,
        calendar: &Rc<Calendar>,
        text: &str,
    ) -> CalendarResult<ScheduleMessage> {
        if text.trim().is_empty() {
            return Err(CalendarError::ParseEmptyMessage);
        }
        let root = parse::parse(text).map_err(CalendarError::from)?;
        Reader::check_version(&root)?;

        let method = match root.property_value("METHOD") {
            Some(value) => ITipMethod::parse(value),
            None => return Err(CalendarError::ParseMethodProperty),
        };
        self.loaded_method = method;

        let mut reader = Reader::for_calendar(&root);
        let component = root
            .children
            .iter()
            .find(|c| {
                matches!(
                    c.kind,
                    ComponentKind::Event | ComponentKind::Todo | ComponentKind::Journal
                )
            })
            .ok_or_else(|| {
                CalendarError::ParseNotIncidence("no incidence in scheduling message".into())
            })?;
        let incidence = reader.read_incidence(component)?;

        let status = schedule_status(calendar, &incidence, method);
        Ok(ScheduleMessage::new(incidence, method, status))
    }
}

/// Classifies an incoming scheduling message against local state.
fn schedule_status(
    calendar: &Rc<Calendar>,
    incidence: &Incidence,
    method: ITipMethod,
) -> ScheduleMessageStatus {
    let existing = calendar.incidence_from_scheduling_id(incidence.scheduling_id());
    match method {
        ITipMethod::Publish => match existing {
            None => ScheduleMessageStatus::PublishNew,
            Some(existing) => {
                if existing.borrow().revision() > incidence.revision() {
                    ScheduleMessageStatus::Obsolete
                } else {
                    ScheduleMessageStatus::PublishUpdate
                }
            }
        },
        ITipMethod::Request => match existing {
            None => ScheduleMessageStatus::RequestNew,
            Some(existing) => {
                if existing.borrow().revision() > incidence.revision() {
                    ScheduleMessageStatus::Obsolete
                } else {
                    ScheduleMessageStatus::RequestUpdate
                }
            }
        },
        _ => ScheduleMessageStatus::Unknown,
    }
}

impl CalFormat for ICalFormat {
    /// Loads RFC 5545 text into the calendar.
    fn from_string(&mut self, calendar: &Rc<Calendar>, text: &str) -> CalendarResult<()> {
        if text.trim().is_empty() {
            return Err(CalendarError::ParseEmptyMessage);
        }
        let root = parse::parse(text).map_err(CalendarError::from)?;
        calendar.set_loading(true);
        let result = Reader::populate(&root, calendar);
        calendar.set_loading(false);
        self.loaded_method = result?;
        Ok(())
    }

    /// Emits the calendar as RFC 5545 text.
    fn to_string(&self, calendar: &Rc<Calendar>) -> CalendarResult<String> {
        Ok(write::calendar_to_string(calendar, None))
    }
}
