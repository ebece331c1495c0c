//! Format and storage collaborator contracts.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use koyomi_core::calendar::Calendar;
use koyomi_core::error::{CalendarError, CalendarResult};

/// A calendar wire format: text in, text out.
pub trait CalFormat {
    /// Loads serialized calendar data into the calendar.
    ///
    /// ## Errors
    /// Returns the parse error; the calendar keeps whatever was loaded
    /// before the failing element.
    fn from_string(&mut self, calendar: &Rc<Calendar>, text: &str) -> CalendarResult<()>;

    /// Serializes the calendar.
    ///
    /// ## Errors
    /// Returns an error for formats without write support.
    fn to_string(&self, calendar: &Rc<Calendar>) -> CalendarResult<String>;
}

/// A storage backend driven by the user: open, load, save, close.
pub trait CalStorage {
    /// ## Errors
    /// Returns an error when the resource cannot be opened.
    fn open(&mut self) -> CalendarResult<()>;

    /// ## Errors
    /// Returns an error when loading fails.
    fn load(&mut self) -> CalendarResult<()>;

    /// ## Errors
    /// Returns an error when saving fails.
    fn save(&mut self) -> CalendarResult<()>;

    /// ## Errors
    /// Returns an error when closing fails.
    fn close(&mut self) -> CalendarResult<()>;

    /// The calendar this storage feeds.
    fn calendar(&self) -> &Rc<Calendar>;
}

/// Single-file storage with a pluggable format (iCalendar by default).
///
/// Saving goes through a temp file in the same directory followed by a
/// rename, so a failed save leaves the previous file intact.
pub struct FileStorage {
    calendar: Rc<Calendar>,
    path: PathBuf,
    format: Box<dyn CalFormat>,
}

impl FileStorage {
    #[must_use]
    pub fn new(calendar: Rc<Calendar>, path: impl Into<PathBuf>) -> Self {
        Self {
            calendar,
            path: path.into(),
            format: Box::new(crate::ical::ICalFormat::new()),
        }
    }

    #[must_use]
    pub fn with_format(
        calendar: Rc<Calendar>,
        path: impl Into<PathBuf>,
        format: Box<dyn CalFormat>,
    ) -> Self {
        Self {
            calendar,
            path: path.into(),
            format,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalStorage for FileStorage {
    fn open(&mut self) -> CalendarResult<()> {
        Ok(())
    }

    fn load(&mut self) -> CalendarResult<()> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| CalendarError::Load(format!("{}: {e}", self.path.display())))?;
        match self.format.from_string(&self.calendar, &text) {
            Ok(()) => Ok(()),
            // A 1.0 file behind an iCalendar default gets the legacy parser.
            Err(CalendarError::CalVersion1) => {
                let mut vcal = crate::vcal::VCalFormat::new();
                vcal.from_string(&self.calendar, &text)
            }
            Err(err) => Err(err),
        }
    }

    fn save(&mut self) -> CalendarResult<()> {
        let text = self.format.to_string(&self.calendar)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, text.as_bytes())
            .map_err(|e| CalendarError::SaveErrorOpenFile(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| CalendarError::SaveErrorSaveFile(format!("{}: {e}", self.path.display())))?;
        self.calendar.set_modified(false);
        Ok(())
    }

    fn close(&mut self) -> CalendarResult<()> {
        Ok(())
    }

    fn calendar(&self) -> &Rc<Calendar> {
        &self.calendar
    }
}
