//! Journals (RFC 5545 VJOURNAL).

use std::ops::{Deref, DerefMut};

use crate::incidence::{IncidenceCommon, Status};

/// A journal entry: an incidence anchored at its start only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Journal {
    common: IncidenceCommon,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn common(&self) -> &IncidenceCommon {
        &self.common
    }

    pub fn common_mut(&mut self) -> &mut IncidenceCommon {
        &mut self.common
    }

    /// Sets the status; journals accept none, cancelled, draft, final and
    /// X values.
    pub fn set_status(&mut self, status: Status) {
        match status {
            Status::None | Status::Cancelled | Status::Draft | Status::Final | Status::X(_) => {
                self.common.set_status_unchecked(status);
            }
            _ => {
                tracing::warn!(status = %status.as_str(), "invalid status for a journal");
            }
        }
    }
}

impl Deref for Journal {
    type Target = IncidenceCommon;

    fn deref(&self) -> &Self::Target {
        &self.common
    }
}

impl DerefMut for Journal {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.common
    }
}
