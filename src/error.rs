use std::io;

use thiserror::Error;

/// Everything the timetable core can fail with.
///
/// Validation variants are user-facing and shown as alerts; the rest bubble up from
/// storage or export.
#[derive(Debug, Error)]
pub enum TimetableError {
    #[error("Please enter a subject name")]
    BlankSubject,

    #[error("Please enter a valid number of slots (got {0:?})")]
    InvalidSlotCount(String),

    #[error("Please enter a time as HH:MM (got {0:?})")]
    InvalidTime(String),

    #[error("Time slot {index} does not exist ({len} slots)")]
    SlotOutOfRange { index: usize, len: usize },

    #[error("storage error: {0}")]
    Storage(#[from] io::Error),

    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("export failed: {0}")]
    Export(String),
}

impl TimetableError {
    /// True for errors caused by bad user input rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TimetableError::BlankSubject
                | TimetableError::InvalidSlotCount(_)
                | TimetableError::InvalidTime(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TimetableError>;
