//! Domain records persisted by the durable collections.
//!
//! # Responsibility
//! - Define the canonical folder/note record shapes and their JSON form.
//! - Provide lenient per-record parsing for load-time reconciliation.
//!
//! # Invariants
//! - Record ids are stable and never reused.
//! - The persisted JSON shape uses camelCase field names (`parentId`,
//!   `folderId`, `createdAt`, `updatedAt`).

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod folder;
pub mod note;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

/// Why a persisted record could not be converted into a domain model.
///
/// Load paths drop such records individually instead of aborting the whole
/// load; the variants carry enough detail for the reconciliation log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The stored body is not a JSON object.
    NotAnObject,
    /// A required field is absent (for notes, `folderId` must be present
    /// even when null).
    MissingField(&'static str),
    /// An identifier field holds something that is not a UUID string.
    InvalidId { field: &'static str, value: String },
    /// The folder name is empty after trimming.
    BlankName,
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "record body is not a JSON object"),
            Self::MissingField(field) => write!(f, "record is missing required field `{field}`"),
            Self::InvalidId { field, value } => {
                write!(f, "record field `{field}` holds invalid id `{value}`")
            }
            Self::BlankName => write!(f, "folder name is blank"),
        }
    }
}

impl Error for RecordError {}
