//! Note record.
//!
//! # Invariants
//! - `folder_id == None` is a legacy "unfiled" state; the creation path
//!   always requires a folder.
//! - `content` is opaque text to this core; embedded-image reference
//!   markers produced elsewhere pass through untouched.
//! - `updated_at` is refreshed on every successful save.

use crate::model::folder::{parse_id_value, required_id, FolderId};
use crate::model::RecordError;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Stable note identifier.
pub type NoteId = Uuid;

/// Title substituted when a note is saved with an empty title.
pub const UNTITLED_TITLE: &str = "Untitled Note";

/// A titled free-text document owned by at most one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub folder_id: Option<FolderId>,
    pub title: String,
    pub content: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms timestamp of the last successful save.
    pub updated_at: i64,
}

impl Note {
    /// Creates a fresh note in `folder_id` with the placeholder title.
    pub fn new(folder_id: FolderId, now: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            folder_id: Some(folder_id),
            title: UNTITLED_TITLE.to_string(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Serializes into the persisted JSON shape.
    pub fn to_record(&self) -> Value {
        json!({
            "id": self.id.to_string(),
            "folderId": self.folder_id.map(|id| id.to_string()),
            "title": self.title,
            "content": self.content,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        })
    }

    /// Parses one persisted record.
    ///
    /// `folderId` must be present as a field even when null; records without
    /// it (or without an id) are malformed. Title and content default to the
    /// placeholder and empty text, timestamps default to `fallback_now`.
    pub fn from_record(value: &Value, fallback_now: i64) -> Result<Self, RecordError> {
        let object = value.as_object().ok_or(RecordError::NotAnObject)?;

        let id = required_id(object, "id")?;
        let folder_id = match object.get("folderId") {
            None => return Err(RecordError::MissingField("folderId")),
            Some(Value::Null) => None,
            Some(raw) => Some(parse_id_value(raw, "folderId")?),
        };

        let title = object
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| UNTITLED_TITLE.to_string());
        let content = object
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let created_at = object
            .get("createdAt")
            .and_then(Value::as_i64)
            .unwrap_or(fallback_now);
        let updated_at = object
            .get("updatedAt")
            .and_then(Value::as_i64)
            .unwrap_or(fallback_now);

        Ok(Self {
            id,
            folder_id,
            title,
            content,
            created_at,
            updated_at,
        })
    }
}

/// Normalizes a user-supplied title: trimmed, placeholder when empty.
pub fn effective_title(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNTITLED_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}
