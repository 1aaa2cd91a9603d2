//! Folder record.
//!
//! # Invariants
//! - `parent_id == None` means root level; when set it must reference an
//!   existing folder (enforced at create time, reconciled at load time).
//! - Folders are never renamed or moved in this core; the only mutation is
//!   cascading deletion.

use crate::model::RecordError;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

/// Stable folder identifier.
pub type FolderId = Uuid;

/// A named node in the notes organizational tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    /// Display name; not required to be unique among siblings.
    pub name: String,
    pub parent_id: Option<FolderId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

impl Folder {
    /// Creates a folder with a generated id.
    pub fn new(name: impl Into<String>, parent_id: Option<FolderId>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent_id,
            created_at,
        }
    }

    /// Serializes into the persisted JSON shape.
    pub fn to_record(&self) -> Value {
        json!({
            "id": self.id.to_string(),
            "name": self.name,
            "parentId": self.parent_id.map(|id| id.to_string()),
            "createdAt": self.created_at,
        })
    }

    /// Parses one persisted record.
    ///
    /// Missing `parentId` is normalized to root level; a missing timestamp
    /// defaults to `fallback_created_at`. Missing id or name makes the
    /// record malformed.
    pub fn from_record(value: &Value, fallback_created_at: i64) -> Result<Self, RecordError> {
        let object = value.as_object().ok_or(RecordError::NotAnObject)?;

        let id = required_id(object, "id")?;
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .ok_or(RecordError::MissingField("name"))?;
        if name.trim().is_empty() {
            return Err(RecordError::BlankName);
        }

        let parent_id = match object.get("parentId") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(parse_id_value(raw, "parentId")?),
        };
        let created_at = object
            .get("createdAt")
            .and_then(Value::as_i64)
            .unwrap_or(fallback_created_at);

        Ok(Self {
            id,
            name: name.to_string(),
            parent_id,
            created_at,
        })
    }
}

pub(crate) fn required_id(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Uuid, RecordError> {
    let raw = object.get(field).ok_or(RecordError::MissingField(field))?;
    if raw.is_null() {
        return Err(RecordError::MissingField(field));
    }
    parse_id_value(raw, field)
}

pub(crate) fn parse_id_value(raw: &Value, field: &'static str) -> Result<Uuid, RecordError> {
    raw.as_str()
        .and_then(|text| Uuid::parse_str(text).ok())
        .ok_or_else(|| RecordError::InvalidId {
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::Folder;
    use crate::model::RecordError;
    use serde_json::json;

    #[test]
    fn from_record_normalizes_missing_parent_to_root() {
        let folder = Folder::from_record(
            &json!({"id": "8f9e4c62-3f1a-4a52-9f2d-1c6a0c8b9d01", "name": "Inbox"}),
            42,
        )
        .unwrap();
        assert_eq!(folder.parent_id, None);
        assert_eq!(folder.created_at, 42);
    }

    #[test]
    fn from_record_rejects_missing_name() {
        let err = Folder::from_record(
            &json!({"id": "8f9e4c62-3f1a-4a52-9f2d-1c6a0c8b9d01"}),
            0,
        )
        .unwrap_err();
        assert_eq!(err, RecordError::MissingField("name"));
    }

    #[test]
    fn record_round_trip_preserves_parent_link() {
        let parent = Folder::new("Parent", None, 7);
        let child = Folder::new("Child", Some(parent.id), 9);
        let parsed = Folder::from_record(&child.to_record(), 0).unwrap();
        assert_eq!(parsed, child);
    }
}
