//! Sheet, event and user records
//!
//! Field names follow the documents' camelCase wire format. Documents are
//! written by a front-end that does not always fill them: absent and `null`
//! fields both decode to their default.

use crate::{EventId, SheetCircuit, SheetId, SheetStatus, UserId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Sheet fields overwritten from an event when that event changes.
pub const SHEET_SYNC_FIELDS: [&str; 12] = [
    "course",
    "chapter",
    "university",
    "startDate",
    "endDate",
    "relatedFiles",
    "recorder",
    "transcripter",
    "teacher",
    "sheetMaker",
    "onlineCourse",
    "courseLink",
];

/// Decode `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// SHEET
// ============================================================================

/// A document-production workflow instance, as far as notifications are
/// concerned. Other sheet fields are ignored when decoding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sheet {
    #[serde(deserialize_with = "null_as_default")]
    pub id: SheetId,
    #[serde(deserialize_with = "null_as_default")]
    pub finished: bool,
    pub circuit: Option<SheetCircuit>,
    pub status: Option<SheetStatus>,
    pub course: Option<String>,
    pub chapter: Option<String>,

    // Role assignments
    #[serde(deserialize_with = "null_as_default")]
    pub transcripter: Vec<UserId>,
    #[serde(deserialize_with = "null_as_default")]
    pub sheet_maker: Vec<UserId>,
    #[serde(deserialize_with = "null_as_default")]
    pub teacher: Vec<UserId>,
}

// ============================================================================
// EVENT
// ============================================================================

/// A scheduled course session.
///
/// Only the id is interpreted. Every other field is kept as written, so the
/// values copied onto sheets are the event's own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: EventId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    pub fn new(id: impl Into<EventId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Set one field.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Values written onto every sheet related to this event, keyed by the
    /// names in [`SHEET_SYNC_FIELDS`]. Absent fields are written as `null`.
    pub fn sheet_sync_fields(&self) -> Map<String, Value> {
        SHEET_SYNC_FIELDS
            .iter()
            .map(|field| {
                let value = self.fields.get(*field).cloned().unwrap_or(Value::Null);
                (field.to_string(), value)
            })
            .collect()
    }
}

// ============================================================================
// USERS
// ============================================================================

/// Teacher-side user record, as far as notifications are concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherUser {
    pub uid: UserId,
    pub email: String,
    #[serde(default, rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}
