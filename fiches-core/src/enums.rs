//! Enum types for sheet workflow records
//!
//! `SheetCircuit` and `SheetStatus` are read from documents written by other
//! systems, so an unrecognised value must survive a decode/encode cycle
//! instead of failing the whole record. Both keep the raw string in an
//! `Other` variant.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// COLLECTIONS
// ============================================================================

/// Document collections touched by the triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Sheets,
    Events,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Sheets, Collection::Events, Collection::Users];

    /// Collection name as stored in the document database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Sheets => "sheets",
            Collection::Events => "events",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SHEET CIRCUIT
// ============================================================================

/// Production path of a sheet.
///
/// A LONG circuit goes through transcription before the sheet is written,
/// a SHORT circuit goes straight to the sheet maker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SheetCircuit {
    Long,
    Short,
    Other(String),
}

impl SheetCircuit {
    pub fn as_str(&self) -> &str {
        match self {
            SheetCircuit::Long => "LONG",
            SheetCircuit::Short => "SHORT",
            SheetCircuit::Other(raw) => raw,
        }
    }
}

impl FromStr for SheetCircuit {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "LONG" => SheetCircuit::Long,
            "SHORT" => SheetCircuit::Short,
            other => SheetCircuit::Other(other.to_string()),
        })
    }
}

impl From<String> for SheetCircuit {
    fn from(value: String) -> Self {
        match value.as_str() {
            "LONG" => SheetCircuit::Long,
            "SHORT" => SheetCircuit::Short,
            _ => SheetCircuit::Other(value),
        }
    }
}

impl From<SheetCircuit> for String {
    fn from(value: SheetCircuit) -> Self {
        match value {
            SheetCircuit::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SheetCircuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SHEET STATUS
// ============================================================================

/// Stage of a sheet in its production pipeline.
///
/// Only the stages that trigger a notification are named; every other stage
/// is carried through as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SheetStatus {
    /// The recording has been transcribed; a mind map can be drawn.
    Transcripted,
    /// The mind map is done; the sheet can be written.
    Mapped,
    /// The sheet is written and waits for the teacher's validation.
    SheetDone,
    Other(String),
}

impl SheetStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SheetStatus::Transcripted => "TRANSCRIPTED",
            SheetStatus::Mapped => "MAPPED",
            SheetStatus::SheetDone => "SHEET_DONE",
            SheetStatus::Other(raw) => raw,
        }
    }
}

impl FromStr for SheetStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SheetStatus::from(s.to_string()))
    }
}

impl From<String> for SheetStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "TRANSCRIPTED" => SheetStatus::Transcripted,
            "MAPPED" => SheetStatus::Mapped,
            "SHEET_DONE" => SheetStatus::SheetDone,
            _ => SheetStatus::Other(value),
        }
    }
}

impl From<SheetStatus> for String {
    fn from(value: SheetStatus) -> Self {
        match value {
            SheetStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// MAIL TEMPLATES
// ============================================================================

/// Mail templates known by the mailing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailTemplate {
    /// Asks transcripters to transcribe a finished recording.
    TranscriptionCreation,
    /// Asks sheet makers to write a sheet.
    SheetCreation,
    /// Asks teachers to draw the mind map of a transcripted course.
    MapCreation,
    /// Asks teachers to validate a written sheet.
    ValidationCreation,
}

impl MailTemplate {
    pub const ALL: [MailTemplate; 4] = [
        MailTemplate::TranscriptionCreation,
        MailTemplate::SheetCreation,
        MailTemplate::MapCreation,
        MailTemplate::ValidationCreation,
    ];

    /// Template id registered with the mailing provider.
    pub fn template_id(&self) -> &'static str {
        match self {
            MailTemplate::TranscriptionCreation => "transcription_creation_email",
            MailTemplate::SheetCreation => "sheet_creation_email",
            MailTemplate::MapCreation => "map_creation_email",
            MailTemplate::ValidationCreation => "validation_creation_email",
        }
    }
}

impl fmt::Display for MailTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_id())
    }
}
