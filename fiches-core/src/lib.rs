//! FICHES Core - Domain Types
//!
//! Pure data structures shared by every other crate in the workspace:
//! sheets, events, users, the status/circuit enums that drive mail dispatch,
//! and the error taxonomy. No I/O lives here.

pub mod entities;
pub mod enums;
pub mod error;

pub use entities::{Event, Sheet, TeacherUser, SHEET_SYNC_FIELDS};
pub use enums::{Collection, MailTemplate, SheetCircuit, SheetStatus};
pub use error::{
    ConfigError, FichesError, FichesResult, MailError, StorageError, ValidationError,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Document id of a sheet in the `sheets` collection.
pub type SheetId = String;

/// Value of an event's `id` field (also its document id).
pub type EventId = String;

/// Value of a user's `uid` field.
pub type UserId = String;
