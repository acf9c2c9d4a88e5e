//! Constants for the FICHES API
//!
//! Centralizing constants makes them easy to find, modify, and test.

// ============================================================================
// SERVER
// ============================================================================

/// Default bind host
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

// ============================================================================
// CORS
// ============================================================================

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// NOTIFICATIONS
// ============================================================================

/// Base of the sheet page link put in notification mails; the sheet id is appended.
pub const DEFAULT_SHEET_BASE_URL: &str = "https://fiches.diploma-sante.fr/sheets/";

// ============================================================================
// DOCUMENT FIELDS
// ============================================================================

/// Sheet field holding the ids of related events.
pub const RELATED_EVENTS_FIELD: &str = "relatedEventsIds";

/// Event field matched by the backfill lookup.
pub const EVENT_ID_FIELD: &str = "id";

/// User field matched by the recipient lookup.
pub const USER_UID_FIELD: &str = "uid";

/// Start date on an event, copied by the backfill.
pub const EVENT_START_FIELD: &str = "startDate";

/// End date on an event, copied by the backfill.
pub const EVENT_END_FIELD: &str = "endDate";

/// Denormalized event start date on a sheet.
pub const EVENT_START_DATE_FIELD: &str = "eventStartDate";

/// Denormalized event end date on a sheet.
pub const EVENT_END_DATE_FIELD: &str = "eventEndDate";
