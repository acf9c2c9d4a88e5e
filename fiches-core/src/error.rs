//! Error types for FICHES operations

use crate::Collection;
use thiserror::Error;

/// Document store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    #[error("Query on {collection} failed: {reason}")]
    QueryFailed { collection: Collection, reason: String },

    #[error("Update of {collection}/{id} failed: {reason}")]
    UpdateFailed {
        collection: Collection,
        id: String,
        reason: String,
    },

    #[error("Cannot decode {collection}/{id}: {reason}")]
    Decode {
        collection: Collection,
        id: String,
        reason: String,
    },

    #[error("Document store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Mailing provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MailError {
    #[error("Mail request for {template_id} failed: {reason}")]
    Transport { template_id: String, reason: String },

    #[error("Mail provider rejected {template_id} with status {status}: {body}")]
    Rejected {
        template_id: String,
        status: u16,
        body: String,
    },

    #[error("Mail request has no recipient")]
    NoRecipient,
}

/// Malformed input errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Sheet {sheet_id} has no related event")]
    MissingRelatedEvent { sheet_id: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all FICHES errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FichesError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl FichesError {
    /// Stable short name of the error family, used as the `error.kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FichesError::Storage(_) => "StorageError",
            FichesError::Mail(_) => "MailError",
            FichesError::Validation(_) => "ValidationError",
            FichesError::Config(_) => "ConfigError",
        }
    }
}

/// Result type alias for FICHES operations.
pub type FichesResult<T> = Result<T, FichesError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            collection: Collection::Sheets,
            id: "s1".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Document not found"));
        assert!(msg.contains("sheets/s1"));
    }

    #[test]
    fn test_mail_error_display_rejected() {
        let err = MailError::Rejected {
            template_id: "map_creation_email".to_string(),
            status: 422,
            body: "unknown template".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("map_creation_email"));
        assert!(msg.contains("422"));
        assert!(msg.contains("unknown template"));
    }

    #[test]
    fn test_validation_error_display_missing_event() {
        let err = ValidationError::MissingRelatedEvent {
            sheet_id: "s9".to_string(),
        };
        assert_eq!(format!("{}", err), "Sheet s9 has no related event");
    }

    #[test]
    fn test_fiches_error_from_variants() {
        let storage = FichesError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, FichesError::Storage(_)));
        assert_eq!(storage.kind(), "StorageError");

        let mail = FichesError::from(MailError::NoRecipient);
        assert!(matches!(mail, FichesError::Mail(_)));
        assert_eq!(mail.kind(), "MailError");

        let validation = FichesError::from(ValidationError::MissingRelatedEvent {
            sheet_id: "s1".to_string(),
        });
        assert_eq!(validation.kind(), "ValidationError");

        let config = FichesError::from(ConfigError::MissingRequired {
            field: "FICHES_MAIL_API_KEY".to_string(),
        });
        assert_eq!(config.kind(), "ConfigError");
    }
}
