//! API Configuration Module
//!
//! Configuration for CORS, the notification link base and the outbound mail
//! provider. Loaded from environment variables with defaults suited to
//! local development.

use crate::constants::{DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_SHEET_BASE_URL};
use fiches_core::{ConfigError, FichesResult};
use fiches_mail::MailerConfig;

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// Runtime configuration of the trigger service.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means any origin; the request origin is echoed back.
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Prefix of the sheet link in notification mails.
    pub sheet_base_url: String,

    pub environment: Environment,

    pub mail: MailerConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            sheet_base_url: DEFAULT_SHEET_BASE_URL.to_string(),
            environment: Environment::Development,
            mail: MailerConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `FICHES_CORS_ORIGINS`: Comma-separated allowed origins (empty = any origin)
    /// - `FICHES_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `FICHES_SHEET_BASE_URL`: Sheet link prefix (default: https://fiches.diploma-sante.fr/sheets/)
    /// - `FICHES_ENVIRONMENT`: "production" or "development" (default: development)
    /// - `FICHES_MAIL_*`: see [`MailerConfig::from_env`]
    pub fn from_env() -> FichesResult<Self> {
        let cors_origins = std::env::var("FICHES_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("FICHES_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CORS_MAX_AGE_SECS);

        let sheet_base_url = std::env::var("FICHES_SHEET_BASE_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SHEET_BASE_URL.to_string());

        let environment = std::env::var("FICHES_ENVIRONMENT")
            .map(|s| Environment::parse(&s))
            .unwrap_or(Environment::Development);

        let config = Self {
            cors_origins,
            cors_max_age_secs,
            sheet_base_url,
            environment,
            mail: MailerConfig::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check settings that have no usable default.
    pub fn validate(&self) -> FichesResult<()> {
        if self.is_production() && self.mail.api_key.is_none() {
            return Err(ConfigError::MissingRequired {
                field: "FICHES_MAIL_API_KEY".to_string(),
            }
            .into());
        }
        if !self.sheet_base_url.starts_with("http://") && !self.sheet_base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "FICHES_SHEET_BASE_URL".to_string(),
                value: self.sheet_base_url.clone(),
                reason: "must be an http(s) URL".to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}
