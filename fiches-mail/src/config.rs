//! Mail provider configuration

use fiches_core::{ConfigError, FichesResult};
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8025/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the mailing provider.
#[derive(Clone, PartialEq)]
pub struct MailerConfig {
    /// Base URL; mails are posted to `{base_url}/send`.
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl MailerConfig {
    /// Load from environment variables.
    ///
    /// Environment variables:
    /// - `FICHES_MAIL_API_URL`: provider base URL (default: http://localhost:8025/api)
    /// - `FICHES_MAIL_API_KEY`: bearer key (optional)
    /// - `FICHES_MAIL_TIMEOUT_SECS`: request timeout (default: 10)
    pub fn from_env() -> FichesResult<Self> {
        let defaults = Self::default();

        let base_url = std::env::var("FICHES_MAIL_API_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);

        let api_key = std::env::var("FICHES_MAIL_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let timeout = match std::env::var("FICHES_MAIL_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                    field: "FICHES_MAIL_TIMEOUT_SECS".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        field: "FICHES_MAIL_TIMEOUT_SECS".to_string(),
                        value: raw,
                        reason: "must be positive".to_string(),
                    }
                    .into());
                }
                Duration::from_secs(secs)
            }
            Err(_) => defaults.timeout,
        };

        Ok(Self {
            base_url,
            api_key,
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}
