//! FICHES Mail - Transactional Mail Client
//!
//! Notifications are sent through a templated mailing provider: the caller
//! names a template, a recipient list and the template variables. The
//! provider renders and delivers the message.

pub mod client;
pub mod config;

pub use client::HttpMailer;
pub use config::MailerConfig;

use ::async_trait::async_trait;
use fiches_core::FichesResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One templated mail to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailRequest {
    pub template_id: String,
    pub to: Vec<String>,
    pub data: Value,
}

impl MailRequest {
    pub fn new(template_id: impl Into<String>, to: Vec<String>, data: Value) -> Self {
        Self {
            template_id: template_id.into(),
            to,
            data,
        }
    }
}

/// Capability to hand a templated mail to the provider.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Submit one mail. Resolves once the provider has accepted or refused it.
    async fn send_mail(&self, request: &MailRequest) -> FichesResult<()>;
}
