//! HTTP mail client

use crate::{MailRequest, Mailer, MailerConfig};
use ::async_trait::async_trait;
use fiches_core::{ConfigError, FichesResult, MailError};
use reqwest::Client;

/// Mailer posting JSON requests to the provider's `/send` endpoint.
pub struct HttpMailer {
    client: Client,
    send_url: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(config: &MailerConfig) -> FichesResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "mail client".to_string(),
                value: config.base_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            send_url: format!("{}/send", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_mail(&self, request: &MailRequest) -> FichesResult<()> {
        if request.to.is_empty() {
            return Err(MailError::NoRecipient.into());
        }

        let mut builder = self.client.post(&self.send_url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| MailError::Transport {
            template_id: request.template_id.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                template_id = %request.template_id,
                recipients = request.to.len(),
                status = %status,
                "Mail accepted by provider"
            );
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(MailError::Rejected {
            template_id: request.template_id.clone(),
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

impl std::fmt::Debug for HttpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailer")
            .field("send_url", &self.send_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
