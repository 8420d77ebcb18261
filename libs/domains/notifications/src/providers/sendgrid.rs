//! SendGrid email provider implementation.

use super::{EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use crate::models::DeliveryEnvelope;
use async_trait::async_trait;
use core_config::{env_or_default, env_required, ConfigError, FromEnv};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

const DEFAULT_API_URL: &str = "https://api.sendgrid.com/v3";

/// SendGrid API configuration.
#[derive(Clone)]
pub struct SendGridConfig {
    /// SendGrid API key.
    pub api_key: String,
    /// SendGrid API base URL (defaults to production).
    pub api_url: String,
}

impl SendGridConfig {
    /// Create a new SendGrid configuration.
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the client at a different API root (sandboxes, tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl std::fmt::Debug for SendGridConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridConfig")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl FromEnv for SendGridConfig {
    /// Requires SENDGRID_API_KEY; SENDGRID_API_URL is optional.
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("SENDGRID_API_KEY")?;
        Ok(Self::new(api_key).with_api_url(env_or_default("SENDGRID_API_URL", DEFAULT_API_URL)))
    }
}

/// SendGrid email provider.
pub struct SendGridProvider {
    config: SendGridConfig,
    client: Client,
}

impl SendGridProvider {
    /// Create a new SendGrid provider.
    pub fn new(config: SendGridConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }
}

// SendGrid API request/response structures

#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: EmailAddress<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<EmailAddress<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<EmailAddress<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<EmailAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    errors: Vec<SendGridErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorDetail {
    message: String,
}

fn addresses(list: &[String]) -> Vec<EmailAddress<'_>> {
    list.iter().map(|email| EmailAddress { email }).collect()
}

fn build_request(envelope: &DeliveryEnvelope) -> SendGridRequest<'_> {
    SendGridRequest {
        personalizations: vec![Personalization {
            to: vec![EmailAddress { email: &envelope.to }],
            cc: addresses(&envelope.cc),
            bcc: addresses(&envelope.bcc),
        }],
        from: EmailAddress { email: &envelope.from },
        subject: &envelope.subject,
        content: vec![Content {
            content_type: "text/html",
            value: &envelope.html_body,
        }],
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, envelope: &DeliveryEnvelope) -> NotificationResult<SentEmail> {
        let request = build_request(envelope);

        debug!(
            from = %envelope.from,
            to = %envelope.to,
            subject = %envelope.subject,
            "Sending email via SendGrid"
        );

        let response = self
            .client
            .post(format!("{}/mail/send", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status.is_success() {
            info!(
                to = %envelope.to,
                message_id = ?message_id,
                "Email accepted by SendGrid"
            );
            return Ok(SentEmail { message_id });
        }

        let error_body = response.text().await.unwrap_or_default();
        error!(
            to = %envelope.to,
            status = %status,
            error = %error_body,
            "SendGrid rejected email"
        );

        let error_message = match serde_json::from_str::<SendGridError>(&error_body) {
            Ok(sg_error) => sg_error
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join(", "),
            Err(_) => error_body,
        };

        Err(NotificationError::Transport(format!(
            "SendGrid error ({}): {}",
            status, error_message
        )))
    }

    fn name(&self) -> &'static str {
        "SendGrid"
    }

    async fn health_check(&self) -> NotificationResult<bool> {
        // No dedicated health endpoint; validate the key shape instead.
        if self.config.api_key.starts_with("SG.") {
            Ok(true)
        } else {
            Err(NotificationError::Config(
                "Invalid SendGrid API key format".to_string(),
            ))
        }
    }
}
