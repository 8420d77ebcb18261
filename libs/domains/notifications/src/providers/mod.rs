//! Outbound email providers.
//!
//! This module contains the `EmailProvider` trait and implementations
//! for SendGrid (production) and SMTP (local development).

mod sendgrid;
mod smtp;

pub use sendgrid::{SendGridConfig, SendGridProvider};
pub use smtp::{SmtpConfig, SmtpProvider};

use crate::config::ProviderConfig;
use crate::error::NotificationResult;
use crate::models::DeliveryEnvelope;
use async_trait::async_trait;
use std::sync::Arc;

/// Provider acknowledgement for an accepted email.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SentEmail {
    /// Provider-specific message ID for tracking.
    pub message_id: Option<String>,
}

/// Trait for email sending providers.
///
/// `send` makes exactly one delivery attempt. Failures surface as
/// `NotificationError::Transport`; retrying is the caller's business.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an email.
    async fn send(&self, envelope: &DeliveryEnvelope) -> NotificationResult<SentEmail>;

    /// Get the provider name for logging.
    fn name(&self) -> &'static str;

    /// Check if the provider is healthy/configured.
    async fn health_check(&self) -> NotificationResult<bool>;
}

/// Build the provider selected by configuration.
pub fn provider_from_config(config: &ProviderConfig) -> NotificationResult<Arc<dyn EmailProvider>> {
    let provider: Arc<dyn EmailProvider> = match config {
        ProviderConfig::SendGrid(sendgrid) => Arc::new(SendGridProvider::new(sendgrid.clone())),
        ProviderConfig::Smtp(smtp) => Arc::new(SmtpProvider::new(smtp.clone())?),
    };
    Ok(provider)
}
