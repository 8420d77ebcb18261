//! SMTP email provider implementation using lettre.
//!
//! Primarily intended for local development against Mailpit/MailHog,
//! though a TLS relay with credentials works as well.

use super::{EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};
use crate::models::DeliveryEnvelope;
use async_trait::async_trait;
use core_config::{env_flag, env_optional, env_or_default, env_parse, ConfigError, FromEnv};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, error, info};

/// SMTP configuration.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Optional for dev servers like Mailpit.
    pub username: Option<String>,
    pub password: Option<String>,
    /// False for local dev servers.
    pub use_tls: bool,
}

impl SmtpConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            username: None,
            password: None,
            use_tls: false,
        }
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_credentials(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username.clone(), password.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

impl FromEnv for SmtpConfig {
    /// Defaults target a local Mailpit on port 1025.
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("SMTP_HOST", "localhost"),
            port: env_parse("SMTP_PORT", 1025u16)?,
            username: env_optional("SMTP_USERNAME"),
            password: env_optional("SMTP_PASSWORD"),
            use_tls: env_flag("SMTP_USE_TLS", false)?,
        })
    }
}

/// SMTP email provider.
pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> NotificationResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self { transport, config })
    }

    fn build_transport(config: &SmtpConfig) -> NotificationResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotificationError::Config(format!("Failed to create SMTP relay: {}", e)))?
                .port(config.port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        if let Some(credentials) = config.credentials() {
            builder = builder.credentials(credentials);
        }

        Ok(builder.build())
    }

    /// Build a single-part HTML message from the envelope.
    fn build_message(envelope: &DeliveryEnvelope) -> NotificationResult<Message> {
        let from: Mailbox = envelope.from.parse()?;
        let to: Mailbox = envelope.to.parse()?;

        let mut builder = Message::builder().from(from).to(to).subject(&envelope.subject);

        for cc in &envelope.cc {
            builder = builder.cc(cc.parse()?);
        }
        for bcc in &envelope.bcc {
            builder = builder.bcc(bcc.parse()?);
        }

        let message = builder
            .header(ContentType::TEXT_HTML)
            .body(envelope.html_body.clone())?;

        Ok(message)
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, envelope: &DeliveryEnvelope) -> NotificationResult<SentEmail> {
        debug!(
            to = %envelope.to,
            subject = %envelope.subject,
            host = %self.config.host,
            port = %self.config.port,
            cc_count = envelope.cc.len(),
            bcc_count = envelope.bcc.len(),
            "Sending email via SMTP"
        );

        let message = Self::build_message(envelope)?;

        let response = self.transport.send(message).await.map_err(|e| {
            error!(to = %envelope.to, error = %e, "Failed to send email via SMTP");
            NotificationError::Transport(format!("SMTP send failed: {}", e))
        })?;

        let message_id = response.message().next().map(|s| s.to_string());

        info!(to = %envelope.to, message_id = ?message_id, "Email accepted by SMTP server");

        Ok(SentEmail { message_id })
    }

    fn name(&self) -> &'static str {
        "SMTP"
    }

    async fn health_check(&self) -> NotificationResult<bool> {
        Ok(self.transport.test_connection().await?)
    }
}
