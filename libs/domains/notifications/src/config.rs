//! Process configuration for the dispatcher.

use core_config::{env_flag, env_optional, env_or_default, env_parse, env_required, ConfigError, FromEnv};
use std::path::PathBuf;
use std::time::Duration;

use crate::providers::{SendGridConfig, SmtpConfig};

/// Which outbound provider to build.
#[derive(Clone, Debug)]
pub enum ProviderConfig {
    SendGrid(SendGridConfig),
    Smtp(SmtpConfig),
}

impl FromEnv for ProviderConfig {
    /// `EMAIL_PROVIDER` selects `sendgrid` (default) or `smtp`.
    fn from_env() -> Result<Self, ConfigError> {
        let provider = env_or_default("EMAIL_PROVIDER", "sendgrid");

        match provider.to_ascii_lowercase().as_str() {
            "sendgrid" => Ok(ProviderConfig::SendGrid(SendGridConfig::from_env()?)),
            "smtp" => Ok(ProviderConfig::Smtp(SmtpConfig::from_env()?)),
            other => Err(ConfigError::InvalidValue {
                key: "EMAIL_PROVIDER".to_string(),
                details: format!("unknown provider '{}'", other),
            }),
        }
    }
}

/// Read-only settings shared by every dispatch.
#[derive(Clone, Debug)]
pub struct NotificationConfig {
    /// Global kill-switch.
    pub enabled: bool,
    pub from_address: String,
    /// Contact address exposed to templates.
    pub support_email: String,
    pub organization_name: String,
    pub site_url: String,
    /// Load templates from here instead of the embedded defaults.
    pub template_dir: Option<PathBuf>,
    pub render_timeout: Duration,
    pub send_timeout: Duration,
}

impl NotificationConfig {
    /// Configuration with defaults and notifications enabled.
    pub fn new(from_address: impl Into<String>) -> Self {
        let from_address = from_address.into();
        Self {
            enabled: true,
            support_email: from_address.clone(),
            from_address,
            organization_name: "Ground School".to_string(),
            site_url: "http://localhost:3000".to_string(),
            template_dir: None,
            render_timeout: Duration::from_millis(2_000),
            send_timeout: Duration::from_millis(10_000),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_support_email(mut self, support_email: impl Into<String>) -> Self {
        self.support_email = support_email.into();
        self
    }

    pub fn with_timeouts(mut self, render_timeout: Duration, send_timeout: Duration) -> Self {
        self.render_timeout = render_timeout;
        self.send_timeout = send_timeout;
        self
    }
}

impl FromEnv for NotificationConfig {
    /// Reads:
    /// - NOTIFICATIONS_ENABLED: defaults to false
    /// - EMAIL_FROM_ADDRESS: required
    /// - SUPPORT_EMAIL: defaults to the from address
    /// - ORGANIZATION_NAME, SITE_URL, TEMPLATE_DIR
    /// - RENDER_TIMEOUT_MS (2000), SEND_TIMEOUT_MS (10000)
    fn from_env() -> Result<Self, ConfigError> {
        let from_address = env_required("EMAIL_FROM_ADDRESS")?;
        let support_email = env_optional("SUPPORT_EMAIL").unwrap_or_else(|| from_address.clone());

        Ok(Self {
            enabled: env_flag("NOTIFICATIONS_ENABLED", false)?,
            from_address,
            support_email,
            organization_name: env_or_default("ORGANIZATION_NAME", "Ground School"),
            site_url: env_or_default("SITE_URL", "http://localhost:3000"),
            template_dir: env_optional("TEMPLATE_DIR").map(PathBuf::from),
            render_timeout: Duration::from_millis(env_parse("RENDER_TIMEOUT_MS", 2_000u64)?),
            send_timeout: Duration::from_millis(env_parse("SEND_TIMEOUT_MS", 10_000u64)?),
        })
    }
}
