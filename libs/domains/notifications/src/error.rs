//! Error types for the notification dispatcher.

use crate::models::{Entity, EventCategory};
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Reasons a single dispatch stops before an email goes out.
///
/// Every variant except [`NotificationError::Config`] is an expected outcome
/// of a dispatch; none of them ever escapes `NotificationDispatcher::dispatch`.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Notifications are globally disabled.
    #[error("Notifications are disabled")]
    Disabled,

    /// A required context entity could not be resolved.
    #[error("{0} not found")]
    NotFound(Entity),

    /// The resolved event does not qualify for this notification kind.
    #[error("Event category '{0}' does not qualify for this notification")]
    CategoryMismatch(EventCategory),

    /// Template missing, malformed, or referencing an unbound variable.
    #[error("Template rendering error ({template_id}): {reason}")]
    Render { template_id: String, reason: String },

    /// The email provider rejected or failed the delivery attempt.
    #[error("Email provider error: {0}")]
    Transport(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotificationError {
    pub(crate) fn render(template_id: &str, reason: impl ToString) -> Self {
        NotificationError::Render {
            template_id: template_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Transport(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotificationError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        NotificationError::Transport(format!("SMTP error: {}", err))
    }
}

impl From<lettre::error::Error> for NotificationError {
    fn from(err: lettre::error::Error) -> Self {
        NotificationError::Transport(format!("Failed to build message: {}", err))
    }
}

impl From<lettre::address::AddressError> for NotificationError {
    fn from(err: lettre::address::AddressError) -> Self {
        NotificationError::Transport(format!("Invalid address: {}", err))
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Transport(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for NotificationError {
    fn from(err: std::io::Error) -> Self {
        NotificationError::Config(format!("IO error: {}", err))
    }
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        NotificationError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(NotificationError::NotFound(Entity::Question).to_string(), "question not found");
        assert_eq!(
            NotificationError::CategoryMismatch(EventCategory::Conference).to_string(),
            "Event category 'conference' does not qualify for this notification"
        );
        let err = NotificationError::render("quiz_complete_body", "boom");
        assert_eq!(err.to_string(), "Template rendering error (quiz_complete_body): boom");
    }
}
