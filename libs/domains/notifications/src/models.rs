//! Data models for the notification dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

// ============================================================================
// Notification kinds
// ============================================================================

/// Every notification trigger the dispatcher understands.
///
/// The last four variants are extension points: they are accepted but do not
/// render or deliver anything yet.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    UserDeleted,
    QuizCompleted,
    EventRsvp,
    EventUpcoming,
    EventStarted,
    QuestionAsked,
    EventRegister,
    EventUnregister,
    UserSettingsVerified,
    UserSettingsChanged,
    Invite,
    PasswordReset,
    EventLastMinuteRegistration,
    ResendUserSettingsChange,
    DisplayMessage,
    ReceiveMessage,
    EventCompleted,
}

/// Category of a scheduled event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventCategory {
    GroundSchool,
    Conference,
    Meeting,
    Social,
    #[default]
    Other,
}

/// Context entities a notification may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
    User,
    Event,
    Question,
    /// Recipient address carried on an invite request.
    Invitee,
}

// ============================================================================
// Inbound request
// ============================================================================

/// Reference to the entities a notification is about.
///
/// Produced once per triggering event by an upstream source and consumed
/// by exactly one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Correlation id used in logs.
    pub id: Uuid,
    pub user_id: i64,
    #[serde(default)]
    pub event_id: Option<i64>,
    #[serde(default)]
    pub question_id: Option<i64>,
    /// Address of the person being invited (invite notifications only).
    #[serde(default)]
    pub invitee_email: Option<String>,
}

impl NotificationRequest {
    /// Create a request about a single user.
    pub fn for_user(user_id: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id: None,
            question_id: None,
            invitee_email: None,
        }
    }

    /// Attach an event reference.
    pub fn with_event(mut self, event_id: i64) -> Self {
        self.event_id = Some(event_id);
        self
    }

    /// Attach a question reference.
    pub fn with_question(mut self, question_id: i64) -> Self {
        self.question_id = Some(question_id);
        self
    }

    /// Attach the invitee address.
    pub fn with_invitee(mut self, email: impl Into<String>) -> Self {
        self.invitee_email = Some(email.into());
        self
    }
}

// ============================================================================
// Context entities (read-only)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub category: EventCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub asked_by: Option<String>,
}

// ============================================================================
// Outbound
// ============================================================================

/// Fully rendered email handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryEnvelope {
    pub from: String,
    pub to: String,
    /// Reserved; the dispatcher never populates it.
    pub cc: Vec<String>,
    /// Reserved; the dispatcher never populates it.
    pub bcc: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Why a dispatch did or did not produce an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The global kill-switch is off.
    SkippedDisabled,
    /// The kind is a declared extension point with no behavior yet.
    Unimplemented,
    /// A required entity did not resolve.
    NotFound(Entity),
    /// The event's category does not qualify for this kind.
    CategoryMismatch { category: EventCategory },
    /// Subject or body failed to render.
    RenderFailed { template_id: String, reason: String },
    /// The provider failed the single delivery attempt.
    DeliveryFailed { reason: String },
    /// The provider accepted the email.
    Delivered { message_id: Option<String> },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }

    /// Stable label for logs and dashboards.
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::SkippedDisabled => "skipped_disabled",
            DispatchOutcome::Unimplemented => "unimplemented",
            DispatchOutcome::NotFound(_) => "not_found",
            DispatchOutcome::CategoryMismatch { .. } => "category_mismatch",
            DispatchOutcome::RenderFailed { .. } => "render_failed",
            DispatchOutcome::DeliveryFailed { .. } => "delivery_failed",
            DispatchOutcome::Delivered { .. } => "delivered",
        }
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
