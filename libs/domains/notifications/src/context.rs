//! Variable model handed to templates.

use serde::Serialize;

use crate::config::NotificationConfig;
use crate::models::{Event, EventCategory, Question, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: EventCategory,
    /// RFC 3339 timestamp.
    pub starts_at: String,
    /// e.g. "Saturday, March 14, 2026 at 09:00 UTC"
    pub starts_at_display: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub text: String,
    pub asked_by: Option<String>,
}

/// Variables for one subject/body pair.
///
/// Absent entities serialize as `null`, so templates can guard on them with
/// `{{#if event}}` even in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateContext {
    pub user: UserView,
    pub event: Option<EventView>,
    pub question: Option<QuestionView>,
    pub support_email: String,
    pub organization_name: String,
    pub site_url: String,
}

impl TemplateContext {
    /// The one construction rule shared by subject and body rendering.
    pub fn build(
        user: &User,
        event: Option<&Event>,
        question: Option<&Question>,
        config: &NotificationConfig,
    ) -> Self {
        Self {
            user: UserView {
                id: user.id,
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                full_name: user.full_name(),
                email: user.email.clone(),
            },
            event: event.map(|event| EventView {
                id: event.id,
                title: event.title.clone(),
                description: event.description.clone(),
                location: event.location.clone(),
                category: event.category,
                starts_at: event.starts_at.to_rfc3339(),
                starts_at_display: event.starts_at.format("%A, %B %-d, %Y at %H:%M UTC").to_string(),
            }),
            question: question.map(|question| QuestionView {
                id: question.id,
                text: question.text.clone(),
                asked_by: question.asked_by.clone(),
            }),
            support_email: config.support_email.clone(),
            organization_name: config.organization_name.clone(),
            site_url: config.site_url.clone(),
        }
    }
}
