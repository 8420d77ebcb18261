//! The notification dispatcher.
//!
//! One generic routine driven by the routing table in [`crate::routes`]:
//! gate, resolve, filter, build context, render subject then body, send.
//! Every failure is contained and surfaced as a [`DispatchOutcome`].

use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

use core_config::FromEnv;

use crate::config::{NotificationConfig, ProviderConfig};
use crate::context::TemplateContext;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{DeliveryEnvelope, DispatchOutcome, Entity, EventKind, NotificationRequest};
use crate::providers::{provider_from_config, EmailProvider};
use crate::resolver::EntityResolver;
use crate::routes::Recipient;
use crate::templates::{HandlebarsRenderer, TemplateRenderer};

/// Turns notification requests into delivered emails.
///
/// Holds only read-only state, so a single instance can serve concurrent
/// dispatches as long as its collaborators are `Send + Sync`.
#[derive(Clone)]
pub struct NotificationDispatcher {
    config: Arc<NotificationConfig>,
    resolver: Arc<dyn EntityResolver>,
    renderer: Arc<dyn TemplateRenderer>,
    provider: Arc<dyn EmailProvider>,
}

impl NotificationDispatcher {
    pub fn new(
        config: NotificationConfig,
        resolver: Arc<dyn EntityResolver>,
        renderer: Arc<dyn TemplateRenderer>,
        provider: Arc<dyn EmailProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            resolver,
            renderer,
            provider,
        }
    }

    /// Wire a dispatcher from environment configuration.
    ///
    /// Templates are loaded once here, from `TEMPLATE_DIR` when set and the
    /// embedded defaults otherwise.
    pub fn from_env(resolver: Arc<dyn EntityResolver>) -> NotificationResult<Self> {
        let config = NotificationConfig::from_env()?;
        let provider = provider_from_config(&ProviderConfig::from_env()?)?;
        let renderer = match &config.template_dir {
            Some(dir) => HandlebarsRenderer::from_directory(dir)?,
            None => HandlebarsRenderer::with_defaults()?,
        };

        info!(
            enabled = config.enabled,
            provider = provider.name(),
            template_dir = ?config.template_dir,
            "Notification dispatcher configured"
        );

        Ok(Self::new(config, resolver, Arc::new(renderer), provider))
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    /// Run one dispatch to completion. Never fails; the outcome says why
    /// an email did or did not go out.
    #[instrument(
        skip(self, kind, request),
        fields(kind = %kind, request_id = %request.id, user_id = request.user_id)
    )]
    pub async fn dispatch(&self, kind: EventKind, request: &NotificationRequest) -> DispatchOutcome {
        let outcome = match self.try_dispatch(kind, request).await {
            Ok(outcome) => outcome,
            Err(err) => outcome_for(err),
        };

        match &outcome {
            DispatchOutcome::Delivered { message_id } => {
                info!(message_id = ?message_id, outcome = %outcome, "Notification delivered");
            }
            DispatchOutcome::SkippedDisabled
            | DispatchOutcome::Unimplemented
            | DispatchOutcome::CategoryMismatch { .. } => {
                debug!(outcome = %outcome, "Notification skipped");
            }
            DispatchOutcome::NotFound(entity) => {
                warn!(entity = %entity, outcome = %outcome, "Notification context did not resolve");
            }
            DispatchOutcome::RenderFailed { template_id, reason } => {
                warn!(template_id = %template_id, reason = %reason, outcome = %outcome, "Notification template failed to render");
            }
            DispatchOutcome::DeliveryFailed { reason } => {
                error!(reason = %reason, outcome = %outcome, "Notification delivery failed");
            }
        }

        outcome
    }

    async fn try_dispatch(
        &self,
        kind: EventKind,
        request: &NotificationRequest,
    ) -> NotificationResult<DispatchOutcome> {
        if !self.config.enabled {
            return Err(NotificationError::Disabled);
        }

        let Some(route) = kind.route() else {
            return Ok(DispatchOutcome::Unimplemented);
        };

        let user = self
            .resolver
            .resolve_user(request)
            .await
            .ok_or(NotificationError::NotFound(Entity::User))?;

        let event = if route.requires.needs_event() {
            let event = self
                .resolver
                .resolve_event(request)
                .await
                .ok_or(NotificationError::NotFound(Entity::Event))?;
            Some(event)
        } else {
            None
        };

        let question = if route.requires.needs_question() {
            let question = self
                .resolver
                .resolve_question(request)
                .await
                .ok_or(NotificationError::NotFound(Entity::Question))?;
            Some(question)
        } else {
            None
        };

        if let (Some(required), Some(event)) = (route.category_filter, &event) {
            if event.category != required {
                return Err(NotificationError::CategoryMismatch(event.category));
            }
        }

        let to = match route.recipient {
            Recipient::User => user.email.clone(),
            Recipient::Invitee => request
                .invitee_email
                .as_deref()
                .map(str::trim)
                .filter(|email| !email.is_empty())
                .map(str::to_string)
                .ok_or(NotificationError::NotFound(Entity::Invitee))?,
        };

        let context = TemplateContext::build(&user, event.as_ref(), question.as_ref(), &self.config);

        let subject = self.render(route.subject_template, &context).await?;
        let html_body = self.render(route.body_template, &context).await?;

        let envelope = DeliveryEnvelope {
            from: self.config.from_address.clone(),
            to,
            subject: subject.trim().to_string(),
            html_body,
            ..Default::default()
        };

        let sent = timeout(self.config.send_timeout, self.provider.send(&envelope))
            .await
            .map_err(|_| {
                NotificationError::Transport(format!(
                    "{} send timed out after {:?}",
                    self.provider.name(),
                    self.config.send_timeout
                ))
            })??;

        Ok(DispatchOutcome::Delivered {
            message_id: sent.message_id,
        })
    }

    async fn render(&self, template_id: &str, context: &TemplateContext) -> NotificationResult<String> {
        timeout(self.config.render_timeout, self.renderer.render(template_id, context))
            .await
            .map_err(|_| {
                NotificationError::render(
                    template_id,
                    format!("timed out after {:?}", self.config.render_timeout),
                )
            })?
    }

    // ------------------------------------------------------------------
    // One entry point per kind
    // ------------------------------------------------------------------

    pub async fn send_user_delete(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::UserDeleted, request).await
    }

    pub async fn send_quiz_complete(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::QuizCompleted, request).await
    }

    pub async fn send_event_rsvp(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::EventRsvp, request).await
    }

    pub async fn send_event_upcoming(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::EventUpcoming, request).await
    }

    pub async fn send_event_start(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::EventStarted, request).await
    }

    pub async fn send_question_asked(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::QuestionAsked, request).await
    }

    pub async fn send_event_register(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::EventRegister, request).await
    }

    pub async fn send_event_unregister(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::EventUnregister, request).await
    }

    pub async fn send_user_settings_verified(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::UserSettingsVerified, request).await
    }

    pub async fn send_user_settings_change(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::UserSettingsChanged, request).await
    }

    /// Addressed to `request.invitee_email`, not the inviting user.
    pub async fn send_invite(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::Invite, request).await
    }

    pub async fn send_password_reset(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::PasswordReset, request).await
    }

    pub async fn send_event_last_min_registration(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::EventLastMinuteRegistration, request).await
    }

    /// Extension point. Never sends.
    pub async fn resend_user_settings_change(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::ResendUserSettingsChange, request).await
    }

    /// Extension point. Never sends.
    pub async fn send_display(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::DisplayMessage, request).await
    }

    /// Extension point. Never sends.
    pub async fn send_event_completed(&self, request: &NotificationRequest) -> DispatchOutcome {
        self.dispatch(EventKind::EventCompleted, request).await
    }

    /// Inbound message hook. Logs the request and produces no reply.
    #[instrument(skip(self, request), fields(request_id = %request.id, user_id = request.user_id))]
    pub async fn receive_message(&self, request: &NotificationRequest) -> Option<String> {
        info!(
            kind = %EventKind::ReceiveMessage,
            event_id = ?request.event_id,
            question_id = ?request.question_id,
            invitee_email = ?request.invitee_email,
            "Received message"
        );
        None
    }
}

fn outcome_for(err: NotificationError) -> DispatchOutcome {
    match err {
        NotificationError::Disabled => DispatchOutcome::SkippedDisabled,
        NotificationError::NotFound(entity) => DispatchOutcome::NotFound(entity),
        NotificationError::CategoryMismatch(category) => DispatchOutcome::CategoryMismatch { category },
        NotificationError::Render { template_id, reason } => {
            DispatchOutcome::RenderFailed { template_id, reason }
        }
        NotificationError::Transport(reason) | NotificationError::Config(reason) => {
            DispatchOutcome::DeliveryFailed { reason }
        }
    }
}
