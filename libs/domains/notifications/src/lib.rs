//! Notification Dispatcher
//!
//! Turns domain events (a user was deleted, an event is starting, a question
//! was asked, ...) into rendered HTML emails and hands them to an email
//! provider.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   Event Source   │  ← Queue consumer, API handler, scheduler
//! └────────┬─────────┘
//!          │ dispatch(kind, request)
//! ┌────────▼─────────┐
//! │    Dispatcher    │  ← Gate → resolve → filter → render → send
//! └──┬─────┬──────┬──┘
//!    │     │      │
//!    │ ┌───▼────┐ │
//!    │ │Renderer│ │      ← Handlebars, templates loaded once
//!    │ └────────┘ │
//! ┌──▼──────┐ ┌───▼──────────┐
//! │Resolver │ │Email Provider│  ← SendGrid, SMTP
//! └─────────┘ └──────────────┘
//! ```
//!
//! Every failure is contained inside a single dispatch and reported as a
//! [`DispatchOutcome`]; callers never see an error.
//!
//! # Usage
//!
//! ```rust,ignore
//! use notification_dispatcher::{InMemoryEntityResolver, NotificationDispatcher, NotificationRequest};
//!
//! let dispatcher = NotificationDispatcher::from_env(Arc::new(InMemoryEntityResolver::new()))?;
//!
//! let outcome = dispatcher
//!     .send_password_reset(&NotificationRequest::for_user(7))
//!     .await;
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod providers;
pub mod resolver;
pub mod routes;
pub mod templates;

// Re-export commonly used types
pub use config::{NotificationConfig, ProviderConfig};
pub use context::TemplateContext;
pub use dispatcher::NotificationDispatcher;
pub use error::{NotificationError, NotificationResult};
pub use models::{
    DeliveryEnvelope, DispatchOutcome, Entity, Event, EventCategory, EventKind, NotificationRequest,
    Question, User,
};
pub use providers::{provider_from_config, EmailProvider, SendGridProvider, SentEmail, SmtpProvider};
pub use resolver::{EntityResolver, InMemoryEntityResolver};
pub use routes::{ContextProfile, NotificationRoute, Recipient};
pub use templates::{HandlebarsRenderer, TemplateRenderer};
