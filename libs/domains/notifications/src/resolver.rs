//! Lookup of context entities from a [`NotificationRequest`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Event, NotificationRequest, Question, User};

/// Resolves the entities a request refers to.
///
/// Implementations must be pure lookups and safe to share across
/// concurrent dispatches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Find the user the request is about.
    async fn resolve_user(&self, request: &NotificationRequest) -> Option<User>;

    /// Find the event referenced by the request.
    async fn resolve_event(&self, request: &NotificationRequest) -> Option<Event>;

    /// Find the question referenced by the request.
    async fn resolve_question(&self, request: &NotificationRequest) -> Option<Question>;
}

/// In-memory implementation of EntityResolver (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryEntityResolver {
    users: Arc<RwLock<HashMap<i64, User>>>,
    events: Arc<RwLock<HashMap<i64, Event>>>,
    questions: Arc<RwLock<HashMap<i64, Question>>>,
}

impl InMemoryEntityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn insert_event(&self, event: Event) {
        self.events.write().await.insert(event.id, event);
    }

    pub async fn insert_question(&self, question: Question) {
        self.questions.write().await.insert(question.id, question);
    }
}

#[async_trait]
impl EntityResolver for InMemoryEntityResolver {
    async fn resolve_user(&self, request: &NotificationRequest) -> Option<User> {
        self.users.read().await.get(&request.user_id).cloned()
    }

    async fn resolve_event(&self, request: &NotificationRequest) -> Option<Event> {
        let id = request.event_id?;
        self.events.read().await.get(&id).cloned()
    }

    async fn resolve_question(&self, request: &NotificationRequest) -> Option<Question> {
        let id = request.question_id?;
        self.questions.read().await.get(&id).cloned()
    }
}
