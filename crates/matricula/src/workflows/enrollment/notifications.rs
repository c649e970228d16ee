use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Actor, EnrollmentStage, StudentId};
use super::repository::RepositoryError;

/// Identifier wrapper for notification rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Document,
    Request,
    Stage,
    General,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Request => "request",
            Self::Stage => "stage",
            Self::General => "general",
        }
    }
}

/// Per-user notification row. `is_read` is the only mutable field and only
/// the owning user may flip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: String,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Storage abstraction for notification rows. `unread_count` must be O(1)
/// against a maintained counter, not a scan; the client polls it.
pub trait NotificationStore: Send + Sync {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError>;

    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError>;

    /// Idempotent: marking an already-read row succeeds without change.
    fn mark_read(&self, id: &NotificationId) -> Result<(), RepositoryError>;

    fn mark_all_read(&self, user_id: &str) -> Result<usize, RepositoryError>;

    fn for_user(&self, user_id: &str) -> Result<Vec<Notification>, RepositoryError>;

    fn unread_count(&self, user_id: &str) -> Result<usize, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification {0} not found")]
    NotFound(String),
    #[error("forbidden")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] RepositoryError),
}

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("ntf-{id:06}"))
}

/// Fans domain events out into per-user notification rows. Writes happen
/// synchronously inside the triggering operation, so delivery is at least
/// once without a retry layer.
pub struct NotificationDispatcher<N> {
    store: Arc<N>,
}

impl<N> NotificationDispatcher<N>
where
    N: NotificationStore + 'static,
{
    pub fn new(store: Arc<N>) -> Self {
        Self { store }
    }

    pub(crate) fn dispatch(
        &self,
        user_id: &str,
        kind: NotificationKind,
        title: String,
        body: String,
        link: Option<String>,
    ) -> Result<Notification, NotificationError> {
        let notification = Notification {
            id: next_notification_id(),
            user_id: user_id.to_string(),
            title,
            body,
            kind,
            link,
            is_read: false,
            created_at: Utc::now(),
        };
        Ok(self.store.insert(notification)?)
    }

    pub(crate) fn stage_changed(
        &self,
        student_id: &StudentId,
        new_stage: EnrollmentStage,
        reverted: bool,
    ) -> Result<Notification, NotificationError> {
        let title = if reverted {
            "Etapa de matrícula revertida".to_string()
        } else {
            "Etapa de matrícula actualizada".to_string()
        };
        let body = format!("Tu proceso de matrícula ahora está en: {}", new_stage.label());
        self.dispatch(
            &student_id.0,
            NotificationKind::Stage,
            title,
            body,
            Some(format!("/enrollment/{}", student_id.0)),
        )
    }

    /// Fails with `Forbidden` when the actor does not own the row. A second
    /// call on an already-read row is a no-op success.
    pub fn mark_as_read(
        &self,
        actor: &Actor,
        id: &NotificationId,
    ) -> Result<(), NotificationError> {
        let notification = self
            .store
            .fetch(id)?
            .ok_or_else(|| NotificationError::NotFound(id.0.clone()))?;

        if notification.user_id != actor.id {
            return Err(NotificationError::Forbidden);
        }

        Ok(self.store.mark_read(id)?)
    }

    /// Bulk variant scoped to the actor's own rows.
    pub fn mark_all_as_read(&self, actor: &Actor) -> Result<usize, NotificationError> {
        Ok(self.store.mark_all_read(&actor.id)?)
    }

    pub fn unread_count(&self, user_id: &str) -> Result<usize, NotificationError> {
        Ok(self.store.unread_count(user_id)?)
    }

    pub fn inbox(&self, user_id: &str) -> Result<Vec<Notification>, NotificationError> {
        Ok(self.store.for_user(user_id)?)
    }
}
