//! Notification read-side - the in-app inbox operations.
//!
//! Notifications are written by the dispatcher; this service only reads them
//! and flips the read flag. Visibility is recipient-or-elevated rather than
//! the ownership rule used by pipeline entities, because a notification has
//! exactly one interested party.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    entities::{Actor, Notification},
    errors::{Error, Result},
    store::NotificationStore,
};

/// Inbox operations over the notification store.
pub struct NotificationService {
    notifications: Arc<dyn NotificationStore>,
}

impl NotificationService {
    /// Builds the service over a notification store.
    #[must_use]
    pub fn new(notifications: Arc<dyn NotificationStore>) -> Self {
        Self { notifications }
    }

    /// All notifications addressed to a user, newest first.
    pub async fn list_for_user(&self, actor: &Actor, user_id: Uuid) -> Result<Vec<Notification>> {
        Self::authorize(actor, user_id)?;
        self.notifications.list_for_user(user_id).await
    }

    /// Number of unread notifications addressed to a user.
    pub async fn unread_count(&self, actor: &Actor, user_id: Uuid) -> Result<u64> {
        Self::authorize(actor, user_id)?;
        self.notifications.count_unread(user_id).await
    }

    /// Marks a notification read. Idempotent.
    pub async fn mark_read(&self, actor: &Actor, id: Uuid) -> Result<Notification> {
        let mut notification = self
            .notifications
            .get(id)
            .await?
            .ok_or(Error::NotFound { entity: "notification", id })?;
        Self::authorize(actor, notification.user_id)?;
        if notification.read {
            return Ok(notification);
        }
        notification.read = true;
        self.notifications.update(notification).await
    }

    fn authorize(actor: &Actor, recipient: Uuid) -> Result<()> {
        if actor.id == recipient || actor.role.is_elevated() {
            Ok(())
        } else {
            Err(Error::Authorization {
                actor: actor.id,
                action: "read",
                entity: "notification",
            })
        }
    }
}
