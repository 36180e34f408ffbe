//! Notification dispatch - the fire-and-forget side-effect seam.
//!
//! Pipeline operations must not be delayed by, or fail because of, delivery
//! problems. [`SpawnDispatcher`] therefore persists the notification and
//! invokes the delivery channel inside an independent spawned task started
//! only after the triggering state mutation has committed; the caller never
//! awaits the outcome. Failures on either write are logged at `warn` and
//! swallowed - at-most-once, best-effort, no retry queue.
//!
//! Tests substitute a synchronous recording dispatcher at the same seam (see
//! `test_utils`), which is the whole point of making the seam a trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    entities::Notification,
    errors::Result,
    store::NotificationStore,
};

/// The external delivery capability (email, push, webhook...).
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Delivers one notification to its recipient.
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Delivery channel that only logs. The default when the embedder has not
/// wired a real transport yet.
#[derive(Debug, Default)]
pub struct LogChannel;

#[async_trait]
impl DeliveryChannel for LogChannel {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        debug!(
            recipient = %notification.user_id,
            kind = ?notification.kind,
            title = %notification.title,
            "notification delivered to log channel"
        );
        Ok(())
    }
}

/// Hands a notification to asynchronous, best-effort delivery.
pub trait NotificationDispatcher: Send + Sync {
    /// Fire-and-forget. Must never block or fail the calling operation.
    fn dispatch(&self, notification: Notification);
}

/// Production dispatcher: persist, then deliver, inside `tokio::spawn`.
pub struct SpawnDispatcher {
    store: Arc<dyn NotificationStore>,
    channel: Arc<dyn DeliveryChannel>,
}

impl SpawnDispatcher {
    /// Builds a dispatcher over a notification store and a delivery channel.
    #[must_use]
    pub fn new(store: Arc<dyn NotificationStore>, channel: Arc<dyn DeliveryChannel>) -> Self {
        Self { store, channel }
    }
}

impl NotificationDispatcher for SpawnDispatcher {
    fn dispatch(&self, notification: Notification) {
        let store = Arc::clone(&self.store);
        let channel = Arc::clone(&self.channel);
        tokio::spawn(async move {
            // Persist first so the in-app inbox sees the notification even
            // when the outbound channel is down.
            if let Err(e) = store.create(notification.clone()).await {
                warn!(recipient = %notification.user_id, "failed to store notification: {e}");
            }
            if let Err(e) = channel.deliver(&notification).await {
                warn!(recipient = %notification.user_id, "failed to deliver notification: {e}");
            }
        });
    }
}
