//! Notification entity - A message to exactly one user.
//!
//! Notifications are created only as side effects of pipeline transitions
//! and never mutate pipeline entities. Delivery is best-effort; the stored
//! record is what the in-app inbox reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What triggered the notification.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A lead was assigned to the recipient
    LeadAssigned,
    /// A lead the recipient is responsible for was converted
    LeadConverted,
    /// A task was assigned to the recipient
    TaskAssigned,
    /// A task the recipient created was completed
    TaskCompleted,
    /// A follow-up was scheduled for the recipient
    FollowUpScheduled,
    /// A client was assigned to the recipient
    ClientAssigned,
    /// A sale was assigned to the recipient
    SaleAssigned,
    /// A sale the recipient participates in changed status
    SaleStatusChanged,
}

/// Notification record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier
    pub id: Uuid,
    /// The single recipient
    pub user_id: Uuid,
    /// Trigger tag
    pub kind: NotificationKind,
    /// Short headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Opaque structured context for the transport to render
    pub payload: serde_json::Value,
    /// Read flag, defaults to unread
    pub read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Builds an unread notification stamped now.
    #[must_use]
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            payload,
            read: false,
            created_at: Utc::now(),
        }
    }
}
