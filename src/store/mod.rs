//! Entity store ports - the abstract persistence contract the pipelines
//! depend on.
//!
//! Persistence is an external collaborator: the pipelines hold
//! `Arc<dyn EntityStore<T>>` and never touch a database directly. Each
//! operation re-reads the current record before mutating it and writes the
//! full updated record back. Two concurrent writers to the same record can
//! therefore race; the contract is last-write-wins at the store boundary.
//! Implementations wanting stronger guarantees should add a version check in
//! `update` and surface the mismatch as [`crate::errors::Error::Store`].

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    entities::{Client, InventoryUnit, Lead, Notification, Sale, Task, User},
    errors::Result,
};

pub use memory::{MemoryNotificationStore, MemoryStore};

/// The record surface the policy evaluator and store filters need.
///
/// Implemented by every pipeline entity; the defaults cover entities without
/// an assignee, status or due date.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Entity kind label used in errors and logs, e.g. `"lead"`.
    const KIND: &'static str;

    /// Unique identifier.
    fn id(&self) -> Uuid;

    /// The user who created the record.
    fn created_by(&self) -> Uuid;

    /// Creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;

    /// The user currently responsible for the record.
    fn assigned_to(&self) -> Option<Uuid> {
        None
    }

    /// Further users with owner-equivalent visibility (e.g. the salesperson
    /// and manager on a sale).
    fn stakeholders(&self) -> Vec<Uuid> {
        Vec::new()
    }

    /// Stable status label, when the entity has a lifecycle status.
    fn status_label(&self) -> Option<&'static str> {
        None
    }

    /// Due timestamp, when the entity has one.
    fn due_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Case-insensitive free-text match over the record's headline fields.
    fn matches_text(&self, _needle: &str) -> bool {
        false
    }
}

/// Filter accepted by [`EntityStore::list`] and [`EntityStore::count`].
///
/// Exact matching semantics belong to the store implementation;
/// [`ListFilter::matches`] is the reference semantics the in-memory store
/// applies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListFilter {
    /// Keep records whose status label equals this value
    pub status: Option<String>,
    /// Keep records assigned to this user
    pub assigned_to: Option<Uuid>,
    /// Keep records created by this user
    pub created_by: Option<Uuid>,
    /// Keep records created at or after this instant
    pub created_after: Option<DateTime<Utc>>,
    /// Keep records created before this instant
    pub created_before: Option<DateTime<Utc>>,
    /// Keep records due strictly before this instant (drops records with no due date)
    pub due_before: Option<DateTime<Utc>>,
    /// Keep records matching this free-text needle
    pub text: Option<String>,
}

impl ListFilter {
    /// Reference filtering semantics over the [`Entity`] surface.
    #[must_use]
    pub fn matches<T: Entity>(&self, record: &T) -> bool {
        if let Some(status) = &self.status
            && record.status_label() != Some(status.as_str())
        {
            return false;
        }
        if let Some(assignee) = self.assigned_to
            && record.assigned_to() != Some(assignee)
        {
            return false;
        }
        if let Some(creator) = self.created_by
            && record.created_by() != creator
        {
            return false;
        }
        if let Some(after) = self.created_after
            && record.created_at() < after
        {
            return false;
        }
        if let Some(before) = self.created_before
            && record.created_at() >= before
        {
            return false;
        }
        if let Some(due_before) = self.due_before {
            match record.due_at() {
                Some(due) if due < due_before => {}
                _ => return false,
            }
        }
        if let Some(text) = &self.text
            && !record.matches_text(text)
        {
            return false;
        }
        true
    }
}

/// Abstract persistence contract, one instantiation per entity type.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Persists a new record. The record's id is already set by the caller.
    async fn create(&self, record: T) -> Result<T>;

    /// Fetches a record by id, `None` when it does not exist.
    async fn get(&self, id: Uuid) -> Result<Option<T>>;

    /// Overwrites an existing record (last-write-wins; see module docs).
    /// Fails with [`crate::errors::Error::NotFound`] when the id is unknown.
    async fn update(&self, record: T) -> Result<T>;

    /// Removes a record by id.
    /// Fails with [`crate::errors::Error::NotFound`] when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Lists records matching the filter, newest first.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<T>>;

    /// Counts records matching the filter.
    async fn count(&self, filter: &ListFilter) -> Result<u64>;
}

/// Persistence contract for notifications, addressed per recipient.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persists a new notification.
    async fn create(&self, notification: Notification) -> Result<Notification>;

    /// Fetches a notification by id.
    async fn get(&self, id: Uuid) -> Result<Option<Notification>>;

    /// Overwrites an existing notification (read-flag changes).
    async fn update(&self, notification: Notification) -> Result<Notification>;

    /// All notifications addressed to a user, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>>;

    /// Number of unread notifications addressed to a user.
    async fn count_unread(&self, user_id: Uuid) -> Result<u64>;
}

impl Entity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    // Users are not owned records; the creator slot points at the user itself
    // so the generic store surface stays total.
    fn created_by(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(if self.active { "active" } else { "inactive" })
    }

    fn matches_text(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle) || contains_ci(&self.email, needle)
    }
}

impl Entity for Lead {
    const KIND: &'static str = "lead";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_by(&self) -> Uuid {
        self.created_by
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assigned_to(&self) -> Option<Uuid> {
        self.assigned_to
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn due_at(&self) -> Option<DateTime<Utc>> {
        self.next_follow_up
    }

    fn matches_text(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle)
            || self.email.as_deref().is_some_and(|e| contains_ci(e, needle))
    }
}

impl Entity for Client {
    const KIND: &'static str = "client";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_by(&self) -> Uuid {
        self.created_by
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assigned_to(&self) -> Option<Uuid> {
        self.assigned_to
    }

    fn matches_text(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle)
            || self.email.as_deref().is_some_and(|e| contains_ci(e, needle))
    }
}

impl Entity for InventoryUnit {
    const KIND: &'static str = "inventory unit";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_by(&self) -> Uuid {
        self.created_by
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn matches_text(&self, needle: &str) -> bool {
        contains_ci(&self.name, needle)
    }
}

impl Entity for Sale {
    const KIND: &'static str = "sale";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_by(&self) -> Uuid {
        self.created_by
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assigned_to(&self) -> Option<Uuid> {
        self.assigned_to
    }

    fn stakeholders(&self) -> Vec<Uuid> {
        self.salesperson_id.into_iter().chain(self.manager_id).collect()
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn matches_text(&self, needle: &str) -> bool {
        contains_ci(&self.number, needle)
    }
}

impl Entity for Task {
    const KIND: &'static str = "task";

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_by(&self) -> Uuid {
        self.created_by
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn assigned_to(&self) -> Option<Uuid> {
        self.assigned_to
    }

    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.label())
    }

    fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    fn matches_text(&self, needle: &str) -> bool {
        contains_ci(&self.title, needle)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
