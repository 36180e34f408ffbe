//! In-memory store - the reference implementation of the store ports.
//!
//! Backs the test suite and embedders that want the engine without a
//! relational backend. Semantics match the port contract exactly, including
//! the documented last-write-wins behavior on concurrent updates: `update`
//! overwrites the whole record with no version check.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    entities::Notification,
    errors::{Error, Result},
    store::{Entity, EntityStore, ListFilter, NotificationStore},
};

/// HashMap-backed [`EntityStore`], one instance per entity type.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    records: RwLock<HashMap<Uuid, T>>,
}

impl<T> MemoryStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for MemoryStore<T> {
    async fn create(&self, record: T) -> Result<T> {
        let mut records = self.records.write().await;
        records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, record: T) -> Result<T> {
        let mut records = self.records.write().await;
        if !records.contains_key(&record.id()) {
            return Err(Error::NotFound {
                entity: T::KIND,
                id: record.id(),
            });
        }
        records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut records = self.records.write().await;
        records
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::NotFound { entity: T::KIND, id })
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<T>> {
        let records = self.records.read().await;
        let mut matched: Vec<T> = records
            .values()
            .filter(|record| filter.matches(*record))
            .cloned()
            .collect();
        matched.sort_by_key(|record| std::cmp::Reverse(record.created_at()));
        Ok(matched)
    }

    async fn count(&self, filter: &ListFilter) -> Result<u64> {
        let records = self.records.read().await;
        Ok(records.values().filter(|record| filter.matches(*record)).count() as u64)
    }
}

/// HashMap-backed [`NotificationStore`].
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    records: RwLock<HashMap<Uuid, Notification>>,
}

impl MemoryNotificationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, notification: Notification) -> Result<Notification> {
        let mut records = self.records.write().await;
        records.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Notification>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, notification: Notification) -> Result<Notification> {
        let mut records = self.records.write().await;
        if !records.contains_key(&notification.id) {
            return Err(Error::NotFound {
                entity: "notification",
                id: notification.id,
            });
        }
        records.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let records = self.records.read().await;
        let mut matched: Vec<Notification> = records
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        matched.sort_by_key(|n| std::cmp::Reverse(n.created_at));
        Ok(matched)
    }

    async fn count_unread(&self, user_id: Uuid) -> Result<u64> {
        let records = self.records.read().await;
        Ok(records.values().filter(|n| n.user_id == user_id && !n.read).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{Lead, NotificationKind};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_get_update_delete_roundtrip() -> Result<()> {
        let store = MemoryStore::<Lead>::new();
        let lead = sample_lead("Ada", Uuid::new_v4());
        let id = lead.id;

        store.create(lead.clone()).await?;
        assert_eq!(store.get(id).await?.unwrap().name, "Ada");

        let mut renamed = lead;
        renamed.name = "Ada Lovelace".to_string();
        store.update(renamed).await?;
        assert_eq!(store.get(id).await?.unwrap().name, "Ada Lovelace");

        store.delete(id).await?;
        assert!(store.get(id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = MemoryStore::<Lead>::new();
        let lead = sample_lead("Ghost", Uuid::new_v4());
        let result = store.update(lead).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { entity: "lead", .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let store = MemoryStore::<Lead>::new();
        let result = store.delete(Uuid::new_v4()).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_and_counts() -> Result<()> {
        let store = MemoryStore::<Lead>::new();
        let user = Uuid::new_v4();
        let mut assigned = sample_lead("Assigned", user);
        assigned.assigned_to = Some(user);
        store.create(assigned).await?;
        store.create(sample_lead("Unassigned", user)).await?;

        let filter = ListFilter {
            assigned_to: Some(user),
            ..ListFilter::default()
        };
        assert_eq!(store.list(&filter).await?.len(), 1);
        assert_eq!(store.count(&filter).await?, 1);
        assert_eq!(store.count(&ListFilter::default()).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_notifications_list_newest_first_and_count_unread() -> Result<()> {
        let store = MemoryNotificationStore::new();
        let user = Uuid::new_v4();

        let first = Notification::new(
            user,
            NotificationKind::TaskAssigned,
            "Task assigned",
            "You picked up a task",
            serde_json::json!({}),
        );
        let mut second = Notification::new(
            user,
            NotificationKind::TaskCompleted,
            "Task completed",
            "A task you created was completed",
            serde_json::json!({}),
        );
        second.created_at = first.created_at + chrono::Duration::seconds(5);

        store.create(first.clone()).await?;
        store.create(second.clone()).await?;
        // A notification for someone else must not leak into the list.
        store
            .create(Notification::new(
                Uuid::new_v4(),
                NotificationKind::TaskAssigned,
                "Other",
                "Other",
                serde_json::json!({}),
            ))
            .await?;

        let listed = store.list_for_user(user).await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(store.count_unread(user).await?, 2);

        let mut read = listed[0].clone();
        read.read = true;
        store.update(read).await?;
        assert_eq!(store.count_unread(user).await?, 1);
        Ok(())
    }
}
