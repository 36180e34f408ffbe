//! Core business logic - the pipeline modules.
//!
//! One module per entity lifecycle. Every operation takes the authenticated
//! [`crate::entities::Actor`] explicitly - there is no ambient current-user
//! state - and runs validate -> authorize -> read current -> write back,
//! with notification dispatch fired only after a successful write.

pub mod client;
pub mod lead;
pub mod notification;
pub mod sale;
pub mod task;
pub mod validate;

pub use client::ClientPipeline;
pub use lead::LeadPipeline;
pub use notification::NotificationService;
pub use sale::SalePipeline;
pub use task::TaskPipeline;

use uuid::Uuid;

use crate::{
    entities::User,
    errors::{Error, Result},
    store::{Entity, EntityStore},
};

/// Outcome of a bulk assignment: which ids were assigned and which failed.
///
/// Bulk operations process each id independently; one failure never aborts
/// the rest of the batch.
#[derive(Debug, Default)]
pub struct BulkAssignSummary {
    /// Ids now assigned to the requested user
    pub assigned: Vec<Uuid>,
    /// Per-id failures (not found, authorization...)
    pub failed: Vec<BulkAssignFailure>,
}

/// A single failed id inside a bulk assignment.
#[derive(Debug)]
pub struct BulkAssignFailure {
    /// The id that could not be assigned
    pub id: Uuid,
    /// Why it failed
    pub error: Error,
}

/// Fetches a record or fails with [`Error::NotFound`].
pub(crate) async fn require<T: Entity>(store: &dyn EntityStore<T>, id: Uuid) -> Result<T> {
    store
        .get(id)
        .await?
        .ok_or(Error::NotFound { entity: T::KIND, id })
}

/// Resolves a referenced user and requires them to be active.
///
/// Used for assignees, salespeople, managers and approvers; a missing or
/// inactive user is a [`Error::Dependency`], not a not-found, because the
/// user is a related entity rather than the operation's subject.
pub(crate) async fn require_active_user(
    users: &dyn EntityStore<User>,
    id: Uuid,
) -> Result<User> {
    let user = users
        .get(id)
        .await?
        .ok_or_else(|| Error::dependency("user", format!("user {id} does not exist")))?;
    if !user.active {
        return Err(Error::dependency("user", format!("user {id} is inactive")));
    }
    Ok(user)
}
