//! Visibility policy - role-and-ownership gate in front of every record access.
//!
//! The rule is uniform across entities and fixed at design time: an actor may
//! read or write a record if their role is elevated, or they are the record's
//! assignee, creator, or one of its stakeholders (for sales: the salesperson
//! and manager). Everyone else is denied. Creation of new records needs no
//! permission; a record has no owner until it exists.
//!
//! Denial is [`Error::Authorization`], deliberately distinct from not-found.
//! Callers that must not leak record existence should collapse the two at
//! their own boundary.

use tracing::debug;

use crate::{
    entities::Actor,
    errors::{Error, Result},
    store::Entity,
};

/// Whether the actor may read the record.
#[must_use]
pub fn can_read<T: Entity>(actor: &Actor, record: &T) -> bool {
    can_access(actor, record)
}

/// Whether the actor may write (mutate or delete) the record.
#[must_use]
pub fn can_write<T: Entity>(actor: &Actor, record: &T) -> bool {
    can_access(actor, record)
}

/// [`can_read`] as a `Result`, for use at the top of pipeline operations.
pub fn authorize_read<T: Entity>(actor: &Actor, record: &T) -> Result<()> {
    authorize(actor, record, "read")
}

/// [`can_write`] as a `Result`, for use at the top of pipeline operations.
pub fn authorize_write<T: Entity>(actor: &Actor, record: &T) -> Result<()> {
    authorize(actor, record, "write")
}

fn authorize<T: Entity>(actor: &Actor, record: &T, action: &'static str) -> Result<()> {
    if can_access(actor, record) {
        return Ok(());
    }
    debug!(
        actor = %actor.id,
        entity = T::KIND,
        record = %record.id(),
        action,
        "visibility policy denied access"
    );
    Err(Error::Authorization {
        actor: actor.id,
        action,
        entity: T::KIND,
    })
}

// Read and write share one rule today; the split entry points exist so the
// contract can diverge without touching call sites.
fn can_access<T: Entity>(actor: &Actor, record: &T) -> bool {
    actor.role.is_elevated()
        || record.assigned_to() == Some(actor.id)
        || record.created_by() == actor.id
        || record.stakeholders().contains(&actor.id)
}
