//! Client business logic - Handles all client-related operations.
//!
//! Clients are created directly or by lead conversion (see
//! [`crate::core::lead`]). The back-reference to the originating lead is set
//! at creation only and is not patchable.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    core::{require, require_active_user, validate},
    dispatch::NotificationDispatcher,
    entities::{Actor, Client, Notification, NotificationKind, User},
    errors::Result,
    policy,
    store::{EntityStore, ListFilter},
};

/// Request to create a client directly.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateClientRequest {
    /// Customer name, required
    pub name: String,
    /// Contact email, format-validated when present
    pub email: Option<String>,
    /// Contact phone, format-validated when present
    pub phone: Option<String>,
    /// Originating lead, immutable once set
    pub lead_id: Option<Uuid>,
    /// Credit limit, non-negative
    pub credit_limit: Option<f64>,
    /// Free-form labels
    pub tags: Vec<String>,
    /// Initial assignee; must be an existing active user
    pub assigned_to: Option<Uuid>,
}

/// Patch for an existing client. `None` fields are left unchanged;
/// the lead back-reference is deliberately absent.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateClientRequest {
    /// New customer name
    pub name: Option<String>,
    /// New contact email
    pub email: Option<String>,
    /// New contact phone
    pub phone: Option<String>,
    /// New credit limit
    pub credit_limit: Option<f64>,
    /// Replacement tag set
    pub tags: Option<Vec<String>>,
    /// New assignee; must be an existing active user
    pub assigned_to: Option<Uuid>,
}

/// Owns the client lifecycle.
pub struct ClientPipeline {
    clients: Arc<dyn EntityStore<Client>>,
    users: Arc<dyn EntityStore<User>>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl ClientPipeline {
    /// Builds the pipeline over its collaborator ports.
    #[must_use]
    pub fn new(
        clients: Arc<dyn EntityStore<Client>>,
        users: Arc<dyn EntityStore<User>>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            clients,
            users,
            dispatcher,
        }
    }

    /// Creates a client; dispatches an assignment notification iff an
    /// assignee was supplied.
    pub async fn create(&self, actor: &Actor, request: CreateClientRequest) -> Result<Client> {
        let name = validate::required_name(&request.name, "name")?;
        if let Some(email) = &request.email {
            validate::email(email)?;
        }
        if let Some(phone) = &request.phone {
            validate::phone(phone)?;
        }
        if let Some(limit) = request.credit_limit {
            validate::non_negative("credit_limit", limit)?;
        }
        if let Some(assignee) = request.assigned_to {
            require_active_user(self.users.as_ref(), assignee).await?;
        }

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            name,
            email: request.email,
            phone: request.phone,
            lead_id: request.lead_id,
            verified: false,
            credit_limit: request.credit_limit,
            tags: request.tags,
            assigned_to: request.assigned_to,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };

        let client = self.clients.create(client).await?;
        if let Some(assignee) = client.assigned_to {
            self.notify_assignment(&client, assignee);
        }
        Ok(client)
    }

    /// Fetches a client the actor is allowed to read.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Client> {
        let client = require(self.clients.as_ref(), id).await?;
        policy::authorize_read(actor, &client)?;
        Ok(client)
    }

    /// Lists clients matching the filter, restricted to those the actor can read.
    pub async fn list(&self, actor: &Actor, filter: &ListFilter) -> Result<Vec<Client>> {
        let mut clients = self.clients.list(filter).await?;
        clients.retain(|client| policy::can_read(actor, client));
        Ok(clients)
    }

    /// Updates a client; the assignee is only notified when it actually changes.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: UpdateClientRequest,
    ) -> Result<Client> {
        let mut client = require(self.clients.as_ref(), id).await?;
        policy::authorize_write(actor, &client)?;

        let name = match &patch.name {
            Some(value) => Some(validate::required_name(value, "name")?),
            None => None,
        };
        if let Some(email) = &patch.email {
            validate::email(email)?;
        }
        if let Some(phone) = &patch.phone {
            validate::phone(phone)?;
        }
        if let Some(limit) = patch.credit_limit {
            validate::non_negative("credit_limit", limit)?;
        }

        let previous_assignee = client.assigned_to;
        if let Some(assignee) = patch.assigned_to
            && previous_assignee != Some(assignee)
        {
            require_active_user(self.users.as_ref(), assignee).await?;
        }

        if let Some(value) = name {
            client.name = value;
        }
        if let Some(value) = patch.email {
            client.email = Some(value);
        }
        if let Some(value) = patch.phone {
            client.phone = Some(value);
        }
        if let Some(value) = patch.credit_limit {
            client.credit_limit = Some(value);
        }
        if let Some(value) = patch.tags {
            client.tags = value;
        }
        if let Some(value) = patch.assigned_to {
            client.assigned_to = Some(value);
        }
        client.updated_at = Utc::now();

        let client = self.clients.update(client).await?;
        if let Some(assignee) = client.assigned_to
            && previous_assignee != Some(assignee)
        {
            self.notify_assignment(&client, assignee);
        }
        Ok(client)
    }

    /// Marks a client as verified.
    pub async fn verify(&self, actor: &Actor, id: Uuid) -> Result<Client> {
        let mut client = require(self.clients.as_ref(), id).await?;
        policy::authorize_write(actor, &client)?;
        client.verified = true;
        client.updated_at = Utc::now();
        self.clients.update(client).await
    }

    /// Deletes a client the actor is allowed to write.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let client = require(self.clients.as_ref(), id).await?;
        policy::authorize_write(actor, &client)?;
        self.clients.delete(client.id).await
    }

    fn notify_assignment(&self, client: &Client, assignee: Uuid) {
        self.dispatcher.dispatch(Notification::new(
            assignee,
            NotificationKind::ClientAssigned,
            "Client assigned to you",
            format!("You are now responsible for client \"{}\"", client.name),
            serde_json::json!({ "client_id": client.id }),
        ));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::Role;
    use crate::errors::Error;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_client_validation() -> Result<()> {
        let harness = PipelineHarness::new();
        let actor = harness.actor(Role::Agent).await?;
        let pipeline = harness.client_pipeline();

        let result = pipeline.create(&actor, CreateClientRequest::default()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { field: "name", .. }));

        let result = pipeline
            .create(
                &actor,
                CreateClientRequest {
                    name: "Acme".to_string(),
                    credit_limit: Some(-100.0),
                    ..CreateClientRequest::default()
                },
            )
            .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { field: "credit_limit", .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_defaults_to_unverified() -> Result<()> {
        let harness = PipelineHarness::new();
        let actor = harness.actor(Role::Agent).await?;
        let client = harness
            .client_pipeline()
            .create(
                &actor,
                CreateClientRequest {
                    name: "Acme".to_string(),
                    ..CreateClientRequest::default()
                },
            )
            .await?;
        assert!(!client.verified);
        assert!(client.lead_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_verify_sets_flag() -> Result<()> {
        let harness = PipelineHarness::new();
        let actor = harness.actor(Role::Agent).await?;
        let pipeline = harness.client_pipeline();
        let client = pipeline
            .create(
                &actor,
                CreateClientRequest {
                    name: "Acme".to_string(),
                    ..CreateClientRequest::default()
                },
            )
            .await?;

        let verified = pipeline.verify(&actor, client.id).await?;
        assert!(verified.verified);
        Ok(())
    }

    #[tokio::test]
    async fn test_assignee_change_detection() -> Result<()> {
        let harness = PipelineHarness::new();
        let actor = harness.actor(Role::Agent).await?;
        let pipeline = harness.client_pipeline();
        let rep = harness.add_user("Rep", Role::Agent).await?;

        let client = pipeline
            .create(
                &actor,
                CreateClientRequest {
                    name: "Acme".to_string(),
                    assigned_to: Some(rep.id),
                    ..CreateClientRequest::default()
                },
            )
            .await?;
        assert_eq!(harness.dispatcher.sent().len(), 1);
        harness.dispatcher.clear();

        pipeline
            .update(
                &actor,
                client.id,
                UpdateClientRequest {
                    assigned_to: Some(rep.id),
                    ..UpdateClientRequest::default()
                },
            )
            .await?;
        assert_eq!(harness.dispatcher.sent().len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_visibility_is_enforced() -> Result<()> {
        let harness = PipelineHarness::new();
        let owner = harness.actor(Role::Agent).await?;
        let outsider = harness.actor(Role::Agent).await?;
        let pipeline = harness.client_pipeline();

        let client = pipeline
            .create(
                &owner,
                CreateClientRequest {
                    name: "Acme".to_string(),
                    ..CreateClientRequest::default()
                },
            )
            .await?;

        let result = pipeline.get(&outsider, client.id).await;
        assert!(matches!(result.unwrap_err(), Error::Authorization { .. }));
        let result = pipeline.verify(&outsider, client.id).await;
        assert!(matches!(result.unwrap_err(), Error::Authorization { .. }));
        Ok(())
    }
}
