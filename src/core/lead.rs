//! Lead business logic - Handles all lead-related operations.
//!
//! Covers the lead lifecycle from capture through qualification to
//! conversion: creation, updates, scoring, assignment (single and bulk),
//! follow-up scheduling and lead-to-client conversion. Every operation is
//! policy-gated and re-reads the current record before writing back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    core::{
        BulkAssignFailure, BulkAssignSummary, require, require_active_user, validate,
    },
    dispatch::NotificationDispatcher,
    entities::{
        Actor, Client, Lead, LeadStatus, Notification, NotificationKind, RelatedEntity, Task,
        TaskPriority, TaskStatus, User,
    },
    errors::{Error, Result},
    policy,
    store::{EntityStore, ListFilter},
};

/// Request to create a lead.
///
/// `status` and `score` are accepted for transport convenience but ignored:
/// a new lead always starts at `new` with score 0.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateLeadRequest {
    /// Contact name, required
    pub name: String,
    /// Contact email, format-validated when present
    pub email: Option<String>,
    /// Contact phone, format-validated when present
    pub phone: Option<String>,
    /// Ignored; creation forces `new`
    pub status: Option<LeadStatus>,
    /// Ignored; creation forces 0
    pub score: Option<i64>,
    /// Lower budget bound
    pub budget_min: Option<f64>,
    /// Upper budget bound
    pub budget_max: Option<f64>,
    /// Next follow-up timestamp
    pub next_follow_up: Option<DateTime<Utc>>,
    /// Free-form labels
    pub tags: Vec<String>,
    /// Initial assignee; must be an existing active user
    pub assigned_to: Option<Uuid>,
}

/// Patch for an existing lead. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateLeadRequest {
    /// New contact name
    pub name: Option<String>,
    /// New contact email
    pub email: Option<String>,
    /// New contact phone
    pub phone: Option<String>,
    /// New funnel status; `converted` is not an admissible target here
    pub status: Option<LeadStatus>,
    /// New lower budget bound
    pub budget_min: Option<f64>,
    /// New upper budget bound
    pub budget_max: Option<f64>,
    /// New next follow-up timestamp
    pub next_follow_up: Option<DateTime<Utc>>,
    /// Replacement tag set
    pub tags: Option<Vec<String>>,
    /// New assignee; must be an existing active user
    pub assigned_to: Option<Uuid>,
}

/// Request accompanying a lead-to-client conversion.
/// Unset fields are carried over from the lead.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConvertLeadRequest {
    /// Client name override
    pub name: Option<String>,
    /// Client email override
    pub email: Option<String>,
    /// Client phone override
    pub phone: Option<String>,
    /// Credit limit for the new client
    pub credit_limit: Option<f64>,
}

/// Request to schedule a follow-up on a lead.
#[derive(Clone, Debug, Deserialize)]
pub struct ScheduleFollowUpRequest {
    /// When the follow-up is due
    pub due_at: DateTime<Utc>,
    /// Task title; defaults to "Follow up with {lead name}"
    #[serde(default)]
    pub title: Option<String>,
    /// Task description
    #[serde(default)]
    pub description: Option<String>,
    /// Task priority string, parsed leniently
    #[serde(default)]
    pub priority: Option<String>,
    /// Who should do the follow-up; defaults to the lead's assignee,
    /// falling back to the calling actor
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

/// Owns the lead lifecycle. Composes the lead/client/task/user stores and
/// the notification dispatcher; holds no entity state of its own.
pub struct LeadPipeline {
    leads: Arc<dyn EntityStore<Lead>>,
    clients: Arc<dyn EntityStore<Client>>,
    tasks: Arc<dyn EntityStore<Task>>,
    users: Arc<dyn EntityStore<User>>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl LeadPipeline {
    /// Builds the pipeline over its collaborator ports.
    #[must_use]
    pub fn new(
        leads: Arc<dyn EntityStore<Lead>>,
        clients: Arc<dyn EntityStore<Client>>,
        tasks: Arc<dyn EntityStore<Task>>,
        users: Arc<dyn EntityStore<User>>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            leads,
            clients,
            tasks,
            users,
            dispatcher,
        }
    }

    /// Creates a lead. Status is forced to `new` and score to 0 regardless
    /// of the request; an assignment notification is dispatched iff an
    /// assignee was supplied.
    pub async fn create(&self, actor: &Actor, request: CreateLeadRequest) -> Result<Lead> {
        let name = validate::required_name(&request.name, "name")?;
        if let Some(email) = &request.email {
            validate::email(email)?;
        }
        if let Some(phone) = &request.phone {
            validate::phone(phone)?;
        }
        validate::budget_range(request.budget_min, request.budget_max)?;
        if let Some(assignee) = request.assigned_to {
            require_active_user(self.users.as_ref(), assignee).await?;
        }

        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            name,
            email: request.email,
            phone: request.phone,
            status: LeadStatus::New,
            score: 0,
            budget_min: request.budget_min,
            budget_max: request.budget_max,
            next_follow_up: request.next_follow_up,
            tags: request.tags,
            assigned_to: request.assigned_to,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };

        let lead = self.leads.create(lead).await?;
        if let Some(assignee) = lead.assigned_to {
            self.notify_assignment(&lead, assignee);
        }
        Ok(lead)
    }

    /// Fetches a lead the actor is allowed to read.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Lead> {
        let lead = require(self.leads.as_ref(), id).await?;
        policy::authorize_read(actor, &lead)?;
        Ok(lead)
    }

    /// Lists leads matching the filter, restricted to those the actor can read.
    pub async fn list(&self, actor: &Actor, filter: &ListFilter) -> Result<Vec<Lead>> {
        let mut leads = self.leads.list(filter).await?;
        leads.retain(|lead| policy::can_read(actor, lead));
        Ok(leads)
    }

    /// Updates a lead. Converted leads are terminal and reject any update;
    /// touched fields are re-validated with the creation rules; the assignee
    /// is only notified when it actually changes.
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: UpdateLeadRequest) -> Result<Lead> {
        let mut lead = require(self.leads.as_ref(), id).await?;
        policy::authorize_write(actor, &lead)?;
        if lead.status == LeadStatus::Converted {
            return Err(Error::StateConflict {
                entity: "lead",
                status: lead.status.label().to_string(),
                action: "update",
            });
        }

        if let Some(status) = patch.status
            && status == LeadStatus::Converted
        {
            return Err(Error::validation(
                "status",
                "leads reach `converted` only through conversion",
            ));
        }
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
        // Bounds are validated against the merged pair so a patch cannot
        // cross the surviving bound.
        validate::budget_range(
            patch.budget_min.or(lead.budget_min),
            patch.budget_max.or(lead.budget_max),
        )?;

        let previous_assignee = lead.assigned_to;
        if let Some(assignee) = patch.assigned_to
            && previous_assignee != Some(assignee)
        {
            require_active_user(self.users.as_ref(), assignee).await?;
        }

        if let Some(value) = name {
            lead.name = value;
        }
        if let Some(value) = patch.email {
            lead.email = Some(value);
        }
        if let Some(value) = patch.phone {
            lead.phone = Some(value);
        }
        if let Some(value) = patch.status {
            lead.status = value;
        }
        if let Some(value) = patch.budget_min {
            lead.budget_min = Some(value);
        }
        if let Some(value) = patch.budget_max {
            lead.budget_max = Some(value);
        }
        if let Some(value) = patch.next_follow_up {
            lead.next_follow_up = Some(value);
        }
        if let Some(value) = patch.tags {
            lead.tags = value;
        }
        if let Some(value) = patch.assigned_to {
            lead.assigned_to = Some(value);
        }
        lead.updated_at = Utc::now();

        let lead = self.leads.update(lead).await?;
        if let Some(assignee) = lead.assigned_to
            && previous_assignee != Some(assignee)
        {
            self.notify_assignment(&lead, assignee);
        }
        Ok(lead)
    }

    /// Sets or clears the assignee. Re-assigning to the current assignee is
    /// a no-op and produces no notification.
    pub async fn assign(&self, actor: &Actor, id: Uuid, assignee: Option<Uuid>) -> Result<Lead> {
        let mut lead = require(self.leads.as_ref(), id).await?;
        policy::authorize_write(actor, &lead)?;
        if lead.assigned_to == assignee {
            return Ok(lead);
        }
        if let Some(user_id) = assignee {
            require_active_user(self.users.as_ref(), user_id).await?;
        }

        lead.assigned_to = assignee;
        lead.updated_at = Utc::now();
        let lead = self.leads.update(lead).await?;
        if let Some(user_id) = lead.assigned_to {
            self.notify_assignment(&lead, user_id);
        }
        Ok(lead)
    }

    /// Sets the qualification score. Scores outside 0..=100 are rejected;
    /// converted leads refuse the mutation.
    pub async fn update_score(&self, actor: &Actor, id: Uuid, score: i64) -> Result<Lead> {
        let mut lead = require(self.leads.as_ref(), id).await?;
        policy::authorize_write(actor, &lead)?;
        if lead.status == LeadStatus::Converted {
            return Err(Error::StateConflict {
                entity: "lead",
                status: lead.status.label().to_string(),
                action: "update score of",
            });
        }
        lead.score = validate::score(score)?;
        lead.updated_at = Utc::now();
        self.leads.update(lead).await
    }

    /// Converts a lead into a new, independent client.
    ///
    /// The client carries over name/contact/assignee/tags and a back
    /// reference to the lead. The client write goes first; only then is the
    /// lead advanced to `converted`, so a failure between the writes leaves
    /// at worst a valid standalone client and an unconverted lead.
    pub async fn convert_to_client(
        &self,
        actor: &Actor,
        id: Uuid,
        request: ConvertLeadRequest,
    ) -> Result<Client> {
        let mut lead = require(self.leads.as_ref(), id).await?;
        policy::authorize_write(actor, &lead)?;
        if !lead.is_convertible() {
            return Err(Error::StateConflict {
                entity: "lead",
                status: lead.status.label().to_string(),
                action: "convert",
            });
        }

        let name = match &request.name {
            Some(value) => validate::required_name(value, "name")?,
            None => lead.name.clone(),
        };
        if let Some(email) = &request.email {
            validate::email(email)?;
        }
        if let Some(phone) = &request.phone {
            validate::phone(phone)?;
        }
        if let Some(limit) = request.credit_limit {
            validate::non_negative("credit_limit", limit)?;
        }

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            name,
            email: request.email.or_else(|| lead.email.clone()),
            phone: request.phone.or_else(|| lead.phone.clone()),
            lead_id: Some(lead.id),
            verified: false,
            credit_limit: request.credit_limit,
            tags: lead.tags.clone(),
            assigned_to: lead.assigned_to,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };
        let client = self.clients.create(client).await?;

        lead.status = LeadStatus::Converted;
        lead.updated_at = Utc::now();
        let lead = self.leads.update(lead).await?;
        info!(lead = %lead.id, client = %client.id, "lead converted to client");

        if let Some(assignee) = lead.assigned_to {
            self.dispatcher.dispatch(Notification::new(
                assignee,
                NotificationKind::LeadConverted,
                "Lead converted",
                format!("Lead \"{}\" became client \"{}\"", lead.name, client.name),
                serde_json::json!({ "lead_id": lead.id, "client_id": client.id }),
            ));
        }
        Ok(client)
    }

    /// Assigns many leads to one user. Each id is processed independently;
    /// per-id failures are collected into the summary instead of aborting
    /// the batch. The target user is checked once up front.
    pub async fn bulk_assign(
        &self,
        actor: &Actor,
        ids: &[Uuid],
        user_id: Uuid,
    ) -> Result<BulkAssignSummary> {
        require_active_user(self.users.as_ref(), user_id).await?;

        let mut summary = BulkAssignSummary::default();
        for &id in ids {
            match self.assign(actor, id, Some(user_id)).await {
                Ok(_) => summary.assigned.push(id),
                Err(error) => summary.failed.push(BulkAssignFailure { id, error }),
            }
        }
        Ok(summary)
    }

    /// Schedules a follow-up: creates a follow-up task linked to the lead
    /// and stamps the lead's next-follow-up timestamp. If the lead write
    /// fails the task is removed again (best-effort) so the follow-up is
    /// never considered scheduled without the stamp.
    pub async fn schedule_follow_up(
        &self,
        actor: &Actor,
        id: Uuid,
        request: ScheduleFollowUpRequest,
    ) -> Result<Task> {
        let mut lead = require(self.leads.as_ref(), id).await?;
        policy::authorize_write(actor, &lead)?;

        let assignee = match request.assigned_to {
            Some(user_id) => {
                require_active_user(self.users.as_ref(), user_id).await?;
                user_id
            }
            None => lead.assigned_to.unwrap_or(actor.id),
        };
        let title = match &request.title {
            Some(value) => validate::required_name(value, "title")?,
            None => format!("Follow up with {}", lead.name),
        };

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title,
            description: request.description,
            status: TaskStatus::Pending,
            priority: TaskPriority::parse_lenient(request.priority.as_deref()),
            due_date: Some(request.due_at),
            related: Some(RelatedEntity::Lead(lead.id)),
            completed_at: None,
            completion_notes: None,
            assigned_to: Some(assignee),
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };
        let task = self.tasks.create(task).await?;

        lead.next_follow_up = Some(request.due_at);
        lead.updated_at = Utc::now();
        if let Err(error) = self.leads.update(lead).await {
            // Compensate: without the stamp the follow-up is not scheduled.
            if let Err(cleanup) = self.tasks.delete(task.id).await {
                tracing::warn!(task = %task.id, "failed to remove orphaned follow-up task: {cleanup}");
            }
            return Err(error);
        }

        self.dispatcher.dispatch(Notification::new(
            assignee,
            NotificationKind::FollowUpScheduled,
            "Follow-up scheduled",
            format!("Follow-up due {}", request.due_at.format("%Y-%m-%d %H:%M")),
            serde_json::json!({ "lead_id": id, "task_id": task.id }),
        ));
        Ok(task)
    }

    /// Deletes a lead the actor is allowed to write.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let lead = require(self.leads.as_ref(), id).await?;
        policy::authorize_write(actor, &lead)?;
        self.leads.delete(lead.id).await
    }

    fn notify_assignment(&self, lead: &Lead, assignee: Uuid) {
        self.dispatcher.dispatch(Notification::new(
            assignee,
            NotificationKind::LeadAssigned,
            "Lead assigned to you",
            format!("You are now responsible for lead \"{}\"", lead.name),
            serde_json::json!({ "lead_id": lead.id }),
        ));
    }
}
