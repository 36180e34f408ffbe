//! Task business logic - Handles all task-related operations.
//!
//! Tasks are the unit of assigned work. Status and priority are independent
//! axes with no derived values; completion notifies the task's creator (the
//! assigner) rather than the assignee. Priority strings from transports are
//! parsed leniently - unrecognized values map to `medium` instead of being
//! rejected, which is pinned by test below.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    core::{BulkAssignFailure, BulkAssignSummary, require, require_active_user, validate},
    dispatch::NotificationDispatcher,
    entities::{
        Actor, Notification, NotificationKind, RelatedEntity, Task, TaskPriority, TaskStatus, User,
    },
    errors::{Error, Result},
    policy,
    store::{EntityStore, ListFilter},
};

/// Request to create a task.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateTaskRequest {
    /// Short description of the work, required
    pub title: String,
    /// Longer free-form description
    pub description: Option<String>,
    /// Priority string, parsed leniently (unknown -> medium)
    pub priority: Option<String>,
    /// When the task is due
    pub due_date: Option<DateTime<Utc>>,
    /// The record this task concerns
    pub related: Option<RelatedEntity>,
    /// Initial assignee; must be an existing active user
    pub assigned_to: Option<Uuid>,
}

/// Patch for an existing task. `None` fields are left unchanged. Terminal
/// statuses are not admissible targets; use
/// [`TaskPipeline::complete`] / [`TaskPipeline::cancel`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateTaskRequest {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New status; `completed`/`cancelled` are rejected here
    pub status: Option<TaskStatus>,
    /// New priority string, parsed leniently
    pub priority: Option<String>,
    /// New due date
    pub due_date: Option<DateTime<Utc>>,
    /// New assignee; must be an existing active user
    pub assigned_to: Option<Uuid>,
}

/// Owns the task lifecycle and assignment flow.
pub struct TaskPipeline {
    tasks: Arc<dyn EntityStore<Task>>,
    users: Arc<dyn EntityStore<User>>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl TaskPipeline {
    /// Builds the pipeline over its collaborator ports.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn EntityStore<Task>>,
        users: Arc<dyn EntityStore<User>>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            tasks,
            users,
            dispatcher,
        }
    }

    /// Creates a task; dispatches an assignment notification iff an
    /// assignee was supplied.
    pub async fn create(&self, actor: &Actor, request: CreateTaskRequest) -> Result<Task> {
        let title = validate::required_name(&request.title, "title")?;
        if let Some(assignee) = request.assigned_to {
            require_active_user(self.users.as_ref(), assignee).await?;
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title,
            description: request.description,
            status: TaskStatus::Pending,
            priority: TaskPriority::parse_lenient(request.priority.as_deref()),
            due_date: request.due_date,
            related: request.related,
            completed_at: None,
            completion_notes: None,
            assigned_to: request.assigned_to,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };

        let task = self.tasks.create(task).await?;
        if let Some(assignee) = task.assigned_to {
            self.notify_assignment(&task, assignee);
        }
        Ok(task)
    }

    /// Fetches a task the actor is allowed to read.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Task> {
        let task = require(self.tasks.as_ref(), id).await?;
        policy::authorize_read(actor, &task)?;
        Ok(task)
    }

    /// Lists tasks matching the filter, restricted to those the actor can read.
    pub async fn list(&self, actor: &Actor, filter: &ListFilter) -> Result<Vec<Task>> {
        let mut tasks = self.tasks.list(filter).await?;
        tasks.retain(|task| policy::can_read(actor, task));
        Ok(tasks)
    }

    /// Updates a non-terminal task; the assignee is only notified when it
    /// actually changes.
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: UpdateTaskRequest) -> Result<Task> {
        let mut task = require(self.tasks.as_ref(), id).await?;
        policy::authorize_write(actor, &task)?;
        if task.status.is_terminal() {
            return Err(Error::StateConflict {
                entity: "task",
                status: task.status.label().to_string(),
                action: "update",
            });
        }
        if let Some(status) = patch.status
            && status.is_terminal()
        {
            return Err(Error::validation(
                "status",
                "terminal statuses are set through complete/cancel",
            ));
        }
        let title = match &patch.title {
            Some(value) => Some(validate::required_name(value, "title")?),
            None => None,
        };

        let previous_assignee = task.assigned_to;
        if let Some(assignee) = patch.assigned_to
            && previous_assignee != Some(assignee)
        {
            require_active_user(self.users.as_ref(), assignee).await?;
        }

        if let Some(value) = title {
            task.title = value;
        }
        if let Some(value) = patch.description {
            task.description = Some(value);
        }
        if let Some(value) = patch.status {
            task.status = value;
        }
        if let Some(value) = &patch.priority {
            task.priority = TaskPriority::parse_lenient(Some(value));
        }
        if let Some(value) = patch.due_date {
            task.due_date = Some(value);
        }
        if let Some(value) = patch.assigned_to {
            task.assigned_to = Some(value);
        }
        task.updated_at = Utc::now();

        let task = self.tasks.update(task).await?;
        if let Some(assignee) = task.assigned_to
            && previous_assignee != Some(assignee)
        {
            self.notify_assignment(&task, assignee);
        }
        Ok(task)
    }

    /// Sets or clears the assignee. Re-assigning to the current assignee is
    /// a no-op and produces no notification.
    pub async fn assign(&self, actor: &Actor, id: Uuid, assignee: Option<Uuid>) -> Result<Task> {
        let mut task = require(self.tasks.as_ref(), id).await?;
        policy::authorize_write(actor, &task)?;
        if task.assigned_to == assignee {
            return Ok(task);
        }
        if let Some(user_id) = assignee {
            require_active_user(self.users.as_ref(), user_id).await?;
        }

        task.assigned_to = assignee;
        task.updated_at = Utc::now();
        let task = self.tasks.update(task).await?;
        if let Some(user_id) = task.assigned_to {
            self.notify_assignment(&task, user_id);
        }
        Ok(task)
    }

    /// Assigns many tasks to one user; per-id failures are collected, not
    /// raised. The target user is checked once up front.
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

    /// Completes a task, recording the completion timestamp and notes.
    /// Notifies the task's creator (the assigner), not the assignee.
    pub async fn complete(&self, actor: &Actor, id: Uuid, notes: Option<String>) -> Result<Task> {
        let mut task = require(self.tasks.as_ref(), id).await?;
        policy::authorize_write(actor, &task)?;
        if task.status.is_terminal() {
            return Err(Error::StateConflict {
                entity: "task",
                status: task.status.label().to_string(),
                action: "complete",
            });
        }

        task.status = TaskStatus::Completed;
        task.completed_at = Some(Utc::now());
        task.completion_notes = notes;
        task.updated_at = Utc::now();
        let task = self.tasks.update(task).await?;

        self.dispatcher.dispatch(Notification::new(
            task.created_by,
            NotificationKind::TaskCompleted,
            "Task completed",
            format!("Task \"{}\" was completed", task.title),
            serde_json::json!({ "task_id": task.id }),
        ));
        Ok(task)
    }

    /// Cancels a non-terminal task.
    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<Task> {
        let mut task = require(self.tasks.as_ref(), id).await?;
        policy::authorize_write(actor, &task)?;
        if task.status.is_terminal() {
            return Err(Error::StateConflict {
                entity: "task",
                status: task.status.label().to_string(),
                action: "cancel",
            });
        }

        task.status = TaskStatus::Cancelled;
        task.updated_at = Utc::now();
        self.tasks.update(task).await
    }

    /// Pure query: tasks due before now whose status is not terminal,
    /// restricted to those the actor can read. Mutates nothing - in
    /// particular it does not flip statuses to `overdue`.
    pub async fn get_overdue(&self, actor: &Actor) -> Result<Vec<Task>> {
        let filter = ListFilter {
            due_before: Some(Utc::now()),
            ..ListFilter::default()
        };
        let mut tasks = self.tasks.list(&filter).await?;
        tasks.retain(|task| !task.status.is_terminal() && policy::can_read(actor, task));
        Ok(tasks)
    }

    /// Deletes a task the actor is allowed to write.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let task = require(self.tasks.as_ref(), id).await?;
        policy::authorize_write(actor, &task)?;
        self.tasks.delete(task.id).await
    }

    fn notify_assignment(&self, task: &Task, assignee: Uuid) {
        self.dispatcher.dispatch(Notification::new(
            assignee,
            NotificationKind::TaskAssigned,
            "Task assigned to you",
            format!("You picked up \"{}\"", task.title),
            serde_json::json!({ "task_id": task.id }),
        ));
    }
}
