//! Task entity - A unit of work assigned to staff.
//!
//! Tasks carry two independent axes (status and priority) and may link to
//! another record through a tagged [`RelatedEntity`] reference. The link has
//! no referential integrity; it is context for the person working the task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a task.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started
    Pending,
    /// Being worked
    InProgress,
    /// Done (terminal)
    Completed,
    /// Abandoned (terminal)
    Cancelled,
    /// Past its due date
    Overdue,
}

impl TaskStatus {
    /// Stable label used in store filters and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Overdue => "overdue",
        }
    }

    /// Whether this status admits no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Urgency of a task.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Can wait
    Low,
    /// Normal priority (the default)
    #[default]
    Medium,
    /// Should be picked up soon
    High,
    /// Drop everything
    Urgent,
}

impl TaskPriority {
    /// Parses a priority string, silently falling back to [`Self::Medium`]
    /// for anything unrecognized (including `None`).
    ///
    /// Lenient on purpose: transports historically sent free-text priorities
    /// and the pipeline maps unknown values to the default rather than
    /// rejecting the request. Pinned by test so the policy cannot regress.
    #[must_use]
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("low") => Self::Low,
            Some("medium") => Self::Medium,
            Some("high") => Self::High,
            Some("urgent") => Self::Urgent,
            _ => Self::default(),
        }
    }
}

/// Tagged reference from a task to the record it concerns.
///
/// Kept as an enum rather than a raw (type, id) pair so every consumer must
/// handle each known kind explicitly and an unhandled kind is a
/// compile-time-visible gap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum RelatedEntity {
    /// The task concerns a lead
    Lead(Uuid),
    /// The task concerns a client
    Client(Uuid),
    /// The task concerns a sale
    Sale(Uuid),
    /// The task concerns an inventory unit
    Inventory(Uuid),
}

/// Task record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, immutable
    pub id: Uuid,
    /// Short description of the work, required non-empty
    pub title: String,
    /// Longer free-form description
    pub description: Option<String>,
    /// Lifecycle state
    pub status: TaskStatus,
    /// Urgency
    pub priority: TaskPriority,
    /// When the task is due
    pub due_date: Option<DateTime<Utc>>,
    /// The record this task concerns, if any
    pub related: Option<RelatedEntity>,
    /// When the task was completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Notes recorded at completion
    pub completion_notes: Option<String>,
    /// User currently responsible for the task
    pub assigned_to: Option<Uuid>,
    /// Creator (the assigner), set once at creation
    pub created_by: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}
