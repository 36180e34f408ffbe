//! Lead entity - Represents a prospective customer in the sales funnel.
//!
//! Leads are qualified, scored and eventually converted into clients or
//! marked lost. `Converted` is terminal: the normal update path refuses any
//! further mutation once a lead has been converted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Funnel position of a lead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Freshly captured, not yet contacted
    New,
    /// First contact made
    Contacted,
    /// Qualified as a real opportunity
    Qualified,
    /// Proposal sent
    Proposal,
    /// In negotiation
    Negotiation,
    /// Converted into a client (terminal)
    Converted,
    /// Lost to a competitor or gone cold
    Lost,
    /// Parked, not currently worked
    Inactive,
}

impl LeadStatus {
    /// Stable label used in store filters and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Proposal => "proposal",
            Self::Negotiation => "negotiation",
            Self::Converted => "converted",
            Self::Lost => "lost",
            Self::Inactive => "inactive",
        }
    }
}

/// Lead record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Unique identifier, immutable
    pub id: Uuid,
    /// Contact name, required non-empty
    pub name: String,
    /// Contact email, format-validated when present
    pub email: Option<String>,
    /// Contact phone, format-validated when present
    pub phone: Option<String>,
    /// Funnel position
    pub status: LeadStatus,
    /// Qualification score, 0..=100
    pub score: u8,
    /// Lower bound of the stated budget
    pub budget_min: Option<f64>,
    /// Upper bound of the stated budget; `budget_min <= budget_max` when both present
    pub budget_max: Option<f64>,
    /// When the next follow-up is due
    pub next_follow_up: Option<DateTime<Utc>>,
    /// Free-form labels, carried over on conversion
    pub tags: Vec<String>,
    /// User currently responsible for the lead
    pub assigned_to: Option<Uuid>,
    /// Creator, set once at creation
    pub created_by: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Whether the lead may still be converted into a client.
    /// Converted and lost leads are not convertible.
    #[must_use]
    pub const fn is_convertible(&self) -> bool {
        !matches!(self.status, LeadStatus::Converted | LeadStatus::Lost)
    }
}
