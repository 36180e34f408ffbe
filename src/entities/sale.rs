//! Sale entity - A transaction between a client and an inventory unit.
//!
//! Status moves only through the explicit pipeline actions
//! (draft/pending -> approved -> completed, cancelled from any non-terminal
//! state). Completed and cancelled sales are frozen: no field mutation is
//! permitted once either state is reached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a sale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Being drafted, not yet submitted
    Draft,
    /// Awaiting approval
    Pending,
    /// Approved, awaiting completion
    Approved,
    /// Finalized (terminal)
    Completed,
    /// Cancelled (terminal)
    Cancelled,
}

impl SaleStatus {
    /// Stable label used in store filters and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether this status admits no further transition.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Sale record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Unique identifier, immutable
    pub id: Uuid,
    /// Human-readable sale number, unique per creation
    pub number: String,
    /// The purchasing client; must exist at creation
    pub client_id: Uuid,
    /// The unit being sold; must exist at creation
    pub inventory_id: Uuid,
    /// Salesperson on the sale; must be an active user when present
    pub salesperson_id: Option<Uuid>,
    /// Manager on the sale; must be an active user when present
    pub manager_id: Option<Uuid>,
    /// Lifecycle state
    pub status: SaleStatus,
    /// Gross amount, strictly positive
    pub total_amount: f64,
    /// Discount, non-negative and at most `total_amount`
    pub discount_amount: f64,
    /// Always `total_amount - discount_amount`; recomputed on every amount change
    pub final_amount: f64,
    /// Who approved the sale
    pub approved_by: Option<Uuid>,
    /// When the sale was approved
    pub approved_at: Option<DateTime<Utc>>,
    /// When the sale was completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Reason given on cancellation
    pub cancelled_reason: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// User currently responsible for the sale
    pub assigned_to: Option<Uuid>,
    /// Creator, set once at creation
    pub created_by: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}
