//! Inventory entity - A sellable unit (a property in the real-estate domain).
//!
//! The sale pipeline only needs enough of an inventory model to check that a
//! referenced unit exists and is still sellable, and to mark it sold when a
//! sale completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Availability of an inventory unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    /// On the market
    Available,
    /// Held against a pending sale
    Reserved,
    /// Sold (not sellable again)
    Sold,
}

impl InventoryStatus {
    /// Stable label used in store filters and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
        }
    }
}

/// Inventory unit record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryUnit {
    /// Unique identifier, immutable
    pub id: Uuid,
    /// Display name, e.g. "Unit 4B, Riverside Towers"
    pub name: String,
    /// Asking price, if listed
    pub unit_price: Option<f64>,
    /// Availability
    pub status: InventoryStatus,
    /// User who registered the unit
    pub created_by: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}
