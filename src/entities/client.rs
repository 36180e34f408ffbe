//! Client entity - A customer, created directly or by converting a lead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier, immutable
    pub id: Uuid,
    /// Customer name, required non-empty
    pub name: String,
    /// Contact email, format-validated when present
    pub email: Option<String>,
    /// Contact phone, format-validated when present
    pub phone: Option<String>,
    /// Back-reference to the originating lead, immutable once set
    pub lead_id: Option<Uuid>,
    /// Identity/KYC verification flag, defaults to false
    pub verified: bool,
    /// Optional credit limit, non-negative
    pub credit_limit: Option<f64>,
    /// Free-form labels
    pub tags: Vec<String>,
    /// User currently responsible for the client
    pub assigned_to: Option<Uuid>,
    /// Creator, set once at creation
    pub created_by: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}
