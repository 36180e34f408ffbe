//! User entity - Represents a staff member and the role model.
//!
//! Every pipeline call is accompanied by an [`Actor`] (id + role) extracted
//! from the authenticated user. There is no ambient "current user" state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff role, fixed at design time.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular sales agent - sees only records they own or are assigned to
    Agent,
    /// Team manager - elevated visibility
    Manager,
    /// Administrator - elevated visibility
    Admin,
    /// Super administrator - elevated visibility
    SuperAdmin,
}

impl Role {
    /// Whether this role belongs to the elevated set that can read and write
    /// every record regardless of ownership.
    #[must_use]
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::Manager | Self::Admin | Self::SuperAdmin)
    }
}

/// A staff member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Login / contact email
    pub email: String,
    /// Role governing visibility
    pub role: Role,
    /// Inactive users cannot be assigned work or referenced on sales
    pub active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

/// The authenticated caller of a pipeline operation.
///
/// Deliberately a value type so transports can build one from a session
/// token without threading a full [`User`] around.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The calling user's id
    pub id: Uuid,
    /// The calling user's role
    pub role: Role,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}
