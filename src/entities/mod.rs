//! Entity module - Contains all domain entity definitions for the pipelines.
//! These entities are plain data records owned by the store; the pipelines
//! re-read the current record before every mutation and write the full
//! updated record back.

pub mod client;
pub mod inventory;
pub mod lead;
pub mod notification;
pub mod sale;
pub mod task;
pub mod user;

// Re-export the record types and their status enums
pub use client::Client;
pub use inventory::{InventoryStatus, InventoryUnit};
pub use lead::{Lead, LeadStatus};
pub use notification::{Notification, NotificationKind};
pub use sale::{Sale, SaleStatus};
pub use task::{RelatedEntity, Task, TaskPriority, TaskStatus};
pub use user::{Actor, Role, User};
