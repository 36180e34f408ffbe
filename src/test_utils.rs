//! Shared test utilities for `Dealflow`.
//!
//! Provides the standard harness for pipeline tests (in-memory stores wired
//! to a synchronous recording dispatcher) plus builders for entities with
//! sensible defaults.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::EngineConfig,
    core::{ClientPipeline, LeadPipeline, NotificationService, SalePipeline, TaskPipeline},
    dispatch::NotificationDispatcher,
    entities::{
        Actor, Client, InventoryStatus, InventoryUnit, Lead, LeadStatus, Notification, Role, Sale,
        SaleStatus, Task, User,
    },
    errors::Result,
};

pub use crate::store::{EntityStore, ListFilter, MemoryNotificationStore, MemoryStore, NotificationStore};

/// Dispatcher that records notifications synchronously instead of spawning,
/// so tests can assert on exactly what was sent and in what order.
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingDispatcher {
    /// Snapshot of everything dispatched so far.
    #[allow(clippy::unwrap_used)]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Drops everything recorded so far.
    #[allow(clippy::unwrap_used)]
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn dispatch(&self, notification: Notification) {
        #[allow(clippy::unwrap_used)]
        self.sent.lock().unwrap().push(notification);
    }
}

/// In-memory stores plus a recording dispatcher, with constructors for every
/// pipeline. This is the standard setup for all pipeline tests.
pub struct PipelineHarness {
    /// User store
    pub users: Arc<MemoryStore<User>>,
    /// Lead store
    pub leads: Arc<MemoryStore<Lead>>,
    /// Client store
    pub clients: Arc<MemoryStore<Client>>,
    /// Inventory store
    pub inventory: Arc<MemoryStore<InventoryUnit>>,
    /// Sale store
    pub sales: Arc<MemoryStore<Sale>>,
    /// Task store
    pub tasks: Arc<MemoryStore<Task>>,
    /// Notification store
    pub notifications: Arc<MemoryNotificationStore>,
    /// Recording dispatcher shared by every pipeline
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl PipelineHarness {
    /// Creates an empty harness.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Arc::new(MemoryStore::new()),
            leads: Arc::new(MemoryStore::new()),
            clients: Arc::new(MemoryStore::new()),
            inventory: Arc::new(MemoryStore::new()),
            sales: Arc::new(MemoryStore::new()),
            tasks: Arc::new(MemoryStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
            dispatcher: Arc::new(RecordingDispatcher::default()),
        }
    }

    /// Builds a lead pipeline over the harness stores.
    #[must_use]
    pub fn lead_pipeline(&self) -> LeadPipeline {
        LeadPipeline::new(
            Arc::clone(&self.leads) as Arc<dyn EntityStore<Lead>>,
            Arc::clone(&self.clients) as Arc<dyn EntityStore<Client>>,
            Arc::clone(&self.tasks) as Arc<dyn EntityStore<Task>>,
            Arc::clone(&self.users) as Arc<dyn EntityStore<User>>,
            Arc::clone(&self.dispatcher) as Arc<dyn NotificationDispatcher>,
        )
    }

    /// Builds a client pipeline over the harness stores.
    #[must_use]
    pub fn client_pipeline(&self) -> ClientPipeline {
        ClientPipeline::new(
            Arc::clone(&self.clients) as Arc<dyn EntityStore<Client>>,
            Arc::clone(&self.users) as Arc<dyn EntityStore<User>>,
            Arc::clone(&self.dispatcher) as Arc<dyn NotificationDispatcher>,
        )
    }

    /// Builds a sale pipeline with default numbering over the harness stores.
    #[must_use]
    pub fn sale_pipeline(&self) -> SalePipeline {
        SalePipeline::new(
            Arc::clone(&self.sales) as Arc<dyn EntityStore<Sale>>,
            Arc::clone(&self.clients) as Arc<dyn EntityStore<Client>>,
            Arc::clone(&self.inventory) as Arc<dyn EntityStore<InventoryUnit>>,
            Arc::clone(&self.users) as Arc<dyn EntityStore<User>>,
            Arc::clone(&self.dispatcher) as Arc<dyn NotificationDispatcher>,
            EngineConfig::default().sale_numbering,
        )
    }

    /// Builds a task pipeline over the harness stores.
    #[must_use]
    pub fn task_pipeline(&self) -> TaskPipeline {
        TaskPipeline::new(
            Arc::clone(&self.tasks) as Arc<dyn EntityStore<Task>>,
            Arc::clone(&self.users) as Arc<dyn EntityStore<User>>,
            Arc::clone(&self.dispatcher) as Arc<dyn NotificationDispatcher>,
        )
    }

    /// Builds a notification service over the harness store.
    #[must_use]
    pub fn notification_service(&self) -> NotificationService {
        NotificationService::new(Arc::clone(&self.notifications) as Arc<dyn NotificationStore>)
    }

    /// Creates an active user and returns an [`Actor`] for them.
    pub async fn actor(&self, role: Role) -> Result<Actor> {
        let user = self.add_user("Test Actor", role).await?;
        Ok(Actor::from(&user))
    }

    /// Creates an active user with the given role.
    pub async fn add_user(&self, name: &str, role: Role) -> Result<User> {
        let now = Utc::now();
        self.users
            .create(User {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                role,
                active: true,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// Creates an inactive user.
    pub async fn add_inactive_user(&self, name: &str) -> Result<User> {
        let mut user = self.add_user(name, Role::Agent).await?;
        user.active = false;
        self.users.update(user).await
    }

    /// Inserts a lead owned by the actor, bypassing the pipeline.
    pub async fn add_lead(&self, actor: &Actor, name: &str) -> Result<Lead> {
        self.leads.create(sample_lead(name, actor.id)).await
    }

    /// Inserts a client, bypassing the pipeline.
    pub async fn add_client(&self, name: &str) -> Result<Client> {
        let now = Utc::now();
        self.clients
            .create(Client {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: None,
                phone: None,
                lead_id: None,
                verified: false,
                credit_limit: None,
                tags: Vec::new(),
                assigned_to: None,
                created_by: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// Inserts an available inventory unit.
    pub async fn add_inventory(&self, name: &str) -> Result<InventoryUnit> {
        let now = Utc::now();
        self.inventory
            .create(InventoryUnit {
                id: Uuid::new_v4(),
                name: name.to_string(),
                unit_price: Some(450_000.0),
                status: InventoryStatus::Available,
                created_by: Uuid::new_v4(),
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// Inserts an inventory unit that is already sold.
    pub async fn add_sold_inventory(&self, name: &str) -> Result<InventoryUnit> {
        let mut unit = self.add_inventory(name).await?;
        unit.status = InventoryStatus::Sold;
        self.inventory.update(unit).await
    }
}

impl Default for PipelineHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a fresh lead with sensible defaults, without touching a store.
#[must_use]
pub fn sample_lead(name: &str, created_by: Uuid) -> Lead {
    let now = Utc::now();
    Lead {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: None,
        phone: None,
        status: LeadStatus::New,
        score: 0,
        budget_min: None,
        budget_max: None,
        next_follow_up: None,
        tags: Vec::new(),
        assigned_to: None,
        created_by,
        created_at: now,
        updated_at: now,
    }
}

/// Builds a fresh pending sale with sensible defaults, without touching a store.
#[must_use]
pub fn sample_sale(created_by: Uuid) -> Sale {
    let now = Utc::now();
    Sale {
        id: Uuid::new_v4(),
        number: "SO-TEST-000001".to_string(),
        client_id: Uuid::new_v4(),
        inventory_id: Uuid::new_v4(),
        salesperson_id: None,
        manager_id: None,
        status: SaleStatus::Pending,
        total_amount: 100_000.0,
        discount_amount: 0.0,
        final_amount: 100_000.0,
        approved_by: None,
        approved_at: None,
        completed_at: None,
        cancelled_reason: None,
        notes: None,
        assigned_to: None,
        created_by,
        created_at: now,
        updated_at: now,
    }
}
