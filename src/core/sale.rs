//! Sale business logic - Handles all sale-related operations.
//!
//! The sale lifecycle moves only through the explicit actions here:
//! draft/pending -> approved -> completed, with cancellation reachable from
//! any non-terminal state. There is no status patch; `update` touches the
//! commercial fields and recomputes the financial derivation
//! (`final_amount = total_amount - discount_amount`) whenever an amount
//! changes.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::SaleNumberingConfig,
    core::{require, require_active_user, validate},
    dispatch::NotificationDispatcher,
    entities::{
        Actor, Client, InventoryStatus, InventoryUnit, Notification, NotificationKind, Sale,
        SaleStatus, User,
    },
    errors::{Error, Result},
    policy,
    store::{EntityStore, ListFilter},
};

/// Request to create a sale.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateSaleRequest {
    /// The purchasing client; must exist
    pub client_id: Uuid,
    /// The unit being sold; must exist and not already be sold
    pub inventory_id: Uuid,
    /// Salesperson on the sale; must be an active user
    #[serde(default)]
    pub salesperson_id: Option<Uuid>,
    /// Manager on the sale; must be an active user
    #[serde(default)]
    pub manager_id: Option<Uuid>,
    /// Gross amount, strictly positive
    pub total_amount: f64,
    /// Discount, non-negative and at most `total_amount`
    #[serde(default)]
    pub discount_amount: f64,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Initial assignee; must be an existing active user
    #[serde(default)]
    pub assigned_to: Option<Uuid>,
}

/// Patch for an existing sale. `None` fields are left unchanged.
/// Status is deliberately absent: transitions go through
/// [`SalePipeline::approve`], [`SalePipeline::complete`] and
/// [`SalePipeline::cancel`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateSaleRequest {
    /// New salesperson; must be an active user
    pub salesperson_id: Option<Uuid>,
    /// New manager; must be an active user
    pub manager_id: Option<Uuid>,
    /// New gross amount
    pub total_amount: Option<f64>,
    /// New discount
    pub discount_amount: Option<f64>,
    /// New notes
    pub notes: Option<String>,
    /// New assignee; must be an existing active user
    pub assigned_to: Option<Uuid>,
}

/// Owns the sale lifecycle, approval flow and financial derivation.
pub struct SalePipeline {
    sales: Arc<dyn EntityStore<Sale>>,
    clients: Arc<dyn EntityStore<Client>>,
    inventory: Arc<dyn EntityStore<InventoryUnit>>,
    users: Arc<dyn EntityStore<User>>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    numbering: SaleNumberingConfig,
}

impl SalePipeline {
    /// Builds the pipeline over its collaborator ports.
    #[must_use]
    pub fn new(
        sales: Arc<dyn EntityStore<Sale>>,
        clients: Arc<dyn EntityStore<Client>>,
        inventory: Arc<dyn EntityStore<InventoryUnit>>,
        users: Arc<dyn EntityStore<User>>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        numbering: SaleNumberingConfig,
    ) -> Self {
        Self {
            sales,
            clients,
            inventory,
            users,
            dispatcher,
            numbering,
        }
    }

    /// Creates a sale in `pending` status with a generated sale number.
    /// The client and inventory unit must resolve; a sold unit is not
    /// sellable again.
    pub async fn create(&self, actor: &Actor, request: CreateSaleRequest) -> Result<Sale> {
        validate::positive_amount("total_amount", request.total_amount)?;
        validate::non_negative("discount_amount", request.discount_amount)?;
        if request.discount_amount > request.total_amount {
            return Err(Error::validation(
                "discount_amount",
                format!(
                    "discount {} exceeds total {}",
                    request.discount_amount, request.total_amount
                ),
            ));
        }

        self.clients
            .get(request.client_id)
            .await?
            .ok_or_else(|| {
                Error::dependency("client", format!("client {} does not exist", request.client_id))
            })?;
        let unit = self
            .inventory
            .get(request.inventory_id)
            .await?
            .ok_or_else(|| {
                Error::dependency(
                    "inventory unit",
                    format!("inventory unit {} does not exist", request.inventory_id),
                )
            })?;
        if unit.status == InventoryStatus::Sold {
            return Err(Error::dependency(
                "inventory unit",
                format!("inventory unit {} is already sold", unit.id),
            ));
        }
        for user_id in [request.salesperson_id, request.manager_id, request.assigned_to]
            .into_iter()
            .flatten()
        {
            require_active_user(self.users.as_ref(), user_id).await?;
        }

        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4(),
            number: self.next_number(),
            client_id: request.client_id,
            inventory_id: request.inventory_id,
            salesperson_id: request.salesperson_id,
            manager_id: request.manager_id,
            status: SaleStatus::Pending,
            total_amount: request.total_amount,
            discount_amount: request.discount_amount,
            final_amount: request.total_amount - request.discount_amount,
            approved_by: None,
            approved_at: None,
            completed_at: None,
            cancelled_reason: None,
            notes: request.notes,
            assigned_to: request.assigned_to,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };

        let sale = self.sales.create(sale).await?;
        info!(sale = %sale.id, number = %sale.number, "sale created");
        if let Some(salesperson) = sale.salesperson_id {
            self.dispatcher.dispatch(Notification::new(
                salesperson,
                NotificationKind::SaleAssigned,
                "Sale assigned to you",
                format!("You are the salesperson on sale {}", sale.number),
                serde_json::json!({ "sale_id": sale.id }),
            ));
        }
        Ok(sale)
    }

    /// Fetches a sale the actor is allowed to read.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Sale> {
        let sale = require(self.sales.as_ref(), id).await?;
        policy::authorize_read(actor, &sale)?;
        Ok(sale)
    }

    /// Lists sales matching the filter, restricted to those the actor can read.
    pub async fn list(&self, actor: &Actor, filter: &ListFilter) -> Result<Vec<Sale>> {
        let mut sales = self.sales.list(filter).await?;
        sales.retain(|sale| policy::can_read(actor, sale));
        Ok(sales)
    }

    /// Updates the commercial fields of a non-terminal sale. Any change to
    /// an amount recomputes `final_amount`.
    pub async fn update(&self, actor: &Actor, id: Uuid, patch: UpdateSaleRequest) -> Result<Sale> {
        let mut sale = require(self.sales.as_ref(), id).await?;
        policy::authorize_write(actor, &sale)?;
        if sale.status.is_terminal() {
            return Err(Error::StateConflict {
                entity: "sale",
                status: sale.status.label().to_string(),
                action: "update",
            });
        }

        let total = patch.total_amount.unwrap_or(sale.total_amount);
        let discount = patch.discount_amount.unwrap_or(sale.discount_amount);
        validate::positive_amount("total_amount", total)?;
        validate::non_negative("discount_amount", discount)?;
        if discount > total {
            return Err(Error::validation(
                "discount_amount",
                format!("discount {discount} exceeds total {total}"),
            ));
        }

        let previous_assignee = sale.assigned_to;
        for user_id in [patch.salesperson_id, patch.manager_id, patch.assigned_to]
            .into_iter()
            .flatten()
        {
            require_active_user(self.users.as_ref(), user_id).await?;
        }

        if let Some(value) = patch.salesperson_id {
            sale.salesperson_id = Some(value);
        }
        if let Some(value) = patch.manager_id {
            sale.manager_id = Some(value);
        }
        if let Some(value) = patch.notes {
            sale.notes = Some(value);
        }
        if let Some(value) = patch.assigned_to {
            sale.assigned_to = Some(value);
        }
        sale.total_amount = total;
        sale.discount_amount = discount;
        sale.final_amount = total - discount;
        sale.updated_at = Utc::now();

        let sale = self.sales.update(sale).await?;
        if let Some(assignee) = sale.assigned_to
            && previous_assignee != Some(assignee)
        {
            self.dispatcher.dispatch(Notification::new(
                assignee,
                NotificationKind::SaleAssigned,
                "Sale assigned to you",
                format!("You are now responsible for sale {}", sale.number),
                serde_json::json!({ "sale_id": sale.id }),
            ));
        }
        Ok(sale)
    }

    /// Approves a draft or pending sale. The approver must be an active user.
    pub async fn approve(&self, actor: &Actor, id: Uuid, approver_id: Uuid) -> Result<Sale> {
        let mut sale = require(self.sales.as_ref(), id).await?;
        policy::authorize_write(actor, &sale)?;
        if !matches!(sale.status, SaleStatus::Draft | SaleStatus::Pending) {
            return Err(Error::StateConflict {
                entity: "sale",
                status: sale.status.label().to_string(),
                action: "approve",
            });
        }
        require_active_user(self.users.as_ref(), approver_id).await?;

        sale.status = SaleStatus::Approved;
        sale.approved_by = Some(approver_id);
        sale.approved_at = Some(Utc::now());
        sale.updated_at = Utc::now();
        let sale = self.sales.update(sale).await?;
        info!(sale = %sale.id, approver = %approver_id, "sale approved");
        self.notify_status_change(&sale, "approved");
        Ok(sale)
    }

    /// Completes an approved sale and marks its inventory unit sold.
    pub async fn complete(&self, actor: &Actor, id: Uuid) -> Result<Sale> {
        let mut sale = require(self.sales.as_ref(), id).await?;
        policy::authorize_write(actor, &sale)?;
        if sale.status != SaleStatus::Approved {
            return Err(Error::StateConflict {
                entity: "sale",
                status: sale.status.label().to_string(),
                action: "complete",
            });
        }

        sale.status = SaleStatus::Completed;
        sale.completed_at = Some(Utc::now());
        sale.updated_at = Utc::now();
        let sale = self.sales.update(sale).await?;
        info!(sale = %sale.id, "sale completed");

        // The sale record is the source of truth; flipping the unit is
        // best-effort and a failure must not roll the sale back.
        match self.inventory.get(sale.inventory_id).await {
            Ok(Some(mut unit)) => {
                unit.status = InventoryStatus::Sold;
                unit.updated_at = Utc::now();
                if let Err(e) = self.inventory.update(unit).await {
                    warn!(sale = %sale.id, "failed to mark inventory unit sold: {e}");
                }
            }
            Ok(None) => {
                warn!(sale = %sale.id, unit = %sale.inventory_id, "inventory unit missing at completion");
            }
            Err(e) => warn!(sale = %sale.id, "failed to load inventory unit: {e}"),
        }

        self.notify_status_change(&sale, "completed");
        Ok(sale)
    }

    /// Cancels any non-terminal sale, recording the reason.
    pub async fn cancel(&self, actor: &Actor, id: Uuid, reason: Option<String>) -> Result<Sale> {
        let mut sale = require(self.sales.as_ref(), id).await?;
        policy::authorize_write(actor, &sale)?;
        if sale.status.is_terminal() {
            return Err(Error::StateConflict {
                entity: "sale",
                status: sale.status.label().to_string(),
                action: "cancel",
            });
        }

        sale.status = SaleStatus::Cancelled;
        sale.cancelled_reason = reason;
        sale.updated_at = Utc::now();
        let sale = self.sales.update(sale).await?;
        info!(sale = %sale.id, "sale cancelled");
        self.notify_status_change(&sale, "cancelled");
        Ok(sale)
    }

    /// Deletes a sale. Completed sales are financial records and must not
    /// disappear.
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let sale = require(self.sales.as_ref(), id).await?;
        policy::authorize_write(actor, &sale)?;
        if sale.status == SaleStatus::Completed {
            return Err(Error::StateConflict {
                entity: "sale",
                status: sale.status.label().to_string(),
                action: "delete",
            });
        }
        self.sales.delete(sale.id).await
    }

    /// Status-change notifications go to the salesperson and, if present,
    /// the manager; one notification each even when both slots name the
    /// same user.
    fn notify_status_change(&self, sale: &Sale, verb: &str) {
        let mut recipients: Vec<Uuid> =
            sale.salesperson_id.into_iter().chain(sale.manager_id).collect();
        recipients.dedup();
        for user_id in recipients {
            self.dispatcher.dispatch(Notification::new(
                user_id,
                NotificationKind::SaleStatusChanged,
                format!("Sale {verb}"),
                format!("Sale {} was {verb}", sale.number),
                serde_json::json!({ "sale_id": sale.id, "status": sale.status.label() }),
            ));
        }
    }

    fn next_number(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
        if self.numbering.date_stamp {
            format!("{}-{}-{}", self.numbering.prefix, Utc::now().format("%Y%m%d"), suffix)
        } else {
            format!("{}-{}", self.numbering.prefix, suffix)
        }
    }
}
