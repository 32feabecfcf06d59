//! Stock reconciliation for order create/edit/delete
//!
//! A reconciliation batch walks fixed phases: validate, compute the
//! per-product adjustments, execute them as a bounded batch of
//! retrying updates, then either commit the order or (create path
//! only) roll applied updates back. Each batch gets a correlation id
//! that tags every log line it emits.
//!
//! Two inherited quirks of the storefront are preserved deliberately,
//! not fixed in passing:
//!
//! - **Create vs. edit asymmetry.** A partially failed create batch
//!   restores the products it already updated; a partially failed
//!   edit batch does not — applied writes stay applied, only the
//!   order itself is left untouched. See DESIGN.md.
//! - **Best-effort compensation.** Rollback writes get a single
//!   attempt; a compensation failure is logged and reported through
//!   [`ReconcileError::PartialFailure::compensated`], and inventory
//!   may be left inconsistent until someone retries the operation.

mod deltas;

pub use deltas::{compute_deltas, ReconciliationDelta};

use crate::config::EngineConfig;
use crate::offline::{OfflineOrderQueue, QueueError};
use crate::scheduler;
use crate::stock::{StockUpdater, UpdateError};
use shared::{util, Order, OrderLineItem, ProductRecord};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use store_client::{ClientError, OrderStore, ProductStore, UserDirectory};
use thiserror::Error;
use uuid::Uuid;

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Input rejected before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Requested quantity exceeds availability; nothing was written.
    #[error("insufficient stock for product {0}")]
    InsufficientStock(String),

    /// One or more updates in the batch failed after retries.
    /// `compensated` reports whether every already-applied update was
    /// successfully restored (always `false` on the edit path, which
    /// does not compensate).
    #[error("{} of {} stock updates failed (compensated: {compensated})", .failed.len(), .total)]
    PartialFailure {
        total: usize,
        failed: Vec<UpdateError>,
        compensated: bool,
    },

    /// A read or the order persistence step failed.
    #[error("store error: {0}")]
    Store(#[from] ClientError),

    /// The offline queue could not be read or written.
    #[error("offline queue error: {0}")]
    Queue(#[from] QueueError),
}

/// One planned write: product, its snapshot, prior and target
/// quantity. Kept around after execution so the create path can
/// restore `prior_quantity` on rollback.
struct UpdatePlan {
    product_id: String,
    prior_quantity: i64,
    target_quantity: i64,
    snapshot: ProductRecord,
}

/// Orchestrates inventory adjustment batches for order operations.
pub struct StockReconciler {
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserDirectory>,
    orders: Option<Arc<dyn OrderStore>>,
    queue: OfflineOrderQueue,
    limit: usize,
    attempts: u32,
    base_delay: Duration,
}

impl StockReconciler {
    /// `orders` is `None` when the remote order store is not
    /// configured; created orders then land on the offline queue.
    pub fn new(
        products: Arc<dyn ProductStore>,
        users: Arc<dyn UserDirectory>,
        orders: Option<Arc<dyn OrderStore>>,
        queue: OfflineOrderQueue,
        config: &EngineConfig,
    ) -> Self {
        Self {
            products,
            users,
            orders,
            queue,
            limit: config.concurrency_limit,
            attempts: config.retry_attempts,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Create an order: consume stock for every line, then persist.
    ///
    /// Stock is checked against availability before any write; a
    /// partial batch failure triggers best-effort rollback of the
    /// updates that did land.
    pub async fn create_order(
        &self,
        user_email: &str,
        items: Vec<OrderLineItem>,
    ) -> Result<Order, ReconcileError> {
        let batch_id = Uuid::new_v4();
        tracing::info!(%batch_id, items = items.len(), "validating order create");
        self.validate(user_email, &items).await?;

        // Read every affected product up front; reject the whole
        // order before the first write if anything is short.
        let mut plans = Vec::new();
        for (product_id, desired) in requested_quantities(&items) {
            let record = self.products.fetch(&product_id).await?;
            let available = record.available_quantity();
            if desired > available {
                tracing::info!(%batch_id, %product_id, desired, available, "insufficient stock");
                return Err(ReconcileError::InsufficientStock(product_id));
            }
            plans.push(UpdatePlan {
                product_id,
                prior_quantity: available,
                target_quantity: available - desired,
                snapshot: record,
            });
        }

        tracing::info!(%batch_id, tasks = plans.len(), limit = self.limit, "executing stock batch");
        let outcomes = self.run_batch(&plans).await;
        if outcomes.iter().any(Result::is_err) {
            tracing::warn!(
                %batch_id,
                total = plans.len(),
                "stock batch partially failed, rolling back applied updates"
            );
            let compensated = self.compensate(batch_id, &plans, &outcomes).await;
            return Err(ReconcileError::PartialFailure {
                total: plans.len(),
                failed: collect_failures(outcomes),
                compensated,
            });
        }

        let order = Order::draft(user_email, items);
        let persisted = match &self.orders {
            Some(store) => store.create(&order).await?,
            None => {
                tracing::info!(%batch_id, "order store unconfigured, queueing order locally");
                self.queue.enqueue(order)?
            }
        };
        tracing::info!(%batch_id, order_id = ?persisted.id, "order persisted");
        Ok(persisted)
    }

    /// Edit an order: apply the net per-product deltas between the
    /// previous and new item sets, then persist the new item set.
    ///
    /// On partial batch failure the order is NOT persisted, but
    /// updates that already landed are NOT rolled back either — the
    /// inherited asymmetry with the create path.
    pub async fn edit_order(
        &self,
        previous: &Order,
        mut next: Order,
    ) -> Result<Order, ReconcileError> {
        let batch_id = Uuid::new_v4();
        tracing::info!(%batch_id, order_id = ?previous.id, "validating order edit");
        self.validate(&next.user_email, &next.items).await?;

        let deltas = compute_deltas(&previous.items, &next.items);
        let mut plans = Vec::new();
        for delta in deltas {
            let record = self.products.fetch(&delta.product_id).await?;
            let available = record.available_quantity();
            plans.push(UpdatePlan {
                product_id: delta.product_id,
                prior_quantity: available,
                target_quantity: available + delta.delta,
                snapshot: record,
            });
        }

        tracing::info!(%batch_id, tasks = plans.len(), limit = self.limit, "executing stock batch");
        let outcomes = self.run_batch(&plans).await;
        if outcomes.iter().any(Result::is_err) {
            // No rollback here: applied writes stay applied and the
            // order keeps its previous item set.
            tracing::warn!(
                %batch_id,
                total = plans.len(),
                "edit stock batch partially failed, order not persisted"
            );
            return Err(ReconcileError::PartialFailure {
                total: plans.len(),
                failed: collect_failures(outcomes),
                compensated: false,
            });
        }

        next.recompute_subtotal();
        let persisted = self.persist_edit(next).await?;
        tracing::info!(%batch_id, order_id = ?persisted.id, "order edit persisted");
        Ok(persisted)
    }

    /// Return stock for (part of) an order, then delete the order.
    ///
    /// `return_quantities` maps line index → quantity to put back;
    /// lines absent from the map or mapped to zero are skipped. The
    /// order is only removed after the whole batch succeeds.
    pub async fn restore_and_delete(
        &self,
        order: &Order,
        return_quantities: &HashMap<usize, u32>,
    ) -> Result<(), ReconcileError> {
        let batch_id = Uuid::new_v4();

        // Rejected before any stock moves: an id-less order cannot be
        // deleted anywhere, and a restore without the delete would
        // put stock back while the order still exists.
        let order_id = order.id.as_deref().unwrap_or_default();
        if order_id.is_empty() {
            return Err(ReconcileError::Validation(
                "cannot delete an order without an id".into(),
            ));
        }

        // Aggregate per product so one batch never carries two
        // adjustments for the same record.
        let mut returns: BTreeMap<String, i64> = BTreeMap::new();
        for (line, qty) in return_quantities {
            if *qty == 0 {
                continue;
            }
            if let Some(item) = order.items.get(*line) {
                *returns.entry(item.product_id.clone()).or_default() += i64::from(*qty);
            }
        }

        let mut plans = Vec::new();
        for (product_id, returned) in returns {
            let record = self.products.fetch(&product_id).await?;
            let available = record.available_quantity();
            plans.push(UpdatePlan {
                product_id,
                prior_quantity: available,
                // no ceiling on the add side, only the zero floor
                target_quantity: available + returned,
                snapshot: record,
            });
        }

        tracing::info!(%batch_id, order_id = ?order.id, tasks = plans.len(), "restoring stock before delete");
        let outcomes = self.run_batch(&plans).await;
        if outcomes.iter().any(Result::is_err) {
            // Order is retained; some stock may already be back on
            // the shelf. Surfaced, not auto-retried.
            tracing::warn!(
                %batch_id,
                total = plans.len(),
                "restore batch partially failed, order retained"
            );
            return Err(ReconcileError::PartialFailure {
                total: plans.len(),
                failed: collect_failures(outcomes),
                compensated: false,
            });
        }

        if order.is_local || util::is_local_id(order_id) {
            self.queue.remove(order_id)?;
        } else {
            self.require_order_store()?.delete(order_id).await?;
        }
        tracing::info!(%batch_id, order_id, "order deleted after stock restore");
        Ok(())
    }

    /// Replay queued offline orders against the remote order store.
    pub async fn sync_offline_orders(&self) -> Result<crate::offline::SyncReport, ReconcileError> {
        let store = self.require_order_store()?;
        Ok(self.queue.replay(store.as_ref()).await?)
    }

    async fn validate(
        &self,
        user_email: &str,
        items: &[OrderLineItem],
    ) -> Result<(), ReconcileError> {
        if items.is_empty() {
            return Err(ReconcileError::Validation("order has no items".into()));
        }
        if items.iter().any(|i| i.quantity == 0) {
            return Err(ReconcileError::Validation(
                "line item quantity must be positive".into(),
            ));
        }
        if user_email.trim().is_empty() {
            return Err(ReconcileError::Validation("user email is empty".into()));
        }
        match self.users.find_by_email(user_email).await? {
            Some(_) => Ok(()),
            None => Err(ReconcileError::Validation(format!(
                "no registered user for {user_email}"
            ))),
        }
    }

    /// Execute the planned updates through the bounded scheduler.
    /// Outcome slots line up with `plans` by index.
    async fn run_batch(&self, plans: &[UpdatePlan]) -> Vec<Result<(), UpdateError>> {
        let updater = StockUpdater::new(self.products.clone(), self.attempts, self.base_delay);
        let tasks: Vec<_> = plans
            .iter()
            .map(|plan| {
                let updater = updater.clone();
                let product_id = plan.product_id.clone();
                let snapshot = plan.snapshot.clone();
                let target = plan.target_quantity;
                async move { updater.update(&product_id, target, Some(snapshot)).await }
            })
            .collect();
        scheduler::run_bounded(tasks, self.limit).await
    }

    /// Best-effort rollback of the updates that succeeded: write each
    /// one's prior quantity back with a single attempt. Returns
    /// whether every restore landed.
    async fn compensate(
        &self,
        batch_id: Uuid,
        plans: &[UpdatePlan],
        outcomes: &[Result<(), UpdateError>],
    ) -> bool {
        let updater = StockUpdater::new(self.products.clone(), 1, self.base_delay);
        let tasks: Vec<_> = plans
            .iter()
            .zip(outcomes)
            .filter(|(_, outcome)| outcome.is_ok())
            .map(|(plan, _)| {
                let updater = updater.clone();
                let product_id = plan.product_id.clone();
                let snapshot = plan.snapshot.clone();
                let prior = plan.prior_quantity;
                async move { updater.update(&product_id, prior, Some(snapshot)).await }
            })
            .collect();

        if tasks.is_empty() {
            return true;
        }

        let restored = scheduler::run_bounded(tasks, self.limit).await;
        let mut compensated = true;
        for outcome in &restored {
            if let Err(e) = outcome {
                compensated = false;
                tracing::error!(
                    %batch_id,
                    product_id = e.product_id(),
                    error = %e,
                    "compensation write failed, inventory may be inconsistent"
                );
            }
        }
        compensated
    }

    async fn persist_edit(&self, order: Order) -> Result<Order, ReconcileError> {
        let order_id = order.id.as_deref().unwrap_or_default();
        if order.is_local || util::is_local_id(order_id) {
            self.queue.update_entry(&order)?;
            return Ok(order);
        }
        Ok(self.require_order_store()?.update(&order).await?)
    }

    fn require_order_store(&self) -> Result<&Arc<dyn OrderStore>, ReconcileError> {
        self.orders.as_ref().ok_or_else(|| {
            ReconcileError::Store(ClientError::Config("order store is not configured".into()))
        })
    }
}

/// Total requested quantity per distinct product, in stable order.
fn requested_quantities(items: &[OrderLineItem]) -> BTreeMap<String, i64> {
    let mut requested: BTreeMap<String, i64> = BTreeMap::new();
    for item in items {
        *requested.entry(item.product_id.clone()).or_default() += i64::from(item.quantity);
    }
    requested
}

fn collect_failures(outcomes: Vec<Result<(), UpdateError>>) -> Vec<UpdateError> {
    outcomes.into_iter().filter_map(Result::err).collect()
}
