//! redb-backed offline order queue
//!
//! When the remote order store is not configured, accepted orders are
//! parked here and replayed later. The queue is one JSON array under
//! a well-known key in a single redb table — the layout the legacy
//! storefront used in its key-value store, kept for a painless
//! migration of existing queues:
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | `local_state` | `offline_orders` | JSON `Vec<QueuedOrder>` |
//!
//! Inventory is adjusted exactly once, at creation time, by the
//! reconciler. Replay only moves the order itself to the remote
//! store; it deliberately performs no stock writes (the legacy
//! storefront decremented a second time during sync, which
//! double-booked inventory — see DESIGN.md).

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use shared::{util, Order};
use std::path::Path;
use std::sync::Arc;
use store_client::OrderStore;
use thiserror::Error;

/// Single table holding edge-local state.
const STATE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("local_state");

/// Well-known key for the queued order list.
const QUEUE_KEY: &str = "offline_orders";

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("queued order not found: {0}")]
    NotFound(String),
}

pub type QueueResult<T> = Result<T, QueueError>;

/// One parked order. `sync_error` is set when a replay attempt for
/// this entry failed; the entry stays queued for the next sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedOrder {
    pub order: Order,
    #[serde(default)]
    pub sync_error: bool,
}

/// Outcome of one replay sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries persisted remotely and removed from the queue.
    pub succeeded: usize,
    /// Entries still queued after the sweep.
    pub queued: usize,
    /// Still-queued entries carrying a sync-error flag.
    pub flagged: usize,
}

/// Durable FIFO queue for orders accepted while offline.
#[derive(Clone)]
pub struct OfflineOrderQueue {
    db: Arc<Database>,
}

impl OfflineOrderQueue {
    /// Open (or create) the queue database at `path`.
    pub fn open(path: impl AsRef<Path>) -> QueueResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// In-memory queue for tests.
    pub fn open_in_memory() -> QueueResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> QueueResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(STATE_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Park an order locally. Assigns a `local-<millis>` id (bumped
    /// on collision), marks the order local, appends in FIFO order.
    /// Does not touch inventory.
    pub fn enqueue(&self, mut order: Order) -> QueueResult<Order> {
        let mut entries = self.load()?;

        let mut millis = util::now_millis();
        let taken = |id: &str, entries: &[QueuedOrder]| {
            entries.iter().any(|e| e.order.id.as_deref() == Some(id))
        };
        while taken(&util::local_order_id(millis), &entries) {
            millis += 1;
        }

        order.id = Some(util::local_order_id(millis));
        order.is_local = true;
        entries.push(QueuedOrder {
            order: order.clone(),
            sync_error: false,
        });
        self.save(&entries)?;
        tracing::info!(order_id = ?order.id, queued = entries.len(), "order queued offline");
        Ok(order)
    }

    /// Queued entries in FIFO order.
    pub fn list(&self) -> QueueResult<Vec<QueuedOrder>> {
        self.load()
    }

    /// Remove one entry by local id.
    pub fn remove(&self, order_id: &str) -> QueueResult<()> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| e.order.id.as_deref() != Some(order_id));
        if entries.len() == before {
            return Err(QueueError::NotFound(order_id.to_string()));
        }
        self.save(&entries)
    }

    /// Replace a queued order in place (edit of a not-yet-synced
    /// order). Clears any sync-error flag, the entry changed.
    pub fn update_entry(&self, order: &Order) -> QueueResult<()> {
        let mut entries = self.load()?;
        let slot = entries
            .iter_mut()
            .find(|e| e.order.id == order.id)
            .ok_or_else(|| QueueError::NotFound(order.id.clone().unwrap_or_default()))?;
        slot.order = order.clone();
        slot.sync_error = false;
        self.save(&entries)
    }

    /// Replay the queue against a now-reachable order store.
    ///
    /// FIFO; a failing entry is flagged and left queued, and the
    /// sweep continues with the next one. Individual failures never
    /// surface as an error — the report carries the counts.
    pub async fn replay(&self, store: &dyn OrderStore) -> QueueResult<SyncReport> {
        let entries = self.load()?;
        let mut report = SyncReport::default();

        for entry in entries {
            let local_id = entry.order.id.clone().unwrap_or_default();

            // The remote store assigns the persisted id.
            let mut outbound = entry.order.clone();
            outbound.id = None;
            outbound.is_local = false;

            match store.create(&outbound).await {
                Ok(persisted) => {
                    self.remove(&local_id)?;
                    report.succeeded += 1;
                    tracing::info!(
                        %local_id,
                        remote_id = ?persisted.id,
                        "queued order replayed to remote store"
                    );
                }
                Err(e) => {
                    tracing::warn!(%local_id, error = %e, "replay failed, entry stays queued");
                    self.flag(&local_id)?;
                }
            }
        }

        let remaining = self.load()?;
        report.queued = remaining.len();
        report.flagged = remaining.iter().filter(|e| e.sync_error).count();
        tracing::info!(
            succeeded = report.succeeded,
            queued = report.queued,
            flagged = report.flagged,
            "offline replay sweep finished"
        );
        Ok(report)
    }

    fn flag(&self, order_id: &str) -> QueueResult<()> {
        let mut entries = self.load()?;
        if let Some(entry) = entries
            .iter_mut()
            .find(|e| e.order.id.as_deref() == Some(order_id))
        {
            entry.sync_error = true;
        }
        self.save(&entries)
    }

    fn load(&self) -> QueueResult<Vec<QueuedOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STATE_TABLE)?;
        match table.get(QUEUE_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(bytes.value())?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, entries: &[QueuedOrder]) -> QueueResult<()> {
        let bytes = serde_json::to_vec(entries)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(STATE_TABLE)?;
            table.insert(QUEUE_KEY, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
