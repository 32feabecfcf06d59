//! Storefront stock reconciliation engine
//!
//! The remote product store offers no transactions, no compare-and-
//! swap and no batch writes, so applying a *set* of inventory
//! adjustments is a batch of racy read-adjust-write cycles that must
//! be bounded, retried and — on the create path — compensated when it
//! only partially lands. This crate is that machinery:
//!
//! - **scheduler** — runs a batch of tasks with a concurrency
//!   ceiling, preserving per-task result order
//! - **stock** — one retrying read-adjust-write cycle against one
//!   product record
//! - **reconcile** — per-product delta computation and batch
//!   orchestration for order create/edit/delete
//! - **offline** — durable queue for orders accepted while the
//!   remote order store is unconfigured, replayed later
//!
//! # Module structure
//!
//! ```text
//! stock-engine/src/
//! ├── config.rs      # Env-driven engine settings
//! ├── logger.rs      # tracing-subscriber setup
//! ├── scheduler.rs   # Bounded-concurrency batch runner
//! ├── stock.rs       # Retrying per-record updater
//! ├── reconcile/     # Deltas + create/edit/restore orchestration
//! └── offline.rs     # redb-backed offline order queue
//! ```

pub mod config;
pub mod logger;
pub mod offline;
pub mod reconcile;
pub mod scheduler;
pub mod stock;

pub use config::EngineConfig;
pub use offline::{OfflineOrderQueue, QueueError, QueuedOrder, SyncReport};
pub use reconcile::{compute_deltas, ReconcileError, ReconciliationDelta, StockReconciler};
pub use stock::{StockUpdater, UpdateError};
