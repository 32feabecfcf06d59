//! Retrying per-record stock writer
//!
//! One update is a read-adjust-write cycle: fetch the product record
//! (or reuse a snapshot the caller already holds), set the normalized
//! quantity, PUT the whole record back. Transient failures are
//! retried with exponential backoff; after the attempt budget is
//! spent the last cause is surfaced as [`UpdateError::Exhausted`].
//!
//! # Known limitation
//!
//! The remote store has no compare-and-swap, so this is last-write-
//! wins: two concurrent updates to the same record can each read the
//! same quantity and the later write silently discards the earlier
//! one's intent. Inventing client-side locking would not help — other
//! storefront instances write to the same store. The race is
//! documented and exercised in the tests instead of papered over.

use shared::ProductRecord;
use std::sync::Arc;
use std::time::Duration;
use store_client::{ClientError, ProductStore};
use thiserror::Error;

/// Default retry budget per update.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Stock update errors
#[derive(Debug, Error)]
pub enum UpdateError {
    /// All attempts failed; `source` is the last cause.
    #[error("stock update for product {product_id} exhausted {attempts} attempts: {source}")]
    Exhausted {
        product_id: String,
        attempts: u32,
        #[source]
        source: ClientError,
    },
}

impl UpdateError {
    pub fn product_id(&self) -> &str {
        match self {
            UpdateError::Exhausted { product_id, .. } => product_id,
        }
    }
}

/// Performs one retrying read-adjust-write cycle per call.
#[derive(Clone)]
pub struct StockUpdater {
    products: Arc<dyn ProductStore>,
    attempts: u32,
    base_delay: Duration,
}

impl StockUpdater {
    /// `attempts` is the total number of tries (clamped to at least
    /// one); the wait before retry `i` (1-based) is
    /// `base_delay × 2^(i-1)`.
    pub fn new(products: Arc<dyn ProductStore>, attempts: u32, base_delay: Duration) -> Self {
        Self {
            products,
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Write `desired_quantity` (floored at zero) to the product's
    /// record.
    ///
    /// When `known` is supplied the read is skipped and the snapshot
    /// adjusted directly — the reconciler already fetched the record
    /// to compute deltas, so this saves a round trip per product.
    pub async fn update(
        &self,
        product_id: &str,
        desired_quantity: i64,
        known: Option<ProductRecord>,
    ) -> Result<(), UpdateError> {
        let mut last_cause = None;

        for attempt in 0..self.attempts {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(
                    product_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "backing off before stock update retry"
                );
                tokio::time::sleep(delay).await;
            }

            match self
                .try_once(product_id, desired_quantity, known.as_ref())
                .await
            {
                Ok(()) => {
                    if attempt > 0 {
                        tracing::info!(product_id, attempt, "stock update succeeded after retry");
                    }
                    return Ok(());
                }
                Err(cause) => {
                    tracing::warn!(
                        product_id,
                        attempt,
                        error = %cause,
                        "stock update attempt failed"
                    );
                    last_cause = Some(cause);
                }
            }
        }

        Err(UpdateError::Exhausted {
            product_id: product_id.to_string(),
            attempts: self.attempts,
            // attempts >= 1, so at least one cause was recorded
            source: last_cause.unwrap_or(ClientError::Unavailable("no attempt made".into())),
        })
    }

    async fn try_once(
        &self,
        product_id: &str,
        desired_quantity: i64,
        known: Option<&ProductRecord>,
    ) -> Result<(), ClientError> {
        let mut record = match known {
            Some(snapshot) => snapshot.clone(),
            None => self.products.fetch(product_id).await?,
        };
        // set_available_quantity floors at zero; the store must never
        // see a negative quantity.
        record.set_available_quantity(desired_quantity);
        self.products.replace(&record).await
    }
}
