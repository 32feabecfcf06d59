//! Offline order replay
//!
//! One sweep of the offline queue against the remote order store:
//! run it when connectivity to the store is back. Individual entry
//! failures are flagged and left queued for the next run.

use anyhow::Context;
use stock_engine::{EngineConfig, OfflineOrderQueue};
use store_client::{HttpClient, HttpOrderStore, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    stock_engine::logger::init_logger();

    let store_config = StoreConfig::from_env();
    let engine_config = EngineConfig::from_env();

    let order_store_url = store_config
        .order_store_url
        .clone()
        .context("ORDER_STORE_URL is not configured; nothing to replay against")?;

    std::fs::create_dir_all(&engine_config.work_dir)
        .with_context(|| format!("creating work dir {}", engine_config.work_dir))?;
    let queue = OfflineOrderQueue::open(engine_config.queue_db_path())
        .context("opening offline order queue")?;

    let pending = queue.list()?.len();
    tracing::info!(pending, url = %order_store_url, "starting offline order replay");

    let orders = HttpOrderStore::new(HttpClient::new(
        order_store_url,
        store_config.request_timeout_ms,
    )?);
    let report = queue.replay(&orders).await?;

    tracing::info!(
        succeeded = report.succeeded,
        queued = report.queued,
        flagged = report.flagged,
        "replay complete"
    );
    Ok(())
}
