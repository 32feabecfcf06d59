//! Product store client
//!
//! The product store has no transactions, no compare-and-swap and no
//! batch endpoint: reads are `GET /products/{id}` and the only write
//! is a whole-record `PUT /products/{id}`. Concurrent writers to the
//! same record are last-write-wins; callers that need more than that
//! have to live without it (see the stock updater's documentation).

use crate::error::ClientResult;
use crate::http::HttpClient;
use async_trait::async_trait;
use shared::ProductRecord;

/// Access to the remote product collection.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetch one product record.
    async fn fetch(&self, product_id: &str) -> ClientResult<ProductRecord>;

    /// Replace one product record wholesale.
    async fn replace(&self, record: &ProductRecord) -> ClientResult<()>;
}

/// HTTP-backed product store.
pub struct HttpProductStore {
    http: HttpClient,
}

impl HttpProductStore {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ProductStore for HttpProductStore {
    async fn fetch(&self, product_id: &str) -> ClientResult<ProductRecord> {
        self.http.get_json(&format!("products/{product_id}")).await
    }

    async fn replace(&self, record: &ProductRecord) -> ClientResult<()> {
        let id = record.id();
        let _echo: serde_json::Value = self
            .http
            .put_json(&format!("products/{id}"), record.as_value())
            .await?;
        Ok(())
    }
}
