//! Order store client

use crate::error::ClientResult;
use crate::http::HttpClient;
use async_trait::async_trait;
use shared::Order;

/// Access to the remote order collection.
///
/// `create` returns the order as persisted, with the store-assigned
/// id filled in.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list(&self) -> ClientResult<Vec<Order>>;
    async fn create(&self, order: &Order) -> ClientResult<Order>;
    async fn update(&self, order: &Order) -> ClientResult<Order>;
    async fn delete(&self, order_id: &str) -> ClientResult<()>;
}

/// HTTP-backed order store.
pub struct HttpOrderStore {
    http: HttpClient,
}

impl HttpOrderStore {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl OrderStore for HttpOrderStore {
    async fn list(&self) -> ClientResult<Vec<Order>> {
        self.http.get_json("orders").await
    }

    async fn create(&self, order: &Order) -> ClientResult<Order> {
        self.http.post_json("orders", order).await
    }

    async fn update(&self, order: &Order) -> ClientResult<Order> {
        let id = order.id.as_deref().unwrap_or_default();
        self.http.put_json(&format!("orders/{id}"), order).await
    }

    async fn delete(&self, order_id: &str) -> ClientResult<()> {
        self.http.delete(&format!("orders/{order_id}")).await
    }
}
