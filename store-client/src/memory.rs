//! In-memory store implementations with failure injection
//!
//! Drop-in substitutes for the HTTP stores, used by engine tests and
//! local development. Besides plain storage they support:
//!
//! - injected failures (`fail_next_replacements`, `fail_next_creates`)
//!   that make the next N matching writes return
//!   [`ClientError::Unavailable`], then recover;
//! - read/write counters, so tests can assert "no write happened" or
//!   "the snapshot was reused instead of re-read".

use crate::error::{ClientError, ClientResult};
use crate::orders::OrderStore;
use crate::products::ProductStore;
use crate::users::UserDirectory;
use async_trait::async_trait;
use dashmap::DashMap;
use shared::{Order, ProductRecord, UserRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory product collection.
#[derive(Default)]
pub struct MemoryProductStore {
    records: DashMap<String, ProductRecord>,
    failing_replacements: DashMap<String, usize>,
    failing_nth_replacement: DashMap<String, usize>,
    replace_calls: DashMap<String, usize>,
    fetch_count: AtomicUsize,
    replace_count: AtomicUsize,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ProductRecord) {
        self.records.insert(record.id(), record);
    }

    /// Convenience: current normalized quantity of a stored record.
    pub fn quantity(&self, product_id: &str) -> i64 {
        self.records
            .get(product_id)
            .map(|r| r.available_quantity())
            .unwrap_or(0)
    }

    /// Make the next `n` `replace` calls for `product_id` fail.
    pub fn fail_next_replacements(&self, product_id: &str, n: usize) {
        self.failing_replacements.insert(product_id.to_string(), n);
    }

    /// Make exactly the `n`-th `replace` call (1-based) for
    /// `product_id` fail. Lets a test land an initial write and then
    /// fail a later one for the same record.
    pub fn fail_nth_replacement(&self, product_id: &str, n: usize) {
        self.failing_nth_replacement
            .insert(product_id.to_string(), n);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn replace_count(&self) -> usize {
        self.replace_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn fetch(&self, product_id: &str) -> ClientResult<ProductRecord> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.records
            .get(product_id)
            .map(|r| r.clone())
            .ok_or_else(|| ClientError::NotFound(format!("product {product_id}")))
    }

    async fn replace(&self, record: &ProductRecord) -> ClientResult<()> {
        let id = record.id();
        self.replace_count.fetch_add(1, Ordering::SeqCst);
        let call = {
            let mut calls = self.replace_calls.entry(id.clone()).or_insert(0);
            *calls += 1;
            *calls
        };
        if let Some(mut remaining) = self.failing_replacements.get_mut(&id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ClientError::Unavailable(format!(
                    "injected write failure for product {id}"
                )));
            }
        }
        if self.failing_nth_replacement.get(&id).map(|n| *n) == Some(call) {
            return Err(ClientError::Unavailable(format!(
                "injected write failure for product {id}"
            )));
        }
        if !self.records.contains_key(&id) {
            return Err(ClientError::NotFound(format!("product {id}")));
        }
        self.records.insert(id, record.clone());
        Ok(())
    }
}

/// In-memory order collection. Keeps insertion order, assigns
/// sequential numeric ids like the remote store does.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Vec<Order>>,
    next_id: AtomicUsize,
    failing_creates: AtomicUsize,
    failing_nth_create: AtomicUsize,
    create_count: AtomicUsize,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            ..Self::default()
        }
    }

    /// Make the next `n` `create` calls fail.
    pub fn fail_next_creates(&self, n: usize) {
        self.failing_creates.store(n, Ordering::SeqCst);
    }

    /// Make exactly the `n`-th `create` call (1-based) fail.
    pub fn fail_nth_create(&self, n: usize) {
        self.failing_nth_create.store(n, Ordering::SeqCst);
    }

    pub fn create_count(&self) -> usize {
        self.create_count.load(Ordering::SeqCst)
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().expect("order store poisoned").clone()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn list(&self) -> ClientResult<Vec<Order>> {
        Ok(self.orders())
    }

    async fn create(&self, order: &Order) -> ClientResult<Order> {
        let call = self.create_count.fetch_add(1, Ordering::SeqCst) + 1;
        let failing = self.failing_creates.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_creates.store(failing - 1, Ordering::SeqCst);
            return Err(ClientError::Unavailable(
                "injected order create failure".into(),
            ));
        }
        if self.failing_nth_create.load(Ordering::SeqCst) == call {
            return Err(ClientError::Unavailable(
                "injected order create failure".into(),
            ));
        }
        let mut persisted = order.clone();
        persisted.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst).to_string());
        persisted.is_local = false;
        self.orders
            .lock()
            .expect("order store poisoned")
            .push(persisted.clone());
        Ok(persisted)
    }

    async fn update(&self, order: &Order) -> ClientResult<Order> {
        let mut orders = self.orders.lock().expect("order store poisoned");
        let id = order.id.clone().unwrap_or_default();
        let slot = orders
            .iter_mut()
            .find(|o| o.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| ClientError::NotFound(format!("order {id}")))?;
        *slot = order.clone();
        Ok(order.clone())
    }

    async fn delete(&self, order_id: &str) -> ClientResult<()> {
        let mut orders = self.orders.lock().expect("order store poisoned");
        let before = orders.len();
        orders.retain(|o| o.id.as_deref() != Some(order_id));
        if orders.len() == before {
            return Err(ClientError::NotFound(format!("order {order_id}")));
        }
        Ok(())
    }
}

/// In-memory user directory seeded with known emails.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Vec<UserRecord>,
}

impl MemoryUserDirectory {
    pub fn with_emails(emails: &[&str]) -> Self {
        Self {
            users: emails
                .iter()
                .map(|e| UserRecord {
                    email: e.to_string(),
                    extra: Default::default(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> ClientResult<Option<UserRecord>> {
        Ok(self.users.iter().find(|u| u.matches_email(email)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::OrderLineItem;

    fn record(id: &str, quantity: i64) -> ProductRecord {
        ProductRecord::new(json!({"id": id, "quantity": quantity}))
    }

    #[tokio::test]
    async fn test_replace_failure_injection_recovers() {
        let store = MemoryProductStore::new();
        store.insert(record("p1", 5));
        store.fail_next_replacements("p1", 2);

        let update = record("p1", 3);
        assert!(store.replace(&update).await.is_err());
        assert!(store.replace(&update).await.is_err());
        assert!(store.replace(&update).await.is_ok());
        assert_eq!(store.quantity("p1"), 3);
        assert_eq!(store.replace_count(), 3);
    }

    #[tokio::test]
    async fn test_nth_replacement_failure_injection() {
        let store = MemoryProductStore::new();
        store.insert(record("p1", 5));
        store.fail_nth_replacement("p1", 2);

        assert!(store.replace(&record("p1", 4)).await.is_ok());
        assert!(store.replace(&record("p1", 3)).await.is_err());
        assert!(store.replace(&record("p1", 3)).await.is_ok());
        assert_eq!(store.quantity("p1"), 3);
    }

    #[tokio::test]
    async fn test_order_store_assigns_ids_in_sequence() {
        let store = MemoryOrderStore::new();
        let order = Order::draft(
            "a@b.com",
            vec![OrderLineItem {
                product_id: "p1".into(),
                name: "Widget".into(),
                unit_price: rust_decimal::Decimal::from(10),
                quantity: 1,
            }],
        );
        let first = store.create(&order).await.unwrap();
        let second = store.create(&order).await.unwrap();
        assert_eq!(first.id.as_deref(), Some("1"));
        assert_eq!(second.id.as_deref(), Some("2"));
        assert_eq!(store.orders().len(), 2);
    }

    #[tokio::test]
    async fn test_user_directory_case_insensitive() {
        let users = MemoryUserDirectory::with_emails(&["A@B.com"]);
        assert!(users.find_by_email("a@b.com").await.unwrap().is_some());
        assert!(users.find_by_email("x@y.com").await.unwrap().is_none());
    }
}
