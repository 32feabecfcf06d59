//! Order model
//!
//! Field names follow the remote order store's JSON (camelCase). The
//! subtotal is derived from the items and recomputed whenever they
//! change; it is never accepted from outside as authoritative.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::util;

/// Order lifecycle status as understood by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    Rejected,
    Processing,
    Shipped,
}

/// One line of an order. `quantity` is always positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An order, either persisted remotely (`id` assigned by the store)
/// or queued locally (`is_local`, `local-<millis>` id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_local: bool,
    pub user_email: String,
    pub items: Vec<OrderLineItem>,
    pub subtotal: Decimal,
    pub status: OrderStatus,
    pub created_at: i64,
}

impl Order {
    /// Build a draft order: no id yet, `Pending`, subtotal derived
    /// from the items.
    pub fn draft(user_email: impl Into<String>, items: Vec<OrderLineItem>) -> Self {
        let mut order = Self {
            id: None,
            is_local: false,
            user_email: user_email.into(),
            items,
            subtotal: Decimal::ZERO,
            status: OrderStatus::Pending,
            created_at: util::now_millis(),
        };
        order.recompute_subtotal();
        order
    }

    /// Replace the item set and bring the subtotal back in line.
    pub fn set_items(&mut self, items: Vec<OrderLineItem>) {
        self.items = items;
        self.recompute_subtotal();
    }

    pub fn recompute_subtotal(&mut self) {
        self.subtotal = self.items.iter().map(OrderLineItem::line_total).sum();
    }
}
