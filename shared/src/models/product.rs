//! Product record with a normalized quantity accessor
//!
//! The remote product store grew out of several imports and is not
//! consistent about where it keeps the available quantity: newer
//! records carry `quantity`, older ones `stock`, and records imported
//! from the public catalog feed only have `rating.count`. The store
//! offers whole-record replace only, so the raw JSON is kept intact
//! and mutated in place — unknown fields must round-trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A product record as held by the remote store.
///
/// Wraps the raw JSON object instead of a rigid struct; the only
/// fields the engine interprets are `id` and the quantity field (via
/// [`ProductRecord::available_quantity`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ProductRecord {
    raw: Value,
}

impl ProductRecord {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// The record id, normalized to a string (the store returns
    /// numeric ids for imported records).
    pub fn id(&self) -> String {
        match self.raw.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }

    /// Normalized available quantity.
    ///
    /// Compatibility shim for the heterogeneous upstream records:
    /// checks `quantity`, then `stock`, then `rating.count`, and
    /// defaults to 0 when none is present or parseable.
    pub fn available_quantity(&self) -> i64 {
        quantity_field(&self.raw).and_then(as_quantity).unwrap_or(0)
    }

    /// Write the quantity back into whichever field shape the record
    /// already carries, defaulting to `quantity` for bare records.
    /// Negative values are floored at zero; the store must never see
    /// a negative quantity.
    pub fn set_available_quantity(&mut self, quantity: i64) {
        let quantity = quantity.max(0);
        let Some(obj) = self.raw.as_object_mut() else {
            return;
        };
        let has_rating_count = obj
            .get("rating")
            .and_then(|r| r.get("count"))
            .is_some();
        if obj.contains_key("quantity") || (!obj.contains_key("stock") && !has_rating_count) {
            obj.insert("quantity".into(), quantity.into());
        } else if obj.contains_key("stock") {
            obj.insert("stock".into(), quantity.into());
        } else if let Some(rating) = obj.get_mut("rating").and_then(Value::as_object_mut) {
            rating.insert("count".into(), quantity.into());
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    pub fn into_value(self) -> Value {
        self.raw
    }
}

/// Locate the quantity field on a raw record, in compatibility order.
fn quantity_field(raw: &Value) -> Option<&Value> {
    raw.get("quantity")
        .or_else(|| raw.get("stock"))
        .or_else(|| raw.get("rating").and_then(|r| r.get("count")))
}

/// Coerce a JSON value to a quantity. The legacy store sometimes
/// serializes counts as strings.
fn as_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
