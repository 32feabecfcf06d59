//! Per-product quantity deltas between two item sets

use shared::OrderLineItem;
use std::collections::BTreeMap;

/// Net stock adjustment for one product implied by moving from a
/// previous item set to a new one. Positive returns stock to the
/// shelf, negative consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationDelta {
    pub product_id: String,
    pub delta: i64,
}

/// Compute per-product deltas over the union of both item sets:
/// `delta = Σ previous qty − Σ next qty` for that product. Products
/// absent from both sets never appear; zero deltas are dropped (no
/// write needed). Output is ordered by product id, so one batch
/// carries exactly one adjustment per affected product.
pub fn compute_deltas(
    previous: &[OrderLineItem],
    next: &[OrderLineItem],
) -> Vec<ReconciliationDelta> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for item in previous {
        *totals.entry(item.product_id.as_str()).or_default() += i64::from(item.quantity);
    }
    for item in next {
        *totals.entry(item.product_id.as_str()).or_default() -= i64::from(item.quantity);
    }
    totals
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .map(|(product_id, delta)| ReconciliationDelta {
            product_id: product_id.to_string(),
            delta,
        })
        .collect()
}
