/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Id prefix for orders created while the remote order store is
/// unconfigured. The offline queue recognizes its own entries by it.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Generate a local order id from a millisecond timestamp.
pub fn local_order_id(millis: i64) -> String {
    format!("{LOCAL_ID_PREFIX}{millis}")
}

/// Whether an order id was assigned locally (queued, not yet synced).
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_id_round_trip() {
        let id = local_order_id(1_700_000_000_000);
        assert_eq!(id, "local-1700000000000");
        assert!(is_local_id(&id));
        assert!(!is_local_id("42"));
    }
}
