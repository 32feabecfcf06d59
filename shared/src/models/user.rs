//! User record
//!
//! Only the email matters to the engine; it is used to check that an
//! order belongs to a registered user. The rest of the remote record
//! is carried opaquely.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A user as returned by the remote user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl UserRecord {
    /// Case-insensitive email match, the store is not consistent
    /// about casing either.
    pub fn matches_email(&self, email: &str) -> bool {
        !self.email.is_empty() && self.email.eq_ignore_ascii_case(email)
    }
}
