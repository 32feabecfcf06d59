//! User directory client
//!
//! The engine only needs one question answered: does this email
//! belong to a registered user? The remote store has no lookup
//! endpoint, so the HTTP implementation lists `/users` and matches
//! locally (case-insensitive).

use crate::error::ClientResult;
use crate::http::HttpClient;
use async_trait::async_trait;
use shared::UserRecord;

/// Resolves order emails against the registered user base.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> ClientResult<Option<UserRecord>>;
}

/// HTTP-backed user directory.
pub struct HttpUserDirectory {
    http: HttpClient,
}

impl HttpUserDirectory {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn find_by_email(&self, email: &str) -> ClientResult<Option<UserRecord>> {
        let users: Vec<UserRecord> = self.http.get_json("users").await?;
        Ok(users.into_iter().find(|u| u.matches_email(email)))
    }
}
