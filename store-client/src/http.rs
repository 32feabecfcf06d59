//! HTTP plumbing shared by the store clients

use crate::error::{ClientError, ClientResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Thin wrapper around a reqwest client bound to one base URL.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, timeout_ms: u64) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET a JSON resource.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.url(path);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    /// POST a JSON body, decoding the JSON reply.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(path);
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    /// PUT a JSON body, decoding the JSON reply.
    pub async fn put_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.url(path);
        let response = self.client.put(&url).json(body).send().await?;
        Self::decode(response).await
    }

    /// DELETE a resource, ignoring the reply body.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let url = self.url(path);
        let response = self.client.delete(&url).send().await?;
        Self::check_status(&response)?;
        Ok(())
    }

    fn check_status(response: &Response) -> ClientResult<()> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(response.url().to_string()));
        }
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %response.url(), "store request rejected");
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        Self::check_status(&response)?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
