//! PostgREST-compatible durable tier.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;

use super::RestDurableConfig;
use crate::error::DurableError;
use crate::tier::{DurableRecord, DurableTier};

const KEY_COLUMN: &str = "cache_key";

/// A durable tier stored in a table behind a PostgREST-style HTTP API.
///
/// Records are addressed by the `cache_key` column:
///
/// - `get`: `GET /rest/v1/{table}?cache_key=eq.{key}&select=*`
/// - `set`: `POST /rest/v1/{table}?on_conflict=cache_key` as an upsert
/// - `delete`: `DELETE /rest/v1/{table}?cache_key=eq.{key}`
/// - `clear`: `DELETE /rest/v1/{table}?cache_key=not.is.null`
pub struct RestDurableTier {
    client: Client,
    config: RestDurableConfig,
}

impl RestDurableTier {
    /// Creates a new REST durable tier.
    pub fn new(config: RestDurableConfig) -> Result<Self, DurableError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DurableError::InvalidConfig(e.to_string()))?;

        debug!(url = %config.table_url(), "REST durable tier configured");

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RestDurableConfig {
        &self.config
    }

    /// Attaches authentication headers.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.api_key() {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    /// Sends a request and fails on non-success status codes.
    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, DurableError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DurableError::unavailable(format!(
                "{} returned HTTP {}",
                operation, status
            )));
        }
        Ok(response)
    }

    fn map_error(&self, err: reqwest::Error) -> DurableError {
        if err.is_timeout() {
            DurableError::timeout(self.config.request_timeout())
        } else if err.is_decode() {
            DurableError::serialization(err.to_string())
        } else {
            DurableError::unavailable(err.to_string())
        }
    }

    fn key_filter(key: &str) -> [(&'static str, String); 1] {
        [(KEY_COLUMN, format!("eq.{}", key))]
    }
}

#[async_trait]
impl DurableTier for RestDurableTier {
    async fn get(&self, key: &str) -> Result<Option<DurableRecord>, DurableError> {
        let request = self
            .client
            .get(self.config.table_url())
            .query(&Self::key_filter(key))
            .query(&[("select", "*")]);

        let response = self.send("get", request).await?;
        let mut rows: Vec<DurableRecord> = response.json().await.map_err(|e| self.map_error(e))?;

        Ok(rows.pop())
    }

    async fn set(&self, record: &DurableRecord) -> Result<(), DurableError> {
        let request = self
            .client
            .post(self.config.table_url())
            .query(&[("on_conflict", KEY_COLUMN)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record);

        self.send("set", request).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DurableError> {
        let request = self
            .client
            .delete(self.config.table_url())
            .query(&Self::key_filter(key));

        self.send("delete", request).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), DurableError> {
        let request = self
            .client
            .delete(self.config.table_url())
            .query(&[(KEY_COLUMN, "not.is.null")]);

        self.send("clear", request).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "rest"
    }

    async fn health_check(&self) -> Result<(), DurableError> {
        let request = self
            .client
            .get(self.config.table_url())
            .query(&[("select", KEY_COLUMN), ("limit", "1")]);

        self.send("health_check", request).await?;
        Ok(())
    }
}

impl std::fmt::Debug for RestDurableTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestDurableTier")
            .field("config", &self.config)
            .finish()
    }
}
