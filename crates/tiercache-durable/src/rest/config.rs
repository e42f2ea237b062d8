//! REST durable tier configuration.

use std::time::Duration;

use crate::error::DurableError;

const DEFAULT_TABLE: &str = "cache_entries";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for [`RestDurableTier`](super::RestDurableTier).
#[derive(Clone)]
pub struct RestDurableConfig {
    /// Base URL of the REST service, e.g. `https://db.example.com`.
    base_url: String,

    /// Table holding the cache records.
    table: String,

    /// API key sent as `apikey` and as a bearer token (optional).
    api_key: Option<String>,

    /// Per-request timeout enforced by the HTTP client.
    request_timeout: Duration,
}

impl RestDurableConfig {
    /// Creates a new builder for RestDurableConfig.
    pub fn builder() -> RestDurableConfigBuilder {
        RestDurableConfigBuilder::default()
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the URL of the records table.
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

impl std::fmt::Debug for RestDurableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestDurableConfig")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Builder for RestDurableConfig.
#[derive(Debug, Default)]
pub struct RestDurableConfigBuilder {
    base_url: Option<String>,
    table: Option<String>,
    api_key: Option<String>,
    request_timeout: Option<Duration>,
}

impl RestDurableConfigBuilder {
    /// Sets the base URL of the REST service.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the records table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<RestDurableConfig, DurableError> {
        let base_url = self
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| DurableError::InvalidConfig("base_url is required".to_string()))?;

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(DurableError::InvalidConfig(format!(
                "base_url must be http(s), got '{}'",
                base_url
            )));
        }

        let table = self.table.unwrap_or_else(|| DEFAULT_TABLE.to_string());
        if table.is_empty() || table.contains('/') {
            return Err(DurableError::InvalidConfig(format!(
                "invalid table name '{}'",
                table
            )));
        }

        let request_timeout = self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        if request_timeout.is_zero() {
            return Err(DurableError::InvalidConfig(
                "request_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(RestDurableConfig {
            base_url,
            table,
            api_key: self.api_key.filter(|key| !key.is_empty()),
            request_timeout,
        })
    }
}
