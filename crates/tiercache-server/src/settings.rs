//! Server settings.
//!
//! Loaded in layers: built-in defaults, then an optional TOML file
//! (`tiercache.toml`, or the path in `TIERCACHE_CONFIG`), then environment
//! variables such as `TIERCACHE__CACHE__MAX_ENTRIES=5000`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tiercache_durable::{DurableTier, MemoryDurableTier, RestDurableConfig, RestDurableTier};

use crate::cache::{CacheConfig, MaintenanceConfig};

const CONFIG_PATH_VAR: &str = "TIERCACHE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "tiercache.toml";
const ENV_PREFIX: &str = "TIERCACHE";
const ENV_SEPARATOR: &str = "__";

/// Complete server settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub cache: CacheSettings,
    pub durable: DurableSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Enables a permissive CORS layer.
    pub cors: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors: false,
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Message(format!("invalid server address: {}", e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub default_ttl_ms: u64,
    pub max_ttl_ms: u64,
    pub max_entries: usize,
    pub high_water_ratio: f64,
    pub durable_timeout_ms: u64,
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let defaults = CacheConfig::default();
        Self {
            default_ttl_ms: defaults.default_ttl.as_millis() as u64,
            max_ttl_ms: defaults.max_ttl.as_millis() as u64,
            max_entries: defaults.max_entries,
            high_water_ratio: defaults.high_water_ratio,
            durable_timeout_ms: defaults.durable_timeout.as_millis() as u64,
            sweep_interval_secs: MaintenanceConfig::default().interval.as_secs(),
        }
    }
}

impl CacheSettings {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            default_ttl: Duration::from_millis(self.default_ttl_ms),
            max_ttl: Duration::from_millis(self.max_ttl_ms),
            max_entries: self.max_entries,
            high_water_ratio: self.high_water_ratio,
            durable_timeout: Duration::from_millis(self.durable_timeout_ms),
        }
    }

    pub fn maintenance_config(&self) -> MaintenanceConfig {
        MaintenanceConfig {
            interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(invalid("cache.max_entries must be greater than zero"));
        }
        if !(self.high_water_ratio > 0.0 && self.high_water_ratio <= 1.0) {
            return Err(invalid("cache.high_water_ratio must be in (0, 1]"));
        }
        if self.default_ttl_ms == 0 || self.default_ttl_ms > self.max_ttl_ms {
            return Err(invalid(
                "cache.default_ttl_ms must be positive and at most cache.max_ttl_ms",
            ));
        }
        if self.durable_timeout_ms == 0 {
            return Err(invalid("cache.durable_timeout_ms must be greater than zero"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(invalid("cache.sweep_interval_secs must be greater than zero"));
        }
        Ok(())
    }
}

/// Which durable tier to attach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurableBackend {
    /// Memory-only cache.
    #[default]
    None,
    /// In-process durable tier, mostly useful for local runs.
    Memory,
    /// PostgREST-style HTTP store.
    Rest,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DurableSettings {
    pub backend: DurableBackend,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    pub request_timeout_ms: u64,
}

impl Default for DurableSettings {
    fn default() -> Self {
        Self {
            backend: DurableBackend::None,
            url: None,
            api_key: None,
            table: "cache_entries".to_string(),
            request_timeout_ms: 1500,
        }
    }
}

impl DurableSettings {
    /// Builds the configured durable tier, if any.
    pub fn build(&self) -> Result<Option<Arc<dyn DurableTier>>, ConfigError> {
        match self.backend {
            DurableBackend::None => Ok(None),
            DurableBackend::Memory => Ok(Some(Arc::new(MemoryDurableTier::new()))),
            DurableBackend::Rest => {
                let url = self
                    .url
                    .as_deref()
                    .ok_or_else(|| invalid("durable.url is required for the rest backend"))?;

                let mut builder = RestDurableConfig::builder()
                    .base_url(url)
                    .table(&self.table)
                    .request_timeout(Duration::from_millis(self.request_timeout_ms));
                if let Some(key) = &self.api_key {
                    builder = builder.api_key(key);
                }

                let config = builder.build().map_err(|e| invalid(e.to_string()))?;
                let tier = RestDurableTier::new(config).map_err(|e| invalid(e.to_string()))?;
                Ok(Some(Arc::new(tier)))
            },
        }
    }
}

impl Settings {
    /// Loads settings from the default file location and the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let file = File::with_name(&path).required(std::env::var(CONFIG_PATH_VAR).is_ok());
        Self::from_sources(file, environment())
    }

    /// Loads settings from TOML text and explicit environment pairs.
    pub fn from_toml_and_env<I, K, V>(toml: &str, env: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = env
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<config::Map<String, String>>();

        Self::from_sources(
            File::from_str(toml, FileFormat::Toml),
            environment().source(Some(vars)),
        )
    }

    fn from_sources<F>(file: F, env: Environment) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        if self.durable.backend == DurableBackend::Rest && self.durable.url.is_none() {
            return Err(invalid("durable.url is required for the rest backend"));
        }
        Ok(())
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Message(message.into())
}
