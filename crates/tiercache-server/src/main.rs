//! Tiercache server binary.

use std::sync::Arc;

use anyhow::Context;
use tiercache_server::cache::{CacheManager, MaintenanceScheduler};
use tiercache_server::metrics::init_metrics;
use tiercache_server::state::JsonCache;
use tiercache_server::{AppState, RouterOptions, Settings, run_server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    let addr = settings.server.socket_addr()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        durable = ?settings.durable.backend,
        max_entries = settings.cache.max_entries,
        "starting tiercache server"
    );

    let prometheus_handle = init_metrics()?;

    let cache_config = settings.cache.cache_config();
    let cache = match settings.durable.build()? {
        Some(durable) => CacheManager::with_durable(cache_config, durable),
        None => CacheManager::new(cache_config),
    };
    let cache: Arc<JsonCache> = Arc::new(cache);

    if let Some(Err(e)) = cache.check_durable().await {
        tracing::warn!(
            backend = cache.durable_name(),
            error = %e,
            "durable tier unreachable at startup, serving from memory until it recovers"
        );
    }

    let _maintenance =
        MaintenanceScheduler::new(Arc::clone(&cache), settings.cache.maintenance_config()).start();

    let state = AppState::new(cache);
    let options = RouterOptions {
        cors: settings.server.cors,
    };

    run_server(addr, state, prometheus_handle, options).await?;

    Ok(())
}
