//! Router construction and the serve loop.

use std::net::SocketAddr;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::handlers::{
    cache::{cache_stats, delete_entry, get_entry, put_entry},
    health::health_check,
    invalidate::{clear_cache, invalidate_tags},
    metrics::metrics_handler,
};
use crate::metrics::http::http_metrics_middleware;
use crate::middleware::{LoggingLayer, RequestIdLayer};
use crate::state::AppState;

/// Options for the HTTP layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterOptions {
    /// Adds a permissive CORS layer.
    pub cors: bool,
}

fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/cache/entries/{*key}",
            get(get_entry).put(put_entry).delete(delete_entry),
        )
        .route("/cache/invalidate", post(invalidate_tags))
        .route("/cache/stats", get(cache_stats))
        .route("/cache", delete(clear_cache))
        .with_state(state)
}

fn with_middleware(router: Router, options: RouterOptions) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    let router = router
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware_stack);

    if options.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Creates the API router without the `/metrics` endpoint.
pub fn create_router(state: AppState) -> Router {
    with_middleware(app_router(state), RouterOptions::default())
}

/// Creates the full router, including `/metrics`.
pub fn create_router_with_metrics(
    state: AppState,
    prometheus_handle: PrometheusHandle,
    options: RouterOptions,
) -> Router {
    // Different state type, so a separate router.
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    with_middleware(app_router(state).merge(metrics_router), options)
}

/// Serves the API until SIGINT or SIGTERM.
pub async fn run_server(
    addr: SocketAddr,
    state: AppState,
    prometheus_handle: PrometheusHandle,
    options: RouterOptions,
) -> Result<(), std::io::Error> {
    let app = create_router_with_metrics(state, prometheus_handle, options);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
