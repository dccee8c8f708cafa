//! invest.ia API Server
//!
//! HTTP API server with health check, metrics, and the dashboard data
//! endpoints. All external clients are constructed here and passed in
//! explicitly; nothing lives at module scope.

use dotenvy::dotenv;
use investia::config;
use investia::core::http::{start_server, AppState, HealthStatus};
use investia::logging;
use investia::metrics::Metrics;
use investia::services::fetcher::StrategyDataFetcher;
use investia::services::market::RestMarketDataClient;
use investia::store::HttpObjectStore;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    // Initialize logging based on environment
    logging::init_logging();

    let port = config::get_http_port();
    let env = config::get_environment();
    let format = config::get_data_format();

    info!("Starting invest.ia API Server");
    info!(environment = %env, "Environment");
    info!(format = %format, "Backing object format");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);

    let metrics = Arc::new(Metrics::new()?);

    let store = Arc::new(HttpObjectStore::new(
        config::get_store_endpoint(),
        config::get_store_bucket(),
    ));
    let mut fetcher =
        StrategyDataFetcher::new(store, format, config::get_store_prefix())
            .with_metrics(metrics.clone());
    if config::get_cache_enabled() {
        fetcher = fetcher.with_cache();
    }

    let market = Arc::new(RestMarketDataClient::new(config::get_market_api_url()));

    let state = AppState {
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics,
        start_time: Arc::new(Instant::now()),
        fetcher: Arc::new(fetcher),
        market,
        display_fraction: config::get_display_fraction(),
        default_window: config::get_default_signal_window(),
    };

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, state).await {
            error!(error = %e, "HTTP server error");
        }
    });

    // Graceful shutdown
    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
            info!("API server stopped");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
