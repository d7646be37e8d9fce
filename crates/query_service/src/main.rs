//! Query service entry point.
//!
//! Reads the unified request and inventory tables from the bus on demand
//! and serves the analytics views over HTTP.

use anyhow::Result;
use bus::{BusClient, ConsumerRegistry};
use metrics_exporter_prometheus::PrometheusBuilder;
use query_service::{create_router, AppState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on rows read per request, regardless of configuration.
const MAX_MESSAGES_CAP: usize = 5000;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting query service...");

    let metrics_port: u16 = std::env::var("METRICS_PORT")
        .unwrap_or_else(|_| "9090".into())
        .parse()
        .unwrap_or(9090);
    if let Err(e) = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], metrics_port))
        .install()
    {
        warn!("Metrics exporter unavailable on port {}: {}", metrics_port, e);
    }

    // Configuration from environment
    let nats_url = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".into());
    let bind_addr =
        std::env::var("QUERY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let group =
        std::env::var("QUERY_CONSUMER_GROUP").unwrap_or_else(|_| "query-service".into());
    let max_messages: usize = std::env::var("MAX_MESSAGES")
        .unwrap_or_else(|_| MAX_MESSAGES_CAP.to_string())
        .parse()
        .unwrap_or(MAX_MESSAGES_CAP);
    let max_messages = max_messages.min(MAX_MESSAGES_CAP).max(1);

    info!("Connecting to NATS at {}...", nats_url);
    let bus = BusClient::connect(&nats_url).await?;
    info!("Connected to NATS");

    let registry = ConsumerRegistry::new(bus);
    let state = Arc::new(AppState {
        registry,
        group,
        max_messages,
    });
    let router = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on http://{}", bind_addr);
    info!("Available endpoints:");
    info!("  GET /health               - Health check");
    info!("  GET /stats                - Consumer registry statistics");
    info!("  GET /requests             - Unified request rows");
    info!("  GET /inventory            - Per-item stock with status");
    info!("  GET /stock                - Stock levels by purchase lot");
    info!("  GET /stock/summary        - Status counts and total amount");
    info!("  GET /transactions         - Per-item transaction totals");
    info!("  GET /transactions/series  - Time-bucketed transaction sums");
    info!("  GET /demand               - Weekly-average demand forecast");
    info!("  POST /consumers/reset     - Drop cached subscriptions");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.registry.clear();
    info!("Query service stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    info!("Received shutdown signal");
}
