//! Ingest batch entry point.
//!
//! Extracts every entity family from the upstream source, flattens and
//! merges them into the two unified tables, persists CSV fallbacks and
//! publishes both tables onto the bus. One invocation is one run.

mod persist;
mod pipeline;
mod source;

use anyhow::{bail, Result};
use bus::BusClient;
use metrics_exporter_prometheus::PrometheusBuilder;
use pipeline::StageOutcome;
use source::SourceClient;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

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

    info!("Starting SCM ingest run...");

    let metrics_port: u16 = std::env::var("METRICS_PORT")
        .unwrap_or_else(|_| "9091".into())
        .parse()
        .unwrap_or(9091);
    if let Err(e) = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], metrics_port))
        .install()
    {
        warn!("Metrics exporter unavailable on port {}: {}", metrics_port, e);
    }

    let base_url = std::env::var("SCM_SOURCE_BASE_URL")
        .unwrap_or_else(|_| "https://scm-backend-test.ienetworks.co/api/scm".into());
    let access_token = std::env::var("SCM_ACCESS_TOKEN").unwrap_or_default();
    let output_dir: PathBuf = std::env::var("SCM_OUTPUT_DIR")
        .unwrap_or_else(|_| "output".into())
        .into();
    let nats_url = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".into());

    let source = SourceClient::new(base_url, access_token)?;

    // The CSV artifacts are the fallback when no broker is reachable, so a
    // connect failure must not end the run before extraction.
    let bus = match BusClient::connect(&nats_url).await {
        Ok(bus) => Some(bus),
        Err(e) => {
            error!("Bus connect failed, CSV artifacts will be the only output: {}", e);
            None
        }
    };

    let report = pipeline::run(&source, bus.as_ref(), &output_dir).await;

    info!(
        "Run finished: extract {}, persist {}, publish {} ({} request rows, {} inventory rows)",
        report.extract,
        report.persist,
        report.publish,
        report.request_rows,
        report.inventory_rows
    );

    if let StageOutcome::Partial(reason) = &report.publish {
        warn!("Publish was partial: {}", reason);
    }
    if report.extract.is_failed() || report.persist.is_failed() || report.publish.is_failed() {
        bail!("ingest run failed: extract {}, persist {}, publish {}",
            report.extract, report.persist, report.publish);
    }

    Ok(())
}
