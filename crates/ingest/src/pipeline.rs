//! Batch pipeline: extract → flatten → merge → persist → publish.
//!
//! One invocation is one batch run; cadence belongs to the orchestrator.
//! Each stage reports its own outcome so a caller can tell "no data yet"
//! from "fetch failed" from "schema drift".

use crate::persist;
use crate::source::SourceClient;
use bus::{BusClient, PublishReport, Topic, TOPIC_INVENTORY, TOPIC_REQUESTS};
use common::UnifiedTable;
use normalizer::{families, flatten_payload, merge, EntitySchema, MergeOptions, TaggedRows};
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

/// An entity family paired with its upstream endpoint path.
pub struct FamilyEndpoint {
    pub schema: &'static EntitySchema,
    pub path: &'static str,
}

/// Families feeding the unified inventory table, in merge order.
pub static STOCK_FAMILIES: &[FamilyEndpoint] = &[
    FamilyEndpoint { schema: &families::FIXED_ASSET, path: "stock/fixed-assets" },
    FamilyEndpoint { schema: &families::TOOL, path: "stock/tools" },
    FamilyEndpoint { schema: &families::INVENTORY_ITEM, path: "stock/inventory/index" },
];

/// Families feeding the unified requests table, in merge order.
pub static REQUEST_FAMILIES: &[FamilyEndpoint] = &[
    FamilyEndpoint { schema: &families::REQUESTED_TOOL, path: "stock/tools/requested" },
    FamilyEndpoint { schema: &families::REQUESTED_INVENTORY, path: "stock/project/inventories" },
];

/// Per-stage result: success, partial success with a reason, or failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Complete,
    Partial(String),
    Failed(String),
}

impl StageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StageOutcome::Failed(_))
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOutcome::Complete => write!(f, "complete"),
            StageOutcome::Partial(reason) => write!(f, "partial ({})", reason),
            StageOutcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Outcome of one batch run.
#[derive(Debug)]
pub struct RunReport {
    pub extract: StageOutcome,
    pub persist: StageOutcome,
    pub publish: StageOutcome,
    pub request_rows: usize,
    pub inventory_rows: usize,
}

/// Execute one full batch run.
///
/// `bus` is absent when the broker connection failed at startup; extraction
/// and CSV persistence still run, and the publish stage reports failure.
pub async fn run(source: &SourceClient, bus: Option<&BusClient>, output_dir: &Path) -> RunReport {
    let mut skipped: Vec<&'static str> = Vec::new();
    let mut fetched = 0usize;

    let request_inputs = extract_families(source, REQUEST_FAMILIES, &mut skipped, &mut fetched).await;
    let stock_inputs = extract_families(source, STOCK_FAMILIES, &mut skipped, &mut fetched).await;

    let extract = if fetched == 0 {
        StageOutcome::Failed("no family could be fetched".to_string())
    } else if skipped.is_empty() {
        StageOutcome::Complete
    } else {
        StageOutcome::Partial(format!("skipped families: {}", skipped.join(", ")))
    };

    let requests_table = merge(request_inputs, &MergeOptions::requests());
    let inventory_table = merge(stock_inputs, &MergeOptions::inventory());
    info!(
        "Merged tables: {} request rows, {} inventory rows",
        requests_table.len(),
        inventory_table.len()
    );

    let persist = persist_tables(&requests_table, &inventory_table, output_dir);
    let publish = publish_tables(bus, &requests_table, &inventory_table).await;

    RunReport {
        extract,
        persist,
        publish,
        request_rows: requests_table.len(),
        inventory_rows: inventory_table.len(),
    }
}

async fn extract_families<'a>(
    source: &SourceClient,
    endpoints: &'a [FamilyEndpoint],
    skipped: &mut Vec<&'static str>,
    fetched: &mut usize,
) -> Vec<TaggedRows<'a>> {
    let mut inputs = Vec::new();
    for endpoint in endpoints {
        let family = endpoint.schema.family;
        match source.fetch(endpoint.path).await {
            Ok(payload) => {
                *fetched += 1;
                let output = flatten_payload(endpoint.schema, &payload);
                for warning in &output.warnings {
                    warn!("{}", warning);
                }
                info!(
                    "[{}] flattened {} rows ({} warnings)",
                    family,
                    output.rows.len(),
                    output.warnings.len()
                );
                inputs.push(TaggedRows {
                    schema: endpoint.schema,
                    rows: output.rows,
                });
            }
            Err(e) => {
                // That family's run is skipped; the others proceed.
                error!("[{}] extract failed: {}", family, e);
                skipped.push(family);
            }
        }
    }
    inputs
}

fn persist_tables(
    requests: &UnifiedTable,
    inventory: &UnifiedTable,
    output_dir: &Path,
) -> StageOutcome {
    let mut failures = Vec::new();
    for (table, file) in [(requests, "combined_requested.csv"), (inventory, "combined_all.csv")] {
        let path = output_dir.join(file);
        match persist::write_csv(table, &path) {
            Ok(()) => info!("Wrote {} rows to {}", table.len(), path.display()),
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                failures.push(format!("{}: {}", file, e));
            }
        }
    }
    match failures.len() {
        0 => StageOutcome::Complete,
        1 => StageOutcome::Partial(failures.remove(0)),
        _ => StageOutcome::Failed(failures.join("; ")),
    }
}

async fn publish_tables(
    bus: Option<&BusClient>,
    requests: &UnifiedTable,
    inventory: &UnifiedTable,
) -> StageOutcome {
    let Some(bus) = bus else {
        return StageOutcome::Failed("no broker connection, nothing published".to_string());
    };

    let mut partial_reasons = Vec::new();

    for (table, topic) in [(requests, &TOPIC_REQUESTS), (inventory, &TOPIC_INVENTORY)] {
        if let Err(e) = bus.ensure_topic(topic).await {
            return StageOutcome::Failed(e.to_string());
        }
        match bus.publish_table(topic, table).await {
            Ok(report) if report.is_complete() => {}
            Ok(report) if report.is_total_failure() => {
                return StageOutcome::Failed(format!(
                    "{}: all {} rows failed to publish",
                    topic.name, report.failed
                ));
            }
            Ok(report) => {
                partial_reasons.push(describe_partial(topic.name, &report));
            }
            Err(e) => return StageOutcome::Failed(e.to_string()),
        }
    }

    if partial_reasons.is_empty() {
        StageOutcome::Complete
    } else {
        StageOutcome::Partial(partial_reasons.join("; "))
    }
}

fn describe_partial(topic: &str, report: &PublishReport) -> String {
    format!(
        "{}: {} published, {} failed",
        topic, report.published, report.failed
    )
}
