//! NATS client wrapper with JetStream stream provisioning and row publish.

use crate::error::{Error, Result};
use crate::topic::Topic;
use async_nats::jetstream;
use common::UnifiedTable;
use metrics::counter;
use std::time::Duration;
use tracing::{info, warn};

/// Default retention period for topic streams (7 days), long enough for
/// read-side groups to catch up between hourly publish runs.
pub const DEFAULT_MAX_AGE_SECS: u64 = 7 * 24 * 3600;

/// Default max messages per stream.
pub const DEFAULT_MAX_MESSAGES: i64 = 1_000_000;

/// Default max bytes per stream (1GB).
pub const DEFAULT_MAX_BYTES: i64 = 1_073_741_824;

/// Outcome of publishing one table. Already-sent messages are never rolled
/// back; a partial failure is reported, not swallowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishReport {
    pub published: usize,
    pub failed: usize,
}

impl PublishReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    /// Nothing went through at all: broker-level failure rather than a
    /// handful of bad rows.
    pub fn is_total_failure(&self) -> bool {
        self.published == 0 && self.failed > 0
    }
}

/// Wrapper around the NATS client with a JetStream context.
#[derive(Clone)]
pub struct BusClient {
    jetstream: jetstream::Context,
}

impl BusClient {
    /// Connect to a NATS server and create a JetStream context.
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);
        let client = async_nats::connect(url).await.map_err(Error::unavailable)?;
        let jetstream = jetstream::new(client);
        Ok(Self { jetstream })
    }

    /// Create or get the stream backing a topic.
    pub async fn ensure_topic(&self, topic: &Topic) -> Result<()> {
        info!(
            "Ensuring stream '{}' exists (subject: {})",
            topic.stream, topic.subject
        );
        self.jetstream
            .get_or_create_stream(jetstream::stream::Config {
                name: topic.stream.to_string(),
                subjects: vec![topic.subject.to_string()],
                retention: jetstream::stream::RetentionPolicy::Limits,
                max_messages: DEFAULT_MAX_MESSAGES,
                max_bytes: DEFAULT_MAX_BYTES,
                max_age: Duration::from_secs(DEFAULT_MAX_AGE_SECS),
                storage: jetstream::stream::StorageType::File,
                ..Default::default()
            })
            .await
            .map_err(Error::unavailable)?;
        Ok(())
    }

    /// Publish every row of a unified table as one message on the topic,
    /// sanitizing each outbound payload.
    ///
    /// Rows are sent with JetStream acknowledgment. A row that fails to
    /// serialize or to publish is counted and skipped; the report carries
    /// both tallies so the caller can distinguish complete, partial and
    /// total failure.
    pub async fn publish_table(&self, topic: &Topic, table: &UnifiedTable) -> Result<PublishReport> {
        let mut report = PublishReport::default();

        for row in &table.rows {
            let sanitized = row.clone().sanitized();
            if sanitized != *row {
                counter!("bus_sanitizer_rewrites_total", "topic" => topic.name).increment(1);
            }
            let payload = match serde_json::to_vec(&sanitized) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("[{}] row failed to serialize, skipped: {}", topic.name, e);
                    counter!("bus_publish_errors_total", "topic" => topic.name, "error_type" => "serialize")
                        .increment(1);
                    report.failed += 1;
                    continue;
                }
            };

            let ack = self
                .jetstream
                .publish(topic.subject.to_string(), bytes::Bytes::from(payload))
                .await;
            let acked = match ack {
                Ok(future) => future.await,
                Err(e) => Err(e),
            };
            match acked {
                Ok(_) => {
                    report.published += 1;
                    counter!("bus_messages_published_total", "topic" => topic.name).increment(1);
                }
                Err(e) => {
                    warn!("[{}] publish failed: {}", topic.name, e);
                    counter!("bus_publish_errors_total", "topic" => topic.name, "error_type" => "publish")
                        .increment(1);
                    report.failed += 1;
                }
            }
        }

        info!(
            "[{}] published {} rows ({} failed)",
            topic.name, report.published, report.failed
        );
        Ok(report)
    }

    /// Get the underlying JetStream context.
    pub fn context(&self) -> &jetstream::Context {
        &self.jetstream
    }
}
