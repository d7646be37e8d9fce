//! Durable consumer registry with per-topic/group read buffers.
//!
//! Consumers are cached per (topic, group) so repeated short-lived consume
//! calls reuse an open subscription instead of re-subscribing each time.
//! The registry owns the last-consumed buffer per key: a read appends
//! freshly fetched messages and returns the most recent `limit` rows, so a
//! caller that polls a quiet topic still sees the rows it already drained.
//!
//! The cache has an explicit lifecycle: `reset` drops one subscription (for
//! a group-id change), `clear` drops them all at shutdown. Concurrent
//! callers against the same topic/group should use distinct group ids to
//! avoid offset contention.

use crate::client::BusClient;
use crate::error::{Error, Result};
use crate::topic::Topic;
use async_nats::jetstream::consumer::{pull, Consumer, DeliverPolicy};
use common::{Cell, FlatRow};
use dashmap::DashMap;
use futures::StreamExt;
use metrics::counter;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bounded poll timeout: a topic with fewer than `limit` messages
/// available returns promptly rather than blocking.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5);

struct CachedConsumer {
    consumer: Consumer<pull::Config>,
    buffer: Vec<FlatRow>,
}

/// Registry statistics for the read API's `/stats` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub cached_consumers: usize,
    pub buffered_rows: usize,
}

/// Explicit registry of durable pull consumers keyed by `topic:group`.
pub struct ConsumerRegistry {
    client: BusClient,
    entries: DashMap<String, CachedConsumer>,
    poll_timeout: Duration,
}

impl ConsumerRegistry {
    pub fn new(client: BusClient) -> Self {
        Self::with_poll_timeout(client, DEFAULT_POLL_TIMEOUT)
    }

    pub fn with_poll_timeout(client: BusClient, poll_timeout: Duration) -> Self {
        Self {
            client,
            entries: DashMap::new(),
            poll_timeout,
        }
    }

    /// Return up to `limit` most-recently-available rows for the topic,
    /// resuming from the group's durable offset.
    ///
    /// Every inbound payload is sanitized; a payload that is not a JSON
    /// mapping is preserved as `{"raw_value": <string>}` rather than
    /// dropped.
    pub async fn consume(&self, topic: &Topic, group: &str, limit: usize) -> Result<Vec<FlatRow>> {
        let key = format!("{}:{}", topic.name, group);

        let consumer = match self.entries.get(&key) {
            Some(entry) => entry.consumer.clone(),
            None => {
                let consumer = self.create_consumer(topic, group).await?;
                self.entries.insert(
                    key.clone(),
                    CachedConsumer {
                        consumer: consumer.clone(),
                        buffer: Vec::new(),
                    },
                );
                consumer
            }
        };

        let mut batch = consumer
            .fetch()
            .max_messages(limit)
            .expires(self.poll_timeout)
            .messages()
            .await
            .map_err(Error::unavailable)?;

        let mut fresh: Vec<FlatRow> = Vec::new();
        while let Some(message) = batch.next().await {
            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    warn!("[{}] fetch interrupted: {}", topic.name, e);
                    break;
                }
            };
            fresh.push(decode_row(topic, &message.payload));
            if let Err(e) = message.ack().await {
                warn!("[{}] ack failed: {}", topic.name, e);
            }
        }

        counter!("bus_messages_consumed_total", "topic" => topic.name)
            .increment(fresh.len() as u64);
        debug!(
            "[{}] group '{}' fetched {} new messages",
            topic.name,
            group,
            fresh.len()
        );

        match self.entries.get_mut(&key) {
            Some(mut entry) => {
                entry.buffer.extend(fresh);
                let excess = entry.buffer.len().saturating_sub(limit);
                if excess > 0 {
                    entry.buffer.drain(..excess);
                }
                Ok(entry.buffer.clone())
            }
            // Reset raced the read; the fetched rows are still valid.
            None => Ok(fresh),
        }
    }

    /// Drop the cached subscription and buffer for one topic/group.
    pub fn reset(&self, topic: &Topic, group: &str) {
        self.entries.remove(&format!("{}:{}", topic.name, group));
    }

    /// Drop every cached subscription. Called at process shutdown.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            cached_consumers: self.entries.len(),
            buffered_rows: self.entries.iter().map(|e| e.buffer.len()).sum(),
        }
    }

    async fn create_consumer(&self, topic: &Topic, group: &str) -> Result<Consumer<pull::Config>> {
        let stream = self
            .client
            .context()
            .get_stream(topic.stream)
            .await
            .map_err(Error::unavailable)?;

        stream
            .get_or_create_consumer(
                group,
                pull::Config {
                    durable_name: Some(group.to_string()),
                    deliver_policy: DeliverPolicy::All,
                    ..Default::default()
                },
            )
            .await
            .map_err(Error::unavailable)
    }
}

/// Decode an inbound payload into a sanitized flat row.
fn decode_row(topic: &Topic, payload: &[u8]) -> FlatRow {
    match serde_json::from_slice::<FlatRow>(payload) {
        Ok(row) => row.sanitized(),
        Err(e) => {
            warn!(
                "[{}] payload is not a flat mapping, wrapped as raw_value: {}",
                topic.name, e
            );
            counter!("bus_consume_errors_total", "topic" => topic.name, "error_type" => "decode")
                .increment(1);
            let mut row = FlatRow::new();
            row.insert(
                "raw_value",
                Cell::Str(String::from_utf8_lossy(payload).into_owned()),
            );
            row
        }
    }
}
