//! Bus publish/consume layer on NATS JetStream.
//!
//! Unified tables are published row by row onto named topics; the read side
//! pulls bounded batches through durable consumer groups so repeated reads
//! resume at the last acknowledged offset instead of re-reading the stream.
//!
//! Delivery is at-least-once; downstream aggregation is idempotent over
//! exact-duplicate rows, so no exactly-once machinery is attempted.

pub mod client;
pub mod error;
pub mod registry;
pub mod topic;

pub use client::{BusClient, PublishReport};
pub use error::{Error, Result};
pub use registry::{ConsumerRegistry, RegistryStats};
pub use topic::{Topic, TOPIC_INVENTORY, TOPIC_REQUESTS};
