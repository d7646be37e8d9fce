//! Normalizer for nested SCM records.
//!
//! Turns arbitrarily nested inventory/asset/request records into flat rows
//! per a fixed entity schema, then merges the per-family row sets into
//! unified tables with provenance.
//!
//! # Architecture
//!
//! ```text
//! Raw records ({"data": [...]}) --> flatten (per EntitySchema) --> FlatRows
//!                                    --> merge + dedup --> UnifiedTable
//! ```
//!
//! Schemas are immutable configuration structs passed explicitly into the
//! engine, so tests can inject their own without process-wide state.

pub mod engine;
pub mod families;
pub mod merge;
pub mod schema;

pub use engine::{flatten_payload, flatten_record, FlattenOutput};
pub use merge::{
    merge, request_fills, FillRule, MergeOptions, TaggedRows, REQUEST_DROP_COLUMNS, SOURCE_COLUMN,
};
pub use schema::{EntitySchema, Source, SubObject, Warning, WarningKind};
