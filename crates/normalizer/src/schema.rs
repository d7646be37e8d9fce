//! Entity schema definitions.
//!
//! An `EntitySchema` is static configuration for one upstream entity family:
//! which top-level fields survive, which nested sub-objects get lifted into
//! the flat namespace, and which columns every output row must carry.

use serde::Serialize;
use std::fmt;

/// Provenance tag for merged rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Asset,
    Tools,
    Inventory,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Asset => "asset",
            Source::Tools => "tools",
            Source::Inventory => "inventory",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared nested sub-object whose fields are lifted as
/// `<sub-object>_<field>` columns.
///
/// A sub-object with an empty field list is consumed (stripped from the
/// top-level namespace) but lifts nothing.
#[derive(Debug, Clone, Copy)]
pub struct SubObject {
    pub name: &'static str,
    pub fields: &'static [&'static str],
}

/// Static configuration for one entity family.
#[derive(Debug, Clone, Copy)]
pub struct EntitySchema {
    /// Family name, used in warnings and logs.
    pub family: &'static str,
    /// Provenance value stamped at merge time.
    pub source: Source,
    /// Required output columns, in artifact order. Every flattened row
    /// contains exactly these.
    pub output_columns: &'static [&'static str],
    /// Nested sub-objects to lift.
    pub sub_objects: &'static [SubObject],
    /// Top-level field renames applied after the copy, `(from, to)`.
    pub renames: &'static [(&'static str, &'static str)],
    /// Top-level fields dropped outright (never lifted or copied).
    pub excluded_fields: &'static [&'static str],
    /// Identifier columns, always represented as strings.
    pub id_columns: &'static [&'static str],
    /// Measure columns for the merge drop rule: a row missing all of them
    /// carries no information and is dropped.
    pub measure_columns: &'static [&'static str],
    /// Constant columns stamped on every record before column restriction.
    pub constants: &'static [(&'static str, i64)],
}

impl EntitySchema {
    pub fn is_sub_object(&self, field: &str) -> bool {
        self.sub_objects.iter().any(|s| s.name == field)
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded_fields.contains(&field)
    }
}

/// Kind of reconciliation warning raised during flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A required output column was absent upstream and null-filled.
    SchemaMismatch,
    /// A record or sub-object had an unexpected shape and was skipped or
    /// treated as empty.
    MalformedRecord,
}

/// A non-fatal data-quality finding, returned alongside flattened rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub family: &'static str,
    pub detail: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::SchemaMismatch => {
                write!(f, "[{}] schema mismatch: {}", self.family, self.detail)
            }
            WarningKind::MalformedRecord => {
                write!(f, "[{}] malformed record: {}", self.family, self.detail)
            }
        }
    }
}
