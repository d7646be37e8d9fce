//! Flat rows and unified tables.

use crate::cell::Cell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single flattened record: column name to JSON-safe scalar.
///
/// Backed by a `BTreeMap` so serialization is canonical, which makes exact
/// duplicate detection a string comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRow(pub BTreeMap<String, Cell>);

impl FlatRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.0.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, cell: Cell) {
        self.0.insert(column.into(), cell);
    }

    pub fn remove(&mut self, column: &str) -> Option<Cell> {
        self.0.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the column is absent, null or the empty string.
    pub fn is_missing(&self, column: &str) -> bool {
        self.0.get(column).map_or(true, Cell::is_missing)
    }

    /// Numeric value of a column, if present and parseable.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.0.get(column).and_then(Cell::as_f64)
    }

    /// String rendering of a column for grouping and display. Null and
    /// absent columns render empty.
    pub fn text(&self, column: &str) -> String {
        self.0.get(column).map(Cell::to_csv_field).unwrap_or_default()
    }

    /// Rewrite every non-finite numeric cell to null.
    pub fn sanitized(mut self) -> Self {
        for cell in self.0.values_mut() {
            if matches!(cell, Cell::Float(f) if !f.is_finite()) {
                *cell = Cell::Null;
            }
        }
        self
    }

    /// Canonical serialization used for exact-duplicate detection.
    ///
    /// The backing map is ordered, so two rows with equal columns and cells
    /// always fingerprint identically.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl FromIterator<(String, Cell)> for FlatRow {
    fn from_iter<T: IntoIterator<Item = (String, Cell)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A merged row set with an ordered column list.
///
/// Rows originate from several entity families; the `source` column carries
/// provenance. The column list preserves first-seen order for CSV output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnifiedTable {
    pub columns: Vec<String>,
    pub rows: Vec<FlatRow>,
}

impl UnifiedTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Rebuild a table from consumed rows; the column list is the union of
    /// row columns in lexical order.
    pub fn from_rows(rows: Vec<FlatRow>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for col in row.columns() {
                if !columns.iter().any(|c| c == col) {
                    columns.push(col.to_string());
                }
            }
        }
        columns.sort();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Cell)]) -> FlatRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn fingerprint_is_column_order_independent() {
        let a = row(&[("x", Cell::Int(1)), ("y", Cell::Str("b".into()))]);
        let mut b = FlatRow::new();
        b.insert("y", Cell::Str("b".into()));
        b.insert("x", Cell::Int(1));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn sanitized_row_has_no_non_finite_values() {
        let r = row(&[
            ("ok", Cell::Float(1.5)),
            ("bad", Cell::Float(f64::NAN)),
            ("worse", Cell::Float(f64::INFINITY)),
        ])
        .sanitized();
        assert_eq!(r.get("ok"), Some(&Cell::Float(1.5)));
        assert_eq!(r.get("bad"), Some(&Cell::Null));
        assert_eq!(r.get("worse"), Some(&Cell::Null));
    }

    #[test]
    fn from_rows_collects_column_union() {
        let table = UnifiedTable::from_rows(vec![
            row(&[("a", Cell::Int(1))]),
            row(&[("b", Cell::Int(2)), ("a", Cell::Int(3))]),
        ]);
        assert_eq!(table.columns, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_column_counts_as_missing() {
        let r = row(&[("present", Cell::Int(1))]);
        assert!(r.is_missing("absent"));
        assert!(!r.is_missing("present"));
    }
}
