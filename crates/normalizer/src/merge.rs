//! Merge & deduplication of per-family flat rows into unified tables.
//!
//! Steps, in order: tag provenance, drop rows missing every measure, apply
//! fill rules (they affect equality, so they run before dedup), drop legacy
//! columns, concatenate preserving input order, remove exact duplicates
//! keeping the first occurrence.

use crate::schema::EntitySchema;
use common::{Cell, FlatRow, UnifiedTable};
use metrics::counter;
use std::collections::HashSet;
use tracing::debug;

/// Provenance column added to every merged row.
pub const SOURCE_COLUMN: &str = "source";

/// A per-row data-quality default applied before deduplication.
#[derive(Debug, Clone)]
pub enum FillRule {
    /// Missing `column` becomes a constant.
    Constant { column: &'static str, value: Cell },
    /// Missing `column` is copied from another column of the same row.
    FromColumn {
        column: &'static str,
        from: &'static str,
    },
}

/// Fill rules for the requests merge. These are data-quality defaults, not
/// optional: omitting them changes downstream aggregate counts.
pub fn request_fills() -> Vec<FillRule> {
    vec![
        FillRule::Constant {
            column: "status_name",
            value: Cell::Str("Good".to_string()),
        },
        FillRule::FromColumn {
            column: "requester_received_date",
            from: "requested_date",
        },
        FillRule::Constant {
            column: "requested_project_name",
            value: Cell::Str("non project item".to_string()),
        },
        FillRule::Constant {
            column: "returned_quantity",
            value: Cell::Int(0),
        },
    ]
}

/// Legacy columns dropped from the requests merge if schema drift
/// reintroduces them upstream.
pub const REQUEST_DROP_COLUMNS: &[&str] = &["storekeeper_received_date", "tool_type"];

/// One family's flattened rows entering a merge.
#[derive(Debug)]
pub struct TaggedRows<'a> {
    pub schema: &'a EntitySchema,
    pub rows: Vec<FlatRow>,
}

/// Merge behavior knobs shared by the two merge runs.
#[derive(Debug, Default)]
pub struct MergeOptions {
    pub fills: Vec<FillRule>,
    pub drop_columns: &'static [&'static str],
}

impl MergeOptions {
    /// Options for the requests merge (requested-tool + requested-inventory).
    pub fn requests() -> Self {
        Self {
            fills: request_fills(),
            drop_columns: REQUEST_DROP_COLUMNS,
        }
    }

    /// Options for the inventory merge (fixed-asset + tool + inventory-item).
    pub fn inventory() -> Self {
        Self::default()
    }
}

/// Combine two or more flat-row tables into one unified table with a
/// `source` provenance column, dropping measureless rows and exact
/// duplicates.
pub fn merge(inputs: Vec<TaggedRows<'_>>, options: &MergeOptions) -> UnifiedTable {
    let mut columns: Vec<String> = Vec::new();
    let mut merged: Vec<FlatRow> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut dropped_measureless: u64 = 0;
    let mut dropped_duplicates: u64 = 0;

    for input in inputs {
        let schema = input.schema;

        for column in schema.output_columns {
            if !options.drop_columns.contains(column) && !columns.iter().any(|c| c == column) {
                columns.push((*column).to_string());
            }
        }

        for mut row in input.rows {
            // A row is kept if at least one measure is present.
            let all_measures_missing = !schema.measure_columns.is_empty()
                && schema
                    .measure_columns
                    .iter()
                    .all(|measure| row.is_missing(measure));
            if all_measures_missing {
                dropped_measureless += 1;
                continue;
            }

            apply_fills(&mut row, &options.fills);

            for column in options.drop_columns {
                row.remove(column);
            }

            row.insert(SOURCE_COLUMN, Cell::Str(schema.source.as_str().to_string()));

            if seen.insert(row.fingerprint()) {
                merged.push(row);
            } else {
                dropped_duplicates += 1;
            }
        }
    }

    if !columns.iter().any(|c| c == SOURCE_COLUMN) {
        columns.push(SOURCE_COLUMN.to_string());
    }

    counter!("merge_rows_dropped_total", "reason" => "no_measures").increment(dropped_measureless);
    counter!("merge_rows_dropped_total", "reason" => "duplicate").increment(dropped_duplicates);
    debug!(
        rows = merged.len(),
        dropped_measureless, dropped_duplicates, "merge complete"
    );

    UnifiedTable {
        columns,
        rows: merged,
    }
}

fn apply_fills(row: &mut FlatRow, fills: &[FillRule]) {
    for fill in fills {
        match fill {
            FillRule::Constant { column, value } => {
                if row.is_missing(column) {
                    row.insert(*column, value.clone());
                }
            }
            FillRule::FromColumn { column, from } => {
                if row.is_missing(column) {
                    if let Some(source) = row.get(from).filter(|c| !c.is_missing()).cloned() {
                        row.insert(*column, source);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Source;

    static LEFT: EntitySchema = EntitySchema {
        family: "left",
        source: Source::Tools,
        output_columns: &["id", "item_name", "requested_quantity", "requested_date"],
        sub_objects: &[],
        renames: &[],
        excluded_fields: &[],
        id_columns: &["id"],
        measure_columns: &["requested_quantity", "item_name"],
        constants: &[],
    };

    static RIGHT: EntitySchema = EntitySchema {
        family: "right",
        source: Source::Inventory,
        output_columns: &["id", "item_name", "requested_quantity", "requested_date"],
        sub_objects: &[],
        renames: &[],
        excluded_fields: &[],
        id_columns: &["id"],
        measure_columns: &["requested_quantity", "item_name"],
        constants: &[],
    };

    fn request_row(id: &str, item: &str, qty: i64) -> FlatRow {
        let mut row = FlatRow::new();
        row.insert("id", Cell::Str(id.into()));
        row.insert("item_name", Cell::Str(item.into()));
        row.insert("requested_quantity", Cell::Int(qty));
        row.insert("requested_date", Cell::Str("2025-01-01".into()));
        row
    }

    #[test]
    fn provenance_tag_added_per_input() {
        let table = merge(
            vec![
                TaggedRows { schema: &LEFT, rows: vec![request_row("1", "A", 2)] },
                TaggedRows { schema: &RIGHT, rows: vec![request_row("2", "B", 3)] },
            ],
            &MergeOptions::default(),
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].text("source"), "tools");
        assert_eq!(table.rows[1].text("source"), "inventory");
        assert!(table.has_column("source"));
    }

    #[test]
    fn exact_duplicates_collapse_to_first_occurrence() {
        let row = request_row("1", "X", 5);
        let table = merge(
            vec![TaggedRows {
                schema: &LEFT,
                rows: vec![row.clone(), row],
            }],
            &MergeOptions::default(),
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].text("item_name"), "X");
    }

    #[test]
    fn merge_is_idempotent() {
        let rows = vec![request_row("1", "A", 2), request_row("2", "B", 3)];
        let once = merge(
            vec![TaggedRows { schema: &LEFT, rows: rows.clone() }],
            &MergeOptions::default(),
        );
        let twice = merge(
            vec![
                TaggedRows { schema: &LEFT, rows: rows.clone() },
                TaggedRows { schema: &LEFT, rows },
            ],
            &MergeOptions::default(),
        );
        assert_eq!(once.len(), twice.len());
        assert_eq!(
            once.rows.iter().map(FlatRow::fingerprint).collect::<Vec<_>>(),
            twice.rows.iter().map(FlatRow::fingerprint).collect::<Vec<_>>()
        );
    }

    #[test]
    fn row_missing_all_measures_is_dropped() {
        let mut no_measures = FlatRow::new();
        no_measures.insert("id", Cell::Str("9".into()));
        no_measures.insert("item_name", Cell::Null);
        no_measures.insert("requested_quantity", Cell::Str(String::new()));

        let mut one_measure = FlatRow::new();
        one_measure.insert("id", Cell::Str("10".into()));
        one_measure.insert("item_name", Cell::Str("Kept".into()));
        one_measure.insert("requested_quantity", Cell::Null);

        let table = merge(
            vec![TaggedRows {
                schema: &LEFT,
                rows: vec![no_measures, one_measure],
            }],
            &MergeOptions::default(),
        );

        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].text("item_name"), "Kept");
    }

    #[test]
    fn request_fills_applied_before_dedup() {
        // Two rows that differ only in defaulted columns must collapse.
        let mut explicit = request_row("1", "A", 2);
        explicit.insert("status_name", Cell::Str("Good".into()));
        explicit.insert("requested_project_name", Cell::Str("non project item".into()));
        explicit.insert("requester_received_date", Cell::Str("2025-01-01".into()));
        explicit.insert("returned_quantity", Cell::Int(0));

        let mut sparse = request_row("1", "A", 2);
        sparse.insert("status_name", Cell::Null);
        sparse.insert("requested_project_name", Cell::Null);
        sparse.insert("requester_received_date", Cell::Null);
        sparse.insert("returned_quantity", Cell::Null);

        let table = merge(
            vec![TaggedRows {
                schema: &LEFT,
                rows: vec![explicit, sparse],
            }],
            &MergeOptions::requests(),
        );

        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.text("status_name"), "Good");
        assert_eq!(row.text("requested_project_name"), "non project item");
        assert_eq!(row.text("requester_received_date"), "2025-01-01");
        assert_eq!(row.get("returned_quantity"), Some(&Cell::Int(0)));
    }

    #[test]
    fn legacy_columns_dropped_from_requests() {
        let mut row = request_row("1", "A", 2);
        row.insert("storekeeper_received_date", Cell::Str("2025-01-02".into()));
        row.insert("tool_type", Cell::Str("power".into()));

        let table = merge(
            vec![TaggedRows { schema: &LEFT, rows: vec![row] }],
            &MergeOptions::requests(),
        );

        assert!(!table.rows[0].contains("storekeeper_received_date"));
        assert!(!table.rows[0].contains("tool_type"));
    }

    #[test]
    fn input_order_preserved_across_families() {
        let table = merge(
            vec![
                TaggedRows {
                    schema: &LEFT,
                    rows: vec![request_row("1", "first", 1), request_row("2", "second", 1)],
                },
                TaggedRows { schema: &RIGHT, rows: vec![request_row("3", "third", 1)] },
            ],
            &MergeOptions::default(),
        );

        let items: Vec<String> = table.rows.iter().map(|r| r.text("item_name")).collect();
        assert_eq!(items, vec!["first", "second", "third"]);
    }
}
