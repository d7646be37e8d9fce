//! Flatten/reconcile engine.
//!
//! One raw record in, exactly one flat row out. Flattening is total: a
//! record missing every declared sub-object still produces a row containing
//! all required output columns, null-filled, with reconciliation warnings
//! instead of errors.

use crate::schema::{EntitySchema, Warning, WarningKind};
use common::{Cell, FlatRow};
use metrics::counter;
use serde_json::{Map, Value};

/// Result of flattening one payload: rows plus non-fatal findings.
#[derive(Debug, Default)]
pub struct FlattenOutput {
    pub rows: Vec<FlatRow>,
    pub warnings: Vec<Warning>,
}

/// Flatten an upstream `{"data": [ ...records... ]}` payload.
///
/// An absent or non-array `data` yields an empty row set, not an error.
/// Non-object elements are skipped with a warning.
pub fn flatten_payload(schema: &EntitySchema, payload: &Value) -> FlattenOutput {
    let mut out = FlattenOutput::default();

    let records = match payload.get("data") {
        Some(Value::Array(records)) => records,
        Some(other) => {
            out.warnings.push(Warning {
                kind: WarningKind::MalformedRecord,
                family: schema.family,
                detail: format!("'data' is not a sequence (got {})", json_kind(other)),
            });
            return out;
        }
        None => {
            out.warnings.push(Warning {
                kind: WarningKind::MalformedRecord,
                family: schema.family,
                detail: "payload has no 'data' collection".to_string(),
            });
            return out;
        }
    };

    for (index, record) in records.iter().enumerate() {
        match record {
            Value::Object(map) => {
                let row = flatten_record(schema, map, &mut out.warnings);
                out.rows.push(row);
            }
            other => {
                out.warnings.push(Warning {
                    kind: WarningKind::MalformedRecord,
                    family: schema.family,
                    detail: format!("record #{} is not a mapping (got {})", index, json_kind(other)),
                });
            }
        }
    }

    counter!("normalizer_rows_flattened_total", "family" => schema.family)
        .increment(out.rows.len() as u64);
    counter!("normalizer_warnings_total", "family" => schema.family)
        .increment(out.warnings.len() as u64);

    out
}

/// Flatten a single raw record into exactly one flat row.
///
/// Steps: copy retained top-level fields, apply renames, lift every declared
/// sub-object field as `<sub>_<field>`, stamp constants, null-fill absent
/// required columns, coerce identifiers to strings, and restrict the row to
/// the required output columns.
pub fn flatten_record(
    schema: &EntitySchema,
    record: &Map<String, Value>,
    warnings: &mut Vec<Warning>,
) -> FlatRow {
    let mut lifted = FlatRow::new();

    for (key, value) in record {
        if schema.is_sub_object(key) || schema.is_excluded(key) {
            continue;
        }
        lifted.insert(key.clone(), Cell::from_json(value.clone()));
    }

    for (from, to) in schema.renames {
        if let Some(cell) = lifted.remove(from) {
            lifted.insert(*to, cell);
        }
    }

    for sub in schema.sub_objects {
        let nested = match record.get(sub.name) {
            Some(Value::Object(map)) => Some(map),
            Some(Value::Null) | None => None,
            Some(other) => {
                warnings.push(Warning {
                    kind: WarningKind::MalformedRecord,
                    family: schema.family,
                    detail: format!(
                        "sub-object '{}' is not a mapping (got {}), treated as empty",
                        sub.name,
                        json_kind(other)
                    ),
                });
                None
            }
        };

        for field in sub.fields {
            let cell = nested
                .and_then(|m| m.get(*field))
                .map(|v| Cell::from_json(v.clone()))
                .unwrap_or(Cell::Null);
            lifted.insert(format!("{}_{}", sub.name, field), cell);
        }
    }

    for (column, value) in schema.constants {
        lifted.insert(*column, Cell::Int(*value));
    }

    // Restrict to the required output columns; extra lifted columns exist
    // transiently for merge-key lookups only.
    let mut row = FlatRow::new();
    for column in schema.output_columns {
        match lifted.remove(column) {
            Some(cell) => row.insert(*column, cell),
            None => {
                warnings.push(Warning {
                    kind: WarningKind::SchemaMismatch,
                    family: schema.family,
                    detail: format!("column '{}' missing upstream, filled with null", column),
                });
                row.insert(*column, Cell::Null);
            }
        }
    }

    for id_column in schema.id_columns {
        if let Some(cell) = row.remove(id_column) {
            row.insert(*id_column, cell.coerce_to_string());
        }
    }

    row
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families;
    use crate::schema::{Source, SubObject};
    use serde_json::json;

    static TEST_SCHEMA: EntitySchema = EntitySchema {
        family: "test-item",
        source: Source::Inventory,
        output_columns: &["id", "item_name", "store_store_name", "quantity"],
        sub_objects: &[SubObject { name: "store", fields: &["store_name"] }],
        renames: &[],
        excluded_fields: &["internal_user"],
        id_columns: &["id"],
        measure_columns: &["quantity"],
        constants: &[],
    };

    #[test]
    fn null_sub_object_lifts_null_columns() {
        let payload = json!({"data": [{"id": 7, "item_name": "Bolt", "store": null}]});
        let out = flatten_payload(&TEST_SCHEMA, &payload);

        assert_eq!(out.rows.len(), 1);
        let row = &out.rows[0];
        assert_eq!(row.get("id"), Some(&Cell::Str("7".into())));
        assert_eq!(row.get("item_name"), Some(&Cell::Str("Bolt".into())));
        assert_eq!(row.get("store_store_name"), Some(&Cell::Null));
    }

    #[test]
    fn column_set_equals_required_columns_exactly() {
        let payload = json!({"data": [{
            "id": 1,
            "item_name": "Wrench",
            "surplus_field": "dropped",
            "store": {"store_name": "Main", "location": "HQ"},
            "quantity": 4
        }]});
        let out = flatten_payload(&TEST_SCHEMA, &payload);

        let row = &out.rows[0];
        let columns: Vec<&str> = row.columns().collect();
        let mut expected: Vec<&str> = TEST_SCHEMA.output_columns.to_vec();
        expected.sort_unstable();
        assert_eq!(columns, expected);
    }

    #[test]
    fn flattening_is_total_on_empty_record() {
        let mut warnings = Vec::new();
        let record = Map::new();
        let row = flatten_record(&TEST_SCHEMA, &record, &mut warnings);

        assert_eq!(row.len(), TEST_SCHEMA.output_columns.len());
        for column in TEST_SCHEMA.output_columns {
            assert_eq!(row.get(column), Some(&Cell::Null), "column {}", column);
        }
        // Every required column except the lifted store field was absent.
        assert_eq!(
            warnings
                .iter()
                .filter(|w| w.kind == WarningKind::SchemaMismatch)
                .count(),
            3
        );
    }

    #[test]
    fn scalar_sub_object_treated_as_empty_with_warning() {
        let payload = json!({"data": [{"id": 2, "item_name": "Nut", "store": "oops", "quantity": 1}]});
        let out = flatten_payload(&TEST_SCHEMA, &payload);

        assert_eq!(out.rows[0].get("store_store_name"), Some(&Cell::Null));
        assert!(out
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::MalformedRecord));
    }

    #[test]
    fn missing_or_non_sequence_data_yields_empty_set() {
        let out = flatten_payload(&TEST_SCHEMA, &json!({"status": "ok"}));
        assert!(out.rows.is_empty());

        let out = flatten_payload(&TEST_SCHEMA, &json!({"data": "not-a-list"}));
        assert!(out.rows.is_empty());
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn excluded_fields_never_surface() {
        let payload = json!({"data": [{"id": 3, "internal_user": {"id": 9}, "quantity": 2, "item_name": "Pin"}]});
        let out = flatten_payload(&TEST_SCHEMA, &payload);
        assert!(!out.rows[0].contains("internal_user"));
    }

    #[test]
    fn requested_inventory_renames_map_to_unified_columns() {
        let payload = json!({"data": [{
            "id": 11,
            "item_name": "Cable",
            "name": "Abebe",
            "inventory_id": 42,
            "requested_quantity": 5,
            "requested_date": "2025-01-01"
        }]});
        let out = flatten_payload(&families::REQUESTED_INVENTORY, &payload);

        let row = &out.rows[0];
        assert_eq!(row.get("requester_name"), Some(&Cell::Str("Abebe".into())));
        assert_eq!(row.get("tool_id"), Some(&Cell::Str("42".into())));
        assert!(!row.contains("inventory_id"));
    }

    #[test]
    fn fixed_asset_constant_is_transient() {
        let payload = json!({"data": [{"id": 5, "item_name": "Crane", "quantity": 1}]});
        let out = flatten_payload(&families::FIXED_ASSET, &payload);
        // Stamped before restriction, discarded by it.
        assert!(!out.rows[0].contains("is_fixed_asset"));
        assert_eq!(out.rows[0].len(), families::FIXED_ASSET.output_columns.len());
    }

    #[test]
    fn deep_nested_inventory_record_lifts_prefixed_fields() {
        let payload = json!({"data": [{
            "id": 99,
            "item_name": "Rebar",
            "quantity": 120,
            "amount": 4800.0,
            "store": {"store_name": "Yard 2", "location": "Site B"},
            "uom": {"name": "kg"},
            "project": {"project_name": "Tower A"},
            "inventory_user": {"id": 1, "name": "dropped"}
        }]});
        let out = flatten_payload(&families::INVENTORY_ITEM, &payload);

        let row = &out.rows[0];
        assert_eq!(row.get("store_store_name"), Some(&Cell::Str("Yard 2".into())));
        assert_eq!(row.get("uom_name"), Some(&Cell::Str("kg".into())));
        assert_eq!(row.get("quantity"), Some(&Cell::Int(120)));
        // project_* columns are lifted transiently but not part of the
        // stock output set.
        assert!(!row.contains("project_project_name"));
    }
}
