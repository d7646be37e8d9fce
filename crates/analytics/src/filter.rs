//! Project filtering for read queries.

use common::{Cell, UnifiedTable};

/// Sentinel filter value that disables project filtering.
pub const ALL_PROJECTS: &str = "All Projects";

/// Which unified table a query reads, determining the project column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Inventory,
    Requests,
}

/// The column that carries the project display value for each table.
pub fn project_column(kind: TableKind) -> &'static str {
    match kind {
        TableKind::Inventory => "department_id",
        TableKind::Requests => "requested_project_name",
    }
}

/// Restrict a table to rows whose trimmed project value equals `project`.
///
/// `All Projects` (or an empty filter) returns the table unchanged; a table
/// without the project column filters to empty unless unfiltered.
pub fn filter_project(table: UnifiedTable, kind: TableKind, project: &str) -> UnifiedTable {
    if project.is_empty() || project == ALL_PROJECTS {
        return table;
    }
    let column = project_column(kind);
    let rows = table
        .rows
        .into_iter()
        .filter(|row| display_value(row.get(column)) == project)
        .collect();
    UnifiedTable {
        columns: table.columns,
        rows,
    }
}

fn display_value(cell: Option<&Cell>) -> String {
    cell.map(|c| c.to_csv_field().trim().to_string())
        .unwrap_or_default()
}
