//! CSV artifacts, the file-based fallback when no bus is available.
//!
//! One UTF-8 file per unified table with a header row. Identifier columns
//! are already strings by the time a table reaches this point, so ids are
//! never written as bare numbers.

use common::UnifiedTable;
use std::path::Path;

/// Write a unified table as a CSV file, creating parent directories.
pub fn write_csv(table: &UnifiedTable, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        let record: Vec<String> = table
            .columns
            .iter()
            .map(|column| row.text(column))
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
