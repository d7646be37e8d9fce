//! Time-bucketed transaction aggregation over the unified requests table.

use crate::dates::row_date;
use chrono::{Datelike, Duration, NaiveDate};
use common::UnifiedTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashMap;

/// Measure columns summed per bucket. Missing columns are synthesized as
/// zero per column, not by aborting the operation.
const MEASURES: &[&str] = &[
    "requested_quantity",
    "current_consumed_amount",
    "consumed_amount",
    "returned_quantity",
    "amount",
];

/// Calendar resampling period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl Period {
    /// Bucket label for a date: the day itself, the week's Monday, or the
    /// first of the month.
    pub fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Daily => date,
            Period::Weekly => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            Period::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

/// Summed measures for one calendar bucket.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionBucket {
    /// Bucket start date, `%Y-%m-%d`.
    pub bucket: String,
    pub requested_quantity: f64,
    pub current_consumed_amount: f64,
    pub consumed_amount: f64,
    pub returned_quantity: f64,
    pub amount: f64,
}

/// Per-item transaction totals (the `/transactions` endpoint shape).
#[derive(Debug, Clone, Serialize)]
pub struct TransactionTotals {
    pub item_name: String,
    pub requested_quantity: f64,
    pub consumed_amount: f64,
    pub returned_quantity: f64,
}

/// Resample the requests table by calendar period, summing each measure per
/// bucket. Rows without a parseable `requested_date` are excluded from
/// every bucket.
pub fn bucket_transactions(table: &UnifiedTable, period: Period) -> Vec<TransactionBucket> {
    if table.is_empty() {
        return Vec::new();
    }

    let mut buckets: BTreeMap<NaiveDate, [f64; 5]> = BTreeMap::new();
    for row in &table.rows {
        let Some(date) = row_date(row, "requested_date") else {
            continue;
        };
        let sums = buckets.entry(period.bucket(date)).or_default();
        for (slot, measure) in MEASURES.iter().enumerate() {
            sums[slot] += row.number(measure).unwrap_or(0.0);
        }
    }

    buckets
        .into_iter()
        .map(|(bucket, sums)| TransactionBucket {
            bucket: bucket.format("%Y-%m-%d").to_string(),
            requested_quantity: sums[0],
            current_consumed_amount: sums[1],
            consumed_amount: sums[2],
            returned_quantity: sums[3],
            amount: sums[4],
        })
        .collect()
}

/// Sum requested, consumed and returned quantities per item.
pub fn transaction_totals(table: &UnifiedTable) -> Vec<TransactionTotals> {
    if table.is_empty() || !table.has_column("item_name") {
        return Vec::new();
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, TransactionTotals> = HashMap::new();

    for row in &table.rows {
        let item = row.text("item_name");
        let entry = groups.entry(item.clone()).or_insert_with(|| {
            order.push(item.clone());
            TransactionTotals {
                item_name: item,
                requested_quantity: 0.0,
                consumed_amount: 0.0,
                returned_quantity: 0.0,
            }
        });
        entry.requested_quantity += row.number("requested_quantity").unwrap_or(0.0);
        entry.consumed_amount += row.number("consumed_amount").unwrap_or(0.0);
        entry.returned_quantity += row.number("returned_quantity").unwrap_or(0.0);
    }

    order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Cell, FlatRow};

    fn req_row(item: &str, date: &str, qty: f64, returned: f64) -> FlatRow {
        let mut row = FlatRow::new();
        row.insert("item_name", Cell::Str(item.into()));
        row.insert("requested_date", Cell::Str(date.into()));
        row.insert("requested_quantity", Cell::Float(qty));
        row.insert("returned_quantity", Cell::Float(returned));
        row
    }

    fn table(rows: Vec<FlatRow>) -> UnifiedTable {
        UnifiedTable {
            columns: vec![
                "item_name".into(),
                "requested_date".into(),
                "requested_quantity".into(),
                "returned_quantity".into(),
            ],
            rows,
        }
    }

    #[test]
    fn weekly_buckets_start_on_monday() {
        // 2025-01-01 is a Wednesday; its ISO week starts 2024-12-30.
        let t = table(vec![
            req_row("A", "2025-01-01", 10.0, 0.0),
            req_row("A", "2025-01-03", 5.0, 1.0),
            req_row("A", "2025-01-08", 6.0, 0.0),
        ]);
        let buckets = bucket_transactions(&t, Period::Weekly);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].bucket, "2024-12-30");
        assert_eq!(buckets[0].requested_quantity, 15.0);
        assert_eq!(buckets[0].returned_quantity, 1.0);
        assert_eq!(buckets[1].bucket, "2025-01-06");
        assert_eq!(buckets[1].requested_quantity, 6.0);
    }

    #[test]
    fn unparseable_dates_are_excluded_from_every_bucket() {
        let t = table(vec![
            req_row("A", "2025-01-01", 10.0, 0.0),
            req_row("A", "garbled", 99.0, 0.0),
            req_row("A", "", 50.0, 0.0),
        ]);
        let buckets = bucket_transactions(&t, Period::Weekly);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].requested_quantity, 10.0);
    }

    #[test]
    fn monthly_buckets_label_first_of_month() {
        let t = table(vec![
            req_row("A", "2025-02-15", 3.0, 0.0),
            req_row("A", "2025-02-28", 4.0, 0.0),
        ]);
        let buckets = bucket_transactions(&t, Period::Monthly);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].bucket, "2025-02-01");
        assert_eq!(buckets[0].requested_quantity, 7.0);
    }

    #[test]
    fn missing_measure_columns_sum_to_zero() {
        let mut row = FlatRow::new();
        row.insert("requested_date", Cell::Str("2025-01-01".into()));
        let t = UnifiedTable {
            columns: vec!["requested_date".into()],
            rows: vec![row],
        };
        let buckets = bucket_transactions(&t, Period::Weekly);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].requested_quantity, 0.0);
        assert_eq!(buckets[0].amount, 0.0);
    }

    #[test]
    fn totals_group_by_item() {
        let t = table(vec![
            req_row("A", "2025-01-01", 10.0, 2.0),
            req_row("B", "2025-01-02", 1.0, 0.0),
            req_row("A", "2025-01-03", 5.0, 1.0),
        ]);
        let totals = transaction_totals(&t);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].item_name, "A");
        assert_eq!(totals[0].requested_quantity, 15.0);
        assert_eq!(totals[0].returned_quantity, 3.0);
        assert_eq!(totals[1].item_name, "B");
    }

    #[test]
    fn empty_table_yields_empty_results() {
        let empty = UnifiedTable::default();
        assert!(bucket_transactions(&empty, Period::Weekly).is_empty());
        assert!(transaction_totals(&empty).is_empty());
    }
}
