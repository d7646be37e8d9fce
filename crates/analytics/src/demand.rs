//! Flat-average weekly demand forecast.
//!
//! Per item: sum requested quantity per ISO week, average across all
//! historical weeks, then project that mean forward one point per future
//! week. This is a historical-average projection, not a model.

use crate::dates::row_date;
use chrono::{DateTime, Datelike, Duration, Utc};
use common::UnifiedTable;
use serde::Serialize;
use std::collections::HashMap;

/// One forward-looking point prediction.
#[derive(Debug, Clone, Serialize)]
pub struct DemandPrediction {
    pub item_name: String,
    /// `%Y-%m-%d`.
    pub predicted_date: String,
    /// Historical weekly mean, rounded to 2 decimals.
    pub predicted_quantity: f64,
}

/// Forecast demand for every item with at least one parseable-dated request.
///
/// Emits `horizon_weeks` predictions per item, one for each week after
/// `now`. Items with zero historical weeks are omitted, not projected as
/// zero. Returns empty when the table lacks the needed columns.
pub fn forecast_demand(
    table: &UnifiedTable,
    horizon_weeks: u32,
    now: DateTime<Utc>,
) -> Vec<DemandPrediction> {
    if table.is_empty()
        || !table.has_column("item_name")
        || !table.has_column("requested_date")
        || !table.has_column("requested_quantity")
    {
        return Vec::new();
    }

    // (item, ISO week) -> summed requested quantity.
    let mut weekly: HashMap<(String, i32, u32), f64> = HashMap::new();
    let mut item_order: Vec<String> = Vec::new();

    for row in &table.rows {
        let Some(date) = row_date(row, "requested_date") else {
            continue;
        };
        let item = row.text("item_name");
        if item.is_empty() {
            continue;
        }
        if !item_order.contains(&item) {
            item_order.push(item.clone());
        }
        let week = date.iso_week();
        *weekly
            .entry((item, week.year(), week.week()))
            .or_insert(0.0) += row.number("requested_quantity").unwrap_or(0.0);
    }

    // Mean across weeks per item.
    let mut sums: HashMap<String, (f64, u32)> = HashMap::new();
    for ((item, _, _), qty) in weekly {
        let entry = sums.entry(item).or_insert((0.0, 0));
        entry.0 += qty;
        entry.1 += 1;
    }

    let mut predictions = Vec::new();
    for item in item_order {
        let Some((total, weeks)) = sums.get(&item) else {
            continue;
        };
        let mean = round2(total / *weeks as f64);
        for offset in 1..=horizon_weeks {
            let predicted = now + Duration::weeks(offset as i64);
            predictions.push(DemandPrediction {
                item_name: item.clone(),
                predicted_date: predicted.format("%Y-%m-%d").to_string(),
                predicted_quantity: mean,
            });
        }
    }
    predictions
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{Cell, FlatRow};

    fn req_row(item: &str, date: &str, qty: f64) -> FlatRow {
        let mut row = FlatRow::new();
        row.insert("item_name", Cell::Str(item.into()));
        row.insert("requested_date", Cell::Str(date.into()));
        row.insert("requested_quantity", Cell::Float(qty));
        row
    }

    fn table(rows: Vec<FlatRow>) -> UnifiedTable {
        UnifiedTable {
            columns: vec![
                "item_name".into(),
                "requested_date".into(),
                "requested_quantity".into(),
            ],
            rows,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn weekly_mean_over_two_weeks() {
        // 10 in week one, 6 in week two -> mean 8.0.
        let t = table(vec![
            req_row("A", "2025-01-01", 10.0),
            req_row("A", "2025-01-08", 6.0),
        ]);
        let predictions = forecast_demand(&t, 2, fixed_now());

        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| p.predicted_quantity == 8.0));
        assert_eq!(predictions[0].predicted_date, "2025-02-08");
        assert_eq!(predictions[1].predicted_date, "2025-02-15");
    }

    #[test]
    fn same_week_requests_sum_before_averaging() {
        // Both dates fall in the same ISO week: one historical week of 16.
        let t = table(vec![
            req_row("A", "2025-01-06", 10.0),
            req_row("A", "2025-01-08", 6.0),
        ]);
        let predictions = forecast_demand(&t, 1, fixed_now());
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].predicted_quantity, 16.0);
    }

    #[test]
    fn items_without_parseable_history_are_omitted() {
        let t = table(vec![
            req_row("A", "2025-01-01", 10.0),
            req_row("B", "not a date", 99.0),
        ]);
        let predictions = forecast_demand(&t, 4, fixed_now());
        assert!(predictions.iter().all(|p| p.item_name == "A"));
        assert_eq!(predictions.len(), 4);
    }

    #[test]
    fn mean_is_rounded_to_two_decimals() {
        // Weeks of 1, 1, 2 -> mean 1.3333... -> 1.33.
        let t = table(vec![
            req_row("A", "2025-01-01", 1.0),
            req_row("A", "2025-01-08", 1.0),
            req_row("A", "2025-01-15", 2.0),
        ]);
        let predictions = forecast_demand(&t, 1, fixed_now());
        assert_eq!(predictions[0].predicted_quantity, 1.33);
    }

    #[test]
    fn empty_or_column_less_input_yields_empty() {
        assert!(forecast_demand(&UnifiedTable::default(), 4, fixed_now()).is_empty());
        let no_qty = UnifiedTable {
            columns: vec!["item_name".into(), "requested_date".into()],
            rows: vec![req_row("A", "2025-01-01", 1.0)],
        };
        assert!(forecast_demand(&no_qty, 4, fixed_now()).is_empty());
    }
}
