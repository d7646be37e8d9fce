//! Stock-level views over the unified inventory table.

use crate::classify::{classify, StockStatus, Thresholds};
use common::{Cell, UnifiedTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which measure drives the status classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum StockView {
    #[default]
    Quantity,
    Amount,
}

impl StockView {
    /// Parse the query-string form; anything other than `Amount` is the
    /// quantity view.
    pub fn from_param(param: &str) -> Self {
        if param.eq_ignore_ascii_case("amount") {
            StockView::Amount
        } else {
            StockView::Quantity
        }
    }
}

/// One classified stock group: `(item_name, price, date_of_purchased,
/// store)` with summed amount and first-seen quantity.
#[derive(Debug, Clone, Serialize)]
pub struct StockRow {
    pub item_name: String,
    pub price: Cell,
    pub date_of_purchased: Cell,
    pub store_store_name: Cell,
    pub quantity: f64,
    pub amount: f64,
    pub status: StockStatus,
}

/// Per-item stock rollup (the coarser `/inventory` endpoint shape).
#[derive(Debug, Clone, Serialize)]
pub struct ItemStockRow {
    pub item_name: String,
    pub quantity: f64,
    pub amount: f64,
    pub status: StockStatus,
}

/// Status counts for the dashboard summary strip.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StockSummary {
    pub critical: usize,
    pub low: usize,
    pub sufficient: usize,
    pub total_items: usize,
    pub total_amount: f64,
}

/// Group inventory rows by `(item_name, price, date_of_purchased, store)`,
/// sum the amount, take the first quantity, and classify each group.
///
/// Returns an empty vec for an empty table or one without `item_name`.
pub fn stock_levels(table: &UnifiedTable, view: StockView, thresholds: &Thresholds) -> Vec<StockRow> {
    if table.is_empty() || !table.has_column("item_name") {
        return Vec::new();
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, StockRow> = HashMap::new();

    for row in &table.rows {
        let key = format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}",
            row.text("item_name"),
            row.text("price"),
            row.text("date_of_purchased"),
            row.text("store_store_name"),
        );
        let amount = row.number("amount").unwrap_or(0.0);
        let quantity = row.number("quantity").unwrap_or(0.0);

        match groups.get_mut(&key) {
            Some(group) => {
                group.amount += amount;
                // quantity is 'first': the stock count repeats per purchase
                // line, summing it would double-count.
            }
            None => {
                order.push(key.clone());
                groups.insert(
                    key,
                    StockRow {
                        item_name: row.text("item_name"),
                        price: row.get("price").cloned().unwrap_or(Cell::Null),
                        date_of_purchased: row.get("date_of_purchased").cloned().unwrap_or(Cell::Null),
                        store_store_name: row.get("store_store_name").cloned().unwrap_or(Cell::Null),
                        quantity,
                        amount,
                        status: StockStatus::Sufficient,
                    },
                );
            }
        }
    }

    let mut out: Vec<StockRow> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect();
    for group in &mut out {
        let measure = match view {
            StockView::Quantity => group.quantity,
            StockView::Amount => group.amount,
        };
        group.status = classify(measure, thresholds);
    }
    out
}

/// Per-item sums of quantity and amount with status, classification by the
/// chosen view's measure.
pub fn item_inventory(table: &UnifiedTable, view: StockView, thresholds: &Thresholds) -> Vec<ItemStockRow> {
    if table.is_empty() || !table.has_column("item_name") {
        return Vec::new();
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, ItemStockRow> = HashMap::new();

    for row in &table.rows {
        let item = row.text("item_name");
        let quantity = row.number("quantity").unwrap_or(0.0);
        let amount = row.number("amount").unwrap_or(0.0);
        match groups.get_mut(&item) {
            Some(group) => {
                group.quantity += quantity;
                group.amount += amount;
            }
            None => {
                order.push(item.clone());
                groups.insert(
                    item.clone(),
                    ItemStockRow {
                        item_name: item,
                        quantity,
                        amount,
                        status: StockStatus::Sufficient,
                    },
                );
            }
        }
    }

    let mut out: Vec<ItemStockRow> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect();
    for group in &mut out {
        let measure = match view {
            StockView::Quantity => group.quantity,
            StockView::Amount => group.amount,
        };
        group.status = classify(measure, thresholds);
    }
    out
}

/// Count groups per status bucket.
pub fn stock_summary(rows: &[StockRow]) -> StockSummary {
    let mut summary = StockSummary {
        total_items: rows.len(),
        ..Default::default()
    };
    for row in rows {
        summary.total_amount += row.amount;
        match row.status {
            StockStatus::Critical => summary.critical += 1,
            StockStatus::Low => summary.low += 1,
            StockStatus::Sufficient => summary.sufficient += 1,
        }
    }
    summary
}
