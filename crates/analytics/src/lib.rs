//! Read-side analytics over unified tables.
//!
//! Three independent, read-only operations: stock classification,
//! time-bucketed transaction aggregation and a flat-average weekly demand
//! forecast. Every operation is a pure function of the table it is given,
//! owns no state, and returns an empty result set (never an error) when the
//! input is empty or lacks the needed columns.

pub mod classify;
pub mod dates;
pub mod demand;
pub mod filter;
pub mod stock;
pub mod transactions;

pub use classify::{classify, StockStatus, Thresholds};
pub use demand::{forecast_demand, DemandPrediction};
pub use filter::{filter_project, project_column, TableKind, ALL_PROJECTS};
pub use stock::{item_inventory, stock_levels, stock_summary, ItemStockRow, StockRow, StockSummary, StockView};
pub use transactions::{bucket_transactions, transaction_totals, Period, TransactionBucket, TransactionTotals};
