//! Common types, values and tables shared across the SCM pipeline.

pub mod cell;
pub mod table;

pub use cell::Cell;
pub use table::{FlatRow, UnifiedTable};
