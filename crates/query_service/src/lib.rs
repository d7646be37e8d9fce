//! Read-side HTTP API over the unified SCM tables on the bus.

pub mod api;

pub use api::{create_router, ApiError, AppState, ReadQuery, DEFAULT_FORECAST_WEEKS};
