//! HTTP API handlers and routes using axum.
//!
//! Every read pulls a bounded batch from the bus through the shared
//! consumer registry, rebuilds the unified table and runs the requested
//! analytics over it. An empty topic is a normal answer, not an error.
//!
//! Routes:
//! - GET /health - Health check
//! - GET /stats - Consumer registry statistics
//! - GET /requests - Filtered unified request rows
//! - GET /inventory - Per-item stock rows with status
//! - GET /stock - Stock level rows grouped by purchase lot
//! - GET /stock/summary - Status counts and total amount
//! - GET /transactions - Per-item transaction totals
//! - GET /transactions/series - Time-bucketed transaction sums
//! - GET /demand - Weekly-average demand predictions
//! - POST /consumers/reset - Drop cached subscriptions for this group

use analytics::{
    bucket_transactions, filter_project, forecast_demand, item_inventory, stock_levels,
    stock_summary, transaction_totals, Period, StockView, TableKind, Thresholds, ALL_PROJECTS,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bus::{ConsumerRegistry, Topic, TOPIC_INVENTORY, TOPIC_REQUESTS};
use chrono::Utc;
use common::UnifiedTable;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Default forecast horizon when the request does not name one.
pub const DEFAULT_FORECAST_WEEKS: u32 = 4;

/// Application state shared across handlers.
pub struct AppState {
    pub registry: ConsumerRegistry,
    /// Durable consumer group this service reads under.
    pub group: String,
    /// Per-read batch cap.
    pub max_messages: usize,
}

/// Query parameters shared by the read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ReadQuery {
    /// Project filter; absent or "All Projects" keeps every row.
    pub project: Option<String>,
    /// Stock measure: "quantity" (default) or "amount".
    pub view: Option<String>,
    /// Resampling period for /transactions/series.
    pub period: Option<Period>,
    /// Forecast horizon for /demand (default 4).
    pub weeks: Option<u32>,
}

impl ReadQuery {
    fn project(&self) -> &str {
        self.project.as_deref().unwrap_or(ALL_PROJECTS)
    }

    fn view(&self) -> StockView {
        self.view
            .as_deref()
            .map(StockView::from_param)
            .unwrap_or_default()
    }

    fn weeks(&self) -> u32 {
        match self.weeks {
            Some(0) | None => DEFAULT_FORECAST_WEEKS,
            Some(weeks) => weeks,
        }
    }
}

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/requests", get(requests_handler))
        .route("/inventory", get(inventory_handler))
        .route("/stock", get(stock_handler))
        .route("/stock/summary", get(stock_summary_handler))
        .route("/transactions", get(transactions_handler))
        .route("/transactions/series", get(transaction_series_handler))
        .route("/demand", get(demand_handler))
        .route("/consumers/reset", post(reset_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Registry statistics.
/// GET /stats
async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry.stats())
}

/// Unified request rows, optionally filtered by project.
/// GET /requests?project=
async fn requests_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let table = read_requests(&state, &query).await?;
    Ok(Json(table.rows))
}

/// Per-item stock rows with classification status.
/// GET /inventory?project=&view=
async fn inventory_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let table = read_inventory(&state, &query).await?;
    Ok(Json(item_inventory(&table, query.view(), &Thresholds::default())))
}

/// Stock level rows grouped by purchase lot.
/// GET /stock?project=&view=
async fn stock_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let table = read_inventory(&state, &query).await?;
    Ok(Json(stock_levels(&table, query.view(), &Thresholds::default())))
}

/// Status counts and total amount across the stock rows.
/// GET /stock/summary?project=&view=
async fn stock_summary_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let table = read_inventory(&state, &query).await?;
    let rows = stock_levels(&table, query.view(), &Thresholds::default());
    Ok(Json(stock_summary(&rows)))
}

/// Per-item transaction totals.
/// GET /transactions?project=
async fn transactions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let table = read_requests(&state, &query).await?;
    Ok(Json(transaction_totals(&table)))
}

/// Time-bucketed transaction sums.
/// GET /transactions/series?project=&period=
async fn transaction_series_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let table = read_requests(&state, &query).await?;
    let period = query.period.unwrap_or_default();
    Ok(Json(bucket_transactions(&table, period)))
}

/// Weekly-average demand predictions.
/// GET /demand?project=&weeks=
async fn demand_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let table = read_requests(&state, &query).await?;
    Ok(Json(forecast_demand(&table, query.weeks(), Utc::now())))
}

/// Parameters for the reset endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ResetQuery {
    /// Topic name to reset; absent resets every topic.
    pub topic: Option<String>,
}

/// Drop this service's cached subscriptions and read buffers. The next
/// read resumes from the group's durable offset.
/// POST /consumers/reset?topic=
async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    match query.topic {
        Some(name) => {
            let topic = Topic::by_name(&name)
                .ok_or_else(|| ApiError::NotFound(format!("Topic '{}' not found", name)))?;
            state.registry.reset(&topic, &state.group);
        }
        None => {
            for topic in [&TOPIC_REQUESTS, &TOPIC_INVENTORY] {
                state.registry.reset(topic, &state.group);
            }
        }
    }
    Ok(Json(state.registry.stats()))
}

// ============================================================================
// Shared reads
// ============================================================================

async fn read_requests(state: &AppState, query: &ReadQuery) -> Result<UnifiedTable, ApiError> {
    read_table(state, &TOPIC_REQUESTS, TableKind::Requests, query.project()).await
}

async fn read_inventory(state: &AppState, query: &ReadQuery) -> Result<UnifiedTable, ApiError> {
    read_table(state, &TOPIC_INVENTORY, TableKind::Inventory, query.project()).await
}

async fn read_table(
    state: &AppState,
    topic: &Topic,
    kind: TableKind,
    project: &str,
) -> Result<UnifiedTable, ApiError> {
    let rows = state
        .registry
        .consume(topic, &state.group, state.max_messages)
        .await?;
    let table = UnifiedTable::from_rows(rows);
    Ok(filter_project(table, kind, project))
}

// ============================================================================
// Error Handling
// ============================================================================

/// API error types.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Unavailable(String),
}

impl From<bus::Error> for ApiError {
    fn from(e: bus::Error) -> Self {
        match e {
            bus::Error::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse { error: message });

        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}
