//! Analytics HTTP server.
//!
//! Exposes the five read operations of the query engine as a JSON API.
//! The engine is constructed by the process entry point *after* ingestion
//! has completed, so the server never observes a half-ingested store.
//!
//! # Endpoints
//!
//! | Method | Path | Query parameters |
//! |--------|------|------------------|
//! | `GET`  | `/transactions` | `month`, `search`, `page`, `size` |
//! | `GET`  | `/statistics` | `month` |
//! | `GET`  | `/price-range` | `month` |
//! | `GET`  | `/categories` | `month` |
//! | `GET`  | `/combined-report` | `month` |
//! | `GET`  | `/health` | — |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "month must be between 1 and 12, got 13" } }
//! ```
//!
//! Error codes: `bad_request` (400), `store_unavailable` (503),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! dashboards.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::EngineError;
use crate::models::{CategoryCount, CombinedReport, PriceHistogram, SalesStatistics, SearchPage};
use crate::query::QueryEngine;

/// Shared application state passed to all route handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    engine: Arc<QueryEngine>,
}

/// Starts the analytics HTTP server.
///
/// Binds to the address configured in `[server].bind` and serves until the
/// process is terminated. The caller is responsible for having run
/// migrations and the ingestion pass first.
pub async fn run_server(config: &Config, engine: QueryEngine) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let state = AppState {
        config: Arc::new(config.clone()),
        engine: Arc::new(engine),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/transactions", get(handle_transactions))
        .route("/statistics", get(handle_statistics))
        .route("/price-range", get(handle_price_range))
        .route("/categories", get(handle_categories))
        .route("/combined-report", get(handle_combined_report))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    tracing::info!(bind = %bind_addr, "analytics API listening");
    println!("Analytics API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable
/// message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidArgument(message) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "bad_request".to_string(),
                message,
            },
            EngineError::Store(e) => {
                tracing::error!(error = %e, "catalog store failure");
                AppError {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    code: "store_unavailable".to_string(),
                    message: "catalog store unavailable".to_string(),
                }
            }
        }
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check for load balancers and monitoring.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /transactions ============

#[derive(Debug, Deserialize)]
struct TransactionsQuery {
    month: Option<u32>,
    #[serde(default)]
    search: String,
    page: Option<u32>,
    size: Option<u32>,
}

/// Paginated, searchable product listing.
async fn handle_transactions(
    State(state): State<AppState>,
    Query(params): Query<TransactionsQuery>,
) -> Result<Json<SearchPage>, AppError> {
    let page = params.page.unwrap_or(1);
    let size = params
        .size
        .unwrap_or(state.config.pagination.default_page_size)
        .min(state.config.pagination.max_page_size);

    let result = state
        .engine
        .search(params.month, &params.search, page, size)
        .await?;
    Ok(Json(result))
}

// ============ Aggregate endpoints ============

#[derive(Debug, Deserialize)]
struct MonthQuery {
    month: Option<u32>,
}

async fn handle_statistics(
    State(state): State<AppState>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<SalesStatistics>, AppError> {
    Ok(Json(state.engine.statistics(params.month).await?))
}

async fn handle_price_range(
    State(state): State<AppState>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<PriceHistogram>, AppError> {
    Ok(Json(state.engine.price_range(params.month).await?))
}

async fn handle_categories(
    State(state): State<AppState>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Vec<CategoryCount>>, AppError> {
    Ok(Json(state.engine.categories(params.month).await?))
}

async fn handle_combined_report(
    State(state): State<AppState>,
    Query(params): Query<MonthQuery>,
) -> Result<Json<CombinedReport>, AppError> {
    Ok(Json(state.engine.combined_report(params.month).await?))
}
