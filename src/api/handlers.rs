//! API request handlers.
//!
//! Handlers stay thin: extract the request, call the matching pipeline in
//! [`crate::pipeline`], wrap the result. Error mapping lives on
//! [`ApiError`].

use crate::error::ApiError;
use crate::models::{
    BarIvResponse, ChartDataResponse, ChartRequest, DefinitionsQuery, ExpirationQuery,
    ExpirationStatusResponse, HealthResponse, HfQuoteResponse, MultiIvRequest, MultiIvResponse,
    OptionDefinitionItem, QuoteChartRequest, SolverRequest, SolverResponse,
};
use crate::pipeline;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use std::sync::Arc;

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

// ============================================================================
// Bar Charts
// ============================================================================

/// Get an OHLCV chart for an equity or option symbol.
///
/// Symbols longer than four characters are treated as option identifiers
/// and fetched from the options venue.
#[utoipa::path(
    post,
    path = "/equity-chart",
    request_body = ChartRequest,
    responses(
        (status = 200, description = "OHLCV chart series", body = ChartDataResponse),
        (status = 400, description = "Invalid symbol, dates, or interval"),
        (status = 502, description = "Data gateway failure")
    ),
    tag = "Charts"
)]
pub async fn equity_chart(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChartRequest>,
) -> Result<Json<ChartDataResponse>, ApiError> {
    let chart = pipeline::equity_chart(state.provider.as_ref(), &state.config, &request).await?;
    Ok(Json(chart))
}

/// Get per-bar implied volatility for one option contract.
///
/// Option bars are aligned with underlying bars and each OHLC field is
/// inverted to an implied volatility.
#[utoipa::path(
    post,
    path = "/opt-ohlcv-lf",
    request_body = ChartRequest,
    responses(
        (status = 200, description = "Implied volatility bar series", body = BarIvResponse),
        (status = 400, description = "Invalid ticker, dates, or interval"),
        (status = 502, description = "Data gateway failure")
    ),
    tag = "Charts"
)]
pub async fn option_bar_iv(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChartRequest>,
) -> Result<Json<BarIvResponse>, ApiError> {
    let chart = pipeline::option_bar_iv(state.provider.as_ref(), &state.config, &request).await?;
    Ok(Json(chart))
}

// ============================================================================
// High-Frequency Quotes
// ============================================================================

/// Get tick-level NBBO, trades, and implied volatility for one contract.
///
/// The window is capped at 30 minutes.
#[utoipa::path(
    post,
    path = "/opt-nbbo-hf",
    request_body = QuoteChartRequest,
    responses(
        (status = 200, description = "Quote, trade, and IV series", body = HfQuoteResponse),
        (status = 400, description = "Invalid ticker, dates, or oversized window"),
        (status = 502, description = "Data gateway failure")
    ),
    tag = "Quotes"
)]
pub async fn quote_chart(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QuoteChartRequest>,
) -> Result<Json<HfQuoteResponse>, ApiError> {
    let chart = pipeline::hf_quote_chart(state.provider.as_ref(), &state.config, &request).await?;
    Ok(Json(chart))
}

/// Get trade-level implied volatility for several contracts at once.
///
/// All contracts share one underlying; the window is capped at 5 days.
#[utoipa::path(
    post,
    path = "/multi-iv",
    request_body = MultiIvRequest,
    responses(
        (status = 200, description = "Per-contract IV series", body = MultiIvResponse),
        (status = 400, description = "Invalid contracts, dates, or oversized window"),
        (status = 502, description = "Data gateway failure")
    ),
    tag = "Quotes"
)]
pub async fn multi_iv(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MultiIvRequest>,
) -> Result<Json<MultiIvResponse>, ApiError> {
    let response = pipeline::multi_iv(state.provider.as_ref(), &state.config, &request).await?;
    Ok(Json(response))
}

// ============================================================================
// Option Solver
// ============================================================================

/// Solve one Black-Scholes quantity from the other five.
///
/// `solveFor` picks the unknown; the response carries only that field.
#[utoipa::path(
    post,
    path = "/option-solver",
    request_body = SolverRequest,
    responses(
        (status = 200, description = "Solved quantity", body = SolverResponse),
        (status = 400, description = "Unknown contract type or no solution")
    ),
    tag = "Solver"
)]
pub async fn solve_option(
    Json(request): Json<SolverRequest>,
) -> Result<Json<SolverResponse>, ApiError> {
    Ok(Json(pipeline::solve_option(&request)?))
}

// ============================================================================
// Reference Data
// ============================================================================

/// List the option contracts defined for an underlying on a given day.
#[utoipa::path(
    get,
    path = "/option-definitions",
    params(
        ("start_date" = String, Query, description = "Definition day, YYYY-MM-DD"),
        ("ticker" = String, Query, description = "Underlying symbol")
    ),
    responses(
        (status = 200, description = "Contract definitions", body = [OptionDefinitionItem]),
        (status = 400, description = "Invalid date"),
        (status = 502, description = "Data gateway failure")
    ),
    tag = "Reference"
)]
pub async fn option_definitions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DefinitionsQuery>,
) -> Result<Json<Vec<OptionDefinitionItem>>, ApiError> {
    let items =
        pipeline::option_definitions(state.provider.as_ref(), &state.config, &query).await?;
    Ok(Json(items))
}

/// Decode an option ticker and report days until expiration.
#[utoipa::path(
    get,
    path = "/underlying-expiration",
    params(
        ("ticker" = String, Query, description = "Full option identifier")
    ),
    responses(
        (status = 200, description = "Expiration status", body = ExpirationStatusResponse),
        (status = 400, description = "Invalid ticker")
    ),
    tag = "Reference"
)]
pub async fn underlying_expiration(
    Query(query): Query<ExpirationQuery>,
) -> Result<Json<ExpirationStatusResponse>, ApiError> {
    Ok(Json(pipeline::expiration_status(&query)?))
}

// ============================================================================
// Fallback
// ============================================================================

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("unknown route".to_string())
}
