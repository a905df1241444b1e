//! Route configuration.

use crate::api::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

/// Creates the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Bar charts
        .route("/equity-chart", post(handlers::equity_chart))
        .route("/opt-ohlcv-lf", post(handlers::option_bar_iv))
        // High-frequency quotes
        .route("/opt-nbbo-hf", post(handlers::quote_chart))
        .route("/multi-iv", post(handlers::multi_iv))
        // Option solver
        .route("/option-solver", post(handlers::solve_option))
        // Reference data
        .route("/option-definitions", get(handlers::option_definitions))
        .route(
            "/underlying-expiration",
            get(handlers::underlying_expiration),
        )
        .fallback(handlers::not_found)
        .with_state(state)
}
