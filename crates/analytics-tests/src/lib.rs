//! Integration tests for the Option Analytics API.
//!
//! These tests require the API server to be running (and, for the data
//! endpoints, a reachable market data gateway). Configure the server URL via
//! the `API_BASE_URL` environment variable (default: `http://localhost:8080`).
//!
//! All tests are `#[ignore]`d by default; run them against a live server
//! with `cargo test -p analytics-tests -- --ignored`.

use analytics_client::{AnalyticsClient, ClientConfig};
use std::time::Duration;

/// Gets the API base URL from environment or uses default.
#[must_use]
pub fn get_api_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Creates a test client configured for the API.
///
/// # Errors
/// Returns error if client creation fails.
pub fn create_test_client() -> Result<AnalyticsClient, analytics_client::Error> {
    AnalyticsClient::new(ClientConfig {
        base_url: get_api_url(),
        timeout: Duration::from_secs(10),
    })
}

/// A liquid contract identifier for live-data tests.
///
/// Override via `TEST_OPTION_TICKER` when the default has expired.
#[must_use]
pub fn test_option_ticker() -> String {
    std::env::var("TEST_OPTION_TICKER")
        .unwrap_or_else(|_| "AAPL  250117C00150000".to_string())
}
