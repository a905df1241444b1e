//! Application state management.

use crate::config::Config;
use crate::provider::{HttpGatewayProvider, MarketDataProvider};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream market-data gateway.
    pub provider: Arc<dyn MarketDataProvider>,
    /// Application configuration.
    pub config: Config,
    /// Instant the state was created, for uptime reporting.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates a new application state with an explicit provider.
    #[must_use]
    pub fn new(config: Config, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            config,
            started_at: Utc::now(),
        }
    }

    /// Creates a new application state from configuration, wiring the HTTP
    /// gateway provider.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let provider = Arc::new(HttpGatewayProvider::new(
            &config.provider.base_url,
            &config.provider.api_key,
        ));
        Self::new(config, provider)
    }

    /// Seconds elapsed since the state was created.
    #[must_use]
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::from_config(Config::default())
    }
}
