//! HTTP client for the analytics API.

use crate::error::Error;
use crate::types::*;
use reqwest::Client;
use std::time::Duration;


/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:8080").
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the Option Analytics API.
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    client: Client,
    base_url: String,
}

impl AnalyticsClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::new(ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Performs a health check.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn health_check(&self) -> Result<HealthResponse, Error> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Bar Charts
    // ========================================================================

    /// Fetches an OHLCV chart for an equity or option symbol.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn equity_chart(&self, request: &ChartRequest) -> Result<ChartDataResponse, Error> {
        let url = format!("{}/equity-chart", self.base_url);
        let resp = self.client.post(&url).json(request).send().await?;
        self.handle_response(resp).await
    }

    /// Fetches per-bar implied volatility for one option contract.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn option_bar_iv(&self, request: &ChartRequest) -> Result<BarIvResponse, Error> {
        let url = format!("{}/opt-ohlcv-lf", self.base_url);
        let resp = self.client.post(&url).json(request).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // High-Frequency Quotes
    // ========================================================================

    /// Fetches tick-level NBBO, trades, and IV for one option contract.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn quote_chart(&self, request: &QuoteChartRequest) -> Result<HfQuoteResponse, Error> {
        let url = format!("{}/opt-nbbo-hf", self.base_url);
        let resp = self.client.post(&url).json(request).send().await?;
        self.handle_response(resp).await
    }

    /// Fetches trade-level IV for several contracts over one underlying.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn multi_iv(&self, request: &MultiIvRequest) -> Result<MultiIvResponse, Error> {
        let url = format!("{}/multi-iv", self.base_url);
        let resp = self.client.post(&url).json(request).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Option Solver
    // ========================================================================

    /// Solves one Black-Scholes quantity from the other five.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn solve_option(&self, request: &SolverRequest) -> Result<SolverResponse, Error> {
        let url = format!("{}/option-solver", self.base_url);
        let resp = self.client.post(&url).json(request).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Reference Data
    // ========================================================================

    /// Lists the option contracts defined for an underlying on a given day.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn option_definitions(
        &self,
        query: &DefinitionsQuery,
    ) -> Result<Vec<OptionDefinitionItem>, Error> {
        let params = serde_urlencoded::to_string(query).unwrap_or_default();
        let url = format!("{}/option-definitions?{}", self.base_url, params);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    /// Reports the days remaining until an option contract expires.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn underlying_expiration(
        &self,
        ticker: &str,
    ) -> Result<ExpirationStatusResponse, Error> {
        let query = ExpirationQuery {
            ticker: ticker.to_string(),
        };
        let params = serde_urlencoded::to_string(&query).unwrap_or_default();
        let url = format!("{}/underlying-expiration?{}", self.base_url, params);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status.is_success() {
            Ok(resp.json().await?)
        } else if status.as_u16() == 404 {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::NotFound(text))
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(Error::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}
