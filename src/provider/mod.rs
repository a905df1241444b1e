//! Upstream market-data gateway abstraction.
//!
//! The analytics pipelines fetch raw series through [`MarketDataProvider`],
//! a trait object so handlers can run against the HTTP gateway in production
//! and an in-memory fake in tests. Record types here are the crate's data
//! model; wire formats live with the implementations.

pub mod http;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::timerange::IntervalUnit;

pub use http::HttpGatewayProvider;

/// Boxed future returned by provider methods.
pub type ProviderFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Parameters shared by every gateway time-series fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    /// Gateway dataset code, e.g. `XNAS.ITCH` or `OPRA.PILLAR`.
    pub dataset: String,
    /// Instrument symbol in the dataset's native form.
    pub symbol: String,
    /// Window start, inclusive.
    pub start: DateTime<Utc>,
    /// Window end, exclusive.
    pub end: DateTime<Utc>,
}

impl DataQuery {
    /// Builds a query for one symbol over a UTC window.
    #[must_use]
    pub fn new(
        dataset: impl Into<String>,
        symbol: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            symbol: symbol.into(),
            start,
            end,
        }
    }
}

/// Historical market-data source.
///
/// Implementations must return rows ordered by timestamp; the alignment
/// passes downstream rely on it.
pub trait MarketDataProvider: Send + Sync {
    /// Aggregated bars at the given granularity (schema `ohlcv-1{d|h|m|s}`).
    fn ohlcv<'a>(&'a self, query: &'a DataQuery, unit: IntervalUnit)
    -> ProviderFuture<'a, Vec<Bar>>;

    /// Top-of-book quote and trade events (schema `mbp-1`, or the
    /// consolidated `cmbp-1` on venues that publish one).
    fn top_of_book<'a>(
        &'a self,
        query: &'a DataQuery,
        consolidated: bool,
    ) -> ProviderFuture<'a, Vec<BookUpdate>>;

    /// Trade prints (schema `trades`).
    fn trades<'a>(&'a self, query: &'a DataQuery) -> ProviderFuture<'a, Vec<Trade>>;

    /// Listed instrument definitions for a parent symbol such as `AAPL.OPT`
    /// (schema `definition`).
    fn definitions<'a>(
        &'a self,
        query: &'a DataQuery,
    ) -> ProviderFuture<'a, Vec<InstrumentDefinition>>;
}

/// Anything carrying an event timestamp.
pub trait Timestamped {
    /// Event timestamp in UTC.
    fn ts(&self) -> DateTime<Utc>;
}

/// One aggregated bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    /// Bar timestamp (bucket open) in UTC.
    pub ts: DateTime<Utc>,
    /// First trade price in the bucket.
    pub open: f64,
    /// Highest trade price in the bucket.
    pub high: f64,
    /// Lowest trade price in the bucket.
    pub low: f64,
    /// Last trade price in the bucket.
    pub close: f64,
    /// Total traded size in the bucket.
    pub volume: u64,
}

impl Timestamped for Bar {
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
}

/// What a top-of-book row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    /// A trade print.
    Trade,
    /// A book update carrying quote sides.
    Quote,
}

/// One top-of-book event: a trade print or a quote refresh.
///
/// Trade rows carry `price`/`size`; quote rows carry whichever of
/// `bid_px`/`ask_px` the venue published.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookUpdate {
    /// Event timestamp in UTC.
    pub ts: DateTime<Utc>,
    /// Trade print or quote refresh.
    pub action: EventAction,
    /// Trade price, when this row is a print.
    pub price: Option<f64>,
    /// Trade size, when this row is a print.
    pub size: Option<u64>,
    /// Best bid price, when published.
    pub bid_px: Option<f64>,
    /// Best bid size, when published.
    pub bid_sz: Option<u64>,
    /// Best ask price, when published.
    pub ask_px: Option<f64>,
    /// Best ask size, when published.
    pub ask_sz: Option<u64>,
}

impl Timestamped for BookUpdate {
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
}

/// One trade print.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trade {
    /// Event timestamp in UTC.
    pub ts: DateTime<Utc>,
    /// Trade price.
    pub price: f64,
    /// Trade size.
    pub size: u64,
}

impl Timestamped for Trade {
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
}

/// One listed-instrument definition row.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentDefinition {
    /// Fixed-width option ticker.
    pub raw_symbol: String,
    /// Expiration instant in UTC.
    pub expiration: DateTime<Utc>,
    /// Strike price.
    pub strike: Decimal,
    /// Instrument class code, e.g. `C` or `P`.
    pub instrument_class: String,
}

/// Upstream gateway failure.
///
/// Provider errors are surfaced to the API client as-is; there is no retry
/// layer in front of the gateway.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Transport-level failure reaching the gateway.
    #[error("gateway request failed: {0}")]
    Transport(String),

    /// The gateway answered with a non-success status.
    #[error("gateway returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Gateway error body.
        message: String,
    },

    /// The gateway payload did not decode.
    #[error("gateway payload decode failed: {0}")]
    Decode(String),
}
