//! HTTP implementation of the market-data gateway.
//!
//! Speaks a plain JSON time-series protocol: one `GET /timeseries` per fetch
//! with dataset, symbol, schema, and window as query parameters, bearer-auth
//! with the configured API key, JSON record arrays back.

use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{
    Bar, BookUpdate, DataQuery, EventAction, InstrumentDefinition, MarketDataProvider,
    ProviderError, ProviderFuture, Trade,
};
use crate::timerange::IntervalUnit;

/// Gateway client backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpGatewayProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpGatewayProvider {
    /// Creates a provider for the gateway at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Fetches one schema for one symbol, decoding the JSON record array.
    async fn fetch<T: DeserializeOwned>(
        &self,
        schema: &str,
        query: &DataQuery,
        symbology: Option<&str>,
    ) -> Result<Vec<T>, ProviderError> {
        let url = format!("{}/timeseries", self.base_url);
        let start = query.start.to_rfc3339();
        let end = query.end.to_rfc3339();

        let mut params = vec![
            ("dataset", query.dataset.as_str()),
            ("symbols", query.symbol.as_str()),
            ("schema", schema),
            ("start", start.as_str()),
            ("end", end.as_str()),
        ];
        if let Some(stype) = symbology {
            params.push(("stype_in", stype));
        }

        tracing::debug!(
            dataset = %query.dataset,
            symbol = %query.symbol,
            schema,
            "gateway fetch"
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Self::handle_response(response).await
    }

    /// Maps a gateway response to decoded records or a typed error.
    async fn handle_response<T: DeserializeOwned>(
        response: Response,
    ) -> Result<Vec<T>, ProviderError> {
        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ProviderError::Decode(e.to_string()))
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

impl MarketDataProvider for HttpGatewayProvider {
    fn ohlcv<'a>(
        &'a self,
        query: &'a DataQuery,
        unit: IntervalUnit,
    ) -> ProviderFuture<'a, Vec<Bar>> {
        Box::pin(async move {
            let schema = bar_schema(unit);
            let raw: Vec<RawBar> = self.fetch(&schema, query, None).await?;
            let mut bars: Vec<Bar> = raw.into_iter().map(RawBar::into_bar).collect();
            // Gateway order is not guaranteed across venues.
            bars.sort_by_key(|b| b.ts);
            Ok(bars)
        })
    }

    fn top_of_book<'a>(
        &'a self,
        query: &'a DataQuery,
        consolidated: bool,
    ) -> ProviderFuture<'a, Vec<BookUpdate>> {
        Box::pin(async move {
            let raw: Vec<RawBookUpdate> =
                self.fetch(book_schema(consolidated), query, None).await?;
            let mut updates: Vec<BookUpdate> =
                raw.into_iter().map(RawBookUpdate::into_update).collect();
            updates.sort_by_key(|u| u.ts);
            Ok(updates)
        })
    }

    fn trades<'a>(&'a self, query: &'a DataQuery) -> ProviderFuture<'a, Vec<Trade>> {
        Box::pin(async move {
            let raw: Vec<RawTrade> = self.fetch("trades", query, None).await?;
            let mut trades: Vec<Trade> = raw.into_iter().map(RawTrade::into_trade).collect();
            trades.sort_by_key(|t| t.ts);
            Ok(trades)
        })
    }

    fn definitions<'a>(
        &'a self,
        query: &'a DataQuery,
    ) -> ProviderFuture<'a, Vec<InstrumentDefinition>> {
        Box::pin(async move {
            let raw: Vec<RawDefinition> =
                self.fetch("definition", query, Some("parent")).await?;
            Ok(raw.into_iter().map(RawDefinition::into_definition).collect())
        })
    }
}

/// Schema name for aggregated bars at the given granularity.
fn bar_schema(unit: IntervalUnit) -> String {
    format!("ohlcv-1{}", unit.code())
}

/// Schema name for top-of-book events.
fn book_schema(consolidated: bool) -> &'static str {
    if consolidated { "cmbp-1" } else { "mbp-1" }
}

/// Maps the wire action code: `T` is a trade print, everything else is a
/// book update.
fn action_from_wire(action: &str) -> EventAction {
    if action == "T" {
        EventAction::Trade
    } else {
        EventAction::Quote
    }
}

// Wire records. Field names follow the gateway's JSON contract.

#[derive(Debug, Deserialize)]
struct RawBar {
    ts_event: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl RawBar {
    fn into_bar(self) -> Bar {
        Bar {
            ts: self.ts_event,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawBookUpdate {
    ts_event: DateTime<Utc>,
    action: String,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    bid_px: Option<f64>,
    #[serde(default)]
    bid_sz: Option<u64>,
    #[serde(default)]
    ask_px: Option<f64>,
    #[serde(default)]
    ask_sz: Option<u64>,
}

impl RawBookUpdate {
    fn into_update(self) -> BookUpdate {
        BookUpdate {
            ts: self.ts_event,
            action: action_from_wire(&self.action),
            price: self.price,
            size: self.size,
            bid_px: self.bid_px,
            bid_sz: self.bid_sz,
            ask_px: self.ask_px,
            ask_sz: self.ask_sz,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTrade {
    ts_event: DateTime<Utc>,
    price: f64,
    size: u64,
}

impl RawTrade {
    fn into_trade(self) -> Trade {
        Trade {
            ts: self.ts_event,
            price: self.price,
            size: self.size,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDefinition {
    raw_symbol: String,
    expiration: DateTime<Utc>,
    strike_price: f64,
    instrument_class: String,
}

impl RawDefinition {
    fn into_definition(self) -> InstrumentDefinition {
        // Scale fixed at 3 so whole-dollar strikes still display as 150.000.
        let mut strike = Decimal::from_f64_retain(self.strike_price)
            .unwrap_or_default()
            .round_dp(3);
        strike.rescale(3);
        InstrumentDefinition {
            raw_symbol: self.raw_symbol,
            expiration: self.expiration,
            strike,
            instrument_class: self.instrument_class,
        }
    }
}
