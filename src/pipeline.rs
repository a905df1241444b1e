//! Analytics pipelines behind the REST endpoints.
//!
//! Each pipeline is one pass per request: validate the inputs, decode
//! tickers, fetch raw series from the gateway, align and derive, format the
//! payload. Nothing is cached between requests; identical requests issue
//! identical gateway fetches.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::America::New_York;

use crate::align::{self, TieBreak};
use crate::chart::ChartScaler;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    BarIvResponse, ChartDataResponse, ChartRequest, ContractSeries, DefinitionsQuery,
    ExpirationQuery, ExpirationStatusResponse, HfGlobalData, HfQuoteResponse, IvPoint,
    MultiIvRequest, MultiIvResponse, OptionDefinitionItem, QuoteChartRequest, SolveFor,
    SolverRequest, SolverResponse, SolverTimeUnit, TickPoint, TradeIvPoint,
};
use crate::pricing;
use crate::provider::{Bar, BookUpdate, DataQuery, EventAction, MarketDataProvider, Trade};
use crate::solver;
use crate::ticker::{self, ContractType, OptionContractId};
use crate::timerange::{self, IntervalUnit, TimeRange};

/// Hard cap on the high-frequency quote window.
const MAX_QUOTE_SPAN_MINUTES: i64 = 30;

/// Hard cap on the multi-contract IV window.
const MAX_MULTI_IV_SPAN_DAYS: i64 = 5;

/// Symbols longer than this route to the options venue.
const MAX_EQUITY_SYMBOL_LEN: usize = 4;

/// Solver bracket for time to expiration: one second to ten years.
const T_BRACKET: (f64, f64) = (1.0 / (365.0 * 24.0 * 3600.0), 10.0);

/// Solver bracket for strike and underlying price.
const PRICE_BRACKET: (f64, f64) = (0.01, 1_000_000.0);

/// Solver bracket for the risk-free rate.
const RATE_BRACKET: (f64, f64) = (-1.0, 1.0);

// ============================================================================
// Bar Charts
// ============================================================================

/// Builds the OHLCV chart payload for an equity or option symbol.
pub async fn equity_chart(
    provider: &dyn MarketDataProvider,
    config: &Config,
    req: &ChartRequest,
) -> Result<ChartDataResponse, ApiError> {
    let range = TimeRange::validate(&req.start_date, &req.end_date, &req.interval)?;
    let symbol = req.ticker.to_uppercase();

    tracing::debug!(symbol = %symbol, buckets = range.buckets, "bar chart fetch");
    let bars = fetch_venue_bars(provider, config, &symbol, &range).await?;

    let mut response = ChartDataResponse {
        open: Vec::with_capacity(bars.len()),
        high: Vec::with_capacity(bars.len()),
        low: Vec::with_capacity(bars.len()),
        close: Vec::with_capacity(bars.len()),
        volume: Vec::with_capacity(bars.len()),
        x: Vec::with_capacity(bars.len()),
    };
    for bar in &bars {
        response.x.push(format_bar_ts(bar.ts, range.unit));
        response.open.push(format!("{:.3}", bar.open));
        response.high.push(format!("{:.3}", bar.high));
        response.low.push(format!("{:.3}", bar.low));
        response.close.push(format!("{:.3}", bar.close));
        response.volume.push(bar.volume.to_string());
    }
    Ok(response)
}

/// Builds the per-bar implied volatility chart for one option contract.
pub async fn option_bar_iv(
    provider: &dyn MarketDataProvider,
    config: &Config,
    req: &ChartRequest,
) -> Result<BarIvResponse, ApiError> {
    let contract = ticker::decode_option_ticker(&req.ticker)?;
    let range = TimeRange::validate(&req.start_date, &req.end_date, &req.interval)?;

    let opt_query = DataQuery::new(
        config.provider.options_dataset.clone(),
        contract.raw.as_str(),
        range.start,
        range.end,
    );
    let und_query = DataQuery::new(
        config.provider.equity_dataset.clone(),
        contract.underlying.as_str(),
        range.start,
        range.end,
    );

    let option_bars =
        align::aggregate_duplicate_bars(&provider.ohlcv(&opt_query, range.unit).await?);
    let underlying_bars = provider.ohlcv(&und_query, range.unit).await?;

    let rate = config.analytics.risk_free_rate;
    let strike = contract.strike_f64();

    let mut response = BarIvResponse {
        x: Vec::new(),
        iv_open: Vec::new(),
        iv_high: Vec::new(),
        iv_low: Vec::new(),
        iv_close: Vec::new(),
        iv_mid: Vec::new(),
    };
    for (ob, ub) in align::asof_align(&option_bars, &underlying_bars, TieBreak::Earlier) {
        let years = contract.years_to_expiry(ob.ts);
        let iv_open = iv_or_zero(ob.open, ub.open, strike, years, rate, contract.contract_type);
        let iv_high = iv_or_zero(ob.high, ub.high, strike, years, rate, contract.contract_type);
        let iv_low = iv_or_zero(ob.low, ub.low, strike, years, rate, contract.contract_type);
        let iv_close = iv_or_zero(ob.close, ub.close, strike, years, rate, contract.contract_type);

        response.x.push(format_bar_ts(ob.ts, range.unit));
        response.iv_open.push(iv_open);
        response.iv_high.push(iv_high);
        response.iv_low.push(iv_low);
        response.iv_close.push(iv_close);
        response
            .iv_mid
            .push((iv_open + iv_high + iv_low + iv_close) / 4.0);
    }
    Ok(response)
}

/// Fetches bars for a symbol, routing long symbols to the options venue.
///
/// Options-venue feeds interleave several reporting venues that stamp bars
/// identically, so those pass through duplicate-timestamp aggregation.
async fn fetch_venue_bars(
    provider: &dyn MarketDataProvider,
    config: &Config,
    symbol: &str,
    range: &TimeRange,
) -> Result<Vec<Bar>, ApiError> {
    if symbol.len() > MAX_EQUITY_SYMBOL_LEN {
        let query = DataQuery::new(
            config.provider.options_dataset.clone(),
            symbol,
            range.start,
            range.end,
        );
        let bars = provider.ohlcv(&query, range.unit).await?;
        Ok(align::aggregate_duplicate_bars(&bars))
    } else {
        let query = DataQuery::new(
            config.provider.equity_dataset.clone(),
            symbol,
            range.start,
            range.end,
        );
        Ok(provider.ohlcv(&query, range.unit).await?)
    }
}

// ============================================================================
// High-Frequency Quotes
// ============================================================================

/// Builds the high-frequency NBBO + IV payload for one option contract.
pub async fn hf_quote_chart(
    provider: &dyn MarketDataProvider,
    config: &Config,
    req: &QuoteChartRequest,
) -> Result<HfQuoteResponse, ApiError> {
    let contract = ticker::decode_option_ticker(&req.ticker)?;
    let range = TimeRange::validate(&req.start_date, &req.end_date, "m")?;
    if range.end - range.start > Duration::minutes(MAX_QUOTE_SPAN_MINUTES) {
        return Err(ApiError::RangeTooLarge(format!(
            "a quote window may span at most {MAX_QUOTE_SPAN_MINUTES} minutes"
        )));
    }

    tracing::debug!(option = %contract.raw, underlying = %contract.underlying, "quote chart fetch");

    let und_query = DataQuery::new(
        config.provider.equity_dataset.clone(),
        contract.underlying.as_str(),
        range.start,
        range.end,
    );
    let opt_query = DataQuery::new(
        config.provider.options_dataset.clone(),
        contract.raw.as_str(),
        range.start,
        range.end,
    );

    let underlying_events = provider.top_of_book(&und_query, false).await?;
    let option_events = provider.top_of_book(&opt_query, true).await?;

    let und = split_book_events(&underlying_events, false);
    let opt = split_book_events(&option_events, true);

    let rate = config.analytics.risk_free_rate;
    let strike = contract.strike_f64();

    let mut option_trades = Vec::new();
    let mut option_iv = Vec::new();
    for (ot, ut) in align::asof_align(&opt.trades, &und.trades, TieBreak::Earlier) {
        let years = contract.years_to_expiry(ot.ts);
        let iv = iv_or_zero(ot.price, ut.price, strike, years, rate, contract.contract_type);
        let ts_event = format_tick_ts(ot.ts);

        option_trades.push(TradeIvPoint {
            ts_event: ts_event.clone(),
            price: ot.price,
            size: ot.size,
            underlying_price: ut.price,
            iv,
        });
        option_iv.push(IvPoint { ts_event, iv });
    }

    // Anchor geometry from the observed extremes, with fixed fallbacks when
    // a series came back empty.
    let x_anchor = series_min(opt.bids.iter().map(|p| p.price)).unwrap_or(0.0);
    let x_max = series_max(opt.asks.iter().map(|p| p.price)).map_or(1.0, |m| m * 1.1);
    let y_anchor = series_max(option_iv.iter().map(|p| p.iv)).unwrap_or(1.0);

    let bounds = ChartScaler::new(x_anchor, y_anchor, x_max, 0.0)
        .solve(config.analytics.quote_chart_ratio_target);

    let global_data = HfGlobalData {
        expiration_date: contract.expiration.format("%Y-%m-%d %H:%M:%S").to_string(),
        underlying_ticker: contract.underlying.clone(),
        option_ticker: contract.raw.clone(),
        strike_price: contract.strike.to_string(),
    };

    Ok(HfQuoteResponse {
        opt_chart_settings: bounds.into(),
        global_data,
        option_bid: opt.bids,
        option_ask: opt.asks,
        option_trades,
        underlying_bid: und.bids,
        underlying_ask: und.asks,
        underlying_trades: und.trades.iter().map(tick_point).collect(),
        option_iv,
    })
}

/// A top-of-book stream separated into prints and per-side quote series.
#[derive(Default)]
struct BookSplit {
    trades: Vec<Trade>,
    bids: Vec<TickPoint>,
    asks: Vec<TickPoint>,
}

/// Splits top-of-book events into trade prints and quote sides.
///
/// A print without a price cannot chart. On the underlying stream such rows
/// still contribute their quote sides; option prints never feed the quote
/// series (`drop_print_quotes`).
fn split_book_events(events: &[BookUpdate], drop_print_quotes: bool) -> BookSplit {
    let mut split = BookSplit::default();
    for event in events {
        match event.action {
            EventAction::Trade => {
                if let Some(price) = event.price {
                    split.trades.push(Trade {
                        ts: event.ts,
                        price,
                        size: event.size.unwrap_or(0),
                    });
                } else if !drop_print_quotes {
                    push_quote_sides(&mut split, event);
                }
            }
            EventAction::Quote => push_quote_sides(&mut split, event),
        }
    }
    split
}

fn push_quote_sides(split: &mut BookSplit, event: &BookUpdate) {
    if let Some(price) = event.bid_px {
        split.bids.push(TickPoint {
            ts_event: format_tick_ts(event.ts),
            price,
            size: event.bid_sz.unwrap_or(0),
        });
    }
    if let Some(price) = event.ask_px {
        split.asks.push(TickPoint {
            ts_event: format_tick_ts(event.ts),
            price,
            size: event.ask_sz.unwrap_or(0),
        });
    }
}

// ============================================================================
// Multi-Contract IV
// ============================================================================

/// Builds trade-level IV series for several contracts over one underlying.
pub async fn multi_iv(
    provider: &dyn MarketDataProvider,
    config: &Config,
    req: &MultiIvRequest,
) -> Result<MultiIvResponse, ApiError> {
    if req.contracts.is_empty() {
        return Err(ApiError::Format("at least one contract is required".to_string()));
    }
    let contracts = req
        .contracts
        .iter()
        .map(|raw| ticker::decode_option_ticker(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let (start, end) = timerange::parse_range(&req.start_date, &req.end_date)?;
    if end - start > Duration::days(MAX_MULTI_IV_SPAN_DAYS) {
        return Err(ApiError::RangeTooLarge(format!(
            "a multi-contract window may span at most {MAX_MULTI_IV_SPAN_DAYS} days"
        )));
    }

    // One underlying fetch serves every contract.
    let und_query = DataQuery::new(
        config.provider.equity_dataset.clone(),
        contracts[0].underlying.as_str(),
        start,
        end,
    );
    let underlying_trades = provider.trades(&und_query).await?;

    let rate = config.analytics.risk_free_rate;
    let mut options = Vec::with_capacity(contracts.len());
    for contract in &contracts {
        let opt_query = DataQuery::new(
            config.provider.options_dataset.clone(),
            contract.raw.as_str(),
            start,
            end,
        );
        let option_trades = provider.trades(&opt_query).await?;

        let mut data = Vec::new();
        for (ot, ut) in align::asof_align(&option_trades, &underlying_trades, TieBreak::Earlier) {
            let years = contract.years_to_expiry(ot.ts);
            let iv = iv_or_zero(
                ot.price,
                ut.price,
                contract.strike_f64(),
                years,
                rate,
                contract.contract_type,
            );
            data.push(TradeIvPoint {
                ts_event: format_tick_ts(ot.ts),
                price: ot.price,
                size: ot.size,
                underlying_price: ut.price,
                iv,
            });
        }
        options.push(ContractSeries {
            contract: contract_label(contract),
            data,
        });
    }

    Ok(MultiIvResponse {
        options,
        underlying: underlying_trades.iter().map(tick_point).collect(),
    })
}

/// Display label for one contract: expiration date, type flag, strike.
fn contract_label(contract: &OptionContractId) -> String {
    format!(
        "{} {} {}",
        contract.expiration.format("%Y-%m-%d"),
        contract.contract_type,
        contract.strike
    )
}

// ============================================================================
// Option Solver
// ============================================================================

/// Solves the quantity named by `solveFor` from the other five.
///
/// # Errors
///
/// [`ApiError::Format`] for an unknown contract type,
/// [`ApiError::NoSolution`] when the root-find has no bracket.
pub fn solve_option(req: &SolverRequest) -> Result<SolverResponse, ApiError> {
    let contract_type = ContractType::parse(&req.option_type)?;

    let years = match req.time_units {
        SolverTimeUnit::Days => req.t / 365.0,
        SolverTimeUnit::Hours => req.t / (365.0 * 24.0),
    };

    let response = match req.solve_for {
        SolveFor::Vol => {
            let vol =
                pricing::implied_volatility(req.price, req.u, req.s, years, req.r, contract_type)
                    .map_err(|_| ApiError::NoSolution("volatility".to_string()))?;
            SolverResponse {
                vol: Some(round3(vol)),
                ..Default::default()
            }
        }
        SolveFor::Price => {
            let price = pricing::bs_price(contract_type, req.u, req.s, years, req.r, req.vol);
            SolverResponse {
                price: Some(round3(price)),
                ..Default::default()
            }
        }
        SolveFor::T => {
            let f = |t: f64| {
                pricing::bs_price(contract_type, req.u, req.s, t, req.r, req.vol) - req.price
            };
            let t = solver::brentq(f, T_BRACKET.0, T_BRACKET.1, solver::XTOL, solver::MAX_ITER)
                .map_err(|_| ApiError::NoSolution("time".to_string()))?;
            let t = match req.time_units {
                SolverTimeUnit::Days => t * 365.0,
                SolverTimeUnit::Hours => t * 365.0 * 24.0,
            };
            SolverResponse {
                t: Some(round3(t)),
                ..Default::default()
            }
        }
        SolveFor::S => {
            let f = |k: f64| {
                pricing::bs_price(contract_type, req.u, k, years, req.r, req.vol) - req.price
            };
            let k = solver::brentq(
                f,
                PRICE_BRACKET.0,
                PRICE_BRACKET.1,
                solver::XTOL,
                solver::MAX_ITER,
            )
            .map_err(|_| ApiError::NoSolution("strike".to_string()))?;
            SolverResponse {
                s: Some(round3(k)),
                ..Default::default()
            }
        }
        SolveFor::R => {
            let f = |r: f64| {
                pricing::bs_price(contract_type, req.u, req.s, years, r, req.vol) - req.price
            };
            let r = solver::brentq(
                f,
                RATE_BRACKET.0,
                RATE_BRACKET.1,
                solver::XTOL,
                solver::MAX_ITER,
            )
            .map_err(|_| ApiError::NoSolution("interest rate".to_string()))?;
            SolverResponse {
                r: Some(round3(r)),
                ..Default::default()
            }
        }
        SolveFor::U => {
            let f = |u: f64| {
                pricing::bs_price(contract_type, u, req.s, years, req.r, req.vol) - req.price
            };
            let u = solver::brentq(
                f,
                PRICE_BRACKET.0,
                PRICE_BRACKET.1,
                solver::XTOL,
                solver::MAX_ITER,
            )
            .map_err(|_| ApiError::NoSolution("underlying price".to_string()))?;
            SolverResponse {
                u: Some(round3(u)),
                ..Default::default()
            }
        }
    };
    Ok(response)
}

// ============================================================================
// Definitions & Expiration Status
// ============================================================================

/// Lists the option contracts defined for an underlying on a given day.
pub async fn option_definitions(
    provider: &dyn MarketDataProvider,
    config: &Config,
    query: &DefinitionsQuery,
) -> Result<Vec<OptionDefinitionItem>, ApiError> {
    let day = NaiveDate::parse_from_str(&query.start_date, "%Y-%m-%d").map_err(|_| {
        ApiError::Format(format!(
            "invalid date '{}', expected YYYY-MM-DD",
            query.start_date
        ))
    })?;
    let start = day.and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1);

    let symbol = format!("{}.OPT", query.ticker.to_uppercase());
    let dq = DataQuery::new(config.provider.options_dataset.clone(), symbol, start, end);
    let defs = provider.definitions(&dq).await?;

    Ok(defs
        .into_iter()
        .map(|def| OptionDefinitionItem {
            raw_symbol: def.raw_symbol,
            expiration: def
                .expiration
                .with_timezone(&New_York)
                .format("%Y-%m-%d")
                .to_string(),
            strike_price: def.strike.to_string(),
            instrument_class: def.instrument_class,
        })
        .collect())
}

/// Decodes a contract and reports the days remaining until expiration.
pub fn expiration_status(query: &ExpirationQuery) -> Result<ExpirationStatusResponse, ApiError> {
    let contract = ticker::decode_option_ticker(&query.ticker)?;
    let days = (contract.expiration.with_timezone(&Utc) - Utc::now()).num_seconds() as f64
        / (24.0 * 3600.0);

    Ok(ExpirationStatusResponse {
        option_type: contract.contract_type.to_string(),
        strike_price: contract.strike_f64(),
        days_remaining: (days * 100.0).round() / 100.0,
    })
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// IV for one aligned observation, with the documented lossy fallback:
/// non-convergence records 0.0 and the pipeline moves on.
fn iv_or_zero(
    price: f64,
    underlying: f64,
    strike: f64,
    years: f64,
    rate: f64,
    contract_type: ContractType,
) -> f64 {
    pricing::implied_volatility(price, underlying, strike, years, rate, contract_type)
        .unwrap_or(0.0)
}

/// Formats a bar timestamp for the x axis. Daily bars stay date-only; finer
/// bars convert to America/New_York wall clock.
fn format_bar_ts(ts: DateTime<Utc>, unit: IntervalUnit) -> String {
    match unit {
        IntervalUnit::Day => ts.format("%Y-%m-%d").to_string(),
        _ => ts
            .with_timezone(&New_York)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    }
}

/// Formats a tick timestamp with microseconds, America/New_York.
fn format_tick_ts(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&New_York)
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

fn tick_point(trade: &Trade) -> TickPoint {
    TickPoint {
        ts_event: format_tick_ts(trade.ts),
        price: trade.price,
        size: trade.size,
    }
}

fn series_min(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v))))
}

fn series_max(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InstrumentDefinition, ProviderError, ProviderFuture};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned-series provider keyed by dataset, recording every query.
    #[derive(Default)]
    struct FakeProvider {
        bars: HashMap<String, Vec<Bar>>,
        books: HashMap<String, Vec<BookUpdate>>,
        trades: HashMap<String, Vec<Trade>>,
        definitions: Vec<InstrumentDefinition>,
        fail: bool,
        queries: Mutex<Vec<DataQuery>>,
    }

    impl FakeProvider {
        fn record(&self, query: &DataQuery) -> Result<(), ProviderError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(ProviderError::Status {
                    status: 503,
                    message: "gateway unavailable".to_string(),
                });
            }
            Ok(())
        }

        fn recorded(&self) -> Vec<DataQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl MarketDataProvider for FakeProvider {
        fn ohlcv<'a>(
            &'a self,
            query: &'a DataQuery,
            _unit: IntervalUnit,
        ) -> ProviderFuture<'a, Vec<Bar>> {
            Box::pin(async move {
                self.record(query)?;
                Ok(self.bars.get(&query.dataset).cloned().unwrap_or_default())
            })
        }

        fn top_of_book<'a>(
            &'a self,
            query: &'a DataQuery,
            _consolidated: bool,
        ) -> ProviderFuture<'a, Vec<BookUpdate>> {
            Box::pin(async move {
                self.record(query)?;
                Ok(self.books.get(&query.dataset).cloned().unwrap_or_default())
            })
        }

        fn trades<'a>(&'a self, query: &'a DataQuery) -> ProviderFuture<'a, Vec<Trade>> {
            Box::pin(async move {
                self.record(query)?;
                Ok(self.trades.get(&query.dataset).cloned().unwrap_or_default())
            })
        }

        fn definitions<'a>(
            &'a self,
            query: &'a DataQuery,
        ) -> ProviderFuture<'a, Vec<InstrumentDefinition>> {
            Box::pin(async move {
                self.record(query)?;
                Ok(self.definitions.clone())
            })
        }
    }

    const EQUITY: &str = "XNAS.ITCH";
    const OPTIONS: &str = "OPRA.PILLAR";
    const OPTION_TICKER: &str = "AAPL  250117C00150000";

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, h, m, s).unwrap()
    }

    fn bar(at: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Bar {
        Bar {
            ts: at,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    fn trade_event(at: DateTime<Utc>, price: f64, size: u64) -> BookUpdate {
        BookUpdate {
            ts: at,
            action: EventAction::Trade,
            price: Some(price),
            size: Some(size),
            bid_px: None,
            bid_sz: None,
            ask_px: None,
            ask_sz: None,
        }
    }

    fn quote_event(
        at: DateTime<Utc>,
        bid: Option<(f64, u64)>,
        ask: Option<(f64, u64)>,
    ) -> BookUpdate {
        BookUpdate {
            ts: at,
            action: EventAction::Quote,
            price: None,
            size: None,
            bid_px: bid.map(|(p, _)| p),
            bid_sz: bid.map(|(_, s)| s),
            ask_px: ask.map(|(p, _)| p),
            ask_sz: ask.map(|(_, s)| s),
        }
    }

    // ------------------------------------------------------------------
    // Bar charts
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_equity_chart_formats_short_symbol_bars() {
        let mut provider = FakeProvider::default();
        provider.bars.insert(
            EQUITY.to_string(),
            vec![bar(ts(14, 30, 0), 150.5, 151.0, 150.25, 150.75, 1200)],
        );

        let req = ChartRequest {
            ticker: "aapl".to_string(),
            start_date: "2025-01-10 09:00".to_string(),
            end_date: "2025-01-10 16:00".to_string(),
            interval: "m".to_string(),
        };
        let chart = equity_chart(&provider, &Config::default(), &req).await.unwrap();

        assert_eq!(chart.open, vec!["150.500"]);
        assert_eq!(chart.high, vec!["151.000"]);
        assert_eq!(chart.low, vec!["150.250"]);
        assert_eq!(chart.close, vec!["150.750"]);
        assert_eq!(chart.volume, vec!["1200"]);
        // 14:30 UTC is 09:30 in New York in January.
        assert_eq!(chart.x, vec!["2025-01-10 09:30:00"]);

        let queries = provider.recorded();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].dataset, EQUITY);
        assert_eq!(queries[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_equity_chart_routes_long_symbols_and_aggregates() {
        let mut provider = FakeProvider::default();
        provider.bars.insert(
            OPTIONS.to_string(),
            vec![
                bar(ts(14, 30, 0), 10.0, 11.0, 9.0, 10.5, 100),
                bar(ts(14, 30, 0), 12.0, 13.0, 10.0, 11.5, 50),
            ],
        );

        let req = ChartRequest {
            ticker: OPTION_TICKER.to_string(),
            start_date: "2025-01-10".to_string(),
            end_date: "2025-01-11".to_string(),
            interval: "h".to_string(),
        };
        let chart = equity_chart(&provider, &Config::default(), &req).await.unwrap();

        // The duplicate pair collapses to one bar with averaged open/close.
        assert_eq!(chart.open, vec!["11.000"]);
        assert_eq!(chart.high, vec!["13.000"]);
        assert_eq!(chart.low, vec!["9.000"]);
        assert_eq!(chart.volume, vec!["150"]);
        assert_eq!(provider.recorded()[0].dataset, OPTIONS);
    }

    #[tokio::test]
    async fn test_equity_chart_daily_axis_is_date_only() {
        let mut provider = FakeProvider::default();
        provider.bars.insert(
            EQUITY.to_string(),
            vec![bar(ts(0, 0, 0), 1.0, 1.0, 1.0, 1.0, 1)],
        );

        let req = ChartRequest {
            ticker: "AAPL".to_string(),
            start_date: "2025-01-09".to_string(),
            end_date: "2025-01-12".to_string(),
            interval: "D".to_string(),
        };
        let chart = equity_chart(&provider, &Config::default(), &req).await.unwrap();
        assert_eq!(chart.x, vec!["2025-01-10"]);
    }

    #[tokio::test]
    async fn test_equity_chart_rejects_oversized_range_before_fetching() {
        let provider = FakeProvider::default();
        let req = ChartRequest {
            ticker: "AAPL".to_string(),
            start_date: "2025-01-01".to_string(),
            end_date: "2025-01-09".to_string(),
            interval: "m".to_string(),
        };

        let err = equity_chart(&provider, &Config::default(), &req).await.unwrap_err();
        assert!(matches!(err, ApiError::RangeTooLarge(_)));
        assert!(provider.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_option_bar_iv_field_wise() {
        let mut provider = FakeProvider::default();
        // ATM-ish call a week before expiration; all four fields converge.
        provider.bars.insert(
            OPTIONS.to_string(),
            vec![bar(ts(14, 30, 0), 2.0, 2.4, 1.8, 2.2, 10)],
        );
        provider.bars.insert(
            EQUITY.to_string(),
            vec![bar(ts(14, 30, 1), 150.0, 150.4, 149.8, 150.2, 1000)],
        );

        let req = ChartRequest {
            ticker: OPTION_TICKER.to_string(),
            start_date: "2025-01-10 09:00".to_string(),
            end_date: "2025-01-10 16:00".to_string(),
            interval: "m".to_string(),
        };
        let response = option_bar_iv(&provider, &Config::default(), &req).await.unwrap();

        assert_eq!(response.x, vec!["2025-01-10 09:30:00"]);
        assert_eq!(response.iv_open.len(), 1);
        for iv in [
            response.iv_open[0],
            response.iv_high[0],
            response.iv_low[0],
            response.iv_close[0],
        ] {
            assert!(iv > 0.0, "expected convergence, got {iv}");
        }

        let mean = (response.iv_open[0]
            + response.iv_high[0]
            + response.iv_low[0]
            + response.iv_close[0])
            / 4.0;
        assert!((response.iv_mid[0] - mean).abs() < 1e-12);
    }

    // ------------------------------------------------------------------
    // High-frequency quotes
    // ------------------------------------------------------------------

    fn hf_request(start: &str, end: &str) -> QuoteChartRequest {
        QuoteChartRequest {
            ticker: OPTION_TICKER.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
        }
    }

    #[tokio::test]
    async fn test_hf_quote_chart_splits_and_aligns() {
        let mut provider = FakeProvider::default();
        provider.books.insert(
            EQUITY.to_string(),
            vec![
                quote_event(ts(14, 30, 0), Some((149.9, 10)), Some((150.1, 12))),
                trade_event(ts(14, 30, 1), 150.0, 100),
                trade_event(ts(14, 32, 0), 150.2, 50),
            ],
        );
        provider.books.insert(
            OPTIONS.to_string(),
            vec![
                quote_event(ts(14, 30, 0), Some((1.95, 5)), Some((2.05, 7))),
                // Option prints never count as quotes.
                trade_event(ts(14, 30, 2), 2.0, 3),
                quote_event(ts(14, 31, 0), Some((1.98, 4)), None),
            ],
        );

        let response = hf_quote_chart(
            &provider,
            &Config::default(),
            &hf_request("2025-01-10 09:30", "2025-01-10 09:45"),
        )
        .await
        .unwrap();

        assert_eq!(response.global_data.underlying_ticker, "AAPL");
        assert_eq!(response.global_data.option_ticker, OPTION_TICKER);
        assert_eq!(response.global_data.strike_price, "150.000");
        assert_eq!(response.global_data.expiration_date, "2025-01-17 16:00:00");

        assert_eq!(response.option_bid.len(), 2);
        assert_eq!(response.option_ask.len(), 1);
        assert_eq!(response.underlying_bid.len(), 1);
        assert_eq!(response.underlying_trades.len(), 2);

        // The 09:30:02 option print aligns to the 09:30:01 underlying print.
        assert_eq!(response.option_trades.len(), 1);
        assert_eq!(response.option_trades[0].underlying_price, 150.0);
        assert!(response.option_trades[0].iv > 0.0);
        assert_eq!(response.option_iv.len(), 1);
        assert_eq!(response.option_iv[0].iv, response.option_trades[0].iv);
        assert_eq!(
            response.option_trades[0].ts_event,
            "2025-01-10 09:30:02.000000"
        );

        // Axis max is the top ask stretched by 10%.
        let settings = &response.opt_chart_settings;
        assert!((settings.chart_opt_price_max - 2.05 * 1.1).abs() < 1e-12);
        assert_eq!(settings.chart_iv_min, 0.0);
    }

    #[tokio::test]
    async fn test_hf_quote_chart_span_cap_boundary() {
        let provider = FakeProvider::default();
        let config = Config::default();

        // 31 minutes is over the cap and fetches nothing.
        let err = hf_quote_chart(
            &provider,
            &config,
            &hf_request("2025-01-10 09:30", "2025-01-10 10:01"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::RangeTooLarge(_)));
        assert!(provider.recorded().is_empty());

        // Exactly 30 minutes passes, even with nothing to chart.
        let response = hf_quote_chart(
            &provider,
            &config,
            &hf_request("2025-01-10 09:30", "2025-01-10 10:00"),
        )
        .await
        .unwrap();
        assert_eq!(response.opt_chart_settings.chart_opt_price_max, 1.0);
        assert_eq!(response.opt_chart_settings.chart_opt_price_min, None);
        assert!(response.option_trades.is_empty());
    }

    #[tokio::test]
    async fn test_hf_quote_non_convergent_iv_records_zero_and_continues() {
        let mut provider = FakeProvider::default();
        provider.books.insert(
            EQUITY.to_string(),
            vec![trade_event(ts(14, 30, 0), 200.0, 10)],
        );
        provider.books.insert(
            OPTIONS.to_string(),
            vec![
                // Far below intrinsic value for a 150 call on a 200 stock.
                trade_event(ts(14, 30, 1), 1.0, 1),
                // A believable print right after.
                trade_event(ts(14, 30, 2), 51.0, 1),
            ],
        );

        let response = hf_quote_chart(
            &provider,
            &Config::default(),
            &hf_request("2025-01-10 09:30", "2025-01-10 09:45"),
        )
        .await
        .unwrap();

        assert_eq!(response.option_trades.len(), 2);
        assert_eq!(response.option_trades[0].iv, 0.0);
        assert!(response.option_trades[1].iv > 0.0);
    }

    #[tokio::test]
    async fn test_hf_quote_chart_provider_failure_surfaces() {
        let provider = FakeProvider {
            fail: true,
            ..FakeProvider::default()
        };
        let err = hf_quote_chart(
            &provider,
            &Config::default(),
            &hf_request("2025-01-10 09:30", "2025-01-10 09:45"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Provider(_)));
    }

    // ------------------------------------------------------------------
    // Multi-contract IV
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_multi_iv_shares_one_underlying_fetch() {
        let mut provider = FakeProvider::default();
        provider.trades.insert(
            EQUITY.to_string(),
            vec![Trade {
                ts: ts(14, 30, 0),
                price: 150.0,
                size: 10,
            }],
        );
        provider.trades.insert(
            OPTIONS.to_string(),
            vec![Trade {
                ts: ts(14, 30, 1),
                price: 2.0,
                size: 1,
            }],
        );

        let req = MultiIvRequest {
            contracts: vec![
                OPTION_TICKER.to_string(),
                "AAPL  250117P00150000".to_string(),
            ],
            start_date: "2025-01-10".to_string(),
            end_date: "2025-01-12".to_string(),
        };
        let response = multi_iv(&provider, &Config::default(), &req).await.unwrap();

        assert_eq!(response.options.len(), 2);
        assert_eq!(response.options[0].contract, "2025-01-17 C 150.000");
        assert_eq!(response.options[1].contract, "2025-01-17 P 150.000");
        assert_eq!(response.underlying.len(), 1);
        assert_eq!(response.options[0].data.len(), 1);
        assert_eq!(response.options[0].data[0].underlying_price, 150.0);

        // One equity fetch, then one options fetch per contract.
        let equity_queries: Vec<_> = provider
            .recorded()
            .into_iter()
            .filter(|q| q.dataset == EQUITY)
            .collect();
        assert_eq!(equity_queries.len(), 1);
        assert_eq!(equity_queries[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn test_multi_iv_span_cap_boundary() {
        let provider = FakeProvider::default();
        let config = Config::default();

        let mut req = MultiIvRequest {
            contracts: vec![OPTION_TICKER.to_string()],
            start_date: "2025-01-06".to_string(),
            end_date: "2025-01-12".to_string(),
        };

        // Six days is over the cap.
        req.end_date = "2025-01-12".to_string();
        let err = multi_iv(&provider, &config, &req).await.unwrap_err();
        assert!(matches!(err, ApiError::RangeTooLarge(_)));

        // Five days passes.
        req.end_date = "2025-01-11".to_string();
        assert!(multi_iv(&provider, &config, &req).await.is_ok());
    }

    #[tokio::test]
    async fn test_multi_iv_rejects_empty_contract_list() {
        let provider = FakeProvider::default();
        let req = MultiIvRequest {
            contracts: Vec::new(),
            start_date: "2025-01-10".to_string(),
            end_date: "2025-01-11".to_string(),
        };
        let err = multi_iv(&provider, &Config::default(), &req).await.unwrap_err();
        assert!(matches!(err, ApiError::Format(_)));
    }

    // ------------------------------------------------------------------
    // Option solver
    // ------------------------------------------------------------------

    fn solver_request(solve_for: SolveFor) -> SolverRequest {
        SolverRequest {
            r: 0.04,
            vol: 0.25,
            s: 150.0,
            t: 30.0,
            option_type: "call".to_string(),
            u: 148.0,
            price: 3.0,
            solve_for,
            time_units: SolverTimeUnit::Days,
        }
    }

    #[test]
    fn test_solve_option_price_then_vol_round_trip() {
        let mut req = solver_request(SolveFor::Price);
        let priced = solve_option(&req).unwrap();
        let price = priced.price.unwrap();
        assert!(price > 0.0);
        assert!(priced.vol.is_none());

        // Feeding the price back recovers the volatility.
        req.solve_for = SolveFor::Vol;
        req.price = price;
        let solved = solve_option(&req).unwrap();
        assert!((solved.vol.unwrap() - 0.25).abs() < 2e-3);
    }

    #[test]
    fn test_solve_option_time_unit_conversion() {
        let mut days = solver_request(SolveFor::Price);
        let mut hours = solver_request(SolveFor::Price);
        hours.time_units = SolverTimeUnit::Hours;
        hours.t = 30.0 * 24.0;
        days.t = 30.0;

        let from_days = solve_option(&days).unwrap().price.unwrap();
        let from_hours = solve_option(&hours).unwrap().price.unwrap();
        assert_eq!(from_days, from_hours);
    }

    #[test]
    fn test_solve_option_for_time_returns_request_units() {
        let mut req = solver_request(SolveFor::Price);
        let price = solve_option(&req).unwrap().price.unwrap();

        req.solve_for = SolveFor::T;
        req.price = price;
        let solved = solve_option(&req).unwrap().t.unwrap();
        assert!((solved - 30.0).abs() < 0.5, "solved {solved} days");
    }

    #[test]
    fn test_solve_option_underlyings_and_strike() {
        let mut req = solver_request(SolveFor::Price);
        let price = solve_option(&req).unwrap().price.unwrap();
        req.price = price;

        req.solve_for = SolveFor::U;
        let u = solve_option(&req).unwrap().u.unwrap();
        assert!((u - 148.0).abs() < 0.01);

        req.solve_for = SolveFor::S;
        let s = solve_option(&req).unwrap().s.unwrap();
        assert!((s - 150.0).abs() < 0.01);
    }

    #[test]
    fn test_solve_option_no_solution() {
        // No positive rate in [-1, 1] reconciles a worthless deep OTM price
        // with a high premium.
        let mut req = solver_request(SolveFor::R);
        req.price = 1000.0;
        let err = solve_option(&req).unwrap_err();
        assert!(matches!(err, ApiError::NoSolution(_)));
    }

    #[test]
    fn test_solve_option_rejects_unknown_type() {
        let mut req = solver_request(SolveFor::Price);
        req.option_type = "straddle".to_string();
        let err = solve_option(&req).unwrap_err();
        assert!(matches!(err, ApiError::Format(_)));
    }

    // ------------------------------------------------------------------
    // Definitions & expiration status
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_option_definitions_window_and_mapping() {
        let provider = FakeProvider {
            definitions: vec![InstrumentDefinition {
                raw_symbol: OPTION_TICKER.to_string(),
                expiration: Utc.with_ymd_and_hms(2025, 1, 17, 21, 0, 0).unwrap(),
                strike: dec!(150.000),
                instrument_class: "C".to_string(),
            }],
            ..FakeProvider::default()
        };

        let query = DefinitionsQuery {
            start_date: "2025-01-10".to_string(),
            ticker: "aapl".to_string(),
        };
        let items = option_definitions(&provider, &Config::default(), &query)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].raw_symbol, OPTION_TICKER);
        assert_eq!(items[0].expiration, "2025-01-17");
        assert_eq!(items[0].strike_price, "150.000");
        assert_eq!(items[0].instrument_class, "C");

        let queries = provider.recorded();
        assert_eq!(queries[0].symbol, "AAPL.OPT");
        assert_eq!(queries[0].end - queries[0].start, Duration::days(1));
    }

    #[tokio::test]
    async fn test_option_definitions_bad_date_rejected() {
        let provider = FakeProvider::default();
        let query = DefinitionsQuery {
            start_date: "10-01-2025".to_string(),
            ticker: "AAPL".to_string(),
        };
        let err = option_definitions(&provider, &Config::default(), &query)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Format(_)));
    }

    #[tokio::test]
    async fn test_option_definitions_provider_failure_surfaces() {
        let provider = FakeProvider {
            fail: true,
            ..FakeProvider::default()
        };
        let query = DefinitionsQuery {
            start_date: "2025-01-10".to_string(),
            ticker: "AAPL".to_string(),
        };
        let err = option_definitions(&provider, &Config::default(), &query)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Provider(_)));
    }

    #[test]
    fn test_expiration_status_far_future_contract() {
        let query = ExpirationQuery {
            ticker: "AAPL  991231C00150000".to_string(),
        };
        let status = expiration_status(&query).unwrap();

        assert_eq!(status.option_type, "C");
        assert_eq!(status.strike_price, 150.0);
        assert!(status.days_remaining > 0.0);
        // Two-decimal rounding.
        let scaled = status.days_remaining * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }

    #[test]
    fn test_expiration_status_expired_contract_is_negative() {
        let query = ExpirationQuery {
            ticker: "AAPL  200117C00150000".to_string(),
        };
        let status = expiration_status(&query).unwrap();
        assert!(status.days_remaining < 0.0);
    }
}
