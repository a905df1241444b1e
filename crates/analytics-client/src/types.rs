//! Request and response types for the analytics API.

use serde::{Deserialize, Serialize};


/// Quantity the option solver endpoint solves for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveFor {
    /// Implied volatility.
    Vol,
    /// Option price.
    Price,
    /// Time to expiration.
    T,
    /// Strike price.
    S,
    /// Risk-free rate.
    R,
    /// Underlying price.
    U,
}

impl std::fmt::Display for SolveFor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vol => write!(f, "vol"),
            Self::Price => write!(f, "price"),
            Self::T => write!(f, "t"),
            Self::S => write!(f, "s"),
            Self::R => write!(f, "r"),
            Self::U => write!(f, "u"),
        }
    }
}

/// Units of the `t` field in solver requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverTimeUnit {
    /// Days.
    #[serde(rename = "d")]
    Days,
    /// Hours.
    #[serde(rename = "h")]
    Hours,
}

impl std::fmt::Display for SolverTimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Days => write!(f, "d"),
            Self::Hours => write!(f, "h"),
        }
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: i64,
}

// ============================================================================
// Bar Charts
// ============================================================================

/// Request for a bar chart over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRequest {
    /// Equity or option ticker.
    pub ticker: String,
    /// Range start, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`, America/New_York.
    pub start_date: String,
    /// Range end, same formats as `startDate`.
    pub end_date: String,
    /// Bar interval: `d`, `h`, `m`, or `s` (case-insensitive).
    pub interval: String,
}

/// OHLCV arrays for one instrument, parallel to the `x` axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDataResponse {
    /// Open prices, 3 decimal places.
    pub open: Vec<String>,
    /// High prices, 3 decimal places.
    pub high: Vec<String>,
    /// Low prices, 3 decimal places.
    pub low: Vec<String>,
    /// Close prices, 3 decimal places.
    pub close: Vec<String>,
    /// Traded volume, whole units.
    pub volume: Vec<String>,
    /// Bar timestamps.
    pub x: Vec<String>,
}

/// Per-bar implied volatility arrays, parallel to the `x` axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarIvResponse {
    /// Bar timestamps.
    pub x: Vec<String>,
    /// IV derived from bar opens.
    pub iv_open: Vec<f64>,
    /// IV derived from bar highs.
    pub iv_high: Vec<f64>,
    /// IV derived from bar lows.
    pub iv_low: Vec<f64>,
    /// IV derived from bar closes.
    pub iv_close: Vec<f64>,
    /// Mean of the four per-field IVs.
    pub iv_mid: Vec<f64>,
}

// ============================================================================
// High-Frequency Quotes
// ============================================================================

/// Request for the high-frequency option NBBO chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteChartRequest {
    /// Fixed-width option ticker.
    pub ticker: String,
    /// Range start, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`, America/New_York.
    pub start_date: String,
    /// Range end, hard-capped to 30 minutes after the start.
    pub end_date: String,
}

/// Solved axis bounds for the paired price/IV chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptChartSettings {
    /// Price axis bottom; `null` when no feasible bound exists.
    pub chart_opt_price_min: Option<f64>,
    /// Price axis top.
    pub chart_opt_price_max: f64,
    /// IV axis bottom.
    pub chart_iv_min: f64,
    /// IV axis top.
    pub chart_iv_max: f64,
    /// Ratio achieved by the solved bounds; `null` when infeasible.
    pub achieved_ratio: Option<f64>,
}

/// Contract-level fields shared by every series in a quote chart response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HfGlobalData {
    /// Expiration, `YYYY-MM-DD HH:MM:SS` America/New_York wall clock.
    pub expiration_date: String,
    /// Decoded underlying symbol.
    pub underlying_ticker: String,
    /// Uppercased option ticker.
    pub option_ticker: String,
    /// Strike price, 3 decimal places.
    pub strike_price: String,
}

/// One quote or trade observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickPoint {
    /// Event time, `YYYY-MM-DD HH:MM:SS.ffffff` America/New_York.
    pub ts_event: String,
    /// Price.
    pub price: f64,
    /// Size.
    pub size: u64,
}

/// One option trade with its aligned underlying price and derived IV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeIvPoint {
    /// Event time, `YYYY-MM-DD HH:MM:SS.ffffff` America/New_York.
    pub ts_event: String,
    /// Option trade price.
    pub price: f64,
    /// Option trade size.
    pub size: u64,
    /// Nearest underlying trade price.
    pub underlying_price: f64,
    /// Implied volatility; 0 when the solver did not converge.
    pub iv: f64,
}

/// One implied-volatility observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvPoint {
    /// Event time, `YYYY-MM-DD HH:MM:SS.ffffff` America/New_York.
    pub ts_event: String,
    /// Implied volatility; 0 when the solver did not converge.
    pub iv: f64,
}

/// Full high-frequency NBBO + IV payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HfQuoteResponse {
    /// Solved chart axis bounds.
    pub opt_chart_settings: OptChartSettings,
    /// Contract-level fields.
    pub global_data: HfGlobalData,
    /// Option best-bid updates.
    pub option_bid: Vec<TickPoint>,
    /// Option best-ask updates.
    pub option_ask: Vec<TickPoint>,
    /// Option trades with aligned underlying prices and IVs.
    pub option_trades: Vec<TradeIvPoint>,
    /// Underlying best-bid updates.
    pub underlying_bid: Vec<TickPoint>,
    /// Underlying best-ask updates.
    pub underlying_ask: Vec<TickPoint>,
    /// Underlying trades.
    pub underlying_trades: Vec<TickPoint>,
    /// IV series extracted from the aligned option trades.
    pub option_iv: Vec<IvPoint>,
}

// ============================================================================
// Multi-Contract IV
// ============================================================================

/// Request for trade-level IV across several contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiIvRequest {
    /// Fixed-width option tickers; all must share one underlying.
    pub contracts: Vec<String>,
    /// Range start, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`, America/New_York.
    pub start_date: String,
    /// Range end, hard-capped to 5 days after the start.
    pub end_date: String,
}

/// Aligned trade-IV series for one contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSeries {
    /// Display label: expiration date, type flag, strike.
    pub contract: String,
    /// Aligned option trades with IVs.
    pub data: Vec<TradeIvPoint>,
}

/// Multi-contract IV payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiIvResponse {
    /// One series per requested contract, in request order.
    pub options: Vec<ContractSeries>,
    /// Underlying trades over the same range.
    pub underlying: Vec<TickPoint>,
}

// ============================================================================
// Option Solver
// ============================================================================

/// Black-Scholes solver request. All six quantities are supplied; the one
/// named by `solveFor` is recomputed from the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverRequest {
    /// Annualized risk-free rate.
    pub r: f64,
    /// Volatility.
    pub vol: f64,
    /// Strike price.
    pub s: f64,
    /// Time to expiration, in `timeUnits`.
    pub t: f64,
    /// Contract type: `c`/`call` or `p`/`put`, case-insensitive.
    #[serde(rename = "type")]
    pub option_type: String,
    /// Underlying price.
    pub u: f64,
    /// Option price.
    pub price: f64,
    /// Quantity to solve for.
    pub solve_for: SolveFor,
    /// Units of `t`.
    pub time_units: SolverTimeUnit,
}

/// Solver result: a single field named after the solved quantity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolverResponse {
    /// Implied volatility, when solved for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vol: Option<f64>,
    /// Option price, when solved for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Time to expiration in the request's units, when solved for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
    /// Strike price, when solved for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<f64>,
    /// Risk-free rate, when solved for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,
    /// Underlying price, when solved for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub u: Option<f64>,
}

// ============================================================================
// Reference Data
// ============================================================================

/// Query parameters for the option definitions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsQuery {
    /// Listing day, `YYYY-MM-DD`; the query window is this day plus one day.
    pub start_date: String,
    /// Underlying symbol.
    pub ticker: String,
}

/// One listed option contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDefinitionItem {
    /// Fixed-width option ticker.
    pub raw_symbol: String,
    /// Expiration date, `YYYY-MM-DD`.
    pub expiration: String,
    /// Strike price, 3 decimal places.
    pub strike_price: String,
    /// Instrument class code, `C` or `P`.
    pub instrument_class: String,
}

/// Query parameters for the expiration status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationQuery {
    /// Fixed-width option ticker.
    pub ticker: String,
}

/// Decoded contract summary with time remaining.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpirationStatusResponse {
    /// Contract type flag, `C` or `P`.
    #[serde(rename = "type")]
    pub option_type: String,
    /// Strike price.
    pub strike_price: f64,
    /// Days until expiration, 2 decimal places; negative once expired.
    pub days_remaining: f64,
}
