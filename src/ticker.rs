//! Fixed-width option ticker decoding.
//!
//! Listed option identifiers pack the contract description into fixed byte
//! positions: padded underlying symbol, expiration date, call/put flag, and
//! strike price, e.g. `AAPL  250117C00150000`.

use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// Minimum identifier width: symbol(6) + date(6) + flag(1) + strike(5 + 3).
const MIN_TICKER_LEN: usize = 21;

/// Seconds in a year of 365.25 days, used for time-to-expiry conversions.
pub const SECONDS_PER_YEAR: f64 = 3600.0 * 24.0 * 365.25;

/// Option contract side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractType {
    /// Call option.
    Call,
    /// Put option.
    Put,
}

impl ContractType {
    /// Parses a contract type from a request string.
    ///
    /// Accepts the single-letter flag or the full word, in any case
    /// (`c`, `C`, `call`, `p`, `PUT`, ...).
    pub fn parse(s: &str) -> Result<Self, ApiError> {
        match s.trim().to_lowercase().as_str() {
            "c" | "call" => Ok(ContractType::Call),
            "p" | "put" => Ok(ContractType::Put),
            other => Err(ApiError::Format(format!("unknown contract type '{other}'"))),
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractType::Call => write!(f, "C"),
            ContractType::Put => write!(f, "P"),
        }
    }
}

/// Decoded option contract identity.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionContractId {
    /// Full identifier, uppercased.
    pub raw: String,
    /// Underlying symbol with padding removed.
    pub underlying: String,
    /// Expiration instant: 16:00:00 America/New_York on the expiration date.
    pub expiration: DateTime<Tz>,
    /// Call or put.
    pub contract_type: ContractType,
    /// Strike price, exact to 0.001.
    pub strike: Decimal,
}

impl OptionContractId {
    /// Strike as an `f64` for the numeric routines.
    #[must_use]
    pub fn strike_f64(&self) -> f64 {
        self.strike.to_f64().unwrap_or(0.0)
    }

    /// Years from `from` until expiration, in 365.25-day years.
    ///
    /// Negative once the contract has expired.
    #[must_use]
    pub fn years_to_expiry(&self, from: DateTime<Utc>) -> f64 {
        let secs = self
            .expiration
            .with_timezone(&Utc)
            .signed_duration_since(from)
            .num_seconds();
        secs as f64 / SECONDS_PER_YEAR
    }
}

/// Decodes a fixed-width option ticker into its contract identity.
///
/// Field layout (byte offsets):
///
/// * `[0, 6)` underlying symbol, space padded
/// * `[6, 12)` expiration date as `yymmdd`
/// * `[12, 13)` contract flag, `C` or `P`
/// * `[13, 18)` whole-dollar strike
/// * `[18, ..)` strike thousandths
///
/// # Errors
///
/// Returns [`ApiError::Format`] when the input is too short, a numeric field
/// contains non-digits, the flag is not `C`/`P`, or the date is not a real
/// calendar date.
pub fn decode_option_ticker(raw: &str) -> Result<OptionContractId, ApiError> {
    let raw = raw.to_uppercase();
    if !raw.is_ascii() || raw.len() < MIN_TICKER_LEN {
        return Err(ApiError::Format(format!("invalid option ticker '{raw}'")));
    }

    let underlying = raw[..6].replace(' ', "");
    let year = 2000 + i32::try_from(parse_digits(&raw[6..8], "expiration year")?)
        .map_err(|_| ApiError::Format("invalid expiration year".to_string()))?;
    let month = parse_digits(&raw[8..10], "expiration month")?;
    let day = parse_digits(&raw[10..12], "expiration day")?;

    let contract_type = match &raw[12..13] {
        "C" => ContractType::Call,
        "P" => ContractType::Put,
        flag => {
            return Err(ApiError::Format(format!(
                "unknown contract flag '{flag}' in option ticker"
            )));
        }
    };

    let dollars = parse_digits(&raw[13..18], "strike dollars")?;
    let thousandths = parse_digits(&raw[18..], "strike thousandths")?;
    let strike = Decimal::new(i64::from(dollars) * 1000 + i64::from(thousandths), 3);

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        ApiError::Format(format!("invalid expiration date {year:04}-{month:02}-{day:02}"))
    })?;
    let expiration = market_close(date)?;

    Ok(OptionContractId {
        raw,
        underlying,
        expiration,
        contract_type,
        strike,
    })
}

/// Returns 16:00:00 America/New_York on `date` as a zoned instant.
fn market_close(date: NaiveDate) -> Result<DateTime<Tz>, ApiError> {
    let naive = date.and_hms_opt(16, 0, 0).ok_or_else(|| {
        ApiError::Format(format!("invalid expiration date {date}"))
    })?;
    // 16:00 never lands on a DST transition, but resolve ambiguity anyway.
    New_York
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ApiError::Format(format!("nonexistent local time {naive}")))
}

/// Parses a fixed-width all-digit field.
fn parse_digits(field: &str, what: &str) -> Result<u32, ApiError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::Format(format!(
            "non-numeric {what} in option ticker"
        )));
    }
    field
        .parse()
        .map_err(|_| ApiError::Format(format!("{what} out of range in option ticker")))
}
