//! Black-Scholes pricing and implied volatility.
//!
//! European pricing with a closed-form normal CDF approximation, plus
//! implied volatility recovered by root-finding over the pricing function.
//! Callers decide what a non-convergent volatility means; chart pipelines
//! record 0.0 and keep going.

use crate::solver::{self, SolverError};
use crate::ticker::ContractType;

/// Volatility search bracket for implied volatility.
pub const IV_BRACKET: (f64, f64) = (1e-9, 20.0);

/// The market price admits no Black-Scholes volatility inside the search
/// bracket (price outside arbitrage bounds, expired contract, or bad inputs).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("implied volatility did not converge: {0}")]
pub struct NonConvergent(#[from] SolverError);

/// Black-Scholes price of a European option.
///
/// # Arguments
///
/// * `s` - underlying price
/// * `k` - strike price
/// * `t` - time to expiry in years; at or past expiry returns intrinsic value
/// * `r` - annualized risk-free rate
/// * `sigma` - annualized volatility
#[must_use]
pub fn bs_price(contract_type: ContractType, s: f64, k: f64, t: f64, r: f64, sigma: f64) -> f64 {
    if t <= 0.0 {
        return intrinsic(contract_type, s, k);
    }

    let sqrt_t = t.sqrt();
    let d1 = ((s / k).ln() + (r + sigma * sigma / 2.0) * t) / (sigma * sqrt_t);
    let d2 = d1 - sigma * sqrt_t;
    let discount = (-r * t).exp();

    match contract_type {
        ContractType::Call => s * norm_cdf(d1) - k * discount * norm_cdf(d2),
        ContractType::Put => k * discount * norm_cdf(-d2) - s * norm_cdf(-d1),
    }
}

/// Recovers the volatility at which Black-Scholes reproduces `price`.
///
/// Solves `bs_price(sigma) = price` over [`IV_BRACKET`] with Brent's method.
///
/// # Errors
///
/// [`NonConvergent`] when no volatility in the bracket matches the price.
pub fn implied_volatility(
    price: f64,
    s: f64,
    k: f64,
    t: f64,
    r: f64,
    contract_type: ContractType,
) -> Result<f64, NonConvergent> {
    let objective = |sigma: f64| bs_price(contract_type, s, k, t, r, sigma) - price;
    let sigma = solver::brentq(
        objective,
        IV_BRACKET.0,
        IV_BRACKET.1,
        solver::XTOL,
        solver::MAX_ITER,
    )?;
    Ok(sigma)
}

/// Intrinsic value of an expired option.
fn intrinsic(contract_type: ContractType, s: f64, k: f64) -> f64 {
    match contract_type {
        ContractType::Call => (s - k).max(0.0),
        ContractType::Put => (k - s).max(0.0),
    }
}

/// Standard normal CDF approximation.
fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Error function approximation.
fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}
