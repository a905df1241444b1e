//! Chart axis scaling.
//!
//! The dashboard overlays an option price axis and an IV axis on one chart
//! and wants them visually pinned at an anchor point: the fraction of the
//! price axis above the anchor should hit a target ratio. Solving for the IV
//! axis maximum is a one-dimensional root-find with a feasibility region;
//! outside it the solve degrades to bounded minimization and the result is
//! always best-effort, never an error.

use crate::solver;

/// Default target for the share of the price axis above the anchor.
pub const DEFAULT_TARGET_RATIO: f64 = 0.75;

/// Search bracket for the IV axis maximum.
const Y_MAX_BRACKET: (f64, f64) = (1e-6, 20.0);

/// Objective value standing in for infeasible candidates.
const INFEASIBLE_PENALTY: f64 = 1e6;

/// Tolerance for the fallback minimization.
const FALLBACK_XTOL: f64 = 1e-9;

/// Axis bounds produced by a scaling solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    /// Price axis minimum. `None` when even the best candidate was
    /// infeasible.
    pub price_min: Option<f64>,
    /// Price axis maximum (the solve input, passed through).
    pub price_max: f64,
    /// IV axis minimum (the solve input, passed through).
    pub iv_min: f64,
    /// Solved IV axis maximum.
    pub iv_max: f64,
    /// Ratio actually achieved at `iv_max`. `None` when infeasible.
    pub achieved_ratio: Option<f64>,
}

/// One scaling problem: anchor coordinates plus the fixed axis extremes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartScaler {
    /// Anchor on the price axis (the observed price minimum).
    pub x_anchor: f64,
    /// Anchor on the IV axis (the observed IV maximum).
    pub y_anchor: f64,
    /// Price axis maximum.
    pub x_max: f64,
    /// IV axis minimum.
    pub y_min: f64,
}

impl ChartScaler {
    /// Builds a scaling problem.
    #[must_use]
    pub fn new(x_anchor: f64, y_anchor: f64, x_max: f64, y_min: f64) -> Self {
        Self {
            x_anchor,
            y_anchor,
            x_max,
            y_min,
        }
    }

    /// Solves for the IV axis maximum that puts the anchor at `target`.
    ///
    /// Tries a bracketed root-find of `ratio(y_max) = target` first; when the
    /// bracket has no sign change (the common case, since tiny `y_max`
    /// candidates are infeasible), falls back to minimizing the squared
    /// residual over the same bracket.
    #[must_use]
    pub fn solve(&self, target: f64) -> ChartBounds {
        let objective = |y_max: f64| match self.ratio_at(y_max).0 {
            Some(ratio) => ratio - target,
            None => INFEASIBLE_PENALTY,
        };

        let y_max = match solver::brentq(
            objective,
            Y_MAX_BRACKET.0,
            Y_MAX_BRACKET.1,
            solver::XTOL,
            solver::MAX_ITER,
        ) {
            Ok(root) => root,
            Err(_) => solver::minimize_scalar_bounded(
                |y| objective(y).powi(2),
                Y_MAX_BRACKET.0,
                Y_MAX_BRACKET.1,
                FALLBACK_XTOL,
                200,
            ),
        };

        let (achieved_ratio, min_x) = self.ratio_at(y_max);
        ChartBounds {
            price_min: if achieved_ratio.is_some() { min_x } else { None },
            price_max: self.x_max,
            iv_min: self.y_min,
            iv_max: y_max,
            achieved_ratio,
        }
    }

    /// Ratio and implied price minimum for a candidate IV axis maximum.
    ///
    /// The ratio is `None` when the implied minimum falls outside
    /// `(0, x_anchor)`; the raw minimum is still reported when it exists.
    fn ratio_at(&self, y_max: f64) -> (Option<f64>, Option<f64>) {
        if y_max <= self.y_min {
            return (None, None);
        }
        let min_x =
            self.x_anchor - self.x_max * (self.y_anchor - self.y_min) / (y_max - self.y_min);
        if min_x <= 0.0 || min_x >= self.x_anchor {
            return (None, Some(min_x));
        }
        let ratio = (self.x_max - self.x_anchor) / (self.x_max - min_x);
        (Some(ratio), Some(min_x))
    }
}
