//! Scalar root-finding and bounded minimization.
//!
//! Numeric kernels shared by the chart scaler and the volatility model:
//! Brent's method for bracketed roots and a golden-section search for
//! bounded one-dimensional minimization.

/// Default absolute tolerance for root-finding.
pub const XTOL: f64 = 2e-12;

/// Default absolute tolerance for bounded minimization.
pub const MIN_XTOL: f64 = 1e-5;

/// Default iteration cap for both solvers.
pub const MAX_ITER: usize = 100;

/// Root-finding failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// The objective has no sign change over the bracket (or is not finite
    /// at its endpoints).
    #[error("no sign change over [{a}, {b}]")]
    InvalidBracket {
        /// Lower bracket endpoint.
        a: f64,
        /// Upper bracket endpoint.
        b: f64,
    },

    /// The iteration cap was reached before the tolerance was met.
    #[error("no convergence after {0} iterations")]
    MaxIterations(usize),
}

/// Finds a root of `f` over `[a, b]` with Brent's method.
///
/// Combines bisection with secant and inverse quadratic interpolation steps,
/// so it is as robust as bisection with superlinear convergence near the
/// root. Requires `f(a)` and `f(b)` to have opposite signs.
pub fn brentq<F>(f: F, a: f64, b: f64, xtol: f64, max_iter: usize) -> Result<f64, SolverError>
where
    F: Fn(f64) -> f64,
{
    let mut a = a;
    let mut b = b;
    let mut fa = f(a);
    let mut fb = f(b);

    if !fa.is_finite() || !fb.is_finite() || (fa > 0.0) == (fb > 0.0) {
        if fa == 0.0 {
            return Ok(a);
        }
        if fb == 0.0 {
            return Ok(b);
        }
        return Err(SolverError::InvalidBracket { a, b });
    }

    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = b - a;

    for _ in 0..max_iter {
        if (fb > 0.0) == (fc > 0.0) {
            // Root is bracketed by a and b; move the contrapoint.
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }

        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * xtol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }

        if e.abs() >= tol && fa.abs() > fb.abs() {
            // Try an interpolation step.
            let s = fb / fa;
            let (mut p, mut q);
            if a == c {
                // Secant.
                p = 2.0 * xm * s;
                q = 1.0 - s;
            } else {
                // Inverse quadratic.
                let r0 = fa / fc;
                let r1 = fb / fc;
                p = s * (2.0 * xm * r0 * (r0 - r1) - (b - a) * (r1 - 1.0));
                q = (r0 - 1.0) * (r1 - 1.0) * (s - 1.0);
            }
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();

            let min1 = 3.0 * xm * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            // Interpolation is not trustworthy; bisect.
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        if d.abs() > tol {
            b += d;
        } else {
            b += if xm > 0.0 { tol } else { -tol };
        }
        fb = f(b);
    }

    Err(SolverError::MaxIterations(max_iter))
}

/// Minimizes `f` over `[a, b]` with a golden-section search.
///
/// Returns the best point actually evaluated, shrinking the bracket until it
/// is narrower than `xtol` or the iteration cap is hit. Returning an
/// evaluated point matters for objectives with penalty regions: the result
/// is guaranteed to sit where the objective was lowest, never on the penalty
/// side of a boundary. A non-finite objective only steers the search, it
/// never aborts it.
#[must_use]
pub fn minimize_scalar_bounded<F>(f: F, a: f64, b: f64, xtol: f64, max_iter: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    // 1/phi, the golden section ratio.
    const INVPHI: f64 = 0.618_033_988_749_894_9;

    let mut lo = a;
    let mut hi = b;
    let mut x1 = hi - INVPHI * (hi - lo);
    let mut x2 = lo + INVPHI * (hi - lo);
    let mut f1 = f(x1);
    let mut f2 = f(x2);

    let mut best_x = x1;
    let mut best_f = f1;
    if f2 < best_f || best_f.is_nan() {
        best_x = x2;
        best_f = f2;
    }

    for _ in 0..max_iter {
        if (hi - lo).abs() <= xtol {
            break;
        }
        let (x_new, f_new) = if f1 < f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INVPHI * (hi - lo);
            f1 = f(x1);
            (x1, f1)
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INVPHI * (hi - lo);
            f2 = f(x2);
            (x2, f2)
        };
        if f_new < best_f || best_f.is_nan() {
            best_x = x_new;
            best_f = f_new;
        }
    }

    best_x
}
