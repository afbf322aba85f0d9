//! Numerical stability utilities.
//!
//! Provides safe implementations of the nonlinear reductions used by the
//! conditional likelihood and the priors that overflow in naïve form.
//!
//! # Provided items
//! - [`log_sum_exp`]: `ln Σ exp(sᵢ)` with max-subtraction, finite for
//!   scores of any magnitude.
//! - [`softmax_in_place`]: normalized probabilities with the same guard.
//! - [`log_cosh`]: `ln cosh(n)` that switches to `n − ln 2` past
//!   [`COSH_LINEAR_CUTOFF`].
//! - [`sign`]: signum with `sign(0) = 0`.

/// Above this argument `ln cosh(n)` is replaced by its asymptote `n − ln 2`.
///
/// At `n = 30` the two differ by about `e^{-60}`, far below `f64` precision.
pub const COSH_LINEAR_CUTOFF: f64 = 30.0;

/// Numerically stable `ln Σ exp(sᵢ)`.
///
/// Subtracts the maximum before exponentiating, so scores up to `±1e308`
/// stay finite. An empty slice yields `-∞`; if any score is `+∞` the result
/// is `+∞`; NaN propagates.
pub fn log_sum_exp(scores: &[f64]) -> f64 {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return if scores.iter().any(|s| s.is_nan()) { f64::NAN } else { max };
    }
    let sum: f64 = scores.iter().map(|s| (s - max).exp()).sum();
    max + sum.ln()
}

/// Replace `scores` by `softmax(scores)` and return their log-sum-exp.
pub fn softmax_in_place(scores: &mut [f64]) -> f64 {
    let total = log_sum_exp(scores);
    for s in scores.iter_mut() {
        *s = (*s - total).exp();
    }
    total
}

/// `ln cosh(n)` for `n ≥ 0`, linear past [`COSH_LINEAR_CUTOFF`].
pub fn log_cosh(n: f64) -> f64 {
    if n > COSH_LINEAR_CUTOFF { n - std::f64::consts::LN_2 } else { n.cosh().ln() }
}

/// Signum with `sign(0) = 0` (unlike [`f64::signum`]).
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
