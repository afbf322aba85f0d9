//! numerical_stability — overflow-safe reductions and dual numbers.
//!
//! Purpose
//! -------
//! Collect the small numerical kernels shared by the objective and the
//! priors so that both can assume well-conditioned `f64` arithmetic.
//!
//! Key behaviors
//! -------------
//! - Stable log-sum-exp and softmax (`transformations`), used for every
//!   class-probability computation in the crate, including model inference.
//! - The guarded `ln cosh` used by the cosh prior, with its linear cutoff.
//! - Forward-mode dual numbers (`dual`) and a dual log-sum-exp for exact
//!   Hessian-vector products of the likelihood.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are assumed finite unless stated; NaN propagates rather than
//!   being silently repaired, so callers can detect and report it.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against naïve formulas on safe inputs and against
//!   finite differences for the dual path.
pub mod dual;
pub mod transformations;

pub mod prelude {
    pub use super::dual::{Dual, log_sum_exp_dual};
    pub use super::transformations::{log_sum_exp, softmax_in_place};
}
