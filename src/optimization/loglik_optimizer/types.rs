//! loglik_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and solver aliases used by the optimizer so
//! that the objective, the L-BFGS runner and the SGD loop agree on shapes
//! without naming `ndarray` or argmin generics directly.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for points, gradients and scalar costs
//!   (`Theta`, `Grad`, `Cost`).
//! - Provide the map type used for evaluation counters (`FnEvalMap`).
//! - Expose pre-wired L-BFGS solver aliases for both line searches.
//!
//! Invariants & assumptions
//! ------------------------
//! - All vectors are `ndarray::Array1<f64>` of the objective's dimension.
//! - `Cost` is the minimized quantity (a penalized negative
//!   log-likelihood); nothing in the optimizer flips its sign.
//!
//! Testing notes
//! -------------
//! - Type aliases only; exercised by the surrounding optimizer tests.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Point `x` in the flattened weight space.
pub type Theta = Array1<f64>;

/// Gradient `∇f(x)`, same shape as [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value used by the optimizer.
///
/// For classifier training this is `−Σ log p(gold | x) + prior(x)`.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`, `"batch_update_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Hager–Zhang line search specialized to this crate’s numeric types.
pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
