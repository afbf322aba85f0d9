//! optimization — objective, priors, numerical kernels and optimizer wiring.
//!
//! Purpose
//! -------
//! Everything needed to turn an encoded dataset into fitted weights: the
//! regularized conditional-likelihood objective, the priors it adds, the
//! overflow-safe kernels both rely on, and the argmin/SGD drivers that
//! minimize it. One error surface (`errors::OptError`) covers the layer.
//!
//! Key behaviors
//! -------------
//! - `objective`: [`objective::ConditionalLikelihood`] over the flattened
//!   `numFeatures × numClasses` weight vector, with full, mini-batch,
//!   stochastic-update and Hessian-vector evaluations.
//! - `prior`: the regularization penalties and their gradients.
//! - `loglik_optimizer`: the [`loglik_optimizer::DiffFunction`] contract,
//!   L-BFGS via argmin and mini-batch SGD.
//! - `numerical_stability`: log-sum-exp, softmax, log-cosh and dual numbers.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective borrows its dataset immutably for its whole lifetime.
//! - Invalid inputs and numerical breakdowns are reported as `OptError`,
//!   never panics.
//!
//! Conventions
//! -----------
//! - Flattened index of weight `(feature f, class c)` is
//!   `f * numClasses + c`.
//! - Objectives are minimized; values are penalized negative
//!   log-likelihoods.
//! - The numerical modules do no I/O and no logging; the drivers emit
//!   `log::debug!` records only.
//!
//! Testing notes
//! -------------
//! - Each submodule carries its own unit tests; gradients of both the
//!   objective and every prior are checked against `finitediff`.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;
pub mod objective;
pub mod prior;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
    pub use super::objective::{ConditionalLikelihood, InitialPoint, ObjectiveMode};
    pub use super::prior::{Prior, PriorKind};
}
