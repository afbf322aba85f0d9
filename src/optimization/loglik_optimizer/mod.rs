//! loglik_optimizer — argmin-powered minimization of penalized
//! negative log-likelihoods.
//!
//! Purpose
//! -------
//! Provide the thin optimizer layer the trainer drives. Objectives implement
//! [`DiffFunction`] (and [`StochasticDiffFunction`] for mini-batch updates);
//! [`minimize`] runs L-BFGS with a configurable line search and
//! [`sgd::run_sgd`] runs plain mini-batch SGD. Both report an
//! [`OptimOutcome`].
//!
//! Key behaviors
//! -------------
//! - Bridge objectives into argmin's `CostFunction`/`Gradient` via
//!   [`adapter::ArgMinAdapter`] without sign changes.
//! - [`minimize`] validates the starting point with
//!   [`DiffFunction::check`], builds the solver via [`builders`] and runs
//!   it with [`run::run_lbfgs`].
//! - [`finite_diff`] offers numerical gradient checks built on
//!   `finitediff`.
//! - Configuration ([`Tolerances`], [`MLEOptions`], [`sgd::SgdOptions`]) is
//!   validated on construction; see [`validation`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives return the quantity to minimize and its gradient.
//! - Objectives report invalid inputs as [`OptError`] values, never panics;
//!   argmin carries them boxed and `From<argmin::core::Error>` restores
//!   them.
//!
//! Conventions
//! -----------
//! - Points are [`Theta`] (`Array1<f64>`), gradients [`Grad`].
//! - Errors bubble up as [`OptResult<T>`]; nothing here panics or uses
//!   `unsafe`.
//!
//! Testing notes
//! -------------
//! - Unit tests in each submodule: pass-through in [`adapter`], solver
//!   construction in [`builders`], convergence on quadratics in [`api`],
//!   gradient checks in [`finite_diff`], sampling and convergence in
//!   [`sgd`].
//! - The end-to-end training test under `tests/` drives both optimizers on
//!   a real objective.
//!
//! [`OptError`]: crate::optimization::errors::OptError
//! [`OptResult<T>`]: crate::optimization::errors::OptResult

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod sgd;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::sgd::{BatchSampler, SamplingMethod, SgdOptions, run_sgd};
pub use self::traits::{
    DiffFunction, LineSearcher, MLEOptions, OptimOutcome, StochasticDiffFunction, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::minimize;
    pub use super::sgd::{SgdOptions, run_sgd};
    pub use super::traits::{DiffFunction, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
