//! High-level entry point for minimizing a [`DiffFunction`].
//!
//! This selects an L-BFGS solver with either Hager–Zhang or More–Thuente line
//! search, wraps the objective in an `ArgMinAdapter`, and delegates the run to
//! `run_lbfgs`.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{DiffFunction, LineSearcher, MLEOptions},
    },
};

/// Minimize `f` with L-BFGS starting from `x0`.
///
/// # Behavior
/// - Validates the starting point via `f.check(&x0)`.
/// - Builds an L-BFGS solver with the line search named by
///   `opts.line_searcher` and the history size `opts.lbfgs_mem`.
/// - Calls `run_lbfgs`, which configures the executor and returns an
///   [`OptimOutcome`] whose `value` is `f(x̂)`.
///
/// # Errors
/// - Propagates any error from `f.check`.
/// - Propagates builder errors from `build_optimizer_*`.
/// - Propagates runtime errors from `run_lbfgs` (line-search failures,
///   errors raised by the objective).
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use rust_maxent::optimization::errors::OptResult;
/// use rust_maxent::optimization::loglik_optimizer::{
///     minimize, Cost, DiffFunction, Grad, MLEOptions, Theta,
/// };
///
/// struct Bowl;
/// impl DiffFunction for Bowl {
///     fn dimension(&self) -> usize {
///         3
///     }
///     fn value_and_gradient(&self, x: &Theta) -> OptResult<(Cost, Grad)> {
///         Ok((x.dot(x), x * 2.0))
///     }
/// }
///
/// let out = minimize(&Bowl, array![0.1, -0.2, 0.3], &MLEOptions::default())?;
/// println!("x̂ = {:?}", out.x_hat);
/// # Ok::<(), rust_maxent::optimization::errors::OptError>(())
/// ```
pub fn minimize<F: DiffFunction>(f: &F, x0: Theta, opts: &MLEOptions) -> OptResult<OptimOutcome> {
    f.check(&x0)?;
    let problem = ArgMinAdapter::new(f);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(x0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(x0, opts, problem, solver)
        }
    }
}
