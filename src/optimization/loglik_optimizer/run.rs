//! Execution helper that runs an `argmin` solver on a [`DiffFunction`] and
//! returns a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        DiffFunction, Grad, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
    },
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run an `argmin` optimization for a differentiable objective.
///
/// This is the shared runner used by both line-search variants. It wires up
/// the objective via [`ArgMinAdapter`], the chosen solver, the starting
/// point `x0`, optional observers (behind the `obs_slog` feature) and the
/// optional iteration cap, then converts the final state into an
/// [`OptimOutcome`].
///
/// # Type Parameters
/// - `F`: the objective implementing [`DiffFunction`].
/// - `S`: any `argmin` solver whose problem is `ArgMinAdapter<'a, F>` and
///   whose `IterState` uses `Theta`, `Grad` and `f64`.
///
/// # Feature flags
/// If `obs_slog` is enabled and `opts.verbose == true`, a terminal slog
/// observer is attached with `ObserverMode::Always` and a one-time line
/// reports f(x₀) and ‖∇f(x₀)‖ before the first iteration.
///
/// # Errors
/// - Propagates `argmin` runtime errors (line-search failures, objective
///   errors) via `From<argmin::core::Error>`.
/// - Propagates validation errors raised while building [`OptimOutcome`].
pub fn run_lbfgs<'a, F, S>(
    x0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: DiffFunction,
    S: argmin::core::Solver<
            ArgMinAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&x0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(x0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    log::debug!(
        "L-BFGS finished after {} iterations: {:?}",
        result.get_iter(),
        result.get_termination_status()
    );
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    OptimOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(x0: &Theta, problem: &ArgMinAdapter<'_, F>) -> OptResult<()>
where
    F: DiffFunction,
{
    let f0 = problem.cost(x0)?;
    let g0n = problem.gradient(x0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: f(x0) = {:.6}{}",
        f0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
