//! Public API surface for minimizing a penalized negative log-likelihood.
//!
//! - [`DiffFunction`]: evaluation contract every objective implements.
//! - [`StochasticDiffFunction`]: the extra mini-batch update used by SGD.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for L-BFGS.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by [`minimize`] and
//!   [`run_sgd`].
//!
//! Convention: objectives return the *cost* directly (a penalized negative
//! log-likelihood) together with its gradient; no sign flips happen here.
//!
//! [`minimize`]: crate::optimization::loglik_optimizer::minimize
//! [`run_sgd`]: crate::optimization::loglik_optimizer::sgd::run_sgd
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        validation::{
            validate_dimension, validate_theta_hat, validate_value, verify_tol_cost,
            verify_tol_grad,
        },
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use ndarray::Array1;
use std::str::FromStr;

/// Differentiable objective `f: ℝⁿ → ℝ` evaluated jointly with its gradient.
///
/// Required:
/// - `dimension()`: length `n` of every point and gradient.
/// - `value_and_gradient(&x)`: `(f(x), ∇f(x))`. Implementations are expected
///   to cache the last evaluation, since the `argmin` bridge asks for the
///   cost and the gradient at the same point in separate calls.
///
/// Optional:
/// - `value` / `gradient`: projections of `value_and_gradient`.
/// - `initial_point()`: starting point; zeros by default.
/// - `check(&x)`: validation hook run once before optimization; by default
///   it checks the dimension and that every coordinate is finite.
pub trait DiffFunction {
    // Required methods
    fn dimension(&self) -> usize;
    fn value_and_gradient(&self, x: &Theta) -> OptResult<(Cost, Grad)>;

    // Optional methods
    fn value(&self, x: &Theta) -> OptResult<Cost> {
        Ok(self.value_and_gradient(x)?.0)
    }

    fn gradient(&self, x: &Theta) -> OptResult<Grad> {
        Ok(self.value_and_gradient(x)?.1)
    }

    fn initial_point(&self) -> OptResult<Theta> {
        Ok(Array1::zeros(self.dimension()))
    }

    fn check(&self, x: &Theta) -> OptResult<()> {
        validate_dimension(x.len(), self.dimension())?;
        for (index, &value) in x.iter().enumerate() {
            if !value.is_finite() {
                return Err(OptError::InvalidThetaHat {
                    index,
                    value,
                    reason: "Starting point must be finite.",
                });
            }
        }
        Ok(())
    }
}

/// Objectives that can take an in-place gradient step on a mini-batch.
pub trait StochasticDiffFunction: DiffFunction {
    /// Number of examples batches are drawn from.
    fn data_len(&self) -> usize;

    /// `x -= gain · ∇f_batch(x)`; returns the batch value at the old `x`.
    fn stochastic_update(&self, x: &mut Theta, batch: &[usize], gain: f64) -> OptResult<Cost>;
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Variants:
/// - `MoreThuente`: More–Thuente line search.
/// - `HagerZhang`: Hager–Zhang line search.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    /// Parse a line-search choice from a string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// L-BFGS configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `verbose: bool` — if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints the starting objective.
/// - `lbfgs_mem: Option<usize>` — history size; `None` uses
///   [`DEFAULT_LBFGS_MEM`](crate::optimization::loglik_optimizer::DEFAULT_LBFGS_MEM).
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = None`, `max_iter = 300`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// Numeric tolerances are validated by [`Tolerances::new`]; this checks
    /// only the L-BFGS memory.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(300) },
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for non-finite or non-positive tolerances.
    /// - `OptError::InvalidMaxIter` if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by the optimizers.
///
/// - `x_hat`: best point found.
/// - `value`: objective (cost) at `x_hat`.
/// - `converged`: `true` if the solver stopped on a convergence criterion
///   (gradient/cost tolerance or target cost), `false` on iteration limits
///   or interrupts.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations (SGD: epochs).
/// - `fn_evals`: evaluation counters (argmin's `cost_count`,
///   `gradient_count`, …; SGD reports `batch_update_count`).
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub x_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `x_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` (finite).
    /// - Maps `TerminationStatus` into `(converged, status)`.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `x_hat` or `value`.
    pub fn new(
        x_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let x_hat = validate_theta_hat(x_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match &termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, format!("{reason:?}"))
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { x_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `LineSearcher` parsing, `Tolerances` and `MLEOptions` validation.
    // - `OptimOutcome::new` status mapping and validation.
    // - Default `DiffFunction::check` behavior.
    // -------------------------------------------------------------------------

    struct Bowl;

    impl DiffFunction for Bowl {
        fn dimension(&self) -> usize {
            2
        }

        fn value_and_gradient(&self, x: &Theta) -> OptResult<(Cost, Grad)> {
            Ok((x.dot(x), x * 2.0))
        }
    }

    #[test]
    // Purpose
    // -------
    // Line-search names parse case-insensitively; unknown names error.
    fn line_searcher_parses_case_insensitively() {
        assert_eq!("HAGERZHANG".parse::<LineSearcher>().unwrap(), LineSearcher::HagerZhang);
        assert_eq!("moreThuente".parse::<LineSearcher>().unwrap(), LineSearcher::MoreThuente);
        assert!(matches!(
            "backtracking".parse::<LineSearcher>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Tolerances reject the all-`None` configuration and invalid values.
    fn tolerances_validate_inputs() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, Some(f64::INFINITY), None),
            Err(OptError::InvalidTolCost { .. })
        ));
        assert!(matches!(Tolerances::new(None, None, Some(0)), Err(OptError::InvalidMaxIter { .. })));
        let tols = Tolerances::new(Some(1e-6), None, Some(300)).unwrap();
        assert_eq!(MLEOptions::default().tols, tols);
    }

    #[test]
    fn mle_options_reject_zero_memory() {
        let tols = Tolerances::new(None, None, Some(10)).unwrap();
        assert!(matches!(
            MLEOptions::new(tols, LineSearcher::MoreThuente, false, Some(0)),
            Err(OptError::InvalidLBFGSMem { mem: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Convergence is only reported for convergence-type terminations.
    //
    // Given
    // -----
    // - The same state terminated by SolverConverged and by MaxItersReached.
    //
    // Expect
    // ------
    // - converged = true then false; gradient norm = 5 for g = [3, 4].
    fn outcome_maps_termination_reasons() {
        // Arrange
        let x = Some(array![1.0, 2.0]);
        let grad = Some(array![3.0, 4.0]);

        // Act
        let done = OptimOutcome::new(
            x.clone(),
            0.5,
            TerminationStatus::Terminated(TerminationReason::SolverConverged),
            12,
            FnEvalMap::new(),
            grad.clone(),
        )
        .unwrap();
        let capped = OptimOutcome::new(
            x,
            0.5,
            TerminationStatus::Terminated(TerminationReason::MaxItersReached),
            300,
            FnEvalMap::new(),
            grad,
        )
        .unwrap();

        // Assert
        assert!(done.converged);
        assert!(!capped.converged);
        assert_eq!(done.grad_norm, Some(5.0));
        assert_eq!(capped.iterations, 300);
    }

    #[test]
    // Purpose
    // -------
    // Missing or non-finite estimates are rejected.
    fn outcome_rejects_missing_or_nonfinite_estimates() {
        let status = TerminationStatus::NotTerminated;
        assert_eq!(
            OptimOutcome::new(None, 0.0, status.clone(), 0, FnEvalMap::new(), None),
            Err(OptError::MissingThetaHat)
        );
        assert!(matches!(
            OptimOutcome::new(Some(array![f64::NAN]), 0.0, status, 0, FnEvalMap::new(), None),
            Err(OptError::InvalidThetaHat { index: 0, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The default `check` enforces dimension and finiteness; default
    // projections agree with `value_and_gradient`.
    fn default_check_and_projections() {
        let f = Bowl;
        assert!(f.check(&array![0.0, 1.0]).is_ok());
        assert_eq!(
            f.check(&array![0.0]),
            Err(OptError::DimensionMismatch { expected: 2, found: 1 })
        );
        assert!(f.check(&array![0.0, f64::NAN]).is_err());
        assert_eq!(f.value(&array![1.0, 2.0]).unwrap(), 5.0);
        assert_eq!(f.gradient(&array![1.0, 2.0]).unwrap(), array![2.0, 4.0]);
        assert_eq!(f.initial_point().unwrap(), array![0.0, 0.0]);
    }
}
