//! Validation helpers for the optimizers.
//!
//! Common consistency checks shared by L-BFGS, SGD and the objectives:
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`] ensure
//!   numeric tolerances are finite and strictly positive when provided.
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Estimates**: [`validate_theta_hat`] ensures a final point exists and
//!   contains only finite values.
//! - **Objective values**: [`validate_value`] checks costs for finiteness.
//! - **Shapes**: [`validate_dimension`] compares a vector length with the
//!   objective's dimension.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta},
};

/// `None`, or a finite and strictly positive gradient-norm tolerance.
///
/// # Errors
/// [`OptError::InvalidTolGrad`] naming the violated rule.
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    check_tolerance(tol).map_err(|(tol, reason)| OptError::InvalidTolGrad { tol, reason })
}

/// `None`, or a finite and strictly positive cost-change tolerance.
///
/// # Errors
/// [`OptError::InvalidTolCost`] naming the violated rule.
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    check_tolerance(tol).map_err(|(tol, reason)| OptError::InvalidTolCost { tol, reason })
}

fn check_tolerance(tol: Option<f64>) -> Result<(), (f64, &'static str)> {
    match tol {
        Some(t) if !t.is_finite() => Err((t, "Tolerance must be finite.")),
        Some(t) if t <= 0.0 => Err((t, "Tolerance must be positive.")),
        _ => Ok(()),
    }
}

/// Gradient of length `dim` with only finite entries.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    match grad.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(OptError::InvalidGradient {
            index,
            value,
            reason: "Gradient elements must be finite.",
        }),
        None => Ok(()),
    }
}

/// Unwrap the solver's final point, rejecting a missing or non-finite one.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if the solver reported no point.
/// - [`OptError::InvalidThetaHat`] at the first non-finite weight.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let theta = theta_hat.ok_or(OptError::MissingThetaHat)?;
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaHat {
            index,
            value,
            reason: "Fitted weights must be finite.",
        });
    }
    Ok(theta)
}

/// # Errors
/// [`OptError::NonFiniteCost`] for `NaN` or `±∞`.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Check that a point or direction has the objective's dimension.
///
/// # Errors
/// Returns [`OptError::DimensionMismatch`] when `found != expected`.
pub fn validate_dimension(found: usize, expected: usize) -> OptResult<()> {
    if found != expected {
        return Err(OptError::DimensionMismatch { expected, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Gradient validation reports the first offending entry.
    fn validate_grad_reports_first_nonfinite_entry() {
        let g = array![0.0, f64::INFINITY, f64::NAN];
        match validate_grad(&g, 3) {
            Err(OptError::InvalidGradient { index, .. }) => assert_eq!(index, 1),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            validate_grad(&g, 2),
            Err(OptError::GradientDimMismatch { expected: 2, found: 3 })
        );
    }

    #[test]
    fn tolerances_and_values() {
        assert!(verify_tol_grad(None).is_ok());
        assert!(verify_tol_grad(Some(0.0)).is_err());
        assert!(verify_tol_cost(Some(f64::NAN)).is_err());
        assert!(validate_value(-3.0).is_ok());
        assert_eq!(
            validate_value(f64::NEG_INFINITY),
            Err(OptError::NonFiniteCost { value: f64::NEG_INFINITY })
        );
        assert!(validate_dimension(4, 4).is_ok());
        assert!(validate_dimension(3, 4).is_err());
    }
}
