//! loglik_optimizer::finite_diff — numerical gradient checks.
//!
//! Purpose
//! -------
//! Approximate `∇f` by finite differences of [`DiffFunction::value`] and
//! compare it with the analytic gradient. The trainer runs this as an
//! opt-in derivative check before optimizing; the objective and prior
//! tests lean on it too.
//!
//! Key behaviors
//! -------------
//! - [`fd_gradient`] takes central differences, retrying with forward
//!   differences when the central result fails validation.
//! - Errors raised by the objective inside the difference closure are
//!   captured in a `RefCell` and returned after the sweep.
//! - [`gradient_discrepancy`] reports the largest absolute coordinate
//!   difference between the analytic and numerical gradients.
//!
//! Invariants & assumptions
//! ------------------------
//! - `f` must be smooth around `x`; the prior terms with kinks (Huber at
//!   `|x| = ε`) give meaningless discrepancies exactly at the kink.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta, traits::DiffFunction, validation::validate_grad},
};
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Finite-difference gradient of `f` at `x`.
///
/// # Errors
/// - The first error raised by `f.value` during the sweep.
/// - `GradientDimMismatch` / `InvalidGradient` if neither the central nor
///   the forward result is a finite vector of the right length.
pub fn fd_gradient<F: DiffFunction>(f: &F, x: &Theta) -> OptResult<Grad> {
    let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
    let value = |point: &Theta| -> f64 {
        match f.value(point) {
            Ok(v) => v,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let central = x.central_diff(&value);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    if validate_grad(&central, x.len()).is_ok() {
        return Ok(central);
    }
    let forward = x.forward_diff(&value);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&forward, x.len())?;
    Ok(forward)
}

/// `max_i |∇f(x)_i − fd(x)_i|`.
pub fn gradient_discrepancy<F: DiffFunction>(f: &F, x: &Theta) -> OptResult<f64> {
    let analytic = f.gradient(x)?;
    let numeric = fd_gradient(f, x)?;
    validate_grad(&analytic, numeric.len())?;
    Ok(analytic.iter().zip(numeric.iter()).map(|(a, n)| (a - n).abs()).fold(0.0, f64::max))
}
