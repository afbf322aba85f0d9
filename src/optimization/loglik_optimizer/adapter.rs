//! Adapter that exposes a [`DiffFunction`] as an `argmin` problem.
//!
//! The objective already returns the quantity to minimize, so the adapter
//! only forwards calls and rejects non-finite costs and gradients before
//! they reach the line search.
use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        traits::DiffFunction,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges a [`DiffFunction`] to `argmin`'s `CostFunction` and `Gradient`.
///
/// L-BFGS asks for the cost and then the gradient at the same point; the
/// objective's evaluation cache turns the second call into a lookup.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: DiffFunction> {
    pub f: &'a F,
}

impl<'a, F: DiffFunction> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F) -> Self {
        Self { f }
    }
}

impl<'a, F: DiffFunction> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `f(x)`.
    ///
    /// # Errors
    /// - Propagates any `OptError` from the objective (boxed into argmin's
    ///   error type and recovered on the way out).
    /// - `NonFiniteCost` if the value is NaN or infinite.
    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(x)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, F: DiffFunction> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate `∇f(x)`, validating its dimension and finiteness.
    fn gradient(&self, x: &Self::Param) -> Result<Self::Gradient, Error> {
        let g = self.f.gradient(x)?;
        validate_grad(&g, self.f.dimension())?;
        Ok(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Pass-through of cost and gradient (no sign change).
    // - Rejection of non-finite values and gradients.
    // - Recovery of the objective's own error after boxing by argmin.
    // -------------------------------------------------------------------------

    struct Shifted {
        shift: f64,
    }

    impl DiffFunction for Shifted {
        fn dimension(&self) -> usize {
            2
        }

        fn value_and_gradient(&self, x: &Theta) -> OptResult<(Cost, Grad)> {
            if x[0] < -100.0 {
                return Err(OptError::NumericalInstability { example: 7, reason: "test" });
            }
            let d = x.mapv(|v| v - self.shift);
            Ok((d.dot(&d), d * 2.0))
        }
    }

    #[test]
    // Purpose
    // -------
    // The adapter forwards f and ∇f unchanged.
    //
    // Given
    // -----
    // - f(x) = ‖x − 1‖² at x = [0, 3].
    //
    // Expect
    // ------
    // - cost = 5 and gradient = [−2, 4].
    fn adapter_forwards_cost_and_gradient() {
        // Arrange
        let f = Shifted { shift: 1.0 };
        let adapter = ArgMinAdapter::new(&f);
        let x = array![0.0, 3.0];

        // Act
        let cost = adapter.cost(&x).unwrap();
        let grad = adapter.gradient(&x).unwrap();

        // Assert
        assert_eq!(cost, 5.0);
        assert_eq!(grad, array![-2.0, 4.0]);
    }

    #[test]
    fn adapter_rejects_nonfinite_cost() {
        let f = Shifted { shift: f64::INFINITY };
        let adapter = ArgMinAdapter::new(&f);
        let err: OptError = adapter.cost(&array![0.0, 0.0]).unwrap_err().into();
        assert!(matches!(err, OptError::NonFiniteCost { .. }));
        let err: OptError = adapter.gradient(&array![0.0, 0.0]).unwrap_err().into();
        assert!(matches!(err, OptError::InvalidGradient { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Objective errors survive the round trip through `argmin::core::Error`.
    fn adapter_preserves_objective_errors() {
        let f = Shifted { shift: 0.0 };
        let adapter = ArgMinAdapter::new(&f);
        let err: OptError = adapter.cost(&array![-200.0, 0.0]).unwrap_err().into();
        assert_eq!(err, OptError::NumericalInstability { example: 7, reason: "test" });
    }
}
