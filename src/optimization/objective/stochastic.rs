//! Mini-batch evaluation, the in-place stochastic update, and
//! Hessian-vector products of [`ConditionalLikelihood`].
//!
//! A batch is a slice of example positions (repeats allowed). Every batch
//! routine charges the prior at `batch.len() / dataset.len()` of its full
//! weight, so summing batch values over one partition of the data gives the
//! full objective.
//!
//! Two Hessian-vector products are offered. The finite-difference one
//! differences batch gradients, `(g(x + h·v) − g(x)) / h`. The dual one
//! pushes `x + ε·v` through scores, log-sum-exp and softmax with
//! [`Dual`] numbers and is exact. Both also return the batch value and
//! gradient at `x`.
use std::hash::Hash;

use ndarray::Array1;

use super::{ConditionalLikelihood, ObjectiveMode};
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Cost, DiffFunction, Grad, Theta, validation::validate_dimension},
    numerical_stability::dual::{Dual, log_sum_exp_dual},
};

/// Batch value and gradient at `x` together with `H(x)·v`.
#[derive(Debug, Clone, PartialEq)]
pub struct HessianVectorProduct {
    pub value: f64,
    pub gradient: Grad,
    pub product: Array1<f64>,
}

impl<'a, F: Eq + Hash + Clone, L: Eq + Hash + Clone> ConditionalLikelihood<'a, F, L> {
    /// Value and gradient over `batch` with the prior scaled by
    /// `batch.len() / len`.
    ///
    /// # Errors
    /// - [`OptError::EmptyBatch`] / [`OptError::BatchIndexOutOfRange`].
    /// - The same evaluation errors as the full objective.
    pub fn batch_value_and_gradient(&self, x: &Theta, batch: &[usize]) -> OptResult<(Cost, Grad)> {
        validate_dimension(x.len(), self.dimension())?;
        self.check_batch(batch)?;
        let mut grad = Array1::zeros(x.len());
        let mut value = 0.0;
        for &i in batch {
            value += self.accumulate_example(x, i, self.example_weight(i), &mut grad, true)?;
        }
        value += self.prior.compute_scaled(x, &mut grad, self.batch_fraction(batch))?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value });
        }
        Ok((value, grad))
    }

    /// `x -= gain · ∇f_batch(x)` in place; returns the batch value at the
    /// old `x`. `x` is left untouched when evaluation fails.
    pub fn stochastic_update(&self, x: &mut Theta, batch: &[usize], gain: f64) -> OptResult<Cost> {
        let (value, grad) = self.batch_value_and_gradient(x, batch)?;
        x.scaled_add(-gain, &grad);
        Ok(value)
    }

    /// `(g(x + h·v) − g(x)) / h` over `batch`.
    ///
    /// # Errors
    /// [`OptError::InvalidStepSize`] when `h` is zero or not finite, plus
    /// the usual dimension and batch errors.
    pub fn hessian_vector_finite_difference(
        &self, x: &Theta, v: &Theta, h: f64, batch: &[usize],
    ) -> OptResult<HessianVectorProduct> {
        if !h.is_finite() || h == 0.0 {
            return Err(OptError::InvalidStepSize { value: h });
        }
        validate_dimension(v.len(), self.dimension())?;
        let (value, gradient) = self.batch_value_and_gradient(x, batch)?;
        let mut shifted = x.clone();
        shifted.scaled_add(h, v);
        let (_, shifted_grad) = self.batch_value_and_gradient(&shifted, batch)?;
        let product = (shifted_grad - &gradient) / h;
        Ok(HessianVectorProduct { value, gradient, product })
    }

    /// Exact `H(x)·v` over `batch` via forward-mode dual numbers.
    pub fn hessian_vector_dual(
        &self, x: &Theta, v: &Theta, batch: &[usize],
    ) -> OptResult<HessianVectorProduct> {
        validate_dimension(x.len(), self.dimension())?;
        validate_dimension(v.len(), self.dimension())?;
        self.check_batch(batch)?;
        let mut gradient = Array1::zeros(x.len());
        let mut product = Array1::zeros(x.len());
        let mut value = 0.0;

        for &i in batch {
            let weight = self.example_weight(i);
            let gold = self.dataset.label(i);
            let mut sums = vec![Dual::ZERO; self.num_classes];
            for (f, val) in self.dataset.feature_values(i) {
                let base = self.index(f, 0);
                for (c, s) in sums.iter_mut().enumerate() {
                    *s += Dual::new(x[base + c], v[base + c]) * val;
                }
            }
            if sums.iter().any(Dual::is_nan) {
                return Err(OptError::NumericalInstability {
                    example: i,
                    reason: "Class score is NaN.",
                });
            }
            let total = log_sum_exp_dual(&sums);
            if !total.value.is_finite() {
                return Err(OptError::NumericalInstability {
                    example: i,
                    reason: "Log-normalizer is not finite.",
                });
            }
            let probs: Vec<Dual> = sums.iter().map(|&s| (s - total).exp()).collect();

            match self.mode {
                ObjectiveMode::Standard => {
                    for (f, val) in self.dataset.feature_values(i) {
                        let base = self.index(f, 0);
                        for (c, p) in probs.iter().enumerate() {
                            gradient[base + c] += weight * p.value * val;
                            product[base + c] += weight * p.dot * val;
                        }
                        gradient[base + gold] -= weight * val;
                    }
                    value -= weight * (sums[gold].value - total.value);
                }
                ObjectiveMode::SummedConditional => {
                    let p_gold = probs[gold];
                    for (f, val) in self.dataset.feature_values(i) {
                        let base = self.index(f, 0);
                        for (c, &p) in probs.iter().enumerate() {
                            let q = p_gold * p;
                            gradient[base + c] += weight * q.value * val;
                            product[base + c] += weight * q.dot * val;
                        }
                        gradient[base + gold] -= weight * p_gold.value * val;
                        product[base + gold] -= weight * p_gold.dot * val;
                    }
                    value -= weight * p_gold.value;
                }
            }
        }

        let fraction = self.batch_fraction(batch);
        value += self.prior.compute_scaled(x, &mut gradient, fraction)?;
        let mut prior_product = Array1::zeros(x.len());
        self.prior.hessian_vector(x, v, &mut prior_product)?;
        product.scaled_add(fraction, &prior_product);
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value });
        }
        Ok(HessianVectorProduct { value, gradient, product })
    }

    fn check_batch(&self, batch: &[usize]) -> OptResult<()> {
        if batch.is_empty() {
            return Err(OptError::EmptyBatch);
        }
        let len = self.dataset.len();
        if let Some(&index) = batch.iter().find(|&&i| i >= len) {
            return Err(OptError::BatchIndexOutOfRange { index, len });
        }
        Ok(())
    }

    fn batch_fraction(&self, batch: &[usize]) -> f64 {
        batch.len() as f64 / self.dataset.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{tiny_dataset, weather_dataset};
    use super::*;
    use crate::optimization::{objective::InitialPoint, prior::Prior};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Batch evaluation over the whole dataset equals the full evaluation.
    // - Batch values over a partition sum to the full value.
    // - Agreement of the finite-difference and dual Hessian-vector products
    //   in both modes and with a curved prior.
    // - The in-place update and batch validation.
    // -------------------------------------------------------------------------

    fn all(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    // Purpose
    // -------
    // A batch holding every example reproduces the full objective, and the
    // dual path returns the same value and gradient.
    //
    // Given
    // -----
    // - Weather dataset, quadratic prior σ = 1.5, random point.
    //
    // Expect
    // ------
    // - Equal values and gradients to 1e-10.
    fn full_batch_matches_full_evaluation() {
        // Arrange
        let ds = weather_dataset();
        let objective = ConditionalLikelihood::new(&ds, Prior::quadratic(1.5).unwrap());
        let x = InitialPoint::Gaussian { scale: 0.3, seed: 2 }.generate(objective.dimension()).unwrap();
        let v = InitialPoint::Gaussian { scale: 1.0, seed: 3 }.generate(objective.dimension()).unwrap();
        let batch = all(ds.len());

        // Act
        let (full_value, full_grad) = objective.value_and_gradient(&x).unwrap();
        let (batch_value, batch_grad) = objective.batch_value_and_gradient(&x, &batch).unwrap();
        let hv = objective.hessian_vector_dual(&x, &v, &batch).unwrap();

        // Assert
        assert_abs_diff_eq!(full_value, batch_value, epsilon = 1e-10);
        assert_abs_diff_eq!(full_grad, batch_grad, epsilon = 1e-10);
        assert_abs_diff_eq!(hv.value, full_value, epsilon = 1e-10);
        assert_abs_diff_eq!(hv.gradient, full_grad, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Batch values over a partition add up to the full value, since each
    // batch pays its share of the prior.
    fn partition_values_sum_to_full_value() {
        let ds = weather_dataset();
        let objective = ConditionalLikelihood::new(&ds, Prior::quadratic(0.7).unwrap());
        let x = InitialPoint::Gaussian { scale: 0.3, seed: 8 }.generate(objective.dimension()).unwrap();
        let (full, _) = objective.value_and_gradient(&x).unwrap();
        let (a, _) = objective.batch_value_and_gradient(&x, &[0, 2]).unwrap();
        let (b, _) = objective.batch_value_and_gradient(&x, &[1, 3, 4]).unwrap();
        assert_abs_diff_eq!(a + b, full, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Finite-difference and dual Hessian-vector products agree.
    //
    // Given
    // -----
    // - Weather dataset; quadratic and cosh priors; both objective modes;
    //   a sub-batch; h = 1e-6.
    //
    // Expect
    // ------
    // - Products agree to 1e-4 and share value and gradient exactly.
    fn finite_difference_and_dual_products_agree() {
        let ds = weather_dataset();
        let priors = [Prior::quadratic(1.0).unwrap(), Prior::cosh(3.0).unwrap()];
        for prior in priors {
            for mode in [ObjectiveMode::Standard, ObjectiveMode::SummedConditional] {
                // Arrange
                let objective = ConditionalLikelihood::new(&ds, prior.clone()).with_mode(mode);
                let dim = objective.dimension();
                let x = InitialPoint::Gaussian { scale: 0.4, seed: 21 }.generate(dim).unwrap();
                let v = InitialPoint::Gaussian { scale: 1.0, seed: 22 }.generate(dim).unwrap();
                let batch = [0, 2, 3];

                // Act
                let fd = objective.hessian_vector_finite_difference(&x, &v, 1e-6, &batch).unwrap();
                let exact = objective.hessian_vector_dual(&x, &v, &batch).unwrap();

                // Assert
                assert_abs_diff_eq!(fd.product, exact.product, epsilon = 1e-4);
                assert_abs_diff_eq!(fd.value, exact.value, epsilon = 1e-12);
                assert_abs_diff_eq!(fd.gradient, exact.gradient, epsilon = 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // The stochastic update moves x against the batch gradient.
    //
    // Given
    // -----
    // - Toy problem at zero, batch = both examples, gain 2, null prior.
    //
    // Expect
    // ------
    // - Returned value 2 ln 2; x = −2 · [0, 0, 0.5, −0.5].
    fn stochastic_update_steps_against_gradient() {
        // Arrange
        let ds = tiny_dataset();
        let objective = ConditionalLikelihood::new(&ds, Prior::null());
        let mut x = Array1::zeros(4);

        // Act
        let value = objective.stochastic_update(&mut x, &[0, 1], 2.0).unwrap();

        // Assert
        assert_abs_diff_eq!(value, 2.0 * std::f64::consts::LN_2, epsilon = 1e-12);
        assert_abs_diff_eq!(x, array![0.0, 0.0, -1.0, 1.0], epsilon = 1e-12);
    }

    #[test]
    fn invalid_batches_and_steps_are_rejected() {
        let ds = tiny_dataset();
        let objective = ConditionalLikelihood::new(&ds, Prior::null());
        let x = Array1::zeros(4);
        assert_eq!(objective.batch_value_and_gradient(&x, &[]).unwrap_err(), OptError::EmptyBatch);
        assert_eq!(
            objective.batch_value_and_gradient(&x, &[0, 5]).unwrap_err(),
            OptError::BatchIndexOutOfRange { index: 5, len: 2 }
        );
        assert_eq!(
            objective.hessian_vector_finite_difference(&x, &x, 0.0, &[0]).unwrap_err(),
            OptError::InvalidStepSize { value: 0.0 }
        );
        let mut untouched = array![0.0, 0.0, f64::NAN, 0.0];
        assert!(objective.stochastic_update(&mut untouched, &[1], 1.0).is_err());
        assert_eq!(untouched[0], 0.0);
    }
}
