//! prior — regularization penalties added to the negative log-likelihood.
//!
//! Purpose
//! -------
//! Represent the family of weight priors as one immutable value, [`Prior`],
//! whose [`Prior::compute`] returns the penalty and accumulates its gradient
//! into the caller's buffer. The objective treats the prior as a pure
//! function of the weight vector.
//!
//! Key behaviors
//! -------------
//! - Variants: null, quadratic (Gaussian), Huber, quartic, cosh, adapted
//!   (any base prior re-centered on a mean vector), and multiple-quadratic
//!   (one variance per weight).
//! - Names resolve through the [`PriorKind`] `FromStr` registry; kinds
//!   that need vectors (adapted, multiple-quadratic) are built with their
//!   dedicated constructors instead.
//! - [`Prior::hessian_vector`] returns the Hessian-vector product of the
//!   penalty as implied by its gradient, for second-order stochastic code.
//! - [`Prior::compute_scaled`] scales value and gradient by a fraction, so a
//!   mini-batch pays its proportional share of the penalty.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every constructed prior has finite, strictly positive hyperparameters.
//! - The quartic gradient is `w/σ⁴` (not the derivative of `w⁴/(2σ⁴)`);
//!   it is kept that way for compatibility with models trained against it.
//!   Its `hessian_vector` follows the gradient, i.e. `v/σ⁴`.
//! - The cosh prior couples all weights through `‖w‖₁`; past `n = 30` it
//!   switches to the asymptote `n − ln 2` with gradient exactly `1/σ²`.
//!
//! Conventions
//! -----------
//! - `sign(0) = 0`, so zero weights receive no cosh gradient.
//! - Vector-valued priors report length mismatches as
//!   [`PriorError::DimensionMismatch`] at evaluation time.
//!
//! Testing notes
//! -------------
//! - Gradients are checked against `finitediff` central differences for
//!   every variant except quartic, whose gradient is asserted directly;
//!   Hessian-vector products against differences of the gradient.
pub mod errors;

pub use self::errors::{PriorError, PriorResult};

use std::{fmt, str::FromStr};

use ndarray::Array1;

use crate::optimization::numerical_stability::transformations::{
    COSH_LINEAR_CUTOFF, log_cosh, sign,
};

/// Named prior families, for configuration by string.
///
/// Parsing is case-insensitive and accepts a few aliases:
/// `"null" | "none"`, `"quadratic" | "gaussian" | "l2"`, `"huber"`,
/// `"quartic"`, `"cosh"`, `"adapted" | "adapt"`,
/// `"multiple_quadratic" | "multiple-quadratic"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorKind {
    Null,
    Quadratic,
    Huber,
    Quartic,
    Cosh,
    Adapted,
    MultipleQuadratic,
}

impl PriorKind {
    pub fn name(&self) -> &'static str {
        match self {
            PriorKind::Null => "null",
            PriorKind::Quadratic => "quadratic",
            PriorKind::Huber => "huber",
            PriorKind::Quartic => "quartic",
            PriorKind::Cosh => "cosh",
            PriorKind::Adapted => "adapted",
            PriorKind::MultipleQuadratic => "multiple_quadratic",
        }
    }
}

impl fmt::Display for PriorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PriorKind {
    type Err = PriorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "null" | "none" => Ok(PriorKind::Null),
            "quadratic" | "gaussian" | "l2" => Ok(PriorKind::Quadratic),
            "huber" => Ok(PriorKind::Huber),
            "quartic" => Ok(PriorKind::Quartic),
            "cosh" => Ok(PriorKind::Cosh),
            "adapted" | "adapt" => Ok(PriorKind::Adapted),
            "multiple_quadratic" | "multiple-quadratic" => Ok(PriorKind::MultipleQuadratic),
            _ => Err(PriorError::UnknownPriorType { name: s.to_string() }),
        }
    }
}

/// A validated regularization penalty.
#[derive(Debug, Clone, PartialEq)]
pub struct Prior {
    form: Form,
}

#[derive(Debug, Clone, PartialEq)]
enum Form {
    Null,
    Quadratic { sigma: f64 },
    Huber { sigma: f64, epsilon: f64 },
    Quartic { sigma: f64 },
    Cosh { sigma: f64 },
    Adapted { means: Array1<f64>, base: Box<Prior> },
    MultipleQuadratic { variances: Array1<f64> },
}

impl Prior {
    pub fn null() -> Self {
        Self { form: Form::Null }
    }

    pub fn quadratic(sigma: f64) -> PriorResult<Self> {
        Ok(Self { form: Form::Quadratic { sigma: check_sigma(sigma)? } })
    }

    pub fn huber(sigma: f64, epsilon: f64) -> PriorResult<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(PriorError::InvalidEpsilon { value: epsilon });
        }
        Ok(Self { form: Form::Huber { sigma: check_sigma(sigma)?, epsilon } })
    }

    pub fn quartic(sigma: f64) -> PriorResult<Self> {
        Ok(Self { form: Form::Quartic { sigma: check_sigma(sigma)? } })
    }

    pub fn cosh(sigma: f64) -> PriorResult<Self> {
        Ok(Self { form: Form::Cosh { sigma: check_sigma(sigma)? } })
    }

    /// `base` evaluated at `w − means`.
    ///
    /// # Errors
    /// - [`PriorError::NestedAdaptation`] if `base` is itself adapted.
    /// - [`PriorError::InvalidMean`] for non-finite means.
    pub fn adapted(means: Array1<f64>, base: Prior) -> PriorResult<Self> {
        if base.kind() == PriorKind::Adapted {
            return Err(PriorError::NestedAdaptation);
        }
        if let Some((index, &value)) = means.iter().enumerate().find(|(_, m)| !m.is_finite()) {
            return Err(PriorError::InvalidMean { index, value });
        }
        Ok(Self { form: Form::Adapted { means, base: Box::new(base) } })
    }

    /// Quadratic prior with variance `σᵢ²` for weight `i`.
    pub fn multiple_quadratic(variances: Array1<f64>) -> PriorResult<Self> {
        if let Some((index, &value)) =
            variances.iter().enumerate().find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(PriorError::InvalidVariance { index, value });
        }
        Ok(Self { form: Form::MultipleQuadratic { variances } })
    }

    /// Build a scalar-parameterized prior by kind.
    ///
    /// `epsilon` is only read by Huber. Adapted and multiple-quadratic
    /// need vectors and return [`PriorError::RequiresVectors`].
    pub fn from_kind(kind: PriorKind, sigma: f64, epsilon: f64) -> PriorResult<Self> {
        match kind {
            PriorKind::Null => Ok(Self::null()),
            PriorKind::Quadratic => Self::quadratic(sigma),
            PriorKind::Huber => Self::huber(sigma, epsilon),
            PriorKind::Quartic => Self::quartic(sigma),
            PriorKind::Cosh => Self::cosh(sigma),
            PriorKind::Adapted | PriorKind::MultipleQuadratic => {
                Err(PriorError::RequiresVectors { kind: kind.name() })
            }
        }
    }

    pub fn kind(&self) -> PriorKind {
        match &self.form {
            Form::Null => PriorKind::Null,
            Form::Quadratic { .. } => PriorKind::Quadratic,
            Form::Huber { .. } => PriorKind::Huber,
            Form::Quartic { .. } => PriorKind::Quartic,
            Form::Cosh { .. } => PriorKind::Cosh,
            Form::Adapted { .. } => PriorKind::Adapted,
            Form::MultipleQuadratic { .. } => PriorKind::MultipleQuadratic,
        }
    }

    /// Scalar sigma, for the variants that have one (adapted reports its base's).
    pub fn sigma(&self) -> Option<f64> {
        match &self.form {
            Form::Quadratic { sigma }
            | Form::Huber { sigma, .. }
            | Form::Quartic { sigma }
            | Form::Cosh { sigma } => Some(*sigma),
            Form::Adapted { base, .. } => base.sigma(),
            Form::Null | Form::MultipleQuadratic { .. } => None,
        }
    }

    /// Penalty value at `x`; its gradient is **added** into `grad`.
    ///
    /// # Errors
    /// - [`PriorError::DimensionMismatch`] if `grad`, the means, or the
    ///   variances do not match `x.len()`.
    pub fn compute(&self, x: &Array1<f64>, grad: &mut Array1<f64>) -> PriorResult<f64> {
        check_len(x.len(), grad.len())?;
        let value = match &self.form {
            Form::Null => 0.0,
            Form::Quadratic { sigma } => {
                let sigma_sq = sigma * sigma;
                let mut value = 0.0;
                for (g, &w) in grad.iter_mut().zip(x) {
                    value += w * w / (2.0 * sigma_sq);
                    *g += w / sigma_sq;
                }
                value
            }
            Form::Huber { sigma, epsilon } => {
                let sigma_sq = sigma * sigma;
                let mut value = 0.0;
                for (g, &w) in grad.iter_mut().zip(x) {
                    if w < -epsilon {
                        value += (-w - epsilon / 2.0) / sigma_sq;
                        *g -= 1.0 / sigma_sq;
                    } else if w < *epsilon {
                        value += w * w / (2.0 * epsilon * sigma_sq);
                        *g += w / (epsilon * sigma_sq);
                    } else {
                        value += (w - epsilon / 2.0) / sigma_sq;
                        *g += 1.0 / sigma_sq;
                    }
                }
                value
            }
            Form::Quartic { sigma } => {
                let sigma_qu = sigma.powi(4);
                let mut value = 0.0;
                for (g, &w) in grad.iter_mut().zip(x) {
                    value += w.powi(4) / (2.0 * sigma_qu);
                    *g += w / sigma_qu;
                }
                value
            }
            Form::Cosh { sigma } => {
                let sigma_sq = sigma * sigma;
                let norm = x.iter().map(|w| w.abs()).sum::<f64>() / sigma_sq;
                let d = if norm > COSH_LINEAR_CUTOFF {
                    1.0 / sigma_sq
                } else {
                    norm.tanh() / sigma_sq
                };
                for (g, &w) in grad.iter_mut().zip(x) {
                    *g += sign(w) * d;
                }
                log_cosh(norm)
            }
            Form::Adapted { means, base } => {
                check_len(means.len(), x.len())?;
                let shifted = x - means;
                base.compute(&shifted, grad)?
            }
            Form::MultipleQuadratic { variances } => {
                check_len(variances.len(), x.len())?;
                let mut value = 0.0;
                for ((g, &w), &var) in grad.iter_mut().zip(x).zip(variances) {
                    value += w * w / (2.0 * var);
                    *g += w / var;
                }
                value
            }
        };
        Ok(value)
    }

    /// [`Prior::compute`] with value and gradient multiplied by `fraction`.
    pub fn compute_scaled(
        &self, x: &Array1<f64>, grad: &mut Array1<f64>, fraction: f64,
    ) -> PriorResult<f64> {
        if fraction == 1.0 {
            return self.compute(x, grad);
        }
        check_len(x.len(), grad.len())?;
        let mut own = Array1::zeros(x.len());
        let value = self.compute(x, &mut own)?;
        grad.scaled_add(fraction, &own);
        Ok(fraction * value)
    }

    /// Add `H(x)·v` of the penalty into `out`.
    pub fn hessian_vector(
        &self, x: &Array1<f64>, v: &Array1<f64>, out: &mut Array1<f64>,
    ) -> PriorResult<()> {
        check_len(x.len(), v.len())?;
        check_len(x.len(), out.len())?;
        match &self.form {
            Form::Null => {}
            Form::Quadratic { sigma } => out.scaled_add(1.0 / (sigma * sigma), v),
            Form::Huber { sigma, epsilon } => {
                let curvature = 1.0 / (epsilon * sigma * sigma);
                for ((o, &w), &vi) in out.iter_mut().zip(x).zip(v) {
                    if w >= -epsilon && w < *epsilon {
                        *o += curvature * vi;
                    }
                }
            }
            Form::Quartic { sigma } => out.scaled_add(1.0 / sigma.powi(4), v),
            Form::Cosh { sigma } => {
                let sigma_sq = sigma * sigma;
                let norm = x.iter().map(|w| w.abs()).sum::<f64>() / sigma_sq;
                if norm <= COSH_LINEAR_CUTOFF {
                    let t = norm.tanh();
                    let coupling: f64 = x.iter().zip(v).map(|(&w, &vi)| sign(w) * vi).sum();
                    let scale = (1.0 - t * t) / (sigma_sq * sigma_sq) * coupling;
                    for (o, &w) in out.iter_mut().zip(x) {
                        *o += sign(w) * scale;
                    }
                }
            }
            Form::Adapted { means, base } => {
                check_len(means.len(), x.len())?;
                let shifted = x - means;
                base.hessian_vector(&shifted, v, out)?;
            }
            Form::MultipleQuadratic { variances } => {
                check_len(variances.len(), x.len())?;
                for ((o, &vi), &var) in out.iter_mut().zip(v).zip(variances) {
                    *o += vi / var;
                }
            }
        }
        Ok(())
    }
}

impl Default for Prior {
    /// Quadratic prior with `σ = 1`.
    fn default() -> Self {
        Self { form: Form::Quadratic { sigma: 1.0 } }
    }
}

fn check_sigma(sigma: f64) -> PriorResult<f64> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PriorError::InvalidSigma { value: sigma });
    }
    Ok(sigma)
}

fn check_len(expected: usize, found: usize) -> PriorResult<()> {
    if expected != found {
        return Err(PriorError::DimensionMismatch { expected, found });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use finitediff::FiniteDiff;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Closed-form values for each prior on small vectors.
    // - Analytic gradients vs `finitediff` central differences.
    // - Hessian-vector products vs differences of the gradient.
    // - Name registry, hyperparameter validation, and dimension checks.
    //
    // They intentionally DO NOT cover:
    // - The quartic prior's gradient consistency: its gradient is not the
    //   derivative of its value, so it is only checked against the formula.
    // -------------------------------------------------------------------------

    fn value_of(prior: &Prior, x: &Array1<f64>) -> f64 {
        let mut g = Array1::zeros(x.len());
        prior.compute(x, &mut g).unwrap()
    }

    fn grad_of(prior: &Prior, x: &Array1<f64>) -> Array1<f64> {
        let mut g = Array1::zeros(x.len());
        prior.compute(x, &mut g).unwrap();
        g
    }

    fn differentiable_priors() -> Vec<Prior> {
        vec![
            Prior::null(),
            Prior::quadratic(0.7).unwrap(),
            Prior::huber(1.3, 0.5).unwrap(),
            Prior::cosh(1.1).unwrap(),
            Prior::multiple_quadratic(array![0.5, 2.0, 1.0, 3.0]).unwrap(),
            Prior::adapted(array![0.1, -0.2, 0.3, 0.0], Prior::quadratic(2.0).unwrap()).unwrap(),
        ]
    }

    #[test]
    // Purpose
    // -------
    // The quadratic prior matches `Σ w²/(2σ²)` and `w/σ²`.
    fn quadratic_value_and_gradient() {
        let prior = Prior::quadratic(2.0).unwrap();
        let x = array![1.0, -2.0];
        assert_abs_diff_eq!(value_of(&prior, &x), (1.0 + 4.0) / 8.0, epsilon = 1e-15);
        assert_abs_diff_eq!(grad_of(&prior, &x), array![0.25, -0.5], epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Huber is quadratic inside ±ε and linear outside, continuous at ±ε.
    //
    // Given
    // -----
    // - σ = 1, ε = 0.5; weights at -2, 0.25, exactly ε, and 3.
    //
    // Expect
    // ------
    // - Values (2 − 0.25), 0.0625, 0.25, (3 − 0.25); gradients -1, 0.5, 1, 1.
    fn huber_regions_and_continuity() {
        // Arrange
        let prior = Prior::huber(1.0, 0.5).unwrap();

        // Act / Assert
        assert_abs_diff_eq!(value_of(&prior, &array![-2.0]), 1.75, epsilon = 1e-15);
        assert_abs_diff_eq!(value_of(&prior, &array![0.25]), 0.0625, epsilon = 1e-15);
        assert_abs_diff_eq!(value_of(&prior, &array![0.5]), 0.25, epsilon = 1e-15);
        assert_abs_diff_eq!(value_of(&prior, &array![3.0]), 2.75, epsilon = 1e-15);
        assert_abs_diff_eq!(
            grad_of(&prior, &array![-2.0, 0.25, 0.5, 3.0]),
            array![-1.0, 0.5, 1.0, 1.0],
            epsilon = 1e-15
        );
    }

    #[test]
    // Purpose
    // -------
    // Quartic keeps its `w/σ⁴` gradient.
    fn quartic_value_and_preserved_gradient() {
        let prior = Prior::quartic(2.0).unwrap();
        let x = array![2.0];
        assert_abs_diff_eq!(value_of(&prior, &x), 16.0 / 32.0, epsilon = 1e-15);
        assert_abs_diff_eq!(grad_of(&prior, &x), array![2.0 / 16.0], epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Cosh switches to the linear asymptote past the cutoff without a jump.
    //
    // Given
    // -----
    // - σ = 1 and ‖w‖₁ = 40 (past the cutoff), and ‖w‖₁ = 1.
    //
    // Expect
    // ------
    // - Value 40 − ln 2 and gradient exactly ±1 at 40.
    // - Value ln cosh 1 and gradient ±tanh 1 at 1; zero weights get no gradient.
    fn cosh_cutoff_and_sign_convention() {
        // Arrange
        let prior = Prior::cosh(1.0).unwrap();
        let far = array![30.0, -10.0];
        let near = array![0.5, -0.5, 0.0];

        // Act
        let far_value = value_of(&prior, &far);
        let near_grad = grad_of(&prior, &near);

        // Assert
        assert_abs_diff_eq!(far_value, 40.0 - std::f64::consts::LN_2, epsilon = 1e-12);
        assert_abs_diff_eq!(grad_of(&prior, &far), array![1.0, -1.0], epsilon = 1e-15);
        assert_abs_diff_eq!(value_of(&prior, &near), 1.0_f64.cosh().ln(), epsilon = 1e-12);
        let t = 1.0_f64.tanh();
        assert_abs_diff_eq!(near_grad, array![t, -t, 0.0], epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Analytic gradients agree with central differences for every prior
    // whose gradient is the derivative of its value.
    //
    // Given
    // -----
    // - A weight vector away from kinks (no zeros, no ±ε).
    //
    // Expect
    // ------
    // - Max abs difference below 1e-6 for each variant.
    fn gradients_match_central_differences() {
        // Arrange
        let x = array![0.3, -1.7, 0.05, 2.2];

        for prior in differentiable_priors() {
            // Act
            let analytic = grad_of(&prior, &x);
            let numeric = x.central_diff(&|w: &Array1<f64>| value_of(&prior, w));

            // Assert
            assert_abs_diff_eq!(analytic, numeric, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // `hessian_vector` agrees with a central difference of the gradient
    // along `v`, including the quartic prior (whose Hessian follows its
    // gradient).
    fn hessian_vector_matches_gradient_differences() {
        // Arrange
        let x = array![0.3, -1.7, 0.05, 2.2];
        let v = array![1.0, 0.5, -2.0, 0.25];
        let h = 1e-5;
        let mut priors = differentiable_priors();
        priors.push(Prior::quartic(1.5).unwrap());

        for prior in priors {
            // Act
            let mut hv = Array1::zeros(4);
            prior.hessian_vector(&x, &v, &mut hv).unwrap();
            let plus = grad_of(&prior, &(&x + &(&v * h)));
            let minus = grad_of(&prior, &(&x - &(&v * h)));
            let numeric = (plus - minus) / (2.0 * h);

            // Assert
            assert_abs_diff_eq!(hv, numeric, epsilon = 1e-5);
        }
    }

    #[test]
    // Purpose
    // -------
    // `compute_scaled` multiplies both value and gradient contribution.
    fn compute_scaled_applies_fraction() {
        let prior = Prior::quadratic(1.0).unwrap();
        let x = array![2.0, 0.0];
        let mut g = array![1.0, 1.0];
        let value = prior.compute_scaled(&x, &mut g, 0.25).unwrap();
        assert_abs_diff_eq!(value, 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(g, array![1.5, 1.0], epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Name registry resolves aliases and rejects unknown names; vector
    // kinds cannot be built from scalars.
    fn registry_and_construction_errors() {
        assert_eq!("Gaussian".parse::<PriorKind>().unwrap(), PriorKind::Quadratic);
        assert_eq!("HUBER".parse::<PriorKind>().unwrap(), PriorKind::Huber);
        assert!(matches!("lasso".parse::<PriorKind>(), Err(PriorError::UnknownPriorType { .. })));
        assert!(matches!(
            Prior::from_kind(PriorKind::Adapted, 1.0, 0.1),
            Err(PriorError::RequiresVectors { kind: "adapted" })
        ));
        assert!(matches!(Prior::quadratic(0.0), Err(PriorError::InvalidSigma { .. })));
        assert!(matches!(Prior::huber(1.0, f64::NAN), Err(PriorError::InvalidEpsilon { .. })));
        assert!(matches!(
            Prior::multiple_quadratic(array![1.0, -1.0]),
            Err(PriorError::InvalidVariance { index: 1, .. })
        ));
        let adapted = Prior::adapted(array![0.0], Prior::null()).unwrap();
        assert!(matches!(Prior::adapted(array![0.0], adapted), Err(PriorError::NestedAdaptation)));
    }

    #[test]
    // Purpose
    // -------
    // Vector priors report length mismatches at evaluation.
    fn vector_priors_check_dimensions() {
        let prior = Prior::multiple_quadratic(array![1.0, 1.0]).unwrap();
        let mut g = Array1::zeros(3);
        assert_eq!(
            prior.compute(&array![1.0, 2.0, 3.0], &mut g),
            Err(PriorError::DimensionMismatch { expected: 2, found: 3 })
        );
    }
}
