//! Forward-mode dual numbers for exact directional derivatives.
//!
//! A [`Dual`] carries a value and its derivative along one direction `v`.
//! Pushing `x + ε·v` through the class-score → log-sum-exp → softmax chain
//! yields the probabilities together with their directional derivatives,
//! which is all the Hessian-vector product of the likelihood needs. Only
//! the operations that chain uses are implemented.
use std::ops::{Add, AddAssign, Mul, Sub};

/// `value + dot·ε` with `ε² = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dual {
    pub value: f64,
    pub dot: f64,
}

impl Dual {
    pub const ZERO: Dual = Dual { value: 0.0, dot: 0.0 };

    pub fn new(value: f64, dot: f64) -> Self {
        Self { value, dot }
    }

    pub fn exp(self) -> Self {
        let e = self.value.exp();
        Self { value: e, dot: e * self.dot }
    }

    pub fn is_nan(&self) -> bool {
        self.value.is_nan() || self.dot.is_nan()
    }
}

impl Add for Dual {
    type Output = Dual;

    fn add(self, rhs: Dual) -> Dual {
        Dual { value: self.value + rhs.value, dot: self.dot + rhs.dot }
    }
}

impl AddAssign for Dual {
    fn add_assign(&mut self, rhs: Dual) {
        self.value += rhs.value;
        self.dot += rhs.dot;
    }
}

impl Sub for Dual {
    type Output = Dual;

    fn sub(self, rhs: Dual) -> Dual {
        Dual { value: self.value - rhs.value, dot: self.dot - rhs.dot }
    }
}

impl Mul for Dual {
    type Output = Dual;

    fn mul(self, rhs: Dual) -> Dual {
        Dual { value: self.value * rhs.value, dot: self.value * rhs.dot + self.dot * rhs.value }
    }
}

impl Mul<f64> for Dual {
    type Output = Dual;

    fn mul(self, rhs: f64) -> Dual {
        Dual { value: self.value * rhs, dot: self.dot * rhs }
    }
}

/// Dual-number `ln Σ exp(sᵢ)`.
///
/// The value is computed with max-subtraction; the derivative is
/// `Σ softmax(s)ᵢ · ṡᵢ`.
pub fn log_sum_exp_dual(scores: &[Dual]) -> Dual {
    let max = scores.iter().map(|s| s.value).fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Dual::new(max, 0.0);
    }
    let mut sum = 0.0;
    let mut weighted_dot = 0.0;
    for s in scores {
        let e = (s.value - max).exp();
        sum += e;
        weighted_dot += e * s.dot;
    }
    Dual { value: max + sum.ln(), dot: weighted_dot / sum }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::numerical_stability::transformations::log_sum_exp;
    use approx::assert_abs_diff_eq;

    #[test]
    // Purpose
    // -------
    // The dual log-sum-exp derivative equals a finite difference of the
    // real log-sum-exp along the same direction.
    //
    // Given
    // -----
    // - Scores s = [0.2, -1.0, 2.5] and direction d = [1.0, 0.5, -0.3].
    //
    // Expect
    // ------
    // - value == log_sum_exp(s); dot ≈ (lse(s + h·d) − lse(s − h·d)) / 2h.
    fn log_sum_exp_dual_matches_directional_difference() {
        // Arrange
        let s = [0.2, -1.0, 2.5];
        let d = [1.0, 0.5, -0.3];
        let h = 1e-6;
        let duals: Vec<Dual> = s.iter().zip(&d).map(|(&v, &t)| Dual::new(v, t)).collect();

        // Act
        let out = log_sum_exp_dual(&duals);
        let plus: Vec<f64> = s.iter().zip(&d).map(|(v, t)| v + h * t).collect();
        let minus: Vec<f64> = s.iter().zip(&d).map(|(v, t)| v - h * t).collect();
        let numeric = (log_sum_exp(&plus) - log_sum_exp(&minus)) / (2.0 * h);

        // Assert
        assert_abs_diff_eq!(out.value, log_sum_exp(&s), epsilon = 1e-12);
        assert_abs_diff_eq!(out.dot, numeric, epsilon = 1e-8);
    }

    #[test]
    fn product_rule_and_exp() {
        let a = Dual::new(2.0, 1.0);
        let b = Dual::new(3.0, -1.0);
        assert_eq!(a * b, Dual::new(6.0, 1.0));
        let e = Dual::new(0.0, 2.0).exp();
        assert_eq!(e, Dual::new(1.0, 2.0));
    }
}
