//! objective — the regularized conditional log-likelihood of a log-linear
//! classifier.
//!
//! Purpose
//! -------
//! Define [`ConditionalLikelihood`], the function the trainer minimizes:
//! for weights `x` laid out feature-major over `numFeatures × numClasses`,
//!
//! ```text
//! f(x) = − Σᵢ wᵢ · log p(yᵢ | dᵢ; x) + prior(x)
//! p(c | d; x) = exp(s_c − log Σ_k exp s_k),   s_c = Σ_{f ∈ d} x[f·C + c] · v_f
//! ```
//!
//! together with its gradient, mini-batch variants, an in-place stochastic
//! update and two Hessian-vector products (see [`stochastic`]).
//!
//! Key behaviors
//! -------------
//! - Full evaluations are cached: the last `(x, value, gradient)` is kept in
//!   a `RefCell` and returned again for the same `x`, which is exactly the
//!   access pattern of L-BFGS (cost then gradient at one point).
//! - The gold-label ("observed") half of the gradient is example-weighted
//!   and precomputed once at construction.
//! - [`ObjectiveMode::SummedConditional`] replaces `−log p(gold)` with
//!   `−p(gold)`.
//! - Binary datasets use `v_f = 1`; real-valued datasets use stored values.
//!
//! Invariants & assumptions
//! ------------------------
//! - The dataset is borrowed immutably for the objective's lifetime.
//! - The cache makes the type `!Sync`; one objective serves one thread.
//! - Bad inputs (wrong dimension, NaN scores, non-finite value) come back as
//!   [`OptError`], never panics.
//!
//! Conventions
//! -----------
//! - Flattened index: [`ConditionalLikelihood::index`] = `f * numClasses + c`.
//! - Example weights default to 1.
//!
//! Testing notes
//! -------------
//! - Two-example toy problem with hand-derived value and gradient.
//! - Gradients in both modes are compared with `finitediff` central
//!   differences.
pub mod stochastic;

pub use self::stochastic::HessianVectorProduct;

use std::{cell::RefCell, fmt, hash::Hash, str::FromStr};

use ndarray::Array1;
use rand::{SeedableRng, distributions::Distribution, rngs::StdRng};
use statrs::distribution::Normal;

use crate::{
    encoding::dataset::EncodedDataset,
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            Cost, DiffFunction, Grad, StochasticDiffFunction, Theta,
            validation::validate_dimension,
        },
        numerical_stability::transformations::log_sum_exp,
        prior::Prior,
    },
};

/// Which per-example loss the objective sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveMode {
    /// `−log p(gold)`: the usual conditional log-likelihood.
    #[default]
    Standard,
    /// `−p(gold)`: the summed conditional likelihood.
    SummedConditional,
}

impl ObjectiveMode {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectiveMode::Standard => "standard",
            ObjectiveMode::SummedConditional => "summed-conditional",
        }
    }
}

impl fmt::Display for ObjectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ObjectiveMode {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "conditional" | "log-likelihood" | "loglikelihood" => {
                Ok(ObjectiveMode::Standard)
            }
            "summed-conditional" | "summed_conditional" | "summedconditional" | "summed" => {
                Ok(ObjectiveMode::SummedConditional)
            }
            _ => Err(OptError::InvalidObjectiveMode { name: s.to_string() }),
        }
    }
}

/// Where optimization starts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InitialPoint {
    #[default]
    Zeros,
    /// Independent `N(0, scale²)` draws from a generator seeded with `seed`.
    Gaussian { scale: f64, seed: u64 },
}

impl InitialPoint {
    /// # Errors
    /// [`OptError::InvalidInitialScale`] for a non-finite or non-positive scale.
    pub fn validate(&self) -> OptResult<()> {
        if let InitialPoint::Gaussian { scale, .. } = *self {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(OptError::InvalidInitialScale { value: scale });
            }
        }
        Ok(())
    }

    /// Materialize a point of length `dim`.
    pub fn generate(&self, dim: usize) -> OptResult<Theta> {
        match *self {
            InitialPoint::Zeros => Ok(Array1::zeros(dim)),
            InitialPoint::Gaussian { scale, seed } => {
                let normal = Normal::new(0.0, scale)
                    .map_err(|_| OptError::InvalidInitialScale { value: scale })?;
                let mut rng = StdRng::seed_from_u64(seed);
                Ok(Array1::from_shape_fn(dim, |_| normal.sample(&mut rng)))
            }
        }
    }
}

/// One cached full evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub x: Theta,
    pub value: f64,
    pub gradient: Grad,
}

/// Regularized negative conditional log-likelihood over an encoded dataset.
#[derive(Debug)]
pub struct ConditionalLikelihood<'a, F, L> {
    dataset: &'a EncodedDataset<F, L>,
    prior: Prior,
    mode: ObjectiveMode,
    example_weights: Option<Vec<f64>>,
    observed: Array1<f64>,
    init: InitialPoint,
    num_features: usize,
    num_classes: usize,
    cache: RefCell<Option<Evaluation>>,
}

impl<'a, F: Eq + Hash + Clone, L: Eq + Hash + Clone> ConditionalLikelihood<'a, F, L> {
    /// Standard-mode objective with unit example weights and a zero start.
    pub fn new(dataset: &'a EncodedDataset<F, L>, prior: Prior) -> Self {
        let num_features = dataset.num_features();
        let num_classes = dataset.num_classes();
        let mut objective = Self {
            dataset,
            prior,
            mode: ObjectiveMode::Standard,
            example_weights: None,
            observed: Array1::zeros(num_features * num_classes),
            init: InitialPoint::Zeros,
            num_features,
            num_classes,
            cache: RefCell::new(None),
        };
        objective.observed = objective.observed_counts();
        objective
    }

    pub fn with_mode(mut self, mode: ObjectiveMode) -> Self {
        self.mode = mode;
        self.cache.replace(None);
        self
    }

    /// Scale each example's loss (and its observed mass) by `weights[i]`.
    ///
    /// # Errors
    /// - [`OptError::ExampleWeightsLengthMismatch`] when the length differs
    ///   from the dataset length.
    /// - [`OptError::InvalidExampleWeight`] for a negative or non-finite
    ///   weight.
    pub fn with_example_weights(mut self, weights: Vec<f64>) -> OptResult<Self> {
        if weights.len() != self.dataset.len() {
            return Err(OptError::ExampleWeightsLengthMismatch {
                expected: self.dataset.len(),
                found: weights.len(),
            });
        }
        if let Some((index, &value)) =
            weights.iter().enumerate().find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(OptError::InvalidExampleWeight { index, value });
        }
        self.example_weights = Some(weights);
        self.observed = self.observed_counts();
        self.cache.replace(None);
        Ok(self)
    }

    pub fn with_initial_point(mut self, init: InitialPoint) -> OptResult<Self> {
        init.validate()?;
        self.init = init;
        Ok(self)
    }

    // ---- Accessors ----

    pub fn dataset(&self) -> &'a EncodedDataset<F, L> {
        self.dataset
    }

    pub fn prior(&self) -> &Prior {
        &self.prior
    }

    pub fn mode(&self) -> ObjectiveMode {
        self.mode
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Flattened position of weight `(feature, class)`.
    #[inline]
    pub fn index(&self, feature: usize, class: usize) -> usize {
        feature * self.num_classes + class
    }

    /// Weight of example `i` (1 unless weights were supplied).
    #[inline]
    pub fn example_weight(&self, i: usize) -> f64 {
        self.example_weights.as_ref().map_or(1.0, |w| w[i])
    }

    /// Example-weighted gold-label feature mass.
    pub fn observed(&self) -> &Array1<f64> {
        &self.observed
    }

    pub fn last_evaluation(&self) -> Option<Evaluation> {
        self.cache.borrow().clone()
    }

    // ---- Evaluation ----

    /// Full-data value and gradient, served from the cache when `x` equals
    /// the last evaluated point.
    pub fn value_and_gradient(&self, x: &Theta) -> OptResult<(Cost, Grad)> {
        if let Some(hit) = self.cache.borrow().as_ref() {
            if hit.x == *x {
                return Ok((hit.value, hit.gradient.clone()));
            }
        }
        let (value, gradient) = self.evaluate(x)?;
        self.cache.replace(Some(Evaluation {
            x: x.clone(),
            value,
            gradient: gradient.clone(),
        }));
        Ok((value, gradient))
    }

    fn evaluate(&self, x: &Theta) -> OptResult<(Cost, Grad)> {
        validate_dimension(x.len(), self.dimension())?;
        let mut grad = Array1::zeros(x.len());
        let mut value = 0.0;
        let inline_gold = self.mode == ObjectiveMode::SummedConditional;
        for i in 0..self.dataset.len() {
            value += self.accumulate_example(x, i, self.example_weight(i), &mut grad, inline_gold)?;
        }
        if !inline_gold {
            grad -= &self.observed;
        }
        value += self.prior.compute(x, &mut grad)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value });
        }
        Ok((value, grad))
    }

    /// Class scores `s_c = Σ_f x[f·C + c] · v_f` of example `i`.
    pub(crate) fn class_scores(&self, x: &Theta, i: usize) -> OptResult<Vec<f64>> {
        let mut sums = vec![0.0; self.num_classes];
        for (f, v) in self.dataset.feature_values(i) {
            let base = self.index(f, 0);
            for (c, s) in sums.iter_mut().enumerate() {
                *s += x[base + c] * v;
            }
        }
        if sums.iter().any(|s| s.is_nan()) {
            return Err(OptError::NumericalInstability {
                example: i,
                reason: "Class score is NaN.",
            });
        }
        Ok(sums)
    }

    /// Add example `i`'s loss gradient (scaled by `weight`) into `grad` and
    /// return its loss. The gold-label term `−v_f` is included only when
    /// `inline_gold` is set; otherwise the caller subtracts the precomputed
    /// observed mass. Summed mode always includes it.
    pub(crate) fn accumulate_example(
        &self, x: &Theta, i: usize, weight: f64, grad: &mut Grad, inline_gold: bool,
    ) -> OptResult<f64> {
        let mut sums = self.class_scores(x, i)?;
        let gold = self.dataset.label(i);
        let total = log_sum_exp(&sums);
        if !total.is_finite() {
            return Err(OptError::NumericalInstability {
                example: i,
                reason: "Log-normalizer is not finite.",
            });
        }
        let gold_log_prob = sums[gold] - total;
        for s in sums.iter_mut() {
            *s = (*s - total).exp();
        }
        let probs = sums;

        match self.mode {
            ObjectiveMode::Standard => {
                for (f, v) in self.dataset.feature_values(i) {
                    let base = self.index(f, 0);
                    for (c, &p) in probs.iter().enumerate() {
                        grad[base + c] += weight * p * v;
                    }
                    if inline_gold {
                        grad[base + gold] -= weight * v;
                    }
                }
                Ok(-weight * gold_log_prob)
            }
            ObjectiveMode::SummedConditional => {
                let p_gold = probs[gold];
                for (f, v) in self.dataset.feature_values(i) {
                    let base = self.index(f, 0);
                    for (c, &p) in probs.iter().enumerate() {
                        grad[base + c] += weight * p_gold * p * v;
                    }
                    grad[base + gold] -= weight * p_gold * v;
                }
                Ok(-weight * p_gold)
            }
        }
    }

    fn observed_counts(&self) -> Array1<f64> {
        let mut observed = Array1::zeros(self.num_features * self.num_classes);
        for i in 0..self.dataset.len() {
            let w = self.example_weight(i);
            let gold = self.dataset.label(i);
            for (f, v) in self.dataset.feature_values(i) {
                observed[self.index(f, gold)] += w * v;
            }
        }
        observed
    }
}

impl<'a, F: Eq + Hash + Clone, L: Eq + Hash + Clone> DiffFunction
    for ConditionalLikelihood<'a, F, L>
{
    fn dimension(&self) -> usize {
        self.num_features * self.num_classes
    }

    fn value_and_gradient(&self, x: &Theta) -> OptResult<(Cost, Grad)> {
        ConditionalLikelihood::value_and_gradient(self, x)
    }

    fn initial_point(&self) -> OptResult<Theta> {
        self.init.generate(self.dimension())
    }
}

impl<'a, F: Eq + Hash + Clone, L: Eq + Hash + Clone> StochasticDiffFunction
    for ConditionalLikelihood<'a, F, L>
{
    fn data_len(&self) -> usize {
        self.dataset.len()
    }

    fn stochastic_update(&self, x: &mut Theta, batch: &[usize], gain: f64) -> OptResult<Cost> {
        ConditionalLikelihood::stochastic_update(self, x, batch, gain)
    }
}
