//! Trainer configuration.
//!
//! [`TrainerOptions`] gathers everything [`Trainer`] needs besides the data:
//! the prior family and its hyperparameters, the objective mode, the
//! optimizer ([`TrainingMethod`]), the starting point and the fallback sigmas
//! tried when training breaks down numerically. Every setter validates its
//! input, so a constructed value is always usable; what depends on the
//! dataset (variance and example-weight lengths) is checked at train time.
//!
//! [`Trainer`]: crate::classifier::trainer::Trainer
use std::{fmt, str::FromStr};

use ndarray::Array1;

use crate::{
    classifier::errors::{TrainError, TrainResult},
    optimization::{
        loglik_optimizer::{MLEOptions, SgdOptions},
        objective::{InitialPoint, ObjectiveMode},
        prior::{Prior, PriorError, PriorKind},
    },
};

/// Optimizer used by the trainer.
///
/// Parsing is case-insensitive: `"lbfgs" | "l-bfgs" | "qn"` and `"sgd"`,
/// each with its default options.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingMethod {
    Lbfgs(MLEOptions),
    Sgd(SgdOptions),
}

impl TrainingMethod {
    pub fn name(&self) -> &'static str {
        match self {
            TrainingMethod::Lbfgs(_) => "lbfgs",
            TrainingMethod::Sgd(_) => "sgd",
        }
    }
}

impl Default for TrainingMethod {
    fn default() -> Self {
        TrainingMethod::Lbfgs(MLEOptions::default())
    }
}

impl fmt::Display for TrainingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrainingMethod {
    type Err = TrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lbfgs" | "l-bfgs" | "qn" => Ok(TrainingMethod::Lbfgs(MLEOptions::default())),
            "sgd" => Ok(TrainingMethod::Sgd(SgdOptions::default())),
            _ => Err(TrainError::UnknownTrainingMethod { name: s.to_string() }),
        }
    }
}

/// Validated trainer configuration.
///
/// Defaults: quadratic prior with `sigma = 1`, Huber `epsilon = 0.01`,
/// standard objective, L-BFGS with [`MLEOptions::default`], zero start, no
/// fallbacks, unit example weights, no gradient check.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerOptions {
    prior_kind: PriorKind,
    sigma: f64,
    epsilon: f64,
    variances: Option<Array1<f64>>,
    mode: ObjectiveMode,
    method: TrainingMethod,
    initial_point: InitialPoint,
    fallback_sigmas: Vec<f64>,
    example_weights: Option<Vec<f64>>,
    check_gradient: bool,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self {
            prior_kind: PriorKind::Quadratic,
            sigma: 1.0,
            epsilon: 0.01,
            variances: None,
            mode: ObjectiveMode::Standard,
            method: TrainingMethod::default(),
            initial_point: InitialPoint::Zeros,
            fallback_sigmas: Vec::new(),
            example_weights: None,
            check_gradient: false,
        }
    }
}

impl TrainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Setters ----

    /// # Errors
    /// [`PriorError::InvalidSigma`] for a non-finite or non-positive sigma.
    pub fn with_prior(mut self, kind: PriorKind, sigma: f64) -> TrainResult<Self> {
        check_sigma(sigma)?;
        self.prior_kind = kind;
        self.sigma = sigma;
        Ok(self)
    }

    /// Huber transition width.
    pub fn with_epsilon(mut self, epsilon: f64) -> TrainResult<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(PriorError::InvalidEpsilon { value: epsilon }.into());
        }
        self.epsilon = epsilon;
        Ok(self)
    }

    /// Per-weight variances for the multiple-quadratic prior, flattened
    /// feature-major like the weights.
    pub fn with_variances(mut self, variances: Array1<f64>) -> TrainResult<Self> {
        Prior::multiple_quadratic(variances.clone())?;
        self.variances = Some(variances);
        Ok(self)
    }

    pub fn with_mode(mut self, mode: ObjectiveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_method(mut self, method: TrainingMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_initial_point(mut self, initial_point: InitialPoint) -> TrainResult<Self> {
        initial_point.validate()?;
        self.initial_point = initial_point;
        Ok(self)
    }

    /// Sigmas tried in order after `sigma` when training fails
    /// recoverably.
    ///
    /// # Errors
    /// [`TrainError::InvalidFallbackSigma`] for the first bad entry.
    pub fn with_fallback_sigmas(mut self, sigmas: Vec<f64>) -> TrainResult<Self> {
        if let Some(&value) = sigmas.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(TrainError::InvalidFallbackSigma { value });
        }
        self.fallback_sigmas = sigmas;
        Ok(self)
    }

    /// Per-example loss weights; the length is checked against the dataset
    /// when training starts.
    pub fn with_example_weights(mut self, weights: Vec<f64>) -> Self {
        self.example_weights = Some(weights);
        self
    }

    /// Compare the analytic gradient with finite differences at the
    /// starting point before optimizing, logging the discrepancy.
    pub fn with_gradient_check(mut self, check: bool) -> Self {
        self.check_gradient = check;
        self
    }

    // ---- Accessors ----

    pub fn prior_kind(&self) -> PriorKind {
        self.prior_kind
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn variances(&self) -> Option<&Array1<f64>> {
        self.variances.as_ref()
    }

    pub fn mode(&self) -> ObjectiveMode {
        self.mode
    }

    pub fn method(&self) -> &TrainingMethod {
        &self.method
    }

    pub fn initial_point(&self) -> InitialPoint {
        self.initial_point
    }

    pub fn fallback_sigmas(&self) -> &[f64] {
        &self.fallback_sigmas
    }

    pub fn example_weights(&self) -> Option<&[f64]> {
        self.example_weights.as_deref()
    }

    pub fn check_gradient(&self) -> bool {
        self.check_gradient
    }

    // ---- Priors ----

    /// Prior for plain training at `sigma`.
    ///
    /// # Errors
    /// - [`TrainError::MissingVariances`] for multiple-quadratic without
    ///   variances.
    /// - [`PriorError::RequiresVectors`] for the adapted kind, which needs
    ///   a source model (see `Trainer::adapt`).
    pub fn build_prior(&self, sigma: f64) -> TrainResult<Prior> {
        if self.prior_kind == PriorKind::Adapted {
            return Err(PriorError::RequiresVectors { kind: PriorKind::Adapted.name() }.into());
        }
        self.base_prior(sigma)
    }

    /// Prior that an adapted prior recenters. The adapted kind itself
    /// falls back to quadratic here.
    pub fn base_prior(&self, sigma: f64) -> TrainResult<Prior> {
        match self.prior_kind {
            PriorKind::MultipleQuadratic => {
                let variances = self.variances.clone().ok_or(TrainError::MissingVariances)?;
                Ok(Prior::multiple_quadratic(variances)?)
            }
            PriorKind::Adapted => Ok(Prior::quadratic(sigma)?),
            kind => Ok(Prior::from_kind(kind, sigma, self.epsilon)?),
        }
    }
}

fn check_sigma(sigma: f64) -> TrainResult<()> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PriorError::InvalidSigma { value: sigma }.into());
    }
    Ok(())
}
