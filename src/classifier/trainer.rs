//! Trainer — fit a [`LinearModel`] by minimizing the regularized objective.
//!
//! Purpose
//! -------
//! Glue between an [`EncodedDataset`], the options in [`TrainerOptions`] and
//! the optimizers: build the prior and the [`ConditionalLikelihood`], pick a
//! starting point, run L-BFGS or SGD, and wrap the minimizer as a model.
//!
//! Key behaviors
//! -------------
//! - [`Trainer::train`] trains once at the configured sigma.
//! - [`Trainer::train_with_fallback`] retries with each fallback sigma while
//!   the failure is recoverable (numerical breakdown or optimizer failure,
//!   see [`TrainError::is_recoverable`]); configuration and data errors are
//!   returned at once.
//! - [`Trainer::adapt`] retrains on new data under an adapted prior
//!   centered on an existing model's weights, matched by feature and label
//!   name, and starts the optimizer from those weights.
//!
//! Invariants & assumptions
//! ------------------------
//! - Training needs at least one example and at least two labels.
//! - The model's indexes are locked clones of the dataset's indexes.
//!
//! Logging
//! -------
//! `log::info!` at start and finish of each attempt, `log::warn!` for
//! non-converged runs and before each fallback retry.
use std::hash::Hash;

use ndarray::Array1;

use crate::{
    classifier::{
        errors::{TrainError, TrainResult},
        linear::LinearModel,
        options::{TrainerOptions, TrainingMethod},
    },
    encoding::dataset::EncodedDataset,
    optimization::{
        loglik_optimizer::{
            DiffFunction, OptimOutcome, Theta, finite_diff::gradient_discrepancy, minimize,
            run_sgd,
        },
        objective::ConditionalLikelihood,
        prior::Prior,
    },
};

/// A fitted model together with how it was fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedClassifier<F: Eq + Hash, L: Eq + Hash> {
    pub model: LinearModel<F, L>,
    pub outcome: OptimOutcome,
    /// Sigma of the prior that produced the model, if it has one.
    pub sigma: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct Trainer {
    options: TrainerOptions,
}

impl Trainer {
    pub fn new(options: TrainerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TrainerOptions {
        &self.options
    }

    /// Train once at the configured sigma.
    ///
    /// # Errors
    /// - [`TrainError::EmptyDataset`] / [`TrainError::TooFewClasses`].
    /// - Prior construction errors (see [`TrainerOptions::build_prior`]).
    /// - Any objective or optimizer failure.
    pub fn train<F, L>(&self, dataset: &EncodedDataset<F, L>) -> TrainResult<TrainedClassifier<F, L>>
    where
        F: Eq + Hash + Clone,
        L: Eq + Hash + Clone,
    {
        self.train_at(dataset, self.options.sigma())
    }

    /// Train at the configured sigma, then at each fallback sigma in turn
    /// while the previous attempt failed recoverably.
    ///
    /// Returns the first success, the first unrecoverable error, or the
    /// error of the last attempt.
    pub fn train_with_fallback<F, L>(
        &self, dataset: &EncodedDataset<F, L>,
    ) -> TrainResult<TrainedClassifier<F, L>>
    where
        F: Eq + Hash + Clone,
        L: Eq + Hash + Clone,
    {
        let mut fallbacks = self.options.fallback_sigmas().iter().copied();
        let mut sigma = self.options.sigma();
        loop {
            match self.train_at(dataset, sigma) {
                Err(err) if err.is_recoverable() => match fallbacks.next() {
                    Some(next) => {
                        log::warn!(
                            "Training with sigma {sigma} failed: {err}; retrying with sigma {next}"
                        );
                        sigma = next;
                    }
                    None => return Err(err),
                },
                result => return result,
            }
        }
    }

    /// Retrain on `dataset` with a prior centered on `source`'s weights.
    ///
    /// Weights whose feature or label `source` does not know are centered
    /// at 0. The base prior is the configured one at the configured sigma
    /// (quadratic when the configured kind is itself adapted). Optimization
    /// starts from the centers, ignoring the configured initial point.
    pub fn adapt<F, L>(
        &self, source: &LinearModel<F, L>, dataset: &EncodedDataset<F, L>,
    ) -> TrainResult<TrainedClassifier<F, L>>
    where
        F: Eq + Hash + Clone,
        L: Eq + Hash + Clone,
    {
        check_trainable(dataset)?;
        let num_classes = dataset.num_classes();
        let mut means = Array1::zeros(dataset.num_features() * num_classes);
        let label_map: Vec<Option<usize>> =
            dataset.label_index().iter().map(|l| source.label_index().index_of(l)).collect();
        let mut carried = 0usize;
        for (f, feature) in dataset.feature_index().iter().enumerate() {
            let Some(source_f) = source.feature_index().index_of(feature) else { continue };
            for (c, source_c) in label_map.iter().enumerate() {
                if let Some(source_c) = *source_c {
                    means[f * num_classes + c] = source.weights()[[source_f, source_c]];
                    carried += 1;
                }
            }
        }
        log::info!("Adapting: {carried} of {} weights centered on the source model", means.len());

        let base = self.options.base_prior(self.options.sigma())?;
        let prior = Prior::adapted(means.clone(), base)?;
        self.fit(dataset, prior, Some(means))
    }

    fn train_at<F, L>(
        &self, dataset: &EncodedDataset<F, L>, sigma: f64,
    ) -> TrainResult<TrainedClassifier<F, L>>
    where
        F: Eq + Hash + Clone,
        L: Eq + Hash + Clone,
    {
        check_trainable(dataset)?;
        let prior = self.options.build_prior(sigma)?;
        self.fit(dataset, prior, None)
    }

    fn fit<F, L>(
        &self, dataset: &EncodedDataset<F, L>, prior: Prior, start: Option<Theta>,
    ) -> TrainResult<TrainedClassifier<F, L>>
    where
        F: Eq + Hash + Clone,
        L: Eq + Hash + Clone,
    {
        let sigma = prior.sigma();
        let prior_kind = prior.kind();
        let mut objective = ConditionalLikelihood::new(dataset, prior)
            .with_mode(self.options.mode())
            .with_initial_point(self.options.initial_point())?;
        if let Some(weights) = self.options.example_weights() {
            objective = objective.with_example_weights(weights.to_vec())?;
        }
        let x0 = match start {
            Some(x) => x,
            None => objective.initial_point()?,
        };

        if self.options.check_gradient() {
            let gap = gradient_discrepancy(&objective, &x0)?;
            log::info!("Gradient check at the starting point: max |analytic - numeric| = {gap:.3e}");
        }

        let method = self.options.method();
        log::info!(
            "Training {} ({} mode, {prior_kind} prior, sigma {sigma:?}) on {} examples, {} features, {} labels",
            method,
            self.options.mode(),
            dataset.len(),
            dataset.num_features(),
            dataset.num_classes()
        );
        let outcome = match method {
            TrainingMethod::Lbfgs(opts) => minimize(&objective, x0, opts)?,
            TrainingMethod::Sgd(opts) => run_sgd(&objective, x0, opts)?,
        };
        if !outcome.converged {
            log::warn!("Training stopped without converging: {}", outcome.status);
        }
        log::info!(
            "Training finished after {} iterations: value {:.6}, gradient norm {:?}",
            outcome.iterations,
            outcome.value,
            outcome.grad_norm
        );

        let model = LinearModel::from_dataset(dataset, &outcome.x_hat)?;
        Ok(TrainedClassifier { model, outcome, sigma })
    }
}

fn check_trainable<F, L>(dataset: &EncodedDataset<F, L>) -> TrainResult<()>
where
    F: Eq + Hash + Clone,
    L: Eq + Hash + Clone,
{
    if dataset.is_empty() {
        return Err(TrainError::EmptyDataset);
    }
    if dataset.num_classes() < 2 {
        return Err(TrainError::TooFewClasses { found: dataset.num_classes() });
    }
    Ok(())
}
