//! classifier — trained log-linear models and the trainer that fits them.
//!
//! Purpose
//! -------
//! Turn optimizer output into a usable classifier and back: [`LinearModel`]
//! answers inference and introspection queries over named features and
//! labels, [`Trainer`] fits one from an encoded dataset, and the
//! serialization module persists it as text or versioned binary.
//!
//! Key behaviors
//! -------------
//! - `linear`: scoring, probabilities, argmax and accuracy.
//! - `introspection`: ranked weights, weight histograms and per-feature
//!   score justifications.
//! - `serialization`: the line-oriented text format and `bincode` records.
//! - `options` / `trainer`: validated configuration, L-BFGS or SGD
//!   training, fallback sigmas and domain adaptation.
//! - `errors`: [`ModelError`] for models and [`TrainError`], the top-level
//!   error of the training surface.
//!
//! Invariants & assumptions
//! ------------------------
//! - Models own locked copies of their indexes; weights are dense
//!   `numFeatures × numLabels`.
//! - The flat weight vector of the optimizer maps row-major onto the
//!   matrix: `theta[f * numLabels + c] == weights[[f, c]]`.
//!
//! [`LinearModel`]: linear::LinearModel
//! [`Trainer`]: trainer::Trainer
//! [`ModelError`]: errors::ModelError
//! [`TrainError`]: errors::TrainError

pub mod errors;
pub mod introspection;
pub mod linear;
pub mod options;
pub mod serialization;
pub mod trainer;

pub mod prelude {
    pub use super::errors::{ModelError, ModelResult, TrainError, TrainResult};
    pub use super::introspection::{
        FeatureContribution, HistogramBin, Justification, TopFeatureQuery, WeightEntry,
    };
    pub use super::linear::LinearModel;
    pub use super::options::{TrainerOptions, TrainingMethod};
    pub use super::trainer::{TrainedClassifier, Trainer};
}
