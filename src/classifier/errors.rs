//! Errors for the model and the trainer.
//!
//! - [`ModelError`]: shape problems when building or editing a
//!   [`LinearModel`], and read/write failures of its serialized forms.
//! - [`TrainError`]: the top-level training surface, wrapping the encoding,
//!   prior, optimizer and model errors and adding the training
//!   preconditions. [`TrainError::is_recoverable`] separates numerical or
//!   optimizer events, which a retry with a different sigma may fix, from
//!   configuration and data errors, which it cannot.
//!
//! [`LinearModel`]: crate::classifier::linear::LinearModel
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::{
    encoding::errors::DataError,
    optimization::{errors::OptError, prior::PriorError},
};

/// Result alias for model construction, editing and (de)serialization.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result alias for training.
pub type TrainResult<T> = Result<T, TrainError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Shapes ----
    /// Weight matrix shape differs from `(features, labels)`.
    WeightShapeMismatch { expected: (usize, usize), found: (usize, usize) },

    /// One threshold per label is required.
    ThresholdLengthMismatch { expected: usize, found: usize },

    /// Flat weight vector length differs from `features × labels`.
    ThetaLengthMismatch { expected: usize, found: usize },

    /// A model needs at least one label.
    NoLabels,

    // ---- Serialization ----
    /// Malformed text model; `line` is 1-based.
    Parse { line: usize, reason: String },

    /// The text model ended before its threshold block was complete.
    UnexpectedEof { section: &'static str },

    /// A label or feature renders with a line break, which the text
    /// format cannot carry.
    UnrepresentableEntry { entry: String },

    /// Binary model written by an unknown format version.
    UnsupportedVersion { found: u32, supported: u32 },

    /// bincode failure.
    Binary { reason: String },

    /// I/O failure.
    Io { reason: String },

    /// Index rebuild failed (duplicate entries in a serialized model).
    Data(DataError),
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::WeightShapeMismatch { expected, found } => write!(
                f,
                "Weight matrix has shape {}x{}, expected {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            ModelError::ThresholdLengthMismatch { expected, found } => {
                write!(f, "Expected {expected} thresholds, found {found}")
            }
            ModelError::ThetaLengthMismatch { expected, found } => {
                write!(f, "Flat weight vector has length {found}, expected {expected}")
            }
            ModelError::NoLabels => write!(f, "A model needs at least one label"),
            ModelError::Parse { line, reason } => {
                write!(f, "Malformed model at line {line}: {reason}")
            }
            ModelError::UnexpectedEof { section } => {
                write!(f, "Model ended inside the {section} section")
            }
            ModelError::UnrepresentableEntry { entry } => {
                write!(f, "Entry {entry:?} cannot be written in the text model format")
            }
            ModelError::UnsupportedVersion { found, supported } => {
                write!(f, "Model format version {found} is not supported (expected {supported})")
            }
            ModelError::Binary { reason } => write!(f, "Binary model error: {reason}"),
            ModelError::Io { reason } => write!(f, "I/O error: {reason}"),
            ModelError::Data(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(err: std::io::Error) -> Self {
        ModelError::Io { reason: err.to_string() }
    }
}

impl From<bincode::Error> for ModelError {
    fn from(err: bincode::Error) -> Self {
        ModelError::Binary { reason: err.to_string() }
    }
}

impl From<DataError> for ModelError {
    fn from(err: DataError) -> Self {
        ModelError::Data(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<ModelError> for PyErr {
    fn from(err: ModelError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainError {
    // ---- Preconditions ----
    /// Training needs at least two labels.
    TooFewClasses { found: usize },

    /// Training needs at least one example.
    EmptyDataset,

    /// Multiple-quadratic training was requested without per-weight variances.
    MissingVariances,

    /// A fallback sigma is non-finite or non-positive.
    InvalidFallbackSigma { value: f64 },

    /// Unrecognized training method name.
    UnknownTrainingMethod { name: String },

    // ---- Wrapped layers ----
    Prior(PriorError),
    Data(DataError),
    Optimization(OptError),
    Model(ModelError),
}

impl TrainError {
    /// `true` for numerical or optimizer failures that another sigma may
    /// avoid; `false` for configuration and data errors.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TrainError::Optimization(err) => err.is_numerical(),
            _ => false,
        }
    }
}

impl std::error::Error for TrainError {}

impl std::fmt::Display for TrainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrainError::TooFewClasses { found } => {
                write!(f, "Training needs at least 2 labels, found {found}")
            }
            TrainError::EmptyDataset => write!(f, "Training needs at least one example"),
            TrainError::MissingVariances => {
                write!(f, "The multiple-quadratic prior needs one variance per weight")
            }
            TrainError::InvalidFallbackSigma { value } => {
                write!(f, "Fallback sigma {value} must be finite and positive")
            }
            TrainError::UnknownTrainingMethod { name } => {
                write!(f, "Unknown training method '{name}': valid options are 'lbfgs', 'sgd'")
            }
            TrainError::Prior(err) => write!(f, "Prior error: {err}"),
            TrainError::Data(err) => write!(f, "Data error: {err}"),
            TrainError::Optimization(err) => write!(f, "Optimization failed: {err}"),
            TrainError::Model(err) => write!(f, "Model error: {err}"),
        }
    }
}

impl From<PriorError> for TrainError {
    fn from(err: PriorError) -> Self {
        TrainError::Prior(err)
    }
}

impl From<DataError> for TrainError {
    fn from(err: DataError) -> Self {
        TrainError::Data(err)
    }
}

impl From<OptError> for TrainError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::Prior(inner) => TrainError::Prior(inner),
            other => TrainError::Optimization(other),
        }
    }
}

impl From<ModelError> for TrainError {
    fn from(err: ModelError) -> Self {
        TrainError::Model(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<TrainError> for PyErr {
    fn from(err: TrainError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The recoverable / fatal split of `TrainError`.
    // - Unwrapping of prior errors that travelled through `OptError`.
    // - Display strings that name the offending context.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Numerical and optimizer failures are recoverable; configuration and
    // data errors are not.
    fn recoverable_split() {
        let numerical: TrainError =
            OptError::NumericalInstability { example: 3, reason: "Class score is NaN." }.into();
        let backend: TrainError = OptError::BackendError { text: "line search".into() }.into();
        let config: TrainError = OptError::InvalidTolGrad { tol: -1.0, reason: "x" }.into();
        assert!(numerical.is_recoverable());
        assert!(backend.is_recoverable());
        assert!(!config.is_recoverable());
        assert!(!TrainError::TooFewClasses { found: 1 }.is_recoverable());
        assert!(!TrainError::Data(DataError::EmptyDataset).is_recoverable());
    }

    #[test]
    fn prior_errors_are_unwrapped_from_opt_errors() {
        let err: TrainError = OptError::Prior(PriorError::InvalidSigma { value: 0.0 }).into();
        assert_eq!(err, TrainError::Prior(PriorError::InvalidSigma { value: 0.0 }));
    }

    #[test]
    fn messages_name_their_context() {
        let parse = ModelError::Parse { line: 7, reason: "bad weight".into() };
        assert_eq!(parse.to_string(), "Malformed model at line 7: bad weight");
        let shape = ModelError::WeightShapeMismatch { expected: (2, 3), found: (3, 2) };
        assert_eq!(shape.to_string(), "Weight matrix has shape 3x2, expected 2x3");
        let io: ModelError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(io, ModelError::Io { .. }));
    }
}
