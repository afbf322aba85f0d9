//! Error surface for the objective, the prior, and the optimizer wiring.
//!
//! [`OptError`] normalizes configuration mistakes (tolerances, SGD options,
//! unknown mode names), numerical failures inside the objective, and
//! backend `argmin` errors into one enum with the [`OptResult`] alias.
//! Errors raised by the objective travel through `argmin` as boxed errors;
//! the `From<argmin::core::Error>` conversion recovers them intact.
use argmin::core::{ArgminError, Error};
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

use crate::optimization::prior::PriorError;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch { expected: usize, found: usize },

    /// Gradient elements need to be finite
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- MLEOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad { tol: f64, reason: &'static str },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost { tol: f64, reason: &'static str },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },

    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- SgdOptions / objective configuration ----
    /// A stochastic-gradient option is out of range.
    InvalidSgdOption { name: &'static str, value: f64, reason: &'static str },

    /// Unknown batch sampling method name.
    InvalidSamplingMethod { name: String },

    /// Unknown objective mode name.
    InvalidObjectiveMode { name: String },

    /// Random initialization scale must be finite and > 0.
    InvalidInitialScale { value: f64 },

    /// Per-example weights must match the dataset length.
    ExampleWeightsLengthMismatch { expected: usize, found: usize },

    /// Per-example weights must be finite and non-negative.
    InvalidExampleWeight { index: usize, value: f64 },

    /// Finite-difference step must be finite and non-zero.
    InvalidStepSize { value: f64 },

    // ---- Objective evaluation ----
    /// Point or direction length differs from the objective dimension.
    DimensionMismatch { expected: usize, found: usize },

    /// Class scores for an example became NaN.
    NumericalInstability { example: usize, reason: &'static str },

    /// A mini-batch must contain at least one example.
    EmptyBatch,

    /// A mini-batch referenced a position past the end of the dataset.
    BatchIndexOutOfRange { index: usize, len: usize },

    /// Regularization failure (bad hyperparameters or shape).
    Prior(PriorError),

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost { value: f64 },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl OptError {
    /// True for failures caused by the numerical state of a run rather than
    /// by configuration. A retry with stronger regularization may succeed.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            OptError::NumericalInstability { .. }
                | OptError::NonFiniteCost { .. }
                | OptError::InvalidGradient { .. }
                | OptError::InvalidThetaHat { .. }
                | OptError::MissingThetaHat
                | OptError::ConditionViolated { .. }
                | OptError::BackendError { .. }
        )
    }
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MLEOptions ----
            OptError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            OptError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::NoTolerancesProvided => write!(f, "No tolerances provided"),
            OptError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            OptError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- SgdOptions / objective configuration ----
            OptError::InvalidSgdOption { name, value, reason } => {
                write!(f, "Invalid SGD option {name} = {value}: {reason}")
            }
            OptError::InvalidSamplingMethod { name } => {
                write!(
                    f,
                    "Invalid sampling method '{name}': valid options are 'ordered', 'shuffled', \
                     'with_replacement'"
                )
            }
            OptError::InvalidObjectiveMode { name } => {
                write!(
                    f,
                    "Invalid objective mode '{name}': valid options are 'standard', \
                     'summed_conditional'"
                )
            }
            OptError::InvalidInitialScale { value } => {
                write!(f, "Invalid initialization scale {value}, must be finite and > 0")
            }
            OptError::ExampleWeightsLengthMismatch { expected, found } => {
                write!(f, "Example weights length mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidExampleWeight { index, value } => {
                write!(f, "Invalid example weight at index {index}: {value}, must be finite and >= 0")
            }
            OptError::InvalidStepSize { value } => {
                write!(f, "Invalid finite-difference step {value}, must be finite and non-zero")
            }

            // ---- Objective evaluation ----
            OptError::DimensionMismatch { expected, found } => {
                write!(f, "Dimension mismatch: expected {expected}, found {found}")
            }
            OptError::NumericalInstability { example, reason } => {
                write!(f, "Numerical instability at example {example}: {reason}")
            }
            OptError::EmptyBatch => write!(f, "Mini-batch is empty"),
            OptError::BatchIndexOutOfRange { index, len } => {
                write!(f, "Batch index {index} out of range for dataset of size {len}")
            }
            OptError::Prior(err) => write!(f, "Prior error: {err}"),

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => write!(f, "Non-finite cost value: {value}"),

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => write!(f, "Missing estimated parameters (theta hat)"),

            // ---- Argmin ----
            OptError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            OptError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            OptError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            OptError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            OptError::CheckPointNotFound { text } => write!(f, "Checkpoint not found: {text}"),
            OptError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            OptError::ImpossibleError { text } => write!(f, "Impossible error: {text}"),
            OptError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Fallback ----
            OptError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<PriorError> for OptError {
    fn from(err: PriorError) -> Self {
        OptError::Prior(err)
    }
}

#[cfg(feature = "python-bindings")]
impl From<OptError> for PyErr {
    fn from(err: OptError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
