//! Configuration and shape errors for regularization priors.
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for prior construction and evaluation.
pub type PriorResult<T> = Result<T, PriorError>;

#[derive(Debug, Clone, PartialEq)]
pub enum PriorError {
    /// Sigma must be finite and strictly positive.
    InvalidSigma { value: f64 },

    /// Huber epsilon must be finite and strictly positive.
    InvalidEpsilon { value: f64 },

    /// A per-weight variance is non-finite or not strictly positive.
    InvalidVariance { index: usize, value: f64 },

    /// An adaptation mean is non-finite.
    InvalidMean { index: usize, value: f64 },

    /// Unrecognized prior name.
    UnknownPriorType { name: String },

    /// This kind needs per-weight vectors and cannot be built from scalars.
    RequiresVectors { kind: &'static str },

    /// Adapted priors cannot wrap other adapted priors.
    NestedAdaptation,

    /// Weight vector length differs from the prior's vector length.
    DimensionMismatch { expected: usize, found: usize },
}

impl std::error::Error for PriorError {}

impl std::fmt::Display for PriorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorError::InvalidSigma { value } => {
                write!(f, "Invalid sigma {value}, must be finite and > 0")
            }
            PriorError::InvalidEpsilon { value } => {
                write!(f, "Invalid epsilon {value}, must be finite and > 0")
            }
            PriorError::InvalidVariance { index, value } => {
                write!(f, "Invalid variance at index {index}: {value}, must be finite and > 0")
            }
            PriorError::InvalidMean { index, value } => {
                write!(f, "Invalid adaptation mean at index {index}: {value}, must be finite")
            }
            PriorError::UnknownPriorType { name } => {
                write!(
                    f,
                    "Unknown prior type '{name}': valid options are 'null', 'quadratic', \
                     'huber', 'quartic', 'cosh', 'adapted', 'multiple_quadratic'"
                )
            }
            PriorError::RequiresVectors { kind } => {
                write!(f, "Prior '{kind}' needs per-weight vectors and cannot be built by name")
            }
            PriorError::NestedAdaptation => write!(f, "An adapted prior cannot wrap another"),
            PriorError::DimensionMismatch { expected, found } => {
                write!(f, "Prior dimension mismatch: expected {expected}, found {found}")
            }
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<PriorError> for PyErr {
    fn from(err: PriorError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
