//! Errors for the encoding layer (indexes, datums, datasets, sparse files).
//!
//! [`DataError`] covers malformed inputs handed to [`EncodedDataset`] and
//! its helpers: non-finite feature values, inconsistent encoded rows,
//! out-of-range splits, invalid regex thresholds, and parse failures in the
//! sparse text format. Every variant carries just enough context (example
//! position, line number, offending token) to locate the problem without
//! holding on to the data itself.
//!
//! ## Conventions
//! - **Example positions are 0-based**, matching dataset indexing.
//! - **Line numbers are 1-based**, matching what editors display.
//! - Labels and features are generic, so variants that must name one carry
//!   its `Debug` rendering as a `String`.
//!
//! [`EncodedDataset`]: crate::encoding::dataset::EncodedDataset
#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Result alias for dataset construction, transformation, and I/O.
pub type DataResult<T> = Result<T, DataError>;

/// Unified error type for the encoding layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Datum validation ----
    /// A feature value is NaN or ±∞.
    NonFiniteValue { example: usize, feature: String, value: f64 },

    /// A binary dataset received a feature value other than 1.0.
    NonUnitBinaryValue { example: usize, feature: String, value: f64 },

    /// The label index is locked and does not contain this label.
    UnknownLabel { label: String },

    // ---- Encoded rows ----
    /// Encoded feature ids and values have different lengths.
    LengthMismatch { example: usize, ids: usize, values: usize },

    /// An encoded feature id is not covered by the feature index.
    FeatureIdOutOfRange { example: usize, id: usize, len: usize },

    /// An encoded label id is not covered by the label index.
    LabelIdOutOfRange { example: usize, id: usize, len: usize },

    /// A feature id appears twice in one encoded row.
    DuplicateFeatureId { example: usize, id: usize },

    /// Explicit values were supplied to a binary dataset.
    ValuesOnBinaryDataset { example: usize },

    // ---- Index ----
    /// An index was rebuilt from a list containing a repeated value.
    DuplicateIndexEntry { position: usize },

    // ---- Dataset operations ----
    /// Operation needs at least one example.
    EmptyDataset,

    /// `split_range` bounds are not `start <= end <= len`.
    SplitOutOfRange { start: usize, end: usize, len: usize },

    /// Split fraction outside `[0, 1]` or non-finite.
    InvalidFraction { value: f64 },

    /// Side information length differs from the dataset length.
    SideInformationLength { expected: usize, found: usize },

    /// Per-feature score vector length differs from the feature count.
    ScoreLengthMismatch { expected: usize, found: usize },

    /// A count-threshold pattern failed to compile.
    InvalidPattern { pattern: String, reason: String },

    /// Requested example position is past the end of the dataset.
    ExampleOutOfRange { index: usize, len: usize },

    // ---- Sparse text format ----
    /// A feature token did not split into exactly `name:value`.
    MalformedToken { line: usize, token: String },

    /// A feature value did not parse as a float.
    InvalidValue { line: usize, token: String },

    /// A label or feature name did not parse into the target type.
    InvalidToken { line: usize, token: String },

    /// An error raised while adding the datum read from `line`.
    Line { line: usize, source: Box<DataError> },

    /// Underlying reader/writer failure.
    Io { reason: String },
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Datum validation ----
            DataError::NonFiniteValue { example, feature, value } => {
                write!(f, "Example {example}: feature {feature} has non-finite value {value}")
            }
            DataError::NonUnitBinaryValue { example, feature, value } => {
                write!(
                    f,
                    "Example {example}: feature {feature} has value {value} but the dataset is binary"
                )
            }
            DataError::UnknownLabel { label } => {
                write!(f, "Label {label} is not in the locked label index")
            }

            // ---- Encoded rows ----
            DataError::LengthMismatch { example, ids, values } => {
                write!(f, "Example {example}: {ids} feature ids but {values} values")
            }
            DataError::FeatureIdOutOfRange { example, id, len } => {
                write!(f, "Example {example}: feature id {id} out of range for index of size {len}")
            }
            DataError::LabelIdOutOfRange { example, id, len } => {
                write!(f, "Example {example}: label id {id} out of range for index of size {len}")
            }
            DataError::DuplicateFeatureId { example, id } => {
                write!(f, "Example {example}: feature id {id} appears more than once")
            }
            DataError::ValuesOnBinaryDataset { example } => {
                write!(f, "Example {example}: explicit values given to a binary dataset")
            }

            // ---- Index ----
            DataError::DuplicateIndexEntry { position } => {
                write!(f, "Duplicate index entry at position {position}")
            }

            // ---- Dataset operations ----
            DataError::EmptyDataset => write!(f, "Dataset is empty"),
            DataError::SplitOutOfRange { start, end, len } => {
                write!(f, "Invalid split [{start}, {end}) for dataset of size {len}")
            }
            DataError::InvalidFraction { value } => {
                write!(f, "Invalid split fraction {value}, must lie in [0, 1]")
            }
            DataError::SideInformationLength { expected, found } => {
                write!(f, "Side information length mismatch: expected {expected}, found {found}")
            }
            DataError::ScoreLengthMismatch { expected, found } => {
                write!(f, "Feature score length mismatch: expected {expected}, found {found}")
            }
            DataError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid feature pattern '{pattern}': {reason}")
            }
            DataError::ExampleOutOfRange { index, len } => {
                write!(f, "Example {index} out of range for dataset of size {len}")
            }

            // ---- Sparse text format ----
            DataError::MalformedToken { line, token } => {
                write!(f, "Line {line}: malformed feature token '{token}', expected name:value")
            }
            DataError::InvalidValue { line, token } => {
                write!(f, "Line {line}: invalid feature value in '{token}'")
            }
            DataError::InvalidToken { line, token } => {
                write!(f, "Line {line}: could not parse '{token}'")
            }
            DataError::Line { line, source } => write!(f, "Line {line}: {source}"),
            DataError::Io { reason } => write!(f, "I/O error: {reason}"),
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io { reason: err.to_string() }
    }
}

#[cfg(feature = "python-bindings")]
impl From<DataError> for PyErr {
    fn from(err: DataError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
