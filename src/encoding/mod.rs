//! encoding — indexes, raw examples, and integer-encoded datasets.
//!
//! Purpose
//! -------
//! Turn labeled examples with arbitrary feature/label types into the dense
//! integer form consumed by the objective and the model, and provide the
//! dataset maintenance operations used before training (pruning, feature
//! selection, splitting, shuffling, sparse text I/O).
//!
//! Key behaviors
//! -------------
//! - [`index::Index`]: value ↔ id bijection with locking.
//! - [`datum::Datum`]: an unencoded example.
//! - [`dataset::EncodedDataset`]: examples as id rows sharing two indexes.
//! - [`sparse`]: `label name:value ...` reader/writer.
//!
//! Conventions
//! -----------
//! - All fallible operations return [`errors::DataResult`]; nothing here
//!   panics on bad input.
//! - Feature pruning reports what it removed through `log::info!`.
pub mod dataset;
pub mod datum;
pub mod errors;
pub mod index;
pub mod sparse;

pub mod prelude {
    pub use super::dataset::{
        DatasetSummary, EncodedDataset, FeatureKind, pruning::FeatureCountThreshold,
    };
    pub use super::datum::{Datum, binary_features};
    pub use super::errors::{DataError, DataResult};
    pub use super::index::Index;
    pub use super::sparse::{parse_sparse_line, read_sparse, write_sparse};
}
