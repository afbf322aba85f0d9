//! LinearModel — a trained log-linear classifier.
//!
//! Purpose
//! -------
//! Hold the dense `numFeatures × numLabels` weight matrix, one threshold per
//! label, and the two (locked) indexes that name rows and columns, and
//! answer inference queries on raw feature lists.
//!
//! Key behaviors
//! -------------
//! - `score(d, c) = threshold[c] + Σ_{(f, v) ∈ d} w[f][c] · v`; features the
//!   model has never seen contribute nothing, and repeated features add up
//!   (the same rule real-valued datasets apply when encoding).
//! - Probabilities use the max-subtracted softmax from
//!   `numerical_stability`.
//! - [`LinearModel::class_of`] breaks ties toward the lowest label id, i.e.
//!   the label encountered first during encoding.
//!
//! Invariants & assumptions
//! ------------------------
//! - `weights.dim() == (feature_index.len(), label_index.len())`,
//!   `thresholds.len() == label_index.len()`, and at least one label.
//! - Both indexes are locked at construction.
//! - A flat weight vector maps to the matrix row-major:
//!   `theta[f * numLabels + c] == weights[[f, c]]`.
//!
//! Downstream usage
//! ----------------
//! - Built by the trainer from the optimizer's `x̂`; introspection lives in
//!   `introspection`, persistence in `serialization`.
use std::hash::Hash;

use ndarray::{Array1, Array2};

use crate::{
    classifier::errors::{ModelError, ModelResult},
    encoding::{dataset::EncodedDataset, index::Index},
    optimization::numerical_stability::transformations::{log_sum_exp, softmax_in_place},
};

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel<F: Eq + Hash, L: Eq + Hash> {
    pub(crate) feature_index: Index<F>,
    pub(crate) label_index: Index<L>,
    pub(crate) weights: Array2<f64>,
    pub(crate) thresholds: Array1<f64>,
}

impl<F: Eq + Hash + Clone, L: Eq + Hash + Clone> LinearModel<F, L> {
    /// Assemble a model, checking every shape. Both indexes are locked.
    ///
    /// # Errors
    /// - [`ModelError::NoLabels`] for an empty label index.
    /// - [`ModelError::WeightShapeMismatch`] /
    ///   [`ModelError::ThresholdLengthMismatch`] for wrong shapes.
    pub fn new(
        mut feature_index: Index<F>, mut label_index: Index<L>, weights: Array2<f64>,
        thresholds: Array1<f64>,
    ) -> ModelResult<Self> {
        if label_index.is_empty() {
            return Err(ModelError::NoLabels);
        }
        let expected = (feature_index.len(), label_index.len());
        if weights.dim() != expected {
            return Err(ModelError::WeightShapeMismatch { expected, found: weights.dim() });
        }
        if thresholds.len() != label_index.len() {
            return Err(ModelError::ThresholdLengthMismatch {
                expected: label_index.len(),
                found: thresholds.len(),
            });
        }
        feature_index.lock();
        label_index.lock();
        Ok(Self { feature_index, label_index, weights, thresholds })
    }

    /// Reshape a flat, feature-major weight vector; thresholds start at 0.
    ///
    /// # Errors
    /// [`ModelError::ThetaLengthMismatch`] when
    /// `theta.len() != features × labels`, plus the checks of [`Self::new`].
    pub fn from_flat(
        feature_index: Index<F>, label_index: Index<L>, theta: &Array1<f64>,
    ) -> ModelResult<Self> {
        let shape = (feature_index.len(), label_index.len());
        let expected = shape.0 * shape.1;
        if theta.len() != expected {
            return Err(ModelError::ThetaLengthMismatch { expected, found: theta.len() });
        }
        let weights = Array2::from_shape_vec(shape, theta.to_vec())
            .map_err(|_| ModelError::ThetaLengthMismatch { expected, found: theta.len() })?;
        let thresholds = Array1::zeros(shape.1);
        Self::new(feature_index, label_index, weights, thresholds)
    }

    /// [`Self::from_flat`] with the indexes of the dataset the weights were
    /// trained on.
    pub fn from_dataset(dataset: &EncodedDataset<F, L>, theta: &Array1<f64>) -> ModelResult<Self> {
        Self::from_flat(dataset.feature_index().clone(), dataset.label_index().clone(), theta)
    }

    // ---- Accessors ----

    pub fn feature_index(&self) -> &Index<F> {
        &self.feature_index
    }

    pub fn label_index(&self) -> &Index<L> {
        &self.label_index
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn thresholds(&self) -> &Array1<f64> {
        &self.thresholds
    }

    pub fn num_features(&self) -> usize {
        self.feature_index.len()
    }

    pub fn num_labels(&self) -> usize {
        self.label_index.len()
    }

    pub fn labels(&self) -> &[L] {
        self.label_index.as_slice()
    }

    /// Weight of `(feature, label)`, or `None` if either is unknown.
    pub fn weight(&self, feature: &F, label: &L) -> Option<f64> {
        let f = self.feature_index.index_of(feature)?;
        let c = self.label_index.index_of(label)?;
        Some(self.weights[[f, c]])
    }

    /// Weights flattened feature-major, the layout the objective uses.
    pub fn to_flat(&self) -> Array1<f64> {
        self.weights.iter().copied().collect()
    }

    // ---- Editing ----

    /// Replace the weight matrix.
    ///
    /// # Errors
    /// [`ModelError::WeightShapeMismatch`] if the shape differs.
    pub fn set_weights(&mut self, weights: Array2<f64>) -> ModelResult<()> {
        if weights.dim() != self.weights.dim() {
            return Err(ModelError::WeightShapeMismatch {
                expected: self.weights.dim(),
                found: weights.dim(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    /// Replace the thresholds.
    pub fn set_thresholds(&mut self, thresholds: Array1<f64>) -> ModelResult<()> {
        if thresholds.len() != self.thresholds.len() {
            return Err(ModelError::ThresholdLengthMismatch {
                expected: self.thresholds.len(),
                found: thresholds.len(),
            });
        }
        self.thresholds = thresholds;
        Ok(())
    }

    // ---- Inference ----

    /// Scores of every label, by label id.
    pub fn score_vector(&self, features: &[(F, f64)]) -> Vec<f64> {
        let mut scores = self.thresholds.to_vec();
        for (feature, value) in features {
            if let Some(f) = self.feature_index.index_of(feature) {
                for (s, &w) in scores.iter_mut().zip(self.weights.row(f)) {
                    *s += w * value;
                }
            }
        }
        scores
    }

    /// Score of one label, or `None` if the label is unknown.
    pub fn score_of(&self, features: &[(F, f64)], label: &L) -> Option<f64> {
        let c = self.label_index.index_of(label)?;
        let mut score = self.thresholds[c];
        for (feature, value) in features {
            if let Some(f) = self.feature_index.index_of(feature) {
                score += self.weights[[f, c]] * value;
            }
        }
        Some(score)
    }

    pub fn scores_of(&self, features: &[(F, f64)]) -> Vec<(L, f64)> {
        self.pair_with_labels(self.score_vector(features))
    }

    /// `p(c | features)` for every label, summing to 1.
    pub fn probabilities_of(&self, features: &[(F, f64)]) -> Vec<(L, f64)> {
        let mut scores = self.score_vector(features);
        softmax_in_place(&mut scores);
        self.pair_with_labels(scores)
    }

    pub fn log_probabilities_of(&self, features: &[(F, f64)]) -> Vec<(L, f64)> {
        let scores = self.score_vector(features);
        let total = log_sum_exp(&scores);
        self.pair_with_labels(scores.into_iter().map(|s| s - total).collect())
    }

    /// Highest-scoring label; ties go to the lowest label id.
    pub fn class_of(&self, features: &[(F, f64)]) -> &L {
        let scores = self.score_vector(features);
        let mut best = 0;
        for (c, &s) in scores.iter().enumerate().skip(1) {
            if s > scores[best] {
                best = c;
            }
        }
        self.label_index.get(best)
    }

    /// Fraction of `dataset` examples whose gold label is predicted.
    ///
    /// The dataset may use its own indexes; features and labels are matched
    /// by value. Returns 0 for an empty dataset.
    pub fn accuracy(&self, dataset: &EncodedDataset<F, L>) -> f64 {
        if dataset.is_empty() {
            return 0.0;
        }
        let mut correct = 0usize;
        let mut features = Vec::new();
        for i in 0..dataset.len() {
            features.clear();
            features.extend(
                dataset.feature_values(i).map(|(f, v)| (dataset.feature_index().get(f).clone(), v)),
            );
            let gold = dataset.label_index().get(dataset.label(i));
            if self.class_of(&features) == gold {
                correct += 1;
            }
        }
        correct as f64 / dataset.len() as f64
    }

    fn pair_with_labels(&self, values: Vec<f64>) -> Vec<(L, f64)> {
        self.label_index.iter().cloned().zip(values).collect()
    }
}
