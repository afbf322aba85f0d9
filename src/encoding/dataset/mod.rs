//! dataset — integer-encoded training data over shared feature/label indexes.
//!
//! Purpose
//! -------
//! Hold a collection of examples in the compact form the objective and the
//! model consume: per example a list of feature ids, optional parallel
//! feature values, and one label id. Names live only in the two [`Index`]es.
//!
//! Key behaviors
//! -------------
//! - [`EncodedDataset::add`] encodes a [`Datum`], growing the indexes
//!   unless they are locked.
//! - Binary datasets keep ids only and drop repeated features within an
//!   example (first occurrence wins).
//! - Real-valued datasets keep parallel values and **sum** the values of a
//!   feature repeated within one example. Model scoring applies the same
//!   rule, so train-time and test-time encodings agree.
//! - Feature pruning and selection live in [`pruning`]; splitting and
//!   shuffling in [`reorder`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `data.len() == labels.len()` and, for real-valued data,
//!   `values.len() == data.len()` with `values[i].len() == data[i].len()`.
//! - Every stored feature id is `< feature_index.len()` and every label id
//!   is `< label_index.len()`.
//! - No feature id appears twice in one example.
//! - Every stored value is finite.
//!
//! Conventions
//! -----------
//! - Example positions are 0-based and stable until a reorder operation.
//! - Failed `add` calls leave the dataset and both indexes unchanged.
//!
//! Downstream usage
//! ----------------
//! - `ConditionalLikelihood` reads examples through [`EncodedDataset::features`],
//!   [`EncodedDataset::values`], and [`EncodedDataset::label`].
//! - The trainer copies the indexes into the fitted `LinearModel`.
//!
//! Testing notes
//! -------------
//! - Unit tests below cover encoding, locking, duplicate handling, and
//!   decoding; the submodules test their own operations.
pub mod pruning;
pub mod reorder;

use std::{collections::HashMap, fmt, hash::Hash};

use crate::encoding::{
    datum::Datum,
    errors::{DataError, DataResult},
    index::Index,
};

/// How feature values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Presence only; every value is implicitly 1.0.
    Binary,
    /// Explicit per-feature values.
    RealValued,
}

/// Integer-encoded examples plus the indexes that name them.
#[derive(Debug, Clone)]
pub struct EncodedDataset<F, L> {
    feature_index: Index<F>,
    label_index: Index<L>,
    data: Vec<Vec<usize>>,
    values: Option<Vec<Vec<f64>>>,
    labels: Vec<usize>,
}

/// Counts reported by [`EncodedDataset::summary_statistics`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub num_examples: usize,
    pub num_feature_types: usize,
    pub num_feature_tokens: usize,
    pub num_labels: usize,
    /// Examples per label id.
    pub label_counts: Vec<usize>,
    pub kind: FeatureKind,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "numDatums: {}", self.num_examples)?;
        writeln!(f, "numLabels: {}", self.num_labels)?;
        writeln!(f, "numFeatures (types): {}", self.num_feature_types)?;
        writeln!(f, "numFeatures (tokens): {}", self.num_feature_tokens)?;
        write!(f, "examples per label: {:?}", self.label_counts)
    }
}

impl<F: Eq + Hash + Clone, L: Eq + Hash + Clone> EncodedDataset<F, L> {
    pub fn new(kind: FeatureKind) -> Self {
        Self::with_indexes(Index::new(), Index::new(), kind)
    }

    pub fn new_binary() -> Self {
        Self::new(FeatureKind::Binary)
    }

    pub fn new_real_valued() -> Self {
        Self::new(FeatureKind::RealValued)
    }

    /// Empty dataset sharing pre-built (possibly locked) indexes.
    ///
    /// This is how test data is encoded against a training vocabulary.
    pub fn with_indexes(feature_index: Index<F>, label_index: Index<L>, kind: FeatureKind) -> Self {
        let values = match kind {
            FeatureKind::Binary => None,
            FeatureKind::RealValued => Some(Vec::new()),
        };
        Self { feature_index, label_index, data: Vec::new(), values, labels: Vec::new() }
    }

    // ---- Encoding ----

    /// Encode and append one example; returns its position.
    ///
    /// Errors
    /// ------
    /// - [`DataError::NonFiniteValue`] for NaN/±∞ values.
    /// - [`DataError::NonUnitBinaryValue`] for values other than 1.0 on a
    ///   binary dataset.
    /// - [`DataError::UnknownLabel`] if the label index is locked and does
    ///   not know the label.
    ///
    /// Notes
    /// -----
    /// - Features unseen by a locked feature index are skipped silently.
    /// - Validation happens before any index is touched.
    pub fn add(&mut self, datum: Datum<F, L>) -> DataResult<usize>
    where
        F: fmt::Debug,
        L: fmt::Debug,
    {
        let example = self.len();
        let Datum { features, label } = datum;
        for (feature, value) in &features {
            if !value.is_finite() {
                let feature = format!("{feature:?}");
                return Err(DataError::NonFiniteValue { example, feature, value: *value });
            }
            if self.values.is_none() && *value != 1.0 {
                let feature = format!("{feature:?}");
                return Err(DataError::NonUnitBinaryValue { example, feature, value: *value });
            }
        }
        let label_id = self
            .label_index
            .try_add(label)
            .map_err(|label| DataError::UnknownLabel { label: format!("{label:?}") })?;

        let mut ids: Vec<usize> = Vec::with_capacity(features.len());
        let mut vals: Vec<f64> = Vec::with_capacity(features.len());
        let mut seen: HashMap<usize, usize> = HashMap::with_capacity(features.len());
        for (feature, value) in features {
            let Some(id) = self.feature_index.add(feature) else { continue };
            match seen.get(&id) {
                Some(&pos) => vals[pos] += value,
                None => {
                    seen.insert(id, ids.len());
                    ids.push(id);
                    vals.push(value);
                }
            }
        }
        self.push_row(ids, vals, label_id);
        Ok(example)
    }

    /// Append an already-encoded example.
    ///
    /// `values` must be `None` for binary datasets; for real-valued datasets
    /// `None` means every value is 1.0.
    ///
    /// Errors
    /// ------
    /// Length mismatches, out-of-range ids, repeated ids, and non-finite
    /// values, each reported with the would-be example position.
    pub fn add_encoded(
        &mut self, ids: Vec<usize>, values: Option<Vec<f64>>, label: usize,
    ) -> DataResult<usize> {
        let example = self.len();
        if label >= self.label_index.len() {
            return Err(DataError::LabelIdOutOfRange {
                example,
                id: label,
                len: self.label_index.len(),
            });
        }
        let mut seen = vec![false; self.feature_index.len()];
        for &id in &ids {
            if id >= seen.len() {
                return Err(DataError::FeatureIdOutOfRange { example, id, len: seen.len() });
            }
            if seen[id] {
                return Err(DataError::DuplicateFeatureId { example, id });
            }
            seen[id] = true;
        }
        let vals = match (self.values.is_some(), values) {
            (false, Some(_)) => return Err(DataError::ValuesOnBinaryDataset { example }),
            (_, None) => vec![1.0; ids.len()],
            (true, Some(v)) => v,
        };
        if vals.len() != ids.len() {
            return Err(DataError::LengthMismatch { example, ids: ids.len(), values: vals.len() });
        }
        if let Some((pos, &value)) = vals.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            let feature = format!("id {}", ids[pos]);
            return Err(DataError::NonFiniteValue { example, feature, value });
        }
        self.push_row(ids, vals, label);
        Ok(example)
    }

    fn push_row(&mut self, ids: Vec<usize>, vals: Vec<f64>, label: usize) {
        self.data.push(ids);
        if let Some(values) = self.values.as_mut() {
            values.push(vals);
        }
        self.labels.push(label);
    }

    /// Decode example `i` back into names.
    ///
    /// # Errors
    /// - [`DataError::ExampleOutOfRange`] if `i >= len()`.
    pub fn datum(&self, i: usize) -> DataResult<Datum<F, L>> {
        if i >= self.len() {
            return Err(DataError::ExampleOutOfRange { index: i, len: self.len() });
        }
        let features = self.feature_values(i).map(|(id, v)| (self.feature_index.get(id).clone(), v));
        Ok(Datum::real_valued(features.collect(), self.label_index.get(self.labels[i]).clone()))
    }

    /// Re-encode every example of `other` through this dataset's indexes.
    ///
    /// The result shares clones of `self`'s indexes, locked, so features
    /// unknown to this vocabulary are dropped and unknown labels are errors.
    /// The result keeps `self`'s feature kind.
    pub fn map_dataset(&self, other: &EncodedDataset<F, L>) -> DataResult<Self>
    where
        F: fmt::Debug,
        L: fmt::Debug,
    {
        let mut feature_index = self.feature_index.clone();
        let mut label_index = self.label_index.clone();
        feature_index.lock();
        label_index.lock();
        let mut mapped = Self::with_indexes(feature_index, label_index, self.kind());
        for i in 0..other.len() {
            mapped.add(other.datum(i)?)?;
        }
        Ok(mapped)
    }

    // ---- Accessors ----

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn kind(&self) -> FeatureKind {
        if self.values.is_some() { FeatureKind::RealValued } else { FeatureKind::Binary }
    }

    pub fn is_real_valued(&self) -> bool {
        self.values.is_some()
    }

    pub fn num_features(&self) -> usize {
        self.feature_index.len()
    }

    pub fn num_classes(&self) -> usize {
        self.label_index.len()
    }

    pub fn feature_index(&self) -> &Index<F> {
        &self.feature_index
    }

    pub fn label_index(&self) -> &Index<L> {
        &self.label_index
    }

    pub fn feature_index_mut(&mut self) -> &mut Index<F> {
        &mut self.feature_index
    }

    pub fn label_index_mut(&mut self) -> &mut Index<L> {
        &mut self.label_index
    }

    /// Lock both indexes so further `add` calls cannot grow the vocabulary.
    pub fn lock_indexes(&mut self) {
        self.feature_index.lock();
        self.label_index.lock();
    }

    /// Feature ids of example `i`.
    pub fn features(&self, i: usize) -> &[usize] {
        &self.data[i]
    }

    /// Feature values of example `i`, or `None` for binary data.
    pub fn values(&self, i: usize) -> Option<&[f64]> {
        self.values.as_ref().map(|v| v[i].as_slice())
    }

    pub fn label(&self, i: usize) -> usize {
        self.labels[i]
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// `(feature id, value)` pairs of example `i`; binary values read as 1.0.
    pub fn feature_values(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let vals = self.values(i);
        self.data[i].iter().enumerate().map(move |(j, &id)| (id, vals.map_or(1.0, |v| v[j])))
    }

    // ---- Statistics ----

    /// Number of examples containing each feature id.
    pub fn feature_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_features()];
        for row in &self.data {
            for &id in row {
                counts[id] += 1;
            }
        }
        counts
    }

    /// Number of examples per label id.
    pub fn label_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_classes()];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }

    /// Total stored feature occurrences across all examples.
    pub fn num_feature_tokens(&self) -> usize {
        self.data.iter().map(Vec::len).sum()
    }

    pub fn summary_statistics(&self) -> DatasetSummary {
        DatasetSummary {
            num_examples: self.len(),
            num_feature_types: self.num_features(),
            num_feature_tokens: self.num_feature_tokens(),
            num_labels: self.num_classes(),
            label_counts: self.label_counts(),
            kind: self.kind(),
        }
    }

    /// Copy of the rows at `positions`, sharing clones of both indexes.
    fn subset<I: IntoIterator<Item = usize>>(&self, positions: I) -> Self {
        let mut out =
            Self::with_indexes(self.feature_index.clone(), self.label_index.clone(), self.kind());
        for i in positions {
            out.data.push(self.data[i].clone());
            if let (Some(dst), Some(src)) = (out.values.as_mut(), self.values.as_ref()) {
                dst.push(src[i].clone());
            }
            out.labels.push(self.labels[i]);
        }
        out
    }
}

impl<F: Eq + Hash + Clone, L: Eq + Hash + Clone> Default for EncodedDataset<F, L> {
    fn default() -> Self {
        Self::new_binary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Encoding of binary and real-valued datums, including repeats.
    // - Locked-index behavior for features (skip) and labels (error).
    // - Validation failures that must leave the dataset untouched.
    // - Decoding, statistics, and re-encoding through another vocabulary.
    //
    // They intentionally DO NOT cover:
    // - Pruning, selection, splitting, shuffling (see submodules).
    // -------------------------------------------------------------------------

    fn toy_binary() -> EncodedDataset<String, String> {
        let mut ds = EncodedDataset::new_binary();
        ds.add(Datum::binary(["a".to_string(), "b".to_string()], "x".to_string())).unwrap();
        ds.add(Datum::binary(["b".to_string(), "c".to_string()], "y".to_string())).unwrap();
        ds.add(Datum::binary(["a".to_string()], "x".to_string())).unwrap();
        ds
    }

    #[test]
    // Purpose
    // -------
    // Binary encoding assigns ids in first-seen order and dedupes repeats.
    //
    // Given
    // -----
    // - A binary datum listing "a" twice.
    //
    // Expect
    // ------
    // - The stored row contains id 0 once; no values are stored.
    fn binary_add_dedupes_repeated_features() {
        // Arrange
        let mut ds: EncodedDataset<&str, &str> = EncodedDataset::new_binary();

        // Act
        ds.add(Datum::binary(["a", "b", "a"], "pos")).unwrap();

        // Assert
        assert_eq!(ds.features(0), &[0, 1]);
        assert_eq!(ds.values(0), None);
        assert_eq!(ds.num_features(), 2);
        assert_eq!(ds.num_classes(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Real-valued encoding sums the values of a repeated feature.
    fn real_valued_add_sums_repeated_features() {
        let mut ds: EncodedDataset<&str, &str> = EncodedDataset::new_real_valued();
        ds.add(Datum::real_valued(vec![("a", 0.5), ("b", 2.0), ("a", 0.25)], "pos")).unwrap();
        assert_eq!(ds.features(0), &[0, 1]);
        assert_eq!(ds.values(0), Some(&[0.75, 2.0][..]));
    }

    #[test]
    // Purpose
    // -------
    // Locked feature indexes skip unseen features; locked label indexes
    // reject unseen labels without modifying the dataset.
    //
    // Given
    // -----
    // - A trained vocabulary {a, b, c} × {x, y}, locked.
    //
    // Expect
    // ------
    // - Datum with unseen feature "z" encodes only known ids.
    // - Datum with unseen label "w" fails with `UnknownLabel`, length unchanged.
    fn locked_indexes_skip_features_and_reject_labels() {
        // Arrange
        let train = toy_binary();
        let mut test = EncodedDataset::with_indexes(
            train.feature_index().clone(),
            train.label_index().clone(),
            FeatureKind::Binary,
        );
        test.lock_indexes();

        // Act
        test.add(Datum::binary(["z".to_string(), "c".to_string()], "y".to_string())).unwrap();
        let err = test.add(Datum::binary(["a".to_string()], "w".to_string())).unwrap_err();

        // Assert
        assert_eq!(test.features(0), &[2]);
        assert!(matches!(err, DataError::UnknownLabel { .. }));
        assert_eq!(test.len(), 1);
        assert_eq!(test.num_features(), 3);
    }

    #[test]
    // Purpose
    // -------
    // Non-finite values are rejected with example and feature context,
    // before any index grows.
    fn nan_value_is_rejected_without_side_effects() {
        let mut ds: EncodedDataset<&str, &str> = EncodedDataset::new_real_valued();
        ds.add(Datum::real_valued(vec![("a", 1.0)], "pos")).unwrap();
        let err = ds.add(Datum::real_valued(vec![("new", f64::NAN)], "neg")).unwrap_err();
        match err {
            DataError::NonFiniteValue { example, feature, value } => {
                assert_eq!(example, 1);
                assert!(feature.contains("new"));
                assert!(value.is_nan());
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(ds.num_features(), 1);
        assert_eq!(ds.num_classes(), 1);
    }

    #[test]
    // Purpose
    // -------
    // A binary dataset refuses values other than 1.0.
    fn binary_dataset_rejects_non_unit_values() {
        let mut ds: EncodedDataset<&str, &str> = EncodedDataset::new_binary();
        let err = ds.add(Datum::real_valued(vec![("a", 2.0)], "pos")).unwrap_err();
        assert!(matches!(err, DataError::NonUnitBinaryValue { example: 0, .. }));
    }

    #[test]
    // Purpose
    // -------
    // Encoded rows are validated for range, duplicates, and length.
    fn add_encoded_validates_rows() {
        let mut ds = toy_binary();
        assert!(matches!(
            ds.add_encoded(vec![0, 9], None, 0),
            Err(DataError::FeatureIdOutOfRange { id: 9, .. })
        ));
        assert!(matches!(
            ds.add_encoded(vec![1, 1], None, 0),
            Err(DataError::DuplicateFeatureId { id: 1, .. })
        ));
        assert!(matches!(
            ds.add_encoded(vec![0], Some(vec![1.0]), 0),
            Err(DataError::ValuesOnBinaryDataset { .. })
        ));
        assert!(matches!(ds.add_encoded(vec![0], None, 5), Err(DataError::LabelIdOutOfRange { .. })));
        assert_eq!(ds.add_encoded(vec![2, 0], None, 1), Ok(3));
    }

    #[test]
    // Purpose
    // -------
    // Statistics reflect example, token, and label counts.
    fn summary_statistics_counts_examples_tokens_and_labels() {
        // Arrange
        let ds = toy_binary();

        // Act
        let summary = ds.summary_statistics();

        // Assert
        assert_eq!(summary.num_examples, 3);
        assert_eq!(summary.num_feature_types, 3);
        assert_eq!(summary.num_feature_tokens, 5);
        assert_eq!(summary.label_counts, vec![2, 1]);
        assert_eq!(ds.feature_counts(), vec![2, 2, 1]);
        assert!(summary.to_string().contains("numDatums: 3"));
    }

    #[test]
    // Purpose
    // -------
    // `datum` decodes names back; `map_dataset` re-encodes through a
    // locked vocabulary and drops unknown features.
    fn datum_decodes_and_map_dataset_reencodes() {
        // Arrange
        let train = toy_binary();
        let mut other: EncodedDataset<String, String> = EncodedDataset::new_binary();
        other.add(Datum::binary(["q".to_string(), "c".to_string()], "y".to_string())).unwrap();

        // Act
        let decoded = train.datum(1).unwrap();
        let mapped = train.map_dataset(&other).unwrap();

        // Assert
        assert_eq!(decoded.features, vec![("b".to_string(), 1.0), ("c".to_string(), 1.0)]);
        assert_eq!(decoded.label, "y");
        assert_eq!(mapped.features(0), &[2]);
        assert_eq!(mapped.label(0), 1);
        assert!(mapped.feature_index().is_locked());
        assert!(train.datum(3).is_err());
    }
}
