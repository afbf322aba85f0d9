//! pruning — count thresholds, information gain, and top-k feature selection.
//!
//! Purpose
//! -------
//! Shrink the feature vocabulary of an [`EncodedDataset`] in place. Every
//! operation decides a keep/drop flag per feature id and then runs one
//! shared remapping routine, so they all preserve the same invariants.
//!
//! Key behaviors
//! -------------
//! - [`EncodedDataset::apply_feature_count_threshold`]: per-pattern minimum
//!   counts. The first rule whose regex fully matches the feature's
//!   `Display` string decides; features matching no rule are kept.
//! - [`EncodedDataset::apply_min_count`] / [`EncodedDataset::apply_max_count`]:
//!   one global bound.
//! - [`EncodedDataset::information_gains`] and
//!   [`EncodedDataset::select_features`]: score-driven top-k selection.
//!
//! Invariants & assumptions
//! ------------------------
//! - Counts are the number of examples containing a feature (rows never
//!   hold a repeated id, so this equals the occurrence count).
//! - Survivors keep their relative id order; example order and the order of
//!   ids within each example are unchanged. Dropped ids disappear from every
//!   row together with their values.
use std::{fmt::Display, hash::Hash};

use regex::Regex;

use crate::encoding::{
    dataset::EncodedDataset,
    errors::{DataError, DataResult},
};

/// A `(pattern, min_count)` rule for [`EncodedDataset::apply_feature_count_threshold`].
///
/// The pattern must match the **whole** feature string, not a substring.
#[derive(Debug, Clone)]
pub struct FeatureCountThreshold {
    pattern: String,
    regex: Regex,
    min_count: usize,
}

impl FeatureCountThreshold {
    /// Compile a full-match rule.
    ///
    /// # Errors
    /// - [`DataError::InvalidPattern`] if the regex does not compile.
    pub fn new(pattern: &str, min_count: usize) -> DataResult<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            DataError::InvalidPattern { pattern: pattern.to_string(), reason: e.to_string() }
        })?;
        Ok(Self { pattern: pattern.to_string(), regex, min_count })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn min_count(&self) -> usize {
        self.min_count
    }

    pub fn matches(&self, feature: &str) -> bool {
        self.regex.is_match(feature)
    }
}

impl<F: Eq + Hash + Clone, L: Eq + Hash + Clone> EncodedDataset<F, L> {
    /// Drop features whose first matching rule demands more examples than
    /// they occur in. Returns the number of features removed.
    pub fn apply_feature_count_threshold(&mut self, rules: &[FeatureCountThreshold]) -> usize
    where
        F: Display,
    {
        let counts = self.feature_counts();
        let keep: Vec<bool> = self
            .feature_index
            .iter()
            .zip(&counts)
            .map(|(feature, &count)| {
                let name = feature.to_string();
                rules.iter().find(|r| r.matches(&name)).map_or(true, |r| count >= r.min_count)
            })
            .collect();
        self.retain_features(&keep)
    }

    /// Drop features occurring in fewer than `k` examples.
    pub fn apply_min_count(&mut self, k: usize) -> usize {
        let keep: Vec<bool> = self.feature_counts().iter().map(|&c| c >= k).collect();
        self.retain_features(&keep)
    }

    /// Drop features occurring in more than `k` examples.
    pub fn apply_max_count(&mut self, k: usize) -> usize {
        let keep: Vec<bool> = self.feature_counts().iter().map(|&c| c <= k).collect();
        self.retain_features(&keep)
    }

    /// Information gain (bits) of each feature's presence about the label.
    ///
    /// `IG(f) = H(L) − [p(f)·H(L | f) + (1 − p(f))·H(L | ¬f)]`. Features
    /// present in no example or in every example score 0.
    pub fn information_gains(&self) -> Vec<f64> {
        let n = self.len();
        let num_classes = self.num_classes();
        let label_counts = self.label_counts();
        let mut feature_counts = vec![0_usize; self.num_features()];
        let mut joint = vec![0_usize; self.num_features() * num_classes];
        for (row, &label) in self.data.iter().zip(&self.labels) {
            for &f in row {
                feature_counts[f] += 1;
                joint[f * num_classes + label] += 1;
            }
        }

        let entropy = -label_counts.iter().map(|&c| plogp(c, n)).sum::<f64>();
        feature_counts
            .iter()
            .enumerate()
            .map(|(f, &fc)| {
                if fc == 0 || fc == n {
                    return 0.0;
                }
                let row = &joint[f * num_classes..(f + 1) * num_classes];
                let with: f64 = row.iter().map(|&c| plogp(c, fc)).sum();
                let without: f64 =
                    row.iter().zip(&label_counts).map(|(&c, &lc)| plogp(lc - c, n - fc)).sum();
                let pf = fc as f64 / n as f64;
                entropy + pf * with + (1.0 - pf) * without
            })
            .collect()
    }

    /// Keep the `k` highest-scoring features (ties go to the lower id).
    ///
    /// NaN scores rank below every real score. Returns the number removed.
    ///
    /// # Errors
    /// - [`DataError::ScoreLengthMismatch`] if `scores.len() != num_features()`.
    pub fn select_features(&mut self, k: usize, scores: &[f64]) -> DataResult<usize> {
        if scores.len() != self.num_features() {
            return Err(DataError::ScoreLengthMismatch {
                expected: self.num_features(),
                found: scores.len(),
            });
        }
        let key = |s: f64| if s.is_nan() { f64::NEG_INFINITY } else { s };
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| key(scores[b]).total_cmp(&key(scores[a])));
        let mut keep = vec![false; scores.len()];
        for &id in order.iter().take(k) {
            keep[id] = true;
        }
        Ok(self.retain_features(&keep))
    }

    /// Rebuild the feature index from `keep` and remap every example.
    fn retain_features(&mut self, keep: &[bool]) -> usize {
        let kept: Vec<usize> = (0..keep.len()).filter(|&id| keep[id]).collect();
        let removed = keep.len() - kept.len();
        if removed == 0 {
            return 0;
        }
        let mut remap: Vec<Option<usize>> = vec![None; keep.len()];
        for (new_id, &old_id) in kept.iter().enumerate() {
            remap[old_id] = Some(new_id);
        }
        self.feature_index = self.feature_index.retain_ids(&kept);

        for i in 0..self.data.len() {
            let old_vals = self.values.as_ref().map(|v| &v[i]);
            let mut new_row = Vec::with_capacity(self.data[i].len());
            let mut new_vals = Vec::new();
            for (j, &old_id) in self.data[i].iter().enumerate() {
                if let Some(new_id) = remap[old_id] {
                    new_row.push(new_id);
                    if let Some(v) = old_vals {
                        new_vals.push(v[j]);
                    }
                }
            }
            self.data[i] = new_row;
            if let Some(values) = self.values.as_mut() {
                values[i] = new_vals;
            }
        }
        log::info!("Pruned {removed} of {} features; {} remain", keep.len(), kept.len());
        removed
    }
}

/// `(c/n)·log2(c/n)`, with the `0·log 0 = 0` convention.
fn plogp(c: usize, n: usize) -> f64 {
    if c == 0 || n == 0 {
        return 0.0;
    }
    let p = c as f64 / n as f64;
    p * p.log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::datum::Datum;
    use approx::assert_abs_diff_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Full-match regex thresholds with first-rule-wins semantics.
    // - Global min/max count pruning on real-valued data (values follow ids).
    // - Information gain on a hand-computed example and top-k selection.
    // -------------------------------------------------------------------------

    fn prefixed() -> EncodedDataset<String, String> {
        let mut ds = EncodedDataset::new_binary();
        let rows = [
            (vec!["pre_a", "pre_b", "c"], "x"),
            (vec!["pre_a", "d"], "y"),
            (vec!["c", "d"], "x"),
        ];
        for (features, label) in rows {
            let features = features.into_iter().map(str::to_string);
            ds.add(Datum::binary(features, label.to_string())).unwrap();
        }
        ds
    }

    #[test]
    // Purpose
    // -------
    // Only features fully matching a rule are subject to its threshold;
    // unmatched features survive even with low counts.
    //
    // Given
    // -----
    // - Counts: pre_a=2, pre_b=1, c=2, d=2.
    // - Rules: ("pre", 5) which must NOT match "pre_a" as a substring,
    //   then ("pre_.*", 2).
    //
    // Expect
    // ------
    // - Only pre_b is removed; survivors keep relative order [pre_a, c, d].
    // - Example 0 becomes ids [0, 1] (pre_a, c).
    fn threshold_uses_full_match_and_first_rule() {
        // Arrange
        let mut ds = prefixed();
        let rules = vec![
            FeatureCountThreshold::new("pre", 5).unwrap(),
            FeatureCountThreshold::new("pre_.*", 2).unwrap(),
        ];

        // Act
        let removed = ds.apply_feature_count_threshold(&rules);

        // Assert
        assert_eq!(removed, 1);
        let names: Vec<&str> = ds.feature_index().iter().map(String::as_str).collect();
        assert_eq!(names, vec!["pre_a", "c", "d"]);
        assert_eq!(ds.features(0), &[0, 1]);
        assert_eq!(ds.features(1), &[0, 2]);
        assert_eq!(ds.features(2), &[1, 2]);
    }

    #[test]
    // Purpose
    // -------
    // A malformed pattern is reported instead of panicking.
    fn invalid_pattern_is_an_error() {
        let err = FeatureCountThreshold::new("(unclosed", 1).unwrap_err();
        assert!(matches!(err, DataError::InvalidPattern { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Min/max count pruning on real-valued data keeps values aligned with
    // their surviving ids.
    fn min_and_max_count_keep_values_aligned() {
        // Arrange
        let mut ds: EncodedDataset<&str, &str> = EncodedDataset::new_real_valued();
        ds.add(Datum::real_valued(vec![("a", 1.0), ("b", 2.0), ("c", 3.0)], "x")).unwrap();
        ds.add(Datum::real_valued(vec![("c", 4.0), ("a", 5.0)], "y")).unwrap();

        // Act
        let removed_min = ds.apply_min_count(2);

        // Assert
        assert_eq!(removed_min, 1);
        assert_eq!(ds.feature_index().as_slice(), &["a", "c"]);
        assert_eq!(ds.features(0), &[0, 1]);
        assert_eq!(ds.values(0), Some(&[1.0, 3.0][..]));
        assert_eq!(ds.features(1), &[1, 0]);
        assert_eq!(ds.values(1), Some(&[4.0, 5.0][..]));

        // Act
        let removed_max = ds.apply_max_count(1);

        // Assert
        assert_eq!(removed_max, 2);
        assert_eq!(ds.num_features(), 0);
        assert!(ds.features(0).is_empty());
        assert_eq!(ds.len(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Information gain matches a hand computation and selection keeps the
    // top-k with ties broken toward the lower id.
    //
    // Given
    // -----
    // - Examples: {a,b}→x, {b,c}→y, {a}→x.
    //   H(L) = 0.918296; a and c separate labels perfectly, b does not.
    //
    // Expect
    // ------
    // - IG(a) = IG(c) = H(L); IG(b) = H(L) − 2/3.
    // - select_features(1) keeps a (lower id among the tie).
    fn information_gain_and_top_k_selection() {
        // Arrange
        let mut ds: EncodedDataset<&str, &str> = EncodedDataset::new_binary();
        ds.add(Datum::binary(["a", "b"], "x")).unwrap();
        ds.add(Datum::binary(["b", "c"], "y")).unwrap();
        ds.add(Datum::binary(["a"], "x")).unwrap();
        let h = -(2.0_f64 / 3.0 * (2.0_f64 / 3.0).log2() + 1.0 / 3.0 * (1.0_f64 / 3.0).log2());

        // Act
        let gains = ds.information_gains();
        let removed = ds.select_features(1, &gains).unwrap();

        // Assert
        assert_abs_diff_eq!(gains[0], h, epsilon = 1e-12);
        assert_abs_diff_eq!(gains[1], h - 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(gains[2], h, epsilon = 1e-12);
        assert_eq!(removed, 2);
        assert_eq!(ds.feature_index().as_slice(), &["a"]);
        assert!(ds.features(1).is_empty());
    }

    #[test]
    // Purpose
    // -------
    // A feature present in every example carries no information.
    fn feature_in_every_example_scores_zero() {
        let mut ds: EncodedDataset<&str, &str> = EncodedDataset::new_binary();
        ds.add(Datum::binary(["bias", "a"], "x")).unwrap();
        ds.add(Datum::binary(["bias"], "y")).unwrap();
        assert_eq!(ds.information_gains()[0], 0.0);
    }

    #[test]
    fn select_features_rejects_wrong_score_length() {
        let mut ds = prefixed();
        assert!(matches!(
            ds.select_features(1, &[1.0]),
            Err(DataError::ScoreLengthMismatch { expected: 4, found: 1 })
        ));
    }
}
