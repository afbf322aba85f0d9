//! Weight introspection for [`LinearModel`].
//!
//! Read-only views over the weight matrix: ranked `(feature, label)`
//! entries, a histogram of weight values, the per-feature breakdown of one
//! score, and the weight row of a single feature.
use std::{cmp::Ordering, hash::Hash};

use crate::classifier::linear::LinearModel;

/// Filter and ordering for [`LinearModel::top_features`].
///
/// - `labels`: restrict to these labels (`None` keeps all; unknown labels
///   are ignored).
/// - `min_magnitude`: drop entries with `|w| < min_magnitude`.
/// - `by_magnitude`: rank by `|w|` instead of the signed weight.
/// - `limit`: keep at most this many entries after sorting.
/// - `descending`: largest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TopFeatureQuery<L> {
    pub labels: Option<Vec<L>>,
    pub min_magnitude: f64,
    pub by_magnitude: bool,
    pub limit: Option<usize>,
    pub descending: bool,
}

impl<L> Default for TopFeatureQuery<L> {
    fn default() -> Self {
        Self { labels: None, min_magnitude: 0.0, by_magnitude: true, limit: None, descending: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightEntry<'a, F, L> {
    pub feature: &'a F,
    pub label: &'a L,
    pub weight: f64,
}

/// One equal-width bin; `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureContribution<F> {
    pub feature: F,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Why a label got its score: `total == threshold + Σ contributions`.
#[derive(Debug, Clone, PartialEq)]
pub struct Justification<F> {
    /// Known features, largest `|contribution|` first.
    pub contributions: Vec<FeatureContribution<F>>,
    pub threshold: f64,
    pub total: f64,
}

impl<F: Eq + Hash + Clone, L: Eq + Hash + Clone> LinearModel<F, L> {
    /// Weights matching `query`, sorted.
    ///
    /// Ties are ordered by feature id, then label id, so the result is
    /// deterministic.
    pub fn top_features(&self, query: &TopFeatureQuery<L>) -> Vec<WeightEntry<'_, F, L>> {
        let label_ids: Vec<usize> = match &query.labels {
            Some(labels) => {
                let mut ids: Vec<usize> =
                    labels.iter().filter_map(|l| self.label_index.index_of(l)).collect();
                ids.sort_unstable();
                ids.dedup();
                ids
            }
            None => (0..self.num_labels()).collect(),
        };

        let key = |w: f64| if query.by_magnitude { w.abs() } else { w };
        let mut ranked: Vec<(usize, usize, f64)> = Vec::new();
        for f in 0..self.num_features() {
            for &c in &label_ids {
                let w = self.weights[[f, c]];
                if w.abs() >= query.min_magnitude {
                    ranked.push((f, c, w));
                }
            }
        }
        ranked.sort_by(|a, b| {
            let by_key = key(a.2).partial_cmp(&key(b.2)).unwrap_or(Ordering::Equal);
            let by_key = if query.descending { by_key.reverse() } else { by_key };
            by_key.then(a.0.cmp(&b.0)).then(a.1.cmp(&b.1))
        });
        if let Some(limit) = query.limit {
            ranked.truncate(limit);
        }
        ranked
            .into_iter()
            .map(|(f, c, weight)| WeightEntry {
                feature: self.feature_index.get(f),
                label: self.label_index.get(c),
                weight,
            })
            .collect()
    }

    /// Histogram of all weights in `bins` equal-width bins over `[min, max]`.
    ///
    /// Returns an empty vector for `bins == 0` or an empty matrix. When every
    /// weight is equal, the single range collapses and all counts land in
    /// the first bin.
    pub fn weight_histogram(&self, bins: usize) -> Vec<HistogramBin> {
        if bins == 0 || self.weights.is_empty() {
            return Vec::new();
        }
        let min = self.weights.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / bins as f64;
        let mut histogram: Vec<HistogramBin> = (0..bins)
            .map(|b| HistogramBin {
                lower: min + width * b as f64,
                upper: if b + 1 == bins { max } else { min + width * (b + 1) as f64 },
                count: 0,
            })
            .collect();
        for &w in &self.weights {
            let bin = if width > 0.0 { (((w - min) / width) as usize).min(bins - 1) } else { 0 };
            histogram[bin].count += 1;
        }
        histogram
    }

    /// Per-feature breakdown of `score_of(features, label)`.
    ///
    /// Repeated features are merged; unknown features are omitted. Returns
    /// `None` for an unknown label.
    pub fn justification_of(&self, features: &[(F, f64)], label: &L) -> Option<Justification<F>> {
        let c = self.label_index.index_of(label)?;
        let mut contributions: Vec<FeatureContribution<F>> = Vec::new();
        let mut position: Vec<Option<usize>> = vec![None; self.num_features()];
        for (feature, value) in features {
            let Some(f) = self.feature_index.index_of(feature) else { continue };
            let weight = self.weights[[f, c]];
            match position[f] {
                Some(p) => {
                    contributions[p].value += value;
                    contributions[p].contribution += weight * value;
                }
                None => {
                    position[f] = Some(contributions.len());
                    contributions.push(FeatureContribution {
                        feature: feature.clone(),
                        value: *value,
                        weight,
                        contribution: weight * value,
                    });
                }
            }
        }
        contributions.sort_by(|a, b| {
            b.contribution.abs().partial_cmp(&a.contribution.abs()).unwrap_or(Ordering::Equal)
        });
        let threshold = self.thresholds[c];
        let total = threshold + contributions.iter().map(|fc| fc.contribution).sum::<f64>();
        Some(Justification { contributions, threshold, total })
    }

    /// Weight of `feature` for every label, or `None` if it is unknown.
    pub fn feature_weights(&self, feature: &F) -> Option<Vec<(L, f64)>> {
        let f = self.feature_index.index_of(feature)?;
        Some(self.label_index.iter().cloned().zip(self.weights.row(f).iter().copied()).collect())
    }
}
