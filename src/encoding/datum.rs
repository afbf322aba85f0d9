//! Unencoded training/test examples.
//!
//! A [`Datum`] is a bag of `(feature, value)` pairs plus one gold label.
//! Binary features use value `1.0`; [`Datum::binary`] builds those directly.
//! Encoding into ids happens when the datum is handed to
//! [`EncodedDataset::add`](crate::encoding::dataset::EncodedDataset::add).

/// One example: weighted features and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum<F, L> {
    pub features: Vec<(F, f64)>,
    pub label: L,
}

impl<F, L> Datum<F, L> {
    /// Datum whose features all carry value `1.0`.
    pub fn binary<I: IntoIterator<Item = F>>(features: I, label: L) -> Self {
        Self { features: features.into_iter().map(|f| (f, 1.0)).collect(), label }
    }

    pub fn real_valued(features: Vec<(F, f64)>, label: L) -> Self {
        Self { features, label }
    }

    pub fn features(&self) -> &[(F, f64)] {
        &self.features
    }

    pub fn label(&self) -> &L {
        &self.label
    }

    /// True if every feature value is exactly `1.0`.
    pub fn is_binary(&self) -> bool {
        self.features.iter().all(|&(_, v)| v == 1.0)
    }
}

/// Attach value `1.0` to each feature, for scoring binary inputs.
pub fn binary_features<F: Clone>(features: &[F]) -> Vec<(F, f64)> {
    features.iter().map(|f| (f.clone(), 1.0)).collect()
}
