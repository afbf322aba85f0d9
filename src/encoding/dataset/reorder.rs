//! Splitting and seeded shuffling of encoded datasets.
//!
//! Shuffles are in-place Fisher–Yates over a seeded [`StdRng`]: for
//! `j = n-1 … 1`, draw `k` uniformly from `0..=j` and swap rows `j` and `k`.
//! [`EncodedDataset::shuffle_with_side_information`] applies the identical
//! swap sequence to a caller-owned list, so both stay aligned.
use std::hash::Hash;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::encoding::{
    dataset::EncodedDataset,
    errors::{DataError, DataResult},
};

impl<F: Eq + Hash + Clone, L: Eq + Hash + Clone> EncodedDataset<F, L> {
    /// Split into `(train, dev)` where dev holds rows `[start, end)` and
    /// train holds the rest, both in original order.
    ///
    /// # Errors
    /// - [`DataError::SplitOutOfRange`] unless `start <= end <= len()`.
    pub fn split_range(&self, start: usize, end: usize) -> DataResult<(Self, Self)> {
        let len = self.len();
        if start > end || end > len {
            return Err(DataError::SplitOutOfRange { start, end, len });
        }
        let train = self.subset((0..start).chain(end..len));
        let dev = self.subset(start..end);
        Ok((train, dev))
    }

    /// Split at `floor(p * len())` into `(first part, rest)`.
    ///
    /// # Errors
    /// - [`DataError::InvalidFraction`] unless `p` is finite and in `[0, 1]`.
    pub fn split_fraction(&self, p: f64) -> DataResult<(Self, Self)> {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(DataError::InvalidFraction { value: p });
        }
        let boundary = ((p * self.len() as f64).floor() as usize).min(self.len());
        self.split_range(boundary, self.len())
    }

    /// Shuffle rows in place with a deterministic seed.
    pub fn randomize(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for j in (1..self.len()).rev() {
            let k = rng.gen_range(0..=j);
            self.swap_rows(j, k);
        }
    }

    /// Shuffle rows and `side` with the same permutation.
    ///
    /// For a given seed the permutation equals the one produced by
    /// [`EncodedDataset::randomize`].
    ///
    /// # Errors
    /// - [`DataError::SideInformationLength`] if `side.len() != len()`; the
    ///   dataset is left untouched.
    pub fn shuffle_with_side_information<S>(&mut self, seed: u64, side: &mut [S]) -> DataResult<()> {
        if side.len() != self.len() {
            return Err(DataError::SideInformationLength { expected: self.len(), found: side.len() });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        for j in (1..self.len()).rev() {
            let k = rng.gen_range(0..=j);
            self.swap_rows(j, k);
            side.swap(j, k);
        }
        Ok(())
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        self.data.swap(a, b);
        self.labels.swap(a, b);
        if let Some(values) = self.values.as_mut() {
            values.swap(a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::datum::Datum;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Range and fraction splits (bounds, ordering, shared indexes).
    // - Seeded shuffles: determinism, permutation property, and side-list
    //   alignment.
    // -------------------------------------------------------------------------

    fn numbered(n: usize) -> EncodedDataset<String, usize> {
        let mut ds = EncodedDataset::new_real_valued();
        for i in 0..n {
            ds.add(Datum::real_valued(vec![(format!("f{i}"), i as f64 + 1.0)], i)).unwrap();
        }
        ds
    }

    #[test]
    // Purpose
    // -------
    // `split_range` returns dev = [start, end) and train = the rest.
    //
    // Given
    // -----
    // - Ten examples labeled 0..9.
    //
    // Expect
    // ------
    // - split_range(3, 6): dev labels [3, 4, 5], train [0, 1, 2, 6, 7, 8, 9].
    // - Both halves share the full vocabulary.
    fn split_range_partitions_in_order() {
        // Arrange
        let ds = numbered(10);

        // Act
        let (train, dev) = ds.split_range(3, 6).unwrap();

        // Assert
        let dev_labels: Vec<usize> = (0..dev.len()).map(|i| *dev.datum(i).unwrap().label()).collect();
        let train_labels: Vec<usize> =
            (0..train.len()).map(|i| *train.datum(i).unwrap().label()).collect();
        assert_eq!(dev_labels, vec![3, 4, 5]);
        assert_eq!(train_labels, vec![0, 1, 2, 6, 7, 8, 9]);
        assert_eq!(train.num_features(), 10);
        assert_eq!(dev.values(0), Some(&[4.0][..]));
    }

    #[test]
    // Purpose
    // -------
    // Invalid bounds and fractions are errors.
    fn split_rejects_bad_bounds_and_fractions() {
        let ds = numbered(4);
        assert!(matches!(ds.split_range(3, 2), Err(DataError::SplitOutOfRange { .. })));
        assert!(matches!(ds.split_range(0, 5), Err(DataError::SplitOutOfRange { .. })));
        assert!(matches!(ds.split_fraction(1.5), Err(DataError::InvalidFraction { .. })));
        assert!(matches!(ds.split_fraction(f64::NAN), Err(DataError::InvalidFraction { .. })));
    }

    #[test]
    // Purpose
    // -------
    // `split_fraction(p)` puts the first floor(p·n) rows in the first part.
    fn split_fraction_uses_floor_boundary() {
        let ds = numbered(10);
        let (first, rest) = ds.split_fraction(0.75).unwrap();
        assert_eq!(first.len(), 7);
        assert_eq!(rest.len(), 3);
        assert_eq!(*rest.datum(0).unwrap().label(), 7);
    }

    #[test]
    // Purpose
    // -------
    // Shuffling is a seeded permutation, and the side list follows the same
    // permutation as `randomize` with the same seed.
    //
    // Given
    // -----
    // - Ten examples with label i and one feature of value i + 1.
    // - Side list [0, 1, ..., 9].
    //
    // Expect
    // ------
    // - After shuffle_with_side_information(42), side[i] == label(i) and the
    //   value still matches the label.
    // - randomize(42) on a fresh copy yields the same label order.
    // - Labels form a permutation of 0..9.
    fn shuffle_keeps_rows_and_side_information_aligned() {
        // Arrange
        let mut ds = numbered(10);
        let mut twin = numbered(10);
        let mut side: Vec<usize> = (0..10).collect();

        // Act
        ds.shuffle_with_side_information(42, &mut side).unwrap();
        twin.randomize(42);

        // Assert
        let labels: Vec<usize> = (0..10).map(|i| *ds.datum(i).unwrap().label()).collect();
        let twin_labels: Vec<usize> = (0..10).map(|i| *twin.datum(i).unwrap().label()).collect();
        assert_eq!(labels, side);
        assert_eq!(labels, twin_labels);
        for i in 0..10 {
            let d = ds.datum(i).unwrap();
            assert_eq!(d.features()[0].1, *d.label() as f64 + 1.0);
        }
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn shuffle_rejects_mismatched_side_information() {
        let mut ds = numbered(3);
        let mut side = vec![0_u8; 2];
        assert_eq!(
            ds.shuffle_with_side_information(1, &mut side),
            Err(DataError::SideInformationLength { expected: 3, found: 2 })
        );
    }
}
