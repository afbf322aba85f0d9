//! index — dense bijection between values and contiguous ids.
//!
//! Purpose
//! -------
//! Map arbitrary hashable values (feature names, class labels) to ids
//! `0..len` in insertion order, and back. Datasets and models only ever
//! store ids; the [`Index`] is the single place where names live.
//!
//! Key behaviors
//! -------------
//! - `add` returns the existing id for known values and appends new ones.
//! - A locked index never grows: `add` of an unseen value yields `None`.
//! - `from_values` rebuilds an index from an ordered list and rejects
//!   duplicates, which is how deserialized models restore their names.
//!
//! Invariants & assumptions
//! ------------------------
//! - `get(index_of(v)) == v` for every stored value.
//! - Ids are dense and stable: adding never renumbers existing values.
//! - Only [`Index::retain_ids`] (used by feature pruning) produces a
//!   renumbered index, and it preserves the relative order of survivors.
use std::{borrow::Borrow, collections::HashMap, hash::Hash};

use crate::encoding::errors::{DataError, DataResult};

/// Insertion-ordered value ↔ id bijection with an optional lock.
#[derive(Debug, Clone)]
pub struct Index<T> {
    objects: Vec<T>,
    ids: HashMap<T, usize>,
    locked: bool,
}

impl<T: Eq + Hash + Clone> Index<T> {
    /// Empty, unlocked index.
    pub fn new() -> Self {
        Self { objects: Vec::new(), ids: HashMap::new(), locked: false }
    }

    /// Build an index from an ordered list of distinct values.
    ///
    /// The resulting index is unlocked; position `i` in `values` becomes id `i`.
    ///
    /// # Errors
    /// - [`DataError::DuplicateIndexEntry`] with the position of the first repeat.
    pub fn from_values<I: IntoIterator<Item = T>>(values: I) -> DataResult<Self> {
        let mut index = Self::new();
        for (position, value) in values.into_iter().enumerate() {
            if index.ids.contains_key(&value) {
                return Err(DataError::DuplicateIndexEntry { position });
            }
            index.push(value);
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Return the id of `value`, inserting it if the index is unlocked.
    ///
    /// Returns `None` only when `value` is unseen and the index is locked.
    pub fn add(&mut self, value: T) -> Option<usize> {
        self.try_add(value).ok()
    }

    /// Like [`Index::add`], but hands the rejected value back when locked.
    pub fn try_add(&mut self, value: T) -> Result<usize, T> {
        if let Some(&id) = self.ids.get(&value) {
            return Ok(id);
        }
        if self.locked {
            return Err(value);
        }
        Ok(self.push(value))
    }

    /// Add every value in order; returns how many were newly inserted.
    pub fn add_all<I: IntoIterator<Item = T>>(&mut self, values: I) -> usize {
        let before = self.len();
        for value in values {
            self.add(value);
        }
        self.len() - before
    }

    /// Id of `value`, if present. Never inserts.
    pub fn index_of<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ids.get(value).copied()
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ids.contains_key(value)
    }

    /// Value stored under `id`.
    ///
    /// # Panics
    /// Panics if `id >= self.len()`.
    pub fn get(&self, id: usize) -> &T {
        &self.objects[id]
    }

    pub fn try_get(&self, id: usize) -> Option<&T> {
        self.objects.get(id)
    }

    /// Values in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.objects.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.objects
    }

    pub fn into_values(self) -> Vec<T> {
        self.objects
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// New index holding only the values at `kept` ids, renumbered densely.
    ///
    /// `kept` must be strictly increasing; the lock state carries over.
    pub fn retain_ids(&self, kept: &[usize]) -> Self {
        let mut out = Self::new();
        for &id in kept {
            out.push(self.objects[id].clone());
        }
        out.locked = self.locked;
        out
    }

    fn push(&mut self, value: T) -> usize {
        let id = self.objects.len();
        self.ids.insert(value.clone(), id);
        self.objects.push(value);
        id
    }
}

impl<T: Eq + Hash + Clone> Default for Index<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> PartialEq for Index<T> {
    fn eq(&self, other: &Self) -> bool {
        self.locked == other.locked && self.objects == other.objects
    }
}

impl<'a, T> IntoIterator for &'a Index<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for Index<T> {
    /// Collect into an unlocked index, silently merging repeats.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut index = Self::new();
        index.add_all(iter);
        index
    }
}
