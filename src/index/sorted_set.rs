//! Immutable sorted-array set.
//!
//! A `SortedSet` is built once and never mutated, so it can be shared
//! between readers without synchronization. Membership and rank lookups
//! are binary searches over the backing slice.
//!
//! ```
//! use graph_ogm::index::SortedSet;
//!
//! let set = SortedSet::new(vec!["b", "a", "c"]);
//! assert_eq!(set.get(1), Some(&"b"));
//! assert!(set.contains(&"c"));
//! assert_eq!(set.index_of(&"z"), None);
//! ```
//!
//! Duplicates are not rejected. With duplicates present, `index_of` returns
//! *some* matching position, not necessarily the lowest one.

use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortedSet<T> {
    data: Box<[T]>,
}

impl<T: Ord> SortedSet<T> {
    /// Take ownership of `data` and sort it in place.
    pub fn new(mut data: Vec<T>) -> Self {
        data.sort();
        Self { data: data.into_boxed_slice() }
    }

    /// Copy a caller-owned slice, then sort the copy. `data` is left untouched.
    pub fn from_slice(data: &[T]) -> Self
    where
        T: Clone,
    {
        Self::new(data.to_vec())
    }

    pub fn contains(&self, x: &T) -> bool {
        self.data.binary_search(x).is_ok()
    }

    /// Sorted rank of `x`, or `None` when absent.
    pub fn index_of(&self, x: &T) -> Option<usize> {
        self.data.binary_search(x).ok()
    }

    /// Membership test against a borrowed form, e.g. `&str` for a `SortedSet<String>`.
    pub fn contains_by<Q>(&self, x: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.index_of_by(x).is_some()
    }

    pub fn index_of_by<Q>(&self, x: &Q) -> Option<usize>
    where
        T: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.data.binary_search_by(|probe| probe.borrow().cmp(x)).ok()
    }
}

impl<T> SortedSet<T> {
    pub fn get(&self, i: usize) -> Option<&T> {
        self.data.get(i)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Default for SortedSet<T> {
    fn default() -> Self {
        Self { data: Box::default() }
    }
}

impl<T> Index<usize> for SortedSet<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T: Ord> FromIterator<T> for SortedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a SortedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}
