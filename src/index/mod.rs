//! Fixed lookup structures.

pub mod sorted_set;

pub use sorted_set::SortedSet;
