//! Sorted index engine.
//!
//! This module provides:
//! - SortedIndex: comparator-ordered multiset of fixed-width elements over a
//!   byte store, with boundary-seeking binary search and duplicate support
//! - IndexCursor: bounded cursor that can remove through itself
//! - SearchResult / SearchRange: explicit found / insertion-point results

mod cursor;
mod search;
mod sorted;

pub use cursor::{Direction, IndexCursor};
pub use search::{SearchRange, SearchResult};
pub use sorted::SortedIndex;
