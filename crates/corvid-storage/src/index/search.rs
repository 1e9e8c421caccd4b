//! Search results for sorted index lookups.

/// Window size (in elements) at which binary search hands over to a linear
/// scan.
pub(crate) const LINEAR_SCAN_WINDOW: usize = 5;

/// Outcome of a single-bound search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    /// An element comparing equal to the key sits at this ordinal.
    Found(usize),
    /// No element compares equal; inserting at this ordinal keeps the index
    /// ordered.
    NotFound(usize),
}

impl SearchResult {
    /// Returns true if the key was found.
    pub fn is_found(&self) -> bool {
        matches!(self, SearchResult::Found(_))
    }

    /// Returns the matching ordinal, if found.
    pub fn found(&self) -> Option<usize> {
        match self {
            SearchResult::Found(pos) => Some(*pos),
            SearchResult::NotFound(_) => None,
        }
    }

    /// Returns the insertion point, if not found.
    pub fn insertion_point(&self) -> Option<usize> {
        match self {
            SearchResult::Found(_) => None,
            SearchResult::NotFound(pos) => Some(*pos),
        }
    }
}

/// Outcome of a search for both ends of an equal-key run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRange {
    /// Elements `first..=last` all compare equal to the key.
    Found { first: usize, last: usize },
    /// No element compares equal; the key belongs at this ordinal.
    NotFound(usize),
}

impl SearchRange {
    /// Returns true if the key was found.
    pub fn is_found(&self) -> bool {
        matches!(self, SearchRange::Found { .. })
    }

    /// Returns the run as a half-open range, empty when not found.
    pub fn as_range(&self) -> std::ops::Range<usize> {
        match self {
            SearchRange::Found { first, last } => *first..*last + 1,
            SearchRange::NotFound(pos) => *pos..*pos,
        }
    }

    /// Number of elements in the run.
    pub fn len(&self) -> usize {
        self.as_range().len()
    }

    /// Returns true if the run is empty.
    pub fn is_empty(&self) -> bool {
        !self.is_found()
    }
}
