//! Row identifiers.

/// Stable address of a row within a table.
///
/// A row keeps its identifier for its whole lifetime, independent of its
/// position in any index or selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

impl RowId {
    /// Invalid row ID.
    pub const INVALID: RowId = RowId(u64::MAX);

    /// Creates a new row ID.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns true if this is a valid row ID.
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl From<u64> for RowId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_id_validity() {
        assert!(RowId::new(0).is_valid());
        assert!(RowId::new(42).is_valid());
        assert!(!RowId::INVALID.is_valid());
    }

    #[test]
    fn test_row_id_ordering() {
        assert!(RowId(1) < RowId(2));
        assert_eq!(RowId::from(7), RowId::new(7));
        assert_eq!(RowId(9).get(), 9);
    }

    #[test]
    fn test_row_id_display() {
        assert_eq!(RowId(17).to_string(), "#17");
    }
}
