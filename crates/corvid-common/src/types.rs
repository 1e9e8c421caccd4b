//! Column type identifiers for CorvidDB.

use serde::{Deserialize, Serialize};

/// Identifier for the column types a table schema can declare.
///
/// Arbitrary-precision numerics are handled above this layer; a column of
/// such a type is stored as `Varchar` or `Binary` by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TypeId {
    Null = 0,
    Boolean = 1,
    Int64 = 13,
    Float64 = 31,
    Varchar = 51,
    Binary = 60,
    Timestamp = 72,
}

impl TypeId {
    /// Returns the fixed byte size for this type, or None for variable-length types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeId::Null => Some(0),
            TypeId::Boolean => Some(1),
            TypeId::Int64 | TypeId::Float64 | TypeId::Timestamp => Some(8),
            TypeId::Varchar | TypeId::Binary => None,
        }
    }

    /// Returns true if this type is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeId::Int64 | TypeId::Float64)
    }

    /// Returns true if a value of type `other` may be stored in a column of
    /// this type without conversion.
    pub fn accepts(&self, other: TypeId) -> bool {
        *self == other || other == TypeId::Null
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeId::Null => "NULL",
            TypeId::Boolean => "BOOLEAN",
            TypeId::Int64 => "INT64",
            TypeId::Float64 => "FLOAT64",
            TypeId::Varchar => "VARCHAR",
            TypeId::Binary => "BINARY",
            TypeId::Timestamp => "TIMESTAMP",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_size() {
        assert_eq!(TypeId::Null.fixed_size(), Some(0));
        assert_eq!(TypeId::Boolean.fixed_size(), Some(1));
        assert_eq!(TypeId::Int64.fixed_size(), Some(8));
        assert_eq!(TypeId::Float64.fixed_size(), Some(8));
        assert_eq!(TypeId::Timestamp.fixed_size(), Some(8));
        assert_eq!(TypeId::Varchar.fixed_size(), None);
        assert_eq!(TypeId::Binary.fixed_size(), None);
    }

    #[test]
    fn test_accepts() {
        assert!(TypeId::Int64.accepts(TypeId::Int64));
        assert!(TypeId::Int64.accepts(TypeId::Null));
        assert!(!TypeId::Int64.accepts(TypeId::Varchar));
        assert!(!TypeId::Varchar.accepts(TypeId::Binary));
    }

    #[test]
    fn test_is_numeric() {
        assert!(TypeId::Int64.is_numeric());
        assert!(TypeId::Float64.is_numeric());
        assert!(!TypeId::Varchar.is_numeric());
        assert!(!TypeId::Timestamp.is_numeric());
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeId::Null.to_string(), "NULL");
        assert_eq!(TypeId::Int64.to_string(), "INT64");
        assert_eq!(TypeId::Varchar.to_string(), "VARCHAR");
        assert_eq!(TypeId::Timestamp.to_string(), "TIMESTAMP");
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = TypeId::Timestamp;
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: TypeId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
