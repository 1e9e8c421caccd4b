//! Column values.

use crate::types::TypeId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single column value.
///
/// Values carry a total order so they can serve as secondary index keys:
/// NULL sorts first, then booleans, numbers (integers and floats compared
/// numerically), text, binary and timestamps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Varchar(String),
    Binary(Vec<u8>),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
}

impl Value {
    /// Returns the type identifier of this value.
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null => TypeId::Null,
            Value::Boolean(_) => TypeId::Boolean,
            Value::Int64(_) => TypeId::Int64,
            Value::Float64(_) => TypeId::Float64,
            Value::Varchar(_) => TypeId::Varchar,
            Value::Binary(_) => TypeId::Binary,
            Value::Timestamp(_) => TypeId::Timestamp,
        }
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) | Value::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int64(_) | Value::Float64(_) => 2,
            Value::Varchar(_) => 3,
            Value::Binary(_) => 4,
            Value::Timestamp(_) => 5,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::Int64(a), Value::Float64(b)) => (*a as f64).total_cmp(b),
            (Value::Float64(a), Value::Int64(b)) => a.total_cmp(&(*b as f64)),
            (Value::Varchar(a), Value::Varchar(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Varchar(v) => write!(f, "'{}'", v),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Value::Timestamp(v) => write!(f, "ts:{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Varchar(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Varchar(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_sorts_first() {
        assert!(Value::Null < Value::Boolean(false));
        assert!(Value::Null < Value::Int64(i64::MIN));
        assert!(Value::Null < Value::from(""));
    }

    #[test]
    fn test_numeric_cross_type_ordering() {
        assert_eq!(Value::Int64(2), Value::Float64(2.0));
        assert!(Value::Int64(2) < Value::Float64(2.5));
        assert!(Value::Float64(-1.5) < Value::Int64(-1));
    }

    #[test]
    fn test_text_ordering() {
        assert!(Value::from("a") < Value::from("b"));
        assert!(Value::from("ab") > Value::from("a"));
        assert_eq!(Value::from("x"), Value::Varchar("x".to_string()));
    }

    #[test]
    fn test_type_rank_ordering() {
        assert!(Value::Boolean(true) < Value::Int64(0));
        assert!(Value::Int64(i64::MAX) < Value::from("0"));
        assert!(Value::from("zzz") < Value::Binary(vec![0]));
        assert!(Value::Binary(vec![255]) < Value::Timestamp(0));
    }

    #[test]
    fn test_type_id() {
        assert_eq!(Value::Null.type_id(), TypeId::Null);
        assert_eq!(Value::from(3i64).type_id(), TypeId::Int64);
        assert_eq!(Value::from("s").type_id(), TypeId::Varchar);
        assert_eq!(Value::Timestamp(1).type_id(), TypeId::Timestamp);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::Int64(5).as_i64(), Some(5));
        assert_eq!(Value::Null.as_i64(), None);
        assert!(Value::Null.is_null());
        assert!(!Value::Int64(0).is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from("a").to_string(), "'a'");
        assert_eq!(Value::Binary(vec![1, 2]).to_string(), "<2 bytes>");
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = Value::Varchar("hello".to_string());
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(original, deserialized);
    }
}
