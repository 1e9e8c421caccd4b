//! Table schemas.

use corvid_common::{CorvidError, Result, TypeId, Value};

/// A column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub type_id: TypeId,
    /// Whether NULL is allowed.
    pub nullable: bool,
    /// Value applied to freshly inserted rows.
    pub default: Option<Value>,
}

impl Column {
    /// Creates a nullable column with no default.
    pub fn new(name: impl Into<String>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
            nullable: true,
            default: None,
        }
    }

    /// Marks the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Ordered list of columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema from columns in declaration order.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column at `offset`.
    pub fn column(&self, offset: usize) -> Result<&Column> {
        self.columns.get(offset).ok_or(CorvidError::OutOfRange {
            offset,
            count: self.columns.len(),
        })
    }

    /// Finds a column offset by name (case-insensitive).
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CorvidError::ColumnNotFound(name.to_string()))
    }

    /// Checks that `value` may be stored in the column at `offset`.
    pub fn check_value(&self, offset: usize, value: &Value) -> Result<()> {
        let column = self.column(offset)?;
        if column.type_id.accepts(value.type_id()) {
            Ok(())
        } else {
            Err(CorvidError::TypeMismatch {
                expected: column.type_id.to_string(),
                actual: value.type_id().to_string(),
            })
        }
    }

    /// Checks a full row: one value per column, each of the column's type.
    pub fn check_row(&self, values: &[Value]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(CorvidError::InvalidState(format!(
                "schema has {} columns, row has {}",
                self.columns.len(),
                values.len()
            )));
        }
        for (offset, value) in values.iter().enumerate() {
            self.check_value(offset, value)?;
        }
        Ok(())
    }
}
