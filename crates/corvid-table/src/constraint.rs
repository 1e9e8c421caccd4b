//! Integrity and default-value hooks applied by the mutation protocol.

use crate::row::TableRow;
use crate::schema::Schema;
use crate::table::Table;
use corvid_common::{CorvidError, Result, Value};
use corvid_storage::RowId;

/// Kind of write a check is asked to approve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
}

/// The full row a pending write would store.
#[derive(Debug, Clone, Copy)]
pub struct RowImage<'a> {
    pub id: RowId,
    pub kind: WriteKind,
    pub values: &'a [Value],
}

/// A check run before a pending insert or update touches the table.
///
/// Returning an error aborts the commit with nothing written.
pub trait ConstraintCheck: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, table: &dyn Table, row: &RowImage<'_>) -> Result<()>;
}

/// Rejects NULL in columns declared NOT NULL.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotNullCheck;

impl ConstraintCheck for NotNullCheck {
    fn name(&self) -> &str {
        "not_null"
    }

    fn check(&self, table: &dyn Table, row: &RowImage<'_>) -> Result<()> {
        for (column, value) in table.schema().columns().iter().zip(row.values) {
            if !column.nullable && value.is_null() {
                return Err(CorvidError::ConstraintViolation(format!(
                    "column {} of table {} may not be NULL",
                    column.name,
                    table.name()
                )));
            }
        }
        Ok(())
    }
}

/// Fills a freshly created row before the caller sets any value.
pub trait DefaultValues: std::fmt::Debug + Send + Sync {
    fn apply(&self, schema: &Schema, row: &mut TableRow) -> Result<()>;
}

/// Applies each column's declared default.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaDefaults;

impl DefaultValues for SchemaDefaults {
    fn apply(&self, schema: &Schema, row: &mut TableRow) -> Result<()> {
        for (offset, column) in schema.columns().iter().enumerate() {
            if let Some(default) = &column.default {
                schema.check_value(offset, default)?;
                row.set(offset, default.clone())?;
            }
        }
        Ok(())
    }
}

/// Leaves new rows empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDefaults;

impl DefaultValues for NoDefaults {
    fn apply(&self, _schema: &Schema, _row: &mut TableRow) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use crate::table::MemTable;
    use corvid_common::TypeId;

    fn accounts() -> MemTable {
        MemTable::new(
            "accounts",
            Schema::new(vec![
                Column::new("id", TypeId::Int64).not_null(),
                Column::new("note", TypeId::Varchar),
                Column::new("active", TypeId::Boolean).with_default(true),
            ]),
        )
    }

    fn image(values: &[Value]) -> RowImage<'_> {
        RowImage {
            id: RowId(1),
            kind: WriteKind::Insert,
            values,
        }
    }

    #[test]
    fn test_not_null_check() {
        let table = accounts();
        let ok = vec![Value::Int64(1), Value::Null, Value::Boolean(true)];
        let bad = vec![Value::Null, Value::from("x"), Value::Boolean(true)];
        assert!(NotNullCheck.check(&table, &image(&ok)).is_ok());
        assert!(matches!(
            NotNullCheck.check(&table, &image(&bad)),
            Err(CorvidError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_schema_defaults() {
        let table = accounts();
        let mut row = TableRow::new(RowId(1), 3);
        SchemaDefaults.apply(table.schema(), &mut row).unwrap();
        assert_eq!(row.cached(2), Some(&Value::Boolean(true)));
        assert!(!row.is_fetched(0));

        let mut bare = TableRow::new(RowId(2), 3);
        NoDefaults.apply(table.schema(), &mut bare).unwrap();
        assert!(!bare.is_fetched(2));
    }

    #[test]
    fn test_mistyped_default_is_rejected() {
        let schema = Schema::new(vec![Column::new("n", TypeId::Int64).with_default("oops")]);
        let mut row = TableRow::new(RowId(1), 1);
        assert!(matches!(
            SchemaDefaults.apply(&schema, &mut row),
            Err(CorvidError::TypeMismatch { .. })
        ));
        assert!(!row.is_fetched(0));
    }
}
