//! Lazily fetched table rows.

use crate::table::Table;
use corvid_common::{CorvidError, Result, Value};
use corvid_storage::RowId;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct CachedValue {
    value: Value,
    /// Set explicitly by the caller, as opposed to fetched from the table.
    dirty: bool,
}

/// A row identifier plus a local cache of column values.
///
/// Columns are fetched from the table on first read. A column that has not
/// been fetched is distinct from one explicitly set to NULL.
#[derive(Debug, Clone)]
pub struct TableRow {
    id: RowId,
    width: usize,
    cells: BTreeMap<usize, CachedValue>,
}

impl TableRow {
    /// Creates a row with nothing cached.
    pub fn new(id: RowId, width: usize) -> Self {
        Self {
            id,
            width,
            cells: BTreeMap::new(),
        }
    }

    /// Creates a row with every column cached and clean.
    pub fn from_values(id: RowId, values: Vec<Value>) -> Self {
        let width = values.len();
        let cells = values
            .into_iter()
            .enumerate()
            .map(|(column, value)| (column, CachedValue { value, dirty: false }))
            .collect();
        Self { id, width, cells }
    }

    /// The row identifier.
    pub fn id(&self) -> RowId {
        self.id
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    fn check_column(&self, column: usize) -> Result<()> {
        if column >= self.width {
            return Err(CorvidError::OutOfRange {
                offset: column,
                count: self.width,
            });
        }
        Ok(())
    }

    /// Sets a column value and marks it dirty.
    pub fn set(&mut self, column: usize, value: Value) -> Result<()> {
        self.check_column(column)?;
        self.cells.insert(column, CachedValue { value, dirty: true });
        Ok(())
    }

    /// Returns a column value, fetching it from `table` if not cached.
    ///
    /// Rows the table does not hold (fresh inserts) read unset columns as
    /// NULL.
    pub fn get<T: Table + ?Sized>(&mut self, column: usize, table: &T) -> Result<Value> {
        self.check_column(column)?;
        if let Some(cached) = self.cells.get(&column) {
            return Ok(cached.value.clone());
        }
        let value = if table.row_exists(self.id) {
            table.value(self.id, column)?
        } else {
            Value::Null
        };
        self.cells.insert(
            column,
            CachedValue {
                value: value.clone(),
                dirty: false,
            },
        );
        Ok(value)
    }

    /// Returns a cached value without fetching.
    pub fn cached(&self, column: usize) -> Option<&Value> {
        self.cells.get(&column).map(|c| &c.value)
    }

    /// Returns true if the column has been fetched or set.
    pub fn is_fetched(&self, column: usize) -> bool {
        self.cells.contains_key(&column)
    }

    /// Returns true if the column was set explicitly.
    pub fn is_dirty(&self, column: usize) -> bool {
        self.cells.get(&column).is_some_and(|c| c.dirty)
    }

    /// Columns set explicitly, with their values, in column order.
    pub fn dirty_columns(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.cells
            .iter()
            .filter(|(_, c)| c.dirty)
            .map(|(column, c)| (*column, &c.value))
    }

    /// Fetches every column and returns the full value vector.
    pub fn materialize<T: Table + ?Sized>(&mut self, table: &T) -> Result<Vec<Value>> {
        (0..self.width).map(|column| self.get(column, table)).collect()
    }
}
