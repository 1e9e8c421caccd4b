//! Table traits and the in-memory reference table.

use crate::row::TableRow;
use crate::schema::Schema;
use corvid_common::{CorvidError, Result, Value};
use corvid_storage::RowId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Read access to a table of rows addressed by `RowId`.
pub trait Table {
    /// Table name, used to look up its secondary indexes.
    fn name(&self) -> &str;

    fn schema(&self) -> &Schema;

    /// Number of rows.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn row_exists(&self, id: RowId) -> bool;

    /// Returns a lazily fetched handle for the row, or None if absent.
    fn get_row(&self, id: RowId) -> Option<TableRow>;

    /// All row ids in table order.
    fn row_ids(&self) -> Vec<RowId>;

    /// Reads one column of a row.
    fn value(&self, id: RowId, column: usize) -> Result<Value>;

    /// Reads every column of a row.
    fn row_values(&self, id: RowId) -> Result<Vec<Value>> {
        (0..self.schema().len())
            .map(|column| self.value(id, column))
            .collect()
    }
}

/// Write access with a single pending unit of work.
///
/// `commit` makes pending changes durable; `undo` discards what the table is
/// able to discard. Deleted rows are gone as soon as `delete` returns.
pub trait MutableTable: Table {
    /// Reserves a fresh row id and returns an empty row for it.
    fn new_row(&mut self) -> TableRow;

    /// Stores a row built by `new_row`. Columns never set read as NULL.
    fn insert(&mut self, row: &TableRow) -> Result<()>;

    /// Applies the row's dirty columns to the stored row.
    fn update(&mut self, row: &TableRow) -> Result<()>;

    fn delete(&mut self, id: RowId) -> Result<()>;

    fn commit(&mut self);

    fn undo(&mut self);
}

/// A table shared between views and callers.
pub type SharedTable<T> = Arc<RwLock<T>>;

/// In-memory table keyed by `RowId`.
#[derive(Debug, Clone)]
pub struct MemTable {
    name: String,
    schema: Schema,
    rows: BTreeMap<RowId, Vec<Value>>,
    next_id: u64,
    /// Id handed out by `new_row` and not yet committed.
    staged: Option<RowId>,
}

impl MemTable {
    /// Creates an empty table. Row ids start at 1.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: BTreeMap::new(),
            next_id: 1,
            staged: None,
        }
    }

    /// Wraps the table for sharing.
    pub fn shared(self) -> SharedTable<Self> {
        Arc::new(RwLock::new(self))
    }

    /// Stores a complete row outside any unit of work and returns its id.
    pub fn load(&mut self, values: Vec<Value>) -> Result<RowId> {
        self.schema.check_row(&values)?;
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.insert(id, values);
        Ok(id)
    }

    /// Id the next `new_row` will hand out.
    pub fn next_row_id(&self) -> RowId {
        RowId(self.next_id)
    }

    /// Stored rows in id order.
    pub fn rows(&self) -> impl Iterator<Item = (RowId, &[Value])> {
        self.rows.iter().map(|(id, values)| (*id, values.as_slice()))
    }

    fn stored(&self, id: RowId) -> Result<&Vec<Value>> {
        self.rows.get(&id).ok_or(CorvidError::RowNotFound(id.get()))
    }
}

impl Table for MemTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn row_exists(&self, id: RowId) -> bool {
        self.rows.contains_key(&id)
    }

    fn get_row(&self, id: RowId) -> Option<TableRow> {
        self.row_exists(id)
            .then(|| TableRow::new(id, self.schema.len()))
    }

    fn row_ids(&self) -> Vec<RowId> {
        self.rows.keys().copied().collect()
    }

    fn value(&self, id: RowId, column: usize) -> Result<Value> {
        let values = self.stored(id)?;
        values
            .get(column)
            .cloned()
            .ok_or(CorvidError::OutOfRange {
                offset: column,
                count: values.len(),
            })
    }

    fn row_values(&self, id: RowId) -> Result<Vec<Value>> {
        self.stored(id).cloned()
    }
}

impl MutableTable for MemTable {
    fn new_row(&mut self) -> TableRow {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.staged = Some(id);
        trace!(table = %self.name, row = %id, "reserved row id");
        TableRow::new(id, self.schema.len())
    }

    fn insert(&mut self, row: &TableRow) -> Result<()> {
        let id = row.id();
        if self.rows.contains_key(&id) {
            return Err(CorvidError::ConstraintViolation(format!(
                "row {} already exists in table {}",
                id, self.name
            )));
        }
        let values: Vec<Value> = (0..self.schema.len())
            .map(|column| row.cached(column).cloned().unwrap_or_default())
            .collect();
        self.schema.check_row(&values)?;
        self.rows.insert(id, values);
        Ok(())
    }

    fn update(&mut self, row: &TableRow) -> Result<()> {
        for (column, value) in row.dirty_columns() {
            self.schema.check_value(column, value)?;
        }
        let name = &self.name;
        let values = self
            .rows
            .get_mut(&row.id())
            .ok_or(CorvidError::RowNotFound(row.id().get()))?;
        for (column, value) in row.dirty_columns() {
            values[column] = value.clone();
        }
        trace!(table = %name, row = %row.id(), "updated row");
        Ok(())
    }

    fn delete(&mut self, id: RowId) -> Result<()> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or(CorvidError::RowNotFound(id.get()))
    }

    fn commit(&mut self) {
        self.staged = None;
    }

    fn undo(&mut self) {
        if let Some(id) = self.staged.take() {
            // Hand the reservation back only if nothing was allocated after it.
            if !self.rows.contains_key(&id) && id.get() + 1 == self.next_id {
                self.next_id = id.get();
            }
        }
    }
}
