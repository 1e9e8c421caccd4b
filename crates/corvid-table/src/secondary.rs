//! Secondary indexes over table columns.
//!
//! A secondary index stores row ids only. Elements are ordered by the value
//! of one column, read back through the table at comparison time, so the
//! index never duplicates column data. Two kinds of row are exceptions:
//! - the row being maintained, whose key is supplied by the caller, which
//!   lets an index drop a row under its old key after the table already
//!   holds the new one;
//! - retired rows, deleted from the table while their removal from the index
//!   is still pending, whose last key the index keeps until that removal.

use crate::table::Table;
use corvid_common::{CorvidError, IndexConfig, Result, Value};
use corvid_storage::{
    ByteStore, ItemCodec, MemoryStore, RowId, RowIdCodec, SearchRange, SortedIndex,
};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type RowIdIndex = SortedIndex<RowIdCodec, Box<dyn ByteStore>>;

/// Row ids of one table ordered by one column.
#[derive(Debug)]
pub struct SecondaryIndex {
    name: String,
    table: String,
    column: usize,
    unique: bool,
    index: RowIdIndex,
    retired: HashMap<RowId, Value>,
}

/// Resolves element keys during one search and holds the first failure.
///
/// A comparator cannot return an error, so a failed read is parked here and
/// surfaced by `check` before the search result is used.
struct KeyReader<'a, T: ?Sized> {
    table: &'a T,
    column: usize,
    retired: &'a HashMap<RowId, Value>,
    pending: Option<(RowId, &'a Value)>,
    failure: Option<CorvidError>,
}

impl<'a, T: Table + ?Sized> KeyReader<'a, T> {
    fn new(
        table: &'a T,
        column: usize,
        retired: &'a HashMap<RowId, Value>,
        pending: Option<(RowId, &'a Value)>,
    ) -> Self {
        Self {
            table,
            column,
            retired,
            pending,
            failure: None,
        }
    }

    fn key(&self, element: RowId) -> Result<Value> {
        if let Some((id, key)) = self.pending {
            if element == id {
                return Ok(key.clone());
            }
        }
        if let Some(key) = self.retired.get(&element) {
            return Ok(key.clone());
        }
        self.table.value(element, self.column)
    }

    fn compare(&mut self, element: &RowId, probe: &Value) -> Ordering {
        match self.key(*element) {
            Ok(key) => key.cmp(probe),
            Err(e) => {
                self.failure.get_or_insert(e);
                Ordering::Equal
            }
        }
    }

    fn check<R>(self, result: Result<R>) -> Result<R> {
        match self.failure {
            Some(e) => Err(e),
            None => result,
        }
    }
}

impl SecondaryIndex {
    /// Creates an empty in-memory index.
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        column: usize,
        unique: bool,
    ) -> Result<Self> {
        Self::with_store(name, table, column, unique, Box::new(MemoryStore::new()))
    }

    /// Opens an index over a store that may already hold row ids.
    pub fn with_store(
        name: impl Into<String>,
        table: impl Into<String>,
        column: usize,
        unique: bool,
        store: Box<dyn ByteStore>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            table: table.into(),
            column,
            unique,
            index: SortedIndex::open(RowIdCodec, store)?,
            retired: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Offset of the indexed column.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn len(&self) -> usize {
        self.index.count()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Indexed row ids in key order.
    pub fn row_ids(&mut self) -> Result<Vec<RowId>> {
        self.index.to_vec()
    }

    /// Records `key` as the last key of `id`, which is about to leave the
    /// table while its entry stays indexed until `remove`.
    pub fn retire(&mut self, id: RowId, key: Value) {
        self.retired.insert(id, key);
    }

    pub fn is_retired(&self, id: RowId) -> bool {
        self.retired.contains_key(&id)
    }

    /// Adds `id` under `key`.
    ///
    /// A unique index rejects a second non-NULL key with
    /// `ConstraintViolation`. Retired rows do not count as holders of a key.
    pub fn insert<T: Table + ?Sized>(&mut self, id: RowId, key: &Value, table: &T) -> Result<()> {
        let mut keys = KeyReader::new(table, self.column, &self.retired, Some((id, key)));
        let found = self
            .index
            .search_first_and_last(key, |element: &RowId, probe: &Value| {
                keys.compare(element, probe)
            });
        let ordinal = match keys.check(found)? {
            SearchRange::NotFound(at) => at,
            SearchRange::Found { first, last } => {
                if self.unique && !key.is_null() {
                    for ordinal in first..=last {
                        let holder = self.index.element_at(ordinal)?;
                        if !self.retired.contains_key(&holder) {
                            return Err(CorvidError::ConstraintViolation(format!(
                                "duplicate key {} in unique index {}",
                                key, self.name
                            )));
                        }
                    }
                }
                last + 1
            }
        };
        self.index.insert_at(&id, ordinal)
    }

    /// Removes `id` from under `key`. Fails with `NotFound` if it is not
    /// indexed there. Clears any retired key held for `id`.
    pub fn remove<T: Table + ?Sized>(&mut self, id: RowId, key: &Value, table: &T) -> Result<()> {
        let mut keys = KeyReader::new(table, self.column, &self.retired, Some((id, key)));
        let found = self
            .index
            .search_first_and_last(key, |element: &RowId, probe: &Value| {
                keys.compare(element, probe)
            });
        let run = keys.check(found)?;
        for ordinal in run.as_range() {
            if self.index.element_at(ordinal)? == id {
                self.index.remove_at(ordinal)?;
                self.retired.remove(&id);
                return Ok(());
            }
        }
        Err(CorvidError::NotFound)
    }

    /// Equal-key run for `key`. Every element's key comes from the table or
    /// the retired set.
    fn run<T: Table + ?Sized>(&mut self, key: &Value, table: &T) -> Result<SearchRange> {
        let mut keys = KeyReader::new(table, self.column, &self.retired, None);
        let found = self
            .index
            .search_first_and_last(key, |element: &RowId, probe: &Value| {
                keys.compare(element, probe)
            });
        keys.check(found)
    }

    /// Live row ids stored under `key`, in insertion order.
    pub fn lookup<T: Table + ?Sized>(&mut self, key: &Value, table: &T) -> Result<Vec<RowId>> {
        let run = self.run(key, table)?;
        let mut ids = Vec::with_capacity(run.len());
        let mut cursor = self.index.cursor_range(run.as_range())?;
        while let Some(id) = cursor.next_item()? {
            if !self.retired.contains_key(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Returns true if live row `id` is indexed under `key`, which must be
    /// the key the table currently holds for it.
    pub fn contains<T: Table + ?Sized>(&mut self, id: RowId, key: &Value, table: &T) -> Result<bool> {
        if self.retired.contains_key(&id) {
            return Ok(false);
        }
        let run = self.run(key, table)?;
        for ordinal in run.as_range() {
            if self.index.element_at(ordinal)? == id {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Returns true if storing `key` for `id` would break uniqueness.
    ///
    /// Called before the table changes, so `id` itself is still indexed under
    /// its current key, if at all.
    pub fn would_conflict<T: Table + ?Sized>(
        &mut self,
        id: RowId,
        key: &Value,
        table: &T,
    ) -> Result<bool> {
        if !self.unique || key.is_null() {
            return Ok(false);
        }
        let run = self.run(key, table)?;
        for ordinal in run.as_range() {
            let holder = self.index.element_at(ordinal)?;
            if holder != id && !self.retired.contains_key(&holder) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Freezes the index: later maintenance fails with `ReadOnly`.
    pub fn into_read_only(self) -> Result<Self> {
        let mut store = self.index.into_store();
        let mut bytes = vec![0u8; store.len() as usize];
        store.read_exact_at(0, &mut bytes)?;
        let frozen: Box<dyn ByteStore> = Box::new(MemoryStore::from_bytes(&bytes).into_read_only());
        Ok(Self {
            index: SortedIndex::open(RowIdCodec, frozen)?,
            ..self
        })
    }

    /// Drops every entry and re-indexes the table's current rows.
    pub fn rebuild<T: Table + ?Sized>(&mut self, table: &T) -> Result<()> {
        self.index.clear()?;
        self.retired.clear();
        for id in table.row_ids() {
            let key = table.value(id, self.column)?;
            self.insert(id, &key, table)?;
        }
        debug!(index = %self.name, rows = self.len(), "rebuilt secondary index");
        Ok(())
    }
}

/// Secondary indexes grouped by table name.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    config: IndexConfig,
    by_table: HashMap<String, Vec<SecondaryIndex>>,
}

/// A registry shared between views.
pub type SharedRegistry = Arc<Mutex<IndexRegistry>>;

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose built indexes follow `config`.
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            config,
            by_table: HashMap::new(),
        }
    }

    /// Wraps the registry for sharing.
    pub fn shared(self) -> SharedRegistry {
        Arc::new(Mutex::new(self))
    }

    /// Adds an index. Names are unique per table.
    pub fn register(&mut self, index: SecondaryIndex) -> Result<()> {
        let indexes = self.by_table.entry(index.table.clone()).or_default();
        if indexes.iter().any(|ix| ix.name == index.name) {
            return Err(CorvidError::ConfigError(format!(
                "index {} already registered on table {}",
                index.name, index.table
            )));
        }
        indexes.push(index);
        Ok(())
    }

    /// Builds an index on `column` from the table's existing rows and
    /// registers it.
    pub fn build<T: Table + ?Sized>(
        &mut self,
        name: &str,
        table: &T,
        column: &str,
        unique: bool,
    ) -> Result<()> {
        let offset = table.schema().index_of(column)?;
        let capacity = self.config.initial_capacity_items * RowIdCodec.width();
        let mut index = SecondaryIndex::with_store(
            name,
            table.name(),
            offset,
            unique,
            Box::new(MemoryStore::with_capacity(capacity)),
        )?;
        index.rebuild(table)?;
        if self.config.read_only {
            index = index.into_read_only()?;
        }
        self.register(index)
    }

    /// Indexes defined on `table`.
    pub fn indexes_for(&self, table: &str) -> &[SecondaryIndex] {
        match self.by_table.get(table) {
            Some(indexes) => indexes,
            None => &[],
        }
    }

    pub fn indexes_for_mut(&mut self, table: &str) -> &mut [SecondaryIndex] {
        match self.by_table.get_mut(table) {
            Some(indexes) => indexes,
            None => &mut [],
        }
    }

    /// Looks up one index by table and name.
    pub fn index_mut(&mut self, table: &str, name: &str) -> Result<&mut SecondaryIndex> {
        self.indexes_for_mut(table)
            .iter_mut()
            .find(|ix| ix.name == name)
            .ok_or_else(|| CorvidError::IndexNotFound(name.to_string()))
    }

    /// Removes an index.
    pub fn drop_index(&mut self, table: &str, name: &str) -> Result<SecondaryIndex> {
        let indexes = self
            .by_table
            .get_mut(table)
            .ok_or_else(|| CorvidError::IndexNotFound(name.to_string()))?;
        let pos = indexes
            .iter()
            .position(|ix| ix.name == name)
            .ok_or_else(|| CorvidError::IndexNotFound(name.to_string()))?;
        Ok(indexes.remove(pos))
    }
}
