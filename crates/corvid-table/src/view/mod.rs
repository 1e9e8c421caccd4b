//! Updatable views: a positional selection of table rows with a one-row
//! mutation protocol.
//!
//! A view owns a snapshot of the row ids it selects, in selection order.
//! Exactly one row mutation can be pending at a time:
//!
//! ```text
//!            insert_row / update_row(p) / remove_row(p)
//!   Idle  ------------------------------------------------>  Inserting
//!    ^                                                       Updating
//!    |            finish(true) / finish(false) / reset       Removing
//!    +-------------------------------------------------------+
//! ```
//!
//! `finish(true)` validates the pending row, then writes the table, updates
//! the snapshot and every secondary index of the table, and commits.
//! Removal is the exception to all-or-nothing: the row leaves the table as
//! soon as `remove_row` returns and a rollback does not bring it back.

mod cursor;
mod selection;
mod state;

pub use cursor::ResultCursor;
pub use state::MutationState;

use crate::constraint::{
    ConstraintCheck, DefaultValues, NotNullCheck, RowImage, SchemaDefaults, WriteKind,
};
use crate::projection::{Projection, ProjectionExpr};
use crate::row::TableRow;
use crate::secondary::{IndexRegistry, SharedRegistry};
use crate::table::{MutableTable, SharedTable};
use corvid_common::{CorvidError, EngineConfig, Result, Value};
use corvid_storage::RowId;
use selection::Selection;
use tracing::{debug, warn};

fn key_at(values: &[Value], column: usize) -> Result<&Value> {
    values.get(column).ok_or(CorvidError::OutOfRange {
        offset: column,
        count: values.len(),
    })
}

/// A selection of rows from one table that supports row-at-a-time writes.
pub struct UpdatableView<T: MutableTable> {
    table: Option<SharedTable<T>>,
    registry: SharedRegistry,
    selection: Selection,
    projection: Option<Projection>,
    checks: Vec<Box<dyn ConstraintCheck>>,
    defaults: Box<dyn DefaultValues>,
    /// Last resolved `(position, row id)`; cleared by every commit.
    positioned: Option<(usize, RowId)>,
    state: MutationState,
}

impl<T: MutableTable> UpdatableView<T> {
    /// Creates a view over `selection`, a single-pass sequence of row ids of
    /// `table`.
    pub fn new<I>(table: SharedTable<T>, registry: SharedRegistry, selection: I) -> Self
    where
        I: IntoIterator<Item = RowId>,
        I::IntoIter: Send + 'static,
    {
        Self {
            table: Some(table),
            registry,
            selection: Selection::new(selection),
            projection: None,
            checks: Vec::new(),
            defaults: Box::new(SchemaDefaults),
            positioned: None,
            state: MutationState::Idle,
        }
    }

    /// Creates a view selecting every row of `table` in table order.
    pub fn over_table(table: SharedTable<T>, registry: SharedRegistry) -> Self {
        let ids = table.read().row_ids();
        Self::new(table, registry, ids)
    }

    /// Creates a view with no backing table. Mutations fail with
    /// `NotUpdatable`.
    pub fn detached<I>(selection: I) -> Self
    where
        I: IntoIterator<Item = RowId>,
        I::IntoIter: Send + 'static,
    {
        Self {
            table: None,
            registry: IndexRegistry::new().shared(),
            selection: Selection::new(selection),
            projection: None,
            checks: Vec::new(),
            defaults: Box::new(SchemaDefaults),
            positioned: None,
            state: MutationState::Idle,
        }
    }

    /// Applies engine settings: snapshot backing and the NOT NULL check.
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.selection.set_config(config.snapshot.clone());
        if config.enforce_not_null {
            self.checks.push(Box::new(NotNullCheck));
        }
        self
    }

    /// Maps output columns to source columns.
    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Adds a check run before every committed insert or update.
    pub fn with_check(mut self, check: Box<dyn ConstraintCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Replaces how new rows are pre-filled.
    pub fn with_defaults(mut self, defaults: Box<dyn DefaultValues>) -> Self {
        self.defaults = defaults;
        self
    }

    /// The backing table, if any.
    pub fn table(&self) -> Option<&SharedTable<T>> {
        self.table.as_ref()
    }

    /// The pending mutation.
    pub fn state(&self) -> &MutationState {
        &self.state
    }

    fn require_table(&self) -> Result<SharedTable<T>> {
        self.table.clone().ok_or_else(|| {
            CorvidError::NotUpdatable("selection has no backing table".to_string())
        })
    }

    fn require_idle(&self) -> Result<()> {
        if self.state.is_idle() {
            Ok(())
        } else {
            Err(CorvidError::AlreadyMutating)
        }
    }

    /// Maps a view column to a table column.
    fn resolve_column(&self, table: &T, column: usize) -> Result<usize> {
        match &self.projection {
            Some(projection) => projection.resolve(column, table.schema()),
            None => table.schema().column(column).map(|_| column),
        }
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Number of rows in the selection.
    pub fn row_count(&mut self) -> Result<usize> {
        Ok(self.selection.snapshot()?.count())
    }

    /// Row id at `position` in the selection.
    pub fn row_id(&mut self, position: usize) -> Result<RowId> {
        if let Some((cached, id)) = self.positioned {
            if cached == position {
                return Ok(id);
            }
        }
        let id = self.selection.snapshot()?.element_at(position)?;
        self.positioned = Some((position, id));
        Ok(id)
    }

    /// Value of view column `column` for the row at `position`.
    pub fn value_at(&mut self, position: usize, column: usize) -> Result<Value> {
        let id = self.row_id(position)?;
        let table = self.require_table()?;
        let guard = table.read();
        let Some(projection) = &self.projection else {
            return guard.value(id, column);
        };
        match projection.expr(column)? {
            ProjectionExpr::Column(name) => guard.value(id, guard.schema().index_of(name)?),
            ProjectionExpr::Literal(value) => Ok(value.clone()),
            ProjectionExpr::Computed(description) => Err(CorvidError::InvalidState(format!(
                "column {} is computed from {} and has no stored value",
                column, description
            ))),
        }
    }

    /// Returns a cursor over the selection.
    pub fn cursor(&mut self) -> ResultCursor<'_, T> {
        ResultCursor::new(self)
    }

    // =========================================================================
    // Mutation protocol
    // =========================================================================

    /// Starts inserting a new row, pre-filled with defaults. The row joins
    /// the end of the selection on commit.
    pub fn insert_row(&mut self) -> Result<RowId> {
        let table = self.require_table()?;
        self.require_idle()?;
        self.selection.snapshot()?;

        let mut guard = table.write();
        let mut row = guard.new_row();
        let filled = self
            .defaults
            .apply(guard.schema(), &mut row)
            .and_then(|()| {
                (0..row.width())
                    .filter_map(|column| row.cached(column).map(|value| (column, value)))
                    .try_for_each(|(column, value)| guard.schema().check_value(column, value))
            });
        if let Err(e) = filled {
            guard.undo();
            return Err(e);
        }
        let id = row.id();
        debug!(table = guard.name(), row = %id, "insert started");
        self.state = MutationState::Inserting { row };
        Ok(id)
    }

    /// Starts updating the row at `position`.
    pub fn update_row(&mut self, position: usize) -> Result<RowId> {
        let table = self.require_table()?;
        self.require_idle()?;
        let id = self.row_id(position)?;

        let guard = table.read();
        let row = guard
            .get_row(id)
            .ok_or(CorvidError::RowNotFound(id.get()))?;
        let old_keys = guard.row_values(id)?;
        debug!(table = guard.name(), row = %id, position, "update started");
        self.state = MutationState::Updating {
            row,
            old_position: position,
            old_keys,
        };
        Ok(id)
    }

    /// Deletes the row at `position` from the table and starts its removal
    /// from the selection and the secondary indexes.
    pub fn remove_row(&mut self, position: usize) -> Result<RowId> {
        let table = self.require_table()?;
        self.require_idle()?;
        let id = self.row_id(position)?;

        let mut guard = table.write();
        let old_keys = guard.row_values(id)?;
        guard.delete(id)?;
        {
            let mut registry = self.registry.lock();
            for index in registry.indexes_for_mut(guard.name()) {
                index.retire(id, key_at(&old_keys, index.column())?.clone());
            }
        }
        debug!(table = guard.name(), row = %id, position, "row deleted, removal pending");
        self.state = MutationState::Removing {
            row: TableRow::from_values(id, old_keys.clone()),
            old_position: position,
            old_keys,
        };
        Ok(id)
    }

    /// Sets view column `column` of the pending row.
    pub fn set_value(&mut self, column: usize, value: impl Into<Value>) -> Result<()> {
        match &self.state {
            MutationState::Idle => {
                return Err(CorvidError::InvalidState(
                    "set_value with no row mutation in progress".to_string(),
                ));
            }
            MutationState::Removing { .. } => {
                return Err(CorvidError::InvalidState(
                    "cannot set values on a row being removed".to_string(),
                ));
            }
            MutationState::Inserting { .. } | MutationState::Updating { .. } => {}
        }
        let value = value.into();
        let table = self.require_table()?;
        let target = {
            let guard = table.read();
            let target = self.resolve_column(&guard, column)?;
            guard.schema().check_value(target, &value)?;
            target
        };
        self.pending_row_mut()?.set(target, value)
    }

    /// Reads view column `column` of the pending row.
    pub fn get_value(&mut self, column: usize) -> Result<Value> {
        if self.state.is_idle() {
            return Err(CorvidError::InvalidState(
                "get_value with no row mutation in progress".to_string(),
            ));
        }
        let table = self.require_table()?;
        let guard = table.read();
        let target = self.resolve_column(&guard, column)?;
        self.pending_row_mut()?.get(target, &*guard)
    }

    /// Id of the row being mutated.
    pub fn mutating_row_id(&self) -> Result<RowId> {
        self.state.row().map(TableRow::id).ok_or_else(|| {
            CorvidError::InvalidState("no row mutation in progress".to_string())
        })
    }

    fn pending_row_mut(&mut self) -> Result<&mut TableRow> {
        self.state.row_mut().ok_or_else(|| {
            CorvidError::InvalidState("no row mutation in progress".to_string())
        })
    }

    /// Ends the pending mutation, committing it or rolling it back.
    ///
    /// A commit rejected by a constraint check or a unique index fails with
    /// `ConstraintViolation` before anything is written, and leaves the
    /// mutation pending.
    pub fn finish(&mut self, commit: bool) -> Result<()> {
        if self.state.is_idle() {
            return Err(CorvidError::InvalidState(
                "finish with no row mutation in progress".to_string(),
            ));
        }
        if commit {
            self.commit()
        } else {
            self.rollback()
        }
    }

    /// Abandons any pending mutation. Does nothing when idle.
    pub fn reset(&mut self) -> Result<()> {
        self.positioned = None;
        if self.state.is_idle() {
            return Ok(());
        }
        self.rollback()
    }

    fn commit(&mut self) -> Result<()> {
        let table = self.require_table()?;
        let mut guard = table.write();
        let mut registry = self.registry.lock();
        let table_name = guard.name().to_string();

        let pending = match &mut self.state {
            MutationState::Inserting { row } => {
                Some((row.id(), WriteKind::Insert, row.materialize(&*guard)?))
            }
            MutationState::Updating { row, .. } => {
                Some((row.id(), WriteKind::Update, row.materialize(&*guard)?))
            }
            MutationState::Removing { .. } | MutationState::Idle => None,
        };

        // Nothing below this block may run unless every check passes.
        if let Some((id, kind, values)) = &pending {
            let image = RowImage {
                id: *id,
                kind: *kind,
                values,
            };
            guard.schema().check_row(values)?;
            for check in &self.checks {
                if let Err(e) = check.check(&*guard, &image) {
                    warn!(check = check.name(), row = %id, error = %e, "commit rejected");
                    return Err(e);
                }
            }
            for index in registry.indexes_for_mut(&table_name) {
                let key = key_at(values, index.column())?;
                if index.would_conflict(*id, key, &*guard)? {
                    warn!(index = index.name(), row = %id, "commit rejected by unique index");
                    return Err(CorvidError::ConstraintViolation(format!(
                        "duplicate key {} in unique index {}",
                        key,
                        index.name()
                    )));
                }
            }
        }
        let new_values = pending.as_ref().map_or(&[][..], |(_, _, v)| v.as_slice());

        match &self.state {
            MutationState::Inserting { row } => {
                let id = row.id();
                let snapshot = self.selection.snapshot()?;
                guard.insert(row)?;
                snapshot.add(&id)?;
                for index in registry.indexes_for_mut(&table_name) {
                    index.insert(id, key_at(new_values, index.column())?, &*guard)?;
                }
            }
            MutationState::Updating {
                row,
                old_position,
                old_keys,
            } => {
                let id = row.id();
                let snapshot = self.selection.snapshot()?;
                guard.update(row)?;
                snapshot.remove_at(*old_position)?;
                snapshot.insert_at(&id, *old_position)?;
                for index in registry.indexes_for_mut(&table_name) {
                    let column = index.column();
                    index.remove(id, key_at(old_keys, column)?, &*guard)?;
                    index.insert(id, key_at(new_values, column)?, &*guard)?;
                }
            }
            MutationState::Removing {
                row,
                old_position,
                old_keys,
            } => {
                let id = row.id();
                self.selection.snapshot()?.remove_at(*old_position)?;
                for index in registry.indexes_for_mut(&table_name) {
                    index.remove(id, key_at(old_keys, index.column())?, &*guard)?;
                }
            }
            MutationState::Idle => {}
        }

        guard.commit();
        debug!(table = %table_name, state = self.state.name(), "mutation committed");
        self.positioned = None;
        self.state = MutationState::Idle;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let Some(table) = self.table.clone() else {
            return Ok(());
        };
        let mut guard = table.write();
        guard.undo();

        if let MutationState::Removing { row, old_keys, .. } = &state {
            // Rollback only asks the table to undo, and the table cannot bring
            // a deleted row back. Dropping its retired entries keeps every
            // index in step with the rows the table still holds.
            warn!(row = %row.id(), "rollback does not restore a removed row");
            let mut registry = self.registry.lock();
            for index in registry.indexes_for_mut(guard.name()) {
                match index.remove(row.id(), key_at(old_keys, index.column())?, &*guard) {
                    Ok(()) | Err(CorvidError::NotFound) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        debug!(table = guard.name(), state = state.name(), "mutation rolled back");
        Ok(())
    }
}

impl<T: MutableTable> Drop for UpdatableView<T> {
    fn drop(&mut self) {
        if let Err(e) = self.reset() {
            warn!(error = %e, "pending mutation not released on drop");
        }
    }
}

impl<T: MutableTable> std::fmt::Debug for UpdatableView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdatableView")
            .field("updatable", &self.table.is_some())
            .field("selection", &self.selection)
            .field("projection", &self.projection)
            .field("checks", &self.checks)
            .field("state", &self.state)
            .finish()
    }
}
