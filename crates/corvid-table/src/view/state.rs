//! Mutation states of an updatable view.

use crate::row::TableRow;
use corvid_common::Value;

/// The single pending row mutation of a view.
///
/// `old_keys` holds the row's full value vector as the table stored it when
/// the mutation began; secondary indexes are maintained against it at
/// commit time.
#[derive(Debug, Default)]
pub enum MutationState {
    #[default]
    Idle,
    Inserting {
        row: TableRow,
    },
    Updating {
        row: TableRow,
        old_position: usize,
        old_keys: Vec<Value>,
    },
    /// The row is already deleted from the table.
    Removing {
        row: TableRow,
        old_position: usize,
        old_keys: Vec<Value>,
    },
}

impl MutationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, MutationState::Idle)
    }

    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            MutationState::Idle => "idle",
            MutationState::Inserting { .. } => "inserting",
            MutationState::Updating { .. } => "updating",
            MutationState::Removing { .. } => "removing",
        }
    }

    /// The row being mutated.
    pub fn row(&self) -> Option<&TableRow> {
        match self {
            MutationState::Idle => None,
            MutationState::Inserting { row }
            | MutationState::Updating { row, .. }
            | MutationState::Removing { row, .. } => Some(row),
        }
    }

    pub(crate) fn row_mut(&mut self) -> Option<&mut TableRow> {
        match self {
            MutationState::Idle => None,
            MutationState::Inserting { row }
            | MutationState::Updating { row, .. }
            | MutationState::Removing { row, .. } => Some(row),
        }
    }
}
