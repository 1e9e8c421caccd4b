//! Row cursor over an updatable view.

use super::UpdatableView;
use crate::table::MutableTable;
use corvid_common::{CorvidError, Result, Value};
use corvid_storage::{Direction, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Place {
    BeforeStart,
    At(usize),
    AfterEnd,
}

/// Moves over the rows of a view by position.
///
/// Every read goes back through the view's snapshot, so rows inserted or
/// removed by committed mutations are seen on the next move.
#[derive(Debug)]
pub struct ResultCursor<'a, T: MutableTable> {
    view: &'a mut UpdatableView<T>,
    place: Place,
    last_move: Option<Direction>,
}

impl<'a, T: MutableTable> ResultCursor<'a, T> {
    pub(crate) fn new(view: &'a mut UpdatableView<T>) -> Self {
        Self {
            view,
            place: Place::BeforeStart,
            last_move: None,
        }
    }

    /// Position of the current row, if the cursor is on one.
    pub fn position(&self) -> Option<usize> {
        match self.place {
            Place::At(position) => Some(position),
            Place::BeforeStart | Place::AfterEnd => None,
        }
    }

    pub fn last_move(&self) -> Option<Direction> {
        self.last_move
    }

    /// The underlying view, for driving a mutation on the current row.
    pub fn view(&mut self) -> &mut UpdatableView<T> {
        &mut *self.view
    }

    /// Moves before the first row.
    pub fn reset(&mut self) {
        self.place = Place::BeforeStart;
        self.last_move = None;
    }

    /// Advances to the next row. Returns false once past the last.
    pub fn move_next(&mut self) -> Result<bool> {
        let next = match self.place {
            Place::BeforeStart => 0,
            Place::At(position) => position + 1,
            Place::AfterEnd => return Ok(false),
        };
        if next < self.view.row_count()? {
            self.place = Place::At(next);
            self.last_move = Some(Direction::Forward);
            Ok(true)
        } else {
            self.place = Place::AfterEnd;
            Ok(false)
        }
    }

    /// Steps back to the previous row. Returns false once before the first.
    pub fn move_prev(&mut self) -> Result<bool> {
        let count = self.view.row_count()?;
        let prev = match self.place {
            Place::BeforeStart => None,
            Place::At(position) => position.min(count).checked_sub(1),
            Place::AfterEnd => count.checked_sub(1),
        };
        match prev {
            Some(position) => {
                self.place = Place::At(position);
                self.last_move = Some(Direction::Backward);
                Ok(true)
            }
            None => {
                self.place = Place::BeforeStart;
                Ok(false)
            }
        }
    }

    fn require_position(&self) -> Result<usize> {
        self.position()
            .ok_or_else(|| CorvidError::InvalidState("cursor is not on a row".to_string()))
    }

    /// Id of the current row.
    pub fn row_id(&mut self) -> Result<RowId> {
        let position = self.require_position()?;
        self.view.row_id(position)
    }

    /// Value of view column `column` in the current row.
    pub fn value(&mut self, column: usize) -> Result<Value> {
        let position = self.require_position()?;
        self.view.value_at(position, column)
    }

    /// Starts updating the current row.
    pub fn update(&mut self) -> Result<RowId> {
        let position = self.require_position()?;
        self.view.update_row(position)
    }

    /// Removes the current row and commits the removal.
    ///
    /// After a forward move the cursor steps back one so that the next
    /// `move_next` lands on the row that followed the removed one.
    pub fn delete(&mut self) -> Result<RowId> {
        let position = self.require_position()?;
        let id = self.view.remove_row(position)?;
        self.view.finish(true)?;
        if self.last_move == Some(Direction::Forward) {
            self.place = match position.checked_sub(1) {
                Some(prev) => Place::At(prev),
                None => Place::BeforeStart,
            };
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::schema::{Column, Schema};
    use crate::secondary::IndexRegistry;
    use crate::table::{MemTable, Table};
    use crate::view::UpdatableView;
    use corvid_common::{CorvidError, TypeId, Value};
    use corvid_storage::RowId;

    fn numbers(count: i64) -> UpdatableView<MemTable> {
        let mut table = MemTable::new("numbers", Schema::new(vec![Column::new("n", TypeId::Int64)]));
        for n in 1..=count {
            table.load(vec![Value::Int64(n)]).unwrap();
        }
        UpdatableView::over_table(table.shared(), IndexRegistry::new().shared())
    }

    #[test]
    fn test_forward_and_backward() {
        let mut view = numbers(3);
        let mut cursor = view.cursor();
        let mut forward = Vec::new();
        while cursor.move_next().unwrap() {
            forward.push(cursor.value(0).unwrap());
        }
        assert_eq!(forward, vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
        assert!(cursor.row_id().is_err());

        let mut backward = Vec::new();
        while cursor.move_prev().unwrap() {
            backward.push(cursor.row_id().unwrap());
        }
        assert_eq!(backward, vec![RowId(3), RowId(2), RowId(1)]);
    }

    #[test]
    fn test_delete_every_other_row() {
        let mut view = numbers(6);
        {
            let mut cursor = view.cursor();
            while cursor.move_next().unwrap() {
                if let Value::Int64(n) = cursor.value(0).unwrap() {
                    if n % 2 == 0 {
                        cursor.delete().unwrap();
                    }
                }
            }
        }
        assert_eq!(view.row_count().unwrap(), 3);
        let table = view.table().unwrap().clone();
        assert_eq!(table.read().row_ids(), vec![RowId(1), RowId(3), RowId(5)]);
    }

    #[test]
    fn test_update_through_cursor() {
        let mut view = numbers(2);
        let mut cursor = view.cursor();
        assert!(matches!(cursor.update(), Err(CorvidError::InvalidState(_))));
        cursor.move_next().unwrap();
        cursor.move_next().unwrap();
        assert_eq!(cursor.update().unwrap(), RowId(2));
        cursor.view().set_value(0, 20i64).unwrap();
        cursor.view().finish(true).unwrap();
        assert_eq!(cursor.value(0).unwrap(), Value::Int64(20));
    }
}
