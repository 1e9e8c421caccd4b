//! Positioned cursor over a contiguous range of a sorted index.

use super::sorted::SortedIndex;
use crate::codec::ItemCodec;
use crate::store::ByteStore;
use corvid_common::{CorvidError, Result};

/// Direction of the last successful cursor move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A movable position over `start..end` of a sorted index.
///
/// The cursor holds the index by exclusive borrow, so no other mutation path
/// can touch the index while it is alive. Removals made through the cursor
/// shrink `end` and keep forward iteration on track.
#[derive(Debug)]
pub struct IndexCursor<'a, C: ItemCodec, S: ByteStore> {
    index: &'a mut SortedIndex<C, S>,
    start: usize,
    /// Exclusive upper bound; shrinks when the cursor removes an element.
    end: usize,
    /// One past the current ordinal. `start` means before the first element,
    /// `end + 1` means past the last.
    slot: usize,
    last_move: Option<Direction>,
}

impl<'a, C: ItemCodec, S: ByteStore> IndexCursor<'a, C, S> {
    pub(crate) fn new(index: &'a mut SortedIndex<C, S>, start: usize, end: usize) -> Self {
        Self {
            index,
            start,
            end,
            slot: start,
            last_move: None,
        }
    }

    /// First ordinal covered by the cursor.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive upper bound of the cursor.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of elements currently covered.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the cursor covers no elements.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Number of elements after the current position.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.slot)
    }

    /// Direction of the last successful move, if any.
    pub fn last_move(&self) -> Option<Direction> {
        self.last_move
    }

    /// Ordinal of the current element, if the cursor is on one.
    pub fn position(&self) -> Option<usize> {
        if self.slot > self.start && self.slot <= self.end {
            Some(self.slot - 1)
        } else {
            None
        }
    }

    /// Moves before the first element.
    pub fn reset(&mut self) {
        self.slot = self.start;
        self.last_move = None;
    }

    /// Advances to the next element. Returns false once past the end.
    pub fn move_next(&mut self) -> bool {
        if self.slot < self.end {
            self.slot += 1;
            self.last_move = Some(Direction::Forward);
            true
        } else {
            self.slot = self.end + 1;
            false
        }
    }

    /// Steps back to the previous element. Returns false once before the
    /// start.
    pub fn move_prev(&mut self) -> bool {
        if self.slot > self.start + 1 {
            self.slot = self.slot.min(self.end + 1) - 1;
            self.last_move = Some(Direction::Backward);
            true
        } else {
            self.slot = self.start;
            false
        }
    }

    /// Returns the current element.
    pub fn current(&mut self) -> Result<C::Item> {
        let ordinal = self.require_position()?;
        self.index.element_at(ordinal)
    }

    /// Advances and returns the next element, or None past the end.
    pub fn next_item(&mut self) -> Result<Option<C::Item>> {
        if self.move_next() {
            self.current().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Removes the current element from the index and returns it.
    ///
    /// After a forward move the position steps back one so that the next
    /// `move_next` lands on the element that followed the removed one.
    pub fn remove(&mut self) -> Result<C::Item> {
        let ordinal = self.require_position()?;
        let item = self.index.remove_at(ordinal)?;
        self.end -= 1;
        if self.last_move == Some(Direction::Forward) {
            self.slot -= 1;
        }
        Ok(item)
    }

    fn require_position(&self) -> Result<usize> {
        self.position().ok_or(CorvidError::OutOfRange {
            offset: self.slot.saturating_sub(1),
            count: self.end,
        })
    }
}
