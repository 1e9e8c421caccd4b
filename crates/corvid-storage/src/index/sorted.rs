//! Sorted index over a flat byte store.
//!
//! Elements are fixed-width records laid out back to back:
//!
//! ```text
//! +-----------+-----------+-----------+-----+
//! | element 0 | element 1 | element 2 | ... |
//! +-----------+-----------+-----------+-----+
//! 0           w           2w          3w    len = count * w
//! ```
//!
//! Ordering is defined by a comparator supplied per call, which may compare
//! an element against a key of a different type (for example a row id
//! against a column value looked up through the row). Inserts and removals
//! shift the tail of the store by one element width.

use super::cursor::IndexCursor;
use super::search::{LINEAR_SCAN_WINDOW, SearchRange, SearchResult};
use crate::codec::ItemCodec;
use crate::store::{ByteStore, MemoryStore};
use corvid_common::{CorvidError, Result};
use std::cmp::Ordering;
use std::ops::Range;
use tracing::trace;

/// Ordered multiset of fixed-width elements backed by a byte store.
///
/// The index exclusively owns its store. Adjacent elements always satisfy
/// `cmp(a) <= cmp(b)` for the comparator the caller orders them by.
#[derive(Debug)]
pub struct SortedIndex<C: ItemCodec, S: ByteStore = MemoryStore> {
    store: S,
    codec: C,
    width: usize,
    /// Scratch buffer of exactly `width` bytes.
    scratch: Vec<u8>,
}

impl<C: ItemCodec> SortedIndex<C, MemoryStore> {
    /// Creates an empty in-memory index.
    pub fn in_memory(codec: C) -> Self {
        let width = codec.width();
        Self {
            store: MemoryStore::new(),
            codec,
            width,
            scratch: vec![0u8; width],
        }
    }
}

impl<C: ItemCodec, S: ByteStore> SortedIndex<C, S> {
    /// Opens an index over `store`, which may already hold elements.
    ///
    /// Fails with `CorruptStore` if the store length is not a whole number
    /// of elements.
    pub fn open(codec: C, store: S) -> Result<Self> {
        let width = codec.width();
        if width == 0 {
            return Err(CorvidError::Internal(
                "item codec reports zero width".to_string(),
            ));
        }
        if store.len() % width as u64 != 0 {
            return Err(CorvidError::CorruptStore {
                length: store.len(),
                width,
            });
        }
        Ok(Self {
            store,
            codec,
            width,
            scratch: vec![0u8; width],
        })
    }

    /// Number of elements.
    #[inline]
    pub fn count(&self) -> usize {
        (self.store.len() / self.width as u64) as usize
    }

    /// Returns true if the index holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns true if the index rejects mutation.
    pub fn is_read_only(&self) -> bool {
        self.store.is_read_only()
    }

    /// Element width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the index and returns its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Flushes the backing store.
    pub fn sync(&mut self) -> Result<()> {
        self.store.sync()
    }

    #[inline]
    fn byte_offset(&self, ordinal: usize) -> u64 {
        ordinal as u64 * self.width as u64
    }

    fn check_writable(&self) -> Result<()> {
        if self.store.is_read_only() {
            return Err(CorvidError::ReadOnly);
        }
        Ok(())
    }

    /// Reads the element at `ordinal` without a range check.
    fn read_item(&mut self, ordinal: usize) -> Result<C::Item> {
        let position = self.byte_offset(ordinal);
        self.store.read_exact_at(position, &mut self.scratch)?;
        Ok(self.codec.decode(&self.scratch))
    }

    fn write_item(&mut self, ordinal: usize, element: &C::Item) -> Result<()> {
        let position = self.byte_offset(ordinal);
        self.codec.encode(element, &mut self.scratch);
        self.store.write_at(position, &self.scratch)
    }

    /// Returns the element at `offset`.
    pub fn element_at(&mut self, offset: usize) -> Result<C::Item> {
        let count = self.count();
        if offset >= count {
            return Err(CorvidError::OutOfRange { offset, count });
        }
        self.read_item(offset)
    }

    /// Decodes every element in order.
    pub fn to_vec(&mut self) -> Result<Vec<C::Item>> {
        let count = self.count();
        let mut items = Vec::with_capacity(count);
        for ordinal in 0..count {
            items.push(self.read_item(ordinal)?);
        }
        Ok(items)
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Finds the first element comparing equal to `key`.
    ///
    /// Returns `NotFound(p)` where `p` is the ordinal at which `key` would be
    /// inserted to keep the index ordered.
    pub fn search_first<K, F>(&mut self, key: &K, mut cmp: F) -> Result<SearchResult>
    where
        K: ?Sized,
        F: FnMut(&C::Item, &K) -> Ordering,
    {
        let count = self.count();
        if count == 0 {
            return Ok(SearchResult::NotFound(0));
        }
        self.search_first_in(0, count - 1, key, &mut cmp)
    }

    /// Finds the last element comparing equal to `key`.
    ///
    /// Returns `NotFound(p)` where `p` is the ordinal at which `key` would be
    /// inserted to keep the index ordered.
    pub fn search_last<K, F>(&mut self, key: &K, mut cmp: F) -> Result<SearchResult>
    where
        K: ?Sized,
        F: FnMut(&C::Item, &K) -> Ordering,
    {
        let count = self.count();
        if count == 0 {
            return Ok(SearchResult::NotFound(0));
        }
        self.search_last_in(0, count - 1, key, &mut cmp)
    }

    /// Finds both ends of the run of elements comparing equal to `key`.
    pub fn search_first_and_last<K, F>(&mut self, key: &K, mut cmp: F) -> Result<SearchRange>
    where
        K: ?Sized,
        F: FnMut(&C::Item, &K) -> Ordering,
    {
        let count = self.count();
        if count == 0 {
            return Ok(SearchRange::NotFound(0));
        }
        match self.search_first_in(0, count - 1, key, &mut cmp)? {
            SearchResult::NotFound(pos) => Ok(SearchRange::NotFound(pos)),
            SearchResult::Found(first) => {
                match self.search_last_in(first, count - 1, key, &mut cmp)? {
                    SearchResult::Found(last) => Ok(SearchRange::Found { first, last }),
                    SearchResult::NotFound(_) => Err(CorvidError::Internal(format!(
                        "equal run starting at {} vanished during search",
                        first
                    ))),
                }
            }
        }
    }

    /// Lower-bound search within `[low, high]` (inclusive, non-empty).
    ///
    /// A match at the midpoint narrows `high` instead of returning, so the
    /// search converges on the start of an equal run.
    fn search_first_in<K, F>(
        &mut self,
        mut low: usize,
        mut high: usize,
        key: &K,
        cmp: &mut F,
    ) -> Result<SearchResult>
    where
        K: ?Sized,
        F: FnMut(&C::Item, &K) -> Ordering,
    {
        while high - low + 1 > LINEAR_SCAN_WINDOW {
            let mid = low + (high - low) / 2;
            let item = self.read_item(mid)?;
            if cmp(&item, key) == Ordering::Less {
                low = mid + 1;
            } else {
                high = mid;
            }
        }

        for ordinal in low..=high {
            let item = self.read_item(ordinal)?;
            match cmp(&item, key) {
                Ordering::Less => continue,
                Ordering::Equal => return Ok(SearchResult::Found(ordinal)),
                Ordering::Greater => return Ok(SearchResult::NotFound(ordinal)),
            }
        }
        Ok(SearchResult::NotFound(high + 1))
    }

    /// Upper-bound search within `[low, high]` (inclusive, non-empty).
    ///
    /// A match at the midpoint narrows `low`, converging on the end of an
    /// equal run. The final scan runs descending.
    fn search_last_in<K, F>(
        &mut self,
        mut low: usize,
        mut high: usize,
        key: &K,
        cmp: &mut F,
    ) -> Result<SearchResult>
    where
        K: ?Sized,
        F: FnMut(&C::Item, &K) -> Ordering,
    {
        while high - low + 1 > LINEAR_SCAN_WINDOW {
            let mid = low + (high - low + 1) / 2;
            let item = self.read_item(mid)?;
            if cmp(&item, key) == Ordering::Greater {
                high = mid - 1;
            } else {
                low = mid;
            }
        }

        for ordinal in (low..=high).rev() {
            let item = self.read_item(ordinal)?;
            match cmp(&item, key) {
                Ordering::Greater => continue,
                Ordering::Equal => return Ok(SearchResult::Found(ordinal)),
                Ordering::Less => return Ok(SearchResult::NotFound(ordinal + 1)),
            }
        }
        Ok(SearchResult::NotFound(low))
    }

    // =========================================================================
    // Keyed mutation
    // =========================================================================

    /// Inserts `element` after the last element comparing equal to `key`, or
    /// at the ordered insertion point if there is none. Returns the ordinal
    /// the element landed at.
    ///
    /// Equal keys keep their insertion order.
    pub fn insert<K, F>(&mut self, key: &K, element: &C::Item, cmp: F) -> Result<usize>
    where
        K: ?Sized,
        F: FnMut(&C::Item, &K) -> Ordering,
    {
        self.check_writable()?;
        let ordinal = match self.search_last(key, cmp)? {
            SearchResult::Found(pos) => pos + 1,
            SearchResult::NotFound(pos) => pos,
        };
        self.insert_at(element, ordinal)?;
        Ok(ordinal)
    }

    /// Inserts `element` only if no element compares equal to `key`.
    ///
    /// Returns false, leaving the index untouched, when the key exists.
    pub fn insert_unique<K, F>(&mut self, key: &K, element: &C::Item, cmp: F) -> Result<bool>
    where
        K: ?Sized,
        F: FnMut(&C::Item, &K) -> Ordering,
    {
        self.check_writable()?;
        match self.search_first(key, cmp)? {
            SearchResult::Found(_) => Ok(false),
            SearchResult::NotFound(pos) => {
                self.insert_at(element, pos)?;
                Ok(true)
            }
        }
    }

    /// Removes the first element within the run equal to `key` that is
    /// itself equal (by value) to `element`. Returns its former ordinal.
    ///
    /// Fails with `NotFound` if no such element exists; the index is left
    /// untouched.
    pub fn remove<K, F>(&mut self, key: &K, element: &C::Item, cmp: F) -> Result<usize>
    where
        K: ?Sized,
        F: FnMut(&C::Item, &K) -> Ordering,
        C::Item: PartialEq,
    {
        self.check_writable()?;
        let run = match self.search_first_and_last(key, cmp)? {
            SearchRange::NotFound(_) => return Err(CorvidError::NotFound),
            found => found.as_range(),
        };
        for ordinal in run {
            if self.read_item(ordinal)? == *element {
                self.remove_at(ordinal)?;
                return Ok(ordinal);
            }
        }
        Err(CorvidError::NotFound)
    }

    // =========================================================================
    // Positional mutation
    // =========================================================================

    /// Appends `element` without consulting any comparator. The caller is
    /// responsible for keeping the index ordered.
    pub fn add(&mut self, element: &C::Item) -> Result<usize> {
        let ordinal = self.count();
        self.insert_at(element, ordinal)?;
        Ok(ordinal)
    }

    /// Inserts `element` at `offset`, shifting later elements up by one.
    pub fn insert_at(&mut self, element: &C::Item, offset: usize) -> Result<()> {
        self.check_writable()?;
        let count = self.count();
        if offset > count {
            return Err(CorvidError::OutOfRange { offset, count });
        }

        let src = self.byte_offset(offset);
        let tail = self.byte_offset(count) - src;
        self.store.set_len(self.byte_offset(count + 1))?;
        self.store.copy_within(src, src + self.width as u64, tail)?;
        self.write_item(offset, element)?;

        trace!(offset, count = count + 1, "sorted index insert");
        Ok(())
    }

    /// Removes and returns the element at `offset`, shifting later elements
    /// down by one.
    pub fn remove_at(&mut self, offset: usize) -> Result<C::Item> {
        self.check_writable()?;
        let count = self.count();
        if offset >= count {
            return Err(CorvidError::OutOfRange { offset, count });
        }

        let item = self.read_item(offset)?;
        let dst = self.byte_offset(offset);
        let src = dst + self.width as u64;
        let tail = self.byte_offset(count) - src;
        self.store.copy_within(src, dst, tail)?;
        self.store.set_len(self.byte_offset(count - 1))?;

        trace!(offset, count = count - 1, "sorted index remove");
        Ok(item)
    }

    /// Removes every element.
    pub fn clear(&mut self) -> Result<()> {
        self.check_writable()?;
        self.store.set_len(0)?;
        self.store.set_position(0);
        Ok(())
    }

    /// Removes `size` elements starting at `offset`.
    pub fn clear_range(&mut self, offset: usize, size: usize) -> Result<()> {
        self.check_writable()?;
        let count = self.count();
        let end = offset.checked_add(size).filter(|end| *end <= count).ok_or(
            CorvidError::OutOfRange {
                offset: offset.saturating_add(size),
                count,
            },
        )?;
        if size == 0 {
            return Ok(());
        }

        let dst = self.byte_offset(offset);
        let src = self.byte_offset(end);
        let tail = self.byte_offset(count) - src;
        self.store.copy_within(src, dst, tail)?;
        self.store.set_len(self.byte_offset(count - size))?;
        Ok(())
    }

    // =========================================================================
    // Cursors
    // =========================================================================

    /// Returns a cursor over every element.
    pub fn cursor(&mut self) -> IndexCursor<'_, C, S> {
        let count = self.count();
        IndexCursor::new(self, 0, count)
    }

    /// Returns a cursor over the elements `range.start..range.end`.
    ///
    /// Fails with `OutOfRange` if the range is reversed or extends past the
    /// last element.
    pub fn cursor_range(&mut self, range: Range<usize>) -> Result<IndexCursor<'_, C, S>> {
        let count = self.count();
        if range.start > range.end {
            return Err(CorvidError::OutOfRange {
                offset: range.start,
                count,
            });
        }
        if range.end > count {
            return Err(CorvidError::OutOfRange {
                offset: range.end,
                count,
            });
        }
        Ok(IndexCursor::new(self, range.start, range.end))
    }
}
