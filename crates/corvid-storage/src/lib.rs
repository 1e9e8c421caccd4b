//! Storage layer for CorvidDB.
//!
//! This crate provides:
//! - Byte stores (in-memory and file-backed) addressed by byte offset
//! - Fixed-width item codecs
//! - Row identifiers
//! - The sorted index engine and its cursor

mod codec;
mod index;
mod row_id;
mod store;

pub use codec::{I64Codec, ItemCodec, RowIdCodec, U64Codec};
pub use index::{Direction, IndexCursor, SearchRange, SearchResult, SortedIndex};
pub use row_id::RowId;
pub use store::{ByteStore, FileStore, MemoryStore};
