//! Fixed-width item codecs.
//!
//! A codec turns an index element into exactly `width()` bytes and back.
//! The width is fixed for the lifetime of an index; the sorted index relies
//! on it to translate ordinals into byte offsets.

use crate::row_id::RowId;

/// Fixed-width binary encoding of an index element.
pub trait ItemCodec {
    /// The element type stored in the index.
    type Item;

    /// Encoded width in bytes. Must be constant and non-zero.
    fn width(&self) -> usize;

    /// Encodes `item` into `buf`, which is exactly `width()` bytes long.
    fn encode(&self, item: &Self::Item, buf: &mut [u8]);

    /// Decodes an element from `buf`, which is exactly `width()` bytes long.
    fn decode(&self, buf: &[u8]) -> Self::Item;
}

/// 8-byte big-endian row identifier codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowIdCodec;

impl ItemCodec for RowIdCodec {
    type Item = RowId;

    #[inline]
    fn width(&self) -> usize {
        8
    }

    #[inline]
    fn encode(&self, item: &RowId, buf: &mut [u8]) {
        buf.copy_from_slice(&item.0.to_be_bytes());
    }

    #[inline]
    fn decode(&self, buf: &[u8]) -> RowId {
        RowId(read_u64(buf))
    }
}

/// 8-byte big-endian unsigned integer codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Codec;

impl ItemCodec for U64Codec {
    type Item = u64;

    #[inline]
    fn width(&self) -> usize {
        8
    }

    #[inline]
    fn encode(&self, item: &u64, buf: &mut [u8]) {
        buf.copy_from_slice(&item.to_be_bytes());
    }

    #[inline]
    fn decode(&self, buf: &[u8]) -> u64 {
        read_u64(buf)
    }
}

/// 8-byte signed integer codec.
///
/// The sign bit is flipped so the encoded bytes sort in the same order as
/// the integers they hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct I64Codec;

impl ItemCodec for I64Codec {
    type Item = i64;

    #[inline]
    fn width(&self) -> usize {
        8
    }

    #[inline]
    fn encode(&self, item: &i64, buf: &mut [u8]) {
        let flipped = (*item as u64) ^ (1 << 63);
        buf.copy_from_slice(&flipped.to_be_bytes());
    }

    #[inline]
    fn decode(&self, buf: &[u8]) -> i64 {
        (read_u64(buf) ^ (1 << 63)) as i64
    }
}

#[inline]
fn read_u64(buf: &[u8]) -> u64 {
    u64::from_be_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ])
}
