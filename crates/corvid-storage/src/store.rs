//! Byte stores: resizable, randomly addressable byte sequences with a
//! current read/write position.
//!
//! Every sorted index writes into exactly one store. Positions handed to a
//! store by the index are always `ordinal * item_width`.

use bytes::BytesMut;
use corvid_common::{CorvidError, Result};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Chunk size used when shifting bytes inside a store that cannot move
/// memory directly.
const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// A resizable byte sequence with a movable position.
pub trait ByteStore: std::fmt::Debug + Send {
    /// Current length in bytes.
    fn len(&self) -> u64;

    /// Returns true if the store holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current read/write position.
    fn position(&self) -> u64;

    /// Moves the read/write position. Positions past the end are allowed;
    /// a later write fills the gap with zeros.
    fn set_position(&mut self, position: u64);

    /// Reads up to `buf.len()` bytes at the current position and advances
    /// it. Returns the number of bytes read (short at the end of the store).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Writes `buf` at the current position, extending the store if needed,
    /// and advances the position.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Truncates or zero-extends the store to `len` bytes.
    fn set_len(&mut self, len: u64) -> Result<()>;

    /// Returns true if writes and resizes are rejected.
    fn is_read_only(&self) -> bool;

    /// Flushes buffered writes to the backing medium.
    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reads exactly `buf.len()` bytes starting at `position`.
    fn read_exact_at(&mut self, position: u64, buf: &mut [u8]) -> Result<()> {
        self.set_position(position);
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(CorvidError::Io(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!(
                        "short read at {}: wanted {} bytes, got {}",
                        position,
                        buf.len(),
                        filled
                    ),
                )));
            }
            filled += n;
        }
        Ok(())
    }

    /// Writes `buf` starting at `position`.
    fn write_at(&mut self, position: u64, buf: &[u8]) -> Result<()> {
        self.set_position(position);
        self.write(buf)
    }

    /// Copies `len` bytes from `src` to `dst`. The ranges may overlap.
    fn copy_within(&mut self, src: u64, dst: u64, len: u64) -> Result<()> {
        if len == 0 || src == dst {
            return Ok(());
        }
        let mut chunk = vec![0u8; (len as usize).min(COPY_CHUNK_SIZE)];
        if dst > src {
            // Moving towards the end: copy back to front.
            let mut remaining = len;
            while remaining > 0 {
                let n = remaining.min(chunk.len() as u64);
                let offset = remaining - n;
                self.read_exact_at(src + offset, &mut chunk[..n as usize])?;
                self.write_at(dst + offset, &chunk[..n as usize])?;
                remaining -= n;
            }
        } else {
            let mut done = 0;
            while done < len {
                let n = (len - done).min(chunk.len() as u64);
                self.read_exact_at(src + done, &mut chunk[..n as usize])?;
                self.write_at(dst + done, &chunk[..n as usize])?;
                done += n;
            }
        }
        Ok(())
    }
}

impl<S: ByteStore + ?Sized> ByteStore for Box<S> {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn set_position(&mut self, position: u64) {
        (**self).set_position(position)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write(buf)
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        (**self).set_len(len)
    }

    fn is_read_only(&self) -> bool {
        (**self).is_read_only()
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }

    fn copy_within(&mut self, src: u64, dst: u64, len: u64) -> Result<()> {
        (**self).copy_within(src, dst, len)
    }
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory byte store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: BytesMut,
    position: u64,
    read_only: bool,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            position: 0,
            read_only: false,
        }
    }

    /// Creates a store holding a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
            position: 0,
            read_only: false,
        }
    }

    /// Marks this store read-only.
    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Returns the stored bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(CorvidError::ReadOnly);
        }
        Ok(())
    }
}

impl ByteStore for MemoryStore {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let len = self.data.len();
        let start = (self.position as usize).min(len);
        let n = buf.len().min(len - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.check_writable()?;
        let start = self.position as usize;
        let end = start + buf.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
        self.position = end as u64;
        Ok(())
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        self.check_writable()?;
        self.data.resize(len as usize, 0);
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn copy_within(&mut self, src: u64, dst: u64, len: u64) -> Result<()> {
        self.check_writable()?;
        let (src, dst, len) = (src as usize, dst as usize, len as usize);
        if dst + len > self.data.len() {
            self.data.resize(dst + len, 0);
        }
        self.data.copy_within(src..src + len, dst);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// File-backed byte store.
#[derive(Debug)]
pub struct FileStore {
    /// The file handle.
    file: File,
    /// Path to the file (None for anonymous temp files).
    path: Option<PathBuf>,
    /// Cached file length.
    len: u64,
    /// Current read/write position.
    position: u64,
    read_only: bool,
}

impl FileStore {
    /// Opens or creates a store file for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
            len,
            position: 0,
            read_only: false,
        })
    }

    /// Opens an existing store file read-only.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            path: Some(path.to_path_buf()),
            len,
            position: 0,
            read_only: true,
        })
    }

    /// Creates an anonymous temporary store, removed when dropped.
    pub fn temporary(dir: Option<&Path>) -> Result<Self> {
        let file = match dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        Ok(Self {
            file,
            path: None,
            len: 0,
            position: 0,
            read_only: false,
        })
    }

    /// Returns the file path, if the store is not anonymous.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            return Err(CorvidError::ReadOnly);
        }
        Ok(())
    }
}

impl ByteStore for FileStore {
    fn len(&self) -> u64 {
        self.len
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.position >= self.len {
            return Ok(0);
        }
        let available = (self.len - self.position) as usize;
        let want = buf.len().min(available);
        self.file.seek(SeekFrom::Start(self.position))?;
        let n = self.file.read(&mut buf[..want])?;
        self.position += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.check_writable()?;
        self.file.seek(SeekFrom::Start(self.position))?;
        self.file.write_all(buf)?;
        self.position += buf.len() as u64;
        self.len = self.len.max(self.position);
        Ok(())
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        self.check_writable()?;
        self.file.set_len(len)?;
        self.len = len;
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn sync(&mut self) -> Result<()> {
        if !self.read_only {
            self.file.sync_data()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise_store(store: &mut dyn ByteStore) {
        store.write_at(0, b"abcdef").unwrap();
        assert_eq!(store.len(), 6);
        assert_eq!(store.position(), 6);

        let mut buf = [0u8; 3];
        store.read_exact_at(2, &mut buf).unwrap();
        assert_eq!(&buf, b"cde");

        // Shift right by two (overlapping)
        store.set_len(8).unwrap();
        store.copy_within(2, 4, 4).unwrap();
        let mut all = [0u8; 8];
        store.read_exact_at(0, &mut all).unwrap();
        assert_eq!(&all[..2], b"ab");
        assert_eq!(&all[4..], b"cdef");

        // Shift left back over the gap
        store.copy_within(4, 2, 4).unwrap();
        store.set_len(6).unwrap();
        let mut all = [0u8; 6];
        store.read_exact_at(0, &mut all).unwrap();
        assert_eq!(&all, b"abcdef");
    }

    #[test]
    fn test_memory_store_basic() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        exercise_store(&mut store);
        assert_eq!(store.as_bytes(), b"abcdef");
    }

    #[test]
    fn test_memory_store_short_read() {
        let mut store = MemoryStore::from_bytes(b"xy");
        let mut buf = [0u8; 4];
        store.set_position(0);
        assert_eq!(store.read(&mut buf).unwrap(), 2);
        assert_eq!(store.read(&mut buf).unwrap(), 0);
        assert!(store.read_exact_at(1, &mut buf).is_err());
    }

    #[test]
    fn test_memory_store_write_past_end_zero_fills() {
        let mut store = MemoryStore::new();
        store.write_at(4, b"z").unwrap();
        assert_eq!(store.as_bytes(), &[0, 0, 0, 0, b'z']);
    }

    #[test]
    fn test_memory_store_read_only() {
        let mut store = MemoryStore::from_bytes(b"data").into_read_only();
        assert!(store.is_read_only());
        assert!(matches!(store.write_at(0, b"x"), Err(CorvidError::ReadOnly)));
        assert!(matches!(store.set_len(0), Err(CorvidError::ReadOnly)));
        assert!(matches!(store.copy_within(0, 1, 2), Err(CorvidError::ReadOnly)));

        let mut buf = [0u8; 4];
        store.read_exact_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"data");
    }

    #[test]
    fn test_file_store_basic() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("store.bin")).unwrap();
        exercise_store(&mut store);
        store.sync().unwrap();
        assert!(store.path().is_some());
    }

    #[test]
    fn test_file_store_reopen_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ro.bin");
        {
            let mut store = FileStore::open(&path).unwrap();
            store.write_at(0, b"persist").unwrap();
            store.sync().unwrap();
        }

        let mut store = FileStore::open_read_only(&path).unwrap();
        assert_eq!(store.len(), 7);
        assert!(store.is_read_only());
        let mut buf = [0u8; 7];
        store.read_exact_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"persist");
        assert!(matches!(store.write_at(0, b"x"), Err(CorvidError::ReadOnly)));
    }

    #[test]
    fn test_file_store_temporary() {
        let mut store = FileStore::temporary(None).unwrap();
        assert!(store.path().is_none());
        exercise_store(&mut store);
    }

    #[test]
    fn test_boxed_store_forwards() {
        let mut store: Box<dyn ByteStore> = Box::new(MemoryStore::new());
        exercise_store(&mut store);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_chunked_copy_large_region() {
        let mut store = FileStore::temporary(None).unwrap();
        let data: Vec<u8> = (0..(COPY_CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();
        store.write_at(0, &data).unwrap();
        store.set_len(data.len() as u64 + 8).unwrap();
        store.copy_within(0, 8, data.len() as u64).unwrap();

        let mut out = vec![0u8; data.len()];
        store.read_exact_at(8, &mut out).unwrap();
        assert_eq!(out, data);
    }
}
