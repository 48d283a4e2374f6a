//! Byte-addressable persistent memory
//!
//! The collaborator behind the EEPROM backend: read and write raw bytes at an
//! offset. Two implementations are provided, an in-memory image (tests, sims)
//! and a flat file image (EEPROM emulation on a file system).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;

use crate::error::{DevNameError, Result};

/// Value of never-written EEPROM cells
pub const ERASED_BYTE: u8 = 0xFF;

/// Offset-addressed persistent memory
pub trait ByteStore {
    /// Read `len` bytes starting at `offset`
    fn read(&mut self, offset: usize, len: usize) -> Result<Vec<u8>>;

    /// Write `bytes` starting at `offset`
    fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()>;
}

// =============================================================================
// In-Memory Image
// =============================================================================

/// Fixed-capacity memory image, shared between clones
///
/// Cloning hands out another view of the same bytes, so a caller can keep one
/// handle while the engine owns the backend.
#[derive(Debug, Clone)]
pub struct MemoryByteStore {
    bytes: Arc<Mutex<BytesMut>>,
}

impl MemoryByteStore {
    /// Create an erased image of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        let mut bytes = BytesMut::with_capacity(capacity);
        bytes.resize(capacity, ERASED_BYTE);
        Self {
            bytes: Arc::new(Mutex::new(bytes)),
        }
    }

    /// Total addressable bytes
    pub fn capacity(&self) -> usize {
        self.bytes.lock().len()
    }

    /// Copy of the whole image
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.lock().to_vec()
    }
}

fn check_range(offset: usize, len: usize, capacity: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(DevNameError::Storage(format!(
            "range {}..{} outside {}-byte store",
            offset,
            offset.saturating_add(len),
            capacity
        ))),
    }
}

impl ByteStore for MemoryByteStore {
    fn read(&mut self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let bytes = self.bytes.lock();
        check_range(offset, len, bytes.len())?;
        Ok(bytes[offset..offset + len].to_vec())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        let mut bytes = self.bytes.lock();
        check_range(offset, data.len(), bytes.len())?;
        bytes[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }
}

// =============================================================================
// File Image
// =============================================================================

/// A flat file treated as byte-addressable memory
///
/// Reads past the end of the file fail with `ShortRead`; writes past the end
/// grow the file.
#[derive(Debug, Clone)]
pub struct FileByteStore {
    path: PathBuf,
}

impl FileByteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        Ok(file)
    }
}

impl ByteStore for FileByteStore {
    fn read(&mut self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let mut file = self.open()?;
        file.seek(SeekFrom::Start(offset as u64))?;

        let mut buf = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut buf)?;

        if buf.len() != len {
            return Err(DevNameError::ShortRead {
                expected: len,
                actual: buf.len(),
            });
        }
        Ok(buf)
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let mut file = self.open()?;
        file.seek(SeekFrom::Start(offset as u64))?;
        file.write_all(bytes)?;
        file.sync_data()?;
        Ok(())
    }
}
