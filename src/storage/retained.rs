//! Retained-memory backend
//!
//! The caller owns a buffer that survives sleep and soft resets but not power
//! loss. The engine validates it in place on load and writes straight through
//! to it on save, so the buffer always mirrors the engine's record.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::record::{validate_or_reset, PersistedRecord, RECORD_SIZE};

use super::StorageBackend;

/// Caller-owned record bytes
///
/// Clones share the same bytes. Content is arbitrary until the first load,
/// exactly like retained RAM after a cold boot.
#[derive(Debug, Clone)]
pub struct RetainedBuffer {
    bytes: Arc<Mutex<[u8; RECORD_SIZE]>>,
}

impl RetainedBuffer {
    /// A zero-filled buffer
    pub fn new() -> Self {
        Self::from_bytes([0; RECORD_SIZE])
    }

    /// A buffer holding whatever was retained
    pub fn from_bytes(bytes: [u8; RECORD_SIZE]) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(bytes)),
        }
    }

    /// Copy of the raw bytes
    pub fn contents(&self) -> [u8; RECORD_SIZE] {
        *self.bytes.lock()
    }

    /// The buffer interpreted as a record (validated, not written back)
    pub fn record(&self) -> PersistedRecord {
        validate_or_reset(&self.contents())
    }
}

impl Default for RetainedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Record living in a caller-owned retained buffer
#[derive(Debug, Clone)]
pub struct RetainedStore {
    buffer: RetainedBuffer,
}

impl RetainedStore {
    pub fn new(buffer: RetainedBuffer) -> Self {
        Self { buffer }
    }

    pub fn buffer(&self) -> &RetainedBuffer {
        &self.buffer
    }

    fn write_through(&self, record: &PersistedRecord) -> Result<()> {
        let encoded = record.encode()?;
        self.buffer.bytes.lock().copy_from_slice(&encoded);
        Ok(())
    }
}

impl StorageBackend for RetainedStore {
    fn load(&mut self) -> PersistedRecord {
        let record = self.buffer.record();

        // Normalize in place so the retained copy is stamped too.
        if let Err(e) = self.write_through(&record) {
            tracing::warn!("Could not normalize retained buffer: {}", e);
        }
        record
    }

    fn save(&mut self, record: &PersistedRecord) -> Result<()> {
        self.write_through(record)
    }

    fn kind(&self) -> &'static str {
        "retained"
    }
}
