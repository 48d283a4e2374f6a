//! EEPROM backend
//!
//! Stores the record in a fixed window of byte-addressable memory. The caller
//! picks the start offset and must keep `offset..offset + RECORD_SIZE` clear
//! of other data.

use crate::error::Result;
use crate::record::{validate_or_reset, PersistedRecord, RECORD_SIZE};

use super::{ByteStore, StorageBackend};

/// Record stored at a byte offset in persistent memory
#[derive(Debug)]
pub struct EepromStore<B: ByteStore> {
    store: B,
    offset: usize,
}

impl<B: ByteStore> EepromStore<B> {
    pub fn new(store: B, offset: usize) -> Self {
        Self { store, offset }
    }

    /// Start offset of the record window
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The underlying byte store
    pub fn byte_store(&self) -> &B {
        &self.store
    }
}

impl<B: ByteStore> StorageBackend for EepromStore<B> {
    fn load(&mut self) -> PersistedRecord {
        match self.store.read(self.offset, RECORD_SIZE) {
            Ok(bytes) => validate_or_reset(&bytes),
            Err(e) => {
                tracing::warn!(offset = self.offset, "EEPROM read failed, starting empty: {}", e);
                PersistedRecord::new()
            }
        }
    }

    fn save(&mut self, record: &PersistedRecord) -> Result<()> {
        let bytes = record.encode()?;
        self.store.write(self.offset, &bytes)
    }

    fn kind(&self) -> &'static str {
        "eeprom"
    }
}
