//! Storage Module
//!
//! Where the cached record lives between runs.
//!
//! ## Responsibilities
//! - Load the record once at startup, validated (see `record::validate_or_reset`)
//! - Save it after every successful fetch
//! - Never abort the engine: a failed read degrades to an empty record, a
//!   failed write to "fetch again next cycle"
//!
//! ## Backends
//! ```text
//! ┌──────────────┬──────────────────────────────┬─────────────────────────────┐
//! │ Backend      │ load                         │ save                        │
//! ├──────────────┼──────────────────────────────┼─────────────────────────────┤
//! │ Volatile     │ fresh record every time      │ no-op                       │
//! │ Eeprom       │ RECORD_SIZE bytes at offset  │ write back at same offset   │
//! │ Retained     │ caller-owned buffer          │ write through to the buffer │
//! │ File         │ open/create, read RECORD_SIZE│ rewrite the whole record    │
//! └──────────────┴──────────────────────────────┴─────────────────────────────┘
//! ```

mod byte_store;
mod eeprom;
mod file;
mod retained;
mod volatile;

pub use byte_store::{ByteStore, FileByteStore, MemoryByteStore};
pub use eeprom::EepromStore;
pub use file::FileStore;
pub use retained::{RetainedBuffer, RetainedStore};
pub use volatile::VolatileStore;

use crate::error::Result;
use crate::record::PersistedRecord;

/// A medium the engine's record can be loaded from and saved to
///
/// `load` is infallible by contract: anything unreadable or invalid comes back
/// as a fresh, empty record. `save` reports failures so the engine can log
/// them, but the engine never stops because of one.
pub trait StorageBackend {
    /// Read and validate the stored record
    fn load(&mut self) -> PersistedRecord;

    /// Persist the record
    fn save(&mut self, record: &PersistedRecord) -> Result<()>;

    /// Short backend name for logs
    fn kind(&self) -> &'static str;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn load(&mut self) -> PersistedRecord {
        (**self).load()
    }

    fn save(&mut self, record: &PersistedRecord) -> Result<()> {
        (**self).save(record)
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}
