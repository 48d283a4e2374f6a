//! Volatile backend
//!
//! Nothing survives a restart; the name is fetched on every boot.

use crate::error::Result;
use crate::record::PersistedRecord;

use super::StorageBackend;

/// Keeps the record in RAM only
#[derive(Debug, Default, Clone, Copy)]
pub struct VolatileStore;

impl VolatileStore {
    pub fn new() -> Self {
        Self
    }
}

impl StorageBackend for VolatileStore {
    fn load(&mut self) -> PersistedRecord {
        PersistedRecord::new()
    }

    fn save(&mut self, _record: &PersistedRecord) -> Result<()> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "volatile"
    }
}
