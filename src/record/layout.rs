//! Persisted record layout
//!
//! The record struct, its bincode codec and the validate-or-reset policy.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::error::{DevNameError, Result};

use super::{MAGIC, MAX_NAME_LEN, NAME_BUF_LEN, RECORD_SIZE};

/// The cached device name plus the metadata needed to trust it
///
/// Field order is the wire order; bincode writes fixed-width little-endian
/// integers and the name array without a length prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    /// Sentinel, `MAGIC` when initialized
    pub magic: u32,

    /// Serialized size at creation time, `RECORD_SIZE` for this schema
    pub size: u8,

    /// Unused, round-trips unchanged
    pub flags: u8,

    /// Unused, round-trips unchanged
    pub reserved: u16,

    /// Epoch seconds of the last successful fetch, 0 = never
    pub last_check: i64,

    /// Name bytes, always NUL-terminated
    name: [u8; NAME_BUF_LEN],
}

impl PersistedRecord {
    /// A zeroed record stamped with the current magic and size
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            size: RECORD_SIZE as u8,
            flags: 0,
            reserved: 0,
            last_check: 0,
            name: [0; NAME_BUF_LEN],
        }
    }

    /// True if magic and size match the current schema
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC && self.size as usize == RECORD_SIZE
    }

    /// Serialize into the fixed wire layout
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug_assert_eq!(bytes.len(), RECORD_SIZE);
        Ok(bytes)
    }

    /// Deserialize from exactly `RECORD_SIZE` bytes
    ///
    /// Does not check magic/size; see `validate_or_reset` for that.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RECORD_SIZE {
            return Err(DevNameError::Storage(format!(
                "record must be {} bytes, got {}",
                RECORD_SIZE,
                bytes.len()
            )));
        }

        let mut record: PersistedRecord = bincode::deserialize(bytes)?;
        record.name[MAX_NAME_LEN] = 0;
        Ok(record)
    }

    // =========================================================================
    // Name Access
    // =========================================================================

    /// Name bytes up to (not including) the terminator
    pub fn name_bytes(&self) -> &[u8] {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(MAX_NAME_LEN);
        &self.name[..end]
    }

    /// The name as text; invalid UTF-8 is replaced, not rejected
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    /// True if a non-empty name is stored
    pub fn has_name(&self) -> bool {
        self.name[0] != 0
    }

    /// Store a name from a raw payload
    ///
    /// The payload is read as a C string: it ends at the first NUL. Anything
    /// beyond `MAX_NAME_LEN` bytes is dropped. Returns true if truncated.
    pub fn set_name(&mut self, payload: &[u8]) -> bool {
        let end = payload
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(payload.len());
        let len = end.min(MAX_NAME_LEN);

        self.name = [0; NAME_BUF_LEN];
        self.name[..len].copy_from_slice(&payload[..len]);

        end > MAX_NAME_LEN
    }
}

impl Default for PersistedRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize raw stored bytes into a trustworthy record
///
/// Wrong length, wrong magic or wrong size all yield a fresh record with the
/// current magic/size, an empty name and `last_check == 0`. Never fails:
/// uninitialized storage is the expected first-run state.
pub fn validate_or_reset(raw: &[u8]) -> PersistedRecord {
    match PersistedRecord::decode(raw) {
        Ok(record) if record.is_valid() => record,
        Ok(record) => {
            tracing::debug!(
                magic = record.magic,
                size = record.size,
                "Discarding record with foreign magic or stale layout"
            );
            PersistedRecord::new()
        }
        Err(e) => {
            tracing::debug!("Discarding undecodable record: {}", e);
            PersistedRecord::new()
        }
    }
}
