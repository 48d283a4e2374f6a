//! File backend
//!
//! One small file holds exactly one record. The file is created on first load;
//! anything shorter than `RECORD_SIZE` is treated as absent.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_FILE_PATH;
use crate::error::{DevNameError, Result};
use crate::record::{validate_or_reset, PersistedRecord, RECORD_SIZE};

use super::StorageBackend;

/// Record stored in its own file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
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

    /// Read exactly one record's worth of bytes
    fn read_raw(&self) -> Result<Vec<u8>> {
        let file = self.open()?;

        let mut buf = Vec::with_capacity(RECORD_SIZE);
        file.take(RECORD_SIZE as u64).read_to_end(&mut buf)?;

        if buf.len() != RECORD_SIZE {
            return Err(DevNameError::ShortRead {
                expected: RECORD_SIZE,
                actual: buf.len(),
            });
        }
        Ok(buf)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_PATH)
    }
}

impl StorageBackend for FileStore {
    fn load(&mut self) -> PersistedRecord {
        match self.read_raw() {
            Ok(bytes) => validate_or_reset(&bytes),
            Err(DevNameError::ShortRead { actual, .. }) => {
                tracing::debug!(path = %self.path.display(), actual, "No usable record in file");
                PersistedRecord::new()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Record file unreadable: {}", e);
                PersistedRecord::new()
            }
        }
    }

    fn save(&mut self, record: &PersistedRecord) -> Result<()> {
        let bytes = record.encode()?;

        let mut file = self.open()?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&bytes)?;
        file.set_len(RECORD_SIZE as u64)?;
        file.sync_data()?;

        Ok(())
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}
