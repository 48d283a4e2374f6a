//! Persisted Record Module
//!
//! The fixed-layout binary record that caches the device name between runs.
//!
//! ## Responsibilities
//! - Encode/decode the record in its fixed wire layout
//! - Detect uninitialized, foreign or stale-schema data via magic + size
//! - Reset invalid data wholesale (no field-by-field migration)
//! - Hold the bounded, NUL-terminated name buffer
//!
//! ## Wire Layout (little-endian, 48 bytes)
//! ```text
//! ┌───────────┬──────────┬───────────┬──────────────┬──────────────────┬───────────────┐
//! │ Magic (4) │ Size (1) │ Flags (1) │ Reserved (2) │ Last Check (8)   │ Name (32)     │
//! │ 0x7787a2f2│    48    │     0     │      0       │ i64 epoch secs   │ NUL-terminated│
//! └───────────┴──────────┴───────────┴──────────────┴──────────────────┴───────────────┘
//! ```
//!
//! Changing `MAX_NAME_LEN` or adding a field changes `RECORD_SIZE`, which
//! invalidates every previously persisted record on the next load.

mod layout;

pub use layout::{validate_or_reset, PersistedRecord};

/// Sentinel identifying an initialized record of this schema
pub const MAGIC: u32 = 0x7787_a2f2;

/// Maximum name length in bytes; the buffer holds one more for the terminator
pub const MAX_NAME_LEN: usize = 31;

/// Size of the name buffer including the terminator
pub const NAME_BUF_LEN: usize = MAX_NAME_LEN + 1;

/// Serialized size of a record
pub const RECORD_SIZE: usize = 4 + 1 + 1 + 2 + 8 + NAME_BUF_LEN;

// The size field is a single byte.
const _: () = assert!(RECORD_SIZE <= u8::MAX as usize);
