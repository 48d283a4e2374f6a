//! # devname
//!
//! Fetches the human-assigned device name from the cloud and keeps it cached:
//! - Asynchronous request/response over pub/sub, with timeout and backoff
//! - Fixed-layout persisted record, validated on load
//! - Pluggable storage: volatile, EEPROM, retained memory or a file
//! - Optional periodic recheck and on-demand forced checks
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Driver                                │
//! │              (calls tick() on a regular cadence)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     NameEngine                               │
//! │        (Subscribe → WaitConnected → … → WaitRecheck)         │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//!  ┌─────────────┐      ┌───────────────┐      ┌─────────────┐
//!  │    Cloud    │      │PersistedRecord│      │    Clock    │
//!  │  (pub/sub)  │      │   (48 bytes)  │      │ (mono+wall) │
//!  └─────────────┘      └───────┬───────┘      └─────────────┘
//!                               │
//!                               ▼
//!                       ┌───────────────┐
//!                       │StorageBackend │
//!                       └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod platform;
pub mod engine;
pub mod sim;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DevNameError, Result};
pub use config::Config;
pub use engine::{NameEngine, State};
pub use record::PersistedRecord;
pub use storage::StorageBackend;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of devname
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
