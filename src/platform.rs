//! Platform Collaborators
//!
//! The engine never touches the network or the clock directly. It talks to
//! these traits, injected at construction, so it can run against real
//! hardware glue or against the fakes in `sim`.
//!
//! ## Event Delivery
//! ```text
//!  pub/sub context                 tick context
//!  ┌──────────────┐  deliver()  ┌─────────────────────┐   drained by
//!  │ Cloud handler│ ──────────▶ │ crossbeam channel   │ ─────────────▶ NameEngine::tick
//!  └──────────────┘  EventSink  └─────────────────────┘
//! ```
//! Inbound payloads only cross contexts through the channel, so the record and
//! the "response received" flag are written on the tick path alone. The channel
//! holds a single payload; a newer one replaces any the engine has not read yet.

use std::sync::{Arc, Weak};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crossbeam::channel::{Receiver, Sender, TrySendError};

use crate::error::Result;

// =============================================================================
// Event Sink
// =============================================================================

/// Handle the pub/sub layer uses to hand a name response to the engine
///
/// Cheap to clone, safe to use from any thread.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<Vec<u8>>,
    /// The engine's end of the channel, used to evict an unread payload
    rx: Weak<Receiver<Vec<u8>>>,
}

impl EventSink {
    pub(crate) fn new(tx: Sender<Vec<u8>>, rx: &Arc<Receiver<Vec<u8>>>) -> Self {
        Self {
            tx,
            rx: Arc::downgrade(rx),
        }
    }

    /// Hand a response payload to the next tick
    ///
    /// Replaces a payload the engine has not read yet. Returns false if the
    /// engine is gone.
    pub fn deliver(&self, payload: &[u8]) -> bool {
        let Some(rx) = self.rx.upgrade() else {
            return false;
        };

        let mut pending = payload.to_vec();
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => return true,
                Err(TrySendError::Full(returned)) => {
                    if rx.try_recv().is_ok() {
                        tracing::trace!("Replaced unread name response");
                    }
                    pending = returned;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

// =============================================================================
// Cloud
// =============================================================================

/// Pub/sub transport plus its connectivity signal
pub trait Cloud {
    /// True when the cloud session is up
    fn is_connected(&self) -> bool;

    /// Register `sink` for events on `topic`
    ///
    /// There is no per-handler unsubscribe; see
    /// `NameEngine::subscription_removed`.
    fn subscribe(&mut self, topic: &str, sink: EventSink) -> Result<()>;

    /// Publish an event with no payload on `topic`
    fn publish(&mut self, topic: &str) -> Result<()>;
}

// =============================================================================
// Clock
// =============================================================================

/// Monotonic ticks plus wall-clock time
pub trait Clock {
    /// Monotonic milliseconds; only differences are meaningful
    fn millis(&self) -> u64;

    /// Wall-clock seconds since the Unix epoch
    fn now(&self) -> i64;

    /// True once wall-clock time has been synchronized
    fn is_valid(&self) -> bool;
}

/// Clock backed by the host OS
///
/// Host clocks are assumed to be synced (NTP or similar); `is_valid` only
/// rejects a wall clock set before the Unix epoch.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    fn is_valid(&self) -> bool {
        SystemTime::now().duration_since(UNIX_EPOCH).is_ok()
    }
}
