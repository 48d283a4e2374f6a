//! Simulated Platform
//!
//! Deterministic stand-ins for the cloud and the clock. Used by the
//! `devname-sim` driver, the integration tests and the benches.
//!
//! Both types are handles: clones share state, so a test can keep one copy
//! while the engine owns another.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{DevNameError, Result};
use crate::platform::{Clock, Cloud, EventSink};

// =============================================================================
// Simulated Cloud
// =============================================================================

#[derive(Debug, Default)]
struct CloudState {
    connected: bool,
    /// Answer sent on the published topic, if any
    auto_reply: Option<Vec<u8>>,
    subscriptions: Vec<(String, EventSink)>,
    subscribe_calls: usize,
    published: Vec<String>,
    fail_subscribe: bool,
}

/// In-process pub/sub with a switchable connection
#[derive(Debug, Clone, Default)]
pub struct SimCloud {
    state: Arc<Mutex<CloudState>>,
}

impl SimCloud {
    /// A disconnected cloud with no auto-reply
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    /// Answer every publish with `name` on the same topic (None = stay silent)
    pub fn set_auto_reply(&self, name: Option<&str>) {
        self.state.lock().auto_reply = name.map(|n| n.as_bytes().to_vec());
    }

    /// Make subsequent subscribe calls fail
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.state.lock().fail_subscribe = fail;
    }

    /// Deliver `payload` to every handler on `topic`; returns how many got it
    pub fn emit(&self, topic: &str, payload: &[u8]) -> usize {
        let state = self.state.lock();
        Self::deliver(&state, topic, payload)
    }

    /// Drop every handler, like a global unsubscribe
    pub fn unsubscribe_all(&self) {
        self.state.lock().subscriptions.clear();
    }

    /// Handlers currently registered
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Successful subscribe calls so far
    pub fn subscribe_calls(&self) -> usize {
        self.state.lock().subscribe_calls
    }

    /// Publishes so far
    pub fn publish_count(&self) -> usize {
        self.state.lock().published.len()
    }

    /// Topics published so far, oldest first
    pub fn published(&self) -> Vec<String> {
        self.state.lock().published.clone()
    }

    fn deliver(state: &CloudState, topic: &str, payload: &[u8]) -> usize {
        let mut delivered = 0;
        for (subscribed, sink) in &state.subscriptions {
            if subscribed.as_str() == topic && sink.deliver(payload) {
                delivered += 1;
            }
        }
        delivered
    }
}

impl Cloud for SimCloud {
    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn subscribe(&mut self, topic: &str, sink: EventSink) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_subscribe {
            return Err(DevNameError::Cloud("subscription rejected".to_string()));
        }
        state.subscriptions.push((topic.to_string(), sink));
        state.subscribe_calls += 1;
        Ok(())
    }

    fn publish(&mut self, topic: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(DevNameError::Cloud("not connected".to_string()));
        }
        state.published.push(topic.to_string());

        if let Some(reply) = state.auto_reply.clone() {
            Self::deliver(&state, topic, &reply);
        }
        Ok(())
    }
}

// =============================================================================
// Manual Clock
// =============================================================================

#[derive(Debug)]
struct ClockState {
    millis: AtomicU64,
    unix_millis: AtomicI64,
    valid: AtomicBool,
}

/// A clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<ClockState>,
}

impl ManualClock {
    /// Start at monotonic 0 and wall time `unix_secs`, not yet valid
    pub fn new(unix_secs: i64) -> Self {
        Self {
            state: Arc::new(ClockState {
                millis: AtomicU64::new(0),
                unix_millis: AtomicI64::new(unix_secs.saturating_mul(1000)),
                valid: AtomicBool::new(false),
            }),
        }
    }

    /// Move both clocks forward
    pub fn advance(&self, by: Duration) {
        let ms = by.as_millis() as u64;
        self.state.millis.fetch_add(ms, Ordering::SeqCst);
        self.state.unix_millis.fetch_add(ms as i64, Ordering::SeqCst);
    }

    /// Mark wall-clock time as synchronized or not
    pub fn set_valid(&self, valid: bool) {
        self.state.valid.store(valid, Ordering::SeqCst);
    }

    /// Jump wall-clock time without touching the monotonic clock
    pub fn set_now(&self, unix_secs: i64) {
        self.state
            .unix_millis
            .store(unix_secs.saturating_mul(1000), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn millis(&self) -> u64 {
        self.state.millis.load(Ordering::SeqCst)
    }

    fn now(&self) -> i64 {
        self.state.unix_millis.load(Ordering::SeqCst) / 1000
    }

    fn is_valid(&self) -> bool {
        self.state.valid.load(Ordering::SeqCst)
    }
}
