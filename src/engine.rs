//! Engine Module
//!
//! The name retrieval state machine.
//!
//! ## Responsibilities
//! - Load the cached record once from the configured backend
//! - Subscribe, wait for the cloud, request the name and wait for the answer
//! - Back off and retry on timeouts or empty answers
//! - Persist and announce every fetched name
//! - Re-enter the fetch cycle when the name goes stale or a check is forced
//!
//! ## States
//! ```text
//!   Start ──(cached name)──────────────────────────────┐
//!     │                                                 ▼
//!     └──▶ Subscribe ──▶ WaitConnected ──▶ WaitRequest ──▶ WaitResponse ──(name)──▶ WaitRecheck ──▶ Done
//!              ▲               ▲                              │                        │
//!              │               └──────── WaitRetry ◀──(timeout / empty)                │
//!              └────────────────────────(stale / forced)───────────────────────────────┘
//! ```
//!
//! Nothing blocks. Every wait state samples the monotonic clock on entry and
//! compares the elapsed time on each `tick()`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::config::Config;
use crate::error::Result;
use crate::platform::{Clock, Cloud, EventSink};
use crate::record::PersistedRecord;
use crate::storage::StorageBackend;

/// Called with the device name whenever one becomes known
pub type NameCallback = Box<dyn FnMut(&str) + Send>;

/// Phase of the fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Freshly opened; decides between the cached name and a fetch
    Start,
    /// Registers the response handler (once)
    Subscribe,
    /// Waits for a cloud session and a valid wall clock
    WaitConnected,
    /// Lets the subscription settle, then publishes the request
    WaitRequest,
    /// Waits for the name response or the timeout
    WaitResponse,
    /// Backs off before asking again
    WaitRetry,
    /// Periodically decides whether the name needs refreshing
    WaitRecheck,
    /// Nothing left to do until `force_check()`
    Done,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Fetches, caches and rechecks the device name
///
/// Single-threaded and cooperative: the driver calls `tick()` at a regular
/// cadence (well under a second keeps the timeouts accurate). Response
/// payloads may be delivered from any thread through `event_sink()`; the
/// latest one is applied at the start of the next tick.
pub struct NameEngine<S, C, K> {
    config: Config,
    storage: S,
    cloud: C,
    clock: K,

    /// The cached record; this engine is its only writer
    record: PersistedRecord,

    state: State,
    /// Monotonic millis sampled on entry to `state`
    state_time: u64,

    subscribed: bool,
    got_response: bool,
    force_check: bool,

    callback: Option<NameCallback>,

    sink: EventSink,
    events: Arc<Receiver<Vec<u8>>>,
}

impl<S, C, K> NameEngine<S, C, K>
where
    S: StorageBackend,
    C: Cloud,
    K: Clock,
{
    /// Open an engine over the given backend and collaborators
    ///
    /// Validates the config and loads the record. Invalid or unreadable
    /// storage is not an error; it just means the name gets fetched.
    pub fn open(config: Config, mut storage: S, cloud: C, clock: K) -> Result<Self> {
        config.validate()?;

        let record = storage.load();
        // Each response overwrites the name, so only the latest is kept.
        let (tx, events) = channel::bounded(1);
        let events = Arc::new(events);

        tracing::info!(
            backend = storage.kind(),
            cached = record.has_name(),
            last_check = record.last_check,
            "Name engine opened"
        );

        let state_time = clock.millis();

        Ok(Self {
            config,
            storage,
            cloud,
            clock,
            record,
            state: State::Start,
            state_time,
            subscribed: false,
            got_response: false,
            force_check: false,
            callback: None,
            sink: EventSink::new(tx, &events),
            events,
        })
    }

    // =========================================================================
    // Driver API
    // =========================================================================

    /// Set the name callback, fluent-style
    pub fn with_name_callback(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.set_name_callback(callback);
        self
    }

    /// Set the recheck interval, fluent-style
    pub fn with_recheck_interval(mut self, interval: Duration) -> Self {
        self.set_recheck_interval(interval);
        self
    }

    /// Register the callback fired on every fetched (or cached at start) name
    ///
    /// Replaces any previous callback.
    pub fn set_name_callback(&mut self, callback: impl FnMut(&str) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// How long a name stays fresh; zero fetches once and then goes idle
    pub fn set_recheck_interval(&mut self, interval: Duration) {
        self.config.recheck_interval = interval;
    }

    /// Fetch the name again regardless of the recheck interval
    ///
    /// Idle engines restart the cycle immediately. Otherwise the request is
    /// remembered and honoured at the next recheck evaluation, after the
    /// current cycle finishes.
    pub fn force_check(&mut self) {
        if self.state == State::Done {
            tracing::info!("Forced name check while idle");
            self.enter(State::Subscribe);
            return;
        }
        self.force_check = true;
    }

    /// The pub/sub layer dropped our subscription (e.g. an unsubscribe-all)
    ///
    /// The handler is registered again the next time the cycle passes through
    /// `Subscribe`.
    pub fn subscription_removed(&mut self) {
        self.subscribed = false;
    }

    /// Apply an inbound name response
    ///
    /// The payload is stored as the name (cut at the first NUL and at
    /// `MAX_NAME_LEN` bytes) and the response is marked received.
    pub fn on_response_event(&mut self, payload: &[u8]) {
        if self.record.set_name(payload) {
            tracing::debug!(len = payload.len(), "Device name truncated");
        }
        self.got_response = true;
    }

    /// Handle for delivering responses from another context
    pub fn event_sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Advance the state machine by one step
    pub fn tick(&mut self) {
        while let Ok(payload) = self.events.try_recv() {
            self.on_response_event(&payload);
        }

        match self.state {
            State::Start => self.state_start(),
            State::Subscribe => self.state_subscribe(),
            State::WaitConnected => self.state_wait_connected(),
            State::WaitRequest => self.state_wait_request(),
            State::WaitResponse => self.state_wait_response(),
            State::WaitRetry => self.state_wait_retry(),
            State::WaitRecheck => self.state_wait_recheck(),
            State::Done => {}
        }
    }

    // =========================================================================
    // State Handlers
    // =========================================================================

    fn state_start(&mut self) {
        if self.record.has_name() {
            tracing::info!(name = %self.record.name(), "Using cached device name");
            self.notify();
            self.enter(State::WaitRecheck);
            return;
        }

        self.enter(State::Subscribe);
    }

    fn state_subscribe(&mut self) {
        if !self.subscribed {
            match self
                .cloud
                .subscribe(&self.config.response_topic, self.sink.clone())
            {
                Ok(()) => self.subscribed = true,
                Err(e) => tracing::warn!("Subscribe failed, will try again next cycle: {}", e),
            }
        }

        self.enter(State::WaitConnected);
    }

    fn state_wait_connected(&mut self) {
        if !self.cloud.is_connected() || !self.clock.is_valid() {
            return;
        }

        self.enter(State::WaitRequest);
    }

    fn state_wait_request(&mut self) {
        if self.elapsed() < self.config.post_connect_wait {
            return;
        }

        self.got_response = false;
        if let Err(e) = self.cloud.publish(&self.config.request_topic) {
            // The response timeout covers this.
            tracing::warn!("Name request publish failed: {}", e);
        }

        self.enter(State::WaitResponse);
    }

    fn state_wait_response(&mut self) {
        if self.got_response {
            if self.record.has_name() {
                self.record.last_check = self.clock.now();

                if let Err(e) = self.storage.save(&self.record) {
                    tracing::warn!(
                        backend = self.storage.kind(),
                        "Could not persist device name: {}",
                        e
                    );
                }

                tracing::info!(name = %self.record.name(), "Device name fetched");
                self.notify();
                self.enter(State::WaitRecheck);
            } else {
                tracing::warn!(retry_in = ?self.config.retry_wait, "Empty device name received");
                self.enter(State::WaitRetry);
            }
            return;
        }

        if self.elapsed() >= self.config.response_timeout {
            tracing::warn!(retry_in = ?self.config.retry_wait, "No device name response");
            self.enter(State::WaitRetry);
        }
    }

    fn state_wait_retry(&mut self) {
        if self.elapsed() < self.config.retry_wait {
            return;
        }

        // A lost subscription would make every retry time out.
        if self.subscribed {
            self.enter(State::WaitConnected);
        } else {
            self.enter(State::Subscribe);
        }
    }

    fn state_wait_recheck(&mut self) {
        if self.elapsed() < self.config.recheck_poll {
            return;
        }
        self.state_time = self.clock.millis();

        if self.force_check {
            self.force_check = false;
            tracing::info!("Forced name check");
            self.enter(State::Subscribe);
            return;
        }

        if self.config.recheck_interval.is_zero() {
            tracing::debug!("Recheck disabled, going idle");
            self.enter(State::Done);
            return;
        }

        let interval = i64::try_from(self.config.recheck_interval.as_secs()).unwrap_or(i64::MAX);
        if self.clock.is_valid()
            && self.clock.now() >= self.record.last_check.saturating_add(interval)
        {
            tracing::info!(last_check = self.record.last_check, "Device name is stale, rechecking");
            self.enter(State::Subscribe);
        }
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn enter(&mut self, next: State) {
        tracing::debug!(from = %self.state, to = %next, "State transition");
        self.state = next;
        self.state_time = self.clock.millis();
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.clock.millis().saturating_sub(self.state_time))
    }

    fn notify(&mut self) {
        let name = self.record.name().into_owned();
        if let Some(callback) = self.callback.as_mut() {
            callback(name.as_str());
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// True if a non-empty name is known
    pub fn has_name(&self) -> bool {
        self.record.has_name()
    }

    /// The device name, empty if not known yet
    pub fn get_name(&self) -> String {
        self.record.name().into_owned()
    }

    /// Epoch seconds of the last successful fetch, 0 if never
    pub fn get_last_check_time(&self) -> i64 {
        self.record.last_check
    }

    /// Current phase of the fetch cycle
    pub fn state(&self) -> State {
        self.state
    }

    /// True once the engine has nothing left to do
    pub fn is_idle(&self) -> bool {
        self.state == State::Done
    }

    /// True if the response handler is registered
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Current recheck interval (zero = disabled)
    pub fn recheck_interval(&self) -> Duration {
        self.config.recheck_interval
    }

    /// The in-memory record
    pub fn record(&self) -> &PersistedRecord {
        &self.record
    }

    /// The storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The cloud collaborator
    pub fn cloud(&self) -> &C {
        &self.cloud
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
