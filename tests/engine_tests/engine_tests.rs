//! Tests for NameEngine
//!
//! These tests verify:
//! - The fetch cycle from empty storage through to a persisted name
//! - Cached names short-circuit the cycle at start
//! - Timeouts and empty answers back off and retry
//! - Recheck scheduling, idling and forced checks
//! - Subscription bookkeeping
//! - Update → persist → notify ordering, and tolerance of save failures

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use devname::config::DEFAULT_NAME_TOPIC;
use devname::engine::{NameEngine, State};
use devname::platform::{Clock, SystemClock};
use devname::record::{PersistedRecord, MAX_NAME_LEN};
use devname::sim::{ManualClock, SimCloud};
use devname::storage::{
    EepromStore, FileStore, MemoryByteStore, RetainedBuffer, RetainedStore, StorageBackend,
    VolatileStore,
};
use devname::{Config, DevNameError, Result};
use parking_lot::Mutex;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const START_TIME: i64 = 1_700_000_000;

type Log = Arc<Mutex<Vec<String>>>;

fn open_engine<S: StorageBackend>(
    storage: S,
    config: Config,
) -> (NameEngine<S, SimCloud, ManualClock>, SimCloud, ManualClock) {
    let cloud = SimCloud::new();
    let clock = ManualClock::new(START_TIME);
    let engine = NameEngine::open(config, storage, cloud.clone(), clock.clone()).unwrap();
    (engine, cloud, clock)
}

fn record_callbacks<S: StorageBackend>(engine: &mut NameEngine<S, SimCloud, ManualClock>) -> Log {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.set_name_callback(move |name| sink.lock().push(name.to_string()));
    log
}

fn advance_and_tick<S: StorageBackend>(
    engine: &mut NameEngine<S, SimCloud, ManualClock>,
    clock: &ManualClock,
    by: Duration,
) {
    clock.advance(by);
    engine.tick();
}

/// From a fresh engine with empty storage, run a full fetch answering `name`
fn complete_fetch<S: StorageBackend>(
    engine: &mut NameEngine<S, SimCloud, ManualClock>,
    cloud: &SimCloud,
    clock: &ManualClock,
    name: &str,
) {
    cloud.set_connected(true);
    clock.set_valid(true);

    engine.tick(); // Start -> Subscribe
    engine.tick(); // Subscribe -> WaitConnected
    engine.tick(); // WaitConnected -> WaitRequest
    advance_and_tick(engine, clock, Duration::from_millis(2_000)); // publish
    assert_eq!(engine.state(), State::WaitResponse);

    cloud.emit(DEFAULT_NAME_TOPIC, name.as_bytes());
    engine.tick();
}

fn named_record(name: &str, last_check: i64) -> PersistedRecord {
    let mut record = PersistedRecord::new();
    record.set_name(name.as_bytes());
    record.last_check = last_check;
    record
}

/// Backend that logs every save into a shared log
struct RecordingStore {
    log: Log,
    fail: bool,
}

impl StorageBackend for RecordingStore {
    fn load(&mut self) -> PersistedRecord {
        PersistedRecord::new()
    }

    fn save(&mut self, record: &PersistedRecord) -> Result<()> {
        self.log
            .lock()
            .push(format!("save:{}:{}", record.name(), record.last_check));
        if self.fail {
            return Err(DevNameError::Storage("disk full".to_string()));
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "recording"
    }
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_rejects_invalid_config() {
    let config = Config::builder().response_topic("").build();
    let result = NameEngine::open(
        config,
        VolatileStore::new(),
        SimCloud::new(),
        ManualClock::new(START_TIME),
    );

    assert!(matches!(result, Err(DevNameError::Config(_))));
}

#[test]
fn test_open_starts_in_start_state() {
    let (engine, _cloud, _clock) = open_engine(VolatileStore::new(), Config::default());

    assert_eq!(engine.state(), State::Start);
    assert!(!engine.has_name());
    assert_eq!(engine.get_name(), "");
    assert_eq!(engine.get_last_check_time(), 0);
    assert_eq!(engine.recheck_interval(), Duration::ZERO);
}

// =============================================================================
// Fetch Cycle Tests
// =============================================================================

#[test]
fn test_waits_for_connectivity_indefinitely() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());

    for _ in 0..1_000 {
        advance_and_tick(&mut engine, &clock, Duration::from_secs(1));
    }

    assert_eq!(engine.state(), State::WaitConnected);
    assert_eq!(cloud.subscribe_calls(), 1);
    assert_eq!(cloud.publish_count(), 0);
}

#[test]
fn test_waits_for_valid_clock() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    cloud.set_connected(true);

    for _ in 0..100 {
        advance_and_tick(&mut engine, &clock, Duration::from_secs(1));
    }
    assert_eq!(engine.state(), State::WaitConnected);

    clock.set_valid(true);
    engine.tick();
    assert_eq!(engine.state(), State::WaitRequest);
}

#[test]
fn test_full_fetch_persists_and_notifies() {
    let eeprom = MemoryByteStore::new(128);
    let (mut engine, cloud, clock) =
        open_engine(EepromStore::new(eeprom.clone(), 1), Config::default());
    let names = record_callbacks(&mut engine);

    // Offline for a while
    for _ in 0..50 {
        advance_and_tick(&mut engine, &clock, Duration::from_millis(100));
    }
    assert_eq!(engine.state(), State::WaitConnected);

    cloud.set_connected(true);
    clock.set_valid(true);
    engine.tick();
    assert_eq!(engine.state(), State::WaitRequest);

    // Settle delay before publishing
    for _ in 0..19 {
        advance_and_tick(&mut engine, &clock, Duration::from_millis(100));
    }
    assert_eq!(cloud.publish_count(), 0);
    advance_and_tick(&mut engine, &clock, Duration::from_millis(100));
    assert_eq!(cloud.publish_count(), 1);
    assert_eq!(cloud.published(), vec![DEFAULT_NAME_TOPIC.to_string()]);
    assert_eq!(engine.state(), State::WaitResponse);

    assert_eq!(cloud.emit(DEFAULT_NAME_TOPIC, b"myroom"), 1);
    engine.tick();

    assert_eq!(engine.state(), State::WaitRecheck);
    assert!(engine.has_name());
    assert_eq!(engine.get_name(), "myroom");
    assert_eq!(engine.get_last_check_time(), clock.now());
    assert_eq!(*names.lock(), vec!["myroom".to_string()]);

    let persisted = EepromStore::new(eeprom, 1).load();
    assert_eq!(persisted.name(), "myroom");
    assert_eq!(persisted.last_check, engine.get_last_check_time());
}

#[test]
fn test_auto_reply_round_trip() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    cloud.set_auto_reply(Some("porch"));
    cloud.set_connected(true);
    clock.set_valid(true);

    for _ in 0..50 {
        advance_and_tick(&mut engine, &clock, Duration::from_millis(100));
    }

    assert_eq!(engine.get_name(), "porch");
    assert_eq!(engine.state(), State::WaitRecheck);
    assert_eq!(cloud.publish_count(), 1);
}

#[test]
fn test_empty_response_goes_to_retry_without_callback() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    let names = record_callbacks(&mut engine);

    complete_fetch(&mut engine, &cloud, &clock, "");

    assert_eq!(engine.state(), State::WaitRetry);
    assert!(!engine.has_name());
    assert_eq!(engine.get_last_check_time(), 0);
    assert!(names.lock().is_empty());
}

#[test]
fn test_response_timeout_goes_to_retry() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    cloud.set_connected(true);
    clock.set_valid(true);

    engine.tick();
    engine.tick();
    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));
    assert_eq!(engine.state(), State::WaitResponse);

    advance_and_tick(&mut engine, &clock, Duration::from_millis(14_999));
    assert_eq!(engine.state(), State::WaitResponse);

    advance_and_tick(&mut engine, &clock, Duration::from_millis(1));
    assert_eq!(engine.state(), State::WaitRetry);
}

#[test]
fn test_retry_requests_again_after_backoff() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());

    complete_fetch(&mut engine, &cloud, &clock, "");
    assert_eq!(engine.state(), State::WaitRetry);

    advance_and_tick(&mut engine, &clock, Duration::from_secs(5 * 60 - 1));
    assert_eq!(engine.state(), State::WaitRetry);

    advance_and_tick(&mut engine, &clock, Duration::from_secs(1));
    assert_eq!(engine.state(), State::WaitConnected);

    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));
    assert_eq!(cloud.publish_count(), 2);
    // Still only one handler registered
    assert_eq!(cloud.subscribe_calls(), 1);

    cloud.emit(DEFAULT_NAME_TOPIC, b"garage");
    engine.tick();
    assert_eq!(engine.get_name(), "garage");
}

#[test]
fn test_long_name_is_truncated() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    let long = "n".repeat(MAX_NAME_LEN + 9);

    complete_fetch(&mut engine, &cloud, &clock, &long);

    assert_eq!(engine.get_name().len(), MAX_NAME_LEN);
    assert_eq!(engine.get_name(), &long[..MAX_NAME_LEN]);
}

#[test]
fn test_response_from_another_thread() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    cloud.set_connected(true);
    clock.set_valid(true);
    engine.tick();
    engine.tick();
    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));

    let sink = engine.event_sink();
    thread::spawn(move || assert!(sink.deliver(b"attic")))
        .join()
        .unwrap();

    engine.tick();
    assert_eq!(engine.get_name(), "attic");
    assert_eq!(engine.state(), State::WaitRecheck);
}

#[test]
fn test_only_latest_unread_response_is_kept() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    cloud.set_connected(true);
    clock.set_valid(true);
    engine.tick();
    engine.tick();
    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));

    let sink = engine.event_sink();
    for name in ["attic", "cellar", "porch"] {
        assert!(sink.deliver(name.as_bytes()));
    }

    engine.tick();
    assert_eq!(engine.get_name(), "porch");
    assert_eq!(engine.state(), State::WaitRecheck);

    // Nothing left queued behind the latest payload
    engine.tick();
    assert_eq!(engine.get_name(), "porch");
}

#[test]
fn test_sink_rejects_delivery_after_engine_dropped() {
    let (engine, _cloud, _clock) = open_engine(VolatileStore::new(), Config::default());
    let sink = engine.event_sink();
    assert!(sink.deliver(b"attic"));

    drop(engine);

    assert!(!sink.deliver(b"cellar"));
}

#[test]
fn test_system_clock_is_valid_on_host() {
    let clock = SystemClock::new();

    assert!(clock.is_valid());
    assert!(clock.now() > START_TIME);
}

// =============================================================================
// Cached Name Tests
// =============================================================================

#[test]
fn test_cached_name_notifies_without_network() {
    let buffer = RetainedBuffer::new();
    RetainedStore::new(buffer.clone())
        .save(&named_record("kitchen", START_TIME - 100))
        .unwrap();

    let (mut engine, cloud, _clock) =
        open_engine(RetainedStore::new(buffer), Config::default());
    let names = record_callbacks(&mut engine);

    engine.tick();

    assert_eq!(*names.lock(), vec!["kitchen".to_string()]);
    assert_eq!(engine.state(), State::WaitRecheck);
    assert_eq!(cloud.subscribe_calls(), 0);
    assert_eq!(cloud.publish_count(), 0);
    assert_eq!(engine.get_last_check_time(), START_TIME - 100);
}

#[test]
fn test_cached_name_goes_idle_without_recheck() {
    let buffer = RetainedBuffer::new();
    RetainedStore::new(buffer.clone())
        .save(&named_record("kitchen", START_TIME))
        .unwrap();
    let (mut engine, cloud, clock) =
        open_engine(RetainedStore::new(buffer), Config::default());

    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(9_999));
    assert_eq!(engine.state(), State::WaitRecheck);

    advance_and_tick(&mut engine, &clock, Duration::from_millis(1));
    assert!(engine.is_idle());
    assert_eq!(cloud.subscribe_calls(), 0);
}

#[test]
fn test_file_backend_restart_uses_cache() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("devicename");

    {
        let (mut engine, cloud, clock) = open_engine(FileStore::new(&path), Config::default());
        complete_fetch(&mut engine, &cloud, &clock, "workshop");
        assert_eq!(engine.get_name(), "workshop");
    }

    let (mut engine, cloud, _clock) = open_engine(FileStore::new(&path), Config::default());
    let names = record_callbacks(&mut engine);
    engine.tick();

    assert_eq!(*names.lock(), vec!["workshop".to_string()]);
    assert_eq!(cloud.publish_count(), 0);
}

#[test]
fn test_volatile_backend_refetches_after_restart() {
    {
        let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
        complete_fetch(&mut engine, &cloud, &clock, "office");
    }

    let (mut engine, _cloud, _clock) = open_engine(VolatileStore::new(), Config::default());
    engine.tick();

    assert_eq!(engine.state(), State::Subscribe);
    assert!(!engine.has_name());
}

// =============================================================================
// Recheck Tests
// =============================================================================

#[test]
fn test_no_recheck_goes_idle_and_stays_quiet() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    complete_fetch(&mut engine, &cloud, &clock, "den");

    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert!(engine.is_idle());

    for _ in 0..500 {
        advance_and_tick(&mut engine, &clock, Duration::from_secs(60));
    }

    assert_eq!(engine.state(), State::Done);
    assert_eq!(cloud.subscribe_calls(), 1);
    assert_eq!(cloud.publish_count(), 1);
}

#[test]
fn test_recheck_after_interval() {
    let (engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    let mut engine = engine.with_recheck_interval(Duration::from_secs(60));
    complete_fetch(&mut engine, &cloud, &clock, "den");
    let fetched_at = engine.get_last_check_time();

    // Evaluated every 10 s; stale once now >= last_check + 60
    for _ in 0..5 {
        advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
        assert_eq!(engine.state(), State::WaitRecheck);
    }
    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert_eq!(clock.now(), fetched_at + 60);
    assert_eq!(engine.state(), State::Subscribe);

    // Second fetch reuses the existing subscription
    engine.tick();
    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));
    cloud.emit(DEFAULT_NAME_TOPIC, b"study");
    engine.tick();

    assert_eq!(engine.get_name(), "study");
    assert_eq!(cloud.subscribe_calls(), 1);
    assert_eq!(cloud.publish_count(), 2);
    assert!(engine.get_last_check_time() > fetched_at);
}

#[test]
fn test_recheck_only_evaluated_on_poll_cadence() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    engine.set_recheck_interval(Duration::from_secs(1));
    complete_fetch(&mut engine, &cloud, &clock, "den");

    // Stale after 1 s, but nothing happens before the 10 s dwell
    for _ in 0..9 {
        advance_and_tick(&mut engine, &clock, Duration::from_secs(1));
        assert_eq!(engine.state(), State::WaitRecheck);
    }
    advance_and_tick(&mut engine, &clock, Duration::from_secs(1));
    assert_eq!(engine.state(), State::Subscribe);
}

#[test]
fn test_recheck_waits_for_valid_clock() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    engine.set_recheck_interval(Duration::from_secs(30));
    complete_fetch(&mut engine, &cloud, &clock, "den");

    clock.set_valid(false);
    for _ in 0..20 {
        advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    }
    assert_eq!(engine.state(), State::WaitRecheck);

    clock.set_valid(true);
    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert_eq!(engine.state(), State::Subscribe);
}

#[test]
fn test_huge_recheck_interval_never_goes_stale() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    engine.set_recheck_interval(Duration::from_secs(u64::MAX));
    complete_fetch(&mut engine, &cloud, &clock, "den");

    for _ in 0..50 {
        advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
        assert_eq!(engine.state(), State::WaitRecheck);
    }
    assert_eq!(cloud.publish_count(), 1);
}

#[test]
fn test_cached_stale_name_is_rechecked() {
    let buffer = RetainedBuffer::new();
    RetainedStore::new(buffer.clone())
        .save(&named_record("kitchen", START_TIME - 3_600))
        .unwrap();
    let config = Config::builder()
        .recheck_interval(Duration::from_secs(600))
        .build();
    let (mut engine, cloud, clock) = open_engine(RetainedStore::new(buffer.clone()), config);
    clock.set_valid(true);
    cloud.set_connected(true);
    cloud.set_auto_reply(Some("pantry"));

    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert_eq!(engine.state(), State::Subscribe);

    for _ in 0..30 {
        advance_and_tick(&mut engine, &clock, Duration::from_millis(100));
    }

    assert_eq!(engine.get_name(), "pantry");
    assert_eq!(buffer.record().name(), "pantry");
    assert_eq!(cloud.subscribe_calls(), 1);
}

// =============================================================================
// Forced Check Tests
// =============================================================================

#[test]
fn test_force_check_while_idle_restarts_immediately() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    complete_fetch(&mut engine, &cloud, &clock, "den");
    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert!(engine.is_idle());

    engine.force_check();
    assert_eq!(engine.state(), State::Subscribe);

    engine.tick();
    assert_eq!(engine.state(), State::WaitConnected);
    assert_eq!(cloud.subscribe_calls(), 1);

    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));
    assert_eq!(cloud.publish_count(), 2);
}

#[test]
fn test_force_check_mid_cycle_is_deferred() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    cloud.set_connected(true);
    clock.set_valid(true);
    engine.tick();
    engine.tick();
    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));
    assert_eq!(engine.state(), State::WaitResponse);

    engine.force_check();
    assert_eq!(engine.state(), State::WaitResponse);

    cloud.emit(DEFAULT_NAME_TOPIC, b"den");
    engine.tick();
    assert_eq!(engine.state(), State::WaitRecheck);

    // Interval is 0, but the pending forced check wins over going idle
    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert_eq!(engine.state(), State::Subscribe);

    // The flag is consumed
    engine.tick();
    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));
    cloud.emit(DEFAULT_NAME_TOPIC, b"den");
    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert!(engine.is_idle());
}

#[test]
fn test_force_check_with_cached_name() {
    let buffer = RetainedBuffer::new();
    RetainedStore::new(buffer.clone())
        .save(&named_record("kitchen", START_TIME))
        .unwrap();
    let (mut engine, cloud, clock) =
        open_engine(RetainedStore::new(buffer), Config::default());

    engine.force_check();
    engine.tick();
    assert_eq!(engine.state(), State::WaitRecheck);

    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert_eq!(engine.state(), State::Subscribe);
    engine.tick();
    assert_eq!(cloud.subscribe_calls(), 1);
}

// =============================================================================
// Subscription Tests
// =============================================================================

#[test]
fn test_subscription_removed_resubscribes() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    complete_fetch(&mut engine, &cloud, &clock, "den");
    advance_and_tick(&mut engine, &clock, Duration::from_secs(10));
    assert!(engine.is_subscribed());

    cloud.unsubscribe_all();
    engine.subscription_removed();
    assert!(!engine.is_subscribed());

    engine.force_check();
    engine.tick();

    assert!(engine.is_subscribed());
    assert_eq!(cloud.subscribe_calls(), 2);
    assert_eq!(cloud.subscription_count(), 1);
}

#[test]
fn test_failed_subscribe_is_retried_after_backoff() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    cloud.set_fail_subscribe(true);
    cloud.set_connected(true);
    clock.set_valid(true);

    engine.tick();
    engine.tick();
    assert!(!engine.is_subscribed());
    assert_eq!(engine.state(), State::WaitConnected);

    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(2_000));
    advance_and_tick(&mut engine, &clock, Duration::from_millis(15_000));
    assert_eq!(engine.state(), State::WaitRetry);

    cloud.set_fail_subscribe(false);
    advance_and_tick(&mut engine, &clock, Duration::from_secs(5 * 60));
    assert_eq!(engine.state(), State::Subscribe);

    engine.tick();
    assert!(engine.is_subscribed());
    assert_eq!(cloud.subscribe_calls(), 1);
}

// =============================================================================
// Persistence Ordering Tests
// =============================================================================

#[test]
fn test_update_then_persist_then_notify() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let store = RecordingStore {
        log: Arc::clone(&log),
        fail: false,
    };
    let (mut engine, cloud, clock) = open_engine(store, Config::default());
    let callback_log = Arc::clone(&log);
    engine.set_name_callback(move |name| callback_log.lock().push(format!("callback:{}", name)));

    complete_fetch(&mut engine, &cloud, &clock, "hall");

    let expected_check = clock.now();
    assert_eq!(
        *log.lock(),
        vec![
            format!("save:hall:{}", expected_check),
            "callback:hall".to_string()
        ]
    );
}

#[test]
fn test_save_failure_still_notifies() {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let store = RecordingStore {
        log: Arc::clone(&log),
        fail: true,
    };
    let (mut engine, cloud, clock) = open_engine(store, Config::default());
    let names = record_callbacks(&mut engine);

    complete_fetch(&mut engine, &cloud, &clock, "hall");

    assert_eq!(*names.lock(), vec!["hall".to_string()]);
    assert_eq!(engine.state(), State::WaitRecheck);
    assert_eq!(log.lock().len(), 1);
}

#[test]
fn test_callback_replaced() {
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), Config::default());
    let first = record_callbacks(&mut engine);
    let second = record_callbacks(&mut engine);

    complete_fetch(&mut engine, &cloud, &clock, "hall");

    assert!(first.lock().is_empty());
    assert_eq!(*second.lock(), vec!["hall".to_string()]);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_custom_topics_and_timings() {
    let config = Config::builder()
        .response_topic("acme/name/reply")
        .request_topic("acme/name/get")
        .post_connect_wait(Duration::from_millis(10))
        .response_timeout(Duration::from_millis(50))
        .build();
    let (mut engine, cloud, clock) = open_engine(VolatileStore::new(), config);
    cloud.set_connected(true);
    clock.set_valid(true);

    engine.tick();
    engine.tick();
    engine.tick();
    advance_and_tick(&mut engine, &clock, Duration::from_millis(10));

    assert_eq!(cloud.published(), vec!["acme/name/get".to_string()]);
    assert_eq!(cloud.emit(DEFAULT_NAME_TOPIC, b"wrong"), 0);
    assert_eq!(cloud.emit("acme/name/reply", b"lab"), 1);

    engine.tick();
    assert_eq!(engine.get_name(), "lab");
}
