//! devname simulator
//!
//! Drives a name engine against the in-process cloud so the fetch cycle and
//! each storage backend can be watched end to end.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use devname::config::DEFAULT_FILE_PATH;
use devname::platform::{Cloud, SystemClock};
use devname::sim::SimCloud;
use devname::storage::{
    EepromStore, FileByteStore, FileStore, RetainedBuffer, RetainedStore, StorageBackend,
    VolatileStore,
};
use devname::{Config, NameEngine};
use tracing_subscriber::{fmt, EnvFilter};

/// Where the simulated device keeps its name
#[derive(ValueEnum, Clone, Copy, Debug)]
enum Backend {
    /// Nothing persisted
    #[value(name = "none")]
    Volatile,
    /// Byte-offset store in a flat image file
    Eeprom,
    /// Caller-owned retained buffer (lives for this process only)
    Retained,
    /// One file per record
    File,
}

/// devname simulator
#[derive(Parser, Debug)]
#[command(name = "devname-sim")]
#[command(about = "Run the device name engine against a simulated cloud")]
#[command(version)]
struct Args {
    /// Storage backend
    #[arg(short, long, value_enum, default_value = "file")]
    backend: Backend,

    /// Record file (file backend) or image file (eeprom backend)
    #[arg(short, long, default_value = DEFAULT_FILE_PATH)]
    path: PathBuf,

    /// Byte offset of the record in the EEPROM image
    #[arg(long, default_value = "0")]
    offset: usize,

    /// Name the simulated cloud answers with (empty = answer with no name)
    #[arg(short, long, default_value = "myroom")]
    name: String,

    /// Do not answer name requests at all
    #[arg(long)]
    silent: bool,

    /// Simulated delay before the cloud connects (ms)
    #[arg(long, default_value = "1000")]
    connect_after_ms: u64,

    /// Recheck interval in seconds (0 = fetch once)
    #[arg(short, long, default_value = "0")]
    recheck_secs: u64,

    /// Delay between connecting and publishing the request (ms)
    #[arg(long, default_value = "2000")]
    post_connect_ms: u64,

    /// Response timeout (ms)
    #[arg(long, default_value = "15000")]
    response_timeout_ms: u64,

    /// Retry backoff (ms)
    #[arg(long, default_value = "300000")]
    retry_ms: u64,

    /// Dwell between recheck evaluations (ms)
    #[arg(long, default_value = "10000")]
    recheck_poll_ms: u64,

    /// Driver tick cadence (ms)
    #[arg(long, default_value = "50")]
    tick_ms: u64,

    /// How long to run (seconds)
    #[arg(long, default_value = "30")]
    run_secs: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,devname=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("devname simulator v{}", devname::VERSION);
    tracing::info!("Backend: {:?}", args.backend);

    let config = Config::builder()
        .recheck_interval(Duration::from_secs(args.recheck_secs))
        .post_connect_wait(Duration::from_millis(args.post_connect_ms))
        .response_timeout(Duration::from_millis(args.response_timeout_ms))
        .retry_wait(Duration::from_millis(args.retry_ms))
        .recheck_poll(Duration::from_millis(args.recheck_poll_ms))
        .build();

    let storage: Box<dyn StorageBackend> = match args.backend {
        Backend::Volatile => Box::new(VolatileStore::new()),
        Backend::Eeprom => Box::new(EepromStore::new(
            FileByteStore::new(&args.path),
            args.offset,
        )),
        Backend::Retained => Box::new(RetainedStore::new(RetainedBuffer::new())),
        Backend::File => Box::new(FileStore::new(&args.path)),
    };

    let cloud = SimCloud::new();
    if !args.silent {
        cloud.set_auto_reply(Some(&args.name));
    }

    let engine = NameEngine::open(config, storage, cloud.clone(), SystemClock::new());
    let mut engine = match engine {
        Ok(e) => e.with_name_callback(|name| tracing::info!("name={}", name)),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    let started = Instant::now();
    let connect_after = Duration::from_millis(args.connect_after_ms);
    let run_for = Duration::from_secs(args.run_secs);
    let tick = Duration::from_millis(args.tick_ms.max(1));

    while started.elapsed() < run_for {
        if !cloud.is_connected() && started.elapsed() >= connect_after {
            tracing::info!("Cloud connected");
            cloud.set_connected(true);
        }

        engine.tick();
        thread::sleep(tick);
    }

    tracing::info!(
        state = %engine.state(),
        has_name = engine.has_name(),
        last_check = engine.get_last_check_time(),
        "Simulation finished: name={:?}",
        engine.get_name()
    );
}
