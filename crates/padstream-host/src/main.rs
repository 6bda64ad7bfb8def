//! Padstream host entry point.
//!
//! Wires together the infrastructure services and starts the Tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load + validate HostConfig
//!  └─ HostState::new()          -- registries, session slots, telemetry
//!  └─ sink init (one retry)     -- platform driver boundary
//!  └─ start services
//!       ├─ receive loop         (dedicated UDP thread)
//!       └─ registry sweep       (periodic maintenance thread)
//! ```
//!
//! Shutdown: Ctrl-C clears the shared running flag; both threads notice it
//! within their poll interval, the socket is released, and the sink is
//! closed deterministically.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use padstream_host::infrastructure::network::server::{
    start_receive_loop, start_sweep_loop, HostPipeline,
};
use padstream_host::infrastructure::sink::{LoggingSink, VirtualPadSink};
use padstream_host::infrastructure::status::HostState;
use padstream_host::infrastructure::storage::config::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Configuration first so its log level can seed the subscriber;
    // `RUST_LOG` still overrides it.
    let config = load_config().context("failed to load host configuration")?;
    config.validate().context("invalid host configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.host.log_level.clone())),
        )
        .init();

    info!("Padstream host starting");

    let addr = config.socket_addr()?;
    let sweep_interval = config.sweep_interval();
    let state = HostState::new(config);

    // The platform driver can initialize asynchronously right after install;
    // give it one more chance after a short wait before giving up.
    let sink: Arc<dyn VirtualPadSink> = Arc::new(LoggingSink::new());
    if let Err(first) = sink.init() {
        warn!("sink init failed ({first}); retrying in 2s");
        tokio::time::sleep(Duration::from_secs(2)).await;
        sink.init().context("virtual pad sink failed to initialize")?;
    }

    let running = Arc::new(AtomicBool::new(true));

    let pipeline = Arc::new(HostPipeline::new(Arc::clone(&state), Arc::clone(&sink)));
    let recv_handle = start_receive_loop(addr, pipeline, Arc::clone(&running))?;
    let sweep_handle = start_sweep_loop(Arc::clone(&state), sweep_interval, Arc::clone(&running))?;

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("Padstream host ready on {addr}. Press Ctrl-C to exit.");

    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
    }

    // Threads observe the cleared flag within their poll intervals.
    if recv_handle.join().is_err() {
        warn!("receive thread exited with a panic");
    }
    if sweep_handle.join().is_err() {
        warn!("sweep thread exited with a panic");
    }
    if let Err(e) = sink.close() {
        warn!("sink close failed: {e}");
    }

    info!("Padstream host stopped");
    Ok(())
}
