//! Padstream client entry point.
//!
//! Wires together the capture source, the streaming session, and the UDP
//! send loop, then blocks until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load + validate ClientConfig
//!  └─ StreamSession::new(client_id)
//!  └─ start_streamer()     -- paced UDP send thread
//! ```
//!
//! # Capture source
//!
//! Physical-controller capture is a platform-driver concern that is wired
//! in by the surrounding application. This binary uses [`NoDeviceCapture`],
//! so it streams neutral heartbeats — enough for the host to see a live,
//! valid stream and hold a slot.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use padstream_client::application::stream_input::StreamSession;
use padstream_client::infrastructure::capture::NoDeviceCapture;
use padstream_client::infrastructure::network::{start_streamer, StreamerConfig};
use padstream_client::infrastructure::storage::config::load_config;

/// Derives a client id when the config does not pin one.
///
/// Uniqueness only has to hold among the handful of clients talking to one
/// host, so hashing the startup time and thread id is sufficient; a
/// collision just means two clients share rate-limit accounting.
fn derive_client_id() -> u32 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::time::SystemTime;

    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);
    hasher.finish() as u32
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load client configuration")?;
    config.validate().context("invalid client configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.client.log_level.clone())),
        )
        .init();

    info!("Padstream client starting");

    let client_id = config.client.client_id.unwrap_or_else(derive_client_id);
    let target = config.target_addr()?;
    let session = StreamSession::new(client_id);

    let running = Arc::new(AtomicBool::new(true));
    let handle = start_streamer(
        StreamerConfig {
            target,
            update_rate_hz: config.stream.update_rate_hz,
        },
        session,
        Box::new(NoDeviceCapture::new()),
        Arc::clone(&running),
    )?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    info!("Padstream client streaming to {target}. Press Ctrl-C to exit.");

    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if !running.load(Ordering::Relaxed) {
            break;
        }
    }

    if handle.join().is_err() {
        tracing::warn!("send thread exited with a panic");
    }

    info!("Padstream client stopped");
    Ok(())
}
