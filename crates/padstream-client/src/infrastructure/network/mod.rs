//! Network infrastructure for the client application.
//!
//! The streamer binds an ephemeral UDP socket and fires one encoded record
//! per pacing interval at the host. There is no connection, no handshake,
//! and no inbound traffic: the client infers nothing from the host and
//! simply keeps sending until shut down. Send failures are logged and the
//! loop continues — a transient network error must not kill the stream.

use std::net::{SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::stream_input::{PadCapture, StreamSession};

/// Error type for streamer startup.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The local UDP socket could not be bound.
    #[error("failed to bind send socket: {0}")]
    BindFailed(#[source] std::io::Error),

    /// The send thread could not be spawned.
    #[error("failed to spawn send thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Streamer settings.
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// Host address the stream is sent to.
    pub target: SocketAddr,
    /// Packets per second (30, 60, or 90).
    pub update_rate_hz: u32,
}

/// Binds a socket and spawns the paced send loop on a dedicated thread.
///
/// The loop runs until `running` is cleared; the socket is released when
/// the thread returns.
///
/// # Errors
///
/// Returns [`StreamError::BindFailed`] when the socket cannot be bound and
/// [`StreamError::Spawn`] when the thread cannot be created.
pub fn start_streamer(
    config: StreamerConfig,
    session: StreamSession,
    mut capture: Box<dyn PadCapture>,
    running: Arc<AtomicBool>,
) -> Result<std::thread::JoinHandle<()>, StreamError> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(StreamError::BindFailed)?;

    let interval = Duration::from_secs_f64(1.0 / f64::from(config.update_rate_hz.max(1)));
    info!(
        "streaming to {} at {}Hz as client {}",
        config.target,
        config.update_rate_hz,
        session.client_id()
    );

    std::thread::Builder::new()
        .name("padstream-send".to_string())
        .spawn(move || {
            while running.load(Ordering::Relaxed) {
                match session.next_datagram(capture.as_mut()) {
                    Ok(bytes) => {
                        if let Err(e) = socket.send_to(&bytes, config.target) {
                            warn!("send failed: {e}");
                        }
                    }
                    Err(e) => warn!("capture failed, skipping frame: {e}"),
                }
                std::thread::sleep(interval);
            }
            info!("send loop stopped");
        })
        .map_err(StreamError::Spawn)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
