//! UDP receive loop and the per-datagram admission pipeline.
//!
//! One dedicated thread drains the socket and runs the pipeline
//! sequentially per packet, which preserves per-client ordering for the
//! sequence checks. The socket uses a 500 ms read timeout so the loop can
//! notice the shutdown flag without a packet arriving; the `recv` call is
//! otherwise the only blocking operation in the pipeline.
//!
//! Pipeline order per datagram:
//!
//! ```text
//! size ceiling → address whitelist/block → decode → client admission
//!   (block, rate limits, replay) → slot routing → sink write + telemetry
//! ```
//!
//! Any failure short-circuits the rest and drops the packet. No response is
//! ever sent to the sender, and no pipeline error can terminate the loop —
//! only a bind failure at startup or the shutdown flag ends it.
//!
//! A second thread runs the registry sweep on a fixed interval, taking the
//! registry lock only for the duration of the sweep itself.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use padstream_core::{decode_packet, ProtocolError, MAX_DATAGRAM_SIZE};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::security::RejectReason;
use crate::infrastructure::sink::VirtualPadSink;
use crate::infrastructure::status::HostState;

/// Receive buffer size; anything beyond the protocol ceiling still reads
/// in full so it can be counted as an oversize violation.
const RECV_BUF_SIZE: usize = 2048;

/// Error type for server startup.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The UDP socket could not be bound.
    #[error("failed to bind input socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// What the pipeline did with one datagram.
#[derive(Debug)]
pub enum PacketOutcome {
    /// Validated and written to the sink behind `slot`.
    Forwarded { slot: usize },
    /// Validated, but every slot is held by another active client.
    AcceptedUnrouted,
    /// Refused by admission control.
    Rejected(RejectReason),
    /// Not decodable; no registry state depending on content was touched.
    Malformed(ProtocolError),
}

/// The receive pipeline with its shared state and sink.
pub struct HostPipeline {
    state: Arc<HostState>,
    sink: Arc<dyn VirtualPadSink>,
}

impl HostPipeline {
    pub fn new(state: Arc<HostState>, sink: Arc<dyn VirtualPadSink>) -> Self {
        Self { state, sink }
    }

    /// Runs one datagram through the full admission pipeline.
    ///
    /// `now` is the host's monotonic clock and `now_ns` its reading of the
    /// wall clock in nanoseconds; both are passed in so tests can pin time.
    /// Each registry access takes the lock for one short call, never across
    /// the sink write.
    pub fn handle_datagram(
        &self,
        data: &[u8],
        src: SocketAddr,
        now: Instant,
        now_ns: u64,
    ) -> PacketOutcome {
        // Absurdly large datagrams are a violation in their own right;
        // merely-malformed ones below are not.
        if data.len() > MAX_DATAGRAM_SIZE {
            self.state
                .registry
                .lock()
                .unwrap()
                .record_oversize(src.ip(), data.len());
            return PacketOutcome::Malformed(ProtocolError::SizeExceeded {
                limit: MAX_DATAGRAM_SIZE,
                actual: data.len(),
            });
        }

        // Address gate runs before any decoding effort is spent.
        if let Err(reason) = self
            .state
            .registry
            .lock()
            .unwrap()
            .precheck_addr(src.ip(), now)
        {
            debug!(%src, %reason, "datagram refused at address gate");
            return PacketOutcome::Rejected(reason);
        }

        let packet = match decode_packet(data) {
            Ok(packet) => packet,
            Err(e) => {
                debug!(%src, error = %e, "malformed datagram dropped");
                return PacketOutcome::Malformed(e);
            }
        };

        if let Err(reason) = self.state.registry.lock().unwrap().admit(
            packet.client_id,
            src.ip(),
            packet.sequence,
            packet.timestamp,
            now,
            now_ns,
        ) {
            debug!(client_id = packet.client_id, %src, %reason, "packet rejected");
            return PacketOutcome::Rejected(reason);
        }

        let slot = self
            .state
            .sessions
            .lock()
            .unwrap()
            .route(packet.client_id, now);
        let Some(slot) = slot else {
            debug!(
                client_id = packet.client_id,
                "packet accepted but all slots are owned"
            );
            return PacketOutcome::AcceptedUnrouted;
        };

        self.state
            .telemetry
            .lock()
            .unwrap()
            .record(slot, packet.sequence, now);

        // A sink failure drops this packet but must never stop the stream.
        if let Err(e) = self.sink.write(slot, &packet.state) {
            warn!(slot, error = %e, "sink write failed; state dropped");
        }

        PacketOutcome::Forwarded { slot }
    }
}

/// Nanoseconds since the Unix epoch: the host's side of the timestamp
/// clock that senders stamp packets with.
pub fn wall_clock_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Binds the input socket and spawns the receive thread.
///
/// The thread exits when `running` is cleared; the socket is released when
/// the thread returns.
///
/// # Errors
///
/// Returns [`ServerError::BindFailed`] when the socket cannot be bound and
/// [`ServerError::Spawn`] when the thread cannot be created.
pub fn start_receive_loop(
    addr: SocketAddr,
    pipeline: Arc<HostPipeline>,
    running: Arc<AtomicBool>,
) -> Result<std::thread::JoinHandle<()>, ServerError> {
    let socket = UdpSocket::bind(addr).map_err(|source| ServerError::BindFailed { addr, source })?;
    socket
        .set_read_timeout(Some(Duration::from_millis(500)))
        .ok();

    info!("input stream listening on UDP {addr}");

    std::thread::Builder::new()
        .name("padstream-recv".to_string())
        .spawn(move || receive_loop(socket, pipeline, running))
        .map_err(|source| ServerError::Spawn {
            name: "receive",
            source,
        })
}

/// The main receive loop executed on the dedicated thread.
fn receive_loop(socket: UdpSocket, pipeline: Arc<HostPipeline>, running: Arc<AtomicBool>) {
    let mut buf = vec![0u8; RECV_BUF_SIZE];

    while running.load(Ordering::Relaxed) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                error!("input socket recv error: {e}");
                continue;
            }
        };

        pipeline.handle_datagram(&buf[..len], src, Instant::now(), wall_clock_ns());
    }

    info!("input receive loop stopped");
}

/// Spawns the periodic registry sweep thread.
///
/// The thread wakes every 250 ms to check the shutdown flag and runs the
/// sweep once per `interval`, holding the registry lock only while the
/// sweep itself executes.
///
/// # Errors
///
/// Returns [`ServerError::Spawn`] when the thread cannot be created.
pub fn start_sweep_loop(
    state: Arc<HostState>,
    interval: Duration,
    running: Arc<AtomicBool>,
) -> Result<std::thread::JoinHandle<()>, ServerError> {
    std::thread::Builder::new()
        .name("padstream-sweep".to_string())
        .spawn(move || {
            let mut last_sweep = Instant::now();
            while running.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_millis(250));
                let now = Instant::now();
                if now.saturating_duration_since(last_sweep) >= interval {
                    last_sweep = now;
                    state.registry.lock().unwrap().sweep(now);
                }
            }
            info!("registry sweep loop stopped");
        })
        .map_err(|source| ServerError::Spawn {
            name: "sweep",
            source,
        })
}

/// Returns `true` for OS timeout / would-block errors that should be retried.
fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_timeout_error_recognises_timed_out() {
        let e = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(is_timeout_error(&e));
    }

    #[test]
    fn test_is_timeout_error_recognises_would_block() {
        let e = std::io::Error::new(std::io::ErrorKind::WouldBlock, "would block");
        assert!(is_timeout_error(&e));
    }

    #[test]
    fn test_is_timeout_error_returns_false_for_other_errors() {
        let e = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(!is_timeout_error(&e));
    }

    #[test]
    fn test_wall_clock_ns_returns_nonzero() {
        assert!(wall_clock_ns() > 0, "wall clock must be past the epoch");
    }

    #[test]
    fn test_start_receive_loop_binds_ephemeral_port() {
        use crate::infrastructure::sink::MockPadSink;
        use crate::infrastructure::storage::config::HostConfig;

        let state = HostState::new(HostConfig::default());
        let pipeline = Arc::new(HostPipeline::new(state, Arc::new(MockPadSink::new())));
        let running = Arc::new(AtomicBool::new(false)); // stops immediately

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let handle = start_receive_loop(addr, pipeline, running);
        assert!(handle.is_ok(), "binding port 0 must succeed");
        handle.unwrap().join().expect("receive thread must exit cleanly");
    }
}
