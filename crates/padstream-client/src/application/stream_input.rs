//! StreamInputUseCase: turns captured snapshots into wire records.
//!
//! This use case owns the client's protocol-facing state — the sequence
//! counter and client identity — and delegates the device read to a
//! [`PadCapture`] trait object injected at construction time. A capture
//! source that reports "no device" does not stall the stream: the session
//! substitutes a neutral snapshot so the host keeps seeing valid, live
//! packets and slot ownership is preserved.

use std::time::{SystemTime, UNIX_EPOCH};

use padstream_core::{encode_packet, GamepadState, Packet, SequenceCounter, PACKET_SIZE};
use thiserror::Error;

/// Error type for capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture backend failed; the device may have been unplugged
    /// mid-read.
    #[error("capture device error: {0}")]
    Device(String),
}

/// Source of gamepad snapshots.
///
/// `Ok(None)` means "no device attached right now" and is not an error;
/// the caller substitutes a neutral heartbeat.
#[cfg_attr(test, mockall::automock)]
pub trait PadCapture: Send {
    fn poll(&mut self) -> Result<Option<GamepadState>, CaptureError>;
}

/// Returns nanoseconds since the Unix epoch, the timestamp base both ends
/// of the stream agree on.
fn wall_clock_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// The streaming session: one client identity plus its outbound sequence.
pub struct StreamSession {
    client_id: u32,
    sequence: SequenceCounter,
}

impl StreamSession {
    pub fn new(client_id: u32) -> Self {
        Self {
            client_id,
            sequence: SequenceCounter::new(),
        }
    }

    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    /// Builds the next encoded datagram from the capture source.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] when the device read itself fails; the
    /// sequence counter is not advanced in that case, so the wire stream
    /// has no gaps the host would misread as loss.
    pub fn next_datagram(
        &self,
        capture: &mut dyn PadCapture,
    ) -> Result<[u8; PACKET_SIZE], CaptureError> {
        let state = capture.poll()?.unwrap_or_else(GamepadState::neutral);
        let packet = Packet::new(self.client_id, self.sequence.next(), state, wall_clock_ns());
        Ok(encode_packet(&packet))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use padstream_core::{buttons, decode_packet, PROTOCOL_VERSION};

    #[test]
    fn test_datagram_carries_captured_state() {
        // Arrange
        let session = StreamSession::new(77);
        let captured = GamepadState {
            buttons: buttons::A | buttons::START,
            left_trigger: 90,
            ..GamepadState::neutral()
        };
        let mut capture = MockPadCapture::new();
        capture.expect_poll().return_once(move || Ok(Some(captured)));

        // Act
        let bytes = session.next_datagram(&mut capture).unwrap();

        // Assert
        let packet = decode_packet(&bytes).unwrap();
        assert_eq!(packet.version, PROTOCOL_VERSION);
        assert_eq!(packet.client_id, 77);
        assert_eq!(packet.sequence, 0);
        assert_eq!(packet.state, captured);
        assert!(packet.timestamp > 0);
    }

    #[test]
    fn test_no_device_produces_neutral_heartbeat() {
        // Arrange
        let session = StreamSession::new(77);
        let mut capture = MockPadCapture::new();
        capture.expect_poll().returning(|| Ok(None));

        // Act
        let bytes = session.next_datagram(&mut capture).unwrap();

        // Assert – the stream stays alive with an all-neutral state
        let packet = decode_packet(&bytes).unwrap();
        assert_eq!(packet.state, GamepadState::neutral());
    }

    #[test]
    fn test_sequence_advances_per_datagram() {
        let session = StreamSession::new(1);
        let mut capture = MockPadCapture::new();
        capture.expect_poll().returning(|| Ok(None));

        for expected in 0..5u16 {
            let bytes = session.next_datagram(&mut capture).unwrap();
            assert_eq!(decode_packet(&bytes).unwrap().sequence, expected);
        }
    }

    #[test]
    fn test_capture_failure_does_not_advance_sequence() {
        let session = StreamSession::new(1);

        let mut failing = MockPadCapture::new();
        failing
            .expect_poll()
            .return_once(|| Err(CaptureError::Device("unplugged".into())));
        assert!(session.next_datagram(&mut failing).is_err());

        // The next successful datagram still starts at sequence 0.
        let mut ok = MockPadCapture::new();
        ok.expect_poll().returning(|| Ok(None));
        let bytes = session.next_datagram(&mut ok).unwrap();
        assert_eq!(decode_packet(&bytes).unwrap().sequence, 0);
    }
}
