//! Binary codec for the Padstream input record.
//!
//! Wire format:
//! ```text
//! [version:1][client_id:4][sequence:2][buttons:2][lt:1][rt:1]
//! [lx:2][ly:2][rx:2][ry:2][timestamp:8]
//! ```
//! Total size: 27 bytes. All multi-byte integers are little-endian, and
//! there is no padding between fields. Two conformant implementations must
//! produce byte-identical encodings for identical field values.
//!
//! Datagrams longer than [`PACKET_SIZE`] but within [`MAX_DATAGRAM_SIZE`]
//! decode from their first 27 bytes; the tail is ignored so a future
//! protocol revision can append fields without breaking older hosts.

use thiserror::Error;

use crate::protocol::packet::{
    GamepadState, Packet, MAX_DATAGRAM_SIZE, PACKET_SIZE, PROTOCOL_VERSION,
};

/// Errors that can occur while decoding a datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than one full packet.
    #[error("packet too short: need {needed} bytes, got {available}")]
    TooShort { needed: usize, available: usize },

    /// The version byte is not the supported protocol version.
    #[error("unsupported protocol version: {0}")]
    BadVersion(u8),

    /// The datagram exceeds the hard size ceiling; rejected before any
    /// field is parsed.
    #[error("datagram of {actual} bytes exceeds the {limit}-byte ceiling")]
    SizeExceeded { limit: usize, actual: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`Packet`] into its fixed 27-byte wire form.
pub fn encode_packet(packet: &Packet) -> [u8; PACKET_SIZE] {
    let mut buf = [0u8; PACKET_SIZE];
    buf[0] = packet.version;
    buf[1..5].copy_from_slice(&packet.client_id.to_le_bytes());
    buf[5..7].copy_from_slice(&packet.sequence.to_le_bytes());
    buf[7..9].copy_from_slice(&packet.state.buttons.to_le_bytes());
    buf[9] = packet.state.left_trigger;
    buf[10] = packet.state.right_trigger;
    buf[11..13].copy_from_slice(&packet.state.left_x.to_le_bytes());
    buf[13..15].copy_from_slice(&packet.state.left_y.to_le_bytes());
    buf[15..17].copy_from_slice(&packet.state.right_x.to_le_bytes());
    buf[17..19].copy_from_slice(&packet.state.right_y.to_le_bytes());
    buf[19..27].copy_from_slice(&packet.timestamp.to_le_bytes());
    buf
}

/// Decodes one [`Packet`] from the beginning of `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError::SizeExceeded`] for datagrams above the ceiling,
/// [`ProtocolError::TooShort`] for truncated input, and
/// [`ProtocolError::BadVersion`] for an unsupported version byte. Decoding
/// never panics: every bit pattern of the remaining fixed-width fields is a
/// valid value.
pub fn decode_packet(bytes: &[u8]) -> Result<Packet, ProtocolError> {
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(ProtocolError::SizeExceeded {
            limit: MAX_DATAGRAM_SIZE,
            actual: bytes.len(),
        });
    }
    if bytes.len() < PACKET_SIZE {
        return Err(ProtocolError::TooShort {
            needed: PACKET_SIZE,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::BadVersion(version));
    }

    let client_id = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    let sequence = u16::from_le_bytes([bytes[5], bytes[6]]);
    let state = GamepadState {
        buttons: u16::from_le_bytes([bytes[7], bytes[8]]),
        left_trigger: bytes[9],
        right_trigger: bytes[10],
        left_x: i16::from_le_bytes([bytes[11], bytes[12]]),
        left_y: i16::from_le_bytes([bytes[13], bytes[14]]),
        right_x: i16::from_le_bytes([bytes[15], bytes[16]]),
        right_y: i16::from_le_bytes([bytes[17], bytes[18]]),
    };
    let timestamp = u64::from_le_bytes([
        bytes[19], bytes[20], bytes[21], bytes[22], bytes[23], bytes[24], bytes[25], bytes[26],
    ]);

    Ok(Packet {
        version,
        client_id,
        sequence,
        state,
        timestamp,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
