//! Padstream wire record types.
//!
//! The protocol is a one-way UDP stream of fixed-size input records. Every
//! datagram carries exactly one [`Packet`]: a small header identifying the
//! sender plus a full [`GamepadState`] snapshot. There is no delta encoding
//! and no acknowledgment; a lost datagram simply means the host keeps the
//! last applied state until the next one arrives.

use serde::{Deserialize, Serialize};

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x02;

/// Exact size of one encoded packet in bytes.
///
/// This is the sum of the field widths with no padding anywhere:
/// `1 + 4 + 2 + 2 + 1 + 1 + 2 + 2 + 2 + 2 + 8 = 27`.
pub const PACKET_SIZE: usize = 27;

/// Hard ceiling on accepted datagram size. Anything larger is rejected
/// before decoding is attempted.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

// ── Button bitmask ────────────────────────────────────────────────────────────

/// Button bitmask flags used in [`GamepadState::buttons`].
///
/// The layout matches the XInput button numbering so a host-side driver can
/// forward the mask without translation.
pub mod buttons {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

// ── Gamepad state ─────────────────────────────────────────────────────────────

/// Full snapshot of a gamepad's inputs.
///
/// Every field covers its entire bit range: any 16-bit button mask, any
/// 0–255 trigger magnitude, and any signed 16-bit stick position are valid
/// by construction. The type is `Copy` and immutable once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GamepadState {
    /// Pressed-button bitmask; see [`buttons`].
    pub buttons: u16,
    /// Left trigger magnitude, 0 (released) to 255 (fully pressed).
    pub left_trigger: u8,
    /// Right trigger magnitude, 0 to 255.
    pub right_trigger: u8,
    /// Left stick X axis, -32768 (full left) to 32767 (full right).
    pub left_x: i16,
    /// Left stick Y axis.
    pub left_y: i16,
    /// Right stick X axis.
    pub right_x: i16,
    /// Right stick Y axis.
    pub right_y: i16,
}

impl GamepadState {
    /// Returns the all-zero state: no buttons, centered sticks, released
    /// triggers. Clients send this as a heartbeat when no device is attached.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Returns `true` if every button in `mask` is pressed.
    pub fn pressed(&self, mask: u16) -> bool {
        self.buttons & mask == mask
    }
}

// ── Packet ────────────────────────────────────────────────────────────────────

/// One decoded wire record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// Protocol version; always [`PROTOCOL_VERSION`] for accepted packets.
    pub version: u8,
    /// Sender-chosen 32-bit client identifier.
    pub client_id: u32,
    /// Per-client wrapping sequence number.
    pub sequence: u16,
    /// The input snapshot carried by this packet.
    pub state: GamepadState,
    /// Nanoseconds since an arbitrary monotonic epoch chosen by the sender.
    pub timestamp: u64,
}

impl Packet {
    /// Builds a packet stamped with the current protocol version.
    pub fn new(client_id: u32, sequence: u16, state: GamepadState, timestamp: u64) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            client_id,
            sequence,
            state,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_state_is_all_zero() {
        let state = GamepadState::neutral();
        assert_eq!(state.buttons, 0);
        assert_eq!(state.left_trigger, 0);
        assert_eq!(state.right_trigger, 0);
        assert_eq!(state.left_x, 0);
        assert_eq!(state.left_y, 0);
        assert_eq!(state.right_x, 0);
        assert_eq!(state.right_y, 0);
    }

    #[test]
    fn test_pressed_matches_full_mask_only() {
        let state = GamepadState {
            buttons: buttons::A | buttons::START,
            ..GamepadState::neutral()
        };
        assert!(state.pressed(buttons::A));
        assert!(state.pressed(buttons::A | buttons::START));
        assert!(!state.pressed(buttons::A | buttons::B));
    }

    #[test]
    fn test_packet_new_stamps_current_version() {
        let packet = Packet::new(7, 0, GamepadState::neutral(), 0);
        assert_eq!(packet.version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_button_bits_are_distinct() {
        let all = [
            buttons::DPAD_UP,
            buttons::DPAD_DOWN,
            buttons::DPAD_LEFT,
            buttons::DPAD_RIGHT,
            buttons::START,
            buttons::BACK,
            buttons::LEFT_THUMB,
            buttons::RIGHT_THUMB,
            buttons::LEFT_SHOULDER,
            buttons::RIGHT_SHOULDER,
            buttons::A,
            buttons::B,
            buttons::X,
            buttons::Y,
        ];
        let mut seen = 0u16;
        for bit in all {
            assert_eq!(seen & bit, 0, "button bit {bit:#06x} overlaps another");
            seen |= bit;
        }
    }
}
