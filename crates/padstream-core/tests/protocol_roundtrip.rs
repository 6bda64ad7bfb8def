//! Integration tests for the padstream-core protocol.
//!
//! These tests exercise the public API end to end: packets built with a
//! [`SequenceCounter`] are encoded, decoded, and compared field by field,
//! the way the client and host use the crate together.

use padstream_core::{
    buttons, decode_packet, encode_packet, GamepadState, Packet, ProtocolError, SequenceCounter,
    MAX_DATAGRAM_SIZE, PACKET_SIZE,
};

/// Encodes a packet and decodes it back, asserting the result matches.
fn roundtrip(packet: Packet) -> Packet {
    let bytes = encode_packet(&packet);
    decode_packet(&bytes).expect("decode must succeed")
}

#[test]
fn test_roundtrip_sequence_of_packets() {
    let counter = SequenceCounter::new();
    for i in 0..10 {
        let original = Packet::new(
            42,
            counter.next(),
            GamepadState {
                buttons: buttons::A,
                left_x: i * 100,
                ..GamepadState::neutral()
            },
            1_000_000 * u64::from(i as u16),
        );
        assert_eq!(roundtrip(original), original);
    }
}

#[test]
fn test_roundtrip_every_button_bit() {
    for bit in 0..16u32 {
        let mask = 1u16 << bit;
        let original = Packet::new(7, 0, GamepadState { buttons: mask, ..GamepadState::neutral() }, 5);
        let decoded = roundtrip(original);
        assert_eq!(decoded.state.buttons, mask);
    }
}

#[test]
fn test_roundtrip_full_trigger_and_axis_extremes() {
    let original = Packet::new(
        u32::MAX,
        u16::MAX,
        GamepadState {
            buttons: u16::MAX,
            left_trigger: u8::MAX,
            right_trigger: u8::MAX,
            left_x: i16::MIN,
            left_y: i16::MAX,
            right_x: i16::MIN,
            right_y: i16::MAX,
        },
        u64::MAX,
    );
    assert_eq!(roundtrip(original), original);
}

#[test]
fn test_wire_size_constant_matches_encoded_length() {
    let bytes = encode_packet(&Packet::new(1, 1, GamepadState::neutral(), 1));
    assert_eq!(bytes.len(), PACKET_SIZE);
}

#[test]
fn test_decode_rejects_garbage_without_panicking() {
    // Every length from 0 to just under a full packet must fail cleanly.
    for len in 0..PACKET_SIZE {
        let garbage = vec![0xA5u8; len];
        assert!(matches!(
            decode_packet(&garbage),
            Err(ProtocolError::TooShort { .. })
        ));
    }

    // A full-size buffer of garbage fails only on the version byte.
    let garbage = vec![0xA5u8; PACKET_SIZE];
    assert!(matches!(
        decode_packet(&garbage),
        Err(ProtocolError::BadVersion(0xA5))
    ));

    // Oversized garbage is refused before any parsing.
    let oversized = vec![0xA5u8; MAX_DATAGRAM_SIZE + 100];
    assert!(matches!(
        decode_packet(&oversized),
        Err(ProtocolError::SizeExceeded { .. })
    ));
}
