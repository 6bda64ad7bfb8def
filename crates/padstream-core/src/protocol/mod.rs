//! Protocol module containing the wire record types and the binary codec.

pub mod codec;
pub mod packet;
pub mod sequence;

pub use codec::{decode_packet, encode_packet, ProtocolError};
pub use packet::{GamepadState, Packet, MAX_DATAGRAM_SIZE, PACKET_SIZE, PROTOCOL_VERSION};
pub use sequence::{sequence_newer, SequenceCounter};
