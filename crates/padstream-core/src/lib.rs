//! # padstream-core
//!
//! Shared library for Padstream containing the wire protocol codec, packet
//! types, sequence numbering, and the token-bucket rate limiter.
//!
//! This crate is used by both the host and client applications. It has zero
//! dependencies on OS APIs, UI frameworks, or network sockets.
//!
//! # Architecture overview
//!
//! Padstream streams physical controller input from a client machine to a
//! host machine over UDP, where it is reconstructed as a virtual controller
//! the host's games can consume. The transport is deliberately lossy: there
//! are no acknowledgments and no retransmits. A stale or missing packet
//! simply means the host repeats the last applied input.
//!
//! This crate defines:
//!
//! - **`protocol`** – how bytes travel over the wire. Each datagram carries
//!   one fixed 27-byte record: a version byte, the sender's client id, a
//!   wrapping 16-bit sequence number, a full [`GamepadState`] snapshot, and
//!   a nanosecond timestamp.
//!
//! - **`domain`** – pure shared logic. Currently the [`TokenBucket`]
//!   limiter, which the host instantiates per client and per source
//!   address to bound hostile traffic.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `padstream_core::GamepadState` instead of the full module path.
pub use domain::limiter::TokenBucket;
pub use protocol::codec::{decode_packet, encode_packet, ProtocolError};
pub use protocol::packet::{
    buttons, GamepadState, Packet, MAX_DATAGRAM_SIZE, PACKET_SIZE, PROTOCOL_VERSION,
};
pub use protocol::sequence::{sequence_newer, SequenceCounter};
