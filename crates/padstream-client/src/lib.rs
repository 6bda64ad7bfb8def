//! padstream-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does padstream-client do?
//!
//! The *client* runs on the machine with the physical controller. It:
//!
//! 1. Polls the capture source for the current [`GamepadState`] at a fixed
//!    update rate (30/60/90 Hz).
//! 2. Stamps each snapshot with its client id, the next wrapping sequence
//!    number, and a nanosecond wall-clock timestamp.
//! 3. Fires the encoded 27-byte record at the host over UDP and never waits
//!    for a reply — the stream is strictly one-way.
//!
//! When no capture device is attached the client keeps sending neutral
//! heartbeats, so the host still sees a live, valid stream and ownership of
//! the slot is not lost.
//!
//! [`GamepadState`]: padstream_core::GamepadState

/// Application layer: use cases for the client.
pub mod application;

/// Infrastructure layer: capture adapters, network I/O, and configuration.
pub mod infrastructure;
