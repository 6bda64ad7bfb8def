//! Application layer use cases for the client application.
//!
//! - **`stream_input`** – Turns captured gamepad snapshots into encoded
//!   wire records: sequence numbering, timestamping, and the neutral
//!   heartbeat fallback when no device is attached. The actual device read
//!   is behind the [`stream_input::PadCapture`] trait, injected at
//!   construction time.

pub mod stream_input;
