//! Infrastructure layer for the client application.
//!
//! Contains the OS-facing adapters: capture implementations, the UDP send
//! loop, and configuration persistence.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `padstream_core`, but MUST NOT be imported by the application layer.
//!
//! # Sub-modules
//!
//! - **`capture`** – Implementations of `PadCapture`. The physical
//!   controller driver is an external collaborator; what ships here is the
//!   no-device heartbeat source and a scripted capture for tests.
//!
//! - **`network`** – The UDP streamer: binds an ephemeral socket and sends
//!   one encoded record per pacing interval until shut down.
//!
//! - **`storage`** – TOML configuration (target address, port, update
//!   rate, client id).

pub mod capture;
pub mod network;
pub mod storage;
