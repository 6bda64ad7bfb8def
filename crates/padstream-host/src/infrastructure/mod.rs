//! Infrastructure layer for the host application.
//!
//! Contains the OS-facing adapters: the UDP receive loop, the virtual-pad
//! sink boundary, file-system configuration, and the status query surface.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `padstream_core`, but MUST NOT be imported by the application layer.

pub mod network;
pub mod sink;
pub mod status;
pub mod storage;
