//! Network infrastructure for the host.
//!
//! # Sub-modules
//!
//! - **`server`** – Binds the UDP input port, drains it on a dedicated
//!   thread, and runs each datagram through the admission pipeline. Also
//!   owns the periodic registry-sweep thread. One datagram in, at most one
//!   sink write out, and nothing is ever sent back to the sender.

pub mod server;
