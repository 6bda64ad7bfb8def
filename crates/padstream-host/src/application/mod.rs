//! Application layer use cases for the host.
//!
//! Everything in this layer is pure logic over explicit inputs: no sockets,
//! no file system, no clocks of its own. The receive pipeline in the
//! infrastructure layer feeds it decoded packets plus the current time and
//! gets back a routing decision or a rejection.
//!
//! # Sub-modules
//!
//! - **`security`** – The admission-control state machine: per-client and
//!   per-address records, rate limits, violations, blocks, the whitelist,
//!   and the bounded security-event log. This is where hostile traffic is
//!   absorbed.
//!
//! - **`replay`** – Timestamp freshness and sequence-progress checks that
//!   reject duplicated or replayed datagrams.
//!
//! - **`session`** – Slot ownership: which validated client drives which
//!   virtual-controller slot, with single-owner timeout semantics.
//!
//! - **`telemetry`** – Per-slot receive-rate and inter-arrival jitter
//!   counters surfaced to the status display.

pub mod replay;
pub mod security;
pub mod session;
pub mod telemetry;
