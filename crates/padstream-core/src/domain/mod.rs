//! Domain logic shared by the host and client.
//!
//! This module contains pure logic with no infrastructure dependencies: no
//! sockets, no OS APIs, no clocks of its own. Every operation that depends
//! on time takes an explicit `Instant`, which keeps the logic deterministic
//! and trivially unit-testable. Outer layers depend on this module; it never
//! depends on them.

pub mod limiter;
