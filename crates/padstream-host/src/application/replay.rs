//! Replay and duplicate rejection for the input stream.
//!
//! UDP gives no ordering or duplicate protection, and an attacker who can
//! observe the stream can re-send captured datagrams verbatim. Two checks
//! close that hole without any handshake:
//!
//! - **Timestamp freshness**: a packet whose timestamp is older than
//!   `max_age` is stale (captured and replayed, or badly delayed); one more
//!   than `max_future` ahead of the host clock is forged or from a sender
//!   with broken clocks.
//! - **Sequence progress**: a packet's sequence number must be strictly
//!   newer than the last accepted one under 16-bit wraparound, which
//!   rejects exact duplicates and stale reorders while tolerating the
//!   counter wrapping from 65535 to 0.
//!
//! Both checks are pure functions of their inputs; the caller supplies the
//! host clock reading so tests can pin time exactly.

use std::time::Duration;

use padstream_core::sequence_newer;
use thiserror::Error;

/// Freshness window applied to packet timestamps.
#[derive(Debug, Clone)]
pub struct ReplayPolicy {
    /// Maximum accepted packet age.
    pub max_age: Duration,
    /// Maximum tolerated clock skew into the future.
    pub max_future: Duration,
}

impl Default for ReplayPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(5),
            max_future: Duration::from_secs(1),
        }
    }
}

/// Reasons a packet fails the replay check.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ReplayError {
    /// The timestamp is older than the freshness window allows.
    #[error("timestamp is {age_ms}ms old")]
    Stale { age_ms: u64 },

    /// The timestamp is further in the future than clock skew can explain.
    #[error("timestamp is {ahead_ms}ms in the future")]
    FromFuture { ahead_ms: u64 },

    /// The sequence number is not strictly newer than the last accepted one.
    #[error("sequence {sequence} is not newer than {last}")]
    DuplicateOrReordered { sequence: u16, last: u16 },
}

/// Validates one packet's timestamp and sequence number.
///
/// `last_sequence` is `None` for the first packet ever seen from a client;
/// the sequence check then passes unconditionally (any starting value is
/// legal). `now_ns` is the host's reading of the shared nanosecond clock.
///
/// # Errors
///
/// Returns the first failed check; timestamp checks run before the
/// sequence check.
pub fn check(
    policy: &ReplayPolicy,
    last_sequence: Option<u16>,
    sequence: u16,
    timestamp_ns: u64,
    now_ns: u64,
) -> Result<(), ReplayError> {
    // Signed age in nanoseconds; negative means the timestamp is ahead of us.
    let age_ns = i128::from(now_ns) - i128::from(timestamp_ns);

    if age_ns > policy.max_age.as_nanos() as i128 {
        return Err(ReplayError::Stale {
            age_ms: (age_ns / 1_000_000) as u64,
        });
    }
    if -age_ns > policy.max_future.as_nanos() as i128 {
        return Err(ReplayError::FromFuture {
            ahead_ms: (-age_ns / 1_000_000) as u64,
        });
    }

    if let Some(last) = last_sequence {
        if !sequence_newer(sequence, last) {
            return Err(ReplayError::DuplicateOrReordered { sequence, last });
        }
    }

    Ok(())
}
