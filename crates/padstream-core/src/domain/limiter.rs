//! Token-bucket rate limiter.
//!
//! A token bucket holds up to `burst` tokens and refills continuously at
//! `rate` tokens per second. Each admitted packet consumes one token, so a
//! client may burst up to `burst` packets instantly but sustains at most
//! `rate` packets per second over time.
//!
//! The host keeps one bucket per client and one per source address; both
//! are instances of this type with different parameters. Time is always
//! passed in by the caller, never read from a system clock here, so tests
//! can step the clock precisely.

use std::time::Instant;

/// A deterministic token bucket.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    /// Refill rate in tokens per second.
    rate: f64,
    /// Maximum token count (burst capacity).
    burst: u32,
    /// Current token count; fractional tokens accumulate between packets.
    tokens: f64,
    /// When the bucket was last refilled.
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket.
    ///
    /// `now` seeds the refill clock; pass the same time source used for
    /// later [`try_consume`] calls.
    ///
    /// [`try_consume`]: TokenBucket::try_consume
    pub fn new(rate: f64, burst: u32, now: Instant) -> Self {
        Self {
            rate,
            burst,
            tokens: f64::from(burst),
            last_refill: now,
        }
    }

    /// Attempts to consume `n` tokens at time `now`.
    ///
    /// The bucket is refilled for the elapsed interval first; the refill is
    /// kept even when the consume is denied, so a denied caller does not
    /// lose accumulated credit.
    pub fn try_consume(&mut self, n: u32, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * self.rate).min(f64::from(self.burst));

        let needed = f64::from(n);
        if self.tokens >= needed {
            self.tokens -= needed;
            true
        } else {
            false
        }
    }

    /// Current token count, rounded down. Diagnostic only.
    pub fn available(&self) -> u32 {
        self.tokens as u32
    }
}
