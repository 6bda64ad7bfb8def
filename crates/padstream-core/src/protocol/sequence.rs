//! Sequence numbering for the input stream.
//!
//! Every packet carries a 16-bit sequence number that wraps from 65535 back
//! to 0. The sender increments it once per packet; the host uses it to
//! discard duplicates and stale reorders without any handshake.
//!
//! # Wraparound comparison
//!
//! With only 16 bits the counter wraps roughly every nine minutes at 120
//! packets per second, so "newer" cannot mean numerically greater. Instead a
//! candidate is newer than the last accepted value when the wrapping
//! difference `(candidate - last) mod 65536` falls in `[1, 32767]`: half the
//! number space ahead counts as progress, the other half (and zero) counts
//! as a duplicate or an old packet arriving late.

use std::sync::atomic::{AtomicU16, Ordering};

/// Returns `true` when `candidate` is strictly newer than `last` under
/// 16-bit wraparound.
///
/// Exact duplicates (`candidate == last`) and anything more than half the
/// sequence space behind are not newer.
pub fn sequence_newer(candidate: u16, last: u16) -> bool {
    let diff = candidate.wrapping_sub(last);
    (1..=0x7FFF).contains(&diff)
}

/// A thread-safe, wrapping 16-bit counter for outbound sequence numbers.
///
/// The counter starts at 0 and increments by 1 with each call to [`next`],
/// wrapping at `u16::MAX` without panicking. `fetch_add` makes concurrent
/// callers safe without a lock; `Ordering::Relaxed` suffices because the
/// value is only used for packet numbering, never for memory
/// synchronization.
///
/// [`next`]: SequenceCounter::next
///
/// # Examples
///
/// ```rust
/// use padstream_core::protocol::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
pub struct SequenceCounter {
    inner: AtomicU16,
}

impl SequenceCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self {
            inner: AtomicU16::new(0),
        }
    }

    /// Returns the next sequence number and advances the counter.
    ///
    /// The first call returns 0, the second returns 1, and so on, wrapping
    /// from `u16::MAX` back to 0.
    pub fn next(&self) -> u16 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the current value without advancing. Useful for logging; by
    /// the time the caller reads it another thread may have moved on.
    pub fn current(&self) -> u16 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    // ── sequence_newer ────────────────────────────────────────────────────────

    #[test]
    fn test_successor_is_newer() {
        assert!(sequence_newer(6, 5));
    }

    #[test]
    fn test_duplicate_is_not_newer() {
        assert!(!sequence_newer(5, 5));
    }

    #[test]
    fn test_predecessor_is_not_newer() {
        assert!(!sequence_newer(5, 6));
    }

    #[test]
    fn test_wraparound_zero_follows_max() {
        assert!(sequence_newer(0, u16::MAX));
        assert!(sequence_newer(1, u16::MAX));
    }

    #[test]
    fn test_half_window_boundaries() {
        // 32767 ahead is still newer; 32768 ahead is not.
        assert!(sequence_newer(0x7FFF, 0));
        assert!(!sequence_newer(0x8000, 0));
    }

    #[test]
    fn test_full_cycle_in_order_is_always_newer() {
        let mut last = 0u16;
        for _ in 0..u16::MAX {
            let next = last.wrapping_add(1);
            assert!(sequence_newer(next, last), "{next} must be newer than {last}");
            last = next;
        }
    }

    // ── SequenceCounter ───────────────────────────────────────────────────────

    #[test]
    fn test_sequence_counter_starts_at_zero() {
        let counter = SequenceCounter::new();
        assert_eq!(counter.next(), 0);
    }

    #[test]
    fn test_sequence_counter_increments_monotonically() {
        let counter = SequenceCounter::new();
        let values: Vec<u16> = (0..100).map(|_| counter.next()).collect();
        for window in values.windows(2) {
            assert!(
                sequence_newer(window[1], window[0]),
                "values must advance in sequence order"
            );
        }
    }

    #[test]
    fn test_sequence_counter_wraps_at_u16_max() {
        let counter = SequenceCounter {
            inner: AtomicU16::new(u16::MAX),
        };
        assert_eq!(counter.next(), u16::MAX);
        assert_eq!(counter.next(), 0, "counter must wrap to 0 after u16::MAX");
    }

    #[test]
    fn test_current_does_not_advance() {
        let counter = SequenceCounter::new();
        counter.next();
        assert_eq!(counter.current(), 1);
        assert_eq!(counter.next(), 1);
    }

    #[test]
    fn test_sequence_counter_is_thread_safe() {
        let counter = Arc::new(SequenceCounter::new());
        let thread_count = 8;
        let increments_per_thread = 1000;

        let handles: Vec<_> = (0..thread_count)
            .map(|_| {
                let c = Arc::clone(&counter);
                thread::spawn(move || {
                    (0..increments_per_thread)
                        .map(|_| c.next())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let total: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked").len())
            .sum();

        // 8000 increments fit within one 16-bit cycle, so the final value
        // must equal the total count of next() calls.
        assert_eq!(total, thread_count * increments_per_thread);
        assert_eq!(counter.current() as usize, total);
    }
}
