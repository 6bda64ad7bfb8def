//! Per-slot receive telemetry.
//!
//! The wire protocol is one-way, so true round-trip latency cannot be
//! measured here. What the host can observe is how the stream arrives:
//! packets per second over a one-second window and jitter, the standard
//! deviation of the inter-arrival gaps over a rolling window of the last 50
//! samples. Both are what the status surface reports.

use std::collections::VecDeque;
use std::time::Instant;

/// Rolling window used for the jitter estimate.
const JITTER_WINDOW: usize = 50;

/// Counters for one slot.
#[derive(Debug)]
struct SlotTelemetry {
    packets: u64,
    last_arrival: Option<Instant>,
    gaps_ms: VecDeque<f64>,
    window_start: Option<Instant>,
    window_count: u32,
    rate_hz: f32,
    last_sequence: u16,
}

impl SlotTelemetry {
    fn new() -> Self {
        Self {
            packets: 0,
            last_arrival: None,
            gaps_ms: VecDeque::with_capacity(JITTER_WINDOW),
            window_start: None,
            window_count: 0,
            rate_hz: 0.0,
            last_sequence: 0,
        }
    }

    fn record(&mut self, sequence: u16, now: Instant) {
        self.packets += 1;
        self.last_sequence = sequence;

        if let Some(previous) = self.last_arrival {
            let gap_ms = now.saturating_duration_since(previous).as_secs_f64() * 1000.0;
            if self.gaps_ms.len() == JITTER_WINDOW {
                self.gaps_ms.pop_front();
            }
            self.gaps_ms.push_back(gap_ms);
        }
        self.last_arrival = Some(now);

        // Rate over a one-second window; the completed window's value is
        // what gets reported.
        match self.window_start {
            None => {
                self.window_start = Some(now);
                self.window_count = 1;
            }
            Some(start) => {
                self.window_count += 1;
                let elapsed = now.saturating_duration_since(start).as_secs_f64();
                if elapsed >= 1.0 {
                    self.rate_hz = (f64::from(self.window_count) / elapsed) as f32;
                    self.window_start = Some(now);
                    self.window_count = 0;
                }
            }
        }
    }

    fn jitter_ms(&self) -> f32 {
        if self.gaps_ms.len() < 2 {
            return 0.0;
        }
        let n = self.gaps_ms.len() as f64;
        let mean = self.gaps_ms.iter().sum::<f64>() / n;
        let variance = self
            .gaps_ms
            .iter()
            .map(|gap| {
                let d = gap - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1.0);
        variance.sqrt() as f32
    }
}

/// Point-in-time view of one slot's counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotStats {
    pub packets: u64,
    pub rate_hz: f32,
    pub jitter_ms: f32,
    pub last_sequence: u16,
}

/// Telemetry for every slot, indexed alongside the session manager.
pub struct TelemetryBook {
    slots: Vec<SlotTelemetry>,
}

impl TelemetryBook {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: (0..slot_count).map(|_| SlotTelemetry::new()).collect(),
        }
    }

    /// Records one forwarded packet for `slot`. Out-of-range slots are
    /// ignored rather than panicking; the slot count is fixed at startup.
    pub fn record(&mut self, slot: usize, sequence: u16, now: Instant) {
        if let Some(telemetry) = self.slots.get_mut(slot) {
            telemetry.record(sequence, now);
        }
    }

    pub fn stats(&self, slot: usize) -> Option<SlotStats> {
        self.slots.get(slot).map(|t| SlotStats {
            packets: t.packets,
            rate_hz: t.rate_hz,
            jitter_ms: t.jitter_ms(),
            last_sequence: t.last_sequence,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
