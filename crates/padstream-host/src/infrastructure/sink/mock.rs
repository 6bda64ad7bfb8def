//! Mock virtual-pad sink for tests.
//!
//! The real sink drives a platform controller driver that tests cannot
//! observe (and that CI machines do not have). The mock replaces the driver
//! call with in-memory recording: every write lands in a `Mutex<Vec<...>>`
//! so assertions can inspect exactly what was forwarded, to which slot, and
//! in what order.
//!
//! Set `should_fail` to exercise the error-handling path of callers without
//! a broken driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use padstream_core::GamepadState;

use super::{SinkError, VirtualPadSink};

/// A sink that records all writes without touching any driver.
#[derive(Debug, Default)]
pub struct MockPadSink {
    /// Every `(slot, state)` pair passed to `write`, in call order.
    pub writes: Mutex<Vec<(usize, GamepadState)>>,
    /// When `true`, every method returns an error.
    pub should_fail: AtomicBool,
    /// Whether `init` has been called successfully.
    pub initialized: AtomicBool,
    /// Whether `close` has been called.
    pub closed: AtomicBool,
}

impl MockPadSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a sink whose every call fails.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.should_fail.store(true, Ordering::Relaxed);
        sink
    }

    /// Number of writes recorded so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// The states written to one slot, in order.
    pub fn states_for(&self, slot: usize) -> Vec<GamepadState> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, state)| *state)
            .collect()
    }
}

impl VirtualPadSink for MockPadSink {
    fn init(&self) -> Result<(), SinkError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(SinkError::DriverUnavailable("mock failure".into()));
        }
        self.initialized.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn write(&self, slot: usize, state: &GamepadState) -> Result<(), SinkError> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(SinkError::Write("mock failure".into()));
        }
        self.writes.lock().unwrap().push((slot, *state));
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padstream_core::buttons;

    #[test]
    fn test_mock_records_writes_in_order() {
        let sink = MockPadSink::new();
        let a = GamepadState {
            buttons: buttons::A,
            ..GamepadState::neutral()
        };
        let b = GamepadState {
            buttons: buttons::B,
            ..GamepadState::neutral()
        };

        sink.write(0, &a).unwrap();
        sink.write(1, &b).unwrap();
        sink.write(0, &b).unwrap();

        assert_eq!(sink.write_count(), 3);
        assert_eq!(sink.states_for(0), vec![a, b]);
        assert_eq!(sink.states_for(1), vec![b]);
    }

    #[test]
    fn test_failing_mock_returns_errors() {
        let sink = MockPadSink::failing();
        assert!(matches!(
            sink.init(),
            Err(SinkError::DriverUnavailable(_))
        ));
        assert!(matches!(
            sink.write(0, &GamepadState::neutral()),
            Err(SinkError::Write(_))
        ));
    }

    #[test]
    fn test_init_and_close_set_flags() {
        let sink = MockPadSink::new();
        sink.init().unwrap();
        sink.close().unwrap();
        assert!(sink.initialized.load(Ordering::Relaxed));
        assert!(sink.closed.load(Ordering::Relaxed));
    }
}
