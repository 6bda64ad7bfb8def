//! The virtual-pad sink boundary.
//!
//! The platform driver that materializes a controller visible to games is
//! an external collaborator; this module only defines the seam. The
//! pipeline writes one full [`GamepadState`] per forwarded packet — sink
//! implementations are expected to be fast and non-blocking, since the
//! write happens on the receive thread.
//!
//! Two implementations ship with the host:
//!
//! - [`LoggingSink`] logs every applied state, which is what the host does
//!   when no platform driver is wired in.
//! - [`mock::MockPadSink`] records writes in memory for tests.

use padstream_core::GamepadState;
use thiserror::Error;
use tracing::{debug, info};

pub mod mock;

pub use mock::MockPadSink;

/// Error type for sink operations.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The platform driver is not installed or failed to start.
    #[error("virtual pad driver unavailable: {0}")]
    DriverUnavailable(String),

    /// A state write was not accepted by the driver.
    #[error("sink write failed: {0}")]
    Write(String),
}

/// Destination for validated input states.
///
/// One sink instance serves all slots; `slot` selects which virtual
/// controller the state drives.
pub trait VirtualPadSink: Send + Sync {
    /// Prepares the sink. Fails when the platform driver is unavailable;
    /// the caller decides whether to retry.
    fn init(&self) -> Result<(), SinkError>;

    /// Applies `state` to the virtual controller behind `slot`.
    fn write(&self, slot: usize, state: &GamepadState) -> Result<(), SinkError>;

    /// Releases driver resources. Idempotent.
    fn close(&self) -> Result<(), SinkError>;
}

/// A sink that logs applied states instead of driving a real controller.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl LoggingSink {
    pub fn new() -> Self {
        Self
    }
}

impl VirtualPadSink for LoggingSink {
    fn init(&self) -> Result<(), SinkError> {
        info!("logging sink ready (no platform driver)");
        Ok(())
    }

    fn write(&self, slot: usize, state: &GamepadState) -> Result<(), SinkError> {
        debug!(
            slot,
            buttons = state.buttons,
            lt = state.left_trigger,
            rt = state.right_trigger,
            lx = state.left_x,
            ly = state.left_y,
            rx = state.right_x,
            ry = state.right_y,
            "state applied"
        );
        Ok(())
    }

    fn close(&self) -> Result<(), SinkError> {
        info!("logging sink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_sink_accepts_writes() {
        let sink = LoggingSink::new();
        assert!(sink.init().is_ok());
        assert!(sink.write(0, &GamepadState::neutral()).is_ok());
        assert!(sink.close().is_ok());
    }
}
