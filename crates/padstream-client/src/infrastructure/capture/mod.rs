//! Capture implementations.
//!
//! Reading the physical controller is a platform-driver concern that lives
//! outside this crate; anything that implements
//! [`PadCapture`](crate::application::stream_input::PadCapture) can be
//! plugged into the streamer. Shipped here:
//!
//! - [`NoDeviceCapture`] – always reports "no device", which makes the
//!   session emit neutral heartbeats. This is the default wiring in the
//!   binary.
//! - [`scripted::ScriptedCapture`] – replays a fixed list of states, for
//!   tests and demos.

pub mod scripted;

pub use scripted::ScriptedCapture;

use padstream_core::GamepadState;

use crate::application::stream_input::{CaptureError, PadCapture};

/// A capture source with no device behind it.
#[derive(Debug, Default)]
pub struct NoDeviceCapture;

impl NoDeviceCapture {
    pub fn new() -> Self {
        Self
    }
}

impl PadCapture for NoDeviceCapture {
    fn poll(&mut self) -> Result<Option<GamepadState>, CaptureError> {
        Ok(None)
    }
}
