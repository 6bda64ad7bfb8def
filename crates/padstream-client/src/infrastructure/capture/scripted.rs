//! Scripted capture source for tests and demos.
//!
//! Replays a fixed list of snapshots in order, then reports "no device"
//! so the session falls back to heartbeats. Useful for exercising the full
//! client send path without a physical controller.

use std::collections::VecDeque;

use padstream_core::GamepadState;

use crate::application::stream_input::{CaptureError, PadCapture};

/// A capture source that replays a canned sequence of states.
#[derive(Debug, Default)]
pub struct ScriptedCapture {
    states: VecDeque<GamepadState>,
}

impl ScriptedCapture {
    pub fn new(states: impl IntoIterator<Item = GamepadState>) -> Self {
        Self {
            states: states.into_iter().collect(),
        }
    }

    /// States not yet replayed.
    pub fn remaining(&self) -> usize {
        self.states.len()
    }
}

impl PadCapture for ScriptedCapture {
    fn poll(&mut self) -> Result<Option<GamepadState>, CaptureError> {
        Ok(self.states.pop_front())
    }
}
