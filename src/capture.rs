//! Lifecycle of the recording surface that produces the user's video.
//!
//! This sits outside the comparison engine: it only tracks which user actions
//! are valid in which state.

use crate::error::Error;
use tracing::debug;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    CameraOn,
    Recording,
    Stopped,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    StartCamera,
    StartRecording,
    StopRecording,
    StopCamera,
}

impl RecorderState {
    /// The state reached from `self` on `event`.
    pub fn next(self, event: RecorderEvent) -> Result<Self, Error> {
        use RecorderEvent::*;
        use RecorderState::*;

        match (self, event) {
            (Idle, StartCamera) => Ok(CameraOn),
            (CameraOn, StartRecording) | (Stopped, StartRecording) => Ok(Recording),
            (Recording, StopRecording) => Ok(Stopped),
            (CameraOn, StopCamera) | (Stopped, StopCamera) => Ok(Idle),
            (from, event) => Err(Error::RecorderTransition { from, event }),
        }
    }
}

impl Default for RecorderState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Default)]
pub struct Recorder {
    state: RecorderState,
    takes: usize,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Number of recordings completed so far.
    pub fn takes(&self) -> usize {
        self.takes
    }

    /// Apply `event`. On error the state is left unchanged.
    pub fn dispatch(&mut self, event: RecorderEvent) -> Result<RecorderState, Error> {
        let next = self.state.next(event)?;
        debug!(from = ?self.state, to = ?next, ?event, "recorder transition");
        if next == RecorderState::Stopped {
            self.takes += 1;
        }
        self.state = next;
        Ok(next)
    }
}
