//! Mock iterative controller for testing
//!
//! The controller hands out a [`MockControllerHandle`] sharing its state, so
//! a test can keep inspecting and steering it after the controller itself has
//! been moved into a chassis controller.

use super::IterativeController;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct MockControllerState {
    pub target: f64,
    pub output: f64,
    pub last_reading: Option<f64>,
    pub settled: bool,
    pub disabled: bool,
    pub reset_count: u32,
    pub step_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct MockControllerHandle {
    state: Arc<Mutex<MockControllerState>>,
}

impl MockControllerHandle {
    pub fn snapshot(&self) -> MockControllerState {
        self.state.lock().clone()
    }

    pub fn target(&self) -> f64 {
        self.state.lock().target
    }

    pub fn is_disabled(&self) -> bool {
        self.state.lock().disabled
    }

    pub fn set_settled(&self, settled: bool) {
        self.state.lock().settled = settled;
    }

    /// Output returned by every enabled step.
    pub fn set_output(&self, output: f64) {
        self.state.lock().output = output;
    }
}

/// Reports whatever the test says about settling, regardless of error.
#[derive(Debug, Default)]
pub struct MockIterativeController {
    handle: MockControllerHandle,
}

impl MockIterativeController {
    pub fn new() -> (Self, MockControllerHandle) {
        let handle = MockControllerHandle::default();
        (Self { handle: handle.clone() }, handle)
    }
}

impl IterativeController for MockIterativeController {
    fn set_target(&mut self, target: f64) {
        self.handle.state.lock().target = target;
    }

    fn target(&self) -> f64 {
        self.handle.target()
    }

    fn step(&mut self, reading: f64) -> f64 {
        let mut state = self.handle.state.lock();
        state.last_reading = Some(reading);
        state.step_count += 1;
        if state.disabled {
            0.0
        } else {
            state.output
        }
    }

    fn output(&self) -> f64 {
        self.handle.state.lock().output
    }

    fn error(&self) -> f64 {
        let state = self.handle.state.lock();
        state.target - state.last_reading.unwrap_or_default()
    }

    fn is_settled(&mut self) -> bool {
        self.handle.state.lock().settled
    }

    fn reset(&mut self) {
        self.handle.state.lock().reset_count += 1;
    }

    fn flip_disable(&mut self, disabled: bool) {
        self.handle.state.lock().disabled = disabled;
    }

    fn is_disabled(&self) -> bool {
        self.handle.is_disabled()
    }
}
