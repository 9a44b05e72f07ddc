//! Chassis module - Closed-loop chassis controllers
//!
//! A chassis controller turns "move this far" and "turn this much" into a
//! stream of commands on a [`ChassisModel`], running its own control loop
//! in the background until the motion settles.

pub mod builder;
pub mod pid_controller;

pub use builder::ChassisControllerBuilder;
pub use pid_controller::{ChassisControllerPid, PidControllers};

use crate::device::GearsetRatioPair;
use crate::model::ChassisModel;
use crate::units::{Angle, Length};
use std::f64::consts::PI;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

// ============================================================================
// CHASSIS SCALES
// ============================================================================

/// Conversion between physical units and encoder degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisScales {
    /// Encoder degrees per meter driven.
    pub straight: f64,
    /// Encoder degrees per degree of chassis rotation.
    pub turn: f64,
}

impl ChassisScales {
    pub fn new(straight: f64, turn: f64) -> Self {
        Self { straight, turn }
    }

    /// Derive the scales from the wheel diameter and the distance between
    /// the left and right wheels.
    pub fn from_dimensions(wheel_diameter: Length, wheelbase: Length) -> Self {
        let diameter = wheel_diameter.as_meters();
        Self {
            straight: 360.0 / (diameter * PI),
            turn: wheelbase.as_meters() / diameter,
        }
    }

    /// Both scales are positive and finite.
    pub fn is_valid(&self) -> bool {
        [self.straight, self.turn]
            .iter()
            .all(|scale| scale.is_finite() && *scale > 0.0)
    }
}

impl Default for ChassisScales {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

// ============================================================================
// CONTROL MODE
// ============================================================================

/// Which PID loops currently drive the chassis.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    None = 0,
    Distance = 1,
    Angle = 2,
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMode::None => write!(f, "none"),
            ControlMode::Distance => write!(f, "distance"),
            ControlMode::Angle => write!(f, "angle"),
        }
    }
}

#[derive(Debug)]
pub(crate) struct AtomicMode(AtomicU8);

impl AtomicMode {
    pub(crate) fn new(mode: ControlMode) -> Self {
        Self(AtomicU8::new(mode as u8))
    }

    pub(crate) fn load(&self) -> ControlMode {
        match self.0.load(Ordering::Acquire) {
            1 => ControlMode::Distance,
            2 => ControlMode::Angle,
            _ => ControlMode::None,
        }
    }

    pub(crate) fn store(&self, mode: ControlMode) {
        self.0.store(mode as u8, Ordering::Release);
    }
}

// ============================================================================
// CHASSIS CONTROLLER
// ============================================================================

/// An asynchronous positional chassis controller.
pub trait ChassisController: Send + Sync {
    /// Drive straight for `target` and block until settled.
    fn move_distance(&self, target: Length) {
        self.move_distance_async(target);
        self.wait_until_settled();
    }

    /// Start driving straight for `target` and return immediately.
    fn move_distance_async(&self, target: Length);

    /// Drive straight for `ticks` scaled motor degrees and block until settled.
    fn move_raw(&self, ticks: f64) {
        self.move_raw_async(ticks);
        self.wait_until_settled();
    }

    fn move_raw_async(&self, ticks: f64);

    /// Turn in place by `target` and block until settled.
    fn turn_angle(&self, target: Angle) {
        self.turn_angle_async(target);
        self.wait_until_settled();
    }

    fn turn_angle_async(&self, target: Angle);

    fn turn_raw(&self, ticks: f64) {
        self.turn_raw_async(ticks);
        self.wait_until_settled();
    }

    fn turn_raw_async(&self, ticks: f64);

    /// Swap the direction of positive turns.
    fn set_turns_mirrored(&self, mirrored: bool);

    /// Block until the current motion settles, then stop the chassis.
    fn wait_until_settled(&self);

    /// Stop the chassis immediately, abandoning the current motion.
    fn stop(&self);

    fn chassis_scales(&self) -> ChassisScales;

    fn gearset_ratio_pair(&self) -> GearsetRatioPair;

    fn model(&self) -> Arc<dyn ChassisModel>;
}
