//! Device module - Motor and rotary sensor capabilities consumed by the chassis
//!
//! Hardware drivers live outside this crate. Anything that can take velocity
//! and voltage commands and hand back an encoder can drive a chassis model.

pub mod mock;

use serde::Deserialize;
use std::sync::Arc;

// ============================================================================
// ROTARY SENSOR
// ============================================================================

/// A continuous rotary position sensor (an integrated or external encoder).
pub trait RotarySensor: Send + Sync {
    /// Current position in the sensor's configured units.
    fn get(&self) -> f64;

    /// Zero the sensor at its current position.
    fn reset(&self);
}

// ============================================================================
// MOTOR
// ============================================================================

/// A motor actuator. Handles are shared, so every method takes `&self` and
/// implementations carry their own interior mutability.
pub trait Motor: Send + Sync {
    /// Velocity command in rpm.
    fn move_velocity(&self, velocity: i16);

    /// Voltage command in millivolts.
    fn move_voltage(&self, voltage: i16);

    fn set_brake_mode(&self, mode: BrakeMode);

    fn set_encoder_units(&self, units: EncoderUnits);

    fn set_gearing(&self, gearset: Gearset);

    /// Tuning for the motor's onboard position controller.
    fn set_pos_pid(&self, tuning: MotorPidTuning);

    /// Tuning for the motor's onboard velocity controller.
    fn set_vel_pid(&self, tuning: MotorPidTuning);

    /// The motor's built-in encoder.
    fn encoder(&self) -> Arc<dyn RotarySensor>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrakeMode {
    #[default]
    Coast,
    Brake,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderUnits {
    #[default]
    Degrees,
    Rotations,
    Counts,
}

// ============================================================================
// GEARING
// ============================================================================

/// Internal motor cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gearset {
    Red,
    #[default]
    Green,
    Blue,
}

impl Gearset {
    /// Free speed of the cartridge output shaft.
    pub fn rpm(&self) -> f64 {
        match self {
            Gearset::Red => 100.0,
            Gearset::Green => 200.0,
            Gearset::Blue => 600.0,
        }
    }
}

/// An internal gearset plus the external ratio applied on top of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearsetRatioPair {
    pub internal_gearset: Gearset,
    pub ratio: f64,
}

impl GearsetRatioPair {
    pub fn new(internal_gearset: Gearset, ratio: f64) -> Self {
        Self { internal_gearset, ratio }
    }
}

impl From<Gearset> for GearsetRatioPair {
    fn from(gearset: Gearset) -> Self {
        Self::new(gearset, 1.0)
    }
}

// ============================================================================
// ONBOARD PID TUNING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorPidTuning {
    pub kf: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub filter: f64,
    pub limit: f64,
    pub threshold: f64,
    pub loop_speed: f64,
}

impl MotorPidTuning {
    pub fn new(kf: f64, kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kf,
            kp,
            ki,
            kd,
            filter: 0.0,
            limit: 0.0,
            threshold: 0.0,
            loop_speed: 0.0,
        }
    }
}
