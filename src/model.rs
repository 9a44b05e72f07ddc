//! Model module - Kinematics for wheeled chassis
//!
//! A model turns motion intents (forward speed, yaw, per-side speeds) into
//! per-motor velocity or voltage commands. Every speed argument is a fraction
//! in `[-1, 1]`; anything outside that range is clamped, never rejected.
//! Velocity commands are scaled by the model's max velocity and voltage
//! commands by its max voltage.

pub mod skid_steer;
pub mod x_drive;

pub use skid_steer::SkidSteerModel;
pub use x_drive::XDriveModel;

use crate::device::{BrakeMode, EncoderUnits, Gearset, MotorPidTuning};

// ============================================================================
// CHASSIS MODEL
// ============================================================================

pub trait ChassisModel: Send + Sync {
    /// Drive both sides forward at the same velocity.
    fn forward(&self, speed: f64);

    /// Blend translation and rotation into velocity commands.
    fn drive_vector(&self, forward_speed: f64, yaw: f64);

    /// Same mixing as [`ChassisModel::drive_vector`], sent as voltage.
    fn drive_vector_voltage(&self, forward_speed: f64, yaw: f64);

    /// Turn in place; the right side runs opposite to the left.
    fn rotate(&self, speed: f64);

    fn stop(&self);

    /// Independent per-side voltage control with a strict deadband.
    fn tank(&self, left_speed: f64, right_speed: f64, threshold: f64);

    /// Single-stick style voltage control with an inclusive deadband.
    fn arcade(&self, forward_speed: f64, yaw: f64, threshold: f64);

    fn left(&self, speed: f64);

    fn right(&self, speed: f64);

    /// Current `[left, right]` sensor readings.
    fn sensor_vals(&self) -> [i32; 2];

    fn reset_sensors(&self);

    fn set_brake_mode(&self, mode: BrakeMode);

    fn set_encoder_units(&self, units: EncoderUnits);

    fn set_gearing(&self, gearset: Gearset);

    fn set_pos_pid(&self, tuning: MotorPidTuning);

    fn set_vel_pid(&self, tuning: MotorPidTuning);

    fn max_velocity(&self) -> f64;

    fn max_voltage(&self) -> f64;
}

// ============================================================================
// MIXING
// ============================================================================

pub(crate) fn clamp_unit(value: f64) -> f64 {
    value.clamp(-1.0, 1.0)
}

/// Scale a unit fraction to an actuator command. Truncates toward zero.
pub(crate) fn scale(fraction: f64, max: f64) -> i16 {
    (fraction * max) as i16
}

/// Mix forward and yaw into `(left, right)` fractions.
///
/// When either side would exceed unit magnitude both are divided by the
/// larger magnitude, so the left/right ratio survives normalization.
pub fn normalize_vector(forward_speed: f64, yaw: f64) -> (f64, f64) {
    let forward_speed = clamp_unit(forward_speed);
    let yaw = clamp_unit(yaw);

    let mut left = forward_speed + yaw;
    let mut right = forward_speed - yaw;

    let max_magnitude = left.abs().max(right.abs());
    if max_magnitude > 1.0 {
        left /= max_magnitude;
        right /= max_magnitude;
    }

    (left, right)
}

/// Clamp both sides and zero any side strictly below `threshold`.
pub fn tank_mix(left_speed: f64, right_speed: f64, threshold: f64) -> (f64, f64) {
    let mut left = clamp_unit(left_speed);
    if left.abs() < threshold {
        left = 0.0;
    }

    let mut right = clamp_unit(right_speed);
    if right.abs() < threshold {
        right = 0.0;
    }

    (left, right)
}

/// Quadrant-based arcade mixing.
///
/// The deadband here is inclusive (`<=`), unlike [`tank_mix`].
pub fn arcade_mix(forward_speed: f64, yaw: f64, threshold: f64) -> (f64, f64) {
    let mut forward_speed = clamp_unit(forward_speed);
    if forward_speed.abs() <= threshold {
        forward_speed = 0.0;
    }

    let mut yaw = clamp_unit(yaw);
    if yaw.abs() <= threshold {
        yaw = 0.0;
    }

    let max_input = forward_speed.abs().max(yaw.abs()).copysign(forward_speed);

    let (left, right) = match (forward_speed >= 0.0, yaw >= 0.0) {
        (true, true) => (max_input, forward_speed - yaw),
        (true, false) => (forward_speed + yaw, max_input),
        (false, true) => (forward_speed + yaw, max_input),
        (false, false) => (max_input, forward_speed - yaw),
    };

    (clamp_unit(left), clamp_unit(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_vector_passes_small_inputs_through() {
        let (left, right) = normalize_vector(0.5, 0.25);
        assert_eq!(left, 0.75);
        assert_eq!(right, 0.25);
    }

    #[test]
    fn test_normalize_vector_divides_by_larger_magnitude() {
        let (left, right) = normalize_vector(1.0, 0.5);
        assert!((left - 1.0).abs() < 1e-12);
        assert!((right - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_vector_clamps_inputs_first() {
        assert_eq!(normalize_vector(5.0, 0.0), (1.0, 1.0));
        assert_eq!(normalize_vector(0.0, -3.0), (-1.0, 1.0));
    }

    #[test]
    fn test_scale_truncates_toward_zero() {
        assert_eq!(scale(0.999, 100.0), 99);
        assert_eq!(scale(-0.999, 100.0), -99);
    }

    #[test]
    fn test_arcade_mix_quadrants() {
        assert_eq!(arcade_mix(0.5, 0.25, 0.0), (0.5, 0.25));
        assert_eq!(arcade_mix(0.5, -0.25, 0.0), (0.25, 0.5));
        assert_eq!(arcade_mix(-0.5, 0.25, 0.0), (-0.25, -0.5));
        assert_eq!(arcade_mix(-0.5, -0.25, 0.0), (-0.5, -0.25));
    }

    #[test]
    fn test_arcade_mix_pure_rotation() {
        assert_eq!(arcade_mix(0.0, 0.5, 0.0), (0.5, -0.5));
        assert_eq!(arcade_mix(0.0, -0.5, 0.0), (-0.5, 0.5));
    }

    // Tank zeroes strictly below the threshold, arcade at or below it.
    #[test]
    fn test_deadband_asymmetry_between_tank_and_arcade() {
        assert_eq!(tank_mix(0.1, 0.1, 0.1), (0.1, 0.1));
        assert_eq!(arcade_mix(0.1, 0.0, 0.1), (0.0, 0.0));
    }
}
