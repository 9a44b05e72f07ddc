use super::{arcade_mix, clamp_unit, normalize_vector, scale, tank_mix, ChassisModel};
use crate::device::{BrakeMode, EncoderUnits, Gearset, Motor, MotorPidTuning, RotarySensor};
use std::sync::Arc;

/// Four-wheel holonomic drive with wheels at 45 degrees.
///
/// The two left motors (top-left, bottom-left) and the two right motors
/// (top-right, bottom-right) act as the sides of a skid-steer for every
/// differential operation; `strafe` and `x_arcade` add sideways motion.
pub struct XDriveModel {
    top_left: Arc<dyn Motor>,
    top_right: Arc<dyn Motor>,
    bottom_right: Arc<dyn Motor>,
    bottom_left: Arc<dyn Motor>,
    left_sensor: Arc<dyn RotarySensor>,
    right_sensor: Arc<dyn RotarySensor>,
    max_velocity: f64,
    max_voltage: f64,
}

impl XDriveModel {
    /// Build a model that reads the top-left and top-right encoders.
    pub fn new(
        top_left: Arc<dyn Motor>,
        top_right: Arc<dyn Motor>,
        bottom_right: Arc<dyn Motor>,
        bottom_left: Arc<dyn Motor>,
        max_velocity: f64,
        max_voltage: f64,
    ) -> Self {
        let left_sensor = top_left.encoder();
        let right_sensor = top_right.encoder();
        Self::with_sensors(
            [top_left, top_right, bottom_right, bottom_left],
            left_sensor,
            right_sensor,
            max_velocity,
            max_voltage,
        )
    }

    /// Motors are given as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn with_sensors(
        motors: [Arc<dyn Motor>; 4],
        left_sensor: Arc<dyn RotarySensor>,
        right_sensor: Arc<dyn RotarySensor>,
        max_velocity: f64,
        max_voltage: f64,
    ) -> Self {
        let [top_left, top_right, bottom_right, bottom_left] = motors;
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
            left_sensor,
            right_sensor,
            max_velocity,
            max_voltage,
        }
    }

    /// Strafe sideways; positive speed moves right.
    pub fn strafe(&self, speed: f64) {
        let speed = scale(clamp_unit(speed), self.max_velocity);
        self.top_left.move_velocity(speed);
        self.top_right.move_velocity(-speed);
        self.bottom_right.move_velocity(speed);
        self.bottom_left.move_velocity(-speed);
    }

    /// Holonomic arcade control with a strict deadband on every axis.
    pub fn x_arcade(&self, x_speed: f64, forward_speed: f64, yaw: f64, threshold: f64) {
        let deadband = |value: f64| {
            let value = clamp_unit(value);
            if value.abs() < threshold {
                0.0
            } else {
                value
            }
        };
        let x = deadband(x_speed);
        let forward = deadband(forward_speed);
        let yaw = deadband(yaw);

        let volts = |fraction: f64| scale(clamp_unit(fraction), self.max_voltage);
        self.top_left.move_voltage(volts(forward + x + yaw));
        self.top_right.move_voltage(volts(forward - x - yaw));
        self.bottom_right.move_voltage(volts(forward + x - yaw));
        self.bottom_left.move_voltage(volts(forward - x + yaw));
    }

    fn motors(&self) -> [&Arc<dyn Motor>; 4] {
        [&self.top_left, &self.top_right, &self.bottom_right, &self.bottom_left]
    }

    fn velocity(&self, left: f64, right: f64) {
        let left = scale(left, self.max_velocity);
        let right = scale(right, self.max_velocity);
        self.top_left.move_velocity(left);
        self.top_right.move_velocity(right);
        self.bottom_right.move_velocity(right);
        self.bottom_left.move_velocity(left);
    }

    fn voltage(&self, left: f64, right: f64) {
        let left = scale(left, self.max_voltage);
        let right = scale(right, self.max_voltage);
        self.top_left.move_voltage(left);
        self.top_right.move_voltage(right);
        self.bottom_right.move_voltage(right);
        self.bottom_left.move_voltage(left);
    }
}

impl ChassisModel for XDriveModel {
    fn forward(&self, speed: f64) {
        let speed = clamp_unit(speed);
        self.velocity(speed, speed);
    }

    fn drive_vector(&self, forward_speed: f64, yaw: f64) {
        let (left, right) = normalize_vector(forward_speed, yaw);
        self.velocity(left, right);
    }

    fn drive_vector_voltage(&self, forward_speed: f64, yaw: f64) {
        let (left, right) = normalize_vector(forward_speed, yaw);
        self.voltage(left, right);
    }

    fn rotate(&self, speed: f64) {
        let speed = clamp_unit(speed);
        self.velocity(speed, -speed);
    }

    fn stop(&self) {
        for motor in self.motors() {
            motor.move_velocity(0);
        }
    }

    fn tank(&self, left_speed: f64, right_speed: f64, threshold: f64) {
        let (left, right) = tank_mix(left_speed, right_speed, threshold);
        self.voltage(left, right);
    }

    fn arcade(&self, forward_speed: f64, yaw: f64, threshold: f64) {
        let (left, right) = arcade_mix(forward_speed, yaw, threshold);
        self.voltage(left, right);
    }

    fn left(&self, speed: f64) {
        let speed = scale(clamp_unit(speed), self.max_velocity);
        self.top_left.move_velocity(speed);
        self.bottom_left.move_velocity(speed);
    }

    fn right(&self, speed: f64) {
        let speed = scale(clamp_unit(speed), self.max_velocity);
        self.top_right.move_velocity(speed);
        self.bottom_right.move_velocity(speed);
    }

    fn sensor_vals(&self) -> [i32; 2] {
        [self.left_sensor.get() as i32, self.right_sensor.get() as i32]
    }

    fn reset_sensors(&self) {
        self.left_sensor.reset();
        self.right_sensor.reset();
    }

    fn set_brake_mode(&self, mode: BrakeMode) {
        for motor in self.motors() {
            motor.set_brake_mode(mode);
        }
    }

    fn set_encoder_units(&self, units: EncoderUnits) {
        for motor in self.motors() {
            motor.set_encoder_units(units);
        }
    }

    fn set_gearing(&self, gearset: Gearset) {
        for motor in self.motors() {
            motor.set_gearing(gearset);
        }
    }

    fn set_pos_pid(&self, tuning: MotorPidTuning) {
        for motor in self.motors() {
            motor.set_pos_pid(tuning);
        }
    }

    fn set_vel_pid(&self, tuning: MotorPidTuning) {
        for motor in self.motors() {
            motor.set_vel_pid(tuning);
        }
    }

    fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    fn max_voltage(&self) -> f64 {
        self.max_voltage
    }
}
