use super::{arcade_mix, clamp_unit, normalize_vector, scale, tank_mix, ChassisModel};
use crate::device::{BrakeMode, EncoderUnits, Gearset, Motor, MotorPidTuning, RotarySensor};
use std::sync::Arc;

/// Two-sided differential drive: one motor (or motor group) per side.
pub struct SkidSteerModel {
    left_motor: Arc<dyn Motor>,
    right_motor: Arc<dyn Motor>,
    left_sensor: Arc<dyn RotarySensor>,
    right_sensor: Arc<dyn RotarySensor>,
    max_velocity: f64,
    max_voltage: f64,
}

impl SkidSteerModel {
    /// Build a model that reads each motor's built-in encoder.
    pub fn new(
        left_motor: Arc<dyn Motor>,
        right_motor: Arc<dyn Motor>,
        max_velocity: f64,
        max_voltage: f64,
    ) -> Self {
        let left_sensor = left_motor.encoder();
        let right_sensor = right_motor.encoder();
        Self::with_sensors(
            left_motor,
            right_motor,
            left_sensor,
            right_sensor,
            max_velocity,
            max_voltage,
        )
    }

    pub fn with_sensors(
        left_motor: Arc<dyn Motor>,
        right_motor: Arc<dyn Motor>,
        left_sensor: Arc<dyn RotarySensor>,
        right_sensor: Arc<dyn RotarySensor>,
        max_velocity: f64,
        max_voltage: f64,
    ) -> Self {
        Self {
            left_motor,
            right_motor,
            left_sensor,
            right_sensor,
            max_velocity,
            max_voltage,
        }
    }

    pub fn left_motor(&self) -> Arc<dyn Motor> {
        self.left_motor.clone()
    }

    pub fn right_motor(&self) -> Arc<dyn Motor> {
        self.right_motor.clone()
    }

    fn velocity(&self, left: f64, right: f64) {
        self.left_motor.move_velocity(scale(left, self.max_velocity));
        self.right_motor.move_velocity(scale(right, self.max_velocity));
    }

    fn voltage(&self, left: f64, right: f64) {
        self.left_motor.move_voltage(scale(left, self.max_voltage));
        self.right_motor.move_voltage(scale(right, self.max_voltage));
    }
}

impl ChassisModel for SkidSteerModel {
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
        self.left_motor.move_velocity(0);
        self.right_motor.move_velocity(0);
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
        self.left_motor
            .move_velocity(scale(clamp_unit(speed), self.max_velocity));
    }

    fn right(&self, speed: f64) {
        self.right_motor
            .move_velocity(scale(clamp_unit(speed), self.max_velocity));
    }

    fn sensor_vals(&self) -> [i32; 2] {
        [self.left_sensor.get() as i32, self.right_sensor.get() as i32]
    }

    fn reset_sensors(&self) {
        self.left_sensor.reset();
        self.right_sensor.reset();
    }

    fn set_brake_mode(&self, mode: BrakeMode) {
        self.left_motor.set_brake_mode(mode);
        self.right_motor.set_brake_mode(mode);
    }

    fn set_encoder_units(&self, units: EncoderUnits) {
        self.left_motor.set_encoder_units(units);
        self.right_motor.set_encoder_units(units);
    }

    fn set_gearing(&self, gearset: Gearset) {
        self.left_motor.set_gearing(gearset);
        self.right_motor.set_gearing(gearset);
    }

    fn set_pos_pid(&self, tuning: MotorPidTuning) {
        self.left_motor.set_pos_pid(tuning);
        self.right_motor.set_pos_pid(tuning);
    }

    fn set_vel_pid(&self, tuning: MotorPidTuning) {
        self.left_motor.set_vel_pid(tuning);
        self.right_motor.set_vel_pid(tuning);
    }

    fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    fn max_voltage(&self) -> f64 {
        self.max_voltage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::{MockMotor, MockSensor};

    fn model() -> (SkidSteerModel, Arc<MockMotor>, Arc<MockMotor>) {
        let left = MockMotor::new();
        let right = MockMotor::new();
        let model = SkidSteerModel::new(left.clone(), right.clone(), 100.0, 12000.0);
        (model, left, right)
    }

    #[test]
    fn test_forward_clamps_and_scales() {
        let (model, left, right) = model();
        model.forward(2.0);
        assert_eq!(left.last_velocity(), 100);
        assert_eq!(right.last_velocity(), 100);
    }

    #[test]
    fn test_rotate_runs_sides_opposite() {
        let (model, left, right) = model();
        model.rotate(0.5);
        assert_eq!(left.last_velocity(), 50);
        assert_eq!(right.last_velocity(), -50);
    }

    #[test]
    fn test_drive_vector_voltage_uses_max_voltage() {
        let (model, left, right) = model();
        model.drive_vector_voltage(0.25, 0.25);
        assert_eq!(left.last_voltage(), 6000);
        assert_eq!(right.last_voltage(), 0);
        assert_eq!(left.last_velocity(), 0);
    }

    #[test]
    fn test_single_side_commands() {
        let (model, left, right) = model();
        model.left(-0.3);
        assert_eq!(left.last_velocity(), -30);
        assert_eq!(right.last_velocity(), 0);

        model.right(7.0);
        assert_eq!(right.last_velocity(), 100);
    }

    #[test]
    fn test_defaults_to_motor_encoders() {
        let (model, left, right) = model();
        left.mock_encoder().set(120.7);
        right.mock_encoder().set(-40.2);
        assert_eq!(model.sensor_vals(), [120, -40]);

        model.reset_sensors();
        assert_eq!(model.sensor_vals(), [0, 0]);
    }

    #[test]
    fn test_explicit_sensors_override_encoders() {
        let left = MockMotor::new();
        let right = MockMotor::new();
        let left_sensor = MockSensor::new();
        let right_sensor = MockSensor::new();
        let model = SkidSteerModel::with_sensors(
            left.clone(),
            right.clone(),
            left_sensor.clone(),
            right_sensor.clone(),
            200.0,
            12000.0,
        );

        left.mock_encoder().set(999.0);
        left_sensor.set(10.0);
        right_sensor.set(20.0);
        assert_eq!(model.sensor_vals(), [10, 20]);
    }

    #[test]
    fn test_configuration_applies_to_both_sides() {
        let (model, left, right) = model();
        model.set_brake_mode(BrakeMode::Hold);
        model.set_gearing(Gearset::Blue);
        model.set_encoder_units(EncoderUnits::Counts);
        model.set_vel_pid(MotorPidTuning::new(0.1, 0.2, 0.3, 0.4));

        for motor in [&left, &right] {
            assert_eq!(motor.brake_mode(), BrakeMode::Hold);
            assert_eq!(motor.gearing(), Gearset::Blue);
            assert_eq!(motor.encoder_units(), EncoderUnits::Counts);
            assert_eq!(motor.vel_pid(), Some(MotorPidTuning::new(0.1, 0.2, 0.3, 0.4)));
        }
    }
}
