//! Mock motor and sensor implementations for testing
//!
//! Both record what they were told so tests can assert on the commands a
//! chassis model issued.

use super::{BrakeMode, EncoderUnits, Gearset, Motor, MotorPidTuning, RotarySensor};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI16, AtomicU64, Ordering};
use std::sync::Arc;

/// Mock rotary sensor with a settable position.
#[derive(Debug, Default)]
pub struct MockSensor {
    value: AtomicU64,
}

impl MockSensor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Release);
    }
}

impl RotarySensor for MockSensor {
    fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }

    fn reset(&self) {
        self.set(0.0);
    }
}

#[derive(Debug, Default)]
struct MockMotorConfig {
    brake_mode: BrakeMode,
    encoder_units: EncoderUnits,
    gearing: Gearset,
    pos_pid: Option<MotorPidTuning>,
    vel_pid: Option<MotorPidTuning>,
}

/// Mock motor that remembers its last velocity and voltage commands.
#[derive(Debug)]
pub struct MockMotor {
    last_velocity: AtomicI16,
    last_voltage: AtomicI16,
    config: Mutex<MockMotorConfig>,
    encoder: Arc<MockSensor>,
}

impl MockMotor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            last_velocity: AtomicI16::new(0),
            last_voltage: AtomicI16::new(0),
            config: Mutex::new(MockMotorConfig::default()),
            encoder: MockSensor::new(),
        })
    }

    pub fn last_velocity(&self) -> i16 {
        self.last_velocity.load(Ordering::Acquire)
    }

    pub fn last_voltage(&self) -> i16 {
        self.last_voltage.load(Ordering::Acquire)
    }

    pub fn brake_mode(&self) -> BrakeMode {
        self.config.lock().brake_mode
    }

    pub fn encoder_units(&self) -> EncoderUnits {
        self.config.lock().encoder_units
    }

    pub fn gearing(&self) -> Gearset {
        self.config.lock().gearing
    }

    pub fn pos_pid(&self) -> Option<MotorPidTuning> {
        self.config.lock().pos_pid
    }

    pub fn vel_pid(&self) -> Option<MotorPidTuning> {
        self.config.lock().vel_pid
    }

    /// The built-in encoder, typed so tests can move it.
    pub fn mock_encoder(&self) -> Arc<MockSensor> {
        self.encoder.clone()
    }
}

impl Motor for MockMotor {
    fn move_velocity(&self, velocity: i16) {
        self.last_velocity.store(velocity, Ordering::Release);
    }

    fn move_voltage(&self, voltage: i16) {
        self.last_voltage.store(voltage, Ordering::Release);
    }

    fn set_brake_mode(&self, mode: BrakeMode) {
        self.config.lock().brake_mode = mode;
    }

    fn set_encoder_units(&self, units: EncoderUnits) {
        self.config.lock().encoder_units = units;
    }

    fn set_gearing(&self, gearset: Gearset) {
        self.config.lock().gearing = gearset;
    }

    fn set_pos_pid(&self, tuning: MotorPidTuning) {
        self.config.lock().pos_pid = Some(tuning);
    }

    fn set_vel_pid(&self, tuning: MotorPidTuning) {
        self.config.lock().vel_pid = Some(tuning);
    }

    fn encoder(&self) -> Arc<dyn RotarySensor> {
        self.encoder.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_motor_records_commands() {
        let motor = MockMotor::new();
        motor.move_velocity(150);
        motor.move_voltage(-6000);

        assert_eq!(motor.last_velocity(), 150);
        assert_eq!(motor.last_voltage(), -6000);
    }

    #[test]
    fn test_mock_encoder_is_shared() {
        let motor = MockMotor::new();
        motor.mock_encoder().set(42.0);
        assert_eq!(motor.encoder().get(), 42.0);

        motor.encoder().reset();
        assert_eq!(motor.mock_encoder().get(), 0.0);
    }
}
