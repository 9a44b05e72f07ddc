//! Sim module - Simulated motors for running a controller without hardware
//!
//! A [`SimMotor`] follows its last command instantly: the shaft turns at the
//! commanded velocity (or the velocity the commanded voltage maps to) and its
//! encoder integrates that over wall-clock time.

use crate::device::{BrakeMode, EncoderUnits, Gearset, Motor, MotorPidTuning, RotarySensor};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;

const NOMINAL_VOLTAGE_MV: f64 = 12000.0;

struct SimState {
    gearset: Gearset,
    units: EncoderUnits,
    velocity_dps: f64,
    position_deg: f64,
    offset_deg: f64,
    last_update: Instant,
    noise: Option<(StdRng, f64)>,
}

impl SimState {
    fn advance(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_update).as_secs_f64();
        self.position_deg += self.velocity_dps * dt;
        self.last_update = now;
    }

    fn free_rpm(&self) -> f64 {
        self.gearset.rpm()
    }

    /// Encoder counts per output revolution for the current cartridge.
    fn counts_per_rev(&self) -> f64 {
        match self.gearset {
            Gearset::Red => 1800.0,
            Gearset::Green => 900.0,
            Gearset::Blue => 300.0,
        }
    }

    fn reading(&mut self) -> f64 {
        self.advance();
        let mut degrees = self.position_deg - self.offset_deg;
        if let Some((rng, amplitude)) = &mut self.noise {
            degrees += rng.gen_range(-*amplitude..=*amplitude);
        }

        match self.units {
            EncoderUnits::Degrees => degrees,
            EncoderUnits::Rotations => degrees / 360.0,
            EncoderUnits::Counts => degrees / 360.0 * self.counts_per_rev(),
        }
    }
}

// ============================================================================
// SIM MOTOR
// ============================================================================

pub struct SimMotor {
    state: Arc<Mutex<SimState>>,
}

impl SimMotor {
    pub fn new(gearset: Gearset) -> Arc<Self> {
        Self::build(gearset, None)
    }

    /// A motor whose encoder readings carry uniform noise of up to
    /// `amplitude_deg`, reproducible from `seed`.
    pub fn with_noise(gearset: Gearset, amplitude_deg: f64, seed: u64) -> Arc<Self> {
        let noise = (amplitude_deg > 0.0).then(|| (StdRng::seed_from_u64(seed), amplitude_deg));
        Self::build(gearset, noise)
    }

    fn build(gearset: Gearset, noise: Option<(StdRng, f64)>) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(SimState {
                gearset,
                units: EncoderUnits::Degrees,
                velocity_dps: 0.0,
                position_deg: 0.0,
                offset_deg: 0.0,
                last_update: Instant::now(),
                noise,
            })),
        })
    }

    /// True shaft position in degrees, ignoring resets and noise.
    pub fn position(&self) -> f64 {
        let mut state = self.state.lock();
        state.advance();
        state.position_deg
    }

    /// Current shaft velocity in rpm.
    pub fn velocity(&self) -> f64 {
        self.state.lock().velocity_dps / 6.0
    }

    pub fn gearing(&self) -> Gearset {
        self.state.lock().gearset
    }

    fn command_rpm(&self, rpm: f64) {
        let mut state = self.state.lock();
        state.advance();
        let free = state.free_rpm();
        state.velocity_dps = rpm.clamp(-free, free) * 6.0;
    }
}

impl Motor for SimMotor {
    fn move_velocity(&self, velocity: i16) {
        self.command_rpm(velocity as f64);
    }

    fn move_voltage(&self, voltage: i16) {
        let free = self.state.lock().free_rpm();
        self.command_rpm(voltage as f64 / NOMINAL_VOLTAGE_MV * free);
    }

    // Commands take effect instantly, so braking and onboard tuning have
    // nothing to act on.
    fn set_brake_mode(&self, _mode: BrakeMode) {}

    fn set_encoder_units(&self, units: EncoderUnits) {
        self.state.lock().units = units;
    }

    fn set_gearing(&self, gearset: Gearset) {
        let mut state = self.state.lock();
        state.advance();
        state.gearset = gearset;
    }

    fn set_pos_pid(&self, _tuning: MotorPidTuning) {}

    fn set_vel_pid(&self, _tuning: MotorPidTuning) {}

    fn encoder(&self) -> Arc<dyn RotarySensor> {
        Arc::new(SimEncoder {
            state: self.state.clone(),
        })
    }
}

// ============================================================================
// SIM ENCODER
// ============================================================================

pub struct SimEncoder {
    state: Arc<Mutex<SimState>>,
}

impl RotarySensor for SimEncoder {
    fn get(&self) -> f64 {
        self.state.lock().reading()
    }

    fn reset(&self) {
        let mut state = self.state.lock();
        state.advance();
        state.offset_deg = state.position_deg;
    }
}
