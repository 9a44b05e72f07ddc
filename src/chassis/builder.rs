//! Builder - wires motors, gains and geometry into a running controller

use super::{ChassisControllerPid, ChassisScales, PidControllers};
use crate::config::ControllerConfig;
use crate::control::{IterativeController, IterativePosPidController, PidGains, SettleSettings};
use crate::device::{Gearset, GearsetRatioPair, Motor, RotarySensor};
use crate::error::{ChassisError, Result};
use crate::model::{ChassisModel, SkidSteerModel, XDriveModel};
use crate::units::{Angle, Length};
use log::info;
use std::sync::Arc;
use std::time::Duration;

enum MotorLayout {
    SkidSteer {
        left: Arc<dyn Motor>,
        right: Arc<dyn Motor>,
    },
    XDrive([Arc<dyn Motor>; 4]),
}

/// Fluent construction of a [`ChassisControllerPid`].
///
/// Motors and distance/turn gains are required. Everything else has a
/// default: green gearset with ratio 1, unit scales, max velocity from the
/// gearset, 12000 mV, 10 ms loop period and the default settle tolerances.
pub struct ChassisControllerBuilder {
    motors: Option<MotorLayout>,
    sensors: Option<(Arc<dyn RotarySensor>, Arc<dyn RotarySensor>)>,
    distance_gains: Option<PidGains>,
    turn_gains: Option<PidGains>,
    angle_gains: Option<PidGains>,
    gearset: GearsetRatioPair,
    scales: ChassisScales,
    max_velocity: Option<f64>,
    max_voltage: f64,
    loop_period: Duration,
    settle: SettleSettings,
    move_threshold: Length,
    turn_threshold: Angle,
}

impl Default for ChassisControllerBuilder {
    fn default() -> Self {
        Self {
            motors: None,
            sensors: None,
            distance_gains: None,
            turn_gains: None,
            angle_gains: None,
            gearset: Gearset::Green.into(),
            scales: ChassisScales::default(),
            max_velocity: None,
            max_voltage: 12000.0,
            loop_period: Duration::from_millis(10),
            settle: SettleSettings::default(),
            move_threshold: Length::ZERO,
            turn_threshold: Angle::ZERO,
        }
    }
}

impl ChassisControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skid-steer drive with one motor (or motor group) per side.
    pub fn with_motors(mut self, left: Arc<dyn Motor>, right: Arc<dyn Motor>) -> Self {
        self.motors = Some(MotorLayout::SkidSteer { left, right });
        self
    }

    pub fn with_x_drive_motors(
        mut self,
        top_left: Arc<dyn Motor>,
        top_right: Arc<dyn Motor>,
        bottom_right: Arc<dyn Motor>,
        bottom_left: Arc<dyn Motor>,
    ) -> Self {
        self.motors = Some(MotorLayout::XDrive([
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        ]));
        self
    }

    /// Read these sensors instead of the motors' built-in encoders.
    pub fn with_sensors(
        mut self,
        left: Arc<dyn RotarySensor>,
        right: Arc<dyn RotarySensor>,
    ) -> Self {
        self.sensors = Some((left, right));
        self
    }

    /// Angle gains default to the turn gains.
    pub fn with_gains(mut self, distance: PidGains, turn: PidGains) -> Self {
        self.distance_gains = Some(distance);
        self.turn_gains = Some(turn);
        self
    }

    pub fn with_angle_gains(mut self, angle: PidGains) -> Self {
        self.angle_gains = Some(angle);
        self
    }

    pub fn with_gearset(mut self, gearset: impl Into<GearsetRatioPair>) -> Self {
        self.gearset = gearset.into();
        self
    }

    pub fn with_dimensions(mut self, scales: ChassisScales) -> Self {
        self.scales = scales;
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: f64) -> Self {
        self.max_velocity = Some(max_velocity);
        self
    }

    pub fn with_max_voltage(mut self, max_voltage: f64) -> Self {
        self.max_voltage = max_voltage;
        self
    }

    pub fn with_loop_period(mut self, period: Duration) -> Self {
        self.loop_period = period;
        self
    }

    pub fn with_settle(mut self, settle: SettleSettings) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_move_threshold(mut self, threshold: Length) -> Self {
        self.move_threshold = threshold;
        self
    }

    pub fn with_turn_threshold(mut self, threshold: Angle) -> Self {
        self.turn_threshold = threshold;
        self
    }

    /// Apply every tunable from a loaded configuration. Motors and sensors
    /// are left untouched.
    pub fn with_config(self, config: &ControllerConfig) -> Self {
        self.with_gains(config.distance_gains, config.turn_gains)
            .with_angle_gains(config.angle_gains())
            .with_gearset(config.gearset_ratio_pair())
            .with_dimensions(config.scales.to_scales())
            .with_max_voltage(config.max_voltage)
            .with_loop_period(config.loop_period())
            .with_settle(config.settle)
            .with_move_threshold(config.move_threshold())
            .with_turn_threshold(config.turn_threshold())
            .with_max_velocity(config.max_velocity())
    }

    /// Validate, build the model and PID loops, and start the control loop.
    pub fn build(self) -> Result<ChassisControllerPid> {
        let (distance_gains, turn_gains) = match (self.distance_gains, self.turn_gains) {
            (Some(distance), Some(turn)) => (distance, turn),
            _ => return Err(ChassisError::MissingGains),
        };
        let angle_gains = self.angle_gains.unwrap_or(turn_gains);
        let max_velocity = self
            .max_velocity
            .unwrap_or_else(|| self.gearset.internal_gearset.rpm());

        let model = build_model(
            self.motors.ok_or(ChassisError::MissingMotors)?,
            self.sensors,
            max_velocity,
            self.max_voltage,
        );

        let pid = |gains: PidGains| -> Box<dyn IterativeController> {
            Box::new(IterativePosPidController::new(
                gains,
                self.settle,
                self.loop_period,
            ))
        };
        let pids = PidControllers {
            distance: pid(distance_gains),
            turn: pid(turn_gains),
            angle: pid(angle_gains),
        };

        info!(
            "ChassisControllerBuilder: building PID controller ({:?} x {}, {:?} period)",
            self.gearset.internal_gearset, self.gearset.ratio, self.loop_period
        );
        let controller =
            ChassisControllerPid::new(model, pids, self.gearset, self.scales, self.loop_period)?;
        controller.set_move_threshold(self.move_threshold);
        controller.set_turn_threshold(self.turn_threshold);
        controller.start_thread()?;
        Ok(controller)
    }
}

fn build_model(
    motors: MotorLayout,
    sensors: Option<(Arc<dyn RotarySensor>, Arc<dyn RotarySensor>)>,
    max_velocity: f64,
    max_voltage: f64,
) -> Arc<dyn ChassisModel> {
    match (motors, sensors) {
        (MotorLayout::SkidSteer { left, right }, None) => {
            Arc::new(SkidSteerModel::new(left, right, max_velocity, max_voltage))
        }
        (MotorLayout::SkidSteer { left, right }, Some((left_sensor, right_sensor))) => {
            Arc::new(SkidSteerModel::with_sensors(
                left,
                right,
                left_sensor,
                right_sensor,
                max_velocity,
                max_voltage,
            ))
        }
        (MotorLayout::XDrive([tl, tr, br, bl]), None) => {
            Arc::new(XDriveModel::new(tl, tr, br, bl, max_velocity, max_voltage))
        }
        (MotorLayout::XDrive(motors), Some((left_sensor, right_sensor))) => Arc::new(
            XDriveModel::with_sensors(motors, left_sensor, right_sensor, max_velocity, max_voltage),
        ),
    }
}
