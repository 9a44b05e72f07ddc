//! Config module - TOML controller configuration
//!
//! Every field has a default, so a partial file (or no file at all) still
//! yields a usable configuration.

use crate::chassis::ChassisScales;
use crate::control::{PidGains, SettleSettings};
use crate::device::{Gearset, GearsetRatioPair};
use crate::error::{ChassisError, Result};
use crate::units::{Angle, Length};
use log::info;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// CONTROLLER CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Period of the control loop and the settle poll.
    pub loop_period_ms: u64,
    pub gearset: Gearset,
    /// External gear ratio between the motor output and the wheels.
    pub gear_ratio: f64,
    /// Overrides the gearset's rpm when set.
    pub max_velocity: Option<f64>,
    /// Millivolts.
    pub max_voltage: f64,
    pub scales: ScalesConfig,
    pub distance_gains: PidGains,
    pub turn_gains: PidGains,
    /// Falls back to the turn gains.
    pub angle_gains: Option<PidGains>,
    pub settle: SettleSettings,
    pub move_threshold_m: f64,
    pub turn_threshold_deg: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            loop_period_ms: 10,
            gearset: Gearset::Green,
            gear_ratio: 1.0,
            max_velocity: None,
            max_voltage: 12000.0,
            scales: ScalesConfig::default(),
            distance_gains: PidGains::new(0.001, 0.0, 0.0001, 0.0),
            turn_gains: PidGains::new(0.003, 0.0, 0.0001, 0.0),
            angle_gains: None,
            settle: SettleSettings::default(),
            move_threshold_m: 0.0,
            turn_threshold_deg: 0.0,
        }
    }
}

impl ControllerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: ControllerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.loop_period_ms == 0 {
            return Err(ChassisError::ZeroLoopPeriod);
        }
        if self.gear_ratio == 0.0 {
            return Err(ChassisError::ZeroGearRatio);
        }
        if !self.gear_ratio.is_finite() {
            return Err(ChassisError::Config(format!(
                "gear_ratio must be finite, got {}",
                self.gear_ratio
            )));
        }
        if self.max_voltage <= 0.0 {
            return Err(ChassisError::Config(format!(
                "max_voltage must be positive, got {}",
                self.max_voltage
            )));
        }
        if let Some(max_velocity) = self.max_velocity {
            if max_velocity <= 0.0 {
                return Err(ChassisError::Config(format!(
                    "max_velocity must be positive, got {}",
                    max_velocity
                )));
            }
        }
        self.scales.validate()
    }

    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn gearset_ratio_pair(&self) -> GearsetRatioPair {
        GearsetRatioPair::new(self.gearset, self.gear_ratio)
    }

    pub fn max_velocity(&self) -> f64 {
        self.max_velocity.unwrap_or_else(|| self.gearset.rpm())
    }

    pub fn angle_gains(&self) -> PidGains {
        self.angle_gains.unwrap_or(self.turn_gains)
    }

    pub fn move_threshold(&self) -> Length {
        Length::meters(self.move_threshold_m)
    }

    pub fn turn_threshold(&self) -> Angle {
        Angle::degrees(self.turn_threshold_deg)
    }
}

// ============================================================================
// SCALES
// ============================================================================

/// Either raw scales or the wheel geometry they are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalesConfig {
    Raw { straight: f64, turn: f64 },
    /// Meters.
    Dimensions { wheel_diameter: f64, wheelbase: f64 },
}

impl Default for ScalesConfig {
    fn default() -> Self {
        ScalesConfig::Raw {
            straight: 1.0,
            turn: 1.0,
        }
    }
}

impl ScalesConfig {
    fn validate(&self) -> Result<()> {
        let scales = self.to_scales();
        if scales.is_valid() {
            Ok(())
        } else {
            Err(ChassisError::Config(format!(
                "chassis scales must be positive and finite, got {:?}",
                scales
            )))
        }
    }

    pub fn to_scales(&self) -> ChassisScales {
        match *self {
            ScalesConfig::Raw { straight, turn } => ChassisScales::new(straight, turn),
            ScalesConfig::Dimensions {
                wheel_diameter,
                wheelbase,
            } => ChassisScales::from_dimensions(
                Length::meters(wheel_diameter),
                Length::meters(wheelbase),
            ),
        }
    }
}

// ============================================================================
// CONFIG FILE LOADING
// ============================================================================

/// Load a configuration file. A missing file gives the defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ControllerConfig> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(s) => ControllerConfig::from_toml_str(&s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No config at {}, using defaults", path.display());
            Ok(ControllerConfig::default())
        }
        Err(e) => Err(ChassisError::Config(format!(
            "failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ControllerConfig::from_toml_str(
            r#"
            loop_period_ms = 5
            gearset = "red"

            [distance_gains]
            kp = 0.002
            "#,
        )
        .expect("valid config");

        assert_eq!(config.loop_period(), Duration::from_millis(5));
        assert_eq!(config.gearset, Gearset::Red);
        assert_eq!(config.max_velocity(), 100.0);
        assert_eq!(config.distance_gains.kp, 0.002);
        assert_eq!(config.distance_gains.kd, 0.0);
        assert_eq!(config.settle, SettleSettings::default());
        assert_eq!(config.angle_gains(), config.turn_gains);
    }

    #[test]
    fn test_scales_from_dimensions() {
        let config = ControllerConfig::from_toml_str(
            r#"
            [scales]
            wheel_diameter = 0.1016
            wheelbase = 0.2921
            "#,
        )
        .expect("valid config");

        let scales = config.scales.to_scales();
        let expected = ChassisScales::from_dimensions(Length::meters(0.1016), Length::meters(0.2921));
        assert_eq!(scales, expected);
    }

    #[test]
    fn test_zero_ratio_rejected() {
        let result = ControllerConfig::from_toml_str("gear_ratio = 0.0");
        assert!(matches!(result, Err(ChassisError::ZeroGearRatio)));
    }

    #[test]
    fn test_non_positive_scales_rejected() {
        for toml in [
            "[scales]\nstraight = 0.0\nturn = 1.0",
            "[scales]\nstraight = 1.0\nturn = -2.0",
            "[scales]\nwheel_diameter = 0.1\nwheelbase = 0.0",
        ] {
            let result = ControllerConfig::from_toml_str(toml);
            assert!(matches!(result, Err(ChassisError::Config(_))), "accepted {:?}", toml);
        }
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        let result = ControllerConfig::from_toml_str("loop_period_ms = \"fast\"");
        assert!(matches!(result, Err(ChassisError::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config("does/not/exist.toml").expect("defaults");
        assert_eq!(config, ControllerConfig::default());
    }
}
