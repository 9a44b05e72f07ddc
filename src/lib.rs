//! Closed-loop chassis control for skid-steer and X-drive robots.
//!
//! A [`ChassisControllerPid`] drives a [`model::ChassisModel`] with three
//! position PIDs stepped on a background thread, and exposes blocking and
//! non-blocking straight moves and point turns.

pub mod chassis;
pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod metrics;
pub mod model;
pub mod sim;
pub mod units;

pub use chassis::{
    ChassisController, ChassisControllerBuilder, ChassisControllerPid, ChassisScales, ControlMode,
    PidControllers,
};
pub use config::{load_config, ControllerConfig};
pub use error::{ChassisError, Result};
pub use units::{Angle, Length};
