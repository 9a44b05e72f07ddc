//! Error module - Configuration and lifecycle failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChassisError {
    #[error("the gear ratio cannot be zero, check if you are using integer division")]
    ZeroGearRatio,

    #[error("the control loop period cannot be zero")]
    ZeroLoopPeriod,

    #[error("no motors given")]
    MissingMotors,

    #[error("no PID gains given")]
    MissingGains,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to spawn the control loop thread: {0}")]
    Spawn(#[from] std::io::Error),
}

impl From<toml::de::Error> for ChassisError {
    fn from(e: toml::de::Error) -> Self {
        ChassisError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChassisError>;
