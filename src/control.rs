//! Control module - Iterative PID step primitive, settle detection and tick pacing

pub mod mock;
pub mod pid;
pub mod rate;
pub mod settled;

pub use pid::{IterativePosPidController, PidGains};
pub use rate::Rate;
pub use settled::{SettleSettings, SettledUtil};

/// A controller stepped once per loop tick by its owner.
pub trait IterativeController: Send {
    fn set_target(&mut self, target: f64);

    fn target(&self) -> f64;

    /// Feed a new reading, returning the bounded output. A disabled
    /// controller returns zero.
    fn step(&mut self, reading: f64) -> f64;

    /// Output of the most recent step.
    fn output(&self) -> f64;

    /// Error of the most recent step.
    fn error(&self) -> f64;

    /// Whether the loop has reached its target. Disabled controllers count
    /// as settled.
    fn is_settled(&mut self) -> bool;

    /// Clear accumulated state while keeping gains and target.
    fn reset(&mut self);

    fn flip_disable(&mut self, disabled: bool);

    fn is_disabled(&self) -> bool;
}
