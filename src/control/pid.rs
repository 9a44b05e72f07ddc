use super::settled::{SettleSettings, SettledUtil};
use super::IterativeController;
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub kbias: f64,
}

impl PidGains {
    pub fn new(kp: f64, ki: f64, kd: f64, kbias: f64) -> Self {
        Self { kp, ki, kd, kbias }
    }
}

/// Position PID stepped by an external loop.
pub struct IterativePosPidController {
    // Gains
    gains: PidGains,
    sample_time: Duration,

    // State
    target: f64,
    error: f64,
    last_error: f64,
    last_reading: Option<f64>,
    integral: f64,
    output: f64,
    prev_time: Option<Instant>,
    disabled: bool,

    // Limits
    output_max: f64,
    output_min: f64,
    integral_max: f64,
    integral_min: f64,

    settled: SettledUtil,
}

impl IterativePosPidController {
    pub fn new(gains: PidGains, settle: SettleSettings, sample_time: Duration) -> Self {
        Self {
            gains,
            sample_time,
            target: 0.0,
            error: 0.0,
            last_error: 0.0,
            last_reading: None,
            integral: 0.0,
            output: 0.0,
            prev_time: None,
            disabled: false,
            output_max: 1.0,
            output_min: -1.0,
            integral_max: 1.0,
            integral_min: -1.0,
            settled: SettledUtil::new(settle),
        }
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Output bounds. The integral is bounded the same way.
    pub fn set_output_limits(&mut self, max: f64, min: f64) {
        let (max, min) = if max < min { (min, max) } else { (max, min) };
        self.output_max = max;
        self.output_min = min;
        self.integral_max = max;
        self.integral_min = min;
        self.output = self.output.clamp(min, max);
    }

    fn step_at(&mut self, reading: f64, now: Instant) -> f64 {
        if self.disabled {
            self.output = 0.0;
            return self.output;
        }

        let dt = match self.prev_time {
            Some(prev) => now.duration_since(prev).as_secs_f64(),
            None => self.sample_time.as_secs_f64(),
        };

        self.error = self.target - reading;

        // Integral term with anti-windup, dropped on a zero crossing
        if self.error.signum() != self.last_error.signum() {
            self.integral = 0.0;
        }
        self.integral += self.gains.ki * self.error * dt;
        self.integral = self.integral.clamp(self.integral_min, self.integral_max);

        // Derivative on the reading so target jumps do not kick
        let derivative = match self.last_reading {
            Some(last) if dt > 0.0 => (reading - last) / dt,
            _ => 0.0,
        };

        self.output = (self.gains.kp * self.error + self.integral
            - self.gains.kd * derivative
            + self.gains.kbias)
            .clamp(self.output_min, self.output_max);

        self.last_error = self.error;
        self.last_reading = Some(reading);
        self.prev_time = Some(now);

        self.output
    }
}

impl IterativeController for IterativePosPidController {
    fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    fn target(&self) -> f64 {
        self.target
    }

    fn step(&mut self, reading: f64) -> f64 {
        self.step_at(reading, Instant::now())
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn is_settled(&mut self) -> bool {
        if self.disabled {
            return true;
        }
        self.settled.is_settled(self.error)
    }

    fn reset(&mut self) {
        self.error = 0.0;
        self.last_error = 0.0;
        self.last_reading = None;
        self.integral = 0.0;
        self.output = 0.0;
        self.prev_time = None;
        self.settled.reset();
    }

    fn flip_disable(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(10);

    fn controller(gains: PidGains) -> IterativePosPidController {
        IterativePosPidController::new(gains, SettleSettings::default(), TICK)
    }

    #[test]
    fn test_proportional_output_is_bounded() {
        let mut pid = controller(PidGains::new(0.01, 0.0, 0.0, 0.0));
        pid.set_target(50.0);
        assert!((pid.step(0.0) - 0.5).abs() < 1e-12);

        pid.set_target(1000.0);
        assert_eq!(pid.step(0.0), 1.0);
        assert_eq!(pid.error(), 1000.0);
    }

    #[test]
    fn test_disabled_outputs_zero_and_is_settled() {
        let mut pid = controller(PidGains::new(1.0, 0.0, 0.0, 0.0));
        pid.set_target(500.0);
        pid.flip_disable(true);

        assert_eq!(pid.step(0.0), 0.0);
        assert!(pid.is_settled());

        pid.flip_disable(false);
        assert_eq!(pid.step(0.0), 1.0);
        assert!(!pid.is_settled());
    }

    #[test]
    fn test_pid_reduces_error_over_time() {
        let mut pid = controller(PidGains::new(0.002, 0.0, 0.0, 0.0));
        pid.set_target(360.0);

        let start = Instant::now();
        let mut position = 0.0;
        for i in 1..=200 {
            let output = pid.step_at(position, start + TICK * i);
            // 1200 degrees per second at full output
            position += output * 1200.0 * TICK.as_secs_f64();
        }

        assert!((position - 360.0).abs() < 5.0, "position {position}");
    }

    #[test]
    fn test_integral_drops_on_zero_crossing() {
        let mut pid = controller(PidGains::new(0.0, 1.0, 0.0, 0.0));
        pid.set_target(0.1);
        let start = Instant::now();

        pid.step_at(0.0, start);
        pid.step_at(0.0, start + TICK);
        assert!(pid.output() > 0.0);

        pid.step_at(0.2, start + TICK * 2);
        assert!(pid.output() < 0.0);
    }

    #[test]
    fn test_reset_keeps_target() {
        let mut pid = controller(PidGains::new(0.01, 0.0, 0.0, 0.0));
        pid.set_target(12.0);
        pid.step(0.0);
        pid.reset();

        assert_eq!(pid.target(), 12.0);
        assert_eq!(pid.output(), 0.0);
        assert_eq!(pid.error(), 0.0);
    }
}
