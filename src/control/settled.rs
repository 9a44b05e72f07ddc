use serde::Deserialize;
use std::time::{Duration, Instant};

/// Tolerances a loop must hold continuously before it counts as settled.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SettleSettings {
    /// Maximum absolute error.
    pub error: f64,
    /// Maximum change in error between two consecutive checks.
    pub derivative: f64,
    /// How long both must hold, in milliseconds.
    pub time_ms: u64,
}

impl Default for SettleSettings {
    fn default() -> Self {
        Self {
            error: 50.0,
            derivative: 5.0,
            time_ms: 250,
        }
    }
}

pub struct SettledUtil {
    settings: SettleSettings,
    last_error: f64,
    entered_at: Option<Instant>,
}

impl SettledUtil {
    pub fn new(settings: SettleSettings) -> Self {
        Self {
            settings,
            last_error: 0.0,
            entered_at: None,
        }
    }

    pub fn is_settled(&mut self, error: f64) -> bool {
        self.is_settled_at(error, Instant::now())
    }

    pub(crate) fn is_settled_at(&mut self, error: f64, now: Instant) -> bool {
        let derivative = error - self.last_error;
        self.last_error = error;

        if error.abs() > self.settings.error || derivative.abs() > self.settings.derivative {
            self.entered_at = None;
            return false;
        }

        match self.entered_at {
            Some(entered_at) => {
                now.duration_since(entered_at) >= Duration::from_millis(self.settings.time_ms)
            }
            None => {
                // The first sample in tolerance only starts the timer
                self.entered_at = Some(now);
                false
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_error = 0.0;
        self.entered_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_holding_tolerance_for_duration() {
        let mut util = SettledUtil::new(SettleSettings::default());
        let start = Instant::now();

        assert!(!util.is_settled_at(10.0, start));
        assert!(!util.is_settled_at(9.0, start + Duration::from_millis(100)));
        assert!(!util.is_settled_at(9.0, start + Duration::from_millis(300)));
        assert!(util.is_settled_at(9.0, start + Duration::from_millis(360)));
    }

    #[test]
    fn test_leaving_tolerance_restarts_the_timer() {
        let mut util = SettledUtil::new(SettleSettings::default());
        let start = Instant::now();

        assert!(!util.is_settled_at(0.0, start));
        assert!(!util.is_settled_at(80.0, start + Duration::from_millis(200)));
        assert!(!util.is_settled_at(78.0, start + Duration::from_millis(300)));
        assert!(!util.is_settled_at(0.0, start + Duration::from_millis(400)));
    }

    #[test]
    fn test_fast_moving_error_is_not_settled() {
        let mut util = SettledUtil::new(SettleSettings { time_ms: 0, ..Default::default() });
        let start = Instant::now();

        assert!(!util.is_settled_at(40.0, start));
        assert!(!util.is_settled_at(38.0, start));
        assert!(util.is_settled_at(38.0, start));
    }

    #[test]
    fn test_first_sample_in_tolerance_is_never_settled() {
        let mut util = SettledUtil::new(SettleSettings { time_ms: 0, ..Default::default() });
        let start = Instant::now();

        // A freshly reset loop reads zero error before it has been stepped
        assert!(!util.is_settled_at(0.0, start), "first sample only starts the timer");
        assert!(util.is_settled_at(0.0, start + Duration::from_millis(1)));

        util.reset();
        assert!(!util.is_settled_at(0.0, start + Duration::from_millis(2)));
    }
}
