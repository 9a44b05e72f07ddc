use std::thread;
use std::time::{Duration, Instant};

/// Paces a loop to a fixed period.
///
/// Deadlines advance from the previous deadline rather than from when the
/// caller woke up, so a loop does not drift by the time spent in its body.
/// If the loop overran, the next deadline restarts from now.
#[derive(Debug)]
pub struct Rate {
    last: Instant,
}

impl Rate {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }

    /// Time left until the next tick boundary, advancing the boundary.
    pub fn until_next(&mut self, period: Duration) -> Duration {
        let now = Instant::now();
        let deadline = self.last + period;
        if deadline > now {
            self.last = deadline;
            deadline - now
        } else {
            self.last = now;
            Duration::ZERO
        }
    }

    /// Sleep until the next tick boundary.
    pub fn delay_until(&mut self, period: Duration) {
        let remaining = self.until_next(period);
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_until_holds_the_period() {
        let period = Duration::from_millis(10);
        let mut rate = Rate::new();
        let start = Instant::now();

        for _ in 0..5 {
            rate.delay_until(period);
        }

        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn test_overrun_returns_zero() {
        let mut rate = Rate::new();
        thread::sleep(Duration::from_millis(5));
        assert_eq!(rate.until_next(Duration::from_millis(1)), Duration::ZERO);
    }
}
