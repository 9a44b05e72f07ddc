//! Metrics module - Control loop timing

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// LOOP METRICS - Thread-safe tick timing
// ============================================================================

#[derive(Clone)]
pub struct LoopMetrics {
    tick_hist: Arc<Mutex<Option<Histogram<u64>>>>,
    ticks: Arc<AtomicU64>,
    overruns: Arc<AtomicU64>,
    period_ns: u64,
}

impl LoopMetrics {
    pub fn new(period: Duration) -> Self {
        let hist = match Histogram::new(3) {
            Ok(hist) => Some(hist),
            Err(e) => {
                log::warn!("Tick histogram unavailable: {}", e);
                None
            }
        };

        Self {
            tick_hist: Arc::new(Mutex::new(hist)),
            ticks: Arc::new(AtomicU64::new(0)),
            overruns: Arc::new(AtomicU64::new(0)),
            period_ns: period.as_nanos() as u64,
        }
    }

    /// Record how long one tick's control computation took.
    pub fn record_tick(&self, duration: Duration) {
        let nanos = duration.as_nanos() as u64;
        if let Some(hist) = &mut *self.tick_hist.lock() {
            hist.record(nanos).ok();
        }

        self.ticks.fetch_add(1, Ordering::Relaxed);
        if nanos > self.period_ns {
            self.overruns.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn report(&self) -> LoopReport {
        let guard = self.tick_hist.lock();
        let hist: Option<&Histogram<u64>> = Option::as_ref(&*guard);
        let quantile = |q: f64| {
            hist.map(|h| Duration::from_nanos(h.value_at_quantile(q)))
                .unwrap_or_default()
        };

        LoopReport {
            tick_p50: quantile(0.5),
            tick_p99: quantile(0.99),
            tick_max: hist.map(|h| Duration::from_nanos(h.max())).unwrap_or_default(),
            ticks: self.ticks.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// LOOP REPORT - Summary statistics
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct LoopReport {
    pub tick_p50: Duration,
    pub tick_p99: Duration,
    pub tick_max: Duration,
    pub ticks: u64,
    pub overruns: u64,
}
