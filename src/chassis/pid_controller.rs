//! PID chassis controller - three iterative PIDs on a background loop thread
//!
//! Straight moves run the distance PID on the average encoder travel and the
//! angle PID on the left/right difference to hold a straight line. Turns run
//! the turn PID on the left/right difference. A dedicated thread steps the
//! active loops every period; clients only write targets and flags.

use super::{AtomicMode, ChassisController, ChassisScales, ControlMode};
use crate::control::{IterativeController, Rate};
use crate::device::{EncoderUnits, GearsetRatioPair};
use crate::error::{ChassisError, Result};
use crate::metrics::{LoopMetrics, LoopReport};
use crate::model::ChassisModel;
use crate::units::{Angle, Length};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// The three PID step primitives a [`ChassisControllerPid`] owns.
pub struct PidControllers {
    pub distance: Box<dyn IterativeController>,
    pub turn: Box<dyn IterativeController>,
    pub angle: Box<dyn IterativeController>,
}

impl PidControllers {
    fn settled_for(&mut self, mode: ControlMode) -> bool {
        match mode {
            ControlMode::Distance => self.distance.is_settled() && self.angle.is_settled(),
            ControlMode::Angle => self.turn.is_settled(),
            ControlMode::None => true,
        }
    }

    fn disable_all(&mut self) {
        self.distance.flip_disable(true);
        self.angle.flip_disable(true);
        self.turn.flip_disable(true);
    }
}

// ============================================================================
// LOOP STATE - Shared between clients and the loop thread
// ============================================================================

// `mode`, `done_looping` and `new_movement` are only written while `pids` is
// locked. Anyone holding the lock sees a mode that matches the PID targets
// and enabled flags.
struct LoopState {
    model: Arc<dyn ChassisModel>,
    pids: Mutex<PidControllers>,
    mode: AtomicMode,
    done_looping: AtomicBool,
    new_movement: AtomicBool,
}

impl LoopState {
    /// One control tick. Returns false when idle.
    fn tick(&self, baseline: &mut [i32; 2], past_mode: &mut ControlMode) -> bool {
        if self.done_looping.load(Ordering::Acquire) {
            return false;
        }

        let mut pids = self.pids.lock();
        let mode = self.mode.load();
        let new_movement = self.new_movement.swap(false, Ordering::AcqRel);
        if mode != *past_mode || new_movement {
            *baseline = self.model.sensor_vals();
        }

        match mode {
            ControlMode::Distance => {
                let (left, right) = self.travel_since(baseline);
                let distance_elapsed = (left + right) / 2.0;
                let angle_change = left - right;
                let forward = pids.distance.step(distance_elapsed);
                let yaw = pids.angle.step(angle_change);
                self.model.drive_vector(forward, yaw);
            }
            ControlMode::Angle => {
                let (left, right) = self.travel_since(baseline);
                let speed = pids.turn.step(left - right);
                self.model.rotate(speed);
            }
            ControlMode::None => {}
        }

        *past_mode = mode;
        true
    }

    fn travel_since(&self, baseline: &[i32; 2]) -> (f64, f64) {
        let [left, right] = self.model.sensor_vals();
        (
            left.wrapping_sub(baseline[0]) as f64,
            right.wrapping_sub(baseline[1]) as f64,
        )
    }

    /// Disable every loop, stop the model and go idle. Caller holds `pids`.
    fn finish(&self, pids: &mut PidControllers) {
        pids.disable_all();
        self.model.stop();
        self.mode.store(ControlMode::None);
        self.done_looping.store(true, Ordering::Release);
    }
}

fn run_loop(
    state: Arc<LoopState>,
    period: Duration,
    shutdown: Receiver<()>,
    metrics: LoopMetrics,
) {
    info!("ChassisControllerPid: control loop started ({:?} period)", period);

    let mut baseline = state.model.sensor_vals();
    let mut past_mode = ControlMode::None;
    let mut rate = Rate::new();

    loop {
        let tick_start = Instant::now();
        if state.tick(&mut baseline, &mut past_mode) {
            metrics.record_tick(tick_start.elapsed());
        }

        match shutdown.recv_timeout(rate.until_next(period)) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    info!("ChassisControllerPid: control loop stopped");
}

struct LoopWorker {
    handle: thread::JoinHandle<()>,
    shutdown_tx: Sender<()>,
}

#[derive(Debug, Clone, Copy, Default)]
struct MotionThresholds {
    distance: Length,
    angle: Angle,
}

// ============================================================================
// CHASSIS CONTROLLER PID
// ============================================================================

pub struct ChassisControllerPid {
    state: Arc<LoopState>,
    scales: ChassisScales,
    gearset: GearsetRatioPair,
    period: Duration,
    normal_turns: AtomicBool,
    thresholds: Mutex<MotionThresholds>,
    metrics: LoopMetrics,
    worker: Mutex<Option<LoopWorker>>,
}

impl ChassisControllerPid {
    /// Create a controller around `model`. The loop thread is not started
    /// until [`ChassisControllerPid::start_thread`].
    ///
    /// # Errors
    ///
    /// Fails with [`ChassisError::ZeroGearRatio`] if `gearset.ratio` is zero,
    /// [`ChassisError::Config`] if the ratio is not finite or a scale is not
    /// a positive finite number, and [`ChassisError::ZeroLoopPeriod`] if
    /// `period` is zero.
    pub fn new(
        model: Arc<dyn ChassisModel>,
        pids: PidControllers,
        gearset: GearsetRatioPair,
        scales: ChassisScales,
        period: Duration,
    ) -> Result<Self> {
        if gearset.ratio == 0.0 {
            error!(
                "ChassisControllerPid: The gear ratio cannot be zero! Check if you are using integer division."
            );
            return Err(ChassisError::ZeroGearRatio);
        }
        if !gearset.ratio.is_finite() {
            error!("ChassisControllerPid: The gear ratio must be finite, got {}", gearset.ratio);
            return Err(ChassisError::Config(format!(
                "gear ratio must be finite, got {}",
                gearset.ratio
            )));
        }
        if !scales.is_valid() {
            error!("ChassisControllerPid: Invalid chassis scales {:?}", scales);
            return Err(ChassisError::Config(format!(
                "chassis scales must be positive and finite, got {:?}",
                scales
            )));
        }
        if period.is_zero() {
            error!("ChassisControllerPid: The loop period cannot be zero!");
            return Err(ChassisError::ZeroLoopPeriod);
        }

        model.set_gearing(gearset.internal_gearset);
        model.set_encoder_units(EncoderUnits::Degrees);

        Ok(Self {
            state: Arc::new(LoopState {
                model,
                pids: Mutex::new(pids),
                mode: AtomicMode::new(ControlMode::None),
                done_looping: AtomicBool::new(true),
                new_movement: AtomicBool::new(false),
            }),
            scales,
            gearset,
            period,
            normal_turns: AtomicBool::new(true),
            thresholds: Mutex::new(MotionThresholds::default()),
            metrics: LoopMetrics::new(period),
            worker: Mutex::new(None),
        })
    }

    /// Start the background loop. Calling this again is a no-op.
    pub fn start_thread(&self) -> Result<()> {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = bounded(1);
        let state = self.state.clone();
        let period = self.period;
        let metrics = self.metrics.clone();
        let handle = thread::Builder::new()
            .name("chassis-pid".to_string())
            .spawn(move || run_loop(state, period, shutdown_rx, metrics))?;

        *worker = Some(LoopWorker { handle, shutdown_tx });
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    pub fn mode(&self) -> ControlMode {
        self.state.mode.load()
    }

    /// Period shared by the control loop and the settle poll.
    pub fn loop_period(&self) -> Duration {
        self.period
    }

    pub fn loop_report(&self) -> LoopReport {
        self.metrics.report()
    }

    /// Straight moves shorter than `threshold` are ignored.
    pub fn set_move_threshold(&self, threshold: Length) {
        self.thresholds.lock().distance = threshold.abs();
    }

    /// Turns smaller than `threshold` are ignored.
    pub fn set_turn_threshold(&self, threshold: Angle) {
        self.thresholds.lock().angle = threshold.abs();
    }

    fn turn_sign(&self) -> f64 {
        if self.normal_turns.load(Ordering::Acquire) {
            1.0
        } else {
            -1.0
        }
    }

    /// Poll until `mode` settles and finish the motion. Returns false if the
    /// mode changed first, so the caller re-evaluates against the new one.
    fn wait_for_settled(&self, mode: ControlMode, rate: &mut Rate) -> bool {
        info!("ChassisControllerPid: Waiting to settle in {} mode", mode);

        loop {
            {
                let mut pids = self.state.pids.lock();
                let current = self.state.mode.load();
                if current != mode {
                    warn!(
                        "ChassisControllerPid: Mode changed to {} while waiting in {}!",
                        current, mode
                    );
                    return false;
                }

                if pids.settled_for(mode) {
                    self.state.finish(&mut pids);
                    return true;
                }
            }

            rate.delay_until(self.period);
        }
    }
}

impl ChassisController for ChassisControllerPid {
    fn move_distance_async(&self, target: Length) {
        if target.abs() < self.thresholds.lock().distance {
            info!(
                "ChassisControllerPid: ignoring move of {} meters below the move threshold",
                target.as_meters()
            );
            return;
        }

        info!("ChassisControllerPid: moving {} meters", target.as_meters());
        let new_target = target.as_meters() * self.scales.straight * self.gearset.ratio;
        info!("ChassisControllerPid: moving {} motor degrees", new_target);

        let mut pids = self.state.pids.lock();
        pids.distance.reset();
        pids.angle.reset();
        pids.distance.flip_disable(false);
        pids.angle.flip_disable(false);
        pids.turn.flip_disable(true);
        pids.distance.set_target(new_target);
        pids.angle.set_target(0.0);

        self.state.mode.store(ControlMode::Distance);
        self.state.done_looping.store(false, Ordering::Release);
        self.state.new_movement.store(true, Ordering::Release);
    }

    fn move_raw_async(&self, ticks: f64) {
        // Dividing by the straight scale turns the result back into motor degrees
        self.move_distance_async(Length::meters(ticks / self.scales.straight));
    }

    fn turn_angle_async(&self, target: Angle) {
        if target.abs() < self.thresholds.lock().angle {
            info!(
                "ChassisControllerPid: ignoring turn of {} degrees below the turn threshold",
                target.as_degrees()
            );
            return;
        }

        info!("ChassisControllerPid: turning {} degrees", target.as_degrees());
        let new_target =
            target.as_degrees() * self.scales.turn * self.gearset.ratio * self.turn_sign();
        info!("ChassisControllerPid: turning {} motor degrees", new_target);

        let mut pids = self.state.pids.lock();
        pids.turn.reset();
        pids.turn.flip_disable(false);
        pids.distance.flip_disable(true);
        pids.angle.flip_disable(true);
        pids.turn.set_target(new_target);

        self.state.mode.store(ControlMode::Angle);
        self.state.done_looping.store(false, Ordering::Release);
        self.state.new_movement.store(true, Ordering::Release);
    }

    fn turn_raw_async(&self, ticks: f64) {
        self.turn_angle_async(Angle::degrees(ticks / self.scales.turn));
    }

    fn set_turns_mirrored(&self, mirrored: bool) {
        self.normal_turns.store(!mirrored, Ordering::Release);
    }

    fn wait_until_settled(&self) {
        info!("ChassisControllerPid: Waiting to settle");
        let mut rate = Rate::new();

        loop {
            let settled = match self.state.mode.load() {
                ControlMode::Distance => self.wait_for_settled(ControlMode::Distance, &mut rate),
                ControlMode::Angle => self.wait_for_settled(ControlMode::Angle, &mut rate),
                ControlMode::None => {
                    let mut pids = self.state.pids.lock();
                    if self.state.mode.load() == ControlMode::None {
                        self.state.finish(&mut pids);
                        true
                    } else {
                        false
                    }
                }
            };

            if settled {
                break;
            }
        }

        info!("ChassisControllerPid: Done waiting to settle");
    }

    fn stop(&self) {
        debug!("ChassisControllerPid: stopping");
        let mut pids = self.state.pids.lock();
        pids.disable_all();
        self.state.model.stop();
    }

    fn chassis_scales(&self) -> ChassisScales {
        self.scales
    }

    fn gearset_ratio_pair(&self) -> GearsetRatioPair {
        self.gearset
    }

    fn model(&self) -> Arc<dyn ChassisModel> {
        self.state.model.clone()
    }
}

impl Drop for ChassisControllerPid {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            let _ = worker.shutdown_tx.send(());
            if worker.handle.join().is_err() {
                error!("ChassisControllerPid: control loop thread panicked");
            }
        }
    }
}
