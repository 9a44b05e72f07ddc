//! Closed-loop tests: real PID loops driving simulated motors

use chassis_control::control::{PidGains, SettleSettings};
use chassis_control::device::Gearset;
use chassis_control::model::ChassisModel;
use chassis_control::sim::SimMotor;
use chassis_control::{
    Angle, ChassisController, ChassisControllerBuilder, ChassisControllerPid, ChassisScales,
    ControlMode, Length,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn build(left: Arc<SimMotor>, right: Arc<SimMotor>) -> Arc<ChassisControllerPid> {
    let controller = ChassisControllerBuilder::new()
        .with_motors(left, right)
        .with_gains(
            PidGains::new(0.005, 0.0, 0.0, 0.0),
            PidGains::new(0.01, 0.0, 0.0, 0.0),
        )
        .with_angle_gains(PidGains::new(0.002, 0.0, 0.0, 0.0))
        .with_gearset(Gearset::Green)
        .with_dimensions(ChassisScales::new(360.0, 1.0))
        .with_loop_period(Duration::from_millis(5))
        .with_settle(SettleSettings {
            error: 10.0,
            derivative: 5.0,
            time_ms: 100,
        })
        .build()
        .expect("valid controller");
    Arc::new(controller)
}

/// Run a blocking motion on another thread, failing the test if it hangs.
fn settle_within(controller: &Arc<ChassisControllerPid>, motion: fn(&ChassisControllerPid)) {
    let worker = controller.clone();
    let handle = thread::spawn(move || motion(&worker));

    let deadline = Instant::now() + Duration::from_secs(5);
    while !handle.is_finished() {
        assert!(Instant::now() < deadline, "motion did not settle in time");
        thread::sleep(Duration::from_millis(10));
    }
    handle.join().expect("motion panicked");
}

#[test]
fn test_move_distance_reaches_target() {
    let left = SimMotor::new(Gearset::Green);
    let right = SimMotor::new(Gearset::Green);
    let controller = build(left.clone(), right.clone());

    settle_within(&controller, |c| c.move_distance(Length::meters(1.0)));

    let [l, r] = controller.model().sensor_vals();
    assert!((l - 360).abs() <= 12, "left ended at {}", l);
    assert!((r - 360).abs() <= 12, "right ended at {}", r);
    assert_eq!(controller.mode(), ControlMode::None);
    assert_eq!(left.velocity(), 0.0);
    assert_eq!(right.velocity(), 0.0);
}

#[test]
fn test_turn_angle_reaches_target() {
    let left = SimMotor::new(Gearset::Green);
    let right = SimMotor::new(Gearset::Green);
    let controller = build(left.clone(), right.clone());

    settle_within(&controller, |c| c.turn_angle(Angle::degrees(90.0)));

    let [l, r] = controller.model().sensor_vals();
    assert!((l - r - 90).abs() <= 12, "turned {} degrees", l - r);
    assert!(l > 0 && r < 0, "expected a clockwise point turn, got ({}, {})", l, r);
}

#[test]
fn test_consecutive_motions_measure_from_their_own_start() {
    let left = SimMotor::new(Gearset::Green);
    let right = SimMotor::new(Gearset::Green);
    let controller = build(left.clone(), right.clone());

    settle_within(&controller, |c| c.move_distance(Length::meters(0.5)));
    settle_within(&controller, |c| c.move_distance(Length::meters(0.5)));

    let [l, r] = controller.model().sensor_vals();
    assert!((l - 360).abs() <= 24, "left ended at {}", l);
    assert!((r - 360).abs() <= 24, "right ended at {}", r);
}

#[test]
fn test_noisy_encoders_still_settle() {
    let left = SimMotor::with_noise(Gearset::Green, 1.0, 42);
    let right = SimMotor::with_noise(Gearset::Green, 1.0, 43);
    let controller = build(left.clone(), right.clone());

    settle_within(&controller, |c| c.move_distance(Length::meters(1.0)));

    let travelled = (left.position() + right.position()) / 2.0;
    assert!((travelled - 360.0).abs() <= 15.0, "travelled {}", travelled);
}

#[test]
fn test_controller_sets_motor_gearing() {
    let left = SimMotor::new(Gearset::Red);
    let right = SimMotor::new(Gearset::Blue);
    let _controller = build(left.clone(), right.clone());

    assert_eq!(left.gearing(), Gearset::Green);
    assert_eq!(right.gearing(), Gearset::Green);
}
