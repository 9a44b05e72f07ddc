use chassis_control::model::ChassisModel;
use chassis_control::sim::SimMotor;
use chassis_control::{
    load_config, Angle, ChassisController, ChassisControllerBuilder, Length, Result,
};
use std::time::Instant;

const CONFIG_PATH: &str = "config/controller.toml";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("chassis-demo failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    println!("===========================================");
    println!("Chassis Controller Simulation");
    println!("===========================================\n");

    let config = load_config(CONFIG_PATH)?;
    let left = SimMotor::new(config.gearset);
    let right = SimMotor::new(config.gearset);

    let controller = ChassisControllerBuilder::new()
        .with_config(&config)
        .with_motors(left.clone(), right.clone())
        .build()?;
    let scales = controller.chassis_scales();
    println!(
        "Scales: {:.2} deg/m straight, {:.3} deg/deg turn",
        scales.straight, scales.turn
    );

    let start = Instant::now();
    controller.move_distance(Length::meters(0.5));
    println!("\nMoved 0.5 m in {:?}", start.elapsed());
    print_sensors(controller.model().as_ref());

    let start = Instant::now();
    controller.turn_angle(Angle::degrees(90.0));
    println!("\nTurned 90 deg in {:?}", start.elapsed());
    print_sensors(controller.model().as_ref());

    println!("\nShaft positions: left {:.1} deg, right {:.1} deg", left.position(), right.position());

    let report = controller.loop_report();
    println!("\n=== Control Loop Metrics ===");
    println!("Active ticks: {}", report.ticks);
    println!("Overruns: {}", report.overruns);
    println!("Tick P50: {:?}, P99: {:?}, Max: {:?}", report.tick_p50, report.tick_p99, report.tick_max);
    println!("===========================================");
    Ok(())
}

fn print_sensors(model: &dyn ChassisModel) {
    let [left, right] = model.sensor_vals();
    println!("Sensors: left {} deg, right {} deg", left, right);
}
