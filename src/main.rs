use std::time::Instant;

use truck_sim::{Command, Diagnostics, RigSnapshot, Simulation, SimulationConfig};

const DT: f64 = 1.0 / 60.0;

fn print_status(time: f64, snapshot: &RigSnapshot) {
    let cab = &snapshot.cab;
    print!(
        "[{:6.2}s] {} {:<16} pos=({:4.0}, {:4.0}) heading={:3.0} speed={:6.1}{}",
        time,
        if snapshot.autonomous { "AUTONOMOUS" } else { "MANUAL    " },
        snapshot.state,
        cab.x,
        cab.y,
        cab.heading,
        cab.speed,
        if snapshot.colliding { " COLLISION" } else { "" },
    );
    match snapshot.diagnostics {
        Diagnostics::Lane {
            lane,
            lateral_error,
            heading_error,
            in_lane,
            ..
        } => println!(
            " lane={} lateral={:5.1} heading_err={:5.1} in_lane={}",
            lane + 1,
            lateral_error,
            heading_error,
            in_lane
        ),
        Diagnostics::Parking {
            position_error,
            angle_error,
            parked,
            ..
        } => println!(
            " dist={:5.1} angle_err={:5.1} parked={}",
            position_error, angle_error, parked
        ),
    }
}

fn lane_keeping(config: SimulationConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== LANE KEEPING SYSTEM ===");
    let mut sim = Simulation::lane_keeping_demo(config)?;
    let player = sim.player().ok_or("no player")?;
    sim.apply_command(Command::ToggleAutonomy);

    for frame in 0..1800 {
        if frame == 900 {
            sim.apply_command(Command::SelectLane(2));
        }
        sim.step(DT);
        if frame % 120 == 0 {
            print_status(sim.time(), &sim.snapshot(player));
        }
    }

    let metrics = sim.metrics();
    println!(
        "Distance: {:.0}  Time in lane: {:.1}s ({:.0}%)  Lane departures: {}",
        metrics.distance,
        metrics.time_in_lane,
        metrics.in_lane_percentage(),
        metrics.departures
    );
    Ok(())
}

fn parking(config: SimulationConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== PARKING ===");
    let mut sim = Simulation::parking_demo(config)?;
    let player = sim.player().ok_or("no player")?;

    for frame in 0..3600 {
        sim.step(DT);
        let snapshot = sim.snapshot(player);
        if frame % 60 == 0 || snapshot.state == "PARKED" {
            print_status(sim.time(), &snapshot);
        }
        if snapshot.state == "PARKED" {
            break;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let seed = std::env::args()
        .nth(1)
        .map(|arg| arg.parse::<u64>())
        .transpose()?
        .unwrap_or(0);
    let config = SimulationConfig {
        seed,
        ..Default::default()
    };

    let start = Instant::now();
    lane_keeping(config)?;
    parking(config)?;
    println!("Simulated in {:?}", start.elapsed());
    Ok(())
}
