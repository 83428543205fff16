use std::process::ExitCode;
use std::sync::Arc;

use barbershop_sim::simulation::{Simulation, SimulationConfig, StdOutObserver};

fn main() -> ExitCode {
    let run = Simulation::new(SimulationConfig::default())
        .map(|sim| sim.with_observer(Arc::new(StdOutObserver)))
        .and_then(|sim| sim.run());

    match run {
        Ok(report) => {
            println!("[shop][done] {}", report.metrics);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[shop][error] {e}");
            ExitCode::FAILURE
        }
    }
}
