//! Launches one thread per rank over an in-process mesh and runs each rank's
//! role to completion.

use std::thread;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::config::SimConfig;
use super::coordinator::{self, RunOutcome};
use super::worker;
use crate::domain::Grid;
use crate::error::SimError;
use crate::transport::mesh;

/// Run the distributed simulation on a fresh random grid.
pub fn run(config: &SimConfig) -> Result<RunOutcome, SimError> {
    config.validate()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let initial = Grid::random(config.grid_size, &mut rng);
    run_with_grid(config, initial)
}

/// Run the distributed simulation on a caller-supplied initial grid.
pub fn run_with_grid(config: &SimConfig, initial: Grid) -> Result<RunOutcome, SimError> {
    config.validate()?;
    if initial.size() != config.grid_size {
        return Err(SimError::Config(format!(
            "initial grid is {} cells a side, configuration says {}",
            initial.size(),
            config.grid_size
        )));
    }

    let mut endpoints = mesh::build_mesh(config.procs).into_iter();
    let Some(mut coordinator_endpoint) = endpoints.next() else {
        return Err(SimError::Internal("mesh produced no endpoints".into()));
    };

    thread::scope(|scope| {
        let mut handles = Vec::new();
        for mut endpoint in endpoints {
            handles.push(scope.spawn(move || worker::run(&mut endpoint, config)));
        }

        let result = coordinator::run(&mut coordinator_endpoint, config, initial);
        // If the coordinator failed mid-protocol, dropping its endpoint
        // disconnects the channels and unblocks any waiting worker.
        drop(coordinator_endpoint);

        let mut worker_error = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    debug!(error = %err, "worker failed");
                    if worker_error.is_none() {
                        worker_error = Some(err);
                    }
                }
                Err(_) => {
                    if worker_error.is_none() {
                        worker_error = Some(SimError::Internal("worker thread panicked".into()));
                    }
                }
            }
        }

        match (result, worker_error) {
            (Err(err), _) => Err(err),
            (Ok(_), Some(err)) => Err(err),
            (Ok(outcome), None) => Ok(outcome),
        }
    })
}
