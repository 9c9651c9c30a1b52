//! Coordinator role: rank 0. Distributes the partition and the initial
//! rows, arbitrates termination each iteration, gathers the final grid, and
//! cross-checks the whole run against the serial reference.

use tracing::{debug, error, info};

use super::config::SimConfig;
use super::protocol::{self, Report};
use super::serial::{self, SerialOutcome};
use crate::domain::{Grid, Row, partition};
use crate::error::SimError;
use crate::render;
use crate::transport::Transport;

/// Everything the coordinator observed: the distributed result plus the
/// serial reference run over the same initial grid.
#[derive(Debug)]
pub struct RunOutcome {
    /// First finished report received, if any tile crossed the threshold.
    pub winning: Option<Report>,
    /// Iterations the distributed loop performed.
    pub iterations: u32,
    /// Final grid as gathered from the workers.
    pub final_grid: Grid,
    /// The reference run over the same initial grid.
    pub serial: SerialOutcome,
}

impl RunOutcome {
    /// Both engines agree on whether some tile finished.
    pub fn verdicts_match(&self) -> bool {
        self.winning.is_some() == self.serial.hit.is_some()
    }

    /// Both engines produced the same final grid, cell by cell.
    pub fn grids_match(&self) -> bool {
        self.final_grid == self.serial.grid
    }
}

/// Drive one distributed run over `initial`, then the serial cross-check.
pub fn run(
    transport: &mut dyn Transport,
    config: &SimConfig,
    initial: Grid,
) -> Result<RunOutcome, SimError> {
    let n = config.grid_size;
    let owners = partition::build_owners(n, config.tile_size, config.procs)?;

    // Every worker learns the partition, even ranks that end up idle.
    let partition_frame = protocol::encode_partition(&owners);
    for peer in 1..config.procs {
        transport.send(peer, partition_frame.clone())?;
    }

    // Each row goes to its owner, ascending by id, so owners see their
    // assignments in order.
    for row in initial.rows() {
        transport.send(owners[row.id as usize], protocol::encode_assignment(row))?;
    }

    if config.print {
        render::print_grid(&initial, config.tile_size);
    }

    let active = partition::active_workers(config.tile_rows(), config.procs);
    info!(
        grid = n,
        tile = config.tile_size,
        workers = active,
        "distributed run starting"
    );

    let mut winning: Option<Report> = None;
    let mut iterations = 0;
    while iterations < config.max_iters {
        // One report per active worker per iteration; the first finished
        // report received names the winning tile.
        for peer in 1..=active {
            let frame = transport.recv(peer, protocol::REPORT_LEN)?;
            let report = Report::from_bytes(&frame)?;
            if report.finished && winning.is_none() {
                debug!(
                    peer,
                    tile_col = report.tile_col,
                    tile_row = report.tile_row,
                    "tile crossed the threshold"
                );
                winning = Some(report);
            }
        }
        iterations += 1;

        let stop = winning.is_some();
        let decision = protocol::encode_decision(stop);
        for peer in 1..=active {
            transport.send(peer, decision.clone())?;
        }
        if stop {
            break;
        }
    }

    // Gather the final rows; each worker streams its own ascending by id.
    let mut final_grid = Grid::new(n);
    for peer in 1..=active {
        for id in (0..n).filter(|&id| owners[id] == peer) {
            let frame = transport.recv(peer, Row::frame_len(n))?;
            let row = Row::from_bytes(&frame, n)?;
            if row.id as usize != id {
                return Err(SimError::Internal(format!(
                    "gather from rank {peer}: expected row {id}, got row {}",
                    row.id
                )));
            }
            final_grid.replace_row(row);
        }
    }

    match &winning {
        Some(report) => eprintln!(
            "Tile (c={}, r={}) has {}% {}",
            report.tile_col,
            report.tile_row,
            report.ratio * 100.0,
            report.color.name()
        ),
        None => eprintln!("MPI: Hit maximum iterations"),
    }
    eprintln!("Performed {iterations} iterations.");

    if config.print {
        render::print_grid(&final_grid, config.tile_size);
    }

    // Reference run over the saved initial grid; it emits its own verdict.
    let serial = serial::run(initial, config);
    if let Some(hit) = &serial.hit {
        eprintln!(
            "Tile (c={}, r={}) has {}% {}",
            hit.tile_col,
            hit.tile_row,
            hit.ratio * 100.0,
            hit.color.name()
        );
    }

    let outcome = RunOutcome {
        winning,
        iterations,
        final_grid,
        serial,
    };
    if !outcome.verdicts_match() {
        error!("distributed and serial verdicts disagree");
    } else if !outcome.grids_match() {
        error!("distributed and serial final grids disagree");
    }
    Ok(outcome)
}
