//! Single-threaded reference simulation. The distributed engine must agree
//! with it cell for cell on the same initial grid and parameters.

use super::config::SimConfig;
use crate::domain::{Grid, TileHit, check_tiles};

/// Result of running the reference simulation to completion.
#[derive(Debug)]
pub struct SerialOutcome {
    pub grid: Grid,
    pub iterations: u32,
    pub hit: Option<TileHit>,
}

/// Iterate red step, blue step, tile check, at most `max_iters` times,
/// stopping early on the first tile hit. The check only ever runs on a
/// completed iteration, so a grid that starts above the threshold is still
/// stepped once before it can finish.
pub fn run(mut grid: Grid, config: &SimConfig) -> SerialOutcome {
    let mut iterations = 0;
    let mut hit = None;

    while iterations < config.max_iters && hit.is_none() {
        grid.step_red();
        grid.step_blue();
        iterations += 1;
        hit = check_tiles(grid.rows(), config.tile_size, config.threshold);
    }

    SerialOutcome {
        grid,
        iterations,
        hit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Cell;

    fn config(grid_size: usize, tile_size: usize, threshold: u32, max_iters: u32) -> SimConfig {
        SimConfig {
            grid_size,
            tile_size,
            threshold,
            max_iters,
            procs: 2,
            seed: None,
            verbose: false,
            print: false,
        }
    }

    #[test]
    fn lone_red_finishes_its_tile_at_one_quarter() {
        let mut grid = Grid::new(4);
        grid.set(0, 0, Cell::Red);

        let outcome = run(grid, &config(4, 2, 25, 10));
        assert_eq!(outcome.iterations, 1);
        let hit = outcome.hit.unwrap();
        assert_eq!((hit.tile_col, hit.tile_row), (0, 0));
        assert_eq!(hit.color, Cell::Red);
        assert_eq!(hit.ratio, 0.25);
    }

    #[test]
    fn threshold_is_never_checked_on_the_initial_grid() {
        // Fully blue 2x2: nothing can move, but the run still performs one
        // iteration before declaring the tile finished.
        let mut grid = Grid::new(2);
        for r in 0..2 {
            for c in 0..2 {
                grid.set(r, c, Cell::Blue);
            }
        }

        let outcome = run(grid, &config(2, 2, 50, 5));
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.hit.is_some());
    }

    #[test]
    fn capped_run_reports_no_hit() {
        let mut grid = Grid::new(4);
        grid.set(0, 0, Cell::Blue);

        let outcome = run(grid, &config(4, 2, 50, 20));
        assert_eq!(outcome.iterations, 20);
        assert!(outcome.hit.is_none());
        // One blue walking a 4-cycle down column 0 is back home after 20.
        assert_eq!(outcome.grid.get(0, 0), Cell::Blue);
    }
}
