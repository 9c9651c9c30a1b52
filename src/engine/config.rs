use crate::error::SimError;

/// Run parameters, replicated to every rank.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Grid side length N.
    pub grid_size: usize,
    /// Tile side length in cells; must divide the grid size.
    pub tile_size: usize,
    /// Percentage of one color that finishes a tile, 1..=100.
    pub threshold: u32,
    /// Iteration cap.
    pub max_iters: u32,
    /// Total rank count including the coordinator.
    pub procs: usize,
    /// Seed for the initial grid; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Chattier logging.
    pub verbose: bool,
    /// Pretty-print the initial and final grids.
    pub print: bool,
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.grid_size == 0 {
            return Err(SimError::Config("grid size must be positive".into()));
        }
        if self.tile_size == 0 {
            return Err(SimError::Config("tile size must be positive".into()));
        }
        if self.grid_size % self.tile_size != 0 {
            return Err(SimError::Config(format!(
                "tile size {} does not divide grid size {}",
                self.tile_size, self.grid_size
            )));
        }
        if !(1..=100).contains(&self.threshold) {
            return Err(SimError::Config(format!(
                "threshold {}% is outside 1..=100",
                self.threshold
            )));
        }
        if self.max_iters == 0 {
            return Err(SimError::Config("max iterations must be positive".into()));
        }
        if self.procs < 2 {
            return Err(SimError::Config(format!(
                "{} rank(s) given; need a coordinator and at least one worker",
                self.procs
            )));
        }
        Ok(())
    }

    /// Number of tile rows (and of tiles along each axis).
    pub const fn tile_rows(&self) -> usize {
        self.grid_size / self.tile_size
    }

    pub const fn cells_per_tile(&self) -> usize {
        self.tile_size * self.tile_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimConfig {
        SimConfig {
            grid_size: 8,
            tile_size: 2,
            threshold: 50,
            max_iters: 10,
            procs: 3,
            seed: None,
            verbose: false,
            print: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
        assert_eq!(config().tile_rows(), 4);
        assert_eq!(config().cells_per_tile(), 4);
    }

    #[test]
    fn rejects_indivisible_tile_size() {
        let mut bad = config();
        bad.tile_size = 3;
        assert!(matches!(bad.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut bad = config();
        bad.threshold = 0;
        assert!(matches!(bad.validate(), Err(SimError::Config(_))));
        bad.threshold = 101;
        assert!(matches!(bad.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_zero_iterations() {
        let mut bad = config();
        bad.max_iters = 0;
        assert!(matches!(bad.validate(), Err(SimError::Config(_))));
    }

    #[test]
    fn rejects_single_rank() {
        let mut bad = config();
        bad.procs = 1;
        assert!(matches!(bad.validate(), Err(SimError::Config(_))));
    }
}
