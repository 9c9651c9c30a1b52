//! Row ownership: whole tile rows are dealt round-robin to worker ranks, so
//! every row of a tile row lives on the same rank and blue movement only
//! crosses rank boundaries at tile-row seams.

use crate::error::SimError;
use crate::transport::Rank;

/// Worker rank owning tile row `group`.
pub const fn group_owner(group: usize, procs: usize) -> Rank {
    1 + group % (procs - 1)
}

/// Assign every grid row to a worker rank, whole tile rows at a time.
/// Rank 0 is the coordinator and owns nothing.
pub fn build_owners(
    grid_size: usize,
    tile_size: usize,
    procs: usize,
) -> Result<Vec<Rank>, SimError> {
    if procs < 2 {
        return Err(SimError::Config(format!(
            "{procs} rank(s) given; need a coordinator and at least one worker"
        )));
    }
    if grid_size == 0 || tile_size == 0 {
        return Err(SimError::Config(
            "grid size and tile size must be positive".into(),
        ));
    }
    if grid_size % tile_size != 0 {
        return Err(SimError::Config(format!(
            "tile size {tile_size} does not divide grid size {grid_size}"
        )));
    }

    Ok((0..grid_size)
        .map(|row| group_owner(row / tile_size, procs))
        .collect())
}

/// Number of workers that actually own rows. When there are fewer tile rows
/// than workers, the higher ranks idle.
pub fn active_workers(tile_rows: usize, procs: usize) -> usize {
    (procs - 1).min(tile_rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_of_a_tile_row_share_an_owner() {
        let owners = build_owners(12, 3, 4).unwrap();
        for (row, &owner) in owners.iter().enumerate() {
            assert_eq!(owner, owners[(row / 3) * 3], "row {row}");
        }
    }

    #[test]
    fn owners_are_workers_only() {
        let owners = build_owners(8, 2, 3).unwrap();
        assert!(owners.iter().all(|&owner| owner >= 1 && owner < 3));
    }

    #[test]
    fn assignment_wraps_when_tile_rows_exceed_workers() {
        // Four tile rows over two workers: 1, 2, 1, 2.
        let owners = build_owners(8, 2, 3).unwrap();
        assert_eq!(owners, vec![1, 1, 2, 2, 1, 1, 2, 2]);
    }

    #[test]
    fn surplus_workers_idle() {
        let owners = build_owners(4, 2, 6).unwrap();
        assert_eq!(owners, vec![1, 1, 2, 2]);
        assert_eq!(active_workers(2, 6), 2);
    }

    #[test]
    fn every_worker_is_active_when_tile_rows_wrap() {
        assert_eq!(active_workers(4, 3), 2);
        assert_eq!(active_workers(2, 3), 2);
    }

    #[test]
    fn too_few_ranks_is_a_config_error() {
        assert!(matches!(
            build_owners(4, 2, 1),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn indivisible_tile_size_is_a_config_error() {
        assert!(matches!(
            build_owners(10, 3, 4),
            Err(SimError::Config(_))
        ));
    }
}
