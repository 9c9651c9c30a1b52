use super::{Cell, Row};
use rand::Rng;

/// Square toroidal grid of colored cells. Row `i` always carries id `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    rows: Vec<Row>,
}

impl Grid {
    /// Create an all-white grid.
    pub fn new(size: usize) -> Self {
        let rows = (0..size)
            .map(|r| Row::from_cells(r as u32, vec![Cell::White; size]))
            .collect();
        Self { size, rows }
    }

    /// Create a grid with every cell drawn uniformly from the three colors.
    pub fn random<R: Rng>(size: usize, rng: &mut R) -> Self {
        let rows = (0..size)
            .map(|r| {
                let cells = (0..size)
                    .map(|_| match rng.random_range(0..3u32) {
                        0 => Cell::Blue,
                        1 => Cell::Red,
                        _ => Cell::White,
                    })
                    .collect();
                Row::from_cells(r as u32, cells)
            })
            .collect();
        Self { size, rows }
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[inline]
    pub fn get(&self, r: usize, c: usize) -> Cell {
        self.rows[r].cell(c)
    }

    #[inline]
    pub fn set(&mut self, r: usize, c: usize, cell: Cell) {
        self.rows[r].set(c, cell);
    }

    /// Swap in a row by its id. The caller must have checked that the id is
    /// in range and the length matches the grid size.
    pub fn replace_row(&mut self, row: Row) {
        debug_assert_eq!(row.len(), self.size);
        let index = row.id as usize;
        self.rows[index] = row;
    }

    /// One red transition: every row moves independently.
    pub fn step_red(&mut self) {
        for row in &mut self.rows {
            step_red_row(row);
        }
    }

    /// One blue transition: blue cells move one step down into white cells,
    /// wrapping at the bottom. Every read goes through a snapshot taken
    /// before the first write, so no blue move can see another.
    pub fn step_blue(&mut self) {
        let n = self.size;
        let snapshot = self.rows.clone();
        for r in 0..n {
            let next = (r + 1) % n;
            for c in 0..n {
                if snapshot[r].cell(c) == Cell::Blue && snapshot[next].cell(c) == Cell::White {
                    self.rows[r].set(c, Cell::White);
                    self.rows[next].set(c, Cell::Blue);
                }
            }
        }
    }

    /// Per-color cell totals, indexed by wire code. Movement never changes
    /// these.
    pub fn color_counts(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for row in &self.rows {
            for &cell in row.cells() {
                counts[cell.code() as usize] += 1;
            }
        }
        counts
    }
}

/// One red transition over a single row: every red cell whose right-hand
/// neighbour was white before this row's updates moves one step right,
/// wrapping at the row end.
pub fn step_red_row(row: &mut Row) {
    let n = row.len();
    let before = row.clone();
    for c in 0..n {
        let next = (c + 1) % n;
        if before.cell(c) == Cell::Red && before.cell(next) == Cell::White {
            row.set(c, Cell::White);
            row.set(next, Cell::Red);
        }
    }
}

/// A tile whose single-color occupancy crossed the threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileHit {
    pub tile_col: u32,
    pub tile_row: u32,
    pub color: Cell,
    pub ratio: f64,
}

/// Scan a band of complete tile rows for the first tile where one color's
/// share of the `tile_size * tile_size` cells reaches `threshold` percent.
///
/// Rows are scanned in order, cells left to right, and per-tile counts are
/// checked as each cell is added, so the returned hit is the first crossing
/// in row-major order and its ratio reflects the count at the moment of
/// crossing. Tile rows are identified globally through the row ids, which
/// lets a worker scan just the bands it owns.
pub fn check_tiles(rows: &[Row], tile_size: usize, threshold: u32) -> Option<TileHit> {
    let cells_per_tile = (tile_size * tile_size) as f64;
    let delta = f64::from(threshold) / 100.0;

    for band in rows.chunks(tile_size) {
        let width = band[0].len();
        let tiles_across = width / tile_size;
        let tile_row = band[0].id / tile_size as u32;
        let mut blue = vec![0u32; tiles_across];
        let mut red = vec![0u32; tiles_across];

        for row in band {
            for c in 0..width {
                let tc = c / tile_size;
                let count = match row.cell(c) {
                    Cell::Blue => {
                        blue[tc] += 1;
                        blue[tc]
                    }
                    Cell::Red => {
                        red[tc] += 1;
                        red[tc]
                    }
                    Cell::White => continue,
                };

                let ratio = f64::from(count) / cells_per_tile;
                if ratio >= delta {
                    return Some(TileHit {
                        tile_col: tc as u32,
                        tile_row,
                        color: row.cell(c),
                        ratio,
                    });
                }
            }
        }
    }

    None
}
