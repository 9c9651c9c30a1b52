//! Text rendering of grids: a tile-bordered frame of glyphs on stderr.

use crate::domain::Grid;

/// Render the grid as a block of glyphs with `+`/`-`/`|` borders along the
/// tile seams.
pub fn render_grid(grid: &Grid, tile_size: usize) -> String {
    let n = grid.size();
    let mut out = String::new();

    push_border(&mut out, n, tile_size);
    for r in 0..n {
        out.push('|');
        for c in 0..n {
            out.push(grid.get(r, c).glyph());
            if c < n - 1 {
                out.push(if c % tile_size == tile_size - 1 { '|' } else { ' ' });
            }
        }
        out.push('|');
        out.push('\n');
        if r < n - 1 && r % tile_size == tile_size - 1 {
            push_border(&mut out, n, tile_size);
        }
    }
    push_border(&mut out, n, tile_size);

    out
}

/// Print the grid to stderr, followed by a blank separator line.
pub fn print_grid(grid: &Grid, tile_size: usize) {
    eprint!("{}", render_grid(grid, tile_size));
    eprintln!();
}

fn push_border(out: &mut String, n: usize, tile_size: usize) {
    out.push('+');
    for i in 0..n {
        if i < n - 1 {
            if i % tile_size == tile_size - 1 {
                out.push_str("-+");
            } else {
                out.push_str("--");
            }
        } else {
            out.push('-');
        }
    }
    out.push('+');
    out.push('\n');
}
