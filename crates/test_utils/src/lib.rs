use pf_geom::{ObjectId, Point};
use pf_grid::{Bitfield, BitfieldGrid};

/// Character of an impassable cell in [`grid_from_rows`].
pub const BLOCKED: char = '#';

/// Builds a grid from rows of characters, top row first.
///
/// Cell `(x, y)` is given by character `x` of row `y`. [`BLOCKED`] marks an
/// impassable cell, any other character a passable one.
///
/// # Panics
///
/// Panics if the rows are not of equal length.
pub fn grid_from_rows(rows: &[&str]) -> BitfieldGrid {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |row| row.chars().count()) as u32;

    let mut cells = Bitfield::new(width, height);
    for (y, row) in rows.iter().enumerate() {
        assert_eq!(row.chars().count() as u32, width, "row {y} has bad length");
        for (x, cell) in row.chars().enumerate() {
            if cell == BLOCKED {
                cells.set(x as u32, y as u32, false);
            }
        }
    }
    BitfieldGrid::from_bitfield(ObjectId::from_u128(1), cells)
}

/// Builds a grid with randomly scattered impassable cells.
///
/// # Arguments
///
/// * `seed` - the result is deterministic across calls with the same
///   arguments.
///
/// * `density` - probability of a cell being impassable.
///
/// * `keep_open` - points whose surrounding cells are all kept passable.
pub fn random_grid(
    width: u32,
    height: u32,
    density: f64,
    seed: u64,
    keep_open: &[Point],
) -> BitfieldGrid {
    let rng = fastrand::Rng::with_seed(seed);
    let mut cells = Bitfield::new(width, height);
    for y in 0..height {
        for x in 0..width {
            if rng.f64() < density {
                cells.set(x, y, false);
            }
        }
    }

    for point in keep_open {
        for (dx, dy) in [(-1, -1), (0, -1), (-1, 0), (0, 0)] {
            let (x, y) = (point.x + dx, point.y + dy);
            if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                cells.set(x as u32, y as u32, true);
            }
        }
    }
    BitfieldGrid::from_bitfield(ObjectId::from_u128(1), cells)
}

#[cfg(test)]
mod tests {
    use pf_grid::Grid;

    use super::*;

    #[test]
    fn test_grid_from_rows() {
        let grid = grid_from_rows(&["..#", "#..", "..."]);
        assert_eq!(grid.cell_width(), 3);
        assert_eq!(grid.cell_height(), 3);
        assert!(!grid.can_cell_pass(2, 0));
        assert!(!grid.can_cell_pass(0, 1));
        assert_eq!(grid.cells().count_blocked(), 2);
    }

    #[test]
    fn test_random_grid() {
        let a = random_grid(20, 10, 0.3, 42, &[Point::new(0, 0)]);
        let b = random_grid(20, 10, 0.3, 42, &[Point::new(0, 0)]);
        assert_eq!(a.cells(), b.cells());
        assert!(a.can_cell_pass(0, 0));
        assert!(a.cells().count_blocked() > 0);
    }
}
