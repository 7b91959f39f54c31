//! Line of sight between lattice points and its per-grid memoization.

use std::{cell::RefCell, fmt};

use pf_geom::Point;

use crate::{Bitfield, Grid};

/// Maximum number of lattice points of a grid whose line of sight results
/// are memoized. The memo takes `2 × points²` bits, i.e. 64 MiB at most.
///
/// Lines on larger grids are always traced directly.
pub const MAX_SIGHT_POINTS: usize = 16_384;

/// Lazily allocated line of sight memo of a single grid.
///
/// The memo table is allocated on the first in-range query, thus grids which
/// are never searched directly (e.g. children of a union) do not pay for it.
/// Grids with more than [`MAX_SIGHT_POINTS`] lattice points are never
/// memoized.
#[derive(Default)]
pub struct SightCache(RefCell<Option<LineOfSightCache>>);

impl SightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the memo table has been allocated.
    pub fn is_allocated(&self) -> bool {
        self.0.borrow().is_some()
    }

    /// Drops all memoized results.
    pub fn invalidate(&self) {
        if let Some(cache) = self.0.borrow_mut().as_mut() {
            cache.invalidate();
        }
    }

    pub(crate) fn line_of_sight<G: Grid + ?Sized>(&self, grid: &G, a: Point, b: Point) -> bool {
        let width = grid.point_width();
        let height = grid.point_height();
        let point_count = width as usize * height as usize;
        if point_count > MAX_SIGHT_POINTS {
            return trace_line(grid, a, b);
        }

        let (Some(a_index), Some(b_index)) = (
            point_index(a, width, height),
            point_index(b, width, height),
        ) else {
            return trace_line(grid, a, b);
        };

        if let Some(cache) = self.0.borrow().as_ref() {
            if let Some(visible) = cache.get(a_index, b_index) {
                return visible;
            }
        }

        let visible = trace_line(grid, a, b);
        self.0
            .borrow_mut()
            .get_or_insert_with(|| LineOfSightCache::new(point_count))
            .insert(a_index, b_index, visible);
        visible
    }
}

impl fmt::Debug for SightCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SightCache")
            .field("allocated", &self.is_allocated())
            .finish()
    }
}

/// Memo of line of sight results between every ordered pair of lattice
/// points of a grid.
///
/// Both tables are indexed by `(a, b)` point indices.
pub struct LineOfSightCache {
    missing: Bitfield,
    visible: Bitfield,
}

impl LineOfSightCache {
    fn new(point_count: usize) -> Self {
        let point_count = point_count as u32;
        Self {
            missing: Bitfield::new(point_count, point_count),
            visible: Bitfield::new(point_count, point_count),
        }
    }

    fn get(&self, a_index: usize, b_index: usize) -> Option<bool> {
        let (a, b) = (a_index as i32, b_index as i32);
        if self.missing.get(a, b) {
            None
        } else {
            Some(self.visible.get(a, b))
        }
    }

    fn insert(&mut self, a_index: usize, b_index: usize, visible: bool) {
        let (a, b) = (a_index as u32, b_index as u32);
        self.missing.set(a, b, false);
        self.visible.set(a, b, visible);
    }

    fn invalidate(&mut self) {
        self.missing.clear();
    }
}

fn point_index(point: Point, width: u32, height: u32) -> Option<usize> {
    let x = u32::try_from(point.x).ok()?;
    let y = u32::try_from(point.y).ok()?;
    if x >= width || y >= height {
        return None;
    }
    Some(x as usize + y as usize * width as usize)
}

/// Walks the supercover of segment `a`–`b` and returns false as soon as a
/// cell crossed by the segment is impassable.
///
/// A segment running along a grid line is blocked only where cells on both
/// of its sides are impassable.
pub(crate) fn trace_line<G: Grid + ?Sized>(grid: &G, a: Point, b: Point) -> bool {
    let (mut x, mut y) = (a.x, a.y);
    let (mut dx, mut dy) = (b.x - a.x, b.y - a.y);

    let sx = if dx < 0 {
        dx = -dx;
        -1
    } else {
        1
    };
    let sy = if dy < 0 {
        dy = -dy;
        -1
    } else {
        1
    };
    // Offset from a point to the cell lying in the direction of travel.
    let ox = (sx - 1) / 2;
    let oy = (sy - 1) / 2;

    let mut error = 0;
    if dx >= dy {
        while x != b.x {
            error += dy;
            if error >= dx {
                if !grid.can_cell_pass(x + ox, y + oy) {
                    return false;
                }
                y += sy;
                error -= dx;
            }
            if error != 0 && !grid.can_cell_pass(x + ox, y + oy) {
                return false;
            }
            if dy == 0 && !grid.can_cell_pass(x + ox, y) && !grid.can_cell_pass(x + ox, y - 1) {
                return false;
            }
            x += sx;
        }
    } else {
        while y != b.y {
            error += dx;
            if error >= dy {
                if !grid.can_cell_pass(x + ox, y + oy) {
                    return false;
                }
                x += sx;
                error -= dy;
            }
            if error != 0 && !grid.can_cell_pass(x + ox, y + oy) {
                return false;
            }
            if dx == 0 && !grid.can_cell_pass(x, y + oy) && !grid.can_cell_pass(x - 1, y + oy) {
                return false;
            }
            y += sy;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use pf_geom::ObjectId;

    use super::*;
    use crate::BitfieldGrid;

    fn grid_with_blocked(width: u32, height: u32, blocked: &[(u32, u32)]) -> BitfieldGrid {
        let mut grid = BitfieldGrid::new(ObjectId::from_u128(1), width, height);
        for &(x, y) in blocked {
            grid.set(x, y, false);
        }
        grid
    }

    #[test]
    fn test_open_grid() {
        let grid = grid_with_blocked(4, 3, &[]);
        for ay in 0..=3 {
            for ax in 0..=4 {
                for by in 0..=3 {
                    for bx in 0..=4 {
                        let a = Point::new(ax, ay);
                        let b = Point::new(bx, by);
                        assert!(grid.line_of_sight(a, b), "{a} -> {b}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_diagonal() {
        let grid = grid_with_blocked(3, 3, &[(1, 1)]);
        assert!(!grid.line_of_sight(Point::new(0, 0), Point::new(3, 3)));
        assert!(!grid.line_of_sight(Point::new(3, 3), Point::new(0, 0)));
        assert!(!grid.line_of_sight(Point::new(1, 1), Point::new(2, 2)));
        assert!(grid.line_of_sight(Point::new(0, 0), Point::new(1, 1)));
        assert!(grid.line_of_sight(Point::new(2, 2), Point::new(3, 3)));
        assert!(grid.line_of_sight(Point::new(0, 3), Point::new(1, 2)));
        assert!(grid.line_of_sight(Point::new(0, 0), Point::new(3, 1)));
        assert!(!grid.line_of_sight(Point::new(0, 1), Point::new(3, 2)));
    }

    #[test]
    fn test_along_blocked_cell() {
        let grid = grid_with_blocked(3, 3, &[(1, 1)]);
        // Edges of the blocked cell border passable cells.
        assert!(grid.line_of_sight(Point::new(1, 1), Point::new(2, 1)));
        assert!(grid.line_of_sight(Point::new(1, 1), Point::new(1, 2)));
        assert!(grid.line_of_sight(Point::new(0, 1), Point::new(3, 1)));
        // Field border.
        assert!(grid.line_of_sight(Point::new(0, 0), Point::new(3, 0)));
        assert!(grid.line_of_sight(Point::new(3, 3), Point::new(3, 0)));

        let grid = grid_with_blocked(3, 3, &[(1, 0), (1, 1)]);
        assert!(!grid.line_of_sight(Point::new(1, 1), Point::new(2, 1)));
        assert!(!grid.line_of_sight(Point::new(2, 1), Point::new(1, 1)));
        assert!(grid.line_of_sight(Point::new(1, 2), Point::new(2, 2)));

        let grid = grid_with_blocked(3, 1, &[(1, 0)]);
        assert!(!grid.line_of_sight(Point::new(0, 0), Point::new(3, 0)));
        assert!(!grid.line_of_sight(Point::new(3, 1), Point::new(0, 1)));
    }

    #[test]
    fn test_same_point() {
        let grid = grid_with_blocked(2, 2, &[(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert!(grid.line_of_sight(Point::new(1, 1), Point::new(1, 1)));
        assert!(!grid.line_of_sight(Point::new(0, 0), Point::new(2, 2)));
    }

    #[test]
    fn test_cache_invalidation() {
        let mut grid = grid_with_blocked(3, 3, &[]);
        assert!(!grid.sight().is_allocated());
        assert!(grid.line_of_sight(Point::new(0, 0), Point::new(3, 3)));
        assert!(grid.sight().is_allocated());

        grid.set(1, 1, false);
        assert!(!grid.line_of_sight(Point::new(0, 0), Point::new(3, 3)));
        grid.set(1, 1, true);
        assert!(grid.line_of_sight(Point::new(0, 0), Point::new(3, 3)));
    }

    #[test]
    fn test_out_of_range() {
        let grid = grid_with_blocked(2, 2, &[]);
        assert!(!grid.line_of_sight(Point::new(-1, 0), Point::new(1, 0)));
        assert!(!grid.line_of_sight(Point::new(0, 0), Point::new(0, 4)));
        assert!(!grid.sight().is_allocated());
    }

    #[test]
    fn test_large_grid() {
        let mut grid = grid_with_blocked(1000, 1000, &[(500, 500)]);
        assert!(grid.line_of_sight(Point::new(0, 0), Point::new(3, 3)));
        assert!(!grid.line_of_sight(Point::new(0, 0), Point::new(1000, 1000)));
        assert!(!grid.sight().is_allocated());

        grid.set(500, 500, true);
        assert!(grid.line_of_sight(Point::new(0, 0), Point::new(1000, 1000)));
    }
}
