use pf_geom::{ObjectId, Point};

use crate::SightCache;

/// Stable type discriminator of grids. The IDs are shared by the message
/// protocol and the persistence format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum GridType {
    Union = 0,
    Bitfield = 1,
    Shape = 2,
}

impl GridType {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Union),
            1 => Some(Self::Bitfield),
            2 => Some(Self::Shape),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// A rectangular field of cells, each of them either passable or impassable.
///
/// A grid of `W × H` cells has `(W + 1) × (H + 1)` lattice points at the cell
/// corners. Searching happens on the points while passability is a property
/// of the cells.
pub trait Grid {
    fn id(&self) -> ObjectId;

    /// Number of cells along the X axis.
    fn cell_width(&self) -> u32;

    /// Number of cells along the Y axis.
    fn cell_height(&self) -> u32;

    /// Returns true if the cell is passable. Cells outside of the grid are
    /// never passable.
    fn can_cell_pass(&self, x: i32, y: i32) -> bool;

    /// Line of sight memo of the grid.
    fn sight(&self) -> &SightCache;

    fn point_width(&self) -> u32 {
        self.cell_width() + 1
    }

    fn point_height(&self) -> u32 {
        self.cell_height() + 1
    }

    /// Returns true if the point lies within the lattice of the grid.
    fn contains_point(&self, point: Point) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as u32) < self.point_width()
            && (point.y as u32) < self.point_height()
    }

    /// Returns true if a straight segment between two lattice points crosses
    /// only passable cells.
    ///
    /// Results of in-range queries are memoized until the next
    /// [`Self::invalidate_sight`].
    fn line_of_sight(&self, a: Point, b: Point) -> bool {
        self.sight().line_of_sight(self, a, b)
    }

    /// Drops memoized line of sight results of this grid (not of its
    /// children or ancestors).
    fn invalidate_sight(&self) {
        self.sight().invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_type() {
        for grid_type in [GridType::Union, GridType::Bitfield, GridType::Shape] {
            assert_eq!(GridType::from_id(grid_type.id()), Some(grid_type));
        }
        assert_eq!(GridType::Shape.id(), 2);
        assert_eq!(GridType::from_id(3), None);
    }
}
