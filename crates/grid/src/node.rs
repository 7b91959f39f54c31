use pf_geom::ObjectId;

use crate::{BitfieldGrid, Grid, GridType, GridUnion, ShapeGrid, SightCache};

/// A grid of any type placed in the grid hierarchy.
#[derive(Debug)]
pub enum GridNode {
    Union(GridUnion),
    Bitfield(BitfieldGrid),
    Shape(ShapeGrid),
}

impl GridNode {
    pub fn grid_type(&self) -> GridType {
        match self {
            Self::Union(_) => GridType::Union,
            Self::Bitfield(_) => GridType::Bitfield,
            Self::Shape(_) => GridType::Shape,
        }
    }

    fn as_grid(&self) -> &dyn Grid {
        match self {
            Self::Union(grid) => grid,
            Self::Bitfield(grid) => grid,
            Self::Shape(grid) => grid,
        }
    }

    pub fn as_union(&self) -> Option<&GridUnion> {
        match self {
            Self::Union(union) => Some(union),
            _ => None,
        }
    }

    pub fn as_union_mut(&mut self) -> Option<&mut GridUnion> {
        match self {
            Self::Union(union) => Some(union),
            _ => None,
        }
    }

    /// Returns direct children of union nodes, nothing for other types.
    pub fn children(&self) -> &[GridNode] {
        match self {
            Self::Union(union) => union.children(),
            _ => &[],
        }
    }
}

impl Grid for GridNode {
    fn id(&self) -> ObjectId {
        self.as_grid().id()
    }

    fn cell_width(&self) -> u32 {
        self.as_grid().cell_width()
    }

    fn cell_height(&self) -> u32 {
        self.as_grid().cell_height()
    }

    fn can_cell_pass(&self, x: i32, y: i32) -> bool {
        self.as_grid().can_cell_pass(x, y)
    }

    fn sight(&self) -> &SightCache {
        self.as_grid().sight()
    }
}

impl From<GridUnion> for GridNode {
    fn from(grid: GridUnion) -> Self {
        Self::Union(grid)
    }
}

impl From<BitfieldGrid> for GridNode {
    fn from(grid: BitfieldGrid) -> Self {
        Self::Bitfield(grid)
    }
}

impl From<ShapeGrid> for GridNode {
    fn from(grid: ShapeGrid) -> Self {
        Self::Shape(grid)
    }
}
