use pf_geom::ObjectId;

use crate::{Grid, GridError, GridNode, SightCache};

/// A grid whose cell is passable if and only if the cell is passable in all
/// child grids. A union with no children is passable everywhere within its
/// bounds.
#[derive(Debug)]
pub struct GridUnion {
    id: ObjectId,
    width: u32,
    height: u32,
    children: Vec<GridNode>,
    sight: SightCache,
}

impl GridUnion {
    pub fn new(id: ObjectId, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            children: Vec::new(),
            sight: SightCache::new(),
        }
    }

    pub fn children(&self) -> &[GridNode] {
        self.children.as_slice()
    }

    pub fn child(&self, id: ObjectId) -> Option<&GridNode> {
        self.children.iter().find(|child| child.id() == id)
    }

    pub fn child_mut(&mut self, id: ObjectId) -> Option<&mut GridNode> {
        self.children.iter_mut().find(|child| child.id() == id)
    }

    /// Adds a child grid. A child with the same ID is replaced.
    ///
    /// Only the line of sight cache of this union is invalidated, ancestors
    /// are the caller's responsibility.
    pub fn add_grid(&mut self, grid: GridNode) -> Result<(), GridError> {
        if grid.cell_width() != self.width || grid.cell_height() != self.height {
            return Err(GridError::DimensionMismatch {
                width: grid.cell_width(),
                height: grid.cell_height(),
                expected_width: self.width,
                expected_height: self.height,
            });
        }

        match self.child_mut(grid.id()) {
            Some(existing) => *existing = grid,
            None => self.children.push(grid),
        }
        self.invalidate_sight();
        Ok(())
    }

    /// Removes a direct child and returns it.
    pub fn remove_grid(&mut self, id: ObjectId) -> Option<GridNode> {
        let index = self.children.iter().position(|child| child.id() == id)?;
        let child = self.children.remove(index);
        self.invalidate_sight();
        Some(child)
    }
}

impl Grid for GridUnion {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn cell_width(&self) -> u32 {
        self.width
    }

    fn cell_height(&self) -> u32 {
        self.height
    }

    fn can_cell_pass(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        self.children.iter().all(|child| child.can_cell_pass(x, y))
    }

    fn sight(&self) -> &SightCache {
        &self.sight
    }
}

#[cfg(test)]
mod tests {
    use pf_geom::Point;

    use super::*;
    use crate::BitfieldGrid;

    fn bitfield(id: u128, blocked: &[(u32, u32)]) -> GridNode {
        let mut grid = BitfieldGrid::new(ObjectId::from_u128(id), 3, 3);
        for &(x, y) in blocked {
            grid.set(x, y, false);
        }
        GridNode::Bitfield(grid)
    }

    #[test]
    fn test_empty() {
        let union = GridUnion::new(ObjectId::from_u128(1), 3, 3);
        for y in 0..3 {
            for x in 0..3 {
                assert!(union.can_cell_pass(x, y));
            }
        }
        assert!(!union.can_cell_pass(3, 0));
        assert!(!union.can_cell_pass(0, -1));
    }

    #[test]
    fn test_and() {
        let mut union = GridUnion::new(ObjectId::from_u128(1), 3, 3);
        union.add_grid(bitfield(2, &[(0, 0)])).unwrap();
        union.add_grid(bitfield(3, &[(2, 2)])).unwrap();

        for y in 0..3 {
            for x in 0..3 {
                let expected = (x, y) != (0, 0) && (x, y) != (2, 2);
                assert_eq!(union.can_cell_pass(x, y), expected);
            }
        }
    }

    #[test]
    fn test_add_remove() {
        let mut union = GridUnion::new(ObjectId::from_u128(1), 3, 3);
        assert!(union.line_of_sight(Point::new(0, 0), Point::new(3, 3)));

        union.add_grid(bitfield(2, &[(1, 1)])).unwrap();
        assert!(!union.line_of_sight(Point::new(0, 0), Point::new(3, 3)));

        // Replace in place.
        union.add_grid(bitfield(2, &[])).unwrap();
        assert_eq!(union.children().len(), 1);
        assert!(union.line_of_sight(Point::new(0, 0), Point::new(3, 3)));

        union.add_grid(bitfield(3, &[(2, 2)])).unwrap();
        assert!(!union.line_of_sight(Point::new(0, 0), Point::new(3, 3)));
        assert!(union.remove_grid(ObjectId::from_u128(3)).is_some());
        assert!(union.remove_grid(ObjectId::from_u128(3)).is_none());
        assert!(union.line_of_sight(Point::new(0, 0), Point::new(3, 3)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut union = GridUnion::new(ObjectId::from_u128(1), 3, 3);
        let grid = GridNode::Bitfield(BitfieldGrid::new(ObjectId::from_u128(2), 3, 4));
        assert_eq!(
            union.add_grid(grid).unwrap_err(),
            GridError::DimensionMismatch {
                width: 3,
                height: 4,
                expected_width: 3,
                expected_height: 3,
            }
        );
        assert!(union.children().is_empty());
    }
}
