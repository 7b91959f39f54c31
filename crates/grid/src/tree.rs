use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use pf_geom::{ObjectId, Shape};
use tracing::debug;

use crate::{
    Bitfield, BitfieldGrid, FieldContext, Grid, GridError, GridNode, GridType, GridUnion,
    ShapeGrid,
};

/// Owner of the whole grid hierarchy.
///
/// The tree keeps track of parents of all grids and owners of all shapes so
/// that any of them can be addressed by its ID. All mutations go through the
/// tree, which invalidates line of sight caches of the mutated grid and all
/// its ancestors.
pub struct GridTree {
    context: Arc<FieldContext>,
    root: GridUnion,
    /// Parent union of every non-root grid.
    parents: AHashMap<ObjectId, ObjectId>,
    /// Shape grid owning every shape.
    shape_owners: AHashMap<ObjectId, ObjectId>,
}

impl GridTree {
    /// Creates a tree with an empty root union spanning the whole field.
    pub fn new(root_id: ObjectId, context: Arc<FieldContext>) -> Self {
        let field = context.field();
        let root = GridUnion::new(root_id, field.cells_x(), field.cells_y());
        Self {
            context,
            root,
            parents: AHashMap::new(),
            shape_owners: AHashMap::new(),
        }
    }

    pub fn context(&self) -> &Arc<FieldContext> {
        &self.context
    }

    /// The root union. Its passability is the passability of the field.
    pub fn root(&self) -> &GridUnion {
        &self.root
    }

    pub fn contains_grid(&self, id: ObjectId) -> bool {
        id == self.root.id() || self.parents.contains_key(&id)
    }

    pub fn contains_shape(&self, id: ObjectId) -> bool {
        self.shape_owners.contains_key(&id)
    }

    /// Returns a non-root grid.
    pub fn grid(&self, id: ObjectId) -> Option<&GridNode> {
        if !self.parents.contains_key(&id) {
            return None;
        }

        let chain = self.chain(id);
        let mut path = chain.iter().rev();
        let mut node = self.root.child(*path.next()?)?;
        for &id in path {
            node = node.as_union()?.child(id)?;
        }
        Some(node)
    }

    pub fn shape(&self, id: ObjectId) -> Option<&Shape> {
        let owner = self.shape_owners.get(&id)?;
        match self.grid(*owner)? {
            GridNode::Shape(grid) => grid.shape(id),
            _ => None,
        }
    }

    /// Creates a new empty grid of the given type under a union.
    ///
    /// If a grid with the same ID already exists, it is removed (together
    /// with all its descendants) first.
    pub fn add_grid(
        &mut self,
        parent: ObjectId,
        id: ObjectId,
        grid_type: GridType,
    ) -> Result<(), GridError> {
        let (width, height) = (self.root.cell_width(), self.root.cell_height());
        let node = match grid_type {
            GridType::Union => GridNode::Union(GridUnion::new(id, width, height)),
            GridType::Bitfield => GridNode::Bitfield(BitfieldGrid::new(id, width, height)),
            GridType::Shape => {
                GridNode::Shape(ShapeGrid::new(id, width, height, Arc::clone(&self.context)))
            }
        };
        self.insert(parent, node)
    }

    /// Places a (possibly non-empty) grid under a union.
    ///
    /// If a grid with the same ID already exists, it is removed (together
    /// with all its descendants) first. IDs of descendants of the inserted
    /// grid must not be present in the tree yet.
    pub fn insert(&mut self, parent: ObjectId, node: GridNode) -> Result<(), GridError> {
        let id = node.id();
        if !self.contains_grid(parent) {
            return Err(GridError::UnknownGrid(parent));
        }
        if id == self.root.id() {
            return Err(GridError::ReplaceRoot(id));
        }
        if id == parent || self.chain(parent).contains(&id) {
            return Err(GridError::Cycle(id));
        }

        if node.cell_width() != self.root.cell_width()
            || node.cell_height() != self.root.cell_height()
        {
            return Err(GridError::DimensionMismatch {
                width: node.cell_width(),
                height: node.cell_height(),
                expected_width: self.root.cell_width(),
                expected_height: self.root.cell_height(),
            });
        }

        // IDs which are going to be freed by replacement of the grid.
        let mut replaced = AHashSet::new();
        if let Some(existing) = self.grid(id) {
            let mut grids = Vec::new();
            let mut shapes = Vec::new();
            collect_ids(existing, parent, &mut grids, &mut shapes);
            replaced.extend(grids.into_iter().map(|(grid_id, _)| grid_id));
            replaced.extend(shapes.into_iter().map(|(shape_id, _)| shape_id));
        }

        let mut grids = Vec::new();
        let mut shapes = Vec::new();
        collect_ids(&node, parent, &mut grids, &mut shapes);
        let mut seen = AHashSet::new();
        for &(grid_id, _) in grids.iter() {
            let taken = self.contains_grid(grid_id) && !replaced.contains(&grid_id);
            if taken || !seen.insert(grid_id) {
                return Err(GridError::Duplicate(grid_id));
            }
        }
        for &(shape_id, _) in shapes.iter() {
            let taken = self.contains_shape(shape_id) && !replaced.contains(&shape_id);
            if taken || !seen.insert(shape_id) {
                return Err(GridError::Duplicate(shape_id));
            }
        }

        if self.parents.contains_key(&id) {
            self.remove_grid(id)?;
        }
        self.union_mut(parent)?.add_grid(node)?;

        self.parents.extend(grids);
        self.shape_owners.extend(shapes);
        self.invalidate_from(parent);
        debug!("Grid {id} added to union {parent}.");
        Ok(())
    }

    /// Removes a grid and all its descendants.
    pub fn remove_grid(&mut self, id: ObjectId) -> Result<GridNode, GridError> {
        if id == self.root.id() {
            return Err(GridError::RemoveRoot(id));
        }
        let parent = *self.parents.get(&id).ok_or(GridError::UnknownGrid(id))?;
        let node = self
            .union_mut(parent)?
            .remove_grid(id)
            .ok_or(GridError::UnknownGrid(id))?;

        let mut grids = Vec::new();
        let mut shapes = Vec::new();
        collect_ids(&node, parent, &mut grids, &mut shapes);
        for (grid_id, _) in grids {
            self.parents.remove(&grid_id);
        }
        for (shape_id, _) in shapes {
            self.shape_owners.remove(&shape_id);
        }

        self.invalidate_from(parent);
        debug!("Grid {id} removed from union {parent}.");
        Ok(node)
    }

    /// Adds a shape to a shape grid.
    ///
    /// If a shape with the same ID already exists (in any grid), it is
    /// removed first.
    pub fn add_shape(&mut self, parent: ObjectId, shape: Shape) -> Result<(), GridError> {
        // Validate the target before anything is removed.
        self.shape_grid_mut(parent)?;

        let id = shape.id();
        if self.shape_owners.contains_key(&id) {
            self.remove_shape(id)?;
        }
        self.shape_grid_mut(parent)?.add_shape(shape);
        self.shape_owners.insert(id, parent);
        self.invalidate_from(parent);
        debug!("Shape {id} added to grid {parent}.");
        Ok(())
    }

    /// Replaces an existing shape, keeping it in the same shape grid.
    pub fn alter_shape(&mut self, shape: Shape) -> Result<(), GridError> {
        let id = shape.id();
        let owner = *self
            .shape_owners
            .get(&id)
            .ok_or(GridError::UnknownShape(id))?;
        self.shape_grid_mut(owner)?.add_shape(shape);
        self.invalidate_from(owner);
        debug!("Shape {id} in grid {owner} altered.");
        Ok(())
    }

    pub fn remove_shape(&mut self, id: ObjectId) -> Result<Shape, GridError> {
        let owner = *self
            .shape_owners
            .get(&id)
            .ok_or(GridError::UnknownShape(id))?;
        let shape = self
            .shape_grid_mut(owner)?
            .remove_shape(id)
            .ok_or(GridError::UnknownShape(id))?;
        self.shape_owners.remove(&id);
        self.invalidate_from(owner);
        debug!("Shape {id} removed from grid {owner}.");
        Ok(shape)
    }

    /// Sets passability of a single cell of a bitfield grid.
    pub fn set_cell(
        &mut self,
        grid: ObjectId,
        x: u32,
        y: u32,
        passable: bool,
    ) -> Result<(), GridError> {
        let node = self.node_mut(grid).ok_or(GridError::UnknownGrid(grid))?;
        let actual = node.grid_type();
        let GridNode::Bitfield(bitfield) = node else {
            return Err(GridError::WrongType {
                id: grid,
                expected: GridType::Bitfield,
                actual,
            });
        };
        if x >= bitfield.cell_width() || y >= bitfield.cell_height() {
            return Err(GridError::OutOfBounds { id: grid, x, y });
        }

        bitfield.set(x, y, passable);
        self.invalidate_from(grid);
        Ok(())
    }

    /// Rasterizes passability of the whole hierarchy.
    pub fn cell_data(&self) -> Bitfield {
        let mut cells = Bitfield::new(self.root.cell_width(), self.root.cell_height());
        for y in 0..cells.height() {
            for x in 0..cells.width() {
                cells.set(x, y, self.root.can_cell_pass(x as i32, y as i32));
            }
        }
        cells
    }

    /// Returns the grid and all its ancestors except the root, the grid
    /// first.
    fn chain(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(&parent) = self.parents.get(&current) {
            chain.push(current);
            current = parent;
        }
        chain
    }

    fn node_mut(&mut self, id: ObjectId) -> Option<&mut GridNode> {
        let chain = self.chain(id);
        let mut path = chain.iter().rev();
        let mut node = self.root.child_mut(*path.next()?)?;
        for &id in path {
            node = node.as_union_mut()?.child_mut(id)?;
        }
        Some(node)
    }

    fn union_mut(&mut self, id: ObjectId) -> Result<&mut GridUnion, GridError> {
        if id == self.root.id() {
            return Ok(&mut self.root);
        }

        let node = self.node_mut(id).ok_or(GridError::UnknownGrid(id))?;
        let actual = node.grid_type();
        node.as_union_mut().ok_or(GridError::WrongType {
            id,
            expected: GridType::Union,
            actual,
        })
    }

    fn shape_grid_mut(&mut self, id: ObjectId) -> Result<&mut ShapeGrid, GridError> {
        if id == self.root.id() {
            return Err(GridError::WrongType {
                id,
                expected: GridType::Shape,
                actual: GridType::Union,
            });
        }

        let node = self.node_mut(id).ok_or(GridError::UnknownGrid(id))?;
        let actual = node.grid_type();
        match node {
            GridNode::Shape(grid) => Ok(grid),
            _ => Err(GridError::WrongType {
                id,
                expected: GridType::Shape,
                actual,
            }),
        }
    }

    /// Invalidates line of sight caches of a grid and all its ancestors.
    fn invalidate_from(&self, id: ObjectId) {
        for grid_id in self.chain(id) {
            if let Some(node) = self.grid(grid_id) {
                node.invalidate_sight();
            }
        }
        self.root.invalidate_sight();
    }
}

/// Collects (grid, parent) pairs of a subtree (including its root) and
/// (shape, owner) pairs of all shapes in the subtree.
fn collect_ids(
    node: &GridNode,
    parent: ObjectId,
    grids: &mut Vec<(ObjectId, ObjectId)>,
    shapes: &mut Vec<(ObjectId, ObjectId)>,
) {
    let id = node.id();
    grids.push((id, parent));
    match node {
        GridNode::Union(union) => {
            for child in union.children() {
                collect_ids(child, id, grids, shapes);
            }
        }
        GridNode::Shape(grid) => {
            shapes.extend(grid.shapes().iter().map(|shape| (shape.id(), id)));
        }
        GridNode::Bitfield(_) => (),
    }
}
