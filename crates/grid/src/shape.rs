use std::{
    cell::{Cell, RefCell},
    sync::Arc,
};

use pf_geom::{Field, Footprint, ObjectId, Shape};
use tracing::trace;

use crate::{Bitfield, Grid, SightCache};

/// Everything needed to rasterize shapes into cells.
#[derive(Clone, Debug)]
pub struct FieldContext {
    field: Field,
    footprint: Footprint,
}

impl FieldContext {
    pub fn new(field: Field, footprint: Footprint) -> Self {
        Self { field, footprint }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }
}

/// A grid whose cells are derived from a set of collider shapes.
///
/// A cell is passable if the robot footprint placed at the cell center
/// collides with none of the shapes. The bitfield is regenerated lazily on
/// the first query after any shape change.
#[derive(Debug)]
pub struct ShapeGrid {
    id: ObjectId,
    context: Arc<FieldContext>,
    shapes: Vec<Shape>,
    cells: RefCell<Bitfield>,
    dirty: Cell<bool>,
    regenerations: Cell<u64>,
    sight: SightCache,
}

impl ShapeGrid {
    pub fn new(id: ObjectId, width: u32, height: u32, context: Arc<FieldContext>) -> Self {
        Self {
            id,
            context,
            shapes: Vec::new(),
            cells: RefCell::new(Bitfield::new(width, height)),
            dirty: Cell::new(false),
            regenerations: Cell::new(0),
            sight: SightCache::new(),
        }
    }

    pub fn context(&self) -> &Arc<FieldContext> {
        &self.context
    }

    pub fn shapes(&self) -> &[Shape] {
        self.shapes.as_slice()
    }

    pub fn shape(&self, id: ObjectId) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.id() == id)
    }

    /// Adds a shape to the grid. A shape with the same ID is replaced.
    pub fn add_shape(&mut self, shape: Shape) {
        match self.shapes.iter_mut().find(|s| s.id() == shape.id()) {
            Some(existing) => *existing = shape,
            None => self.shapes.push(shape),
        }
        self.mark_dirty();
    }

    /// Removes a shape from the grid and returns it.
    pub fn remove_shape(&mut self, id: ObjectId) -> Option<Shape> {
        let index = self.shapes.iter().position(|shape| shape.id() == id)?;
        let shape = self.shapes.remove(index);
        self.mark_dirty();
        Some(shape)
    }

    /// Number of bitfield regenerations done so far.
    pub fn regenerations(&self) -> u64 {
        self.regenerations.get()
    }

    fn mark_dirty(&self) {
        self.dirty.set(true);
        self.invalidate_sight();
    }

    fn regenerate(&self) {
        self.dirty.set(false);
        self.regenerations.set(self.regenerations.get() + 1);

        let field = self.context.field();
        let footprint = self.context.footprint();

        let mut cells = self.cells.borrow_mut();
        for y in 0..cells.height() {
            for x in 0..cells.width() {
                let center = field.cell_center(x, y);
                let passable = !self
                    .shapes
                    .iter()
                    .any(|shape| shape.collides_with(footprint, center));
                cells.set(x, y, passable);
            }
        }

        trace!(
            "Regenerated shape grid {} from {} shapes, {} cells blocked.",
            self.id,
            self.shapes.len(),
            cells.count_blocked()
        );
    }
}

impl Grid for ShapeGrid {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn cell_width(&self) -> u32 {
        self.cells.borrow().width()
    }

    fn cell_height(&self) -> u32 {
        self.cells.borrow().height()
    }

    fn can_cell_pass(&self, x: i32, y: i32) -> bool {
        if self.dirty.get() {
            self.regenerate();
        }
        self.cells.borrow().get(x, y)
    }

    fn sight(&self) -> &SightCache {
        &self.sight
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;
    use pf_geom::{Circle, Point, Rectangle, ShapeKind};

    use super::*;

    fn context() -> Arc<FieldContext> {
        // 10 × 10 cells, metre coordinates equal to cell coordinates with
        // flipped Y.
        let field = Field::new(1., 10., 10., 0., 0.);
        let footprint = Footprint::new(ObjectId::from_u128(1), Circle::new(DVec2::ZERO, 0.));
        Arc::new(FieldContext::new(field, footprint))
    }

    fn circle(id: u128, x: f64, y: f64, radius: f64, inverted: bool) -> Shape {
        Shape::new(
            ObjectId::from_u128(id),
            inverted,
            ShapeKind::Circle(Circle::new(DVec2::new(x, y), radius)),
        )
    }

    #[test]
    fn test_rasterization() {
        let mut grid = ShapeGrid::new(ObjectId::from_u128(10), 10, 10, context());
        assert!(grid.can_cell_pass(4, 4));

        // Cell (4, 4) has its center at (4.5, -4.5).
        grid.add_shape(circle(2, 4.5, -4.5, 0.6, false));
        assert!(!grid.can_cell_pass(4, 4));
        assert!(grid.can_cell_pass(5, 4));
        assert!(grid.can_cell_pass(4, 3));

        grid.add_shape(Shape::new(
            ObjectId::from_u128(3),
            false,
            ShapeKind::Rectangle(Rectangle::new(
                DVec2::new(5., -1.),
                DVec2::new(10., 1.),
                0.,
            )),
        ));
        for x in 0..10 {
            assert!(!grid.can_cell_pass(x, 0));
            assert!(!grid.can_cell_pass(x, 1));
            assert!(grid.can_cell_pass(x, 2));
        }
    }

    #[test]
    fn test_inverted() {
        let mut grid = ShapeGrid::new(ObjectId::from_u128(10), 10, 10, context());
        grid.add_shape(circle(2, 5., -5., 2., true));
        assert!(grid.can_cell_pass(4, 4));
        assert!(grid.can_cell_pass(5, 5));
        assert!(!grid.can_cell_pass(0, 0));
        assert!(!grid.can_cell_pass(9, 5));
    }

    #[test]
    fn test_lazy_regeneration() {
        let mut grid = ShapeGrid::new(ObjectId::from_u128(10), 10, 10, context());
        assert_eq!(grid.regenerations(), 0);

        grid.add_shape(circle(2, 4.5, -4.5, 0.6, false));
        grid.add_shape(circle(3, 1.5, -1.5, 0.6, false));
        assert_eq!(grid.regenerations(), 0);

        assert!(!grid.can_cell_pass(1, 1));
        assert!(!grid.can_cell_pass(4, 4));
        assert!(grid.can_cell_pass(0, 0));
        assert_eq!(grid.regenerations(), 1);

        assert!(grid.remove_shape(ObjectId::from_u128(2)).is_some());
        assert!(grid.remove_shape(ObjectId::from_u128(2)).is_none());
        assert!(grid.can_cell_pass(4, 4));
        assert!(grid.can_cell_pass(7, 7));
        assert_eq!(grid.regenerations(), 2);
    }

    #[test]
    fn test_replace_shape() {
        let mut grid = ShapeGrid::new(ObjectId::from_u128(10), 10, 10, context());
        grid.add_shape(circle(2, 4.5, -4.5, 0.6, false));
        grid.add_shape(circle(2, 8.5, -8.5, 0.6, false));
        assert_eq!(grid.shapes().len(), 1);
        assert!(grid.can_cell_pass(4, 4));
        assert!(!grid.can_cell_pass(8, 8));
    }

    #[test]
    fn test_invalidates_sight() {
        let mut grid = ShapeGrid::new(ObjectId::from_u128(10), 10, 10, context());
        assert!(grid.line_of_sight(Point::new(0, 0), Point::new(10, 10)));
        grid.add_shape(circle(2, 4.5, -4.5, 0.6, false));
        assert!(!grid.line_of_sight(Point::new(0, 0), Point::new(10, 10)));
    }
}
