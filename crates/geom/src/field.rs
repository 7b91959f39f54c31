use glam::DVec2;

use crate::Point;

/// Conversion between the discretized field (cells and lattice points) and
/// world coordinates in metres.
///
/// Cell coordinates have +X right and +Y down and one unit corresponds to one
/// cell. Metre coordinates have +X right and +Y up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    cell_size: f64,
    width: f64,
    height: f64,
    cells_x: u32,
    cells_y: u32,
    /// Origin in cells.
    origin_x: f64,
    /// Origin in cells.
    origin_y: f64,
}

impl Field {
    /// Creates a new field.
    ///
    /// # Arguments
    ///
    /// * `cell_size` - size of a (square) cell in metres. It must be positive.
    ///
    /// * `width` - width of the field in metres.
    ///
    /// * `height` - height of the field in metres.
    ///
    /// * `origin_x` - origin X as a fraction of the width in cell space
    ///   (lower is left).
    ///
    /// * `origin_y` - origin Y as a fraction of the height in cell space
    ///   (lower is up).
    pub fn new(cell_size: f64, width: f64, height: f64, origin_x: f64, origin_y: f64) -> Self {
        debug_assert!(cell_size > 0.);
        let cells_x = (width / cell_size).ceil() as u32;
        let cells_y = (height / cell_size).ceil() as u32;
        Self {
            cell_size,
            width,
            height,
            cells_x,
            cells_y,
            origin_x: origin_x * f64::from(cells_x),
            origin_y: origin_y * f64::from(cells_y),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Field width in metres.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Field height in metres.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of cells along the X axis.
    pub fn cells_x(&self) -> u32 {
        self.cells_x
    }

    /// Number of cells along the Y axis.
    pub fn cells_y(&self) -> u32 {
        self.cells_y
    }

    /// Origin X in cells.
    pub fn origin_x(&self) -> f64 {
        self.origin_x
    }

    /// Origin Y in cells.
    pub fn origin_y(&self) -> f64 {
        self.origin_y
    }

    /// Converts a (fractional) position in cell space to metres.
    pub fn cell_to_metres(&self, cell: DVec2) -> DVec2 {
        DVec2::new(
            (cell.x - self.origin_x) * self.cell_size,
            -(cell.y - self.origin_y) * self.cell_size,
        )
    }

    /// Converts a position in metres to (fractional) cell space.
    pub fn metres_to_cell(&self, position: DVec2) -> DVec2 {
        DVec2::new(
            position.x / self.cell_size + self.origin_x,
            self.origin_y - position.y / self.cell_size,
        )
    }

    /// Returns the center of a cell in metres.
    pub fn cell_center(&self, x: u32, y: u32) -> DVec2 {
        self.cell_to_metres(DVec2::new(f64::from(x) + 0.5, f64::from(y) + 0.5))
    }

    /// Returns position of a lattice point in metres.
    pub fn point_to_metres(&self, point: Point) -> DVec2 {
        self.cell_to_metres(DVec2::new(f64::from(point.x), f64::from(point.y)))
    }

    /// Returns the lattice point nearest to a position in metres. Positions
    /// outside of the field are clamped to its border.
    pub fn nearest_point(&self, position: DVec2) -> Point {
        let cell = self.metres_to_cell(position).round();
        let x = cell.x.clamp(0., f64::from(self.cells_x));
        let y = cell.y.clamp(0., f64::from(self.cells_y));
        Point::new(x as i32, y as i32)
    }
}
