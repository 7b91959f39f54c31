//! Paths found on the lattice of a grid.

use pf_geom::Point;

/// A path defined by a sequence of lattice points. Start and goal are
/// included, the start comes first.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    cost: f64,
    waypoints: Vec<Point>,
}

impl Path {
    /// Creates a path consisting of a single point.
    pub fn stationary(point: Point) -> Self {
        Self::new(0., vec![point])
    }

    /// Creates a new path.
    ///
    /// # Arguments
    ///
    /// * `cost` - total cost of the path as measured by the graph it was
    ///   found on.
    ///
    /// * `waypoints` - non-empty sequence of way points, start first.
    pub fn new(cost: f64, waypoints: Vec<Point>) -> Self {
        debug_assert!(!waypoints.is_empty());
        Self { cost, waypoints }
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Euclidean length of the path in cells.
    pub fn length(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|pair| f64::from(pair[1].x - pair[0].x).hypot(f64::from(pair[1].y - pair[0].y)))
            .sum()
    }

    pub fn start(&self) -> Point {
        self.waypoints[0]
    }

    pub fn goal(&self) -> Point {
        self.waypoints[self.waypoints.len() - 1]
    }

    pub fn waypoints(&self) -> &[Point] {
        self.waypoints.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path() {
        let path = Path::new(
            8.,
            vec![Point::new(1, 2), Point::new(3, 2), Point::new(3, 8)],
        );
        assert_eq!(path.cost(), 8.);
        assert_eq!(path.length(), 8.);
        assert_eq!(path.start(), Point::new(1, 2));
        assert_eq!(path.goal(), Point::new(3, 8));
        assert_eq!(path.waypoints().len(), 3);

        let path = Path::stationary(Point::new(4, 4));
        assert_eq!(path.length(), 0.);
        assert_eq!(path.start(), path.goal());
    }
}
