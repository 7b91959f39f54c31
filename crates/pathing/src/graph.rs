//! Search graph view of passability grids.

use pf_geom::Point;
use pf_grid::Grid;
use tinyvec::ArrayVec;

/// A graph over lattice points searchable by [`crate::Pathfinder`].
pub trait SpatialGraph {
    /// Returns true if the point is a vertex of the graph.
    fn contains(&self, point: Point) -> bool;

    /// Estimated cost of travel from `point` to `goal`. It must never
    /// overestimate the true cost.
    fn heuristic(&self, point: Point, goal: Point) -> f64;

    /// Cost of a straight move between two (not necessarily adjacent)
    /// points.
    fn cost(&self, a: Point, b: Point) -> f64;

    /// Returns all points reachable from `point` by a single step.
    fn neighbours(&self, point: Point) -> ArrayVec<[Point; 8]>;

    fn line_of_sight(&self, a: Point, b: Point) -> bool;
}

/// Exposes a grid as an 8-connected graph of its lattice points.
///
/// Costs are Euclidean distances with independently scaled axes. Biases
/// larger than 1 make the search prefer moves along the other axis.
pub struct GridGraph<'a, G: Grid + ?Sized> {
    grid: &'a G,
    bias_x: f64,
    bias_y: f64,
}

impl<'a, G: Grid + ?Sized> GridGraph<'a, G> {
    pub fn new(grid: &'a G) -> Self {
        Self::with_bias(grid, 1., 1.)
    }

    /// # Arguments
    ///
    /// * `grid` - grid whose lattice points are the graph vertices.
    ///
    /// * `bias_x` - multiplier of X distances. It must be positive.
    ///
    /// * `bias_y` - multiplier of Y distances. It must be positive.
    pub fn with_bias(grid: &'a G, bias_x: f64, bias_y: f64) -> Self {
        debug_assert!(bias_x > 0.);
        debug_assert!(bias_y > 0.);
        Self {
            grid,
            bias_x,
            bias_y,
        }
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    fn distance(&self, a: Point, b: Point) -> f64 {
        let dx = f64::from(b.x - a.x) * self.bias_x;
        let dy = f64::from(b.y - a.y) * self.bias_y;
        dx.hypot(dy)
    }
}

impl<'a, G: Grid + ?Sized> SpatialGraph for GridGraph<'a, G> {
    fn contains(&self, point: Point) -> bool {
        self.grid.contains_point(point)
    }

    fn heuristic(&self, point: Point, goal: Point) -> f64 {
        self.distance(point, goal)
    }

    fn cost(&self, a: Point, b: Point) -> f64 {
        self.distance(a, b)
    }

    fn neighbours(&self, point: Point) -> ArrayVec<[Point; 8]> {
        let mut neighbours = ArrayVec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let candidate = Point::new(point.x + dx, point.y + dy);
                if self.grid.contains_point(candidate) && self.grid.line_of_sight(point, candidate)
                {
                    neighbours.push(candidate);
                }
            }
        }
        neighbours
    }

    fn line_of_sight(&self, a: Point, b: Point) -> bool {
        self.grid.line_of_sight(a, b)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pf_test_utils::grid_from_rows;

    use super::*;

    #[test]
    fn test_cost() {
        let grid = grid_from_rows(&["..", ".."]);

        let graph = GridGraph::new(&grid);
        assert_abs_diff_eq!(graph.cost(Point::new(0, 0), Point::new(2, 2)), 8f64.sqrt());
        assert_abs_diff_eq!(graph.heuristic(Point::new(2, 0), Point::new(0, 0)), 2.);

        let graph = GridGraph::with_bias(&grid, 2., 1.);
        assert_abs_diff_eq!(graph.cost(Point::new(0, 0), Point::new(1, 0)), 2.);
        assert_abs_diff_eq!(graph.cost(Point::new(0, 0), Point::new(0, 1)), 1.);
        assert_abs_diff_eq!(graph.cost(Point::new(0, 0), Point::new(1, 1)), 5f64.sqrt());
    }

    #[test]
    fn test_neighbours() {
        let grid = grid_from_rows(&["...", ".#.", "..."]);
        let graph = GridGraph::new(&grid);

        assert_eq!(
            graph.neighbours(Point::new(0, 0)).as_slice(),
            &[Point::new(0, 1), Point::new(1, 0), Point::new(1, 1)]
        );

        // The diagonal through the blocked cell is the only missing one.
        let neighbours = graph.neighbours(Point::new(1, 1));
        assert_eq!(neighbours.len(), 7);
        assert!(!neighbours.contains(&Point::new(2, 2)));
        assert!(neighbours.contains(&Point::new(2, 1)));
        assert!(neighbours.contains(&Point::new(1, 2)));

        let enclosed = grid_from_rows(&["##", "##"]);
        let graph = GridGraph::new(&enclosed);
        assert!(graph.neighbours(Point::new(1, 1)).is_empty());
        assert!(!graph.contains(Point::new(3, 0)));
    }
}
