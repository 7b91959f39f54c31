//! Best-first search over spatial graphs.

use std::{cmp::Ordering, collections::BinaryHeap};

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use pf_geom::Point;
use tracing::{debug, trace};

use crate::{finder::FinderType, graph::SpatialGraph, path::Path};

/// Finds a path from `start` to `goal` or returns `None` if the goal is not
/// reachable.
///
/// With [`FinderType::AStar`] the path follows graph edges. With
/// [`FinderType::ThetaStar`] consecutive way points are connected by any
/// segment with line of sight.
pub(crate) fn find_path<S: SpatialGraph + ?Sized>(
    graph: &S,
    strategy: FinderType,
    start: Point,
    goal: Point,
) -> Option<Path> {
    if !graph.contains(start) || !graph.contains(goal) {
        debug!("Path end point {start} or {goal} is outside of the graph");
        return None;
    }
    if start == goal {
        return Some(Path::stationary(start));
    }

    let mut nodes: AHashMap<Point, Node> = AHashMap::new();
    let mut closed = AHashSet::new();
    let mut open_set = OpenSet::new();

    nodes.insert(start, Node::new(0., None));
    open_set.push(start, 0., graph.heuristic(start, goal));

    while let Some(step) = open_set.pop() {
        let current = step.point();
        if !closed.insert(current) {
            continue;
        }

        if current == goal {
            trace!("Path search closed {} points", closed.len());
            return Some(reconstruct(graph, &nodes, goal));
        }

        let Some(&current_node) = nodes.get(&current) else {
            continue;
        };

        for neighbour in graph.neighbours(current) {
            if closed.contains(&neighbour) {
                continue;
            }

            let (parent, cost) = match (strategy, current_node.parent) {
                (FinderType::ThetaStar, Some(parent))
                    if graph.line_of_sight(parent, neighbour) =>
                {
                    let parent_cost = nodes.get(&parent).map_or(f64::INFINITY, |n| n.cost);
                    (parent, parent_cost + graph.cost(parent, neighbour))
                }
                _ => (current, current_node.cost + graph.cost(current, neighbour)),
            };

            let improved = nodes
                .get(&neighbour)
                .map_or(true, |known| cost < known.cost);
            if improved {
                nodes.insert(neighbour, Node::new(cost, Some(parent)));
                open_set.push(neighbour, cost, graph.heuristic(neighbour, goal));
            }
        }
    }

    debug!(
        "No path from {start} to {goal}, {} points explored",
        closed.len()
    );
    None
}

fn reconstruct<S: SpatialGraph + ?Sized>(
    graph: &S,
    nodes: &AHashMap<Point, Node>,
    goal: Point,
) -> Path {
    let mut waypoints = vec![goal];
    let mut point = goal;
    while let Some(parent) = nodes.get(&point).and_then(|node| node.parent) {
        waypoints.push(parent);
        point = parent;
    }
    waypoints.reverse();

    let cost = nodes.get(&goal).map_or(0., |node| node.cost);

    debug_assert!(
        (waypoints
            .windows(2)
            .map(|pair| graph.cost(pair[0], pair[1]))
            .sum::<f64>()
            - cost)
            .abs()
            < 1e-6
    );

    Path::new(cost, waypoints)
}

#[derive(Clone, Copy)]
struct Node {
    /// Cost of the best known path from the start.
    cost: f64,
    /// Predecessor on the best known path. It is `None` for the start.
    parent: Option<Point>,
}

impl Node {
    fn new(cost: f64, parent: Option<Point>) -> Self {
        Self { cost, parent }
    }
}

/// A priority queue of search steps.
///
/// Points are never removed or re-prioritized. Instead a point is pushed
/// again whenever a cheaper path to it is found and stale steps are skipped
/// by the search once the point is closed.
struct OpenSet {
    heap: BinaryHeap<Step>,
    counter: u64,
}

impl OpenSet {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            counter: 0,
        }
    }

    fn pop(&mut self) -> Option<Step> {
        self.heap.pop()
    }

    fn push(&mut self, point: Point, cost: f64, heuristic: f64) {
        self.heap
            .push(Step::new(cost + heuristic, heuristic, self.counter, point));
        self.counter += 1;
    }
}

/// A point waiting for expansion.
///
/// Steps are ordered so that the greatest step has the lowest estimated total
/// cost, ties are broken by the lowest heuristic and then by the earliest
/// push.
struct Step {
    score: OrderedFloat<f64>,
    heuristic: OrderedFloat<f64>,
    sequence: u64,
    point: Point,
}

impl Step {
    fn new(score: f64, heuristic: f64, sequence: u64, point: Point) -> Self {
        Self {
            score: OrderedFloat(score),
            heuristic: OrderedFloat(heuristic),
            sequence,
            point,
        }
    }

    fn point(&self) -> Point {
        self.point
    }
}

impl PartialEq for Step {
    fn eq(&self, other: &Step) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Step {}

impl PartialOrd for Step {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Step {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.score, other.heuristic, other.sequence).cmp(&(
            self.score,
            self.heuristic,
            self.sequence,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use approx::assert_abs_diff_eq;
    use ntest::timeout;
    use pf_grid::Grid;
    use pf_test_utils::grid_from_rows;
    use tinyvec::ArrayVec;

    use super::*;
    use crate::GridGraph;

    #[test]
    fn test_open_set() {
        let mut set = OpenSet::new();
        set.push(Point::new(1, 0), 1., 1.);
        set.push(Point::new(2, 0), 0.1, 1.);
        set.push(Point::new(3, 0), 3., 1.);
        set.push(Point::new(4, 0), 1.5, 0.5);
        set.push(Point::new(5, 0), 1.5, 0.5);
        assert_eq!(set.pop().unwrap().point(), Point::new(2, 0));
        assert_eq!(set.pop().unwrap().point(), Point::new(4, 0));
        assert_eq!(set.pop().unwrap().point(), Point::new(5, 0));
        assert_eq!(set.pop().unwrap().point(), Point::new(1, 0));
        assert_eq!(set.pop().unwrap().point(), Point::new(3, 0));
        assert!(set.pop().is_none());
    }

    #[test]
    fn test_step_ord() {
        let step_a = Step::new(2., 1., 0, Point::new(1, 1));
        let step_b = Step::new(2.1, 0., 1, Point::new(2, 2));
        assert!(step_b < step_a);

        let step_c = Step::new(2., 0.5, 2, Point::new(3, 3));
        assert!(step_a < step_c);

        let step_d = Step::new(2., 0.5, 3, Point::new(3, 3));
        assert!(step_d < step_c);
    }

    #[test]
    #[timeout(1000)]
    fn test_open_grid() {
        let grid = grid_from_rows(&["...", "...", "..."]);
        let graph = GridGraph::new(&grid);
        let start = Point::new(0, 0);
        let goal = Point::new(3, 3);

        let path = find_path(&graph, FinderType::AStar, start, goal).unwrap();
        assert_eq!(
            path.waypoints(),
            &[
                Point::new(0, 0),
                Point::new(1, 1),
                Point::new(2, 2),
                Point::new(3, 3)
            ]
        );
        assert_abs_diff_eq!(path.cost(), 18f64.sqrt(), epsilon = 1e-9);

        let path = find_path(&graph, FinderType::ThetaStar, start, goal).unwrap();
        assert_eq!(path.waypoints(), &[start, goal]);
        assert_abs_diff_eq!(path.cost(), 18f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    #[timeout(1000)]
    fn test_around_obstacle() {
        let grid = grid_from_rows(&["...", ".#.", "..."]);
        let graph = GridGraph::new(&grid);
        let start = Point::new(0, 0);
        let goal = Point::new(3, 3);

        let path = find_path(&graph, FinderType::AStar, start, goal).unwrap();
        assert_eq!(path.start(), start);
        assert_eq!(path.goal(), goal);
        assert_abs_diff_eq!(path.cost(), 2. + 2. * 2f64.sqrt(), epsilon = 1e-9);
        for pair in path.waypoints().windows(2) {
            assert!((pair[1].x - pair[0].x).abs() <= 1);
            assert!((pair[1].y - pair[0].y).abs() <= 1);
            assert!(grid.line_of_sight(pair[0], pair[1]));
        }

        let path = find_path(&graph, FinderType::ThetaStar, start, goal).unwrap();
        let waypoints = path.waypoints();
        assert_eq!(waypoints.len(), 3);
        assert_eq!(waypoints[0], start);
        assert_eq!(waypoints[2], goal);
        assert!(waypoints[1] == Point::new(1, 2) || waypoints[1] == Point::new(2, 1));
        assert!(grid.line_of_sight(waypoints[0], waypoints[1]));
        assert!(grid.line_of_sight(waypoints[1], waypoints[2]));
        assert_abs_diff_eq!(path.cost(), 2. * 5f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    #[timeout(1000)]
    fn test_theta_shortcut() {
        let grid = grid_from_rows(&[
            "........",
            "........",
            "........",
            "........",
        ]);
        let graph = GridGraph::new(&grid);

        let path = find_path(
            &graph,
            FinderType::ThetaStar,
            Point::new(0, 0),
            Point::new(8, 3),
        )
        .unwrap();
        assert_eq!(path.waypoints(), &[Point::new(0, 0), Point::new(8, 3)]);
        assert_abs_diff_eq!(path.length(), 73f64.sqrt(), epsilon = 1e-9);

        let path = find_path(&graph, FinderType::AStar, Point::new(0, 0), Point::new(8, 3)).unwrap();
        assert_abs_diff_eq!(path.cost(), 5. + 3. * 2f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    #[timeout(1000)]
    fn test_unreachable() {
        let grid = grid_from_rows(&[
            ".....",
            ".##..",
            ".##..",
            ".....",
        ]);
        let graph = GridGraph::new(&grid);

        for strategy in [FinderType::AStar, FinderType::ThetaStar] {
            assert!(find_path(&graph, strategy, Point::new(0, 0), Point::new(2, 2)).is_none());
            assert!(find_path(&graph, strategy, Point::new(2, 2), Point::new(0, 0)).is_none());
            assert!(find_path(&graph, strategy, Point::new(0, 0), Point::new(6, 0)).is_none());
            assert!(find_path(&graph, strategy, Point::new(-1, 0), Point::new(0, 0)).is_none());
        }
    }

    #[test]
    fn test_same_point() {
        let grid = grid_from_rows(&["..", ".."]);
        let graph = GridGraph::new(&grid);
        let path = find_path(&graph, FinderType::ThetaStar, Point::new(1, 1), Point::new(1, 1))
            .unwrap();
        assert_eq!(path.waypoints(), &[Point::new(1, 1)]);
        assert_eq!(path.cost(), 0.);
    }

    #[test]
    #[timeout(1000)]
    fn test_bias() {
        let grid = grid_from_rows(&[
            "...",
            ".#.",
            "...",
        ]);

        let graph = GridGraph::with_bias(&grid, 4., 1.);
        let path = find_path(&graph, FinderType::AStar, Point::new(0, 0), Point::new(3, 0)).unwrap();
        assert_abs_diff_eq!(path.cost(), 12., epsilon = 1e-9);
        assert!(path.waypoints().iter().all(|p| p.y == 0));

        let path =
            find_path(&graph, FinderType::ThetaStar, Point::new(0, 0), Point::new(3, 0)).unwrap();
        assert_eq!(path.waypoints(), &[Point::new(0, 0), Point::new(3, 0)]);
        assert_abs_diff_eq!(path.cost(), 12., epsilon = 1e-9);
    }

    struct CountingGraph<'a, S> {
        inner: &'a S,
        expansions: Cell<usize>,
    }

    impl<'a, S: SpatialGraph> SpatialGraph for CountingGraph<'a, S> {
        fn contains(&self, point: Point) -> bool {
            self.inner.contains(point)
        }

        fn heuristic(&self, point: Point, goal: Point) -> f64 {
            self.inner.heuristic(point, goal)
        }

        fn cost(&self, a: Point, b: Point) -> f64 {
            self.inner.cost(a, b)
        }

        fn neighbours(&self, point: Point) -> ArrayVec<[Point; 8]> {
            self.expansions.set(self.expansions.get() + 1);
            self.inner.neighbours(point)
        }

        fn line_of_sight(&self, a: Point, b: Point) -> bool {
            self.inner.line_of_sight(a, b)
        }
    }

    #[test]
    #[timeout(1000)]
    fn test_closed_points_expanded_once() {
        let grid = grid_from_rows(&[
            ".....",
            ".##..",
            ".##..",
            ".....",
        ]);
        let inner = GridGraph::new(&grid);
        let graph = CountingGraph {
            inner: &inner,
            expansions: Cell::new(0),
        };

        // (2, 2) is walled off, all other 29 points get expanded exactly once.
        for strategy in [FinderType::AStar, FinderType::ThetaStar] {
            graph.expansions.set(0);
            assert!(find_path(&graph, strategy, Point::new(0, 0), Point::new(2, 2)).is_none());
            assert_eq!(graph.expansions.get(), 29);
        }

        graph.expansions.set(0);
        let path = find_path(&graph, FinderType::AStar, Point::new(1, 1), Point::new(1, 1));
        assert_eq!(path, Some(Path::stationary(Point::new(1, 1))));
        assert_eq!(graph.expansions.get(), 0);
    }

    #[test]
    #[timeout(1000)]
    fn test_cost_of_waypoints() {
        let grid = grid_from_rows(&[
            "......",
            "..##..",
            "..##..",
            "......",
        ]);
        let graph = GridGraph::with_bias(&grid, 1.5, 0.5);

        for strategy in [FinderType::AStar, FinderType::ThetaStar] {
            let path = find_path(&graph, strategy, Point::new(0, 2), Point::new(6, 2)).unwrap();
            let cost: f64 = path
                .waypoints()
                .windows(2)
                .map(|pair| graph.cost(pair[0], pair[1]))
                .sum();
            assert_abs_diff_eq!(path.cost(), cost, epsilon = 1e-9);
        }
    }
}
