//! This module contains the stateful path finder.

use pf_geom::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{graph::SpatialGraph, path::Path, search::find_path};

/// Path search strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinderType {
    /// Paths follow the edges of the 8-connected lattice.
    AStar,
    /// Paths connect any two points with line of sight.
    #[default]
    ThetaStar,
}

/// Outcome of the latest search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    /// Start or goal is not set.
    Idle,
    /// Start, goal or the graph changed since the last search.
    Pending,
    Found,
    Unreachable,
}

/// A struct used for path finding between a start and a goal which change
/// over time.
///
/// The last found path is cached and searching is repeated only after the
/// start, the goal or the searched graph changed.
pub struct Pathfinder {
    finder_type: FinderType,
    start: Option<Point>,
    goal: Option<Point>,
    path: Option<Path>,
    dirty: bool,
}

impl Pathfinder {
    pub fn new(finder_type: FinderType) -> Self {
        Self {
            finder_type,
            start: None,
            goal: None,
            path: None,
            dirty: true,
        }
    }

    pub fn finder_type(&self) -> FinderType {
        self.finder_type
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn goal(&self) -> Option<Point> {
        self.goal
    }

    pub fn set_start(&mut self, start: Point) {
        debug!("Path start set to {start}");
        self.start = Some(start);
        self.dirty = true;
    }

    pub fn set_goal(&mut self, goal: Point) {
        debug!("Path goal set to {goal}");
        self.goal = Some(goal);
        self.dirty = true;
    }

    /// Forces a new search on the next call to [`Self::find_path`]. It must
    /// be called after every change of the searched graph.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn state(&self) -> SearchState {
        if self.start.is_none() || self.goal.is_none() {
            SearchState::Idle
        } else if self.dirty {
            SearchState::Pending
        } else if self.path.is_some() {
            SearchState::Found
        } else {
            SearchState::Unreachable
        }
    }

    /// Returns the last found path. It may be outdated, see
    /// [`Self::is_dirty`].
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Returns a shortest path from the start to the goal.
    ///
    /// The search runs only if something changed since the last call,
    /// otherwise the cached result is returned. Returns `None` if the start
    /// or the goal is not set or the goal is unreachable.
    pub fn find_path<S: SpatialGraph + ?Sized>(&mut self, graph: &S) -> Option<&Path> {
        if self.dirty {
            self.dirty = false;
            self.path = match (self.start, self.goal) {
                (Some(start), Some(goal)) => {
                    info!(
                        "Finding {:?} path from {start} to {goal}",
                        self.finder_type
                    );
                    find_path(graph, self.finder_type, start, goal)
                }
                _ => None,
            };
        }
        self.path.as_ref()
    }
}
