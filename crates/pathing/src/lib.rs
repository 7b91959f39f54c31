//! This library implements path finding on the lattice points of
//! passability grids.
//!
//! [`GridGraph`] exposes any [`pf_grid::Grid`] as a search graph and
//! [`Pathfinder`] searches it with either A* (8-connected moves) or Theta*
//! (any angle moves between points with line of sight).

mod finder;
mod graph;
mod path;
mod search;

pub use finder::{FinderType, Pathfinder, SearchState};
pub use graph::{GridGraph, SpatialGraph};
pub use path::Path;
