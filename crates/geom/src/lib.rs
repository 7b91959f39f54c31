//! This crate implements the geometric foundation of the pathfinder: lattice
//! points, conversion between field cells and metres, object identities and
//! the collider shapes which are rasterized into passability grids.
//!
//! It has no dependency on grids or searching so it can be shared by the
//! persistence and messaging layers.

pub use field::Field;
pub use id::{IdParseError, ObjectId};
pub use point::Point;
pub use shape::{Circle, Footprint, FootprintError, Rectangle, Shape, ShapeKind, ShapeType};

mod collision;
mod field;
mod id;
mod point;
mod shape;
