//! This crate implements passability grids of the field.
//!
//! There are three kinds of grids: [`BitfieldGrid`] with directly mutable
//! cells, [`ShapeGrid`] rasterized from collider shapes and [`GridUnion`]
//! combining other grids. Any grid answers line of sight queries between its
//! lattice points, results are memoized per grid.
//!
//! The whole hierarchy is owned by [`GridTree`] which addresses grids and
//! shapes by their IDs and keeps line of sight caches consistent with grid
//! content.

pub use bitfield::{Bitfield, BitfieldGrid};
pub use error::GridError;
pub use grid::{Grid, GridType};
pub use node::GridNode;
pub use persist::{
    decode_bits, decode_grids, encode_bits, encode_grids, DecodedGrids, PersistError,
};
pub use shape::{FieldContext, ShapeGrid};
pub use sight::{LineOfSightCache, SightCache, MAX_SIGHT_POINTS};
pub use tree::GridTree;
pub use union::GridUnion;

mod bitfield;
mod error;
mod grid;
mod node;
mod persist;
mod shape;
mod sight;
mod tree;
mod union;
