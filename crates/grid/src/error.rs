use pf_geom::ObjectId;
use thiserror::Error;

use crate::GridType;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("grid {0} does not exist")]
    UnknownGrid(ObjectId),
    #[error("shape {0} does not exist")]
    UnknownShape(ObjectId),
    #[error("grid {id} is a {actual:?} grid, expected a {expected:?} grid")]
    WrongType {
        id: ObjectId,
        expected: GridType,
        actual: GridType,
    },
    #[error("grid of {width}×{height} cells does not fit into a union of {expected_width}×{expected_height} cells")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
    #[error("cell ({x}, {y}) is out of bounds of grid {id}")]
    OutOfBounds { id: ObjectId, x: u32, y: u32 },
    #[error("grid {0} is the root and cannot be removed")]
    RemoveRoot(ObjectId),
    #[error("grid {0} is the root and cannot be replaced")]
    ReplaceRoot(ObjectId),
    #[error("object {0} is already present in the grid tree")]
    Duplicate(ObjectId),
    #[error("grid {0} cannot be added under itself")]
    Cycle(ObjectId),
}
