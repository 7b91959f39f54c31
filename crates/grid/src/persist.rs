//! JSON representation of the grid hierarchy and the robot footprint.
//!
//! Grid dimensions are not stored in the document, they are derived from the
//! field when the document is decoded.

use std::sync::Arc;

use glam::DVec2;
use pf_geom::{
    Circle, Field, Footprint, FootprintError, ObjectId, Rectangle, Shape, ShapeKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Bitfield, BitfieldGrid, FieldContext, Grid, GridError, GridNode, GridUnion, ShapeGrid,
};

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("invalid grids document")]
    Json(#[from] serde_json::Error),
    #[error("invalid bitfield encoding")]
    Base64(#[from] base64::DecodeError),
    #[error("bitfield holds {actual} cells, expected {expected}")]
    CellCount { expected: usize, actual: usize },
    #[error("invalid robot footprint")]
    Footprint(#[from] FootprintError),
    #[error("invalid grid hierarchy")]
    Grid(#[from] GridError),
}

/// Grids restored from a document.
pub struct DecodedGrids {
    pub context: Arc<FieldContext>,
    pub grids: Vec<GridNode>,
}

/// Serializes the robot footprint and top-level grids to a pretty printed
/// JSON document.
pub fn encode_grids(footprint: &Footprint, grids: &[GridNode]) -> Result<String, PersistError> {
    let document = GridsDocument {
        robot: ShapeDocument::from(&footprint.to_shape()),
        grids: grids.iter().map(GridDocument::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Restores the robot footprint and top-level grids from a JSON document.
/// All grids span the whole field.
pub fn decode_grids(text: &str, field: &Field) -> Result<DecodedGrids, PersistError> {
    let document: GridsDocument = serde_json::from_str(text)?;
    let footprint = Footprint::try_from(document.robot.into_shape())?;
    let decode_context = DecodeContext {
        width: field.cells_x(),
        height: field.cells_y(),
        context: Arc::new(FieldContext::new(*field, footprint)),
    };

    let grids = document
        .grids
        .into_iter()
        .map(|grid| grid.decode(&decode_context))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedGrids {
        context: decode_context.context,
        grids,
    })
}

/// Encodes cells as URL-safe base64 of the big-endian 32-bit cell count
/// followed by the packed bits.
pub fn encode_bits(cells: &Bitfield) -> String {
    let count = cells.width() * cells.height();
    let mut bytes = count.to_be_bytes().to_vec();
    bytes.extend(cells.to_bytes());
    base64::encode_config(bytes, base64::URL_SAFE)
}

pub fn decode_bits(width: u32, height: u32, text: &str) -> Result<Bitfield, PersistError> {
    let bytes = base64::decode_config(text, base64::URL_SAFE)?;
    let expected = width as usize * height as usize;
    if bytes.len() < 4 {
        return Err(PersistError::CellCount {
            expected,
            actual: 0,
        });
    }

    let (count, bits) = bytes.split_at(4);
    let actual = u32::from_be_bytes([count[0], count[1], count[2], count[3]]) as usize;
    if actual != expected {
        return Err(PersistError::CellCount { expected, actual });
    }

    Bitfield::from_bytes(width, height, bits).ok_or(PersistError::CellCount {
        expected,
        actual: bits.len() * 8,
    })
}

struct DecodeContext {
    width: u32,
    height: u32,
    context: Arc<FieldContext>,
}

#[derive(Serialize, Deserialize)]
struct GridsDocument {
    robot: ShapeDocument,
    grids: Vec<GridDocument>,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
enum GridDocument {
    Union {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        children: Vec<GridDocument>,
    },
    Bitfield {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        data: String,
    },
    Shape {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        shapes: Vec<ShapeDocument>,
    },
}

impl GridDocument {
    fn decode(self, ctx: &DecodeContext) -> Result<GridNode, PersistError> {
        let node = match self {
            Self::Union { id, children } => {
                let mut union = GridUnion::new(id_or_random(id), ctx.width, ctx.height);
                for child in children {
                    union.add_grid(child.decode(ctx)?)?;
                }
                GridNode::Union(union)
            }
            Self::Bitfield { id, data } => {
                let cells = decode_bits(ctx.width, ctx.height, &data)?;
                GridNode::Bitfield(BitfieldGrid::from_bitfield(id_or_random(id), cells))
            }
            Self::Shape { id, shapes } => {
                let mut grid = ShapeGrid::new(
                    id_or_random(id),
                    ctx.width,
                    ctx.height,
                    Arc::clone(&ctx.context),
                );
                for shape in shapes {
                    grid.add_shape(shape.into_shape());
                }
                GridNode::Shape(grid)
            }
        };
        Ok(node)
    }
}

impl From<&GridNode> for GridDocument {
    fn from(node: &GridNode) -> Self {
        match node {
            GridNode::Union(union) => Self::Union {
                id: Some(union.id()),
                children: union.children().iter().map(Self::from).collect(),
            },
            GridNode::Bitfield(grid) => Self::Bitfield {
                id: Some(grid.id()),
                data: encode_bits(grid.cells()),
            },
            GridNode::Shape(grid) => Self::Shape {
                id: Some(grid.id()),
                shapes: grid.shapes().iter().map(ShapeDocument::from).collect(),
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
enum ShapeDocument {
    Circle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        #[serde(default)]
        inverted: bool,
        x: f64,
        y: f64,
        radius: f64,
    },
    Rectangle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        #[serde(default)]
        inverted: bool,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rotation: f64,
    },
}

impl ShapeDocument {
    fn into_shape(self) -> Shape {
        match self {
            Self::Circle {
                id,
                inverted,
                x,
                y,
                radius,
            } => Shape::new(
                id_or_random(id),
                inverted,
                ShapeKind::Circle(Circle::new(DVec2::new(x, y), radius)),
            ),
            Self::Rectangle {
                id,
                inverted,
                x,
                y,
                width,
                height,
                rotation,
            } => Shape::new(
                id_or_random(id),
                inverted,
                ShapeKind::Rectangle(Rectangle::new(
                    DVec2::new(x, y),
                    DVec2::new(width, height),
                    rotation,
                )),
            ),
        }
    }
}

impl From<&Shape> for ShapeDocument {
    fn from(shape: &Shape) -> Self {
        let id = Some(shape.id());
        let inverted = shape.inverted();
        match shape.kind() {
            ShapeKind::Circle(circle) => Self::Circle {
                id,
                inverted,
                x: circle.center().x,
                y: circle.center().y,
                radius: circle.radius(),
            },
            ShapeKind::Rectangle(rectangle) => Self::Rectangle {
                id,
                inverted,
                x: rectangle.center().x,
                y: rectangle.center().y,
                width: rectangle.size().x,
                height: rectangle.size().y,
                rotation: rectangle.rotation(),
            },
        }
    }
}

fn id_or_random(id: Option<ObjectId>) -> ObjectId {
    id.unwrap_or_else(ObjectId::random)
}
