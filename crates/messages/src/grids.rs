use bincode::{
    de::{BorrowDecoder, Decoder},
    enc::Encoder,
    error::{DecodeError, EncodeError},
    BorrowDecode, Decode, Encode,
};
use glam::DVec2;
use pf_geom::{Circle, ObjectId, Rectangle, Shape, ShapeKind, ShapeType};
use pf_grid::{Bitfield, Grid, GridNode, GridType, GridUnion};

use crate::net::{ObjectIdNet, SeqNet};

/// Geometry of a shape preceded by its [`ShapeType`] ID.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShapeDataNet {
    Circle {
        x: f64,
        y: f64,
        radius: f64,
    },
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rotation: f64,
    },
}

impl From<&ShapeKind> for ShapeDataNet {
    fn from(kind: &ShapeKind) -> Self {
        match kind {
            ShapeKind::Circle(circle) => Self::Circle {
                x: circle.center().x,
                y: circle.center().y,
                radius: circle.radius(),
            },
            ShapeKind::Rectangle(rectangle) => Self::Rectangle {
                x: rectangle.center().x,
                y: rectangle.center().y,
                width: rectangle.size().x,
                height: rectangle.size().y,
                rotation: rectangle.rotation(),
            },
        }
    }
}

impl From<ShapeDataNet> for ShapeKind {
    fn from(data: ShapeDataNet) -> Self {
        match data {
            ShapeDataNet::Circle { x, y, radius } => {
                Self::Circle(Circle::new(DVec2::new(x, y), radius))
            }
            ShapeDataNet::Rectangle {
                x,
                y,
                width,
                height,
                rotation,
            } => Self::Rectangle(Rectangle::new(
                DVec2::new(x, y),
                DVec2::new(width, height),
                rotation,
            )),
        }
    }
}

impl Encode for ShapeDataNet {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        match *self {
            Self::Circle { x, y, radius } => {
                ShapeType::Circle.id().encode(encoder)?;
                (x, y, radius).encode(encoder)
            }
            Self::Rectangle {
                x,
                y,
                width,
                height,
                rotation,
            } => {
                ShapeType::Rectangle.id().encode(encoder)?;
                (x, y, width, height, rotation).encode(encoder)
            }
        }
    }
}

impl Decode for ShapeDataNet {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        let shape_type = ShapeType::from_id(u8::decode(decoder)?)
            .ok_or(DecodeError::Other("unknown shape type"))?;
        Ok(match shape_type {
            ShapeType::Circle => {
                let (x, y, radius) = Decode::decode(decoder)?;
                Self::Circle { x, y, radius }
            }
            ShapeType::Rectangle => {
                let (x, y, width, height, rotation) = Decode::decode(decoder)?;
                Self::Rectangle {
                    x,
                    y,
                    width,
                    height,
                    rotation,
                }
            }
        })
    }
}

impl<'de> BorrowDecode<'de> for ShapeDataNet {
    fn borrow_decode<D: BorrowDecoder<'de>>(decoder: &mut D) -> Result<Self, DecodeError> {
        Self::decode(decoder)
    }
}

/// A complete shape: ID, polarity and geometry.
#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct ShapeNet {
    id: ObjectIdNet,
    inverted: bool,
    data: ShapeDataNet,
}

impl ShapeNet {
    pub fn id(&self) -> ObjectId {
        self.id.into()
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn data(&self) -> ShapeDataNet {
        self.data
    }
}

impl From<&Shape> for ShapeNet {
    fn from(shape: &Shape) -> Self {
        Self {
            id: shape.id().into(),
            inverted: shape.inverted(),
            data: shape.kind().into(),
        }
    }
}

impl From<ShapeNet> for Shape {
    fn from(shape: ShapeNet) -> Self {
        Shape::new(shape.id.into(), shape.inverted, shape.data.into())
    }
}

/// Cells of a grid as words of a Java `BitSet`.
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct BitfieldNet {
    width: i32,
    height: i32,
    words: SeqNet<u64>,
}

impl BitfieldNet {
    /// Returns the decoded cells or `None` if the dimensions are negative.
    pub fn to_bitfield(&self) -> Option<Bitfield> {
        let width = u32::try_from(self.width).ok()?;
        let height = u32::try_from(self.height).ok()?;
        Some(Bitfield::from_words(width, height, self.words.items()))
    }
}

impl From<&Bitfield> for BitfieldNet {
    fn from(cells: &Bitfield) -> Self {
        Self {
            width: cells.width() as i32,
            height: cells.height() as i32,
            words: cells.to_words().into(),
        }
    }
}

/// Maximum depth of a decoded grid below the top-level grid.
pub const MAX_GRID_DEPTH: usize = 32;

/// A grid with all its descendants.
#[derive(Clone, Debug, PartialEq)]
pub struct GridNet {
    id: ObjectIdNet,
    content: GridContentNet,
}

impl GridNet {
    pub fn id(&self) -> ObjectId {
        self.id.into()
    }

    pub fn content(&self) -> &GridContentNet {
        &self.content
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GridContentNet {
    Union(SeqNet<GridNet>),
    Bitfield(BitfieldNet),
    Shape(SeqNet<ShapeNet>),
}

impl GridContentNet {
    pub fn grid_type(&self) -> GridType {
        match self {
            Self::Union(_) => GridType::Union,
            Self::Bitfield(_) => GridType::Bitfield,
            Self::Shape(_) => GridType::Shape,
        }
    }
}

impl From<&GridUnion> for GridNet {
    fn from(union: &GridUnion) -> Self {
        Self {
            id: union.id().into(),
            content: GridContentNet::Union(union.children().iter().map(GridNet::from).collect()),
        }
    }
}

impl From<&GridNode> for GridNet {
    fn from(node: &GridNode) -> Self {
        let content = match node {
            GridNode::Union(union) => return union.into(),
            GridNode::Bitfield(grid) => GridContentNet::Bitfield(grid.cells().into()),
            GridNode::Shape(grid) => {
                GridContentNet::Shape(grid.shapes().iter().map(ShapeNet::from).collect())
            }
        };
        Self {
            id: node.id().into(),
            content,
        }
    }
}

impl Encode for GridNet {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.id.encode(encoder)?;
        self.content.grid_type().id().encode(encoder)?;
        match self.content {
            GridContentNet::Union(ref children) => children.encode(encoder),
            GridContentNet::Bitfield(ref cells) => cells.encode(encoder),
            GridContentNet::Shape(ref shapes) => shapes.encode(encoder),
        }
    }
}

impl Decode for GridNet {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        decode_grid(decoder, 0)
    }
}

fn decode_grid<D: Decoder>(decoder: &mut D, depth: usize) -> Result<GridNet, DecodeError> {
    if depth > MAX_GRID_DEPTH {
        return Err(DecodeError::Other("grids are nested too deeply"));
    }

    let id = ObjectIdNet::decode(decoder)?;
    let grid_type = GridType::from_id(u8::decode(decoder)?)
        .ok_or(DecodeError::Other("unknown grid type"))?;
    let content = match grid_type {
        GridType::Union => {
            let len = i32::decode(decoder)?;
            let len =
                usize::try_from(len).map_err(|_| DecodeError::Other("negative sequence length"))?;
            let mut children = Vec::with_capacity(len.min(1024));
            for _ in 0..len {
                children.push(decode_grid(decoder, depth + 1)?);
            }
            GridContentNet::Union(children.into())
        }
        GridType::Bitfield => GridContentNet::Bitfield(Decode::decode(decoder)?),
        GridType::Shape => GridContentNet::Shape(Decode::decode(decoder)?),
    };
    Ok(GridNet { id, content })
}

impl<'de> BorrowDecode<'de> for GridNet {
    fn borrow_decode<D: BorrowDecoder<'de>>(decoder: &mut D) -> Result<Self, DecodeError> {
        Self::decode(decoder)
    }
}
