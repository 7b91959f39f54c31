//! Collider shapes rasterized into shape grids.

use glam::DVec2;
use thiserror::Error;

use crate::{collision, ObjectId};

/// Stable type discriminator of shapes. The IDs are shared by the message
/// protocol and the persistence format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ShapeType {
    Circle = 0,
    Rectangle = 1,
}

impl ShapeType {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Circle),
            1 => Some(Self::Rectangle),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// A collider placed on the field.
///
/// Ordinary shapes are obstacles to be avoided. Inverted shapes express a
/// region the robot must remain inside.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    id: ObjectId,
    inverted: bool,
    kind: ShapeKind,
}

impl Shape {
    pub fn new(id: ObjectId, inverted: bool, kind: ShapeKind) -> Self {
        Self { id, inverted, kind }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn shape_type(&self) -> ShapeType {
        match self.kind {
            ShapeKind::Circle(_) => ShapeType::Circle,
            ShapeKind::Rectangle(_) => ShapeType::Rectangle,
        }
    }

    /// Returns true if the robot footprint placed at `position` (in metres)
    /// collides with the shape, i.e. the position is not allowed.
    pub fn collides_with(&self, footprint: &Footprint, position: DVec2) -> bool {
        let probe = footprint.circle().offset(position);
        match self.kind {
            ShapeKind::Circle(ref circle) => {
                collision::circle_blocks(circle, self.inverted, &probe)
            }
            ShapeKind::Rectangle(ref rectangle) => {
                collision::rectangle_blocks(rectangle, self.inverted, &probe)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Circle(Circle),
    Rectangle(Rectangle),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    center: DVec2,
    radius: f64,
}

impl Circle {
    pub fn new(center: DVec2, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the circle translated by `offset`.
    pub(crate) fn offset(&self, offset: DVec2) -> Self {
        Self::new(self.center + offset, self.radius)
    }
}

/// A rotated rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    center: DVec2,
    size: DVec2,
    rotation: f64,
}

impl Rectangle {
    /// # Arguments
    ///
    /// * `center` - center of the rectangle in metres.
    ///
    /// * `size` - full width and height of the rectangle in metres.
    ///
    /// * `rotation` - counter-clockwise rotation around the center in radians.
    pub fn new(center: DVec2, size: DVec2, rotation: f64) -> Self {
        Self {
            center,
            size,
            rotation,
        }
    }

    pub fn center(&self) -> DVec2 {
        self.center
    }

    pub fn size(&self) -> DVec2 {
        self.size
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub(crate) fn half_extents(&self) -> DVec2 {
        0.5 * self.size
    }

    /// Transforms a point in metres to the local (unrotated, centered) frame
    /// of the rectangle.
    pub(crate) fn to_local(&self, point: DVec2) -> DVec2 {
        DVec2::from_angle(-self.rotation).rotate(point - self.center)
    }
}

/// The robot's own physical extent used as the probe of all collision
/// checks.
///
/// Center of the footprint circle is an offset from the probed position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    id: ObjectId,
    circle: Circle,
}

impl Footprint {
    pub fn new(id: ObjectId, circle: Circle) -> Self {
        Self { id, circle }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn circle(&self) -> &Circle {
        &self.circle
    }

    pub fn radius(&self) -> f64 {
        self.circle.radius()
    }

    /// Returns the footprint expressed as an ordinary shape.
    pub fn to_shape(&self) -> Shape {
        Shape::new(self.id, false, ShapeKind::Circle(self.circle))
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Self::new(ObjectId::random(), Circle::new(DVec2::ZERO, 0.5))
    }
}

impl TryFrom<Shape> for Footprint {
    type Error = FootprintError;

    fn try_from(shape: Shape) -> Result<Self, Self::Error> {
        if shape.inverted {
            return Err(FootprintError::Inverted);
        }
        match shape.kind {
            ShapeKind::Circle(circle) => Ok(Self::new(shape.id, circle)),
            ShapeKind::Rectangle(_) => Err(FootprintError::NotCircle),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FootprintError {
    #[error("robot footprint must be a circle")]
    NotCircle,
    #[error("robot footprint must not be inverted")]
    Inverted,
}
