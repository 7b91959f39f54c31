use bincode::{
    error::{DecodeError, EncodeError},
    Decode, Encode,
};
use glam::DVec2;
use pf_geom::ObjectId;
use thiserror::Error;

use crate::{
    frame::Frame,
    grids::{BitfieldNet, GridNet, ShapeDataNet, ShapeNet},
    net::{decode_payload, encode_payload, ObjectIdNet, SeqNet, StrNet, Vec2Net},
};

pub const SET_POS: &str = "Pathfinder:SetPos";
pub const SET_GOAL: &str = "Pathfinder:SetGoal";
pub const PATH: &str = "Pathfinder:Path";
pub const GET_FIELD_INFO: &str = "Pathfinder:GetFieldInfo";
pub const GET_GRIDS: &str = "Pathfinder:GetGrids";
pub const GET_CELL_DATA: &str = "Pathfinder:GetCellData";
pub const GET_ROBOT_SHAPE: &str = "Pathfinder:GetRobotShape";
pub const ADD_GRID: &str = "Pathfinder:AddGrid";
pub const REMOVE_GRID: &str = "Pathfinder:RemoveGrid";
pub const ADD_SHAPE: &str = "Pathfinder:AddShape";
pub const ALTER_SHAPE: &str = "Pathfinder:AlterShape";
pub const REMOVE_SHAPE: &str = "Pathfinder:RemoveShape";
pub const FIELD_INFO: &str = "Pathfinder:FieldInfo";
pub const GRIDS: &str = "Pathfinder:Grids";
pub const CELL_DATA: &str = "Pathfinder:CellData";
pub const ROBOT_SHAPE: &str = "Pathfinder:RobotShape";

pub const LISTEN: &str = "_Listen";
pub const HEARTBEAT: &str = "_Heartbeat";
pub const DISCONNECT: &str = "_Disconnect";

/// Message to be received by the pathfinder.
#[derive(Debug, PartialEq)]
pub enum ToPathfinder {
    /// Sets the start of the path to a position in metres.
    SetPos(DVec2),
    /// Sets the goal of the path to a position in metres.
    SetGoal(DVec2),
    GetFieldInfo,
    GetGrids,
    GetCellData,
    GetRobotShape,
    /// Adds a new empty grid to a grid union. The ID is chosen by the sender
    /// so that it can address the grid later.
    AddGrid {
        parent: ObjectId,
        id: ObjectId,
        /// Raw [`pf_grid::GridType`] ID.
        grid_type: u8,
    },
    RemoveGrid(ObjectId),
    /// Adds a shape to a shape grid. The ID is chosen by the sender.
    AddShape {
        parent: ObjectId,
        id: ObjectId,
        inverted: bool,
        data: ShapeDataNet,
    },
    /// Replaces an existing shape, the shape stays in the same grid.
    AlterShape {
        id: ObjectId,
        inverted: bool,
        data: ShapeDataNet,
    },
    RemoveShape(ObjectId),
}

impl ToPathfinder {
    /// Names of all messages handled by the pathfinder.
    pub const NAMES: [&'static str; 11] = [
        SET_POS,
        SET_GOAL,
        GET_FIELD_INFO,
        GET_GRIDS,
        GET_CELL_DATA,
        GET_ROBOT_SHAPE,
        ADD_GRID,
        REMOVE_GRID,
        ADD_SHAPE,
        ALTER_SHAPE,
        REMOVE_SHAPE,
    ];

    /// Decodes a frame received from the message bus.
    ///
    /// Returns `Ok(None)` for frames not addressed to the pathfinder.
    pub fn decode(frame: &Frame) -> Result<Option<Self>, MessageError> {
        let data = frame.data();
        let message = match frame.name() {
            SET_POS => Self::SetPos(decode_payload::<Vec2Net>(data)?.into()),
            SET_GOAL => Self::SetGoal(decode_payload::<Vec2Net>(data)?.into()),
            GET_FIELD_INFO => Self::GetFieldInfo,
            GET_GRIDS => Self::GetGrids,
            GET_CELL_DATA => Self::GetCellData,
            GET_ROBOT_SHAPE => Self::GetRobotShape,
            ADD_GRID => {
                let (parent, id, grid_type): (ObjectIdNet, ObjectIdNet, u8) =
                    decode_payload(data)?;
                Self::AddGrid {
                    parent: parent.into(),
                    id: id.into(),
                    grid_type,
                }
            }
            REMOVE_GRID => Self::RemoveGrid(decode_payload::<ObjectIdNet>(data)?.into()),
            ADD_SHAPE => {
                let (parent, id, inverted, data): (ObjectIdNet, ObjectIdNet, bool, ShapeDataNet) =
                    decode_payload(data)?;
                Self::AddShape {
                    parent: parent.into(),
                    id: id.into(),
                    inverted,
                    data,
                }
            }
            ALTER_SHAPE => {
                let (id, inverted, data): (ObjectIdNet, bool, ShapeDataNet) =
                    decode_payload(data)?;
                Self::AlterShape {
                    id: id.into(),
                    inverted,
                    data,
                }
            }
            REMOVE_SHAPE => Self::RemoveShape(decode_payload::<ObjectIdNet>(data)?.into()),
            _ => return Ok(None),
        };
        Ok(Some(message))
    }

    /// Encodes the message into a frame. This is used by clients of the
    /// pathfinder.
    pub fn to_frame(&self) -> Result<Frame, MessageError> {
        let frame = match *self {
            Self::SetPos(position) => Frame::new(SET_POS, encode_payload(&Vec2Net::from(position))?),
            Self::SetGoal(position) => {
                Frame::new(SET_GOAL, encode_payload(&Vec2Net::from(position))?)
            }
            Self::GetFieldInfo => Frame::empty(GET_FIELD_INFO),
            Self::GetGrids => Frame::empty(GET_GRIDS),
            Self::GetCellData => Frame::empty(GET_CELL_DATA),
            Self::GetRobotShape => Frame::empty(GET_ROBOT_SHAPE),
            Self::AddGrid {
                parent,
                id,
                grid_type,
            } => Frame::new(
                ADD_GRID,
                encode_payload(&(ObjectIdNet::from(parent), ObjectIdNet::from(id), grid_type))?,
            ),
            Self::RemoveGrid(id) => Frame::new(REMOVE_GRID, encode_payload(&ObjectIdNet::from(id))?),
            Self::AddShape {
                parent,
                id,
                inverted,
                data,
            } => Frame::new(
                ADD_SHAPE,
                encode_payload(&(
                    ObjectIdNet::from(parent),
                    ObjectIdNet::from(id),
                    inverted,
                    data,
                ))?,
            ),
            Self::AlterShape { id, inverted, data } => Frame::new(
                ALTER_SHAPE,
                encode_payload(&(ObjectIdNet::from(id), inverted, data))?,
            ),
            Self::RemoveShape(id) => {
                Frame::new(REMOVE_SHAPE, encode_payload(&ObjectIdNet::from(id))?)
            }
        };
        Ok(frame)
    }
}

/// Message to be sent by the pathfinder.
#[derive(Debug, PartialEq)]
pub enum FromPathfinder {
    /// The latest path in metres, start first, or `None` if the goal is not
    /// reachable.
    Path(Option<Vec<DVec2>>),
    FieldInfo(FieldInfoNet),
    Grids(GridNet),
    /// Passability of all cells of the field.
    CellData(BitfieldNet),
    RobotShape(ShapeNet),
}

impl FromPathfinder {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Path(_) => PATH,
            Self::FieldInfo(_) => FIELD_INFO,
            Self::Grids(_) => GRIDS,
            Self::CellData(_) => CELL_DATA,
            Self::RobotShape(_) => ROBOT_SHAPE,
        }
    }

    pub fn to_frame(&self) -> Result<Frame, MessageError> {
        let data = match self {
            Self::Path(path) => {
                let path: Option<SeqNet<Vec2Net>> = path
                    .as_ref()
                    .map(|points| points.iter().map(|&p| Vec2Net::from(p)).collect());
                encode_payload(&path)?
            }
            Self::FieldInfo(info) => encode_payload(info)?,
            Self::Grids(grids) => encode_payload(grids)?,
            Self::CellData(cells) => encode_payload(cells)?,
            Self::RobotShape(shape) => encode_payload(shape)?,
        };
        Ok(Frame::new(self.name(), data))
    }

    /// Decodes a frame sent by the pathfinder.
    ///
    /// Returns `Ok(None)` for frames not sent by the pathfinder.
    pub fn decode(frame: &Frame) -> Result<Option<Self>, MessageError> {
        let data = frame.data();
        let message = match frame.name() {
            PATH => {
                let path: Option<SeqNet<Vec2Net>> = decode_payload(data)?;
                Self::Path(path.map(|points| points.into_items().into_iter().map(DVec2::from).collect()))
            }
            FIELD_INFO => Self::FieldInfo(decode_payload(data)?),
            GRIDS => Self::Grids(decode_payload(data)?),
            CELL_DATA => Self::CellData(decode_payload(data)?),
            ROBOT_SHAPE => Self::RobotShape(decode_payload(data)?),
            _ => return Ok(None),
        };
        Ok(Some(message))
    }
}

/// Dimensions of the field and of its discretization.
#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct FieldInfoNet {
    pub cell_size: f64,
    pub width: f64,
    pub height: f64,
    /// Origin X in cells.
    pub origin_x: f64,
    /// Origin Y in cells.
    pub origin_y: f64,
    pub cells_x: i32,
    pub cells_y: i32,
}

impl From<&pf_geom::Field> for FieldInfoNet {
    fn from(field: &pf_geom::Field) -> Self {
        Self {
            cell_size: field.cell_size(),
            width: field.width(),
            height: field.height(),
            origin_x: field.origin_x(),
            origin_y: field.origin_y(),
            cells_x: field.cells_x() as i32,
            cells_y: field.cells_y() as i32,
        }
    }
}

/// Creates the frame subscribing the client to messages of a given name.
pub fn listen_frame(name: &str) -> Result<Frame, MessageError> {
    Ok(Frame::new(LISTEN, encode_payload(&StrNet::new(name))?))
}

pub fn heartbeat_frame() -> Frame {
    Frame::empty(HEARTBEAT)
}

pub fn disconnect_frame() -> Frame {
    Frame::empty(DISCONNECT)
}

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("failed to encode payload: {0}")]
    Encode(#[from] EncodeError),
    #[error("failed to decode payload: {0}")]
    Decode(#[from] DecodeError),
}
