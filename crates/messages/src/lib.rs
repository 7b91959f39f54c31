//! This crate implements messages exchanged between the pathfinder and its
//! clients over the message bus.
//!
//! The byte stream is split into named [`Frame`]s, payloads are interpreted
//! based on the frame name by [`ToPathfinder`] and [`FromPathfinder`].

pub use frame::{write_str, Frame, FrameDecoder, FrameError, MAX_PAYLOAD_SIZE};
pub use grids::{BitfieldNet, GridContentNet, GridNet, ShapeDataNet, ShapeNet, MAX_GRID_DEPTH};
pub use messages::{
    disconnect_frame, heartbeat_frame, listen_frame, FieldInfoNet, FromPathfinder, MessageError,
    ToPathfinder, DISCONNECT, HEARTBEAT, LISTEN,
};
pub use net::{ObjectIdNet, SeqNet, StrNet, Vec2Net};

mod frame;
mod grids;
mod messages;
mod net;
