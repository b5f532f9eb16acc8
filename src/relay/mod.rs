//! Relay channel: a minimal intermediary that forwards opaque setup
//! messages between the two participants of a room

pub mod handler;
pub mod room;

pub use room::{RelayError, RoomRegistry, ROOM_CAPACITY};
