//! Room Layer
//!
//! Everything between a connection and the simulation: the wire event
//! surface, the registry of live rooms, and the lifecycle manager that
//! drives countdowns, ticks, restarts, and teardown.

pub mod error;
pub mod events;
pub mod manager;
pub mod registry;

pub use error::RoomError;
pub use events::{ClientEvent, GameUpdate, InitialState, KeySet, ServerEvent};
pub use manager::RoomManager;
pub use registry::{Room, RoomRegistry};
