//! Game Simulation
//!
//! Everything that happens inside a room's world: entities, terrain,
//! AI, combat, spawning, and the ordered tick pipeline.

pub mod ai;
pub mod collision;
pub mod combat;
pub mod entity;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod world;

pub use entity::ClientId;
pub use state::{RoomId, RoomPhase, RoomState};
pub use tick::{run_tick, TickEvent, TickOutcome};
