//! # Outbreak Server
//!
//! Authoritative game server for Outbreak, a room-based cooperative
//! survival shooter. Every room runs its own fixed-rate simulation; clients
//! send inputs and receive state snapshots, never authority.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      OUTBREAK SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  config.rs       - Simulation tunables and difficulty        │
//! │                                                              │
//! │  game/           - Per-room simulation                       │
//! │  ├── collision.rs- AABB tests and distance helpers           │
//! │  ├── entity.rs   - Players, bots, zombies, bullets, terrain  │
//! │  ├── world.rs    - Terrain generation and spawn geometry     │
//! │  ├── ai.rs       - Bot steering and zombie pursuit           │
//! │  ├── combat.rs   - Bullets, explosions, zone damage          │
//! │  ├── spawner.rs  - Hordes, super-zombies, the helicopter     │
//! │  ├── state.rs    - RoomState: entities, phase, timers        │
//! │  └── tick.rs     - Ordered update pipeline + win condition   │
//! │                                                              │
//! │  room/           - Lifecycle and wire surface                │
//! │  ├── events.rs   - Client/server events and snapshots        │
//! │  ├── error.rs    - Recoverable per-client failures           │
//! │  ├── registry.rs - Live rooms and connection fan-out         │
//! │  └── manager.rs  - Create/join/start/restart/teardown        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! Each room is an `Arc<RwLock<Room>>` in a shared registry. Background
//! tasks (countdown, ticker, auto-restart) hold only the room id and
//! re-look it up on wake, so teardown turns any late timer into a no-op.
//! Outbound events go through bounded per-connection queues; a stalled
//! client loses snapshots instead of stalling the room.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod game;
pub mod room;

pub use config::{Difficulty, SimConfig};
pub use game::state::{RoomId, RoomPhase, RoomState};
pub use game::ClientId;
pub use room::{ClientEvent, RoomError, RoomManager, ServerEvent};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
