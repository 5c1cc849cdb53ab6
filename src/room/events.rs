//! Wire Events
//!
//! The inbound and outbound event surface of a room, plus the snapshot
//! shapes broadcast while a match runs. Snapshots are plain serializable
//! copies of entity state; simulation types with timestamps never cross
//! the wire directly.

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::game::entity::{
    Bot, Bullet, Bunker, ClientId, Helicopter, Obstacle, Particle, Player, SafeZone, Zombie,
};
use crate::game::state::{RoomId, RoomState};

// ============================================================================
// Inbound
// ============================================================================

/// Movement keys held by a client this input frame.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct KeySet {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

/// Everything a client can ask of the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    CreateRoom {
        player_name: Option<String>,
        difficulty: Option<Difficulty>,
        bot_count: Option<usize>,
    },
    JoinRoom {
        room_id: String,
        player_name: Option<String>,
    },
    PlayerInput {
        keys: KeySet,
    },
    Shoot {
        target_x: f32,
        target_y: f32,
        /// Client wall-clock milliseconds, used for the staleness bound.
        timestamp_ms: u64,
    },
    StartGame,
    RestartGame,
    /// Sent by a client leaving cleanly; the transport also synthesizes
    /// this when a connection drops.
    Disconnect,
}

// ============================================================================
// Outbound
// ============================================================================

/// Everything the server can push to a client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomCreated {
        room_id: RoomId,
        players: Vec<PlayerSnapshot>,
    },
    RoomJoined {
        room_id: RoomId,
        players: Vec<PlayerSnapshot>,
    },
    PlayerJoined {
        players: Vec<PlayerSnapshot>,
    },
    PlayerLeft {
        players: Vec<PlayerSnapshot>,
    },
    AutoStartCountdown {
        seconds: u64,
    },
    GameStart(InitialState),
    GameUpdate(GameUpdate),
    GameRestarted(InitialState),
    PlayerDied {
        player_id: ClientId,
    },
    GameOver {
        message: String,
    },
    Message {
        text: String,
    },
    Error {
        message: String,
    },
}

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: ClientId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: String,
    pub alive: bool,
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
            health: p.health,
            max_health: p.max_health,
            color: p.color.clone(),
            alive: p.alive,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotSnapshot {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: String,
    pub alive: bool,
}

impl From<&Bot> for BotSnapshot {
    fn from(b: &Bot) -> Self {
        Self {
            name: b.name.clone(),
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
            health: b.health,
            max_health: b.max_health,
            color: b.color.clone(),
            alive: b.alive,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ZombieSnapshot {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: String,
}

impl From<&Zombie> for ZombieSnapshot {
    fn from(z: &Zombie) -> Self {
        Self {
            x: z.x,
            y: z.y,
            width: z.width,
            height: z.height,
            health: z.health,
            max_health: z.max_health,
            color: z.color.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BulletSnapshot {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl From<&Bullet> for BulletSnapshot {
    fn from(b: &Bullet) -> Self {
        Self { x: b.x, y: b.y, vx: b.vx, vy: b.vy }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: String,
}

impl From<&Particle> for ParticleSnapshot {
    fn from(p: &Particle) -> Self {
        Self { x: p.x, y: p.y, size: p.size, color: p.color.clone() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: String,
}

impl From<&Obstacle> for ObstacleSnapshot {
    fn from(o: &Obstacle) -> Self {
        Self {
            x: o.x,
            y: o.y,
            width: o.width,
            height: o.height,
            health: o.health,
            max_health: o.max_health,
            color: o.color.clone(),
        }
    }
}

/// Per-tick broadcast while a match runs. Particles are truncated to bound
/// bandwidth.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameUpdate {
    pub players: Vec<PlayerSnapshot>,
    pub bots: Vec<BotSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
    pub zombies: Vec<ZombieSnapshot>,
    pub particles: Vec<ParticleSnapshot>,
    pub obstacles: Vec<ObstacleSnapshot>,
    pub safe_zone: SafeZone,
    pub helicopter: Option<Helicopter>,
    pub score: u32,
}

impl GameUpdate {
    pub fn capture(state: &RoomState, max_particles: usize) -> Self {
        Self {
            players: state.players.iter().map(Into::into).collect(),
            bots: state.bots.iter().map(Into::into).collect(),
            bullets: state.bullets.iter().map(Into::into).collect(),
            zombies: state.zombies.iter().map(Into::into).collect(),
            particles: state
                .particles
                .iter()
                .take(max_particles)
                .map(Into::into)
                .collect(),
            obstacles: state.obstacles.iter().map(Into::into).collect(),
            safe_zone: state.safe_zone,
            helicopter: state.helicopter,
            score: state.score,
        }
    }
}

/// Full state sent on match start and restart. Unlike `GameUpdate` it
/// carries the immutable extras a client needs once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InitialState {
    pub room_id: RoomId,
    pub players: Vec<PlayerSnapshot>,
    pub bots: Vec<BotSnapshot>,
    pub zombies: Vec<ZombieSnapshot>,
    pub obstacles: Vec<ObstacleSnapshot>,
    pub bunkers: Vec<Bunker>,
    pub safe_zone: SafeZone,
    pub helicopter: Option<Helicopter>,
    pub score: u32,
    pub zombie_health_multiplier: f32,
}

impl InitialState {
    pub fn capture(state: &RoomState) -> Self {
        Self {
            room_id: state.id.clone(),
            players: state.players.iter().map(Into::into).collect(),
            bots: state.bots.iter().map(Into::into).collect(),
            zombies: state.zombies.iter().map(Into::into).collect(),
            obstacles: state.obstacles.iter().map(Into::into).collect(),
            bunkers: state.bunkers.clone(),
            safe_zone: state.safe_zone,
            helicopter: state.helicopter,
            score: state.score,
            zombie_health_multiplier: state.zombie_health_multiplier,
        }
    }
}
