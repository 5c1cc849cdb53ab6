//! Room State Definitions
//!
//! The canonical per-room simulation state. One `RoomState` is owned by
//! exactly one `Room` in the registry and is only ever mutated under that
//! room's lock.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::{Difficulty, SimConfig};
use crate::game::entity::{
    Bullet, Bunker, Bot, ClientId, Helicopter, Obstacle, Particle, Player, SafeZone, Zombie,
};
use crate::game::{spawner, world};

/// Six-letter room identifier, unique across the process.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    const LEN: usize = 6;
    const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    /// Generate a random identifier. Uniqueness is the registry's problem.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let id: String = (0..Self::LEN)
            .map(|_| Self::ALPHABET[rng.gen_range(0..Self::ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Normalize client-supplied text (lookups are case-insensitive).
    pub fn parse(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle phase of a room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RoomPhase {
    /// Waiting for players; no simulation entities besides players exist.
    #[default]
    Lobby,
    /// Auto-start countdown armed.
    Countdown,
    /// Simulation ticking.
    Running,
    /// Match over, awaiting automatic restart or teardown.
    Ended,
}

/// Complete state of one room.
#[derive(Clone, Debug)]
pub struct RoomState {
    pub id: RoomId,
    pub phase: RoomPhase,
    /// Connection with match-control authority.
    pub host: ClientId,
    /// Insertion order is join order; the earliest entry is the default host.
    pub players: Vec<Player>,
    pub bots: Vec<Bot>,
    pub zombies: Vec<Zombie>,
    pub bullets: Vec<Bullet>,
    pub particles: Vec<Particle>,
    pub obstacles: Vec<Obstacle>,
    pub bunkers: Vec<Bunker>,
    pub helicopter: Option<Helicopter>,
    pub safe_zone: SafeZone,
    pub score: u32,
    pub difficulty: Difficulty,
    pub zombie_health_multiplier: f32,
    /// Roster size the spawner replenishes hordes against.
    pub target_bot_count: usize,
    pub last_horde: Instant,
    pub last_shrink: Instant,
    /// The one-shot auto-start countdown has been armed at least once.
    pub countdown_armed: bool,
}

impl RoomState {
    pub fn new(
        id: RoomId,
        host: ClientId,
        difficulty: Difficulty,
        target_bot_count: usize,
        cfg: &SimConfig,
        now: Instant,
    ) -> Self {
        Self {
            id,
            phase: RoomPhase::Lobby,
            host,
            players: Vec::new(),
            bots: Vec::new(),
            zombies: Vec::new(),
            bullets: Vec::new(),
            particles: Vec::new(),
            obstacles: Vec::new(),
            bunkers: Vec::new(),
            helicopter: None,
            safe_zone: SafeZone {
                x: cfg.world_width / 2.0,
                y: cfg.world_height / 2.0,
                radius: cfg.zone_full_radius,
            },
            score: 0,
            difficulty,
            zombie_health_multiplier: difficulty.zombie_health_multiplier(),
            target_bot_count,
            last_horde: now,
            last_shrink: now,
            countdown_armed: false,
        }
    }

    /// Append a player at the next spawn corner. The caller enforces the
    /// room capacity.
    pub fn add_player(
        &mut self,
        id: ClientId,
        name: String,
        cfg: &SimConfig,
        rng: &mut impl Rng,
        now: Instant,
    ) {
        let (x, y) = world::spawn_corner(cfg, self.players.len());
        let color = world::random_player_color(rng);
        self.players.push(Player::new(id, name, x, y, color, now));
    }

    /// Remove a player by connection id. Returns true if one was removed.
    pub fn remove_player(&mut self, id: &ClientId) -> bool {
        let before = self.players.len();
        self.players.retain(|p| &p.id != id);
        self.players.len() != before
    }

    pub fn player(&self, id: &ClientId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn player_mut(&mut self, id: &ClientId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    pub fn is_host(&self, id: &ClientId) -> bool {
        &self.host == id
    }

    /// Living combatants on the defending side (players + bots).
    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
            + self.bots.iter().filter(|b| b.alive).count()
    }

    /// Populate terrain and the opening roster and transition to `Running`.
    pub fn begin_match(&mut self, cfg: &SimConfig, rng: &mut impl Rng, now: Instant) {
        let (obstacles, bunkers) = world::generate_terrain(cfg, rng);
        self.obstacles = obstacles;
        self.bunkers = bunkers;

        spawner::spawn_bots(self, cfg, rng);
        spawner::spawn_horde(self, cfg, rng, cfg.initial_horde_size);

        self.last_horde = now;
        self.last_shrink = now;
        self.phase = RoomPhase::Running;
    }

    /// Reset to a fresh running state: wipe entities, regenerate terrain,
    /// respawn bots, and revive every player at a random position.
    pub fn reset_for_restart(&mut self, cfg: &SimConfig, rng: &mut impl Rng, now: Instant) {
        self.bullets.clear();
        self.zombies.clear();
        self.particles.clear();
        self.bots.clear();
        self.helicopter = None;
        self.score = 0;
        self.safe_zone = SafeZone {
            x: cfg.world_width / 2.0,
            y: cfg.world_height / 2.0,
            radius: cfg.zone_full_radius,
        };

        for player in &mut self.players {
            player.health = player.max_health;
            player.alive = true;
            player.last_shot = None;
            player.x = rng.gen_range(0.0..cfg.world_width - player.width);
            player.y = rng.gen_range(0.0..cfg.world_height - player.height);
        }

        let (obstacles, bunkers) = world::generate_terrain(cfg, rng);
        self.obstacles = obstacles;
        self.bunkers = bunkers;
        spawner::spawn_bots(self, cfg, rng);

        self.last_horde = now;
        self.last_shrink = now;
        self.phase = RoomPhase::Running;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_state() -> (RoomState, SimConfig, StdRng) {
        let cfg = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let state = RoomState::new(
            RoomId::generate(&mut rng),
            ClientId::new("host"),
            Difficulty::Hard,
            2,
            &cfg,
            Instant::now(),
        );
        (state, cfg, rng)
    }

    #[test]
    fn test_room_id_parse_normalizes() {
        assert_eq!(RoomId::parse(" abcdef "), RoomId::parse("ABCDEF"));
        assert_eq!(RoomId::parse("qwerty").as_str(), "QWERTY");
    }

    #[test]
    fn test_players_spawn_at_successive_corners() {
        let (mut state, cfg, mut rng) = test_state();
        let now = Instant::now();
        for i in 0..4 {
            state.add_player(
                ClientId::new(format!("p{i}")),
                format!("Player {i}"),
                &cfg,
                &mut rng,
                now,
            );
        }

        assert_eq!((state.players[0].x, state.players[0].y), (100.0, 100.0));
        assert_eq!((state.players[1].x, state.players[1].y), (1500.0, 100.0));
        assert_eq!((state.players[2].x, state.players[2].y), (100.0, 1100.0));
        assert_eq!((state.players[3].x, state.players[3].y), (1500.0, 1100.0));
    }

    #[test]
    fn test_begin_match_populates_world() {
        let (mut state, cfg, mut rng) = test_state();
        let now = Instant::now();
        state.add_player(ClientId::new("host"), "Host".into(), &cfg, &mut rng, now);

        state.begin_match(&cfg, &mut rng, now);

        assert_eq!(state.phase, RoomPhase::Running);
        assert_eq!(state.bots.len(), 2);
        assert_eq!(state.zombies.len(), cfg.initial_horde_size);
        assert!(!state.obstacles.is_empty());
        // Hard difficulty triples zombie health.
        assert!(state.zombies.iter().all(|z| z.health == 150.0));
        assert_eq!(state.safe_zone.radius, 600.0);
    }

    #[test]
    fn test_restart_revives_players_and_clears_entities() {
        let (mut state, cfg, mut rng) = test_state();
        let now = Instant::now();
        state.add_player(ClientId::new("host"), "Host".into(), &cfg, &mut rng, now);
        state.begin_match(&cfg, &mut rng, now);

        state.players[0].health = 0.0;
        state.players[0].alive = false;
        state.score = 99;

        state.reset_for_restart(&cfg, &mut rng, now);

        let p = &state.players[0];
        assert_eq!(p.health, 100.0);
        assert!(p.alive);
        assert!(p.x >= 0.0 && p.x <= cfg.world_width - p.width);
        assert!(state.zombies.is_empty());
        assert!(state.bullets.is_empty());
        assert!(state.particles.is_empty());
        assert!(state.helicopter.is_none());
        assert_eq!(state.score, 0);
        assert_eq!(state.bots.len(), 2);
        assert_eq!(state.safe_zone.radius, 600.0);
    }
}
