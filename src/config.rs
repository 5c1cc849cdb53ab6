//! Simulation Configuration
//!
//! Every tunable the simulation reads lives here, with defaults matching
//! the shipped game. Rooms receive an `Arc<SimConfig>` at creation and
//! never consult ambient globals.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Room difficulty, selected by the host at creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Zombie health multiplier applied to every zombie in the room.
    pub fn zombie_health_multiplier(self) -> f32 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 2.0,
            Difficulty::Hard => 3.0,
        }
    }
}

/// Parameters of a projectile class (player guns and bot guns differ).
#[derive(Clone, Copy, Debug)]
pub struct BulletSpec {
    /// Units travelled per tick.
    pub speed: f32,
    /// Health removed on hit.
    pub damage: f32,
    /// Tick budget before the bullet expires on its own.
    pub life: i32,
}

/// Simulation configuration.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// World width in units.
    pub world_width: f32,
    /// World height in units.
    pub world_height: f32,
    /// Hard cap on human players per room.
    pub max_players: usize,
    /// Fixed simulation step.
    pub tick_interval: Duration,
    /// Lobby auto-start countdown, armed when the second player joins.
    pub auto_start_delay: Duration,
    /// Delay between match end and automatic restart.
    pub restart_delay: Duration,
    /// Minimum time between zombie hordes.
    pub horde_interval: Duration,
    /// Minimum time between safe-zone shrinks.
    pub shrink_interval: Duration,
    /// Radius lost per shrink.
    pub shrink_step: f32,
    /// The zone never shrinks below this radius.
    pub min_zone_radius: f32,
    /// Zone radius at match start.
    pub zone_full_radius: f32,
    /// Health per second lost outside the zone.
    pub zone_damage_per_sec: f32,
    /// Minimum time between shots from one player.
    pub shoot_cooldown: Duration,
    /// Shoot events with a client timestamp further than this from server
    /// time are dropped.
    pub shoot_staleness_ms: u64,
    /// Bullets older than this expire regardless of remaining life.
    pub bullet_max_age: Duration,
    /// Projectiles fired by players.
    pub player_bullet: BulletSpec,
    /// Projectiles fired by bots.
    pub bot_bullet: BulletSpec,
    /// Bots only engage zombies within this distance.
    pub bot_fire_range: f32,
    /// Minimum time between shots from one bot.
    pub bot_fire_cooldown: Duration,
    /// Bots re-roll their wander direction after this much wander time (ms).
    pub bot_wander_reroll_ms: f32,
    /// Destructible obstacles generated per match.
    pub obstacle_count: usize,
    /// Decorative bunkers generated per match.
    pub bunker_count: usize,
    /// Zombies in the horde spawned at match start.
    pub initial_horde_size: usize,
    /// Bot roster size when the creator does not choose one.
    pub default_bot_count: usize,
    /// Upper clamp on the requested bot roster.
    pub max_bot_count: usize,
    /// Particles included in an outbound snapshot are truncated to this
    /// count to bound bandwidth.
    pub max_snapshot_particles: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_width: 1600.0,
            world_height: 1200.0,
            max_players: 4,
            tick_interval: Duration::from_millis(16),
            auto_start_delay: Duration::from_secs(10),
            restart_delay: Duration::from_secs(10),
            horde_interval: Duration::from_millis(12_000),
            shrink_interval: Duration::from_millis(10_000),
            shrink_step: 20.0,
            min_zone_radius: 100.0,
            zone_full_radius: 600.0,
            zone_damage_per_sec: 2.0,
            shoot_cooldown: Duration::from_millis(150),
            shoot_staleness_ms: 100,
            bullet_max_age: Duration::from_millis(1_500),
            player_bullet: BulletSpec { speed: 10.0, damage: 15.0, life: 90 },
            bot_bullet: BulletSpec { speed: 8.0, damage: 10.0, life: 60 },
            bot_fire_range: 200.0,
            bot_fire_cooldown: Duration::from_millis(1_000),
            bot_wander_reroll_ms: 2_000.0,
            obstacle_count: 40,
            bunker_count: 4,
            initial_horde_size: 5,
            default_bot_count: 8,
            max_bot_count: 20,
            max_snapshot_particles: 64,
        }
    }
}

impl SimConfig {
    /// Clamp a requested bot roster size to the allowed range.
    pub fn clamp_bot_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_bot_count)
            .min(self.max_bot_count)
    }

    /// Tick length in milliseconds, as the simulation's wander/age
    /// accumulators count it.
    pub fn tick_ms(&self) -> f32 {
        self.tick_interval.as_secs_f32() * 1000.0
    }

    /// Zone damage applied per tick to anything outside the zone.
    pub fn zone_damage_per_tick(&self) -> f32 {
        self.zone_damage_per_sec / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_multipliers() {
        assert_eq!(Difficulty::Easy.zombie_health_multiplier(), 1.0);
        assert_eq!(Difficulty::Medium.zombie_health_multiplier(), 2.0);
        assert_eq!(Difficulty::Hard.zombie_health_multiplier(), 3.0);
        assert_eq!(Difficulty::default(), Difficulty::Easy);
    }

    #[test]
    fn test_bot_count_clamp() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.clamp_bot_count(None), 8);
        assert_eq!(cfg.clamp_bot_count(Some(0)), 0);
        assert_eq!(cfg.clamp_bot_count(Some(50)), 20);
        assert_eq!(cfg.clamp_bot_count(Some(12)), 12);
    }

    #[test]
    fn test_zone_damage_rate() {
        let cfg = SimConfig::default();
        assert!((cfg.zone_damage_per_tick() - 2.0 / 60.0).abs() < f32::EPSILON);
    }
}
