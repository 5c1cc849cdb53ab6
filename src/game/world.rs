//! World Generation
//!
//! Procedural placement of terrain and the fixed spawn geometry. All
//! randomness comes from an injected `Rng` so tests can seed it.

use rand::Rng;

use crate::config::SimConfig;
use crate::game::collision::{blocked_by_obstacles, Aabb};
use crate::game::entity::{Bunker, Obstacle};

/// Attempts allowed when rejection-sampling a free rectangle before the
/// placement is skipped.
const MAX_PLACEMENT_ATTEMPTS: usize = 200;

/// Palette players are colored from on join.
const PLAYER_COLORS: [&str; 6] = [
    "#ff0000", "#00ff00", "#0000ff", "#ffff00", "#ff00ff", "#00ffff",
];

/// Generate the destructible obstacles and decorative bunkers for a match.
/// Rectangles never overlap a live obstacle placed before them.
pub fn generate_terrain(cfg: &SimConfig, rng: &mut impl Rng) -> (Vec<Obstacle>, Vec<Bunker>) {
    let mut obstacles: Vec<Obstacle> = Vec::with_capacity(cfg.obstacle_count);

    for _ in 0..cfg.obstacle_count {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let width = rng.gen_range(20.0..80.0);
            let height = rng.gen_range(20.0..80.0);
            let x = rng.gen_range(0.0..cfg.world_width);
            let y = rng.gen_range(0.0..cfg.world_height);

            if !blocked_by_obstacles(&Aabb::new(x, y, width, height), &obstacles) {
                obstacles.push(Obstacle::new(x, y, width, height));
                break;
            }
        }
    }

    let mut bunkers: Vec<Bunker> = Vec::with_capacity(cfg.bunker_count);
    for _ in 0..cfg.bunker_count {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let x = rng.gen_range(0.0..cfg.world_width);
            let y = rng.gen_range(0.0..cfg.world_height);

            if !blocked_by_obstacles(&Aabb::new(x, y, 80.0, 80.0), &obstacles) {
                bunkers.push(Bunker::new(x, y));
                break;
            }
        }
    }

    (obstacles, bunkers)
}

/// Deterministic corner spawn for the n-th player to join (cycles after
/// four).
pub fn spawn_corner(cfg: &SimConfig, join_index: usize) -> (f32, f32) {
    match join_index % 4 {
        0 => (100.0, 100.0),
        1 => (cfg.world_width - 100.0, 100.0),
        2 => (100.0, cfg.world_height - 100.0),
        _ => (cfg.world_width - 100.0, cfg.world_height - 100.0),
    }
}

/// Sample a position for a `w`×`h` entity that does not overlap terrain,
/// inset 50 units from the world edge. Gives up after 50 attempts,
/// matching the spawner's tolerance for crowded maps.
pub fn random_open_position(
    cfg: &SimConfig,
    rng: &mut impl Rng,
    obstacles: &[Obstacle],
    w: f32,
    h: f32,
) -> Option<(f32, f32)> {
    for _ in 0..50 {
        let x = rng.gen_range(50.0..cfg.world_width - 100.0);
        let y = rng.gen_range(50.0..cfg.world_height - 100.0);
        if !blocked_by_obstacles(&Aabb::new(x, y, w, h), obstacles) {
            return Some((x, y));
        }
    }
    None
}

/// A point just outside a random world edge, where hordes walk in from.
pub fn random_edge_position(cfg: &SimConfig, rng: &mut impl Rng) -> (f32, f32) {
    match rng.gen_range(0..4) {
        0 => (rng.gen_range(0.0..cfg.world_width), -20.0),
        1 => (rng.gen_range(0.0..cfg.world_width), cfg.world_height + 20.0),
        2 => (-20.0, rng.gen_range(0.0..cfg.world_height)),
        _ => (cfg.world_width + 20.0, rng.gen_range(0.0..cfg.world_height)),
    }
}

/// The landing spot for the extraction helicopter: one of the four world
/// corners, inset so the 60-unit box stays in bounds.
pub fn helicopter_corner(cfg: &SimConfig, rng: &mut impl Rng) -> (f32, f32) {
    match rng.gen_range(0..4) {
        0 => (50.0, 50.0),
        1 => (cfg.world_width - 110.0, 50.0),
        2 => (50.0, cfg.world_height - 110.0),
        _ => (cfg.world_width - 110.0, cfg.world_height - 110.0),
    }
}

/// Pick a display color for a joining player.
pub fn random_player_color(rng: &mut impl Rng) -> String {
    PLAYER_COLORS[rng.gen_range(0..PLAYER_COLORS.len())].to_string()
}
