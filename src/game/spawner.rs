//! Spawner
//!
//! Timed and event-driven entity introduction: the bot roster at match
//! start, zombie hordes from the world edges, super-zombie conversion, and
//! the extraction helicopter.

use rand::Rng;
use tracing::debug;

use crate::config::SimConfig;
use crate::game::entity::{Bot, Helicopter, Zombie};
use crate::game::state::RoomState;
use crate::game::world;

/// Hue band for regular zombie colors (teal range).
const ZOMBIE_HUE_MIN: f32 = 180.0;
const ZOMBIE_HUE_SPAN: f32 = 30.0;

fn zombie_color(rng: &mut impl Rng) -> String {
    let hue = ZOMBIE_HUE_MIN + rng.gen_range(0.0..ZOMBIE_HUE_SPAN);
    format!("hsl({hue:.0}, 70%, 40%)")
}

/// Populate the bot roster. Each bot gets an open position away from
/// terrain; a bot whose placement cannot be found is skipped rather than
/// stacked on an obstacle.
pub fn spawn_bots(state: &mut RoomState, cfg: &SimConfig, rng: &mut impl Rng) {
    state.bots.clear();

    for i in 0..state.target_bot_count {
        let Some((x, y)) = world::random_open_position(cfg, rng, &state.obstacles, 20.0, 20.0)
        else {
            debug!(room = %state.id, "no open position for bot, skipping");
            continue;
        };

        let speed = rng.gen_range(2.0..3.0);
        let wander_dir = (rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5);
        let mut bot = Bot::new(format!("Soldier {}", i + 1), x, y, speed, wander_dir);
        bot.wander_timer_ms = rng.gen_range(0.0..cfg.bot_wander_reroll_ms);
        state.bots.push(bot);
    }

    debug!(
        room = %state.id,
        spawned = state.bots.len(),
        requested = state.target_bot_count,
        "bot roster spawned"
    );
}

/// Spawn `count` regular zombies just outside random world edges.
pub fn spawn_horde(state: &mut RoomState, cfg: &SimConfig, rng: &mut impl Rng, count: usize) {
    for _ in 0..count {
        let (x, y) = world::random_edge_position(cfg, rng);
        let speed = rng.gen_range(0.8..1.4);
        let color = zombie_color(rng);
        state
            .zombies
            .push(Zombie::regular(x, y, speed, state.zombie_health_multiplier, color));
    }
    debug!(room = %state.id, count, "zombie horde spawned");
}

/// Zombies in the next periodic horde: enough to offset fallen bots, never
/// fewer than three.
pub fn periodic_horde_size(state: &RoomState) -> usize {
    state.target_bot_count.saturating_sub(state.bots.len()).max(3)
}

/// Replace a fallen bot with a super-zombie where it died. Worth a small
/// score bonus.
pub fn spawn_super_zombie(state: &mut RoomState, rng: &mut impl Rng, x: f32, y: f32) {
    let speed = rng.gen_range(1.5..2.0);
    state
        .zombies
        .push(Zombie::super_zombie(x, y, speed, state.zombie_health_multiplier));
    state.score += 5;
}

/// Land the extraction helicopter near a random world corner.
pub fn spawn_helicopter(state: &mut RoomState, cfg: &SimConfig, rng: &mut impl Rng) {
    let (x, y) = world::helicopter_corner(cfg, rng);
    state.helicopter = Some(Helicopter::new(x, y));
}
