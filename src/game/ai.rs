//! AI Subsystem
//!
//! Bot steering (flee the zone edge, otherwise wander) and zombie pursuit.
//! Every mover proposes a position and keeps it only if no live obstacle
//! blocks it, so terrain reads the same for AI and players.

use rand::Rng;

use crate::config::SimConfig;
use crate::game::collision::{blocked_by_obstacles, distance, Aabb};
use crate::game::entity::{Bot, Obstacle, Player, SafeZone, Zombie};

/// Distance past the zone radius at which a bot abandons wandering and
/// sprints for the center.
const FLEE_MARGIN: f32 = 50.0;
/// Speed scale while fleeing the zone.
const FLEE_FACTOR: f32 = 2.0;
/// Speed scale while wandering.
const WANDER_FACTOR: f32 = 1.5;

/// Advance one bot's movement for this tick.
pub fn move_bot(
    bot: &mut Bot,
    zone: &SafeZone,
    obstacles: &[Obstacle],
    cfg: &SimConfig,
    rng: &mut impl Rng,
) {
    bot.wander_timer_ms += cfg.tick_ms();

    let to_center = distance((bot.x, bot.y), (zone.x, zone.y));
    if to_center > zone.radius + FLEE_MARGIN {
        if to_center > 0.0 {
            let nx = bot.x + (zone.x - bot.x) / to_center * bot.speed * FLEE_FACTOR;
            let ny = bot.y + (zone.y - bot.y) / to_center * bot.speed * FLEE_FACTOR;
            try_step(bot, nx, ny, obstacles);
        }
    } else {
        if bot.wander_timer_ms > cfg.bot_wander_reroll_ms {
            bot.wander_dir = (rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5);
            bot.wander_timer_ms = 0.0;
        }
        let nx = bot.x + bot.wander_dir.0 * bot.speed * WANDER_FACTOR;
        let ny = bot.y + bot.wander_dir.1 * bot.speed * WANDER_FACTOR;
        try_step(bot, nx, ny, obstacles);
    }

    bot.x = bot.x.clamp(0.0, cfg.world_width - bot.width);
    bot.y = bot.y.clamp(0.0, cfg.world_height - bot.height);
}

fn try_step(bot: &mut Bot, nx: f32, ny: f32, obstacles: &[Obstacle]) {
    if !blocked_by_obstacles(&Aabb::new(nx, ny, bot.width, bot.height), obstacles) {
        bot.x = nx;
        bot.y = ny;
    }
}

/// Index of the closest zombie still standing within `range` of `pos`,
/// if any.
pub fn nearest_zombie_in_range(pos: (f32, f32), zombies: &[Zombie], range: f32) -> Option<usize> {
    let mut nearest = None;
    let mut min_dist = range;
    for (i, z) in zombies.iter().enumerate() {
        if z.health <= 0.0 {
            continue;
        }
        let d = distance(pos, (z.x, z.y));
        if d < min_dist {
            min_dist = d;
            nearest = Some(i);
        }
    }
    nearest
}

/// Position of the closest living player or bot, players checked first so
/// ties resolve toward them.
pub fn nearest_soldier(
    zombie: &Zombie,
    players: &[Player],
    bots: &[Bot],
) -> Option<(f32, f32)> {
    let mut nearest = None;
    let mut min_dist = f32::INFINITY;

    for p in players.iter().filter(|p| p.alive) {
        let d = distance((zombie.x, zombie.y), (p.x, p.y));
        if d < min_dist {
            min_dist = d;
            nearest = Some((p.x, p.y));
        }
    }
    for b in bots.iter().filter(|b| b.alive) {
        let d = distance((zombie.x, zombie.y), (b.x, b.y));
        if d < min_dist {
            min_dist = d;
            nearest = Some((b.x, b.y));
        }
    }
    nearest
}

/// Step a zombie toward `target` under the same obstacle-rejection and
/// clamping rules as every other mover.
pub fn move_zombie(zombie: &mut Zombie, target: (f32, f32), obstacles: &[Obstacle], cfg: &SimConfig) {
    let dx = target.0 - zombie.x;
    let dy = target.1 - zombie.y;
    let dist = dx.hypot(dy);
    if dist > 0.0 {
        let nx = zombie.x + dx / dist * zombie.speed;
        let ny = zombie.y + dy / dist * zombie.speed;
        if !blocked_by_obstacles(&Aabb::new(nx, ny, zombie.width, zombie.height), obstacles) {
            zombie.x = nx;
            zombie.y = ny;
        }
    }

    zombie.x = zombie.x.clamp(0.0, cfg.world_width - zombie.width);
    zombie.y = zombie.y.clamp(0.0, cfg.world_height - zombie.height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::ClientId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tokio::time::Instant;

    fn center_zone() -> SafeZone {
        SafeZone { x: 800.0, y: 600.0, radius: 100.0 }
    }

    #[test]
    fn test_bot_flees_toward_zone_center() {
        let cfg = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let zone = center_zone();
        // Far outside the zone on the x axis.
        let mut bot = Bot::new("Soldier 1".into(), 100.0, 600.0, 2.0, (0.0, 0.0));

        let before = distance((bot.x, bot.y), (zone.x, zone.y));
        move_bot(&mut bot, &zone, &[], &cfg, &mut rng);
        let after = distance((bot.x, bot.y), (zone.x, zone.y));

        assert!(after < before);
        // Flee speed is double base speed.
        assert!((before - after - bot.speed * 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_bot_wander_rerolls_direction() {
        let cfg = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let zone = center_zone();
        let mut bot = Bot::new("Soldier 1".into(), 800.0, 600.0, 2.0, (0.25, 0.25));
        bot.wander_timer_ms = 2_500.0;

        move_bot(&mut bot, &zone, &[], &cfg, &mut rng);

        assert!(bot.wander_timer_ms < 2_000.0, "timer reset on reroll");
        assert_ne!(bot.wander_dir, (0.25, 0.25));
    }

    #[test]
    fn test_bot_stays_in_bounds() {
        let cfg = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let zone = SafeZone { x: 800.0, y: 600.0, radius: 2_000.0 };
        let mut bot = Bot::new("Soldier 1".into(), 0.0, 0.0, 3.0, (-0.5, -0.5));

        for _ in 0..200 {
            move_bot(&mut bot, &zone, &[], &cfg, &mut rng);
            assert!(bot.x >= 0.0 && bot.x <= cfg.world_width - bot.width);
            assert!(bot.y >= 0.0 && bot.y <= cfg.world_height - bot.height);
        }
    }

    #[test]
    fn test_nearest_zombie_respects_range() {
        let zombies = vec![
            Zombie::regular(500.0, 0.0, 1.0, 1.0, "hsl(190, 70%, 40%)".into()),
            Zombie::regular(150.0, 0.0, 1.0, 1.0, "hsl(190, 70%, 40%)".into()),
        ];

        assert_eq!(nearest_zombie_in_range((0.0, 0.0), &zombies, 200.0), Some(1));
        assert_eq!(nearest_zombie_in_range((0.0, 0.0), &zombies, 100.0), None);
        assert_eq!(nearest_zombie_in_range((0.0, 0.0), &[], 200.0), None);
    }

    #[test]
    fn test_nearest_zombie_skips_marked_dead() {
        let mut close = Zombie::regular(50.0, 0.0, 1.0, 1.0, "hsl(190, 70%, 40%)".into());
        close.health = 0.0;
        let far = Zombie::regular(150.0, 0.0, 1.0, 1.0, "hsl(190, 70%, 40%)".into());

        assert_eq!(nearest_zombie_in_range((0.0, 0.0), &[close, far], 200.0), Some(1));
    }

    #[test]
    fn test_zombie_pursues_closest_living_soldier() {
        let now = Instant::now();
        let mut dead = Player::new(
            ClientId::new("p1"),
            "Dead".into(),
            100.0,
            100.0,
            "#ff0000".into(),
            now,
        );
        dead.alive = false;
        let living = Player::new(
            ClientId::new("p2"),
            "Living".into(),
            400.0,
            100.0,
            "#00ff00".into(),
            now,
        );
        let zombie = Zombie::regular(0.0, 100.0, 1.0, 1.0, "hsl(190, 70%, 40%)".into());

        // The closer player is dead and must be ignored.
        let target = nearest_soldier(&zombie, &[dead, living.clone()], &[]);
        assert_eq!(target, Some((living.x, living.y)));
    }

    #[test]
    fn test_zombie_blocked_by_obstacle() {
        let cfg = SimConfig::default();
        let obstacle = Obstacle::new(50.0, 76.0, 40.0, 40.0);
        let mut zombie = Zombie::regular(55.0, 60.0, 5.0, 1.0, "hsl(190, 70%, 40%)".into());

        // Target directly below, behind the obstacle.
        move_zombie(&mut zombie, (55.0, 300.0), std::slice::from_ref(&obstacle), &cfg);
        assert_eq!((zombie.x, zombie.y), (55.0, 60.0), "move into obstacle rejected");

        move_zombie(&mut zombie, (300.0, 60.0), std::slice::from_ref(&obstacle), &cfg);
        assert!(zombie.x > 55.0, "clear path taken");
    }

    #[test]
    fn test_zombie_clamped_to_world() {
        let cfg = SimConfig::default();
        let mut zombie = Zombie::regular(-20.0, 100.0, 2.0, 1.0, "hsl(190, 70%, 40%)".into());

        move_zombie(&mut zombie, (400.0, 100.0), &[], &cfg);
        assert!(zombie.x >= 0.0);
    }
}
