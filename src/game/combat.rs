//! Combat & Physics
//!
//! Projectile spawning and advancement, hit resolution, explosion debris,
//! and safe-zone damage-over-time. Hit resolution consumes a bullet on its
//! first match, checked in a fixed order: obstacles, zombies, bots,
//! players.

use rand::Rng;
use tokio::time::Instant;

use crate::config::{BulletSpec, SimConfig};
use crate::game::entity::{Bullet, BulletOwner, ClientId, Particle};
use crate::game::state::RoomState;

/// Debris count per explosion.
const EXPLOSION_PARTICLES: usize = 12;

/// Score for destroying a regular or super zombie.
const ZOMBIE_KILL_SCORE: u32 = 10;

/// Push explosion debris at a point. Cosmetic only.
pub fn create_explosion(
    particles: &mut Vec<Particle>,
    x: f32,
    y: f32,
    color: &str,
    rng: &mut impl Rng,
) {
    for _ in 0..EXPLOSION_PARTICLES {
        particles.push(Particle {
            x,
            y,
            vx: (rng.gen::<f32>() - 0.5) * 8.0,
            vy: (rng.gen::<f32>() - 0.5) * 8.0 - 2.0,
            life: 30,
            size: rng.gen::<f32>() * 4.0 + 2.0,
            color: color.to_string(),
        });
    }
}

/// Build a bullet aimed from a shooter's center at a world point.
pub fn spawn_bullet(
    shooter_center: (f32, f32),
    target: (f32, f32),
    spec: &BulletSpec,
    owner: BulletOwner,
    now: Instant,
) -> Bullet {
    let angle = (target.1 - shooter_center.1).atan2(target.0 - shooter_center.0);
    Bullet {
        x: shooter_center.0,
        y: shooter_center.1,
        vx: angle.cos() * spec.speed,
        vy: angle.sin() * spec.speed,
        life: spec.life,
        damage: spec.damage,
        owner,
        spawned: now,
    }
}

/// Apply safe-zone damage to every living combatant. Players killed this
/// tick are returned so the caller can announce them; bots and zombies
/// are marked and pruned by their own pipeline steps.
pub fn apply_zone_damage(state: &mut RoomState, cfg: &SimConfig) -> Vec<ClientId> {
    let per_tick = cfg.zone_damage_per_tick();
    let zone = state.safe_zone;
    let mut died = Vec::new();

    for player in state.players.iter_mut().filter(|p| p.alive) {
        if zone.is_outside(player.center()) && player.take_damage(per_tick) {
            died.push(player.id.clone());
        }
    }
    for bot in state.bots.iter_mut().filter(|b| b.alive) {
        if zone.is_outside(bot.center()) {
            bot.take_damage(per_tick);
        }
    }
    for zombie in &mut state.zombies {
        if zone.is_outside(zombie.center()) {
            zombie.take_damage(per_tick);
        }
    }

    died
}

/// Advance every bullet one tick and resolve collisions. A bullet dies on
/// its first hit, on leaving the world, on life exhaustion, or on blowing
/// past the wall-clock age ceiling. Returns players killed by bullets.
pub fn update_bullets(
    state: &mut RoomState,
    cfg: &SimConfig,
    rng: &mut impl Rng,
    now: Instant,
) -> Vec<ClientId> {
    let mut died = Vec::new();
    let mut surviving = Vec::with_capacity(state.bullets.len());

    'bullets: for mut bullet in std::mem::take(&mut state.bullets) {
        bullet.x += bullet.vx;
        bullet.y += bullet.vy;
        bullet.life -= 1;

        let expired = bullet.life <= 0
            || now.duration_since(bullet.spawned) > cfg.bullet_max_age
            || bullet.x <= 0.0
            || bullet.x >= cfg.world_width
            || bullet.y <= 0.0
            || bullet.y >= cfg.world_height;
        if expired {
            continue;
        }

        let hit_box = bullet.aabb();

        for obstacle in &mut state.obstacles {
            if obstacle.health > 0.0 && hit_box.overlaps(&obstacle.aabb()) {
                obstacle.take_damage(bullet.damage);
                create_explosion(&mut state.particles, bullet.x, bullet.y, "#ffff00", rng);
                continue 'bullets;
            }
        }

        for zombie in &mut state.zombies {
            if zombie.health > 0.0 && hit_box.overlaps(&zombie.aabb()) {
                zombie.take_damage(bullet.damage);
                create_explosion(&mut state.particles, zombie.x, zombie.y, "#ff0000", rng);
                if zombie.health <= 0.0 {
                    state.score += ZOMBIE_KILL_SCORE;
                }
                continue 'bullets;
            }
        }

        // Bot bullets share one owner id, so bots never hit each other.
        if bullet.owner != BulletOwner::Bot {
            for bot in state.bots.iter_mut().filter(|b| b.alive) {
                if hit_box.overlaps(&bot.aabb()) {
                    bot.take_damage(bullet.damage);
                    create_explosion(&mut state.particles, bot.x, bot.y, "#00ff00", rng);
                    continue 'bullets;
                }
            }
        }

        for player in state.players.iter_mut().filter(|p| p.alive) {
            if BulletOwner::Player(player.id.clone()) == bullet.owner {
                continue;
            }
            if hit_box.overlaps(&player.aabb()) {
                if player.take_damage(bullet.damage) {
                    died.push(player.id.clone());
                }
                create_explosion(&mut state.particles, player.x, player.y, "#00ff00", rng);
                continue 'bullets;
            }
        }

        surviving.push(bullet);
    }

    state.bullets = surviving;
    state.obstacles.retain(|o| o.health > 0.0);
    state.zombies.retain(|z| z.health > 0.0);

    died
}

/// Advance explosion debris: drift, gravity, expiry.
pub fn update_particles(state: &mut RoomState) {
    state.particles.retain_mut(|p| {
        p.x += p.vx;
        p.y += p.vy;
        p.vy += 0.2;
        p.life -= 1;
        p.life > 0
    });
}
