//! Entity Model
//!
//! Data definitions for everything that lives inside a room's world.
//! Entities are plain structs mutated in place by the tick pipeline;
//! outbound wire shapes live in `room::events`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::game::collision::Aabb;

/// Opaque per-connection identifier, assigned by the transport layer.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Side length of the player/bot bounding box.
pub const SOLDIER_BOX: f32 = 20.0;
/// Side length of a regular zombie.
pub const ZOMBIE_BOX: f32 = 15.0;
/// Side length of a super-zombie.
pub const SUPER_ZOMBIE_BOX: f32 = 30.0;
/// Side length of the extraction helicopter.
pub const HELICOPTER_BOX: f32 = 60.0;

/// A human-controlled combatant.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: ClientId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub color: String,
    pub alive: bool,
    pub last_shot: Option<Instant>,
    pub last_input: Instant,
}

impl Player {
    pub fn new(id: ClientId, name: String, x: f32, y: f32, color: String, now: Instant) -> Self {
        Self {
            id,
            name,
            x,
            y,
            width: SOLDIER_BOX,
            height: SOLDIER_BOX,
            health: 100.0,
            max_health: 100.0,
            speed: 4.0,
            color,
            alive: true,
            last_shot: None,
            last_input: now,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        self.aabb().center()
    }

    /// Apply damage, clamping health at zero. Returns true if this call
    /// killed the player.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            true
        } else {
            false
        }
    }
}

/// A server-driven ally.
#[derive(Clone, Debug)]
pub struct Bot {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub color: String,
    pub alive: bool,
    pub last_shot: Option<Instant>,
    pub wander_dir: (f32, f32),
    pub wander_timer_ms: f32,
}

impl Bot {
    pub fn new(name: String, x: f32, y: f32, speed: f32, wander_dir: (f32, f32)) -> Self {
        Self {
            name,
            x,
            y,
            width: SOLDIER_BOX,
            height: SOLDIER_BOX,
            health: 100.0,
            max_health: 100.0,
            speed,
            color: "#00cc00".to_string(),
            alive: true,
            last_shot: None,
            wander_dir,
            wander_timer_ms: 0.0,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        self.aabb().center()
    }

    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            true
        } else {
            false
        }
    }
}

/// A hostile combatant.
#[derive(Clone, Debug)]
pub struct Zombie {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub damage: f32,
    pub color: String,
}

impl Zombie {
    /// A regular horde zombie. `multiplier` is the room's difficulty-derived
    /// health scale.
    pub fn regular(x: f32, y: f32, speed: f32, multiplier: f32, color: String) -> Self {
        Self {
            x,
            y,
            width: ZOMBIE_BOX,
            height: ZOMBIE_BOX,
            health: 50.0 * multiplier,
            max_health: 50.0 * multiplier,
            speed,
            damage: 1.0,
            color,
        }
    }

    /// The elevated variant spawned where a bot fell to zombie contact.
    pub fn super_zombie(x: f32, y: f32, speed: f32, multiplier: f32) -> Self {
        Self {
            x,
            y,
            width: SUPER_ZOMBIE_BOX,
            height: SUPER_ZOMBIE_BOX,
            health: 200.0 * multiplier,
            max_health: 200.0 * multiplier,
            speed,
            damage: 2.0,
            color: "#ff0000".to_string(),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        self.aabb().center()
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }
}

/// Who fired a bullet; used to exempt the owner from its damage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BulletOwner {
    Player(ClientId),
    Bot,
}

/// An ephemeral projectile.
#[derive(Clone, Debug)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Remaining tick budget.
    pub life: i32,
    pub damage: f32,
    pub owner: BulletOwner,
    pub spawned: Instant,
}

impl Bullet {
    pub fn aabb(&self) -> Aabb {
        Aabb::point(self.x, self.y)
    }
}

/// Cosmetic explosion debris; never affects gameplay.
#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub life: i32,
    pub size: f32,
    pub color: String,
}

/// Static destructible rectangle; blocks movement and bullets while alive.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub health: f32,
    pub max_health: f32,
    pub color: String,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            health: 150.0,
            max_health: 150.0,
            color: "#8B4513".to_string(),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount).max(0.0);
    }
}

/// Static non-destructible rectangle, decorative only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bunker {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: String,
}

impl Bunker {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            width: 80.0,
            height: 80.0,
            color: "#808080".to_string(),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }
}

/// The shrinking circle; being outside it inflicts damage over time.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SafeZone {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl SafeZone {
    /// True if a point lies outside the zone.
    pub fn is_outside(&self, point: (f32, f32)) -> bool {
        crate::game::collision::distance(point, (self.x, self.y)) > self.radius
    }
}

/// The single-instance extraction objective.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Helicopter {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Helicopter {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            width: HELICOPTER_BOX,
            height: HELICOPTER_BOX,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut player = Player::new(
            ClientId::new("p1"),
            "Test".into(),
            0.0,
            0.0,
            "#ff0000".into(),
            Instant::now(),
        );

        assert!(!player.take_damage(40.0));
        assert_eq!(player.health, 60.0);
        assert!(player.alive);

        assert!(player.take_damage(500.0));
        assert_eq!(player.health, 0.0);
        assert!(!player.alive);

        // Further damage is a no-op on the dead.
        assert!(!player.take_damage(10.0));
        assert_eq!(player.health, 0.0);
    }

    #[test]
    fn test_zombie_health_scaling() {
        let regular = Zombie::regular(0.0, 0.0, 1.0, 3.0, "#338080".into());
        assert_eq!(regular.health, 150.0);
        assert_eq!(regular.width, ZOMBIE_BOX);

        let boss = Zombie::super_zombie(0.0, 0.0, 1.5, 2.0);
        assert_eq!(boss.health, 400.0);
        assert_eq!(boss.damage, 2.0);
        assert_eq!(boss.width, SUPER_ZOMBIE_BOX);
    }

    #[test]
    fn test_safe_zone_containment() {
        let zone = SafeZone { x: 800.0, y: 600.0, radius: 100.0 };
        assert!(!zone.is_outside((800.0, 600.0)));
        assert!(!zone.is_outside((870.0, 600.0)));
        assert!(zone.is_outside((901.0, 600.0)));
    }
}
