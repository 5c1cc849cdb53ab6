//! Tick Pipeline
//!
//! One fixed-interval update for a running room. Step order is a
//! correctness requirement: zone damage, bots, bullets, horde, shrink,
//! zombies, particles, win condition. Removals are two-phase (mark while
//! iterating against a stable view, compact afterwards).

use rand::Rng;
use tokio::time::Instant;
use tracing::info;

use crate::config::SimConfig;
use crate::game::entity::{BulletOwner, ClientId};
use crate::game::state::{RoomPhase, RoomState};
use crate::game::{ai, combat, spawner};

/// Health a bot loses on zombie contact during the bot step.
const BOT_CONTACT_DAMAGE: f32 = 10.0;

/// Side effects of a tick the room layer must announce.
#[derive(Clone, Debug, PartialEq)]
pub enum TickEvent {
    PlayerDied { player_id: ClientId },
    HelicopterArrived,
    GameOver { message: String },
}

/// Result of one pipeline pass.
#[derive(Clone, Debug, Default)]
pub struct TickOutcome {
    pub events: Vec<TickEvent>,
    /// The match ended this tick; the caller stops the scheduler.
    pub ended: bool,
}

/// Run the full pipeline once. No-op unless the room is running.
pub fn run_tick(
    state: &mut RoomState,
    cfg: &SimConfig,
    rng: &mut impl Rng,
    now: Instant,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    if state.phase != RoomPhase::Running {
        return outcome;
    }

    // 1. Zone damage-over-time.
    for id in combat::apply_zone_damage(state, cfg) {
        outcome.events.push(TickEvent::PlayerDied { player_id: id });
    }

    // 2. Bot AI and bot-side combat.
    step_bots(state, cfg, rng, now);

    // 3. Bullet advancement and resolution.
    for id in combat::update_bullets(state, cfg, rng, now) {
        outcome.events.push(TickEvent::PlayerDied { player_id: id });
    }

    // 4. Periodic horde.
    if now.duration_since(state.last_horde) >= cfg.horde_interval {
        let size = spawner::periodic_horde_size(state);
        spawner::spawn_horde(state, cfg, rng, size);
        state.last_horde = now;
    }

    // 5. Periodic zone shrink.
    if now.duration_since(state.last_shrink) >= cfg.shrink_interval {
        state.safe_zone.radius =
            (state.safe_zone.radius - cfg.shrink_step).max(cfg.min_zone_radius);
        state.last_shrink = now;
    }

    // 6. Zombie AI and contact damage.
    for id in step_zombies(state, cfg, rng) {
        outcome.events.push(TickEvent::PlayerDied { player_id: id });
    }

    // 7. Particle integration.
    combat::update_particles(state);

    // 8. Win condition.
    evaluate_win_condition(state, cfg, rng, &mut outcome);

    outcome
}

/// Move each bot, let it fire at the nearest zombie in range, and resolve
/// zombie contact. A bot killed by contact here converts into a
/// super-zombie where it fell.
fn step_bots(state: &mut RoomState, cfg: &SimConfig, rng: &mut impl Rng, now: Instant) {
    let mut fired = Vec::new();
    let mut conversions = Vec::new();

    {
        let RoomState {
            bots,
            zombies,
            obstacles,
            particles,
            safe_zone,
            ..
        } = state;

        for bot in bots.iter_mut().filter(|b| b.alive) {
            ai::move_bot(bot, safe_zone, obstacles, cfg, rng);

            let cooled = bot
                .last_shot
                .map_or(true, |t| now.duration_since(t) >= cfg.bot_fire_cooldown);
            if cooled {
                if let Some(i) =
                    ai::nearest_zombie_in_range((bot.x, bot.y), zombies, cfg.bot_fire_range)
                {
                    let target = (zombies[i].x, zombies[i].y);
                    fired.push(combat::spawn_bullet(
                        bot.center(),
                        target,
                        &cfg.bot_bullet,
                        BulletOwner::Bot,
                        now,
                    ));
                    bot.last_shot = Some(now);
                }
            }

            let bot_box = bot.aabb();
            // Zombies marked dead earlier in the tick await the bullet
            // step's sweep; they no longer bite.
            if zombies
                .iter()
                .any(|z| z.health > 0.0 && bot_box.overlaps(&z.aabb()))
            {
                combat::create_explosion(particles, bot.x, bot.y, "#00ff00", rng);
                if bot.take_damage(BOT_CONTACT_DAMAGE) {
                    conversions.push((bot.x, bot.y));
                }
            }
        }
    }

    state.bots.retain(|b| b.alive);
    state.bullets.extend(fired);
    for (x, y) in conversions {
        spawner::spawn_super_zombie(state, rng, x, y);
    }
}

/// Pursue, then deal contact damage to every overlapping player and bot.
/// Returns players killed by contact this tick.
fn step_zombies(state: &mut RoomState, cfg: &SimConfig, rng: &mut impl Rng) -> Vec<ClientId> {
    let mut died = Vec::new();

    let RoomState {
        players,
        bots,
        zombies,
        obstacles,
        particles,
        ..
    } = state;

    for i in 0..zombies.len() {
        if let Some(target) = ai::nearest_soldier(&zombies[i], players, bots) {
            ai::move_zombie(&mut zombies[i], target, obstacles, cfg);
        }
    }

    for zombie in zombies.iter() {
        let zombie_box = zombie.aabb();

        for player in players.iter_mut().filter(|p| p.alive) {
            if zombie_box.overlaps(&player.aabb()) {
                combat::create_explosion(particles, player.x, player.y, "#00ff00", rng);
                if player.take_damage(zombie.damage) {
                    died.push(player.id.clone());
                }
            }
        }
        for bot in bots.iter_mut().filter(|b| b.alive) {
            if zombie_box.overlaps(&bot.aabb()) {
                combat::create_explosion(particles, bot.x, bot.y, "#00ff00", rng);
                // Contact in this step kills without conversion; conversion
                // only happens in the bot step.
                bot.take_damage(zombie.damage);
            }
        }
    }

    state.zombies.retain(|z| z.health > 0.0);
    state.bots.retain(|b| b.alive);

    died
}

fn evaluate_win_condition(
    state: &mut RoomState,
    cfg: &SimConfig,
    rng: &mut impl Rng,
    outcome: &mut TickOutcome,
) {
    let alive = state.alive_count();

    if alive == 1 && state.helicopter.is_none() {
        spawner::spawn_helicopter(state, cfg, rng);
        outcome.events.push(TickEvent::HelicopterArrived);
        info!(room = %state.id, "helicopter spawned for the last survivor");
    }

    if let Some(heli) = state.helicopter {
        let heli_box = heli.aabb();
        let winner = state
            .players
            .iter()
            .filter(|p| p.alive && heli_box.overlaps(&p.aabb()))
            .map(|p| p.name.clone())
            .chain(
                state
                    .bots
                    .iter()
                    .filter(|b| b.alive && heli_box.overlaps(&b.aabb()))
                    .map(|b| b.name.clone()),
            )
            .next();

        if let Some(name) = winner {
            end_match(state, outcome, format!("{name} reached the helicopter! Victory!"));
            return;
        }
    }

    if alive == 0 {
        end_match(state, outcome, "Everyone is dead! Game over.".to_string());
    }
}

fn end_match(state: &mut RoomState, outcome: &mut TickOutcome, message: String) {
    info!(room = %state.id, %message, "match ended");
    state.phase = RoomPhase::Ended;
    outcome.events.push(TickEvent::GameOver { message });
    outcome.ended = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::game::entity::{Bot, Bullet, Helicopter, Player, Zombie};
    use crate::game::state::RoomId;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn running_state(bots: usize) -> (RoomState, SimConfig, StdRng) {
        let cfg = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(21);
        let mut state = RoomState::new(
            RoomId::generate(&mut rng),
            ClientId::new("host"),
            Difficulty::Easy,
            bots,
            &cfg,
            Instant::now(),
        );
        state.phase = RoomPhase::Running;
        (state, cfg, rng)
    }

    fn player(id: &str, x: f32, y: f32) -> Player {
        Player::new(
            ClientId::new(id),
            id.to_string(),
            x,
            y,
            "#ff0000".into(),
            Instant::now(),
        )
    }

    fn zombie_at(x: f32, y: f32) -> Zombie {
        Zombie::regular(x, y, 1.0, 1.0, "hsl(190, 70%, 40%)".into())
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_noop_unless_running() {
        let (mut state, cfg, mut rng) = running_state(0);
        state.phase = RoomPhase::Lobby;
        state.players.push(player("p1", 100.0, 100.0));
        state.zombies.push(zombie_at(100.0, 100.0));

        let outcome = run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert!(outcome.events.is_empty());
        assert_eq!(state.players[0].health, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zombie_contact_damages_player() {
        let (mut state, cfg, mut rng) = running_state(0);
        // Inside the zone so only contact damage applies.
        state.players.push(player("p1", 800.0, 600.0));
        state.zombies.push(zombie_at(802.0, 602.0));

        run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert!(state.players[0].health < 100.0);
        assert!(!state.particles.is_empty(), "contact explosion spawned");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bot_contact_death_converts_to_super_zombie() {
        let (mut state, cfg, mut rng) = running_state(1);
        state.players.push(player("p1", 100.0, 100.0));
        let mut bot = Bot::new("Soldier 1".into(), 800.0, 600.0, 2.0, (0.0, 0.0));
        bot.health = 5.0;
        state.bots.push(bot);
        state.zombies.push(zombie_at(800.0, 600.0));

        run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert!(state.bots.is_empty(), "fallen bot pruned");
        assert!(
            state.zombies.iter().any(|z| z.width == 30.0),
            "super-zombie spawned at the bot's position"
        );
        assert_eq!(state.score, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zone_killed_zombie_is_inert_same_tick() {
        let (mut state, cfg, mut rng) = running_state(1);
        state.players.push(player("p1", 800.0, 600.0));
        let mut bot = Bot::new("Soldier 1".into(), 100.0, 100.0, 2.0, (0.0, 0.0));
        bot.health = 5.0;
        state.bots.push(bot);
        // Outside the zone with less health than one tick of zone damage.
        let mut zombie = zombie_at(100.0, 100.0);
        zombie.health = 0.01;
        state.zombies.push(zombie);

        run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert_eq!(state.bots.len(), 1, "contact with the corpse dealt no damage");
        assert!(state.bots[0].alive);
        assert!(state.bullets.is_empty(), "bots do not fire at corpses");
        assert!(state.zombies.is_empty(), "corpse swept this tick");
        assert_eq!(state.score, 0, "no conversion awarded");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bot_fires_at_zombie_in_range() {
        let (mut state, cfg, mut rng) = running_state(1);
        state.players.push(player("p1", 100.0, 100.0));
        state
            .bots
            .push(Bot::new("Soldier 1".into(), 800.0, 600.0, 2.0, (0.0, 0.0)));
        state.zombies.push(zombie_at(900.0, 600.0));

        run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert!(
            state.bullets.iter().any(|b| b.owner == BulletOwner::Bot),
            "bot opened fire"
        );
        assert!(state.bots[0].last_shot.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bot_holds_fire_out_of_range() {
        let (mut state, cfg, mut rng) = running_state(1);
        state.players.push(player("p1", 100.0, 100.0));
        state
            .bots
            .push(Bot::new("Soldier 1".into(), 800.0, 600.0, 2.0, (0.0, 0.0)));
        state.zombies.push(zombie_at(200.0, 600.0));

        run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert!(state.bullets.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_horde_spawns_after_interval() {
        let (mut state, cfg, mut rng) = running_state(8);
        state.players.push(player("p1", 800.0, 600.0));
        let start = Instant::now();
        state.last_horde = start;
        state.last_shrink = start;

        let outcome = run_tick(&mut state, &cfg, &mut rng, start);
        assert!(state.zombies.is_empty());
        assert!(!outcome.ended);

        tokio::time::advance(cfg.horde_interval).await;
        run_tick(&mut state, &cfg, &mut rng, Instant::now());

        // No live bots, so the horde offsets the whole roster.
        assert_eq!(state.zombies.len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zone_shrinks_monotonically_to_floor() {
        let (mut state, cfg, mut rng) = running_state(0);
        state.players.push(player("p1", 800.0, 600.0));
        state.players.push(player("p2", 820.0, 600.0));
        state.safe_zone.radius = 110.0;

        tokio::time::advance(cfg.shrink_interval).await;
        run_tick(&mut state, &cfg, &mut rng, Instant::now());
        assert_eq!(state.safe_zone.radius, 100.0, "110 - 20 clamps to the floor");

        tokio::time::advance(cfg.shrink_interval).await;
        run_tick(&mut state, &cfg, &mut rng, Instant::now());
        assert_eq!(state.safe_zone.radius, 100.0, "never below the floor");
    }

    #[tokio::test(start_paused = true)]
    async fn test_helicopter_spawns_for_last_survivor() {
        let (mut state, cfg, mut rng) = running_state(0);
        state.players.push(player("p1", 800.0, 600.0));
        let mut dead = player("p2", 820.0, 700.0);
        dead.alive = false;
        dead.health = 0.0;
        state.players.push(dead);

        let outcome = run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert!(state.helicopter.is_some());
        assert!(outcome.events.contains(&TickEvent::HelicopterArrived));
        assert!(!outcome.ended);

        // Only one helicopter ever spawns.
        let first = state.helicopter;
        run_tick(&mut state, &cfg, &mut rng, Instant::now());
        assert_eq!(state.helicopter.map(|h| (h.x, h.y)), first.map(|h| (h.x, h.y)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaching_helicopter_wins() {
        let (mut state, cfg, mut rng) = running_state(0);
        let mut survivor = player("p1", 400.0, 400.0);
        survivor.name = "Ace".into();
        state.players.push(survivor);
        state.helicopter = Some(Helicopter::new(395.0, 395.0));

        let outcome = run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert!(outcome.ended);
        assert_eq!(state.phase, RoomPhase::Ended);
        assert!(outcome.events.iter().any(|e| matches!(
            e,
            TickEvent::GameOver { message } if message.contains("Ace")
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_wipe_is_a_draw() {
        let (mut state, cfg, mut rng) = running_state(0);
        let mut p = player("p1", 100.0, 100.0);
        p.alive = false;
        p.health = 0.0;
        state.players.push(p);

        let outcome = run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert!(outcome.ended);
        assert!(outcome.events.iter().any(|e| matches!(
            e,
            TickEvent::GameOver { message } if message.contains("Game over")
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_player_death_reported_once() {
        let (mut state, cfg, mut rng) = running_state(0);
        state.safe_zone.radius = 100.0;
        let mut doomed = player("p1", 100.0, 100.0);
        doomed.health = 0.01;
        state.players.push(doomed);
        state.players.push(player("p2", 800.0, 600.0));

        let outcome = run_tick(&mut state, &cfg, &mut rng, Instant::now());
        let deaths: Vec<_> = outcome
            .events
            .iter()
            .filter(|e| matches!(e, TickEvent::PlayerDied { .. }))
            .collect();
        assert_eq!(deaths.len(), 1);

        // Dead players take no further damage and emit no further events.
        let outcome = run_tick(&mut state, &cfg, &mut rng, Instant::now());
        assert!(outcome
            .events
            .iter()
            .all(|e| !matches!(e, TickEvent::PlayerDied { .. })));
        assert_eq!(state.players[0].health, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bullets_survive_between_ticks() {
        let (mut state, cfg, mut rng) = running_state(0);
        state.players.push(player("p1", 800.0, 600.0));
        state.players.push(player("p2", 100.0, 100.0));
        state.bullets.push(Bullet {
            x: 400.0,
            y: 300.0,
            vx: 2.0,
            vy: 0.0,
            life: 90,
            damage: 15.0,
            owner: BulletOwner::Player(ClientId::new("p1")),
            spawned: Instant::now(),
        });

        run_tick(&mut state, &cfg, &mut rng, Instant::now());

        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.bullets[0].x, 402.0);
        assert_eq!(state.bullets[0].life, 89);
    }
}
