//! Room Lifecycle Manager
//!
//! The orchestration layer between connections and the simulation: room
//! creation and admission, the auto-start countdown, input and shoot
//! handling, the per-room tick task, match end, automatic restart, and
//! teardown. Cheap to clone; every background task carries its own copy
//! and re-looks-up its room by id on wake.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::time::{interval, sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::{Difficulty, SimConfig};
use crate::game::collision::{blocked_by_obstacles, Aabb};
use crate::game::entity::{BulletOwner, ClientId};
use crate::game::state::{RoomId, RoomPhase, RoomState};
use crate::game::{combat, tick};
use crate::room::error::RoomError;
use crate::room::events::{ClientEvent, GameUpdate, InitialState, KeySet, ServerEvent};
use crate::room::registry::{Room, RoomRegistry};

/// Shared handle to the room layer.
#[derive(Clone)]
pub struct RoomManager {
    registry: Arc<RoomRegistry>,
    config: Arc<SimConfig>,
}

impl RoomManager {
    pub fn new(config: Arc<SimConfig>) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new()),
            config,
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Dispatch one inbound event. Recoverable failures are reported back
    /// on the client's own queue rather than bubbling up.
    pub async fn handle_event(
        &self,
        client: &ClientId,
        event: ClientEvent,
        sender: &mpsc::Sender<ServerEvent>,
    ) {
        let result = match event {
            ClientEvent::CreateRoom {
                player_name,
                difficulty,
                bot_count,
            } => self
                .create_room(client.clone(), player_name, difficulty, bot_count, sender.clone())
                .await
                .map(|_| ()),
            ClientEvent::JoinRoom { room_id, player_name } => {
                self.join_room(client.clone(), &room_id, player_name, sender.clone())
                    .await
            }
            ClientEvent::PlayerInput { keys } => {
                self.handle_input(client, keys).await;
                Ok(())
            }
            ClientEvent::Shoot {
                target_x,
                target_y,
                timestamp_ms,
            } => {
                self.handle_shoot(client, (target_x, target_y), timestamp_ms)
                    .await;
                Ok(())
            }
            ClientEvent::StartGame => self.start_game(client).await,
            ClientEvent::RestartGame => self.restart_game(client).await,
            ClientEvent::Disconnect => {
                self.handle_disconnect(client).await;
                Ok(())
            }
        };

        if let Err(err) = result {
            debug!(%client, %err, "rejected client event");
            let _ = sender.try_send(ServerEvent::Error { message: err.to_string() });
        }
    }

    /// Allocate a room with the caller as host and first player.
    pub async fn create_room(
        &self,
        client: ClientId,
        player_name: Option<String>,
        difficulty: Option<Difficulty>,
        bot_count: Option<usize>,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Result<RoomId, RoomError> {
        if self.registry.room_of(&client).await.is_some() {
            return Err(RoomError::InvalidInput("already in a room".into()));
        }

        let difficulty = difficulty.unwrap_or_default();
        let bots = self.config.clamp_bot_count(bot_count);
        let now = Instant::now();

        let shared = self
            .registry
            .allocate(|id| {
                let mut state =
                    RoomState::new(id, client.clone(), difficulty, bots, &self.config, now);
                state.add_player(
                    client.clone(),
                    player_name.unwrap_or_else(|| "Host".to_string()),
                    &self.config,
                    &mut rand::thread_rng(),
                    now,
                );
                let mut room = Room::new(state);
                room.attach(client.clone(), sender);
                room
            })
            .await;

        let (id, players) = {
            let room = shared.read().await;
            let players = room.state.players.iter().map(Into::into).collect();
            (room.state.id.clone(), players)
        };
        self.registry.bind_client(client.clone(), id.clone()).await;

        info!(room = %id, host = %client, ?difficulty, bots, "room created");
        shared
            .read()
            .await
            .send_to(&client, ServerEvent::RoomCreated { room_id: id.clone(), players });

        Ok(id)
    }

    /// Admit a player into an existing room. Arms the auto-start countdown
    /// when the roster first reaches two.
    pub async fn join_room(
        &self,
        client: ClientId,
        room_id: &str,
        player_name: Option<String>,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Result<(), RoomError> {
        if self.registry.room_of(&client).await.is_some() {
            return Err(RoomError::InvalidInput("already in a room".into()));
        }

        let id = RoomId::parse(room_id);
        let shared = self
            .registry
            .get(&id)
            .await
            .ok_or_else(|| RoomError::RoomNotFound(id.clone()))?;

        let arm_countdown = {
            let mut room = shared.write().await;
            if room.state.players.len() >= self.config.max_players {
                return Err(RoomError::RoomFull(id));
            }

            // Ids come from the transport and need not be ASCII.
            let name = player_name.unwrap_or_else(|| {
                format!("Player {}", client.as_str().chars().take(4).collect::<String>())
            });
            let now = Instant::now();
            room.state
                .add_player(client.clone(), name, &self.config, &mut rand::thread_rng(), now);
            room.attach(client.clone(), sender);

            let players: Vec<_> = room.state.players.iter().map(Into::into).collect();
            room.send_to(
                &client,
                ServerEvent::RoomJoined { room_id: room.state.id.clone(), players: players.clone() },
            );
            room.broadcast(ServerEvent::PlayerJoined { players });

            let arm = room.state.players.len() >= 2
                && room.state.phase == RoomPhase::Lobby
                && !room.state.countdown_armed;
            if arm {
                room.state.countdown_armed = true;
                room.state.phase = RoomPhase::Countdown;
            }
            arm
        };
        self.registry.bind_client(client.clone(), id.clone()).await;
        info!(room = %id, player = %client, "player joined");

        if arm_countdown {
            let handle = tokio::spawn(self.clone().run_countdown(id.clone()));
            shared.write().await.timers.countdown = Some(handle);
        }

        Ok(())
    }

    /// Broadcast the 1 Hz countdown, then start the match on expiry if it
    /// has not started (or vanished) in the meantime.
    async fn run_countdown(self, id: RoomId) {
        let total = self.config.auto_start_delay.as_secs();
        for seconds in (1..=total).rev() {
            let Some(shared) = self.registry.get(&id).await else { return };
            shared
                .read()
                .await
                .broadcast(ServerEvent::AutoStartCountdown { seconds });
            sleep(std::time::Duration::from_secs(1)).await;
        }

        let Some(shared) = self.registry.get(&id).await else { return };
        let should_start = {
            let room = shared.read().await;
            room.state.phase == RoomPhase::Countdown && room.state.players.len() >= 2
        };
        if should_start {
            info!(room = %id, "countdown expired, starting match");
            self.start_match(&id, &shared).await;
        }
    }

    /// Manual start by the host. Silently a no-op if already started.
    pub async fn start_game(&self, client: &ClientId) -> Result<(), RoomError> {
        let (id, shared) = self
            .registry
            .room_of(client)
            .await
            .ok_or(RoomError::NotInRoom)?;

        {
            let room = shared.read().await;
            if !room.state.is_host(client) {
                return Err(RoomError::Unauthorized);
            }
            if matches!(room.state.phase, RoomPhase::Running | RoomPhase::Ended) {
                return Ok(());
            }
        }

        info!(room = %id, host = %client, "manual match start");
        self.start_match(&id, &shared).await;
        Ok(())
    }

    /// Populate the world, announce the initial state, and begin ticking.
    /// One lock scope end to end: the ticker handle must be stored before
    /// the countdown task, which may be the caller, gets aborted.
    async fn start_match(&self, id: &RoomId, shared: &Arc<tokio::sync::RwLock<Room>>) {
        let mut room = shared.write().await;
        if room.state.phase == RoomPhase::Running {
            return;
        }
        room.state
            .begin_match(&self.config, &mut rand::thread_rng(), Instant::now());
        room.broadcast(ServerEvent::GameStart(InitialState::capture(&room.state)));
        room.timers.ticker = Some(tokio::spawn(self.clone().run_ticker(id.clone())));
        if let Some(handle) = room.timers.countdown.take() {
            handle.abort();
        }
    }

    /// The per-room tick task. Exits when the room vanishes or stops
    /// running; on a natural match end it schedules the auto-restart.
    async fn run_ticker(self, id: RoomId) {
        let mut ticker = interval(self.config.tick_interval);
        loop {
            ticker.tick().await;

            let Some(shared) = self.registry.get(&id).await else { return };
            let mut room = shared.write().await;
            if room.state.phase != RoomPhase::Running {
                return;
            }

            let outcome = tick::run_tick(
                &mut room.state,
                &self.config,
                &mut rand::thread_rng(),
                Instant::now(),
            );

            for event in outcome.events {
                match event {
                    tick::TickEvent::PlayerDied { player_id } => {
                        room.broadcast(ServerEvent::PlayerDied { player_id });
                    }
                    tick::TickEvent::HelicopterArrived => {
                        room.broadcast(ServerEvent::Message {
                            text: "The helicopter has arrived! Reach it to win!".to_string(),
                        });
                    }
                    tick::TickEvent::GameOver { message } => {
                        room.broadcast(ServerEvent::GameOver { message });
                    }
                }
            }

            room.broadcast(ServerEvent::GameUpdate(GameUpdate::capture(
                &room.state,
                self.config.max_snapshot_particles,
            )));

            if outcome.ended {
                let handle = tokio::spawn(self.clone().auto_restart(id.clone()));
                room.timers.restart = Some(handle);
                return;
            }
        }
    }

    /// `run_ticker` and `run_auto_restart` schedule each other across
    /// match ends; boxing this link keeps their future types from being
    /// mutually recursive.
    fn auto_restart(self, id: RoomId) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(self.run_auto_restart(id))
    }

    /// Restart the match automatically a while after it ends, unless the
    /// room was torn down or restarted manually in the meantime.
    async fn run_auto_restart(self, id: RoomId) {
        sleep(self.config.restart_delay).await;
        let Some(shared) = self.registry.get(&id).await else { return };
        let still_ended = shared.read().await.state.phase == RoomPhase::Ended;
        if still_ended {
            info!(room = %id, "auto-restarting match");
            self.restart_match(&id, &shared).await;
        }
    }

    /// Manual restart by the host.
    pub async fn restart_game(&self, client: &ClientId) -> Result<(), RoomError> {
        let (id, shared) = self
            .registry
            .room_of(client)
            .await
            .ok_or(RoomError::NotInRoom)?;

        if !shared.read().await.state.is_host(client) {
            return Err(RoomError::Unauthorized);
        }

        info!(room = %id, host = %client, "manual match restart");
        self.restart_match(&id, &shared).await;
        Ok(())
    }

    /// One lock scope end to end, like `start_match`: no await may sit
    /// between taking the old handles and storing the new ticker's.
    async fn restart_match(&self, id: &RoomId, shared: &Arc<tokio::sync::RwLock<Room>>) {
        let mut room = shared.write().await;
        if let Some(handle) = room.timers.countdown.take() {
            handle.abort();
        }
        if let Some(handle) = room.timers.ticker.take() {
            handle.abort();
        }
        // A pending auto-restart may be the task running us; just drop
        // the handle. It re-checks the phase and no-ops.
        room.timers.restart.take();
        room.state
            .reset_for_restart(&self.config, &mut rand::thread_rng(), Instant::now());
        room.broadcast(ServerEvent::GameRestarted(InitialState::capture(&room.state)));
        room.timers.ticker = Some(tokio::spawn(self.clone().run_ticker(id.clone())));
    }

    /// Apply one input frame: axis-aligned movement, obstacle rejection,
    /// world clamp. Silently ignored unless the room is running and the
    /// player is alive.
    pub async fn handle_input(&self, client: &ClientId, keys: KeySet) {
        let Some((_, shared)) = self.registry.room_of(client).await else { return };
        let mut room = shared.write().await;
        if room.state.phase != RoomPhase::Running {
            return;
        }

        let (world_w, world_h) = (self.config.world_width, self.config.world_height);
        let obstacles = std::mem::take(&mut room.state.obstacles);
        if let Some(player) = room.state.player_mut(client) {
            if player.alive {
                player.last_input = Instant::now();

                let mut nx = player.x;
                let mut ny = player.y;
                if keys.up {
                    ny -= player.speed;
                }
                if keys.down {
                    ny += player.speed;
                }
                if keys.left {
                    nx -= player.speed;
                }
                if keys.right {
                    nx += player.speed;
                }

                if !blocked_by_obstacles(&Aabb::new(nx, ny, player.width, player.height), &obstacles)
                {
                    player.x = nx;
                    player.y = ny;
                }
                player.x = player.x.clamp(0.0, world_w - player.width);
                player.y = player.y.clamp(0.0, world_h - player.height);
            }
        }
        room.state.obstacles = obstacles;
    }

    /// Fire a bullet toward a world point. Drops silently on cooldown or
    /// when the client timestamp is too far from server time.
    pub async fn handle_shoot(&self, client: &ClientId, target: (f32, f32), timestamp_ms: u64) {
        let server_ms = unix_millis();
        let skew_ms = server_ms.abs_diff(timestamp_ms);
        if skew_ms > self.config.shoot_staleness_ms {
            let err = RoomError::StaleEvent { skew_ms };
            debug!(%client, %err, "dropping shoot event");
            return;
        }

        let Some((_, shared)) = self.registry.room_of(client).await else { return };
        let mut room = shared.write().await;
        if room.state.phase != RoomPhase::Running {
            return;
        }

        let now = Instant::now();
        let spec = self.config.player_bullet;
        let cooldown = self.config.shoot_cooldown;

        let bullet = match room.state.player_mut(client) {
            Some(player) if player.alive => {
                let cooled = player
                    .last_shot
                    .map_or(true, |t| now.duration_since(t) >= cooldown);
                if !cooled {
                    return;
                }
                player.last_shot = Some(now);
                combat::spawn_bullet(
                    player.center(),
                    target,
                    &spec,
                    BulletOwner::Player(client.clone()),
                    now,
                )
            }
            _ => return,
        };
        room.state.bullets.push(bullet);
    }

    /// Remove a departing connection. An empty room is torn down; a host
    /// leaving mid-match force-ends it; otherwise the roster update is
    /// broadcast and, if needed, the host role moves to the earliest
    /// remaining player.
    pub async fn handle_disconnect(&self, client: &ClientId) {
        let Some((id, shared)) = self.registry.room_of(client).await else { return };
        self.registry.unbind_client(client).await;

        let teardown = {
            let mut room = shared.write().await;
            room.detach(client);
            if !room.state.remove_player(client) {
                return;
            }
            info!(room = %id, player = %client, "player left");

            if room.state.players.is_empty() {
                true
            } else if room.state.is_host(client) {
                if room.state.phase == RoomPhase::Running {
                    warn!(room = %id, "host left mid-match, ending game");
                    room.broadcast(ServerEvent::GameOver {
                        message: "The host left the game. Game over.".to_string(),
                    });
                    true
                } else {
                    room.state.host = room.state.players[0].id.clone();
                    info!(room = %id, new_host = %room.state.host, "host role reassigned");
                    let players = room.state.players.iter().map(Into::into).collect();
                    room.broadcast(ServerEvent::PlayerLeft { players });
                    false
                }
            } else {
                let players = room.state.players.iter().map(Into::into).collect();
                room.broadcast(ServerEvent::PlayerLeft { players });
                false
            }
        };

        if teardown {
            self.teardown(&id).await;
        }
    }

    /// Cancel a room's timers and drop it from the registry.
    pub async fn teardown(&self, id: &RoomId) {
        if let Some(shared) = self.registry.remove(id).await {
            shared.write().await.timers.abort_all();
            info!(room = %id, "room torn down");
        }
    }

    /// Tear down every room. Used on server shutdown.
    pub async fn shutdown(&self) {
        for id in self.registry.all_ids().await {
            self.teardown(&id).await;
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
