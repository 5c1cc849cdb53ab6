//! Room Registry
//!
//! Process-wide index of live rooms plus the per-room connection fan-out.
//! Rooms are shared as `Arc<RwLock<Room>>`; background tasks hold weak
//! handles (the id) and re-look-up on wake, so a torn-down room makes a
//! late timer a no-op instead of a panic.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::game::entity::ClientId;
use crate::game::state::{RoomId, RoomState};
use crate::room::events::ServerEvent;

/// Outbound queue depth per connection. A client that falls this far
/// behind starts losing snapshots rather than stalling the room.
pub const CLIENT_QUEUE_DEPTH: usize = 256;

/// Background tasks owned by one room.
#[derive(Debug, Default)]
pub struct RoomTimers {
    pub countdown: Option<JoinHandle<()>>,
    pub ticker: Option<JoinHandle<()>>,
    pub restart: Option<JoinHandle<()>>,
}

impl RoomTimers {
    /// Abort every pending task. Safe to call on tasks that already
    /// finished.
    pub fn abort_all(&mut self) {
        for handle in [
            self.countdown.take(),
            self.ticker.take(),
            self.restart.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
    }
}

/// One live room: simulation state, connected clients, timers.
#[derive(Debug)]
pub struct Room {
    pub state: RoomState,
    senders: BTreeMap<ClientId, mpsc::Sender<ServerEvent>>,
    pub timers: RoomTimers,
}

impl Room {
    pub fn new(state: RoomState) -> Self {
        Self {
            state,
            senders: BTreeMap::new(),
            timers: RoomTimers::default(),
        }
    }

    /// Register a connection's outbound queue.
    pub fn attach(&mut self, client: ClientId, sender: mpsc::Sender<ServerEvent>) {
        self.senders.insert(client, sender);
    }

    pub fn detach(&mut self, client: &ClientId) {
        self.senders.remove(client);
    }

    /// Queue an event for one client. Drops on a full or closed queue.
    pub fn send_to(&self, client: &ClientId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(client) {
            if let Err(err) = sender.try_send(event) {
                debug!(room = %self.state.id, %client, %err, "dropping event for client");
            }
        }
    }

    /// Queue an event for every connected client.
    pub fn broadcast(&self, event: ServerEvent) {
        for (client, sender) in &self.senders {
            if let Err(err) = sender.try_send(event.clone()) {
                debug!(room = %self.state.id, %client, %err, "dropping broadcast for client");
            }
        }
    }
}

/// Shared index of rooms and of which room each connection is in.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<BTreeMap<RoomId, Arc<RwLock<Room>>>>,
    clients: RwLock<BTreeMap<ClientId, RoomId>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register a room under a freshly generated id. Generation
    /// and insertion happen under one write lock, so a concurrent create
    /// can never claim the same id.
    pub async fn allocate(&self, build: impl FnOnce(RoomId) -> Room) -> Arc<RwLock<Room>> {
        let mut rooms = self.rooms.write().await;
        let id = loop {
            let candidate = RoomId::generate(&mut rand::thread_rng());
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let shared = Arc::new(RwLock::new(build(id.clone())));
        rooms.insert(id, shared.clone());
        shared
    }

    pub async fn get(&self, id: &RoomId) -> Option<Arc<RwLock<Room>>> {
        self.rooms.read().await.get(id).cloned()
    }

    /// The room a connection currently belongs to, if any.
    pub async fn room_of(&self, client: &ClientId) -> Option<(RoomId, Arc<RwLock<Room>>)> {
        let id = self.clients.read().await.get(client).cloned()?;
        let room = self.get(&id).await?;
        Some((id, room))
    }

    pub async fn bind_client(&self, client: ClientId, room: RoomId) {
        self.clients.write().await.insert(client, room);
    }

    pub async fn unbind_client(&self, client: &ClientId) {
        self.clients.write().await.remove(client);
    }

    /// Drop a room and every client binding pointing at it. The caller is
    /// responsible for aborting its timers first.
    pub async fn remove(&self, id: &RoomId) -> Option<Arc<RwLock<Room>>> {
        let removed = self.rooms.write().await.remove(id);
        if removed.is_some() {
            self.clients.write().await.retain(|_, bound| bound != id);
        }
        removed
    }

    /// Ids of every live room, for shutdown sweeps.
    pub async fn all_ids(&self) -> Vec<RoomId> {
        self.rooms.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}
