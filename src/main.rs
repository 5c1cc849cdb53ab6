//! Outbreak Server
//!
//! Authoritative server for the Outbreak survival shooter. Runs a headless
//! demo match between two simulated clients.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use outbreak::{
    room::events::{ClientEvent, KeySet, ServerEvent},
    room::registry::CLIENT_QUEUE_DEPTH,
    ClientId, Difficulty, RoomManager, SimConfig, VERSION,
};

#[tokio::main]
async fn main() {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let config = SimConfig::default();
    info!("Outbreak Server v{}", VERSION);
    info!(
        "World: {}x{}, tick: {:?}, max players per room: {}",
        config.world_width, config.world_height, config.tick_interval, config.max_players
    );

    demo_match(Arc::new(config)).await;
}

/// Drive a full match with two scripted clients and log the highlights.
async fn demo_match(config: Arc<SimConfig>) {
    info!("=== Starting Demo Match ===");

    let manager = RoomManager::new(config);

    let host = ClientId::new("demo-host");
    let guest = ClientId::new("demo-guest");
    let (host_tx, mut host_rx) = mpsc::channel(CLIENT_QUEUE_DEPTH);
    let (guest_tx, mut guest_rx) = mpsc::channel(CLIENT_QUEUE_DEPTH);

    manager
        .handle_event(
            &host,
            ClientEvent::CreateRoom {
                player_name: Some("Alice".into()),
                difficulty: Some(Difficulty::Medium),
                bot_count: Some(3),
            },
            &host_tx,
        )
        .await;

    let room_id = match host_rx.recv().await {
        Some(ServerEvent::RoomCreated { room_id, .. }) => room_id,
        other => {
            info!("demo aborted, unexpected event: {other:?}");
            return;
        }
    };
    info!("Room {room_id} created");

    manager
        .handle_event(
            &guest,
            ClientEvent::JoinRoom {
                room_id: room_id.to_string(),
                player_name: Some("Bob".into()),
            },
            &guest_tx,
        )
        .await;

    // Skip the lobby countdown.
    manager.handle_event(&host, ClientEvent::StartGame, &host_tx).await;

    let mut updates = 0u64;
    let mut last_score = 0;
    loop {
        let Some(event) = guest_rx.recv().await else { break };
        match event {
            ServerEvent::GameStart(initial) => {
                info!(
                    "Match started: {} players, {} bots, {} zombies",
                    initial.players.len(),
                    initial.bots.len(),
                    initial.zombies.len()
                );
            }
            ServerEvent::GameUpdate(update) => {
                updates += 1;

                if update.score != last_score {
                    info!("Score: {} (tick {updates})", update.score);
                    last_score = update.score;
                }

                // Both clients drift toward the zone center and shoot at
                // the nearest zombie now and then.
                if updates % 8 == 0 {
                    let keys = KeySet { up: updates % 16 == 0, left: true, ..Default::default() };
                    manager
                        .handle_event(&host, ClientEvent::PlayerInput { keys }, &host_tx)
                        .await;
                    manager
                        .handle_event(&guest, ClientEvent::PlayerInput { keys }, &guest_tx)
                        .await;
                }
                if updates % 20 == 0 {
                    if let Some(z) = update.zombies.first() {
                        let shot = ClientEvent::Shoot {
                            target_x: z.x,
                            target_y: z.y,
                            timestamp_ms: unix_millis(),
                        };
                        manager.handle_event(&host, shot.clone(), &host_tx).await;
                        manager.handle_event(&guest, shot, &guest_tx).await;
                    }
                }

                // Safety stop for the demo.
                if updates > 7_200 {
                    info!("Demo cap reached after {updates} updates");
                    break;
                }
            }
            ServerEvent::PlayerDied { player_id } => info!("Player {player_id} died"),
            ServerEvent::Message { text } => info!("{text}"),
            ServerEvent::GameOver { message } => {
                info!("=== {message} ===");
                break;
            }
            _ => {}
        }
    }

    info!("Demo finished after {updates} snapshots, final score {last_score}");
    manager.shutdown().await;
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
