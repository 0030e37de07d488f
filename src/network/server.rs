//! WebSocket Game Server
//!
//! Async WebSocket server for multiplayer connections.
//! Accepts clients, routes their messages into the world and runs the
//! tick loop that advances and broadcasts it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::config::ServerConfig;
use crate::core::rng::GameRng;
use crate::core::vec2::Vec2;
use crate::game::combat::{self, CombatOutcome, DamageEvent};
use crate::game::director::EnemyDirector;
use crate::game::events::GameEvent;
use crate::game::state::{SessionId, WorldState};
use crate::game::tick::TickScheduler;
use crate::network::broadcast::{deliver, DeliveryReport, Snapshot};
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::registry::ConnectionRegistry;

/// World shared between connection tasks and the tick loop.
pub type SharedWorld = Arc<RwLock<WorldState>>;

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Live connections.
    registry: Arc<ConnectionRegistry>,
    /// Authoritative world.
    world: SharedWorld,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            registry: Arc::new(ConnectionRegistry::new()),
            world: Arc::new(RwLock::new(WorldState::new())),
            shutdown_tx,
        }
    }

    /// Bind the configured address and run the server.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run the server on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let tick_world = self.world.clone();
        let tick_registry = self.registry.clone();
        let tick_config = self.config.clone();

        let tick_handle = tokio::spawn(async move {
            Self::run_tick_loop(tick_world, tick_registry, tick_config).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let count = self.registry.connection_count().await;
                            if count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        tick_handle.abort();

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let registry = self.registry.clone();
        let world = self.world.clone();
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(config.outbound_buffer);

            // Register session
            let id = registry.register(addr, msg_tx.clone()).await;
            world.write().await.add_player(id, config.bounds.center());

            // Welcome goes out before the writer starts draining snapshots
            let welcome = ServerMessage::Welcome { id };
            let sent = match welcome.to_json() {
                Ok(text) => ws_sender.send(Message::Text(text)).await.is_ok(),
                Err(e) => {
                    error!("Failed to serialize welcome: {}", e);
                    false
                }
            };
            if !sent {
                Self::disconnect(&registry, &world, id).await;
                return;
            }
            info!("Session {} joined from {}", id, addr);

            // Spawn message sender task
            let mut sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => {
                                        Self::handle_client_message(
                                            id,
                                            client_msg,
                                            &world,
                                            &config,
                                            &msg_tx,
                                        ).await;
                                    }
                                    Err(e) => {
                                        debug!("Invalid message from session {}: {}", id, e);
                                    }
                                }
                            }
                            Some(Ok(Message::Binary(_))) => {
                                debug!("Ignoring binary frame from session {}", id);
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Session {} closed the connection", id);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for session {}: {}", id, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = &mut sender_task => {
                        debug!("Writer for session {} stopped", id);
                        break;
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            sender_task.abort();
            Self::disconnect(&registry, &world, id).await;
        });
    }

    /// Handle a client message.
    async fn handle_client_message(
        id: SessionId,
        msg: ClientMessage,
        world: &SharedWorld,
        config: &ServerConfig,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        match msg {
            ClientMessage::Move { x, y } => {
                let updated = world.write().await.upsert_player_position(id, x, y);
                if !updated {
                    debug!("Dropped move from session {}", id);
                }
            }
            ClientMessage::BulletHit(hit) => {
                let event = match DamageEvent::new(hit.enemy_id, hit.damage_amount(), id) {
                    Ok(event) => event,
                    Err(e) => {
                        debug!("Rejected hit from session {}: {}", id, e);
                        return;
                    }
                };

                let outcome = {
                    let mut w = world.write().await;
                    combat::resolve(&mut w, event, config.points_per_kill)
                };
                Self::report_outcome(id, &outcome, sender).await;
            }
            ClientMessage::Bullet(bullet) => {
                if !config.legacy_proximity_hits {
                    debug!("Ignoring legacy bullet from session {}", id);
                    return;
                }
                let damage = match combat::validate_damage(bullet.damage_amount()) {
                    Ok(d) => d,
                    Err(e) => {
                        debug!("Rejected bullet from session {}: {}", id, e);
                        return;
                    }
                };

                let outcomes = {
                    let mut w = world.write().await;
                    combat::resolve_proximity(
                        &mut w,
                        Vec2::new(bullet.x, bullet.y),
                        damage,
                        id,
                        config.hit_radius,
                        config.points_per_kill,
                    )
                };
                for outcome in &outcomes {
                    Self::report_outcome(id, outcome, sender).await;
                }
            }
            ClientMessage::Status { dead } => {
                world.write().await.set_player_dead(id, dead);
                debug!("Session {} dead={}", id, dead);
            }
            ClientMessage::Ping { timestamp } => {
                let pong = ServerMessage::Pong {
                    timestamp,
                    server_time: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_millis() as u64,
                };
                if sender.send(pong).await.is_err() {
                    debug!("Dropped pong for session {}: writer closed", id);
                }
            }
        }
    }

    /// Log a combat outcome and credit the reporter on a kill.
    async fn report_outcome(
        id: SessionId,
        outcome: &CombatOutcome,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        match outcome.event() {
            Some(GameEvent::EnemyKilled { enemy_id, kind, .. }) => {
                info!("Session {} killed enemy {} ({:?})", id, enemy_id, kind);
            }
            Some(GameEvent::EnemyDamaged { enemy_id, remaining, .. }) => {
                debug!("Session {} hit enemy {}, {} health left", id, enemy_id, remaining);
            }
            _ => {}
        }

        if let Some((killer, score)) = outcome.event().and_then(GameEvent::kill_credit) {
            if killer == id && sender.send(ServerMessage::EnemyKilled { score }).await.is_err() {
                debug!("Dropped kill credit for session {}: writer closed", id);
            }
        }
    }

    /// Run the tick loop: movement every tick, spawns and broadcasts on
    /// their own cadences.
    async fn run_tick_loop(
        world: SharedWorld,
        registry: Arc<ConnectionRegistry>,
        config: ServerConfig,
    ) {
        let mut scheduler = TickScheduler::new(&config.tick);
        let rng = config.rng_seed.map(GameRng::new).unwrap_or_else(GameRng::from_clock);
        let mut director = EnemyDirector::new(config.director(), rng);

        let period = config.tick.tick_interval.max(Duration::from_millis(1));
        let mut tick_interval = interval(period);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first tick since it fires immediately
        tick_interval.tick().await;

        loop {
            tick_interval.tick().await;

            if let Some(report) =
                Self::advance_and_broadcast(&world, &registry, &mut scheduler, &mut director).await
            {
                for id in report.closed {
                    Self::disconnect(&registry, &world, id).await;
                }
            }
        }
    }

    /// Run one tick and, on broadcast ticks, push the resulting snapshot.
    ///
    /// The world guard is held until every connection has been queued, so a
    /// kill or a disconnect can never be followed by an older snapshot.
    async fn advance_and_broadcast(
        world: &SharedWorld,
        registry: &ConnectionRegistry,
        scheduler: &mut TickScheduler,
        director: &mut EnemyDirector,
    ) -> Option<DeliveryReport> {
        let mut w = world.write().await;
        let result = scheduler.step(&mut w, director);

        for event in &result.events {
            if let GameEvent::EnemySpawned { enemy_id, kind, position } = event {
                debug!("Tick {}: spawned {:?} enemy {} at {}", result.tick, kind, enemy_id, position);
            }
        }

        if !result.broadcast {
            return None;
        }

        let w = w.downgrade();
        let snapshot = Snapshot::capture(&w);
        let report = deliver(registry, &snapshot).await;
        drop(w);

        Some(report)
    }

    /// Drop a session from the registry and the world. Safe to call twice.
    async fn disconnect(registry: &ConnectionRegistry, world: &SharedWorld, id: SessionId) {
        let unregistered = registry.unregister(id).await;
        let removed = world.write().await.remove_player(id).is_some();
        if unregistered || removed {
            info!("Session {} cleaned up", id);
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Shared handle to the world.
    pub fn world(&self) -> SharedWorld {
        self.world.clone()
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.registry.connection_count().await
    }
}
