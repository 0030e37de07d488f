//! Connection Registry
//!
//! Issues session identities and holds each live connection's outbound
//! channel. Identities come from a process-wide counter and are never
//! handed out twice.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::game::state::SessionId;
use crate::network::protocol::ServerMessage;

/// A registered connection.
#[derive(Debug)]
pub struct Connection {
    /// Session identity
    pub id: SessionId,
    /// Peer address
    pub addr: SocketAddr,
    /// Connection time
    pub connected_at: Instant,
    /// Outbound queue drained by the connection's writer task
    sender: mpsc::Sender<ServerMessage>,
}

/// Outcome of a non-blocking send to one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    /// Queued for the writer.
    Queued,
    /// Queue full; message dropped for this connection only.
    Full,
    /// Writer is gone; the connection is dead.
    Closed,
    /// No such connection.
    Unknown,
}

/// Live connections keyed by session identity.
#[derive(Debug)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: RwLock<HashMap<SessionId, Connection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry. The first identity issued is 1.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection and issue its identity.
    pub async fn register(&self, addr: SocketAddr, sender: mpsc::Sender<ServerMessage>) -> SessionId {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut connections = self.connections.write().await;
        connections.insert(id, Connection {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        });
        id
    }

    /// Remove a connection. Returns false if it was already gone.
    pub async fn unregister(&self, id: SessionId) -> bool {
        let removed = self.connections.write().await.remove(&id);
        match removed {
            Some(conn) => {
                debug!(
                    "Unregistered session {} from {} after {:?}",
                    conn.id,
                    conn.addr,
                    conn.connected_at.elapsed()
                );
                true
            }
            None => false,
        }
    }

    /// Whether `id` is registered.
    pub async fn contains(&self, id: SessionId) -> bool {
        self.connections.read().await.contains_key(&id)
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Queue a message for one connection without waiting.
    pub async fn send_to(&self, id: SessionId, message: ServerMessage) -> SendStatus {
        let connections = self.connections.read().await;
        match connections.get(&id) {
            Some(conn) => try_queue(&conn.sender, message),
            None => SendStatus::Unknown,
        }
    }

    /// Queue a batch of messages for every connection.
    ///
    /// Returns each connection's status. A connection gets the whole batch
    /// or none of it.
    pub async fn send_all(&self, messages: &[ServerMessage]) -> Vec<(SessionId, SendStatus)> {
        let connections = self.connections.read().await;
        connections
            .values()
            .map(|conn| (conn.id, try_queue_batch(&conn.sender, messages)))
            .collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn try_queue(sender: &mpsc::Sender<ServerMessage>, message: ServerMessage) -> SendStatus {
    match sender.try_send(message) {
        Ok(()) => SendStatus::Queued,
        Err(TrySendError::Full(_)) => SendStatus::Full,
        Err(TrySendError::Closed(_)) => SendStatus::Closed,
    }
}

fn try_queue_batch(sender: &mpsc::Sender<ServerMessage>, messages: &[ServerMessage]) -> SendStatus {
    match sender.try_reserve_many(messages.len()) {
        Ok(permits) => {
            for (permit, message) in permits.zip(messages) {
                permit.send(message.clone());
            }
            SendStatus::Queued
        }
        Err(TrySendError::Full(())) => SendStatus::Full,
        Err(TrySendError::Closed(())) => SendStatus::Closed,
    }
}
