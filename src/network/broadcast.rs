//! Snapshot Broadcast
//!
//! Full-state snapshots pushed to every connection on each broadcast tick.
//! There are no deltas: every snapshot stands on its own.

use tracing::debug;

use crate::game::state::{SessionId, WorldState};
use crate::network::protocol::{EnemySnapshot, PlayerSnapshot, ServerMessage};
use crate::network::registry::{ConnectionRegistry, SendStatus};

/// Copy of the world taken under the lock.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// All sessions
    pub players: Vec<PlayerSnapshot>,
    /// All live enemies
    pub enemies: Vec<EnemySnapshot>,
}

impl Snapshot {
    /// Capture the current world.
    pub fn capture(world: &WorldState) -> Self {
        Self {
            players: world.players().map(PlayerSnapshot::from).collect(),
            enemies: world.enemies().map(EnemySnapshot::from).collect(),
        }
    }

    /// Outbound messages: `players` first, then `enemies`.
    pub fn messages(&self) -> [ServerMessage; 2] {
        [
            ServerMessage::Players { players: self.players.clone() },
            ServerMessage::Enemies { enemies: self.enemies.clone() },
        ]
    }
}

/// What happened when a snapshot went out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections that got the full snapshot
    pub delivered: usize,
    /// Connections whose queue was full; they skip this snapshot
    pub lagging: Vec<SessionId>,
    /// Connections whose writer is gone; treat as disconnected
    pub closed: Vec<SessionId>,
}

/// Push a snapshot to every registered connection.
///
/// Each connection gets both messages or neither. Callers keep the world
/// guard the snapshot came from until this returns, so no later change can
/// be queued ahead of an older snapshot.
pub async fn deliver(registry: &ConnectionRegistry, snapshot: &Snapshot) -> DeliveryReport {
    let messages = snapshot.messages();
    let mut report = DeliveryReport::default();

    for (id, status) in registry.send_all(&messages).await {
        match status {
            SendStatus::Queued => report.delivered += 1,
            SendStatus::Full => {
                debug!("Session {} lagging, snapshot dropped", id);
                report.lagging.push(id);
            }
            SendStatus::Closed | SendStatus::Unknown => report.closed.push(id),
        }
    }

    report
}
