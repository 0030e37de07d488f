//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every message is a JSON object with a `type` discriminator.

use serde::{Serialize, Deserialize};
use serde_json::Value;

use crate::game::state::{Enemy, EnemyId, Session, SessionId};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Overwrite the sender's position.
    Move {
        /// New x
        x: f64,
        /// New y
        y: f64,
    },

    /// Hit report against a specific enemy.
    BulletHit(BulletHit),

    /// Legacy hit report by bullet position.
    Bullet(BulletAt),

    /// Sender's liveness changed.
    Status {
        /// Whether the sender is dead
        dead: bool,
    },

    /// Ping for latency measurement.
    Ping {
        /// Client clock, echoed back
        timestamp: u64,
    },
}

/// Identity-based hit report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletHit {
    /// Enemy the bullet hit.
    #[serde(rename = "enemyId")]
    pub enemy_id: EnemyId,
    /// Reported damage; any JSON value, validated by the combat resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<Value>,
}

impl BulletHit {
    /// Reported damage as a number, `None` if absent or not numeric.
    pub fn damage_amount(&self) -> Option<f64> {
        numeric(self.damage.as_ref())
    }
}

/// Position-based hit report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletAt {
    /// Bullet x
    pub x: f64,
    /// Bullet y
    pub y: f64,
    /// Reported damage; any JSON value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<Value>,
}

impl BulletAt {
    /// Reported damage as a number, `None` if absent or not numeric.
    pub fn damage_amount(&self) -> Option<f64> {
        numeric(self.damage.as_ref())
    }
}

fn numeric(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64)
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Identity assigned on connect.
    Welcome {
        /// Session identity
        id: SessionId,
    },

    /// Every connected player.
    Players {
        /// Ascending by id
        players: Vec<PlayerSnapshot>,
    },

    /// Every live enemy.
    Enemies {
        /// Ascending by id
        enemies: Vec<EnemySnapshot>,
    },

    /// Sent to the killer only.
    EnemyKilled {
        /// Killer's cumulative score
        score: u32,
    },

    /// Pong response.
    Pong {
        /// Echo of the ping's timestamp
        timestamp: u64,
        /// Server clock in Unix milliseconds
        #[serde(rename = "serverTime")]
        server_time: u64,
    },
}

/// Player entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Session identity
    pub id: SessionId,
    /// Position x
    pub x: f64,
    /// Position y
    pub y: f64,
}

impl From<&Session> for PlayerSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            x: session.position.x,
            y: session.position.y,
        }
    }
}

/// Enemy entry in a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    /// Enemy identity
    pub id: EnemyId,
    /// Position x
    pub x: f64,
    /// Position y
    pub y: f64,
    /// Remaining health (always > 0)
    pub health: i32,
}

impl From<&Enemy> for EnemySnapshot {
    fn from(enemy: &Enemy) -> Self {
        Self {
            id: enemy.id,
            x: enemy.position.x,
            y: enemy.position.y,
            health: enemy.health,
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
