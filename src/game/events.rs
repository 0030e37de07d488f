//! Game Events
//!
//! What a tick or a hit resolution changed. The server logs them and routes
//! kill credits from them.

use crate::core::vec2::Vec2;
use crate::game::state::{EnemyId, EnemyKind, SessionId};

/// A single world change.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    /// Enemy director placed a new enemy.
    EnemySpawned {
        /// New enemy
        enemy_id: EnemyId,
        /// Rolled kind
        kind: EnemyKind,
        /// Spawn point on a world edge
        position: Vec2,
    },

    /// Enemy took damage and survived.
    EnemyDamaged {
        /// Enemy hit
        enemy_id: EnemyId,
        /// Session that reported the hit
        reporter: SessionId,
        /// Health left, always > 0
        remaining: i32,
    },

    /// Enemy health reached zero and it was removed.
    EnemyKilled {
        /// Removed enemy
        enemy_id: EnemyId,
        /// Its kind
        kind: EnemyKind,
        /// Session credited with the kill
        killer: SessionId,
        /// Killer's new total, `None` if the killer already left.
        score: Option<u32>,
    },
}

impl GameEvent {
    /// Enemy the event concerns.
    pub fn enemy_id(&self) -> EnemyId {
        match self {
            GameEvent::EnemySpawned { enemy_id, .. }
            | GameEvent::EnemyDamaged { enemy_id, .. }
            | GameEvent::EnemyKilled { enemy_id, .. } => *enemy_id,
        }
    }

    /// Kill credit owed to a session: `(session, new score)`.
    pub fn kill_credit(&self) -> Option<(SessionId, u32)> {
        match self {
            GameEvent::EnemyKilled { killer, score: Some(score), .. } => Some((*killer, *score)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_credit() {
        let kill = GameEvent::EnemyKilled {
            enemy_id: EnemyId(4),
            kind: EnemyKind::Normal,
            killer: SessionId(1),
            score: Some(10),
        };
        assert_eq!(kill.kill_credit(), Some((SessionId(1), 10)));
        assert_eq!(kill.enemy_id(), EnemyId(4));

        let orphan = GameEvent::EnemyKilled {
            enemy_id: EnemyId(5),
            kind: EnemyKind::Tank,
            killer: SessionId(2),
            score: None,
        };
        assert_eq!(orphan.kill_credit(), None);

        let hit = GameEvent::EnemyDamaged {
            enemy_id: EnemyId(6),
            reporter: SessionId(1),
            remaining: 20,
        };
        assert_eq!(hit.kill_credit(), None);
    }
}
