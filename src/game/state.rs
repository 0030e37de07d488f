//! World State Definitions
//!
//! The single owned record of every connected session and every live enemy.
//! Uses BTreeMap so iteration order (and with it nearest-target tie-breaks)
//! follows ascending ids.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

// =============================================================================
// IDENTITIES
// =============================================================================

/// Identity of a connected session.
///
/// Issued by the connection registry, never reused while the process lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an enemy, allocated by [`WorldState::allocate_enemy_id`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnemyId(pub u64);

impl fmt::Display for EnemyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Server-side record of one connected player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Session identity
    pub id: SessionId,
    /// Last reported position
    pub position: Vec2,
    /// Liveness flag (false = alive)
    pub dead: bool,
    /// Accumulated kill score
    pub score: u32,
}

impl Session {
    /// Create a live session at `position`.
    pub fn new(id: SessionId, position: Vec2) -> Self {
        Self {
            id,
            position,
            dead: false,
            score: 0,
        }
    }
}

// =============================================================================
// ENEMY
// =============================================================================

/// Enemy archetype. Only affects starting health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline enemy
    Normal,
    /// Fragile
    Fast,
    /// Heavy
    Tank,
}

impl EnemyKind {
    /// All kinds, in declaration order.
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Normal, EnemyKind::Fast, EnemyKind::Tank];

    /// Starting health for this kind.
    pub fn starting_health(self) -> i32 {
        match self {
            EnemyKind::Tank => 200,
            EnemyKind::Fast => 50,
            EnemyKind::Normal => 100,
        }
    }
}

/// A live enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Enemy identity
    pub id: EnemyId,
    /// Archetype
    pub kind: EnemyKind,
    /// Current position
    pub position: Vec2,
    /// Remaining health (removed once <= 0)
    pub health: i32,
}

impl Enemy {
    /// Create an enemy with its kind's starting health.
    pub fn new(id: EnemyId, kind: EnemyKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            health: kind.starting_health(),
        }
    }
}

// =============================================================================
// WORLD STATE
// =============================================================================

/// Complete authoritative world.
///
/// Not synchronized by itself: the server shares it behind a single lock,
/// and every logical step (a tick, a hit resolution) runs under one guard.
#[derive(Debug)]
pub struct WorldState {
    /// Connected sessions
    sessions: BTreeMap<SessionId, Session>,
    /// Live enemies, ordered by id (spawn order)
    enemies: BTreeMap<EnemyId, Enemy>,
    /// Next enemy id to hand out
    next_enemy_id: u64,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState {
    /// Create an empty world.
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            enemies: BTreeMap::new(),
            next_enemy_id: 1,
        }
    }

    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    /// Add a session for a freshly registered connection.
    pub fn add_player(&mut self, id: SessionId, position: Vec2) {
        self.sessions.insert(id, Session::new(id, position));
    }

    /// Remove a session. Returns the removed record, if any.
    pub fn remove_player(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    /// Overwrite a session's position (last write wins).
    ///
    /// Only touches sessions that exist: a move arriving after disconnect
    /// is a no-op. Non-finite coordinates are rejected.
    pub fn upsert_player_position(&mut self, id: SessionId, x: f64, y: f64) -> bool {
        let position = Vec2::new(x, y);
        if !position.is_finite() {
            return false;
        }
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.position = position;
                true
            }
            None => false,
        }
    }

    /// Set a session's liveness flag.
    pub fn set_player_dead(&mut self, id: SessionId, dead: bool) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.dead = dead;
                true
            }
            None => false,
        }
    }

    /// Add kill points to a session. Returns the new total.
    pub fn credit_kill(&mut self, id: SessionId, points: u32) -> Option<u32> {
        let session = self.sessions.get_mut(&id)?;
        session.score = session.score.saturating_add(points);
        Some(session.score)
    }

    /// Get a session.
    pub fn player(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Iterate sessions in ascending id order.
    pub fn players(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Copy of every session, ascending id order.
    pub fn snapshot_players(&self) -> Vec<Session> {
        self.sessions.values().cloned().collect()
    }

    /// Number of connected sessions.
    pub fn player_count(&self) -> usize {
        self.sessions.len()
    }

    /// At least one session exists and is not marked dead.
    pub fn has_live_player(&self) -> bool {
        self.sessions.values().any(|s| !s.dead)
    }

    // -------------------------------------------------------------------------
    // Enemies
    // -------------------------------------------------------------------------

    /// Reserve a fresh enemy id.
    pub fn allocate_enemy_id(&mut self) -> EnemyId {
        let id = EnemyId(self.next_enemy_id);
        self.next_enemy_id += 1;
        id
    }

    /// Insert an enemy.
    pub fn add_enemy(&mut self, enemy: Enemy) {
        self.enemies.insert(enemy.id, enemy);
    }

    /// Remove an enemy. Returns the removed record, if any.
    pub fn remove_enemy(&mut self, id: EnemyId) -> Option<Enemy> {
        self.enemies.remove(&id)
    }

    /// Get an enemy.
    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Iterate enemies in spawn order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    /// Mutable iteration over enemies in spawn order.
    pub fn enemies_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.values_mut()
    }

    /// Copy of every live enemy, spawn order.
    pub fn snapshot_enemies(&self) -> Vec<Enemy> {
        self.enemies.values().cloned().collect()
    }

    /// Number of live enemies.
    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Subtract `amount` from an enemy's health.
    ///
    /// Returns the remaining health, or `None` if the enemy is gone.
    /// Removal is the caller's job (see `game::combat`), done under the
    /// same lock guard.
    pub fn apply_damage(&mut self, id: EnemyId, amount: u32) -> Option<i32> {
        let enemy = self.enemies.get_mut(&id)?;
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        enemy.health = enemy.health.saturating_sub(amount);
        Some(enemy.health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_enemy_kind_health() {
        assert_eq!(EnemyKind::Tank.starting_health(), 200);
        assert_eq!(EnemyKind::Fast.starting_health(), 50);
        assert_eq!(EnemyKind::Normal.starting_health(), 100);

        let enemy = Enemy::new(EnemyId(1), EnemyKind::Fast, Vec2::ZERO);
        assert_eq!(enemy.health, 50);
    }

    #[test]
    fn test_add_remove_player() {
        let mut world = WorldState::new();
        world.add_player(SessionId(1), Vec2::new(400.0, 300.0));
        assert_eq!(world.player_count(), 1);

        let removed = world.remove_player(SessionId(1)).unwrap();
        assert_eq!(removed.id, SessionId(1));
        assert_eq!(world.player_count(), 0);
        assert!(world.remove_player(SessionId(1)).is_none());
    }

    #[test]
    fn test_move_for_missing_session_is_noop() {
        let mut world = WorldState::new();
        assert!(!world.upsert_player_position(SessionId(9), 1.0, 2.0));
        assert_eq!(world.player_count(), 0);
    }

    #[test]
    fn test_move_rejects_non_finite() {
        let mut world = WorldState::new();
        world.add_player(SessionId(1), Vec2::new(10.0, 10.0));

        assert!(!world.upsert_player_position(SessionId(1), f64::NAN, 0.0));
        assert!(!world.upsert_player_position(SessionId(1), 0.0, f64::INFINITY));
        assert_eq!(world.player(SessionId(1)).unwrap().position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_has_live_player() {
        let mut world = WorldState::new();
        assert!(!world.has_live_player());

        world.add_player(SessionId(1), Vec2::ZERO);
        world.add_player(SessionId(2), Vec2::ZERO);
        assert!(world.has_live_player());

        world.set_player_dead(SessionId(1), true);
        assert!(world.has_live_player());

        world.set_player_dead(SessionId(2), true);
        assert!(!world.has_live_player());

        world.set_player_dead(SessionId(2), false);
        assert!(world.has_live_player());
    }

    #[test]
    fn test_enemy_ids_increase() {
        let mut world = WorldState::new();
        let a = world.allocate_enemy_id();
        let b = world.allocate_enemy_id();
        assert!(b > a);
    }

    #[test]
    fn test_apply_damage() {
        let mut world = WorldState::new();
        let id = world.allocate_enemy_id();
        world.add_enemy(Enemy::new(id, EnemyKind::Normal, Vec2::ZERO));

        assert_eq!(world.apply_damage(id, 40), Some(60));
        assert_eq!(world.apply_damage(id, 40), Some(20));
        assert_eq!(world.apply_damage(id, u32::MAX), Some(20 - i32::MAX));

        world.remove_enemy(id);
        assert_eq!(world.apply_damage(id, 1), None);
    }

    #[test]
    fn test_credit_kill() {
        let mut world = WorldState::new();
        world.add_player(SessionId(3), Vec2::ZERO);

        assert_eq!(world.credit_kill(SessionId(3), 10), Some(10));
        assert_eq!(world.credit_kill(SessionId(3), 10), Some(20));
        assert_eq!(world.credit_kill(SessionId(4), 10), None);
    }

    #[test]
    fn test_snapshots_are_ordered() {
        let mut world = WorldState::new();
        world.add_player(SessionId(2), Vec2::ZERO);
        world.add_player(SessionId(1), Vec2::ZERO);

        let ids: Vec<_> = world.snapshot_players().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SessionId(1), SessionId(2)]);
    }

    proptest! {
        #[test]
        fn prop_last_move_wins(moves in prop::collection::vec((-1.0e6f64..1.0e6, -1.0e6f64..1.0e6), 1..50)) {
            let mut world = WorldState::new();
            world.add_player(SessionId(1), Vec2::ZERO);

            for (x, y) in &moves {
                world.upsert_player_position(SessionId(1), *x, *y);
            }

            let (x, y) = *moves.last().unwrap();
            prop_assert_eq!(world.player(SessionId(1)).unwrap().position, Vec2::new(x, y));
        }

        #[test]
        fn prop_health_never_increases(hits in prop::collection::vec(1u32..500, 1..20)) {
            let mut world = WorldState::new();
            let id = world.allocate_enemy_id();
            world.add_enemy(Enemy::new(id, EnemyKind::Tank, Vec2::ZERO));

            let mut last = EnemyKind::Tank.starting_health();
            for hit in hits {
                let remaining = world.apply_damage(id, hit).unwrap();
                prop_assert!(remaining < last);
                last = remaining;
            }
        }
    }
}
