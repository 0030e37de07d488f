//! Combat Resolution
//!
//! The only place enemy health changes and enemies are removed. Callers
//! hold the world write guard across a whole resolution, so damage and
//! removal land as one step and no snapshot sees a dead enemy.

use thiserror::Error;

use crate::core::vec2::Vec2;
use crate::game::events::GameEvent;
use crate::game::state::{EnemyId, SessionId, WorldState};

/// Damage applied when a report carries none.
pub const DEFAULT_DAMAGE: u32 = 1;

/// Points credited per kill.
pub const POINTS_PER_KILL: u32 = 10;

/// Radius of the legacy position-based hit check.
pub const LEGACY_HIT_RADIUS: f64 = 20.0;

/// Combat validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CombatError {
    /// Damage was zero, negative, or not finite.
    #[error("invalid damage amount: {0}")]
    InvalidDamage(f64),
}

/// A reported hit against one enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageEvent {
    /// Target
    pub enemy_id: EnemyId,
    /// Validated damage (>= 1)
    pub damage: u32,
    /// Session that reported the hit
    pub reporter: SessionId,
}

impl DamageEvent {
    /// Build an event from a raw reported amount.
    pub fn new(enemy_id: EnemyId, raw_damage: Option<f64>, reporter: SessionId) -> Result<Self, CombatError> {
        Ok(Self {
            enemy_id,
            damage: validate_damage(raw_damage)?,
            reporter,
        })
    }
}

/// Normalize a client-reported damage value.
///
/// Missing values default to [`DEFAULT_DAMAGE`]. Positive values round up
/// to whole health points.
pub fn validate_damage(raw: Option<f64>) -> Result<u32, CombatError> {
    match raw {
        None => Ok(DEFAULT_DAMAGE),
        Some(d) if d.is_finite() && d > 0.0 => Ok((d.ceil() as u32).max(1)),
        Some(d) => Err(CombatError::InvalidDamage(d)),
    }
}

/// Result of resolving one damage event.
#[derive(Clone, Debug, PartialEq)]
pub enum CombatOutcome {
    /// Enemy already gone; nothing happened.
    Missed,
    /// Enemy survived with this much health.
    Damaged(GameEvent),
    /// Enemy died and was removed.
    Killed(GameEvent),
}

impl CombatOutcome {
    /// Event to log, if anything changed.
    pub fn event(&self) -> Option<&GameEvent> {
        match self {
            CombatOutcome::Missed => None,
            CombatOutcome::Damaged(event) | CombatOutcome::Killed(event) => Some(event),
        }
    }

    /// Whether this outcome removed the enemy.
    pub fn is_kill(&self) -> bool {
        matches!(self, CombatOutcome::Killed(_))
    }
}

/// Apply one damage event.
pub fn resolve(world: &mut WorldState, event: DamageEvent, points_per_kill: u32) -> CombatOutcome {
    let remaining = match world.apply_damage(event.enemy_id, event.damage) {
        Some(health) => health,
        // Already removed, most likely by a concurrent report
        None => return CombatOutcome::Missed,
    };

    if remaining > 0 {
        return CombatOutcome::Damaged(GameEvent::EnemyDamaged {
            enemy_id: event.enemy_id,
            reporter: event.reporter,
            remaining,
        });
    }

    let kind = match world.remove_enemy(event.enemy_id) {
        Some(enemy) => enemy.kind,
        None => return CombatOutcome::Missed,
    };
    let score = world.credit_kill(event.reporter, points_per_kill);

    CombatOutcome::Killed(GameEvent::EnemyKilled {
        enemy_id: event.enemy_id,
        kind,
        killer: event.reporter,
        score,
    })
}

/// Legacy position-based hit: damage every enemy strictly within `radius`
/// of `point`.
pub fn resolve_proximity(
    world: &mut WorldState,
    point: Vec2,
    damage: u32,
    reporter: SessionId,
    radius: f64,
    points_per_kill: u32,
) -> Vec<CombatOutcome> {
    if !point.is_finite() {
        return Vec::new();
    }

    let radius_sq = radius * radius;
    let targets: Vec<EnemyId> = world
        .enemies()
        .filter(|e| e.position.distance_squared(point) < radius_sq)
        .map(|e| e.id)
        .collect();

    targets
        .into_iter()
        .map(|enemy_id| {
            resolve(world, DamageEvent { enemy_id, damage, reporter }, points_per_kill)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use crate::game::state::{Enemy, EnemyKind};

    fn world_with_enemy(kind: EnemyKind) -> (WorldState, EnemyId) {
        let mut world = WorldState::new();
        world.add_player(SessionId(1), Vec2::new(400.0, 300.0));
        world.add_player(SessionId(2), Vec2::new(100.0, 100.0));
        let id = world.allocate_enemy_id();
        world.add_enemy(Enemy::new(id, kind, Vec2::new(50.0, 50.0)));
        (world, id)
    }

    fn hit(enemy_id: EnemyId, damage: u32, reporter: u64) -> DamageEvent {
        DamageEvent { enemy_id, damage, reporter: SessionId(reporter) }
    }

    #[test]
    fn test_validate_damage() {
        assert_eq!(validate_damage(None), Ok(1));
        assert_eq!(validate_damage(Some(40.0)), Ok(40));
        assert_eq!(validate_damage(Some(2.5)), Ok(3));
        assert_eq!(validate_damage(Some(0.01)), Ok(1));
        assert!(validate_damage(Some(0.0)).is_err());
        assert!(validate_damage(Some(-5.0)).is_err());
        assert!(validate_damage(Some(f64::NAN)).is_err());
        assert!(validate_damage(Some(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_invalid_damage_has_no_side_effects() {
        let (world, id) = world_with_enemy(EnemyKind::Normal);
        assert!(DamageEvent::new(id, Some(-3.0), SessionId(1)).is_err());
        assert_eq!(world.enemy(id).unwrap().health, 100);
    }

    #[test]
    fn test_three_hits_kill_normal_enemy() {
        let (mut world, id) = world_with_enemy(EnemyKind::Normal);

        let first = resolve(&mut world, hit(id, 40, 1), POINTS_PER_KILL);
        assert!(matches!(first, CombatOutcome::Damaged(GameEvent::EnemyDamaged { remaining: 60, .. })));

        let second = resolve(&mut world, hit(id, 40, 1), POINTS_PER_KILL);
        assert!(matches!(second, CombatOutcome::Damaged(GameEvent::EnemyDamaged { remaining: 20, .. })));
        assert!(world.snapshot_enemies().iter().any(|e| e.id == id));

        let third = resolve(&mut world, hit(id, 40, 1), POINTS_PER_KILL);
        assert!(third.is_kill());
        assert_eq!(third.event().unwrap().kill_credit(), Some((SessionId(1), 10)));
        assert!(world.snapshot_enemies().iter().all(|e| e.id != id));
        assert_eq!(world.player(SessionId(1)).unwrap().score, 10);
        assert_eq!(world.player(SessionId(2)).unwrap().score, 0);
    }

    #[test]
    fn test_hit_on_removed_enemy_is_noop() {
        let (mut world, id) = world_with_enemy(EnemyKind::Fast);

        assert!(resolve(&mut world, hit(id, 50, 1), POINTS_PER_KILL).is_kill());
        assert_eq!(resolve(&mut world, hit(id, 50, 2), POINTS_PER_KILL), CombatOutcome::Missed);
        assert_eq!(world.player(SessionId(2)).unwrap().score, 0);
    }

    #[test]
    fn test_kill_by_departed_session_still_removes() {
        let (mut world, id) = world_with_enemy(EnemyKind::Fast);
        world.remove_player(SessionId(1));

        let outcome = resolve(&mut world, hit(id, 100, 1), POINTS_PER_KILL);
        assert!(outcome.is_kill());
        assert_eq!(outcome.event().unwrap().kill_credit(), None);
        assert_eq!(world.enemy_count(), 0);
    }

    #[test]
    fn test_proximity_hits_only_nearby() {
        let mut world = WorldState::new();
        world.add_player(SessionId(1), Vec2::ZERO);
        let near = world.allocate_enemy_id();
        world.add_enemy(Enemy::new(near, EnemyKind::Normal, Vec2::new(105.0, 100.0)));
        let edge = world.allocate_enemy_id();
        world.add_enemy(Enemy::new(edge, EnemyKind::Normal, Vec2::new(120.0, 100.0)));
        let far = world.allocate_enemy_id();
        world.add_enemy(Enemy::new(far, EnemyKind::Normal, Vec2::new(300.0, 300.0)));

        let outcomes = resolve_proximity(
            &mut world,
            Vec2::new(100.0, 100.0),
            30,
            SessionId(1),
            LEGACY_HIT_RADIUS,
            POINTS_PER_KILL,
        );

        assert_eq!(outcomes.len(), 1);
        assert_eq!(world.enemy(near).unwrap().health, 70);
        // Exactly on the radius is not a hit
        assert_eq!(world.enemy(edge).unwrap().health, 100);
        assert_eq!(world.enemy(far).unwrap().health, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_kill_reports_remove_once() {
        let (world, id) = world_with_enemy(EnemyKind::Normal);
        let world = Arc::new(RwLock::new(world));

        let mut handles = Vec::new();
        for reporter in 1..=8u64 {
            let world = world.clone();
            handles.push(tokio::spawn(async move {
                let mut w = world.write().await;
                resolve(&mut w, hit(id, 100, reporter % 2 + 1), POINTS_PER_KILL)
            }));
        }

        let mut kills = 0;
        let mut credits = 0;
        for handle in handles {
            let outcome = handle.await.unwrap();
            if outcome.is_kill() {
                kills += 1;
            }
            if outcome.event().and_then(GameEvent::kill_credit).is_some() {
                credits += 1;
            }
        }

        assert_eq!(kills, 1);
        assert_eq!(credits, 1);
        assert_eq!(world.read().await.enemy_count(), 0);
    }
}
