//! Enemy Director
//!
//! Spawns enemies on the world edges and walks them toward players.

use crate::core::rng::GameRng;
use crate::core::vec2::Vec2;
use crate::game::events::GameEvent;
use crate::game::map::WorldBounds;
use crate::game::state::{Enemy, EnemyKind, WorldState};

/// Distance an enemy covers per movement tick.
pub const ENEMY_SPEED: f64 = 2.0;

/// Configuration for the enemy director.
#[derive(Clone, Copy, Debug)]
pub struct DirectorConfig {
    /// Play field, enemies spawn on its edges
    pub bounds: WorldBounds,
    /// Step length per movement tick
    pub enemy_speed: f64,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            bounds: WorldBounds::default(),
            enemy_speed: ENEMY_SPEED,
        }
    }
}

/// Owns the spawn RNG and applies spawn and movement policy to the world.
#[derive(Debug)]
pub struct EnemyDirector {
    config: DirectorConfig,
    rng: GameRng,
}

impl EnemyDirector {
    /// Create a director with its own RNG.
    pub fn new(config: DirectorConfig, rng: GameRng) -> Self {
        Self { config, rng }
    }

    /// Director configuration.
    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    /// Spawn one enemy on a random edge.
    ///
    /// Does nothing unless at least one session is connected and alive.
    pub fn spawn(&mut self, world: &mut WorldState) -> Option<GameEvent> {
        if !world.has_live_player() {
            return None;
        }

        let (_, position) = self.config.bounds.random_edge_point(&mut self.rng);
        let kind = random_enemy_kind(&mut self.rng);
        let id = world.allocate_enemy_id();
        world.add_enemy(Enemy::new(id, kind, position));

        Some(GameEvent::EnemySpawned {
            enemy_id: id,
            kind,
            position,
        })
    }

    /// Move every enemy one step toward its nearest session.
    ///
    /// Returns how many enemies moved.
    pub fn advance(&self, world: &mut WorldState) -> usize {
        let targets: Vec<Vec2> = world.players().map(|s| s.position).collect();
        if targets.is_empty() {
            return 0;
        }

        let mut moved = 0;
        for enemy in world.enemies_mut() {
            let Some(target) = nearest(&targets, enemy.position) else {
                continue;
            };
            if let Some(next) = enemy.position.step_toward(target, self.config.enemy_speed) {
                enemy.position = next;
                moved += 1;
            }
        }
        moved
    }
}

/// Nearest point to `from`. Ties go to the earliest entry.
pub fn nearest(points: &[Vec2], from: Vec2) -> Option<Vec2> {
    let mut best: Option<(Vec2, f64)> = None;
    for &p in points {
        let d = p.distance_squared(from);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((p, d)),
        }
    }
    best.map(|(p, _)| p)
}

/// Weighted kind roll: Normal 60%, Fast 25%, Tank 15%.
fn random_enemy_kind(rng: &mut GameRng) -> EnemyKind {
    let roll = rng.next_int(100);

    if roll < 60 {
        EnemyKind::Normal
    } else if roll < 85 {
        EnemyKind::Fast
    } else {
        EnemyKind::Tank
    }
}
