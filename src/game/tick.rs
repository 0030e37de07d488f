//! Simulation Tick
//!
//! Fixed-cadence world step. One base tick moves enemies; spawn and
//! broadcast cadences are whole multiples of it. The async loop that calls
//! [`TickScheduler::step`] lives in `network::server`.

use std::time::Duration;

use crate::game::director::EnemyDirector;
use crate::game::events::GameEvent;
use crate::game::state::WorldState;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick number (first tick is 1)
    pub tick: u64,
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Enemies that moved
    pub moved: usize,
    /// Whether a snapshot should go out after this tick
    pub broadcast: bool,
}

/// Cadence configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickConfig {
    /// Base tick, also the movement cadence
    pub tick_interval: Duration,
    /// Spawn cadence
    pub spawn_interval: Duration,
    /// Snapshot cadence
    pub broadcast_interval: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            spawn_interval: Duration::from_millis(2000),
            broadcast_interval: Duration::from_millis(100),
        }
    }
}

impl TickConfig {
    /// Base ticks per spawn.
    pub fn spawn_every(&self) -> u64 {
        ticks_per(self.spawn_interval, self.tick_interval)
    }

    /// Base ticks per broadcast.
    pub fn broadcast_every(&self) -> u64 {
        ticks_per(self.broadcast_interval, self.tick_interval)
    }
}

/// `interval / base`, rounded, at least 1.
fn ticks_per(interval: Duration, base: Duration) -> u64 {
    if base.is_zero() {
        return 1;
    }
    let ratio = interval.as_secs_f64() / base.as_secs_f64();
    (ratio.round() as u64).max(1)
}

/// Counts ticks and decides which steps run on each.
#[derive(Debug)]
pub struct TickScheduler {
    tick: u64,
    spawn_every: u64,
    broadcast_every: u64,
}

impl TickScheduler {
    /// Create a scheduler at tick 0.
    pub fn new(config: &TickConfig) -> Self {
        Self {
            tick: 0,
            spawn_every: config.spawn_every(),
            broadcast_every: config.broadcast_every(),
        }
    }

    /// Ticks run so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Run one tick.
    ///
    /// Order: movement, then spawn, so a fresh enemy goes out at its exact
    /// spawn point.
    pub fn step(&mut self, world: &mut WorldState, director: &mut EnemyDirector) -> TickResult {
        self.tick += 1;

        let mut result = TickResult {
            tick: self.tick,
            ..Default::default()
        };

        // 1. Movement
        result.moved = director.advance(world);

        // 2. Spawn
        if self.tick % self.spawn_every == 0 {
            if let Some(event) = director.spawn(world) {
                result.events.push(event);
            }
        }

        // 3. Broadcast
        result.broadcast = self.tick % self.broadcast_every == 0;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::GameRng;
    use crate::core::vec2::Vec2;
    use crate::game::director::DirectorConfig;
    use crate::game::state::SessionId;

    fn setup() -> (WorldState, EnemyDirector, TickScheduler) {
        let director = EnemyDirector::new(DirectorConfig::default(), GameRng::new(12345));
        (WorldState::new(), director, TickScheduler::new(&TickConfig::default()))
    }

    #[test]
    fn test_cadences() {
        let config = TickConfig::default();
        assert_eq!(config.spawn_every(), 20);
        assert_eq!(config.broadcast_every(), 1);

        let odd = TickConfig {
            tick_interval: Duration::from_millis(30),
            spawn_interval: Duration::from_millis(100),
            broadcast_interval: Duration::from_millis(10),
        };
        assert_eq!(odd.spawn_every(), 3);
        assert_eq!(odd.broadcast_every(), 1);
    }

    #[test]
    fn test_first_spawn_on_spawn_tick() {
        let (mut world, mut director, mut scheduler) = setup();
        world.add_player(SessionId(1), Vec2::new(400.0, 300.0));
        world.add_player(SessionId(2), Vec2::new(400.0, 300.0));

        for _ in 0..19 {
            let result = scheduler.step(&mut world, &mut director);
            assert!(result.events.is_empty());
            assert_eq!(world.enemy_count(), 0);
        }

        let result = scheduler.step(&mut world, &mut director);
        assert_eq!(result.tick, 20);
        assert_eq!(result.events.len(), 1);
        assert_eq!(world.enemy_count(), 1);

        let enemy = world.enemies().next().unwrap();
        assert!(director.config().bounds.on_boundary(enemy.position));
    }

    #[test]
    fn test_no_spawn_with_empty_world() {
        let (mut world, mut director, mut scheduler) = setup();

        for _ in 0..100 {
            scheduler.step(&mut world, &mut director);
        }
        assert_eq!(world.enemy_count(), 0);
        assert_eq!(scheduler.current_tick(), 100);
    }

    #[test]
    fn test_enemies_close_in_each_tick() {
        let (mut world, mut director, mut scheduler) = setup();
        world.add_player(SessionId(1), Vec2::new(400.0, 300.0));

        for _ in 0..20 {
            scheduler.step(&mut world, &mut director);
        }
        let id = world.enemies().next().unwrap().id;
        let before = world.enemy(id).unwrap().position.distance(Vec2::new(400.0, 300.0));

        let result = scheduler.step(&mut world, &mut director);
        assert_eq!(result.moved, 1);
        let after = world.enemy(id).unwrap().position.distance(Vec2::new(400.0, 300.0));
        assert!((before - after - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_broadcast_flag_follows_cadence() {
        let config = TickConfig {
            broadcast_interval: Duration::from_millis(300),
            ..Default::default()
        };
        let mut scheduler = TickScheduler::new(&config);
        let mut director = EnemyDirector::new(DirectorConfig::default(), GameRng::new(1));
        let mut world = WorldState::new();

        let flags: Vec<bool> = (0..6)
            .map(|_| scheduler.step(&mut world, &mut director).broadcast)
            .collect();
        assert_eq!(flags, vec![false, false, true, false, false, true]);
    }
}
