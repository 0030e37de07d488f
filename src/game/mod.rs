//! Game Logic Module
//!
//! Simulation code with no I/O. The network layer owns the lock around
//! [`WorldState`] and calls in here.
//!
//! ## Module Structure
//!
//! - `state`: sessions, enemies, the world record
//! - `map`: world bounds and spawn edges
//! - `director`: enemy spawning and movement
//! - `combat`: damage validation and resolution
//! - `tick`: fixed-cadence world step
//! - `events`: what a step changed

pub mod state;
pub mod map;
pub mod director;
pub mod combat;
pub mod tick;
pub mod events;

// Re-export key types
pub use state::{WorldState, Session, SessionId, Enemy, EnemyId, EnemyKind};
pub use map::WorldBounds;
pub use director::{EnemyDirector, DirectorConfig};
pub use combat::{DamageEvent, CombatOutcome, CombatError};
pub use tick::{TickScheduler, TickConfig, TickResult};
pub use events::GameEvent;
