//! # Mystic Survival Game Server
//!
//! Authoritative real-time server for Mystic Survival: a top-down
//! survival shooter where browser clients report their own position and
//! hits while the server owns enemies, health and score.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  MYSTIC SURVIVAL SERVER                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  config.rs       - Defaults and MYSTIC_* overrides           │
//! │                                                              │
//! │  core/           - Primitives                                │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  └── rng.rs      - Seedable Xorshift128+ PRNG                │
//! │                                                              │
//! │  game/           - World rules (no I/O)                      │
//! │  ├── state.rs    - Sessions, enemies, world record           │
//! │  ├── map.rs      - Bounds and spawn edges                    │
//! │  ├── director.rs - Enemy spawning and chasing                │
//! │  ├── combat.rs   - Damage validation and kills               │
//! │  ├── tick.rs     - Fixed-cadence world step                  │
//! │  └── events.rs   - What a step changed                       │
//! │                                                              │
//! │  network/        - Networking                                │
//! │  ├── server.rs   - WebSocket server and tick loop            │
//! │  ├── protocol.rs - JSON message types                        │
//! │  ├── registry.rs - Session identities and outbound queues    │
//! │  └── broadcast.rs- Snapshot fan-out                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! All world mutation happens under one write lock: hit resolution, client
//! moves and the tick step. Snapshots are copied under that lock and sent
//! after it is released, so a killed enemy never appears in a later
//! snapshot and a slow client never stalls the tick.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use config::{ServerConfig, ConfigError};
pub use core::vec2::Vec2;
pub use core::rng::GameRng;
pub use game::state::{WorldState, SessionId, EnemyId, EnemyKind};
pub use network::server::{GameServer, GameServerError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
