//! Network Layer
//!
//! WebSocket server for real-time multiplayer communication.
//! Everything here is I/O and plumbing; world rules live in `game/`.

pub mod protocol;
pub mod registry;
pub mod broadcast;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, PlayerSnapshot, EnemySnapshot};
pub use registry::{ConnectionRegistry, SendStatus};
pub use broadcast::{Snapshot, DeliveryReport};
pub use server::{GameServer, GameServerError, SharedWorld};
