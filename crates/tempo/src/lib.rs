//! # Tempo
//!
//! A relay server for two-player, clocked, turn-based games.
//!
//! Tempo pairs two remote participants in a room, assigns seats by join
//! order, relays their moves without understanding them, runs a per-room
//! countdown tied to whoever holds the turn, and coordinates the
//! rematch handshake and teardown. Move legality lives entirely in the
//! clients' shared rules library — the server is a referee of *time and
//! turn order* only.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tempo::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RelayError> {
//!     let server = RelayServerBuilder::new()
//!         .bind("0.0.0.0:3000")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::RelayError;
pub use server::{RelayServer, RelayServerBuilder};

/// The usual imports for building and talking to a relay.
pub mod prelude {
    pub use crate::{RelayError, RelayServer, RelayServerBuilder};
    pub use tempo_protocol::{
        ClientEvent, GameOverReason, MoveData, ParticipantId, RoomId,
        RoomSnapshot, Seat, ServerEvent,
    };
    pub use tempo_room::RoomConfig;
}
