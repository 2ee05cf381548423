//! Room lifecycle management for Tempo.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! participant list, seat assignment, turn pointer, lifecycle phase, and
//! turn clock. Moves, rematch events, disconnects, and clock ticks all
//! serialize through the actor's single command queue.
//!
//! # Key types
//!
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`spawn_room`] — open a fresh `WaitingForOpponent` room
//! - [`RoomPhase`] — lifecycle state machine with declared transitions
//! - [`RoomConfig`] — session length and tick period
//! - [`RoomError`] — internal error taxonomy (never sent to clients)

mod config;
mod error;
mod room;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use room::{
    spawn_room, EventSender, JoinOutcome, ParticipantProfile, RoomHandle,
    RoomInfo,
};
