//! Error types for the session layer.
//!
//! Like the room errors these never travel to a client; the boundary's
//! policy is a silent no-op. They exist so internal callers and tests can
//! see what actually happened.

use tempo_protocol::{ParticipantId, RoomId};
use tempo_room::RoomError;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No room exists under this id.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The participant is already seated in a different room.
    ///
    /// A participant belongs to at most one room; the reverse index makes
    /// the invariant checkable instead of implicit.
    #[error("participant {0} is already in room {1}")]
    AlreadyInRoom(ParticipantId, RoomId),

    /// A room-level failure (seat unavailable, actor gone).
    #[error(transparent)]
    Room(#[from] RoomError),
}
