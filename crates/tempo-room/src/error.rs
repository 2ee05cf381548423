//! Error types for the room layer.
//!
//! None of these ever reach a client — the relay's error policy is
//! "do nothing and wait for the next event". They exist for internal
//! callers (the session registry) and for tests.

use tempo_protocol::{ParticipantId, RoomId};

use crate::RoomPhase;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Both seats are taken — a third distinct identity tried to join.
    #[error("no seat available in room {0}")]
    SeatUnavailable(RoomId),

    /// The participant is not in this room.
    #[error("participant {0} not in room {1}")]
    NotInRoom(ParticipantId, RoomId),

    /// The requested phase change is not a declared legal transition.
    #[error("illegal phase transition {from} → {to}")]
    InvalidTransition { from: RoomPhase, to: RoomPhase },

    /// The room's command channel is closed (actor already gone).
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
