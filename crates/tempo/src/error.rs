//! Unified error type for the Tempo relay.

use tempo_protocol::ProtocolError;
use tempo_room::RoomError;
use tempo_session::SessionError;
use tempo_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Only the server bootstrap ever returns one of these to user code;
/// per-event failures are logged and swallowed at the connection
/// boundary, because the protocol never answers an event with an error.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown room, double seating).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (seat unavailable, actor gone).
    #[error(transparent)]
    Room(#[from] RoomError),
}
