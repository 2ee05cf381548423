//! Wire protocol for Tempo.
//!
//! This crate defines the "language" that clients and the relay speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`RoomSnapshot`], the
//!   identifier newtypes) — the structured records that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those records are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and session
//! (rooms and participants). It doesn't know about connections or clocks —
//! it only knows how to name and serialize events.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Session (room context)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, GameOverReason, MoveData, ParticipantId,
    ParticipantSnapshot, RoomId, RoomSnapshot, Seat, ServerEvent,
};
