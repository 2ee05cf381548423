//! Core protocol types for Tempo's wire format.
//!
//! Every type here travels on the wire: it is serialized to a frame, sent
//! over the transport, and deserialized on the other side. The JSON shapes
//! are pinned by the tests at the bottom of this module, because the
//! browser client parses these events by name and field.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A participant's identity, supplied by the client on join.
///
/// Stable across the connection's lifetime — it is *not* minted per socket,
/// which is what makes duplicate join messages from a retried connection
/// recognizable as the same participant.
///
/// `#[serde(transparent)]` keeps the wire form a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A room identifier. Client-chosen for explicit joins, server-generated
/// for quick-match pairings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Seat
// ---------------------------------------------------------------------------

/// Board orientation, assigned by join order: first in gets [`Seat::White`],
/// second gets [`Seat::Black`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    White,
    Black,
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// An opaque move as the client's rules library produced it.
///
/// The relay never interprets these fields; it only checks who sent them.
/// `promotion` is omitted from the JSON entirely when absent, matching what
/// the client emits for non-promotion moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveData {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One participant as clients are allowed to see them.
///
/// The wire name for the seat is `orientation` — the reference client reads
/// `player.orientation` to flip its board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub id: ParticipantId,
    pub username: String,
    pub avatar: String,
    #[serde(rename = "orientation")]
    pub seat: Seat,
    #[serde(rename = "remainingTime")]
    pub remaining_time: u64,
}

/// The sanitized view of a room broadcast on `startGame`, `roomJoined`, and
/// `playAgainAccepted`.
///
/// Internal handles (the clock, the outbound channels) are never part of
/// this — a snapshot is pure data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    #[serde(rename = "roomId")]
    pub room_id: RoomId,
    #[serde(rename = "players")]
    pub participants: Vec<ParticipantSnapshot>,
    #[serde(rename = "currentTurn")]
    pub current_turn: Option<ParticipantId>,
}

// ---------------------------------------------------------------------------
// Client → server events
// ---------------------------------------------------------------------------

/// Everything a client can ask the relay to do.
///
/// Adjacently tagged so the wire form is
/// `{ "event": "joinRoom", "data": { ... } }`, with camelCase event names
/// matching the reference deployment's protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join (or create) a specific room under a stable identity.
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        username: String,
        room_id: RoomId,
        avatar: String,
        participant_id: ParticipantId,
    },

    /// Let the server pick: pair with a waiting opponent or open a fresh
    /// room under a generated id. Answered with `roomJoined`.
    #[serde(rename_all = "camelCase")]
    QuickMatch {
        username: String,
        avatar: String,
        participant_id: ParticipantId,
    },

    /// Relay a move to the opponent. Legality was already checked by the
    /// sender's local rules library.
    Move {
        #[serde(rename = "move")]
        mv: MoveData,
        room: RoomId,
    },

    /// First half of the rematch handshake.
    RequestPlayAgain { room: RoomId },

    /// Second half: reset clocks and start over.
    AcceptPlayAgain { room: RoomId },

    /// Explicit teardown of a room and everyone in it.
    #[serde(rename_all = "camelCase")]
    CloseRoom { room_id: RoomId },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Why the server declared a game over. The relay itself only ever ends a
/// game on the clock; everything else is the clients' rules oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOverReason {
    Time,
}

/// Everything the relay can tell a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Both seats are filled — play begins. Carries the full snapshot so
    /// each client learns its seat, the opponent, and the starting clocks.
    StartGame(RoomSnapshot),

    /// Quick-match acknowledgment: which room the server put you in.
    RoomJoined(RoomSnapshot),

    /// The opponent moved.
    Move(MoveData),

    /// One tick of the active participant's countdown.
    #[serde(rename_all = "camelCase")]
    TimeUpdate {
        participant_id: ParticipantId,
        remaining_time: u64,
    },

    /// The active participant's clock ran out.
    #[serde(rename_all = "camelCase")]
    GameOver {
        winner_id: ParticipantId,
        reason: GameOverReason,
    },

    /// The opponent wants a rematch.
    PlayAgainRequest,

    /// Rematch accepted: clocks reset, same seats, white to move.
    PlayAgainAccepted(RoomSnapshot),

    /// The opponent's connection is gone. The room is not coming back.
    PlayerDisconnected { username: String },

    /// The room was closed and every connection was evicted from it.
    #[serde(rename_all = "camelCase")]
    CloseRoom { room_id: RoomId },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! JSON-shape tests.
    //!
    //! The browser client dispatches on the `event` string and reads the
    //! payload fields by exact name, so these tests pin the serialized
    //! form of every type that crosses the wire.

    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    fn snapshot() -> RoomSnapshot {
        RoomSnapshot {
            room_id: RoomId::from("r1"),
            participants: vec![ParticipantSnapshot {
                id: pid("u1"),
                username: "alice".into(),
                avatar: "a.png".into(),
                seat: Seat::White,
                remaining_time: 600,
            }],
            current_turn: Some(pid("u1")),
        }
    }

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_participant_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&pid("u42")).unwrap();
        assert_eq!(json, "\"u42\"");
    }

    #[test]
    fn test_room_id_round_trip() {
        let id = RoomId::from("r-abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"r-abc\"");
        let back: RoomId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    // =====================================================================
    // Seat
    // =====================================================================

    #[test]
    fn test_seat_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Seat::White).unwrap(), "\"white\"");
        assert_eq!(serde_json::to_string(&Seat::Black).unwrap(), "\"black\"");
    }

    // =====================================================================
    // MoveData
    // =====================================================================

    #[test]
    fn test_move_data_omits_absent_promotion() {
        let mv = MoveData {
            from: "e2".into(),
            to: "e4".into(),
            promotion: None,
        };
        let json: serde_json::Value = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["from"], "e2");
        assert_eq!(json["to"], "e4");
        assert!(json.get("promotion").is_none());
    }

    #[test]
    fn test_move_data_keeps_promotion_when_present() {
        let mv = MoveData {
            from: "e7".into(),
            to: "e8".into(),
            promotion: Some("q".into()),
        };
        let json: serde_json::Value = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["promotion"], "q");
    }

    // =====================================================================
    // Snapshots
    // =====================================================================

    #[test]
    fn test_snapshot_uses_reference_field_names() {
        let json: serde_json::Value =
            serde_json::to_value(&snapshot()).unwrap();

        assert_eq!(json["roomId"], "r1");
        assert_eq!(json["currentTurn"], "u1");
        let player = &json["players"][0];
        assert_eq!(player["id"], "u1");
        assert_eq!(player["orientation"], "white");
        assert_eq!(player["remainingTime"], 600);
    }

    // =====================================================================
    // ClientEvent — one shape test per variant
    // =====================================================================

    #[test]
    fn test_join_room_json_format() {
        let ev = ClientEvent::JoinRoom {
            username: "alice".into(),
            room_id: RoomId::from("r1"),
            avatar: "a.png".into(),
            participant_id: pid("u1"),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["event"], "joinRoom");
        assert_eq!(json["data"]["username"], "alice");
        assert_eq!(json["data"]["roomId"], "r1");
        assert_eq!(json["data"]["avatar"], "a.png");
        assert_eq!(json["data"]["participantId"], "u1");
    }

    #[test]
    fn test_quick_match_json_format() {
        let ev = ClientEvent::QuickMatch {
            username: "bob".into(),
            avatar: "b.png".into(),
            participant_id: pid("u2"),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "quickMatch");
        assert_eq!(json["data"]["participantId"], "u2");
    }

    #[test]
    fn test_move_event_json_format() {
        let ev = ClientEvent::Move {
            mv: MoveData {
                from: "e2".into(),
                to: "e4".into(),
                promotion: None,
            },
            room: RoomId::from("r1"),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "move");
        assert_eq!(json["data"]["move"]["from"], "e2");
        assert_eq!(json["data"]["room"], "r1");
    }

    #[test]
    fn test_request_play_again_round_trip() {
        let ev = ClientEvent::RequestPlayAgain {
            room: RoomId::from("r1"),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let back: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_accept_play_again_round_trip() {
        let ev = ClientEvent::AcceptPlayAgain {
            room: RoomId::from("r1"),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let back: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_close_room_json_format() {
        let ev = ClientEvent::CloseRoom {
            room_id: RoomId::from("r9"),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "closeRoom");
        assert_eq!(json["data"]["roomId"], "r9");
    }

    // =====================================================================
    // ServerEvent
    // =====================================================================

    #[test]
    fn test_start_game_json_format() {
        let ev = ServerEvent::StartGame(snapshot());
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "startGame");
        assert_eq!(json["data"]["roomId"], "r1");
    }

    #[test]
    fn test_time_update_json_format() {
        let ev = ServerEvent::TimeUpdate {
            participant_id: pid("u1"),
            remaining_time: 599,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "timeUpdate");
        assert_eq!(json["data"]["participantId"], "u1");
        assert_eq!(json["data"]["remainingTime"], 599);
    }

    #[test]
    fn test_game_over_reason_serializes_as_time() {
        let ev = ServerEvent::GameOver {
            winner_id: pid("u1"),
            reason: GameOverReason::Time,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "gameOver");
        assert_eq!(json["data"]["winnerId"], "u1");
        assert_eq!(json["data"]["reason"], "time");
    }

    #[test]
    fn test_play_again_request_has_no_data() {
        let ev = ServerEvent::PlayAgainRequest;
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "playAgainRequest");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_play_again_accepted_round_trip() {
        let ev = ServerEvent::PlayAgainAccepted(snapshot());
        let bytes = serde_json::to_vec(&ev).unwrap();
        let back: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_player_disconnected_json_format() {
        let ev = ServerEvent::PlayerDisconnected {
            username: "alice".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "playerDisconnected");
        assert_eq!(json["data"]["username"], "alice");
    }

    #[test]
    fn test_server_move_round_trip() {
        let ev = ServerEvent::Move(MoveData {
            from: "g8".into(),
            to: "f6".into(),
            promotion: None,
        });
        let bytes = serde_json::to_vec(&ev).unwrap();
        let back: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_room_joined_round_trip() {
        let ev = ServerEvent::RoomJoined(snapshot());
        let bytes = serde_json::to_vec(&ev).unwrap();
        let back: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, ev);
    }

    // =====================================================================
    // Error cases — malformed input
    // =====================================================================

    #[test]
    fn test_decode_garbage_returns_error() {
        let garbage = b"not json at all";
        let result: Result<ClientEvent, _> = serde_json::from_slice(garbage);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_unknown_event_returns_error() {
        let unknown = r#"{"event": "castRaiseDead", "data": {}}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(unknown);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_join_without_identity_returns_error() {
        // Malformed joins (missing participantId) must fail decoding so
        // the boundary can drop them silently.
        let missing = r#"{"event":"joinRoom","data":{"username":"a","roomId":"r1","avatar":""}}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(missing);
        assert!(result.is_err());
    }
}
