//! The session registry: creates, tracks, and tears down rooms.

use std::collections::HashMap;

use rand::Rng;
use tempo_protocol::{MoveData, ParticipantId, RoomId, RoomSnapshot};
use tempo_room::{
    spawn_room, EventSender, JoinOutcome, ParticipantProfile, RoomConfig,
    RoomHandle, RoomPhase,
};

use crate::SessionError;

/// Manages all live rooms and tracks which participant is in which room.
///
/// This is the entry point for every room operation from the connection
/// layer. No other component reaches a room except through a handle
/// obtained here.
pub struct SessionRegistry {
    /// Live rooms, keyed by room id.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each participant to the room they're currently in.
    /// A participant is in at most ONE room at a time (key invariant),
    /// which turns disconnect handling from a scan into a lookup.
    participant_rooms: HashMap<ParticipantId, RoomId>,

    /// Configuration applied to every room this registry creates.
    config: RoomConfig,
}

impl SessionRegistry {
    /// Creates a new, empty registry.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            participant_rooms: HashMap::new(),
            config,
        }
    }

    // -----------------------------------------------------------------
    // Allocation primitives
    // -----------------------------------------------------------------

    /// Returns the room under `room_id`, creating an empty
    /// `WaitingForOpponent` room if absent.
    ///
    /// A created room is immediately visible to subsequent lookups.
    pub fn get_or_create(&mut self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.rooms.get(room_id) {
            return handle.clone();
        }
        let handle = spawn_room(room_id.clone(), self.config.clone());
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, "room created");
        handle
    }

    /// Removes the room under `room_id`. Idempotent — deleting an absent
    /// id is a no-op. Terminal: the id is then free for an unrelated
    /// fresh room.
    pub fn delete(&mut self, room_id: &RoomId) {
        if self.rooms.remove(room_id).is_some() {
            self.participant_rooms.retain(|_, rid| rid != room_id);
            tracing::info!(%room_id, "room deleted");
        }
        // Dropping the last handle ends the actor and aborts its clock.
    }

    // -----------------------------------------------------------------
    // Joining
    // -----------------------------------------------------------------

    /// Seats a participant in the given room, creating it if needed.
    ///
    /// Maintains the reverse index. Rejects a participant who is already
    /// seated in a *different* room; a duplicate join into the same room
    /// is idempotent.
    pub async fn join(
        &mut self,
        room_id: &RoomId,
        profile: ParticipantProfile,
        sender: EventSender,
    ) -> Result<JoinOutcome, SessionError> {
        if let Some(current) = self.participant_rooms.get(&profile.id) {
            if current != room_id {
                return Err(SessionError::AlreadyInRoom(
                    profile.id.clone(),
                    current.clone(),
                ));
            }
        }

        let participant_id = profile.id.clone();
        let handle = self.get_or_create(room_id);
        let outcome = handle.join(profile, sender).await?;

        self.participant_rooms
            .insert(participant_id, room_id.clone());
        Ok(outcome)
    }

    /// Pairs the participant with a waiting opponent, or opens a fresh
    /// room under a generated id.
    ///
    /// Returns the room id and the snapshot to acknowledge the joiner
    /// with. If two candidates race for the same waiting room, the loser
    /// of the seat simply falls through to the next candidate.
    pub async fn quick_match(
        &mut self,
        profile: ParticipantProfile,
        sender: EventSender,
    ) -> Result<(RoomId, RoomSnapshot), SessionError> {
        if let Some(current) = self.participant_rooms.get(&profile.id) {
            return Err(SessionError::AlreadyInRoom(
                profile.id.clone(),
                current.clone(),
            ));
        }

        for (room_id, handle) in &self.rooms {
            let Ok(info) = handle.info().await else {
                continue;
            };
            if info.phase != RoomPhase::WaitingForOpponent
                || info.participant_count != 1
            {
                continue;
            }
            if handle
                .join(profile.clone(), sender.clone())
                .await
                .is_ok()
            {
                self.participant_rooms
                    .insert(profile.id.clone(), room_id.clone());
                let snapshot = handle.snapshot().await?;
                tracing::info!(
                    %room_id,
                    participant_id = %profile.id,
                    "quick match paired"
                );
                return Ok((room_id.clone(), snapshot));
            }
        }

        // Nobody waiting — open a fresh room under a generated id.
        let room_id = RoomId(generate_room_id());
        let handle = self.get_or_create(&room_id);
        let participant_id = profile.id.clone();
        handle.join(profile, sender).await?;
        self.participant_rooms
            .insert(participant_id, room_id.clone());
        let snapshot = handle.snapshot().await?;
        Ok((room_id, snapshot))
    }

    // -----------------------------------------------------------------
    // Event routing
    // -----------------------------------------------------------------

    /// Relays a move into a room. Unknown room ids are reported as
    /// [`SessionError::RoomNotFound`]; the boundary turns that into a
    /// silent no-op.
    pub fn relay_move(
        &self,
        room_id: &RoomId,
        sender_id: ParticipantId,
        mv: MoveData,
    ) -> Result<(), SessionError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| SessionError::RoomNotFound(room_id.clone()))?;
        handle.relay_move(sender_id, mv)?;
        Ok(())
    }

    /// Forwards a rematch request into a room.
    pub fn request_rematch(
        &self,
        room_id: &RoomId,
        sender_id: ParticipantId,
    ) -> Result<(), SessionError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| SessionError::RoomNotFound(room_id.clone()))?;
        handle.request_rematch(sender_id)?;
        Ok(())
    }

    /// Forwards a rematch acceptance into a room. If the room no longer
    /// exists (opponent disconnected between request and accept), this is
    /// the silent no-op the protocol promises.
    pub fn accept_rematch(
        &self,
        room_id: &RoomId,
    ) -> Result<(), SessionError> {
        let handle = self
            .rooms
            .get(room_id)
            .ok_or_else(|| SessionError::RoomNotFound(room_id.clone()))?;
        handle.accept_rematch()?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------

    /// Handles a lost connection: removes the participant from their room
    /// (direct lookup, not a scan) and deletes the room if it is now
    /// empty. Unknown participants are a no-op.
    pub async fn disconnect(&mut self, participant_id: &ParticipantId) {
        let Some(room_id) = self.participant_rooms.remove(participant_id)
        else {
            tracing::debug!(
                %participant_id,
                "disconnect for unseated participant, nothing to do"
            );
            return;
        };

        let Some(handle) = self.rooms.get(&room_id).cloned() else {
            return;
        };

        match handle.leave(participant_id.clone()).await {
            Ok(0) => {
                // Last one out: the actor already stopped the clock.
                self.delete(&room_id);
            }
            Ok(remaining) => {
                tracing::info!(
                    %room_id,
                    %participant_id,
                    remaining,
                    "participant disconnected, room stranded"
                );
            }
            Err(e) => {
                tracing::debug!(%room_id, error = %e, "leave failed");
            }
        }
    }

    /// Explicit, client-initiated teardown: broadcast the closure, evict
    /// every participant, stop the clock, and delete the room.
    /// Idempotent — closing an absent room is a no-op.
    pub async fn close_room(&mut self, room_id: &RoomId) {
        let Some(handle) = self.rooms.remove(room_id) else {
            tracing::debug!(%room_id, "close for unknown room, nothing to do");
            return;
        };

        let _ = handle.close().await;
        self.participant_rooms.retain(|_, rid| rid != room_id);
        tracing::info!(%room_id, "room closed");
    }

    // -----------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------

    /// The room a participant is currently seated in, if any.
    pub fn participant_room(
        &self,
        participant_id: &ParticipantId,
    ) -> Option<&RoomId> {
        self.participant_rooms.get(participant_id)
    }

    /// The number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

/// Generates a random 32-character hex room id (128 bits of entropy),
/// for rooms opened by quick-match rather than named by a client.
fn generate_room_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
