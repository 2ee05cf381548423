//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Joins, moves, rematch events, teardown, and
//! the room's own clock ticks all arrive on the same queue, so two
//! mutations of the same room never interleave partially — no locking
//! inside the actor.
//!
//! The command channel is unbounded: the relay has no backpressure
//! mechanism by design, and the clock must be able to post ticks from a
//! synchronous callback.

use tempo_clock::TurnClock;
use tempo_protocol::{
    GameOverReason, MoveData, ParticipantId, ParticipantSnapshot, RoomId,
    RoomSnapshot, Seat, ServerEvent,
};
use tokio::sync::{mpsc, oneshot};

use crate::{RoomConfig, RoomError, RoomPhase};

/// Channel on which a participant's connection receives room broadcasts.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// The join payload minus the room id: who is joining.
#[derive(Debug, Clone)]
pub struct ParticipantProfile {
    pub id: ParticipantId,
    pub username: String,
    pub avatar: String,
}

/// What a join did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// A free seat was assigned.
    Seated(Seat),
    /// The identity was already seated; seat, order, and clock untouched.
    /// The stored event channel was refreshed for the retried connection.
    Rejoined,
}

/// A seated participant. Owned exclusively by the room actor.
struct Participant {
    id: ParticipantId,
    username: String,
    avatar: String,
    seat: Seat,
    remaining_secs: u64,
    sender: EventSender,
}

impl Participant {
    fn snapshot(&self) -> ParticipantSnapshot {
        ParticipantSnapshot {
            id: self.id.clone(),
            username: self.username.clone(),
            avatar: self.avatar.clone(),
            seat: self.seat,
            remaining_time: self.remaining_secs,
        }
    }
}

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/reply; the rest are
/// fire-and-forget, matching the protocol's silent-no-op error policy.
pub(crate) enum RoomCommand {
    /// Seat a participant (or refresh a duplicate join).
    Join {
        profile: ParticipantProfile,
        sender: EventSender,
        reply: oneshot::Sender<Result<JoinOutcome, RoomError>>,
    },

    /// Remove a participant. Replies with how many remain.
    Leave {
        participant_id: ParticipantId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Relay a move to the opponent and hand the turn over.
    Move {
        sender_id: ParticipantId,
        mv: MoveData,
    },

    /// First half of the rematch handshake.
    RequestRematch { sender_id: ParticipantId },

    /// Second half: reset clocks and reactivate.
    AcceptRematch,

    /// One clock tick. Stale epochs are discarded.
    Tick { epoch: u64 },

    /// Request room metadata.
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// Request the sanitized snapshot.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    /// Tear the room down: notify, evict everyone, stop the clock.
    Close {
        reply: oneshot::Sender<()>,
    },
}

/// A snapshot of room metadata (not the sanitized client view).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's identifier.
    pub room_id: RoomId,
    /// Current lifecycle phase.
    pub phase: RoomPhase,
    /// Number of seated participants (0–2).
    pub participant_count: usize,
}

/// Handle to a running room actor. Cheap to clone; the session registry
/// holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::UnboundedSender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's identifier.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Seats a participant, or refreshes a duplicate join.
    pub async fn join(
        &self,
        profile: ParticipantProfile,
        sender: EventSender,
    ) -> Result<JoinOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                profile,
                sender,
                reply: reply_tx,
            })
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Removes a participant. Replies with the remaining count so the
    /// registry can delete emptied rooms.
    pub async fn leave(
        &self,
        participant_id: ParticipantId,
    ) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                participant_id,
                reply: reply_tx,
            })
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    /// Relays a move (fire-and-forget).
    pub fn relay_move(
        &self,
        sender_id: ParticipantId,
        mv: MoveData,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Move { sender_id, mv })
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Broadcasts a rematch request to the other participant.
    pub fn request_rematch(
        &self,
        sender_id: ParticipantId,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::RequestRematch { sender_id })
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Accepts a rematch: clocks reset, white to move, clock restarted.
    pub fn accept_rematch(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::AcceptRematch)
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Requests the current room metadata.
    ///
    /// Also serves as an ordering barrier in tests: the reply proves every
    /// previously sent fire-and-forget command has been applied.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Requests the sanitized snapshot clients are allowed to see.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    /// Tears the room down. The reply resolves after the close broadcast
    /// has been dispatched and the clock stopped.
    pub async fn close(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Close { reply: reply_tx })
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    phase: RoomPhase,
    config: RoomConfig,
    /// Join order is seat order: index 0 is white, index 1 is black.
    participants: Vec<Participant>,
    current_turn: Option<ParticipantId>,
    clock: TurnClock,
    /// Weak handle to the actor's own command channel; the clock posts
    /// ticks through it so they serialize with every other mutation.
    /// Weak so the actor's own loop still ends when every real handle
    /// is gone.
    commands: mpsc::WeakUnboundedSender<RoomCommand>,
    receiver: mpsc::UnboundedReceiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until the room closes.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room opened");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    profile,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(profile, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave {
                    participant_id,
                    reply,
                } => {
                    let result = self.handle_leave(&participant_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Move { sender_id, mv } => {
                    self.handle_move(&sender_id, mv);
                }
                RoomCommand::RequestRematch { sender_id } => {
                    self.handle_request_rematch(&sender_id);
                }
                RoomCommand::AcceptRematch => {
                    self.handle_accept_rematch();
                }
                RoomCommand::Tick { epoch } => {
                    self.handle_tick(epoch);
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                RoomCommand::Close { reply } => {
                    self.handle_close();
                    let _ = reply.send(());
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room closed");
    }

    // -----------------------------------------------------------------
    // Join / seat assignment
    // -----------------------------------------------------------------

    fn handle_join(
        &mut self,
        profile: ParticipantProfile,
        sender: EventSender,
    ) -> Result<JoinOutcome, RoomError> {
        // Duplicate join from a retried connection: seat, order, and
        // remaining time stay untouched; only the outbound channel is
        // refreshed so the new socket keeps receiving broadcasts.
        if let Some(existing) = self
            .participants
            .iter_mut()
            .find(|p| p.id == profile.id)
        {
            existing.sender = sender;
            tracing::debug!(
                room_id = %self.room_id,
                participant_id = %profile.id,
                "duplicate join, seat unchanged"
            );
            return Ok(JoinOutcome::Rejoined);
        }

        if self.participants.len() >= 2 {
            return Err(RoomError::SeatUnavailable(self.room_id.clone()));
        }

        let seat = if self.participants.is_empty() {
            Seat::White
        } else {
            Seat::Black
        };

        self.participants.push(Participant {
            id: profile.id.clone(),
            username: profile.username,
            avatar: profile.avatar,
            seat,
            remaining_secs: self.config.initial_time_secs,
            sender,
        });
        tracing::info!(
            room_id = %self.room_id,
            participant_id = %profile.id,
            %seat,
            participants = self.participants.len(),
            "participant seated"
        );

        // Second distinct identity completes the pairing: white (the
        // first joiner) gets the turn, the clock starts, and startGame
        // goes out exactly once. A join into a stranded Active room
        // takes the free seat but does not restart play.
        if self.participants.len() == 2
            && self.phase == RoomPhase::WaitingForOpponent
        {
            self.transition(RoomPhase::Active);
            self.current_turn = Some(self.participants[0].id.clone());
            self.start_clock();
            let snap = self.snapshot();
            self.broadcast(ServerEvent::StartGame(snap));
            tracing::info!(room_id = %self.room_id, "game started");
        }

        Ok(JoinOutcome::Seated(seat))
    }

    // -----------------------------------------------------------------
    // Move relay
    // -----------------------------------------------------------------

    fn handle_move(&mut self, sender_id: &ParticipantId, mv: MoveData) {
        if self.participants.len() < 2 {
            tracing::debug!(
                room_id = %self.room_id,
                participant_id = %sender_id,
                "move ignored, room not fully seated"
            );
            return;
        }

        let Some(current) = self.current_turn.clone() else {
            // Stale turn reference: the holder left and play never
            // restarted. Skip with no broadcast.
            tracing::warn!(
                room_id = %self.room_id,
                "move against vacant turn, ignoring"
            );
            return;
        };

        // Turn ownership was checked by the sender's client; the session
        // layer only hands the turn to whoever is not holding it.
        let Some(next) = self
            .participants
            .iter()
            .find(|p| p.id != current)
            .map(|p| p.id.clone())
        else {
            tracing::warn!(
                room_id = %self.room_id,
                "no opponent for turn handover, ignoring move"
            );
            return;
        };

        self.current_turn = Some(next.clone());
        self.broadcast_except(sender_id, ServerEvent::Move(mv));
        // Reset after the turn flip and broadcast, so the next
        // timeUpdate already names the new holder — and the mover's
        // opponent gets a full fresh second regardless of where inside
        // the old tick period the move landed.
        self.start_clock();

        tracing::debug!(
            room_id = %self.room_id,
            from = %sender_id,
            next_turn = %next,
            "move relayed"
        );
    }

    // -----------------------------------------------------------------
    // Clock ticks
    // -----------------------------------------------------------------

    fn handle_tick(&mut self, epoch: u64) {
        if epoch != self.clock.epoch() || !self.clock.is_running() {
            // A schedule that was cancelled can still have one tick in
            // flight behind the command that cancelled it.
            tracing::trace!(
                room_id = %self.room_id,
                epoch,
                "stale tick discarded"
            );
            return;
        }

        let Some(current) = self.current_turn.clone() else {
            tracing::warn!(
                room_id = %self.room_id,
                "tick against vacant turn, skipped"
            );
            return;
        };

        let Some(participant) = self
            .participants
            .iter_mut()
            .find(|p| p.id == current)
        else {
            // Stale turn reference (torn down concurrently): skip, no
            // broadcast; the schedule stays until teardown cancels it.
            tracing::warn!(
                room_id = %self.room_id,
                participant_id = %current,
                "tick for absent participant, skipped"
            );
            return;
        };

        participant.remaining_secs =
            participant.remaining_secs.saturating_sub(1);
        let remaining = participant.remaining_secs;

        self.broadcast(ServerEvent::TimeUpdate {
            participant_id: current.clone(),
            remaining_time: remaining,
        });

        if remaining == 0 {
            // Flag fell. The other participant wins; the clock stops and
            // the room sits until a rematch or teardown.
            if let Some(winner) = self
                .participants
                .iter()
                .find(|p| p.id != current)
                .map(|p| p.id.clone())
            {
                self.broadcast(ServerEvent::GameOver {
                    winner_id: winner.clone(),
                    reason: GameOverReason::Time,
                });
                tracing::info!(
                    room_id = %self.room_id,
                    winner_id = %winner,
                    "game over on time"
                );
            }
            self.clock.stop();
        }
    }

    // -----------------------------------------------------------------
    // Rematch handshake
    // -----------------------------------------------------------------

    fn handle_request_rematch(&mut self, sender_id: &ParticipantId) {
        // No server-side bookkeeping of who asked — the UI gates repeat
        // requests. The phase freeze only happens on the first legal one.
        if self.phase == RoomPhase::Active {
            self.transition(RoomPhase::RematchRequested);
        }
        self.broadcast_except(sender_id, ServerEvent::PlayAgainRequest);
        tracing::debug!(
            room_id = %self.room_id,
            participant_id = %sender_id,
            "rematch requested"
        );
    }

    fn handle_accept_rematch(&mut self) {
        if self.participants.len() < 2 {
            // Restarting the clock with one participant would break the
            // clock invariant; the opponent is gone anyway.
            tracing::debug!(
                room_id = %self.room_id,
                "rematch accept ignored, opponent missing"
            );
            return;
        }

        if self.phase == RoomPhase::RematchRequested {
            self.transition(RoomPhase::Active);
        }

        for participant in &mut self.participants {
            participant.remaining_secs = self.config.initial_time_secs;
        }
        self.current_turn = Some(self.participants[0].id.clone());

        let snap = self.snapshot();
        self.broadcast(ServerEvent::PlayAgainAccepted(snap));
        self.start_clock();

        tracing::info!(room_id = %self.room_id, "rematch accepted, game reset");
    }

    // -----------------------------------------------------------------
    // Departure and teardown
    // -----------------------------------------------------------------

    fn handle_leave(
        &mut self,
        participant_id: &ParticipantId,
    ) -> Result<usize, RoomError> {
        let Some(index) = self
            .participants
            .iter()
            .position(|p| &p.id == participant_id)
        else {
            return Err(RoomError::NotInRoom(
                participant_id.clone(),
                self.room_id.clone(),
            ));
        };

        let departed = self.participants.remove(index);
        if self.current_turn.as_ref() == Some(&departed.id) {
            self.current_turn = None;
        }

        // Fewer than two participants: the clock must not run.
        if self.participants.len() < 2 {
            self.clock.stop();
        }

        self.broadcast(ServerEvent::PlayerDisconnected {
            username: departed.username.clone(),
        });

        tracing::info!(
            room_id = %self.room_id,
            participant_id = %participant_id,
            remaining = self.participants.len(),
            "participant left"
        );

        Ok(self.participants.len())
    }

    fn handle_close(&mut self) {
        self.broadcast(ServerEvent::CloseRoom {
            room_id: self.room_id.clone(),
        });
        self.participants.clear();
        self.clock.stop();
        self.transition(RoomPhase::Closed);
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Applies a phase transition, rejecting illegal edges with a warning
    /// and no state change.
    fn transition(&mut self, to: RoomPhase) {
        match self.phase.transition_to(to) {
            Ok(next) => {
                tracing::debug!(
                    room_id = %self.room_id,
                    from = %self.phase,
                    to = %next,
                    "phase transition"
                );
                self.phase = next;
            }
            Err(e) => {
                tracing::warn!(room_id = %self.room_id, error = %e, "phase unchanged");
            }
        }
    }

    /// Cancels any running schedule and starts a fresh one from t = 0.
    fn start_clock(&mut self) {
        let commands = self.commands.clone();
        self.clock.restart(move |epoch| {
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(RoomCommand::Tick { epoch });
            }
        });
    }

    /// Sends an event to every participant.
    fn broadcast(&self, event: ServerEvent) {
        for participant in &self.participants {
            let _ = participant.sender.send(event.clone());
        }
    }

    /// Sends an event to every participant except `excluded`.
    fn broadcast_except(
        &self,
        excluded: &ParticipantId,
        event: ServerEvent,
    ) {
        for participant in &self.participants {
            if &participant.id != excluded {
                let _ = participant.sender.send(event.clone());
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id.clone(),
            phase: self.phase,
            participant_count: self.participants.len(),
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id.clone(),
            participants: self
                .participants
                .iter()
                .map(Participant::snapshot)
                .collect(),
            current_turn: self.current_turn.clone(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub fn spawn_room(room_id: RoomId, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let tick_period = config.tick_period;

    let actor = RoomActor {
        room_id: room_id.clone(),
        phase: RoomPhase::WaitingForOpponent,
        config,
        participants: Vec::new(),
        current_turn: None,
        clock: TurnClock::new(tick_period),
        commands: tx.downgrade(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
