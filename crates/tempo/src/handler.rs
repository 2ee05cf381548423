//! Per-connection handler: event decoding, dispatch, and teardown.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that pumps room broadcasts onto the socket
//!   2. Loop: receive frames → decode [`ClientEvent`] → forward to the
//!      registry
//!   3. On socket close, run the disconnect path for whatever identity
//!      this connection last joined with
//!
//! Per the protocol's error policy nothing here ever answers an event
//! with an error: malformed frames and failed operations are logged at
//! debug and dropped.

use std::sync::Arc;

use tempo_protocol::{ClientEvent, Codec, ParticipantId, ServerEvent};
use tempo_room::ParticipantProfile;
use tempo_transport::{Connection, WsConnection};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::server::ServerState;
use crate::RelayError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WsConnection,
    state: Arc<ServerState>,
) -> Result<(), RelayError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // Everything a room broadcasts to this participant funnels through
    // this channel; the writer task serializes it onto the socket.
    let (events_tx, mut events_rx) =
        mpsc::unbounded_channel::<ServerEvent>();

    let writer = tokio::spawn({
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        async move {
            while let Some(event) = events_rx.recv().await {
                let frame = match codec.encode(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "encode failed");
                        continue;
                    }
                };
                if conn.send(&frame).await.is_err() {
                    break;
                }
            }
        }
    });

    // The identity this connection most recently joined with. Stable
    // across the connection's lifetime; used for the disconnect path.
    let mut identity: Option<ParticipantId> = None;

    loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&frame) {
            Ok(event) => event,
            Err(e) => {
                // Malformed input is rejected silently at the boundary.
                tracing::debug!(%conn_id, error = %e, "dropping malformed event");
                continue;
            }
        };

        dispatch_event(&state, &events_tx, &mut identity, event).await;
    }

    // Connection gone: remove the participant from their room, deleting
    // the room if they were the last one in it.
    if let Some(participant_id) = identity.take() {
        state
            .registry
            .lock()
            .await
            .disconnect(&participant_id)
            .await;
    }
    writer.abort();

    Ok(())
}

/// Routes one decoded client event into the session registry.
async fn dispatch_event(
    state: &Arc<ServerState>,
    events_tx: &UnboundedSender<ServerEvent>,
    identity: &mut Option<ParticipantId>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom {
            username,
            room_id,
            avatar,
            participant_id,
        } => {
            *identity = Some(participant_id.clone());
            let profile = ParticipantProfile {
                id: participant_id,
                username,
                avatar,
            };
            let result = state
                .registry
                .lock()
                .await
                .join(&room_id, profile, events_tx.clone())
                .await;
            if let Err(e) = result {
                tracing::debug!(%room_id, error = %e, "join dropped");
            }
        }

        ClientEvent::QuickMatch {
            username,
            avatar,
            participant_id,
        } => {
            *identity = Some(participant_id.clone());
            let profile = ParticipantProfile {
                id: participant_id,
                username,
                avatar,
            };
            let result = state
                .registry
                .lock()
                .await
                .quick_match(profile, events_tx.clone())
                .await;
            match result {
                Ok((room_id, snapshot)) => {
                    tracing::debug!(%room_id, "quick match seated");
                    let _ = events_tx
                        .send(ServerEvent::RoomJoined(snapshot));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "quick match dropped");
                }
            }
        }

        ClientEvent::Move { mv, room } => {
            // A move is attributed to whoever this connection joined as;
            // a connection that never joined has nothing to relay.
            let Some(sender_id) = identity.clone() else {
                tracing::debug!(%room, "move from unjoined connection, dropped");
                return;
            };
            let result = state
                .registry
                .lock()
                .await
                .relay_move(&room, sender_id, mv);
            if let Err(e) = result {
                tracing::debug!(%room, error = %e, "move dropped");
            }
        }

        ClientEvent::RequestPlayAgain { room } => {
            let Some(sender_id) = identity.clone() else {
                tracing::debug!(%room, "rematch request from unjoined connection");
                return;
            };
            let result = state
                .registry
                .lock()
                .await
                .request_rematch(&room, sender_id);
            if let Err(e) = result {
                tracing::debug!(%room, error = %e, "rematch request dropped");
            }
        }

        ClientEvent::AcceptPlayAgain { room } => {
            let result =
                state.registry.lock().await.accept_rematch(&room);
            if let Err(e) = result {
                tracing::debug!(%room, error = %e, "rematch accept dropped");
            }
        }

        ClientEvent::CloseRoom { room_id } => {
            state.registry.lock().await.close_room(&room_id).await;
        }
    }
}
