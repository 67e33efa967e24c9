//! Per-connection handler: auth, registration, and the dispatch loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Read the `token` query parameter and authenticate it
//!   2. Register the user in the connection registry
//!   3. Loop: decode inbound frames and dispatch them, while draining the
//!      user's outbound queue onto the socket
//!   4. On exit, leave the room and unregister (guarded by `Drop`)

use std::sync::Arc;

use quizroom_protocol::{ClientMessage, Codec, Envelope, Reply, ReplyKind, UserId};
use quizroom_room::{QuizStore, SessionRecorder};
use quizroom_session::{Authenticator, Participant, SessionError};
use quizroom_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::QuizroomError;
use crate::server::ServerState;

/// Runs connection cleanup when the handler exits.
///
/// Normal exits call [`release`](Self::release) and wait for the cleanup.
/// If the handler unwinds or is cancelled instead, `Drop` spawns the same
/// cleanup as a fire-and-forget task.
struct ConnectionGuard<A, Q, R, C>
where
    A: Authenticator,
    Q: QuizStore,
    R: SessionRecorder,
    C: Codec,
{
    user: UserId,
    state: Option<Arc<ServerState<A, Q, R, C>>>,
}

impl<A, Q, R, C> ConnectionGuard<A, Q, R, C>
where
    A: Authenticator,
    Q: QuizStore,
    R: SessionRecorder,
    C: Codec,
{
    async fn release(mut self) {
        if let Some(state) = self.state.take() {
            state.engine.disconnect(self.user).await;
        }
    }
}

impl<A, Q, R, C> Drop for ConnectionGuard<A, Q, R, C>
where
    A: Authenticator,
    Q: QuizStore,
    R: SessionRecorder,
    C: Codec,
{
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            let user = self.user;
            tokio::spawn(async move {
                state.engine.disconnect(user).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, Q, R, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, Q, R, C>>,
) -> Result<(), QuizroomError>
where
    A: Authenticator,
    Q: QuizStore,
    R: SessionRecorder,
    C: Codec,
{
    let conn_id = conn.id();
    debug!(%conn_id, "handling new connection");

    // --- Step 1: Authenticate ---
    let auth = match conn.query_param("token") {
        Some(token) if !token.is_empty() => state.auth.authenticate(token).await,
        _ => Err(SessionError::AuthFailed("missing token".into())),
    };
    let profile = match auth {
        Ok(profile) => profile,
        Err(e) => {
            reject(&conn, &state.codec, Reply::error_detail(ReplyKind::InitError, e.to_string()))
                .await;
            return Err(e.into());
        }
    };

    // --- Step 2: Register ---
    let (sender, mut outbound) = mpsc::unbounded_channel();
    let participant = match state.engine.connect(profile, sender).await {
        Ok(participant) => participant,
        Err(e) => {
            reject(&conn, &state.codec, Reply::error(ReplyKind::AlreadyConnected)).await;
            return Err(e.into());
        }
    };
    let user = participant.id();
    info!(%conn_id, %user, "participant connected");

    let guard = ConnectionGuard {
        user,
        state: Some(Arc::clone(&state)),
    };

    // --- Step 3: Dispatch loop ---
    loop {
        tokio::select! {
            frame = conn.recv() => match frame {
                Ok(Some(data)) => handle_frame(&state, &participant, &data).await,
                Ok(None) => {
                    info!(%user, "connection closed cleanly");
                    break;
                }
                Err(e) => {
                    debug!(%user, error = %e, "recv error");
                    break;
                }
            },
            reply = outbound.recv() => {
                let Some(reply) = reply else { break };
                let text = state.codec.encode(&reply)?;
                if let Err(e) = conn.send(&text).await {
                    debug!(%user, error = %e, "send failed");
                    break;
                }
            }
        }
    }

    // --- Step 4: Cleanup ---
    guard.release().await;
    Ok(())
}

/// Decodes one inbound frame and dispatches it.
///
/// Malformed frames are answered on the caller's queue and never end the
/// connection.
async fn handle_frame<A, Q, R, C>(
    state: &ServerState<A, Q, R, C>,
    participant: &Participant,
    data: &[u8],
) where
    A: Authenticator,
    Q: QuizStore,
    R: SessionRecorder,
    C: Codec,
{
    let user = participant.id();
    let envelope: Envelope = match state.codec.decode(data) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(%user, error = %e, "failed to decode envelope");
            participant.send(Reply::error_detail(ReplyKind::MessageError, e.to_string()));
            return;
        }
    };

    let kind = envelope.message;
    let message = match ClientMessage::try_from(envelope) {
        Ok(message) => message,
        Err(e) => {
            debug!(%user, ?kind, error = %e, "invalid message data");
            participant.send(Reply::error_detail(ReplyKind::DataError, e.to_string()));
            return;
        }
    };

    debug!(%user, ?kind, "dispatching");
    state.engine.dispatch(participant, message).await;
}

/// Sends a setup error and closes the connection.
async fn reject(conn: &WebSocketConnection, codec: &impl Codec, reply: Reply) {
    match codec.encode(&reply) {
        Ok(text) => {
            if let Err(e) = conn.send(&text).await {
                debug!(conn_id = %conn.id(), error = %e, "failed to send rejection");
            }
        }
        Err(e) => debug!(error = %e, "failed to encode rejection"),
    }
    let _ = conn.close().await;
    debug!(conn_id = %conn.id(), kind = ?reply.message, "connection rejected");
}
