//! The session engine: both registries plus the quiz collaborator.
//!
//! Every operation a client can trigger goes through a [`SessionEngine`]
//! method. Membership changes hold the room registry lock for the whole
//! operation so "one room per user" can't race; everything else clones the
//! room's handle out of the registry and talks to the room actor without
//! holding any lock.

use std::sync::Arc;

use quizroom_protocol::{ClientMessage, InviteCode, Profile, Reply, ReplyKind, UserId};
use quizroom_room::{EngineConfig, QuizStore, RoomError, RoomHandle, RoomManager, SessionRecorder};
use quizroom_session::{ConnectionRegistry, Participant, ReplySender, SessionError};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Owns the connection registry, the room registry, and the quiz store.
pub struct SessionEngine<Q: QuizStore, R: SessionRecorder> {
    connections: Mutex<ConnectionRegistry>,
    rooms: Mutex<RoomManager<R>>,
    quizzes: Q,
}

impl<Q: QuizStore, R: SessionRecorder> SessionEngine<Q, R> {
    pub fn new(quizzes: Q, recorder: Arc<R>, config: EngineConfig) -> Self {
        Self {
            connections: Mutex::new(ConnectionRegistry::new()),
            rooms: Mutex::new(RoomManager::new(recorder, config)),
            quizzes,
        }
    }

    // -- connections ------------------------------------------------------

    /// Registers an authenticated connection.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the user already has one.
    pub async fn connect(
        &self,
        profile: Profile,
        sender: ReplySender,
    ) -> Result<Participant, SessionError> {
        let mut connections = self.connections.lock().await;
        connections.register(profile, sender).cloned()
    }

    /// Cleanup for a closed connection: leaves the user's room (deleting it
    /// if they own it), then unregisters the connection.
    pub async fn disconnect(&self, user: UserId) {
        match self.rooms.lock().await.leave_room(user).await {
            Ok(outcome) => debug!(%user, ?outcome, "left room on disconnect"),
            Err(RoomError::NotInGame) => {}
            Err(e) => warn!(%user, error = %e, "leave on disconnect failed"),
        }

        if let Err(e) = self.connections.lock().await.unregister(user) {
            debug!(%user, error = %e, "disconnect for unregistered user");
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    // -- dispatch ---------------------------------------------------------

    /// Routes one decoded client message to its operation.
    ///
    /// Successful operations answer through the room; a refusal is turned
    /// into its error reply and queued for the caller here.
    pub async fn dispatch(&self, participant: &Participant, message: ClientMessage) {
        let user = participant.id();
        let result = match message {
            ClientMessage::Ping => {
                participant.send(Reply::message(ReplyKind::Pong));
                return;
            }
            ClientMessage::JoinGame { invite_code } => {
                self.join_room(participant, invite_code).await
            }
            ClientMessage::LeaveGame => self.leave_room(user).await,
            ClientMessage::GetGame => self.get_game(user).await,
            ClientMessage::IsOwner => self.is_owner(user).await,
            ClientMessage::StartGame => self.start_game(user).await,
            ClientMessage::ResetGame => self.reset_game(user).await,
            ClientMessage::AnswerQuestion { option } => self.answer_question(user, option).await,
            ClientMessage::NextRound => self.next_round(user).await,
            ClientMessage::SendChat { message } => self.send_chat(user, message).await,
        };

        if let Err(e) = result {
            debug!(%user, error = %e, "request refused");
            participant.send(e.reply());
        }
    }

    // -- membership -------------------------------------------------------

    /// Joins the room for `invite_code`, opening it if the participant owns
    /// the quiz.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInGame`]: already in a room
    /// - [`RoomError::Lookup`]: the quiz store failed
    /// - [`RoomError::GameNotFound`]: no quiz with that invite code
    /// - [`RoomError::NotOwner`]: no live room and not the quiz's owner
    pub async fn join_room(
        &self,
        participant: &Participant,
        invite_code: InviteCode,
    ) -> Result<(), RoomError> {
        let user = participant.id();
        if self.rooms.lock().await.room_of(user).is_some() {
            return Err(RoomError::AlreadyInGame);
        }

        // The lookup may be slow; don't hold the registry across it.
        let quiz = self
            .quizzes
            .get_quiz(&invite_code)
            .await
            .map_err(|e| {
                warn!(%invite_code, error = %e, "quiz lookup failed");
                RoomError::Lookup(e.to_string())
            })?
            .ok_or(RoomError::GameNotFound)?;

        let mut rooms = self.rooms.lock().await;
        rooms.join_room(participant.clone(), Arc::new(quiz)).await?;
        info!(%user, %invite_code, rooms = rooms.room_count(), "joined room");
        Ok(())
    }

    pub async fn leave_room(&self, user: UserId) -> Result<(), RoomError> {
        self.rooms.lock().await.leave_room(user).await.map(|_| ())
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.room_count()
    }

    // -- room operations --------------------------------------------------

    pub async fn get_game(&self, user: UserId) -> Result<(), RoomError> {
        self.room_for(user).await?.get_game(user).await
    }

    pub async fn is_owner(&self, user: UserId) -> Result<(), RoomError> {
        self.room_for(user).await?.is_owner(user).await
    }

    pub async fn start_game(&self, user: UserId) -> Result<(), RoomError> {
        self.room_for(user).await?.start(user).await
    }

    pub async fn reset_game(&self, user: UserId) -> Result<(), RoomError> {
        self.room_for(user).await?.reset(user).await
    }

    pub async fn answer_question(&self, user: UserId, option: usize) -> Result<(), RoomError> {
        self.room_for(user).await?.answer(user, option).await
    }

    pub async fn next_round(&self, user: UserId) -> Result<(), RoomError> {
        self.room_for(user).await?.next_round(user).await
    }

    pub async fn send_chat(&self, user: UserId, message: String) -> Result<(), RoomError> {
        self.room_for(user).await?.chat(user, message).await
    }

    /// Clones the handle of the user's room out of the registry.
    pub async fn room_for(&self, user: UserId) -> Result<RoomHandle, RoomError> {
        self.rooms.lock().await.handle_for(user)
    }
}
