//! Room manager: creates, tracks, and routes users to rooms.

use std::collections::HashMap;
use std::sync::Arc;

use quizroom_protocol::{InviteCode, Quiz, UserId};
use quizroom_session::Participant;

use crate::room::spawn_room;
use crate::{EngineConfig, LeaveOutcome, RoomError, RoomHandle, SessionRecorder};

/// The room registry.
///
/// Holds one live room per invite code and tracks which room each user is
/// in. A user can be in at most ONE room at a time (key invariant).
pub struct RoomManager<R: SessionRecorder> {
    /// Live rooms, keyed by invite code.
    rooms: HashMap<InviteCode, RoomHandle>,

    /// Maps each user to the room they're currently in.
    participant_rooms: HashMap<UserId, InviteCode>,

    recorder: Arc<R>,
    config: EngineConfig,
}

impl<R: SessionRecorder> RoomManager<R> {
    pub fn new(recorder: Arc<R>, config: EngineConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            participant_rooms: HashMap::new(),
            recorder,
            config,
        }
    }

    /// Adds a participant to the room for `quiz`, opening it if needed.
    ///
    /// Only the quiz's owner may open a room; anyone may join one that is
    /// already live.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInGame`]: the participant is already in a room
    /// - [`RoomError::NotOwner`]: no live room, and the participant isn't
    ///   the quiz's owner
    pub async fn join_room(
        &mut self,
        participant: Participant,
        quiz: Arc<Quiz>,
    ) -> Result<(), RoomError> {
        let user = participant.id();
        if self.participant_rooms.contains_key(&user) {
            return Err(RoomError::AlreadyInGame);
        }

        let invite_code = quiz.invite_code.clone();
        if let Some(handle) = self.rooms.get(&invite_code) {
            handle.join(participant).await?;
            self.participant_rooms.insert(user, invite_code);
            return Ok(());
        }

        if quiz.owner != user {
            return Err(RoomError::NotOwner);
        }

        let handle = spawn_room(
            quiz,
            participant,
            Arc::clone(&self.recorder),
            self.config.clone(),
        );
        self.rooms.insert(invite_code.clone(), handle);
        self.participant_rooms.insert(user, invite_code);
        Ok(())
    }

    /// Removes a user from their current room.
    ///
    /// If the user owns the room, the room is deleted and every member is
    /// dropped from the index.
    ///
    /// # Errors
    /// Returns [`RoomError::NotInGame`] if the user isn't in a room.
    pub async fn leave_room(&mut self, user: UserId) -> Result<LeaveOutcome, RoomError> {
        let invite_code = self
            .participant_rooms
            .get(&user)
            .cloned()
            .ok_or(RoomError::NotInGame)?;

        let Some(handle) = self.rooms.get(&invite_code) else {
            self.participant_rooms.remove(&user);
            return Err(RoomError::NotInGame);
        };

        match handle.leave(user).await {
            Ok(LeaveOutcome::Left) => {
                self.participant_rooms.remove(&user);
                Ok(LeaveOutcome::Left)
            }
            Ok(LeaveOutcome::Deleted) => {
                self.remove_room(&invite_code);
                Ok(LeaveOutcome::Deleted)
            }
            Err(RoomError::Unavailable(_)) => {
                self.remove_room(&invite_code);
                Err(RoomError::NotInGame)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns a handle to the user's current room.
    ///
    /// Callers clone the handle out and talk to the room without holding
    /// the manager.
    pub fn handle_for(&self, user: UserId) -> Result<RoomHandle, RoomError> {
        self.participant_rooms
            .get(&user)
            .and_then(|invite_code| self.rooms.get(invite_code))
            .cloned()
            .ok_or(RoomError::NotInGame)
    }

    /// Returns the invite code of the user's current room, if any.
    pub fn room_of(&self, user: UserId) -> Option<&InviteCode> {
        self.participant_rooms.get(&user)
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn remove_room(&mut self, invite_code: &InviteCode) {
        self.rooms.remove(invite_code);
        self.participant_rooms.retain(|_, code| code != invite_code);
        tracing::info!(%invite_code, rooms = self.rooms.len(), "room removed");
    }
}
