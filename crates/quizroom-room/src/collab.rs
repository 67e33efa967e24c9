//! The external collaborators a room depends on.
//!
//! Quizzes are authored and stored elsewhere, and finished sessions are
//! persisted elsewhere. The engine only sees these two narrow traits.

use std::future::Future;

use quizroom_protocol::{InviteCode, Quiz, UserId};

/// Resolves an invite code to a quiz.
pub trait QuizStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns `Ok(None)` when no quiz has this invite code.
    fn get_quiz(
        &self,
        invite_code: &InviteCode,
    ) -> impl Future<Output = Result<Option<Quiz>, Self::Error>> + Send;
}

/// A member's session began (the room entered `GAME_IN_PROGRESS`).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStart {
    pub game_id: u64,
    pub user_id: UserId,
    pub instance_id: u64,
}

/// A member's session ended (the room entered `GAME_FINISHED`).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEnd {
    pub game_id: u64,
    pub user_id: UserId,
    pub instance_id: u64,
    /// Competition rank among the members at the end: 1 is the highest
    /// score, ties share a place.
    pub place: usize,
    pub question_count: usize,
    /// Members excluding the owner.
    pub player_count: usize,
    pub points: f64,
}

/// Persists session records.
///
/// Each room writes its records on a separate task, one at a time and in
/// the order they happened, so a slow store never delays a countdown.
/// Failures are logged and otherwise ignored.
pub trait SessionRecorder: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn record_start(
        &self,
        record: SessionStart,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn record_end(
        &self,
        record: SessionEnd,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
