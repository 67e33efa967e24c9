//! Error types for the room layer.

use quizroom_protocol::{InviteCode, Reply, ReplyKind, RoomStatus, RoundStatus};

/// Errors that can occur during room operations.
///
/// Every variant is a recoverable, per-request refusal. [`RoomError::reply`]
/// turns it into the frame sent back to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoomError {
    /// The caller isn't a member of any room.
    #[error("not in a game")]
    NotInGame,

    /// The caller is already a member of a room.
    #[error("already in a game")]
    AlreadyInGame,

    /// No quiz exists for the invite code.
    #[error("game not found")]
    GameNotFound,

    /// The operation is reserved for the room owner, or a non-owner tried
    /// to open a room.
    #[error("not the owner")]
    NotOwner,

    /// The room is in the wrong state. Carries the actual status so the
    /// client can resynchronize.
    #[error("room is {0}")]
    RoomStatus(RoomStatus),

    /// The current round is in the wrong state.
    #[error("round is {0}")]
    RoundStatus(RoundStatus),

    /// The chosen option doesn't exist in the current question.
    #[error("option {option} out of range for {count} options")]
    InvalidOption { option: usize, count: usize },

    /// The quiz lookup collaborator failed.
    #[error("quiz lookup failed: {0}")]
    Lookup(String),

    /// The room actor is gone (the room was deleted concurrently).
    #[error("room {0} is unavailable")]
    Unavailable(InviteCode),
}

impl RoomError {
    /// The error reply for this refusal.
    pub fn reply(&self) -> Reply {
        match self {
            Self::NotInGame | Self::Unavailable(_) => Reply::error(ReplyKind::NotInGame),
            Self::AlreadyInGame => Reply::error(ReplyKind::AlreadyInGame),
            Self::GameNotFound => Reply::error(ReplyKind::GameNotFound),
            Self::NotOwner => Reply::error(ReplyKind::NotOwner),
            Self::RoomStatus(status) => Reply::error((*status).into()),
            Self::RoundStatus(status) => Reply::error((*status).into()),
            Self::InvalidOption { .. } | Self::Lookup(_) => {
                Reply::error_detail(ReplyKind::DataError, self.to_string())
            }
        }
    }
}
