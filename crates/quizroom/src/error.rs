//! Unified error type for the Quizroom engine.

use quizroom_protocol::ProtocolError;
use quizroom_room::RoomError;
use quizroom_session::SessionError;
use quizroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum QuizroomError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, bad data).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, duplicate connection).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level refusal.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use quizroom_protocol::{RoomStatus, UserId};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let quizroom_err: QuizroomError = err.into();
        assert!(matches!(quizroom_err, QuizroomError::Transport(_)));
        assert!(quizroom_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidData("bad".into());
        let quizroom_err: QuizroomError = err.into();
        assert!(matches!(quizroom_err, QuizroomError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AlreadyConnected(UserId(3));
        let quizroom_err: QuizroomError = err.into();
        assert!(matches!(quizroom_err, QuizroomError::Session(_)));
    }

    #[test]
    fn test_from_room_error_keeps_message() {
        let err = RoomError::RoomStatus(RoomStatus::Finished);
        let quizroom_err: QuizroomError = err.clone().into();
        assert!(matches!(quizroom_err, QuizroomError::Room(_)));
        assert_eq!(quizroom_err.to_string(), err.to_string());
    }
}
