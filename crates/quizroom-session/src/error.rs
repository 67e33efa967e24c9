//! Error types for the session layer.

use quizroom_protocol::UserId;

/// Errors that can occur while establishing or tearing down a connection.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The [`Authenticator`](crate::Authenticator) rejected the token, or
    /// no token was supplied.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No connection is registered for the user.
    #[error("no connection registered for user {0}")]
    NotFound(UserId),

    /// The user already has a live connection. One per user.
    #[error("user {0} is already connected")]
    AlreadyConnected(UserId),
}
