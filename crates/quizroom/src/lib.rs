//! # Quizroom
//!
//! Real-time multiplayer quiz sessions over WebSocket.
//!
//! An owner opens a room for one of their quizzes, players join with the
//! quiz's invite code, and the server drives the game: a start countdown,
//! timed rounds, answer collection, scoring and a final leaderboard. The
//! embedding application supplies three collaborators:
//!
//! - an [`Authenticator`] that turns a connection token into a profile
//! - a [`QuizStore`] that looks quizzes up by invite code
//! - a [`SessionRecorder`] that persists session start/end records
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quizroom::prelude::*;
//!
//! let server = QuizroomServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(MyAuth, MyQuizzes, Arc::new(MyRecorder))
//!     .await?;
//! server.run().await
//! ```

mod engine;
mod error;
mod handler;
mod server;

pub use engine::SessionEngine;
pub use error::QuizroomError;
pub use server::{QuizroomServer, QuizroomServerBuilder};

pub use quizroom_protocol as protocol;
pub use quizroom_room::{
    EngineConfig, LeaveOutcome, QuizStore, RoomError, RoomHandle, RoomInfo, SessionEnd,
    SessionRecorder, SessionStart,
};
pub use quizroom_session::{Authenticator, Participant, ReplySender, SessionError};

/// Everything needed to embed a quiz server.
pub mod prelude {
    pub use crate::{
        Authenticator, EngineConfig, Participant, QuizStore, QuizroomError, QuizroomServer,
        QuizroomServerBuilder, RoomError, SessionEnd, SessionEngine, SessionError,
        SessionRecorder, SessionStart,
    };
    pub use quizroom_protocol::{
        ClientMessage, Envelope, InviteCode, MessageKind, Profile, Question, Quiz, QuizOption,
        Reply, ReplyKind, RoomStatus, RoundStatus, UserId,
    };
}
