//! Rooms for Quizroom.
//!
//! Each live room runs as an isolated Tokio task (actor model) that owns
//! the room's members, leaderboard, round ledger and countdown timers.
//! Everything that changes a room, including timer ticks, goes through
//! that one task.
//!
//! # Key types
//!
//! - [`RoomManager`]: the room registry, keyed by invite code, plus the
//!   user → room index
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`QuizStore`] / [`SessionRecorder`]: the external collaborators
//! - [`EngineConfig`]: start delay, tick period, channel sizing
//! - [`RoomError`]: every way a room operation can be refused

mod collab;
mod config;
mod error;
mod manager;
mod room;
mod scoring;

pub use collab::{QuizStore, SessionEnd, SessionRecorder, SessionStart};
pub use config::EngineConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{LeaveOutcome, RoomHandle, RoomInfo};
