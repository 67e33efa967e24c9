//! Identity and status types shared by every layer.
//!
//! These are the small values that show up inside almost every message:
//! who a user is, which room they are talking about, and where that room
//! is in its lifecycle.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The authenticated id of a user.
///
/// A newtype over `u64` so it can't be mixed up with option indices or
/// round numbers. `#[serde(transparent)]` keeps it a plain number on the
/// wire, and `Ord` lets it key the `BTreeMap`s used in snapshots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// The invite code of a quiz. Rooms are keyed by it.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct InviteCode(pub String);

impl InviteCode {
    /// Creates an invite code from anything string-like.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The public profile of a user, as other members see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    #[serde(rename = "profile_picture", default)]
    pub avatar: String,
}

/// Cumulative points per user for the current room instance.
pub type Leaderboard = BTreeMap<UserId, f64>;

// ---------------------------------------------------------------------------
// Room lifecycle
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Standby → Starting → InProgress → Finished
///    ↑                                  │
///    └──────────── reset ───────────────┘
/// ```
///
/// The wire names double as reply codes: a command that is not allowed in
/// the current state is answered with the state itself as the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    #[serde(rename = "GAME_STANDBY")]
    Standby,
    #[serde(rename = "GAME_STARTING")]
    Starting,
    #[serde(rename = "GAME_IN_PROGRESS")]
    InProgress,
    #[serde(rename = "GAME_FINISHED")]
    Finished,
}

impl RoomStatus {
    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Standby, Self::Starting)
                | (Self::Starting, Self::InProgress)
                | (Self::InProgress, Self::Finished)
                | (Self::Finished, Self::Standby)
        )
    }

    /// The wire name, e.g. `GAME_IN_PROGRESS`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standby => "GAME_STANDBY",
            Self::Starting => "GAME_STARTING",
            Self::InProgress => "GAME_IN_PROGRESS",
            Self::Finished => "GAME_FINISHED",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle of the current question inside an in-progress room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    #[serde(rename = "ROUND_WAITING")]
    Waiting,
    #[serde(rename = "ROUND_IN_PROGRESS")]
    InProgress,
    #[serde(rename = "ROUND_FINISHED")]
    Finished,
}

impl RoundStatus {
    /// The wire name, e.g. `ROUND_WAITING`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "ROUND_WAITING",
            Self::InProgress => "ROUND_IN_PROGRESS",
            Self::Finished => "ROUND_FINISHED",
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
