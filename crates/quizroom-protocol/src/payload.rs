//! Payloads carried in the `data` field of outbound replies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    InviteCode, Leaderboard, Profile, Question, QuestionView, QuizOption,
    RoomStatus, RoundStatus, UserId,
};

/// The state of a room as sent with `JOINED_GAME`, `GET_GAME` and
/// `RESET_GAME`.
///
/// Maps are ordered so two snapshots of an unchanged room encode to the
/// same bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: u64,
    pub status: RoomStatus,
    pub round_status: RoundStatus,
    pub current_round: usize,
    pub points: f64,
    pub topic: String,
    pub round_time: u32,
    pub question_count: usize,
    pub invite_code: InviteCode,
    pub members: BTreeMap<UserId, Profile>,
    pub owner: Profile,
    pub leaderboard: Leaderboard,
    /// Only present in the owner's snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,
}

/// `ROUND_IN_PROGRESS` tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTick {
    pub timer: u32,
    pub question: QuestionView,
}

/// `ROUND_FINISHED`, shaped per member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub correct: bool,
    pub options: Vec<QuizOption>,
    pub leaderboard: Leaderboard,
}

/// `ANSWER_ACCEPTED` and `GAME_FINISHED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardUpdate {
    pub leaderboard: Leaderboard,
}

/// `USER_ANSWERED`, sent to the owner only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswered {
    pub user: UserId,
    pub option: usize,
}

/// `RECEIVE_CHAT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatBroadcast {
    pub name: String,
    pub user_id: UserId,
    pub message: String,
}
