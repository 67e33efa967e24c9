//! Inbound envelopes and outbound replies.
//!
//! Every frame is a JSON object. Clients send
//! `{"message": KIND, "data": ...}`; the server answers with
//! `{"error": bool, "message": KIND, "data": ...}`.
//!
//! Decoding happens in two steps so the two failure modes stay distinct:
//! the frame is first parsed into an [`Envelope`] (failure: `MESSAGE_ERROR`),
//! then the envelope is turned into a typed [`ClientMessage`] by parsing
//! `data` for that kind (failure: `DATA_ERROR`).

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{InviteCode, ProtocolError, RoomStatus, RoundStatus};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// The kind tag of an inbound message.
///
/// An unknown tag fails envelope decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    JoinGame,
    LeaveGame,
    GetGame,
    IsOwner,
    StartGame,
    ResetGame,
    AnswerQuestion,
    NextRound,
    SendChat,
    Ping,
}

/// A raw inbound frame: the kind plus still-undecoded data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub message: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `JOIN_GAME` data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGameData {
    #[serde(rename = "gameId", alias = "game_id")]
    pub game_id: InviteCode,
}

/// `ANSWER_QUESTION` data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerData {
    pub option: usize,
}

/// `SEND_CHAT` data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatData {
    pub message: String,
}

/// A fully decoded client request. One variant per inbound kind, so the
/// dispatcher can `match` exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    JoinGame { invite_code: InviteCode },
    LeaveGame,
    GetGame,
    IsOwner,
    StartGame,
    ResetGame,
    AnswerQuestion { option: usize },
    NextRound,
    SendChat { message: String },
    Ping,
}

impl TryFrom<Envelope> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        let data = envelope.data;
        Ok(match envelope.message {
            MessageKind::JoinGame => {
                let JoinGameData { game_id } = parse_data(data)?;
                Self::JoinGame {
                    invite_code: game_id,
                }
            }
            MessageKind::LeaveGame => Self::LeaveGame,
            MessageKind::GetGame => Self::GetGame,
            MessageKind::IsOwner => Self::IsOwner,
            MessageKind::StartGame => Self::StartGame,
            MessageKind::ResetGame => Self::ResetGame,
            MessageKind::AnswerQuestion => {
                let AnswerData { option } = parse_data(data)?;
                Self::AnswerQuestion { option }
            }
            MessageKind::NextRound => Self::NextRound,
            MessageKind::SendChat => {
                let ChatData { message } = parse_data(data)?;
                Self::SendChat { message }
            }
            MessageKind::Ping => Self::Ping,
        })
    }
}

fn parse_data<T: DeserializeOwned>(data: Option<Value>) -> Result<T, ProtocolError> {
    serde_json::from_value(data.unwrap_or(Value::Null))
        .map_err(|e| ProtocolError::InvalidData(e.to_string()))
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Every value the `message` field of a reply can take.
///
/// Includes the room and round status names, because state-conflict
/// errors reply with the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyKind {
    // -- membership --
    JoinedGame,
    UserJoined,
    LeftGame,
    UserLeft,
    GameDeleted,

    // -- queries --
    GetGame,
    IsOwner,

    // -- room status --
    GameStandby,
    GameStarting,
    GameInProgress,
    GameFinished,
    ResetGame,

    // -- round status --
    RoundWaiting,
    RoundInProgress,
    RoundFinished,
    AnswerAccepted,
    UserAnswered,

    // -- chat / heartbeat --
    ReceiveChat,
    Pong,

    // -- errors --
    GameNotFound,
    AlreadyInGame,
    NotInGame,
    NotOwner,
    AlreadyConnected,
    MessageError,
    DataError,
    InitError,
}

impl From<RoomStatus> for ReplyKind {
    fn from(status: RoomStatus) -> Self {
        match status {
            RoomStatus::Standby => Self::GameStandby,
            RoomStatus::Starting => Self::GameStarting,
            RoomStatus::InProgress => Self::GameInProgress,
            RoomStatus::Finished => Self::GameFinished,
        }
    }
}

impl From<RoundStatus> for ReplyKind {
    fn from(status: RoundStatus) -> Self {
        match status {
            RoundStatus::Waiting => Self::RoundWaiting,
            RoundStatus::InProgress => Self::RoundInProgress,
            RoundStatus::Finished => Self::RoundFinished,
        }
    }
}

/// One outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub error: bool,
    pub message: ReplyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Reply {
    /// A successful reply without data.
    pub fn message(kind: ReplyKind) -> Self {
        Self {
            error: false,
            message: kind,
            data: None,
        }
    }

    /// A successful reply carrying `data`.
    ///
    /// Payload types in this crate always serialize; a value that doesn't
    /// is sent without data rather than dropped.
    pub fn data<T: Serialize>(kind: ReplyKind, data: &T) -> Self {
        Self {
            error: false,
            message: kind,
            data: serde_json::to_value(data).ok(),
        }
    }

    /// An error reply without data.
    pub fn error(kind: ReplyKind) -> Self {
        Self {
            error: true,
            message: kind,
            data: None,
        }
    }

    /// An error reply with a human-readable detail in `data`.
    pub fn error_detail(kind: ReplyKind, detail: impl Into<String>) -> Self {
        Self {
            error: true,
            message: kind,
            data: Some(Value::String(detail.into())),
        }
    }

    /// Deserializes `data` into a payload type. Handy on the client side
    /// and in tests.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        parse_data(self.data.clone())
    }
}
