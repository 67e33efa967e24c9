//! Wire protocol for Quizroom.
//!
//! This crate defines the "language" that quiz clients and the server speak:
//!
//! - **Types** ([`UserId`], [`InviteCode`], [`RoomStatus`], ...): the small
//!   values every message refers to.
//! - **Quiz** ([`Quiz`], [`QuestionView`]): the quiz aggregate and the
//!   owner/member views of a question.
//! - **Messages** ([`Envelope`], [`ClientMessage`], [`Reply`]): inbound and
//!   outbound frames, plus the payloads in [`payload`].
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): frames to/from text.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (text frames) → Protocol (Envelope / Reply) → Session engine
//! ```

mod codec;
mod error;
mod message;
pub mod payload;
mod quiz;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use message::{
    AnswerData, ChatData, ClientMessage, Envelope, JoinGameData, MessageKind,
    Reply, ReplyKind,
};
pub use quiz::{
    Question, QuestionView, Quiz, QuizOption, RedactedOption, RedactedQuestion,
};
pub use types::{InviteCode, Leaderboard, Profile, RoomStatus, RoundStatus, UserId};
