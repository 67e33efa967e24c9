//! Connection identity for Quizroom.
//!
//! This crate answers two questions for the layers above it:
//!
//! 1. **Who is this?** The [`Authenticator`] trait turns a connection's
//!    token into a [`Profile`](quizroom_protocol::Profile).
//! 2. **Who is connected?** The [`ConnectionRegistry`] maps each user to a
//!    [`Participant`]: their profile plus the channel replies reach them on.
//!
//! ```text
//! Room Layer (above)    ← sends replies through Participant handles
//!     ↕
//! Session Layer (this)  ← identity + one live connection per user
//!     ↕
//! Protocol Layer        ← Profile, UserId, Reply
//! ```

mod auth;
mod error;
mod participant;
mod registry;

pub use auth::Authenticator;
pub use error::SessionError;
pub use participant::{Participant, ReplySender};
pub use registry::ConnectionRegistry;
