//! A connected user as the rest of the server sees them.

use quizroom_protocol::{Profile, Reply, UserId};
use tokio::sync::mpsc;

/// The sending half of a connection's outbound queue.
///
/// Unbounded so a room actor never waits on a slow socket. Each connection
/// has exactly one, which keeps replies to one user in the order they were
/// produced.
pub type ReplySender = mpsc::UnboundedSender<Reply>;

/// A user's profile plus the channel that reaches their connection.
///
/// Cheap to clone; rooms keep a copy per member.
#[derive(Debug, Clone)]
pub struct Participant {
    pub profile: Profile,
    sender: ReplySender,
}

impl Participant {
    pub fn new(profile: Profile, sender: ReplySender) -> Self {
        Self { profile, sender }
    }

    pub fn id(&self) -> UserId {
        self.profile.id
    }

    /// Queues a reply for this user.
    ///
    /// Returns `false` if the connection is already gone. Callers treat
    /// that as "nothing to do": the disconnect path cleans up membership.
    pub fn send(&self, reply: Reply) -> bool {
        self.sender.send(reply).is_ok()
    }

    /// Whether the connection's receiving side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
