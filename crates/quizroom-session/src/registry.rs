//! The connection registry: who is connected right now.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is a plain `HashMap` and is not thread-safe by
//! itself. The session engine keeps it behind a mutex and never holds
//! that lock across an await on anything but the registry.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use quizroom_protocol::{Profile, UserId};

use crate::{Participant, ReplySender, SessionError};

/// Tracks the single live connection of every authenticated user.
///
/// ```text
/// authenticate() ──→ register() ──→ ... ──→ unregister()
///                        │                       │
///                        ▼                       ▼
///                  [registered]            [gone; user may
///                                           connect again]
/// ```
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    participants: HashMap<UserId, Participant>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly authenticated connection.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyConnected`] if the user already has a
    /// live connection. The existing connection is left untouched.
    pub fn register(
        &mut self,
        profile: Profile,
        sender: ReplySender,
    ) -> Result<&Participant, SessionError> {
        let user = profile.id;
        match self.participants.entry(user) {
            Entry::Occupied(_) => Err(SessionError::AlreadyConnected(user)),
            Entry::Vacant(slot) => {
                tracing::info!(%user, name = %profile.name, "connection registered");
                Ok(slot.insert(Participant::new(profile, sender)))
            }
        }
    }

    /// Removes a user's connection.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the user isn't registered.
    pub fn unregister(&mut self, user: UserId) -> Result<Participant, SessionError> {
        let participant = self
            .participants
            .remove(&user)
            .ok_or(SessionError::NotFound(user))?;
        tracing::info!(%user, "connection unregistered");
        Ok(participant)
    }

    pub fn get(&self, user: UserId) -> Option<&Participant> {
        self.participants.get(&user)
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.participants.contains_key(&user)
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
