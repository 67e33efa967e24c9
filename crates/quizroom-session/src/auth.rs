//! Authentication hook for validating user identity.
//!
//! Quizroom doesn't verify tokens itself. The embedding application
//! implements [`Authenticator`] (JWT validation, a call to an auth API, a
//! fixed table in tests) and the server calls it once per connection,
//! before any message is processed.

use quizroom_protocol::Profile;

use crate::SessionError;

/// Validates a connection's token and returns the user's profile.
///
/// `Send + Sync + 'static` because one authenticator is shared by every
/// connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use quizroom_protocol::{Profile, UserId};
/// use quizroom_session::{Authenticator, SessionError};
///
/// /// Accepts tokens of the form `"<id>:<name>"`. Development only.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<Profile, SessionError> {
///         let (id, name) = token
///             .split_once(':')
///             .ok_or_else(|| SessionError::AuthFailed("expected id:name".into()))?;
///         let id: u64 = id
///             .parse()
///             .map_err(|_| SessionError::AuthFailed("id must be a number".into()))?;
///         Ok(Profile {
///             id: UserId(id),
///             name: name.to_string(),
///             avatar: String::new(),
///         })
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `token` and returns who it belongs to.
    ///
    /// # Returns
    /// - `Ok(Profile)`: the connection is now this user
    /// - `Err(SessionError::AuthFailed)`: the token is invalid or expired
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Profile, SessionError>> + Send;
}
