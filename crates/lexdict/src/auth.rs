//! Authentication state consumed by the controller
//!
//! Sign-in itself happens elsewhere; this crate only receives the outcome.

use std::fmt;

/// An authenticated principal and the token scoping remote requests
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Principal id used to scope remote rows
    pub user_id: String,
    /// Bearer token for the remote store
    pub access_token: String,
}

impl Session {
    /// Create a session
    pub fn new(user_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Which durable store is authoritative
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No session: the local store is authoritative
    #[default]
    Anonymous,
    /// Signed in: the remote store is authoritative
    Authenticated(Session),
}

impl AuthState {
    /// Whether a session is active
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    /// Active session, if any
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            AuthState::Anonymous => None,
        }
    }
}

impl From<Option<Session>> for AuthState {
    fn from(session: Option<Session>) -> Self {
        session.map_or(AuthState::Anonymous, AuthState::Authenticated)
    }
}
