use serde::{Deserialize, Serialize};

use super::user::User;

/// Authentication status of the current session.
///
/// Allowed transitions: `Loading -> Authenticated`,
/// `Loading -> Unauthenticated`, `Authenticated -> Unauthenticated` (logout
/// or auth failure). There is no way back from `Unauthenticated` to
/// `Loading`; a fresh login goes straight to `Authenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Client-side record of whether a user is authenticated and with what
/// credential. Invariant: `Authenticated` implies a non-empty token.
#[derive(Debug, Clone)]
pub struct Session {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub token: Option<String>,
}

impl Session {
    /// Initial state before the mount-time who-am-i check resolves.
    pub fn loading() -> Self {
        Session {
            status: AuthStatus::Loading,
            user: None,
            token: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Session {
            status: AuthStatus::Unauthenticated,
            user: None,
            token: None,
        }
    }

    pub fn authenticated(user: User, token: String) -> Self {
        debug_assert!(!token.is_empty());
        Session {
            status: AuthStatus::Authenticated,
            user: Some(user),
            token: Some(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }
}
