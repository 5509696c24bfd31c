//! Session store and authentication flows.
//!
//! The store is the single source of truth for whether the current user is
//! authenticated. All mutations go through the methods here; request helpers
//! only ever read a snapshot. Lock guards never live across an await, so a
//! credential refresh is atomic relative to concurrent reads.
//!
//! 401 policy: an authorization failure anywhere clears the session exactly
//! once and is never silently retried. `refresh()` exists for proactive use
//! (the backend piggybacks a fresh token on `/auth/me`), not as a 401
//! recovery path.

use std::sync::{Arc, RwLock};

use serde_json::json;
use tracing::{debug, info};

use crosspost_core::models::{AuthStatus, MeResponse, Session, TokenResponse, User};
use crosspost_core::ClientError;

use crate::ApiClient;

/// Shared handle to the current session. Clones observe the same state.
#[derive(Clone, Debug)]
pub struct SessionStore {
    inner: Arc<RwLock<Session>>,
}

impl SessionStore {
    /// A store starts in `Loading` until `bootstrap` resolves it. A carried
    /// over token (from the environment) is attached but not trusted until
    /// the who-am-i check confirms it.
    pub fn new(token: Option<String>) -> Self {
        let mut session = Session::loading();
        session.token = token.filter(|t| !t.is_empty());
        SessionStore {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Read-only snapshot of the session.
    pub fn current(&self) -> Session {
        self.inner.read().expect("session lock poisoned").clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.inner.read().expect("session lock poisoned").status
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().expect("session lock poisoned").is_authenticated()
    }

    /// Credential snapshot attached to outgoing requests.
    pub fn token(&self) -> Option<String> {
        self.inner.read().expect("session lock poisoned").token.clone()
    }

    /// Install a confirmed identity and credential.
    pub(crate) fn install(&self, user: User, token: String) {
        let mut session = self.inner.write().expect("session lock poisoned");
        *session = Session::authenticated(user, token);
    }

    /// Swap in a refreshed credential without touching identity or status.
    pub(crate) fn install_token(&self, token: String) {
        let mut session = self.inner.write().expect("session lock poisoned");
        session.token = Some(token);
    }

    /// Resolve the mount-time check without a credential:
    /// `Loading -> Unauthenticated`.
    pub(crate) fn resolve_unauthenticated(&self) {
        let mut session = self.inner.write().expect("session lock poisoned");
        if session.status == AuthStatus::Loading {
            *session = Session::unauthenticated();
        }
    }

    /// Clear the session unconditionally (logout path).
    pub(crate) fn clear(&self) {
        let mut session = self.inner.write().expect("session lock poisoned");
        *session = Session::unauthenticated();
    }

    /// Central 401 path. Transitions to `Unauthenticated` and reports whether
    /// this call performed the transition; under concurrent failures exactly
    /// one caller observes `true`, so the logout side effects run once.
    pub fn handle_unauthorized(&self) -> bool {
        let mut session = self.inner.write().expect("session lock poisoned");
        if session.status == AuthStatus::Unauthenticated {
            return false;
        }
        *session = Session::unauthenticated();
        true
    }
}

impl ApiClient {
    /// Authenticate and populate the session. On failure the server's error
    /// detail (or a generic fallback) is surfaced; the session is untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        self.authenticate("/auth/login", username, password).await
    }

    /// Register a new account. Same contract as `login`.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, ClientError> {
        self.authenticate("/auth/register", username, password).await
    }

    async fn authenticate(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let body = json!({ "username": username, "password": password });
        let token: TokenResponse = self
            .post_json(path, &body)
            .await
            .map_err(credentials_rejected)?;

        // Install the credential first so the profile fetch carries it.
        self.session().install_token(token.access_token.clone());
        let me: MeResponse = self.get("/auth/me", &[]).await?;

        let user = User::from(&me);
        let token = me.access_token.unwrap_or(token.access_token);
        self.session().install(user.clone(), token);
        info!(username = %user.username, "logged in");
        Ok(user)
    }

    /// Clear the session locally first, then tell the backend best-effort.
    /// A network failure during logout never blocks the local clear.
    pub async fn logout(&self) {
        self.session().clear();
        if let Err(err) = self
            .post_json::<serde_json::Value, _>("/auth/logout", &json!({}))
            .await
        {
            debug!(error = %err, "logout notification failed, session cleared locally");
        }
    }

    /// Mount-time who-am-i check: resolves `Loading` into `Authenticated`
    /// or `Unauthenticated`. Returns the user when the session is valid.
    pub async fn bootstrap(&self) -> Result<Option<User>, ClientError> {
        if self.session().token().is_none() {
            self.session().resolve_unauthenticated();
            return Ok(None);
        }

        match self.get::<MeResponse>("/auth/me", &[]).await {
            Ok(me) => {
                let user = User::from(&me);
                let token = match me.access_token.clone() {
                    Some(refreshed) => refreshed,
                    None => self.session().token().unwrap_or_default(),
                };
                self.session().install(user.clone(), token);
                Ok(Some(user))
            }
            // The 401 already cleared the session centrally.
            Err(ClientError::Unauthorized(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Proactive credential refresh via `/auth/me`. If the backend supplies
    /// a fresh token it is installed atomically; a 401 clears the session
    /// through the central path.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let me: MeResponse = self.get("/auth/me", &[]).await?;
        if let Some(token) = me.access_token {
            self.session().install_token(token);
            debug!("installed refreshed credential");
        }
        Ok(())
    }
}

/// A 401 from the login/register endpoints means bad credentials, not an
/// expired session; keep the server's message for the form.
fn credentials_rejected(err: ClientError) -> ClientError {
    match err {
        ClientError::Unauthorized(detail) => {
            let message = if detail.trim().is_empty() || detail == "Session expired or invalid" {
                "Invalid username or password.".to_string()
            } else {
                detail
            };
            ClientError::Validation(message)
        }
        other => other,
    }
}
