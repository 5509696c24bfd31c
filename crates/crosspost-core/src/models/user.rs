use serde::{Deserialize, Serialize};

/// Basic user identity as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Token response from `/auth/login` and `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Response from `/auth/me`. The backend may piggyback a refreshed
/// credential; when present the client installs it without the caller
/// having to ask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl From<&MeResponse> for User {
    fn from(me: &MeResponse) -> Self {
        User {
            id: me.id,
            username: me.username.clone(),
        }
    }
}
