//! Error types module
//!
//! Every failure the client can observe is normalized into [`ClientError`]
//! before it reaches a caller: transport failures, backend status codes, and
//! local validation. UI layers only ever see `kind()` plus `user_message()`,
//! never a raw transport error or an unformatted backend payload.

use serde::{Deserialize, Serialize};

/// Machine-readable classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response received at all.
    Network,
    /// HTTP 401. Routed through the session store's logout path.
    Unauthorized,
    /// HTTP 422, or a local precondition failure (missing slot, bad input).
    Validation,
    /// HTTP 415.
    UnsupportedMedia,
    /// HTTP 413.
    PayloadTooLarge,
    /// HTTP 5xx. Retryable.
    Server,
    /// Response arrived but could not be parsed.
    Decode,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Classify an unsuccessful HTTP status, folding in the backend's
    /// `detail` field when one was supplied.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let detail = detail.filter(|d| !d.trim().is_empty());
        match status {
            401 => ClientError::Unauthorized(
                detail.unwrap_or_else(|| "Session expired or invalid".to_string()),
            ),
            413 => ClientError::PayloadTooLarge(
                detail.unwrap_or_else(|| "File exceeds the size limit".to_string()),
            ),
            415 => ClientError::UnsupportedMedia(
                detail.unwrap_or_else(|| "Unsupported file type".to_string()),
            ),
            422 => ClientError::Validation(
                detail.unwrap_or_else(|| "Request was rejected by the server".to_string()),
            ),
            // Remaining 4xx (400, 403, 404, ...): the request itself is
            // wrong, so retrying it unchanged cannot succeed.
            400..=499 => ClientError::Validation(
                detail.unwrap_or_else(|| format!("Request rejected with status {}", status)),
            ),
            500..=599 => ClientError::Server(
                detail.unwrap_or_else(|| "Server error, please try again".to_string()),
            ),
            other => ClientError::Server(
                detail.unwrap_or_else(|| format!("Unexpected response status {}", other)),
            ),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Unauthorized(_) => ErrorKind::Unauthorized,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::UnsupportedMedia(_) => ErrorKind::UnsupportedMedia,
            ClientError::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            ClientError::Server(_) => ErrorKind::Server,
            ClientError::Decode(_) => ErrorKind::Decode,
        }
    }

    /// Whether retrying the same operation can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Network | ErrorKind::Server | ErrorKind::Decode
        )
    }

    /// Single displayable string for UI surfaces. Fixed messages for the
    /// size/type rejections; the classified detail otherwise.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => "Could not reach the server. Check your connection.".into(),
            ClientError::Unauthorized(_) => "Your session has expired. Please log in again.".into(),
            ClientError::UnsupportedMedia(_) => "Unsupported file type.".into(),
            ClientError::PayloadTooLarge(_) => "File exceeds the size limit.".into(),
            ClientError::Server(_) => "Server error saving files. Please try again.".into(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Decode(_) => "Received an unexpected response from the server.".into(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_unauthorized() {
        let err = ClientError::from_status(401, None);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(!err.is_retryable());
        assert_eq!(
            err.user_message(),
            "Your session has expired. Please log in again."
        );
    }

    #[test]
    fn test_from_status_fixed_messages() {
        let err = ClientError::from_status(415, Some("Unsupported video type: text/plain".into()));
        assert_eq!(err.kind(), ErrorKind::UnsupportedMedia);
        // User-facing message stays fixed regardless of backend detail
        assert_eq!(err.user_message(), "Unsupported file type.");

        let err = ClientError::from_status(413, None);
        assert_eq!(err.kind(), ErrorKind::PayloadTooLarge);
        assert_eq!(err.user_message(), "File exceeds the size limit.");
    }

    #[test]
    fn test_from_status_validation_keeps_detail() {
        let err = ClientError::from_status(422, Some("`project_id` is required".into()));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "`project_id` is required");
    }

    #[test]
    fn test_from_status_other_4xx_not_retryable() {
        for status in [400u16, 403, 404] {
            let err = ClientError::from_status(status, None);
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert!(!err.is_retryable());
        }
        let err = ClientError::from_status(404, Some("No such project".into()));
        assert_eq!(err.user_message(), "No such project");
    }

    #[test]
    fn test_from_status_server_range() {
        for status in [500u16, 502, 503] {
            let err = ClientError::from_status(status, None);
            assert_eq!(err.kind(), ErrorKind::Server);
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_blank_detail_falls_back() {
        let err = ClientError::from_status(422, Some("   ".into()));
        assert_eq!(err.user_message(), "Request was rejected by the server");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::UnsupportedMedia).unwrap();
        assert_eq!(json, "\"unsupported_media\"");
    }
}
