//! Shared HTTP client for the Crosspost API.
//!
//! Provides the single gateway every component issues requests through: it
//! attaches the current session credential to each outgoing request,
//! normalizes every failure into a `ClientError`, and routes authorization
//! failures through the session store exactly once. On top of the gateway sit
//! the upload session manager, the job status poller, and the history feed.

pub mod api;
pub mod auth;
pub mod history;
pub mod poller;
pub mod upload;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::warn;

use crosspost_core::{ClientConfig, ClientError, ErrorKind};

/// HTTP client for the Crosspost API. Cheap to clone; all clones share the
/// same session store.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            session: SessionStore::new(config.token),
        })
    }

    /// Create a client from the environment: CROSSPOST_API_URL (or API_URL),
    /// optional CROSSPOST_TOKEN.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The shared credential store. Mutations go through its methods only;
    /// the gateway itself never pokes at session state directly.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);
        request = self.apply_auth(request);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(transport_error)?;
        self.handle_response(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let request = self.client.post(&url).json(body);
        let request = self.apply_auth(request);

        let response = request.send().await.map_err(transport_error)?;
        self.handle_response(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let request = self.client.post(&url).multipart(form);
        let request = self.apply_auth(request);

        let response = request.send().await.map_err(transport_error)?;
        self.handle_response(response).await
    }

    /// Classify an unsuccessful response and decode a successful one.
    /// Authorization failures are routed through the session store here, so
    /// no caller ever has to handle a 401 itself.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(transport_error);
        }

        let detail = response.text().await.ok().and_then(|body| extract_detail(&body));
        let err = ClientError::from_status(status.as_u16(), detail);
        if err.kind() == ErrorKind::Unauthorized && self.session.handle_unauthorized() {
            warn!("request returned 401, session cleared");
        }
        Err(err)
    }

    /// Raw client for custom requests. Caller must apply auth via build_url
    /// and headers.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Map a transport-level failure. No response was received (or it could not
/// be decoded); the raw reqwest error never leaves this crate.
pub(crate) fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_decode() {
        ClientError::Decode(err.to_string())
    } else {
        ClientError::Network(err.to_string())
    }
}

/// Pull the `detail` field out of an error body, tolerating the structured
/// field-level arrays the backend emits for 422s. Non-JSON bodies yield
/// `None` and the fixed per-status message is used instead.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// Re-export the component types for convenience.
pub use auth::SessionStore;
pub use history::{HistoryFeed, HistoryState};
pub use poller::{PollState, StatusPoller};
pub use upload::{UploadPhase, UploadSession};

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_core::models::StatusResponse;

    fn test_client(base_url: &str) -> ApiClient {
        ApiClient::new(ClientConfig::new(base_url)).unwrap()
    }

    #[test]
    fn extract_detail_string() {
        assert_eq!(
            extract_detail(r#"{"detail": "Unsupported video type"}"#),
            Some("Unsupported video type".to_string())
        );
    }

    #[test]
    fn extract_detail_structured() {
        let detail =
            extract_detail(r#"{"detail": [{"loc": ["body", "video"], "msg": "field required"}]}"#)
                .unwrap();
        assert!(detail.contains("field required"));
    }

    #[test]
    fn extract_detail_non_json() {
        assert_eq!(extract_detail("<html>502 Bad Gateway</html>"), None);
        assert_eq!(extract_detail(r#"{"message": "no detail key"}"#), None);
    }

    #[tokio::test]
    async fn get_attaches_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/get-status")
            .match_header("authorization", "Bearer tok-1")
            .match_query(mockito::Matcher::UrlEncoded("job_id".into(), "p1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "processing"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(ClientConfig::new(server.url()).with_token("tok-1")).unwrap();
        let resp: StatusResponse = client
            .get("/get-status", &[("job_id", "p1".to_string())])
            .await
            .unwrap();
        assert_eq!(resp.status.to_string(), "processing");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_normalized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/upload_history")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .get::<serde_json::Value>("/upload_history", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Server);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn network_error_is_normalized() {
        // Nothing is listening on this port
        let client = test_client("http://127.0.0.1:9");
        let err = client
            .get::<serde_json::Value>("/upload_history", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
