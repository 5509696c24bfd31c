//! Upload history feed.
//!
//! Fetches the caller's upload records, groups them into projects (newest
//! first) and exposes the result as an observable state. Concurrent refresh
//! requests coalesce: while a fetch is in flight, further calls are no-ops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use crosspost_core::models::{group_by_project, ProjectHistory, UploadRecord};

use crate::ApiClient;

/// Observable feed state. `Loading` only ever appears before the first fetch
/// completes; while a later refresh is in flight the previous state stays
/// visible, and whatever the refresh resolves to (data, empty, or an error)
/// replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryState {
    Loading,
    Empty,
    Error { message: String },
    Populated { projects: Vec<ProjectHistory> },
}

pub struct HistoryFeed {
    client: ApiClient,
    state_tx: watch::Sender<HistoryState>,
    in_flight: AtomicBool,
    last_updated: Mutex<Option<DateTime<Utc>>>,
}

impl HistoryFeed {
    pub fn new(client: ApiClient) -> Self {
        let (state_tx, _) = watch::channel(HistoryState::Loading);
        HistoryFeed {
            client,
            state_tx,
            in_flight: AtomicBool::new(false),
            last_updated: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> HistoryState {
        self.state_tx.borrow().clone()
    }

    /// When the feed last completed a successful fetch.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        *self.last_updated.lock().expect("history feed lock poisoned")
    }

    /// Fetch the history and publish the grouped result. Returns false when a
    /// refresh was already in flight and this call did nothing.
    pub async fn refresh(&self) -> bool {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("history refresh already in flight, coalescing");
            return false;
        }

        let result = self.client.upload_history().await;
        match result {
            Ok(records) => {
                self.publish_records(records);
                *self.last_updated.lock().expect("history feed lock poisoned") = Some(Utc::now());
            }
            Err(err) => {
                self.state_tx.send_replace(HistoryState::Error {
                    message: err.user_message(),
                });
            }
        }

        self.in_flight.store(false, Ordering::Release);
        true
    }

    fn publish_records(&self, records: Vec<UploadRecord>) {
        let state = if records.is_empty() {
            HistoryState::Empty
        } else {
            HistoryState::Populated {
                projects: group_by_project(records),
            }
        };
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_core::ClientConfig;
    use std::sync::Arc;

    fn feed_for(server: &mockito::Server) -> HistoryFeed {
        let client = ApiClient::new(ClientConfig::new(server.url()).with_token("tok")).unwrap();
        HistoryFeed::new(client)
    }

    fn record_json(project: &str, filename: &str, at: &str) -> String {
        format!(
            r#"{{"project_id": "{project}", "filename": "{filename}", "url": "https://cdn.example/{filename}", "content_type": "video/mp4", "uploader_id": "ana", "uploaded_at": "{at}"}}"#
        )
    }

    #[tokio::test]
    async fn empty_history_yields_empty_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/upload_history")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let feed = feed_for(&server);
        assert_eq!(feed.state(), HistoryState::Loading);
        assert!(feed.refresh().await);
        assert_eq!(feed.state(), HistoryState::Empty);
        assert!(feed.last_updated().is_some());
    }

    #[tokio::test]
    async fn records_are_grouped_by_project_newest_first() {
        let mut server = mockito::Server::new_async().await;
        let body = format!(
            "[{},{},{}]",
            record_json("p-old", "a.mp4", "2026-08-01T10:00:00Z"),
            record_json("p-new", "b.mp4", "2026-08-20T10:00:00Z"),
            record_json("p-old", "a.mp3", "2026-08-01T10:05:00Z"),
        );
        server
            .mock("GET", "/upload_history")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let feed = feed_for(&server);
        feed.refresh().await;
        match feed.state() {
            HistoryState::Populated { projects } => {
                assert_eq!(projects.len(), 2);
                assert_eq!(projects[0].project_id, "p-new");
                assert_eq!(projects[1].project_id, "p-old");
                assert_eq!(projects[1].files.len(), 2);
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_error_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/upload_history")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let feed = feed_for(&server);
        feed.refresh().await;
        match feed.state() {
            HistoryState::Error { message } => assert!(!message.is_empty()),
            other => panic!("unexpected state: {:?}", other),
        }
        assert!(feed.last_updated().is_none());
    }

    #[tokio::test]
    async fn error_then_success_recovers() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/upload_history")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let feed = feed_for(&server);
        feed.refresh().await;
        assert!(matches!(feed.state(), HistoryState::Error { .. }));

        failing.remove_async().await;
        server
            .mock("GET", "/upload_history")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        feed.refresh().await;
        assert_eq!(feed.state(), HistoryState::Empty);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_refreshes_coalesce() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/upload_history")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let feed = Arc::new(feed_for(&server));
        let feed_bg = Arc::clone(&feed);
        let first = tokio::spawn(async move { feed_bg.refresh().await });
        // Let the spawned refresh claim the in-flight flag before racing it.
        tokio::task::yield_now().await;
        let second = feed.refresh().await;

        assert!(first.await.unwrap());
        assert!(!second);
        mock.assert_async().await;
    }
}
