//! Job status poller.
//!
//! Once a submission yields a project identifier, the poller queries
//! `GET /get-status` on a fixed interval until the backend reports a
//! terminal state. Transport and server failures are transient; only an
//! explicit `failed` status ends the job unsuccessfully. Starting a new job
//! supersedes the old one: the previous task is aborted and any late result
//! from it is discarded by a generation check before being applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crosspost_core::{ErrorKind, JobStatus};

use crate::ApiClient;

/// Observable polling state. `Done` and `Stopped` are terminal for the
/// current job; no further sends follow either, so observers must not keep
/// waiting for a change after seeing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling {
        project_id: String,
        status: JobStatus,
    },
    Done {
        project_id: String,
        status: JobStatus,
    },
    /// Polling ended without a job outcome (session expired).
    Stopped {
        project_id: String,
        message: String,
    },
}

/// Polls one project at a time. Dropping the poller (or calling `stop`)
/// cancels the timer task, so no polls outlive their owner.
pub struct StatusPoller {
    client: ApiClient,
    interval: Duration,
    generation: Arc<AtomicU64>,
    state_tx: watch::Sender<PollState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StatusPoller {
    pub fn new(client: ApiClient, interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(PollState::Idle);
        StatusPoller {
            client,
            interval,
            generation: Arc::new(AtomicU64::new(0)),
            state_tx,
            task: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> PollState {
        self.state_tx.borrow().clone()
    }

    /// Begin polling `project_id`, superseding any job already being
    /// watched. The first poll fires immediately, then on the interval.
    pub fn start(&self, project_id: impl Into<String>) {
        let project_id = project_id.into();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.abort_task();

        self.state_tx.send_replace(PollState::Polling {
            project_id: project_id.clone(),
            status: JobStatus::Processing,
        });

        let client = self.client.clone();
        let interval = self.interval;
        let generations = Arc::clone(&self.generation);
        let state_tx = self.state_tx.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let result = client.job_status(&project_id).await;

                // A later start() may have superseded this job while the
                // request was in flight; a stale result must not be applied.
                if generations.load(Ordering::Acquire) != generation {
                    debug!(project_id = %project_id, "discarding stale poll result");
                    return;
                }

                match result {
                    Ok(status) if status.is_terminal() => {
                        state_tx.send_replace(PollState::Done {
                            project_id: project_id.clone(),
                            status,
                        });
                        return;
                    }
                    Ok(status) => {
                        state_tx.send_replace(PollState::Polling {
                            project_id: project_id.clone(),
                            status,
                        });
                    }
                    Err(err) if err.kind() == ErrorKind::Unauthorized => {
                        // Session already cleared centrally; polling an
                        // endpoint that will keep rejecting us is pointless.
                        warn!(project_id = %project_id, "status poll unauthorized, stopping");
                        state_tx.send_replace(PollState::Stopped {
                            project_id: project_id.clone(),
                            message: err.user_message(),
                        });
                        return;
                    }
                    Err(err) => {
                        // Transient: keep polling for the poller's lifetime.
                        debug!(project_id = %project_id, error = %err, "status poll failed");
                    }
                }
            }
        });

        *self.task.lock().expect("poller task lock poisoned") = Some(handle);
    }

    /// Stop polling. Idempotent.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.abort_task();
    }

    /// Wait until the current job reaches a terminal state and return it.
    pub async fn wait_for_terminal(&self) -> Option<JobStatus> {
        let mut rx = self.subscribe();
        loop {
            {
                let state = rx.borrow_and_update();
                match &*state {
                    PollState::Done { status, .. } => return Some(*status),
                    PollState::Idle | PollState::Stopped { .. } => return None,
                    PollState::Polling { .. } => {}
                }
            }
            if rx.changed().await.is_err() {
                return None;
            }
        }
    }

    fn abort_task(&self) {
        if let Some(handle) = self.task.lock().expect("poller task lock poisoned").take() {
            handle.abort();
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.abort_task();
    }
}
