//! Domain calls on top of the gateway: job status, upload history, schedule.

use chrono::Utc;
use serde_json::Value;

use crosspost_core::models::{
    JobStatus, ScheduleOutcome, ScheduleRequest, StatusResponse, UploadRecord,
};
use crosspost_core::ClientError;

use crate::ApiClient;

impl ApiClient {
    /// Current processing status of a project's upload job.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatus, ClientError> {
        let response: StatusResponse = self
            .get("/get-status", &[("job_id", job_id.to_string())])
            .await?;
        Ok(response.status)
    }

    /// All upload records for the authenticated user, unordered. Grouping and
    /// ordering happen on this side; see `group_by_project`.
    pub async fn upload_history(&self) -> Result<Vec<UploadRecord>, ClientError> {
        self.get("/upload_history", &[]).await
    }

    /// Schedule a project for publication. The time must be in the future;
    /// a past time is rejected here without touching the network.
    pub async fn schedule(&self, request: &ScheduleRequest) -> Result<ScheduleOutcome, ClientError> {
        if request.platforms.is_empty() {
            return Err(ClientError::Validation(
                "Select at least one platform.".to_string(),
            ));
        }
        if request.scheduled_time <= Utc::now() {
            return Err(ClientError::Validation(
                "Scheduled time must be in the future.".to_string(),
            ));
        }

        let body: Value = self.post_json("/schedule", request).await?;
        let detail = body
            .get("detail")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(ScheduleOutcome {
            accepted: true,
            detail,
        })
    }
}
