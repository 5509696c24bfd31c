use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of `GET /upload_history`: a single uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub project_id: String,
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub uploader_id: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Read-only projection of the upload records belonging to one project,
/// for list display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHistory {
    pub project_id: String,
    /// Files within the project, newest first.
    pub files: Vec<UploadRecord>,
}

impl ProjectHistory {
    /// Timestamp of the most recent upload in the project.
    pub fn latest_uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.files.first().map(|f| f.uploaded_at)
    }
}

/// Group raw history rows by project identifier, newest project first by its
/// latest upload timestamp. The backend makes no ordering promise, so the
/// ordering contract lives entirely here.
pub fn group_by_project(records: Vec<UploadRecord>) -> Vec<ProjectHistory> {
    let mut groups: HashMap<String, Vec<UploadRecord>> = HashMap::new();
    for record in records {
        groups.entry(record.project_id.clone()).or_default().push(record);
    }

    let mut projects: Vec<ProjectHistory> = groups
        .into_iter()
        .map(|(project_id, mut files)| {
            files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
            ProjectHistory { project_id, files }
        })
        .collect();

    projects.sort_by(|a, b| b.latest_uploaded_at().cmp(&a.latest_uploaded_at()));
    projects
}
