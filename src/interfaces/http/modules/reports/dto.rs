//! Report export DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ExportTask;

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct ExportRequest {
    /// Export the whole system (admin only)
    #[serde(default)]
    pub all_users: bool,
    /// Specific user scope; defaults to the caller
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportTaskResponse {
    pub id: i64,
    /// pending | processing | done | failed
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub download_link: Option<String>,
}

impl From<ExportTask> for ExportTaskResponse {
    fn from(task: ExportTask) -> Self {
        Self {
            id: task.id,
            status: task.status.to_string(),
            created_at: task.created_at,
            completed_at: task.completed_at,
            download_link: task.download_link,
        }
    }
}
