//! Report export tasks and reminder bookkeeping.
//!
//! Heavy report generation never runs on a request path: a request only
//! inserts a pending task and the background worker picks it up.

use chrono::{DateTime, Utc};

/// Lifecycle of an export task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "processing" => Self::Processing,
            "done" => Self::Done,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One queued usage-report generation job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTask {
    pub id: i64,
    /// Requesting user.
    pub user_id: String,
    /// None = whole-system report (admin only), Some = single user scope.
    pub scope_user_id: Option<String>,
    pub status: ExportStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub download_link: Option<String>,
}

impl ExportTask {
    pub fn pending(user_id: impl Into<String>, scope_user_id: Option<String>) -> Self {
        Self {
            id: 0,
            user_id: user_id.into(),
            scope_user_id,
            status: ExportStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            download_link: None,
        }
    }

    pub fn mark_done(&mut self, download_link: impl Into<String>) {
        self.status = ExportStatus::Done;
        self.completed_at = Some(Utc::now());
        self.download_link = Some(download_link.into());
    }

    pub fn mark_failed(&mut self) {
        self.status = ExportStatus::Failed;
        self.completed_at = Some(Utc::now());
    }
}

/// Record of a sent periodic reminder, used to avoid duplicate sends.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderLog {
    pub id: i64,
    pub user_id: String,
    /// e.g. "daily"
    pub reminder_type: String,
    pub sent_at: DateTime<Utc>,
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for st in [
            ExportStatus::Pending,
            ExportStatus::Processing,
            ExportStatus::Done,
            ExportStatus::Failed,
        ] {
            assert_eq!(ExportStatus::from_str(st.as_str()), st);
        }
        assert_eq!(ExportStatus::from_str("junk"), ExportStatus::Pending);
    }

    #[test]
    fn done_task_has_link_and_completion_time() {
        let mut t = ExportTask::pending("u1", None);
        assert_eq!(t.status, ExportStatus::Pending);
        t.mark_done("/exports/report-1.txt");
        assert_eq!(t.status, ExportStatus::Done);
        assert!(t.completed_at.is_some());
        assert_eq!(t.download_link.as_deref(), Some("/exports/report-1.txt"));
    }

    #[test]
    fn failed_task_has_no_link() {
        let mut t = ExportTask::pending("u1", Some("u2".into()));
        t.mark_failed();
        assert_eq!(t.status, ExportStatus::Failed);
        assert!(t.download_link.is_none());
    }
}
