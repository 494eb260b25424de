//! Asynchronous usage-report exports.
//!
//! A request only inserts a pending `ExportTask` and returns; the
//! background worker claims tasks one at a time, renders the document
//! through the report-generator collaborator and stores the download
//! link. Heavy generation never runs on a request path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::application::ports::ReportGenerator;
use crate::domain::{Caller, DomainError, DomainResult, ExportTask, Storage};
use crate::notifications::events::ReportReadyEvent;
use crate::notifications::{Dispatcher, Event};
use crate::shared::ShutdownSignal;

pub struct ReportService {
    storage: Arc<dyn Storage>,
    dispatcher: Dispatcher,
    generator: Arc<dyn ReportGenerator>,
    exports_dir: PathBuf,
}

impl ReportService {
    pub fn new(
        storage: Arc<dyn Storage>,
        dispatcher: Dispatcher,
        generator: Arc<dyn ReportGenerator>,
        exports_dir: PathBuf,
    ) -> Self {
        Self {
            storage,
            dispatcher,
            generator,
            exports_dir,
        }
    }

    /// Queue a report export. `scope_user_id = None` means the whole
    /// system (admin only); a regular user may only export their own
    /// usage.
    pub async fn request_export(
        &self,
        caller: &Caller,
        scope_user_id: Option<String>,
    ) -> DomainResult<ExportTask> {
        let (user_id, _) = caller.require_user()?;

        match &scope_user_id {
            None => {
                caller.require_admin()?;
            }
            Some(scope) if scope.as_str() != user_id => {
                caller.require_admin()?;
            }
            Some(_) => {}
        }

        let task = self
            .storage
            .insert_export_task(ExportTask::pending(user_id, scope_user_id))
            .await?;
        info!(task_id = task.id, "report export queued");
        Ok(task)
    }

    /// Poll an export task. Visible to its requester and to admins.
    pub async fn task_status(&self, caller: &Caller, task_id: i64) -> DomainResult<ExportTask> {
        let (user_id, _) = caller.require_user()?;
        let task = self
            .storage
            .get_export_task(task_id)
            .await?
            .ok_or_else(|| DomainError::not_found("ExportTask", "id", task_id))?;
        if task.user_id != user_id && !caller.is_admin() {
            return Err(DomainError::Forbidden(
                "not the owner of this export".into(),
            ));
        }
        Ok(task)
    }

    /// Claim and process one pending task. Returns false when the queue
    /// is empty.
    pub async fn process_next(&self) -> DomainResult<bool> {
        let Some(mut task) = self.storage.claim_pending_export_task().await? else {
            return Ok(false);
        };

        let entries = match &task.scope_user_id {
            Some(user_id) => self.storage.list_usage_for_user(user_id).await?,
            None => self.storage.list_all_usage().await?,
        };

        match self.generator.generate(&entries).await {
            Ok(bytes) => {
                let filename = format!("usage-report-{}.txt", task.id);
                match self.write_document(&filename, &bytes).await {
                    Ok(()) => {
                        let link = format!("/exports/{}", filename);
                        task.mark_done(link.clone());
                        self.storage.update_export_task(task.clone()).await?;
                        info!(task_id = task.id, link = %link, "report export completed");
                        self.dispatcher.enqueue(
                            Event::ReportReady(ReportReadyEvent {
                                user_id: task.user_id.clone(),
                                task_id: task.id,
                                download_link: link,
                                timestamp: Utc::now(),
                            }),
                            Duration::ZERO,
                        );
                    }
                    Err(e) => {
                        warn!(task_id = task.id, error = %e, "failed to store report");
                        task.mark_failed();
                        self.storage.update_export_task(task).await?;
                    }
                }
            }
            Err(e) => {
                warn!(task_id = task.id, error = %e, "report generation failed");
                task.mark_failed();
                self.storage.update_export_task(task).await?;
            }
        }

        Ok(true)
    }

    async fn write_document(&self, filename: &str, bytes: &[u8]) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.exports_dir)
            .await
            .map_err(|e| e.to_string())?;
        tokio::fs::write(self.exports_dir.join(filename), bytes)
            .await
            .map_err(|e| e.to_string())
    }

    /// Start the worker loop draining the export queue.
    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal, poll_interval_secs: u64) {
        tokio::spawn(async move {
            info!("📊 Report export worker started");
            let mut interval = tokio::time::interval(Duration::from_secs(poll_interval_secs));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        // drain everything currently queued
                        loop {
                            match self.process_next().await {
                                Ok(true) => continue,
                                Ok(false) => break,
                                Err(e) => {
                                    warn!(error = %e, "export worker error");
                                    break;
                                }
                            }
                        }
                    }
                    _ = shutdown.notified().wait() => {
                        info!("📊 Report export worker shutting down");
                        break;
                    }
                }
            }
        });
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::PlainTextReportGenerator;
    use crate::domain::ExportStatus;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::notifications::create_event_bus;
    use async_trait::async_trait;
    use crate::domain::UsageLogEntry;

    fn temp_exports_dir() -> PathBuf {
        std::env::temp_dir().join(format!("parkhub-exports-{}", uuid::Uuid::new_v4()))
    }

    fn service_with(
        generator: Arc<dyn ReportGenerator>,
    ) -> (ReportService, Arc<InMemoryStorage>, PathBuf) {
        let storage = Arc::new(InMemoryStorage::new());
        let dir = temp_exports_dir();
        let service = ReportService::new(
            storage.clone(),
            Dispatcher::new(create_event_bus()),
            generator,
            dir.clone(),
        );
        (service, storage, dir)
    }

    #[tokio::test]
    async fn user_may_only_export_own_scope() {
        let (service, _, _) = service_with(Arc::new(PlainTextReportGenerator));
        let user = Caller::user("u1", "alice");

        assert!(service
            .request_export(&user, Some("u1".into()))
            .await
            .is_ok());
        assert!(matches!(
            service.request_export(&user, None).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            service.request_export(&user, Some("u2".into())).await,
            Err(DomainError::Forbidden(_))
        ));

        let admin = Caller::admin("a1", "root");
        assert!(service.request_export(&admin, None).await.is_ok());
        assert!(service
            .request_export(&admin, Some("u1".into()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn process_next_completes_task_and_writes_file() {
        let (service, storage, dir) = service_with(Arc::new(PlainTextReportGenerator));
        let admin = Caller::admin("a1", "root");
        let task = service.request_export(&admin, None).await.unwrap();

        assert!(service.process_next().await.unwrap());

        let done = storage.get_export_task(task.id).await.unwrap().unwrap();
        assert_eq!(done.status, ExportStatus::Done);
        let link = done.download_link.unwrap();
        assert!(link.ends_with(&format!("usage-report-{}.txt", task.id)));
        assert!(dir.join(format!("usage-report-{}.txt", task.id)).exists());

        // empty queue
        assert!(!service.process_next().await.unwrap());
        let _ = std::fs::remove_dir_all(dir);
    }

    struct BrokenGenerator;

    #[async_trait]
    impl ReportGenerator for BrokenGenerator {
        async fn generate(&self, _entries: &[UsageLogEntry]) -> Result<Vec<u8>, String> {
            Err("renderer crashed".into())
        }
    }

    #[tokio::test]
    async fn generation_failure_marks_task_failed() {
        let (service, storage, _) = service_with(Arc::new(BrokenGenerator));
        let admin = Caller::admin("a1", "root");
        let task = service.request_export(&admin, None).await.unwrap();

        assert!(service.process_next().await.unwrap());

        let failed = storage.get_export_task(task.id).await.unwrap().unwrap();
        assert_eq!(failed.status, ExportStatus::Failed);
        assert!(failed.download_link.is_none());
    }

    #[tokio::test]
    async fn status_is_owner_or_admin_only() {
        let (service, _, _) = service_with(Arc::new(PlainTextReportGenerator));
        let user = Caller::user("u1", "alice");
        let task = service
            .request_export(&user, Some("u1".into()))
            .await
            .unwrap();

        assert!(service.task_status(&user, task.id).await.is_ok());
        assert!(service
            .task_status(&Caller::admin("a1", "root"), task.id)
            .await
            .is_ok());
        assert!(matches!(
            service
                .task_status(&Caller::user("u2", "bob"), task.id)
                .await,
            Err(DomainError::Forbidden(_))
        ));
    }
}
