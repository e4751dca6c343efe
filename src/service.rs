//! Request/response boundary for the bookmarking layer
//!
//! [`ProjectService`] is what a UI calls into: project CRUD, on-demand size
//! measurement, and size recalculation. Size results for scheduled
//! measurements arrive separately on the event receiver returned by
//! [`ProjectService::new`].

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::{
    AppSettings, NewProject, Project, ProjectId, ProjectUpdate, ScanError, format_size,
    is_directory, resolve_folder_path, scan_folder_size,
};
use crate::sizing::{
    BulkMeasurement, MeasurementHandle, ProjectSizeUpdated, SizeScheduler, WalkingMeasurer,
};
use crate::storage::{ProjectStore, StoreError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("Measuring {} took longer than {:?}", .path.display(), .limit)]
    Timeout { path: PathBuf, limit: Duration },

    #[error("Invalid project path {}: {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of an on-demand size measurement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeReport {
    pub size: u64,
    pub human_readable_size: String,
}

impl SizeReport {
    fn new(size: u64) -> Self {
        Self {
            size,
            human_readable_size: format_size(i64::try_from(size).unwrap_or(i64::MAX)),
        }
    }
}

/// Project operations exposed to the UI layer
pub struct ProjectService {
    store: Arc<ProjectStore>,
    scheduler: SizeScheduler,
    settings: AppSettings,
}

impl ProjectService {
    /// Build the service with a walking scheduler configured from `settings`
    pub fn new(
        store: Arc<ProjectStore>,
        settings: AppSettings,
    ) -> (Self, mpsc::UnboundedReceiver<ProjectSizeUpdated>) {
        let (scheduler, events) = SizeScheduler::new(
            store.clone(),
            WalkingMeasurer::new(settings.scan_options()),
            settings.scheduler_config(),
        );
        (Self::with_scheduler(store, scheduler, settings), events)
    }

    /// Build the service around an existing scheduler
    pub fn with_scheduler(
        store: Arc<ProjectStore>,
        scheduler: SizeScheduler,
        settings: AppSettings,
    ) -> Self {
        Self {
            store,
            scheduler,
            settings,
        }
    }

    /// Add a project and measure its folder in the background
    ///
    /// The path is stored in resolved absolute form, so every spelling of a
    /// folder maps to the same project. Returns as soon as the record exists,
    /// with the size still pending.
    pub fn add_project(&self, new: NewProject) -> Result<Project, ServiceError> {
        let path = resolve_folder_path(&new.path).map_err(|source| ServiceError::InvalidPath {
            path: new.path.clone(),
            source,
        })?;
        let new = NewProject { path, ..new };

        let project = self.store.insert_project(&new)?;
        log::info!("Added project {} ({})", project.id, project.path.display());

        self.scheduler
            .schedule_measurement(project.id, project.path.clone());
        Ok(project)
    }

    pub fn projects(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.store.projects()?)
    }

    pub fn project(&self, id: ProjectId) -> Result<Project, ServiceError> {
        Ok(self.store.project(id)?)
    }

    pub fn update_project(
        &self,
        id: ProjectId,
        update: &ProjectUpdate,
    ) -> Result<Project, ServiceError> {
        Ok(self.store.update_project(id, update)?)
    }

    pub fn delete_project(&self, id: ProjectId) -> Result<(), ServiceError> {
        self.store.delete_project(id)?;
        log::info!("Removed project {}", id);
        Ok(())
    }

    /// Record that the user opened the project folder
    pub fn mark_opened(&self, id: ProjectId) -> Result<Project, ServiceError> {
        Ok(self.store.mark_opened(id)?)
    }

    /// Measure a folder now and wait for the answer
    ///
    /// With no extensions every file counts; otherwise only matching files,
    /// using the stricter by-type skip rules.
    pub async fn calculate_size(
        &self,
        path: &Path,
        extensions: &[String],
    ) -> Result<SizeReport, ServiceError> {
        let options = if extensions.is_empty() {
            self.settings.scan_options()
        } else {
            self.settings.typed_scan_options(extensions)
        };
        let limit = self.scheduler.config().single_timeout;
        let cancel = Arc::new(AtomicBool::new(false));

        let scan = scan_folder_size(path.to_path_buf(), options, cancel.clone());
        match tokio::time::timeout(limit, scan).await {
            Ok(result) => Ok(SizeReport::new(result?)),
            Err(_) => {
                cancel.store(true, Ordering::SeqCst);
                Err(ServiceError::Timeout {
                    path: path.to_path_buf(),
                    limit,
                })
            }
        }
    }

    /// Re-measure one project in the background
    pub fn recalculate_size(&self, id: ProjectId, path: PathBuf) -> MeasurementHandle {
        self.scheduler.schedule_measurement(id, path)
    }

    /// Re-measure every project in the background
    pub fn recalculate_all_sizes(&self) -> Result<BulkMeasurement, ServiceError> {
        Ok(self.scheduler.recalculate_all()?)
    }

    pub fn formatted_size(&self, bytes: i64) -> String {
        format_size(bytes)
    }

    pub fn is_directory(&self, path: &Path) -> bool {
        is_directory(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FolderSize;
    use tempfile::TempDir;

    fn test_settings() -> AppSettings {
        AppSettings {
            initial_delay_ms: 1,
            ..Default::default()
        }
    }

    fn service() -> (ProjectService, mpsc::UnboundedReceiver<ProjectSizeUpdated>) {
        let store = Arc::new(ProjectStore::open_in_memory().unwrap());
        ProjectService::new(store, test_settings())
    }

    fn write_bytes(path: &Path, len: usize) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, vec![1u8; len]).unwrap();
    }

    #[tokio::test]
    async fn test_add_project_returns_pending_then_notifies() {
        let temp_dir = TempDir::new().unwrap();
        write_bytes(&temp_dir.path().join("main.rs"), 300);
        let (service, mut events) = service();

        let project = service
            .add_project(NewProject::from_path(temp_dir.path()))
            .unwrap();
        assert_eq!(project.folder_size, FolderSize::Pending);

        let event = events.recv().await.unwrap();
        assert_eq!(event.id, project.id);
        assert_eq!(event.folder_size, FolderSize::Measured(300));
        assert_eq!(
            service.project(project.id).unwrap().folder_size,
            FolderSize::Measured(300)
        );
    }

    #[tokio::test]
    async fn test_add_project_stores_resolved_path() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("app").join("src")).unwrap();
        let (service, _events) = service();

        let spelled = temp_dir.path().join("app").join("src").join("..");
        let project = service.add_project(NewProject::from_path(&spelled)).unwrap();

        let canonical = temp_dir.path().join("app").canonicalize().unwrap();
        assert_eq!(project.path, canonical);
        assert_eq!(project.name, "app");
    }

    #[tokio::test]
    async fn test_same_folder_under_another_spelling_is_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _events) = service();

        service
            .add_project(NewProject::from_path(temp_dir.path()))
            .unwrap();

        let trailing = PathBuf::from(format!("{}/", temp_dir.path().display()));
        let dotted = temp_dir.path().join(".");
        for path in [trailing, dotted] {
            assert!(matches!(
                service.add_project(NewProject::from_path(path)),
                Err(ServiceError::Store(StoreError::DuplicatePath(_)))
            ));
        }
        assert_eq!(service.projects().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_relative_path_matches_absolute_spelling() {
        // Long delay keeps the working directory from being walked
        let store = Arc::new(ProjectStore::open_in_memory().unwrap());
        let settings = AppSettings {
            initial_delay_ms: 60_000,
            ..Default::default()
        };
        let (service, _events) = ProjectService::new(store, settings);

        let relative = service.add_project(NewProject::from_path(".")).unwrap();
        assert!(relative.path.is_absolute());
        assert_ne!(relative.name, ".");

        let cwd = std::env::current_dir().unwrap();
        assert!(matches!(
            service.add_project(NewProject::from_path(cwd)),
            Err(ServiceError::Store(StoreError::DuplicatePath(_)))
        ));
    }

    #[tokio::test]
    async fn test_add_missing_folder_reports_error_size() {
        let temp_dir = TempDir::new().unwrap();
        let (service, mut events) = service();

        let project = service
            .add_project(NewProject::from_path(temp_dir.path().join("missing")))
            .unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event.id, project.id);
        assert_eq!(event.folder_size, FolderSize::Failed);
        assert_eq!(
            service.project(project.id).unwrap().folder_size.label(),
            "Error"
        );
    }

    #[tokio::test]
    async fn test_calculate_size_with_and_without_filter() {
        let temp_dir = TempDir::new().unwrap();
        write_bytes(&temp_dir.path().join("a.txt"), 1024);
        write_bytes(&temp_dir.path().join("b.rs"), 512);
        let (service, _events) = service();

        let all = service.calculate_size(temp_dir.path(), &[]).await.unwrap();
        assert_eq!(
            all,
            SizeReport {
                size: 1536,
                human_readable_size: "1.5 KB".to_string()
            }
        );

        let txt = service
            .calculate_size(temp_dir.path(), &["txt".to_string()])
            .await
            .unwrap();
        assert_eq!(txt.size, 1024);
        assert_eq!(txt.human_readable_size, "1 KB");
    }

    #[tokio::test]
    async fn test_calculate_size_missing_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _events) = service();
        let result = service
            .calculate_size(&temp_dir.path().join("nope"), &[])
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::Scan(ScanError::RootNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_does_not_touch_size() {
        let temp_dir = TempDir::new().unwrap();
        write_bytes(&temp_dir.path().join("x"), 10);
        let (service, mut events) = service();

        let project = service
            .add_project(NewProject::from_path(temp_dir.path()))
            .unwrap();
        events.recv().await.unwrap();

        let updated = service
            .update_project(
                project.id,
                &ProjectUpdate {
                    tags: Some(vec!["work".to_string()]),
                    is_archived: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.is_archived);
        assert!(updated.has_tag("work"));
        assert_eq!(updated.folder_size, FolderSize::Measured(10));
    }

    #[tokio::test]
    async fn test_recalculate_all_sizes_notifies_each_project() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write_bytes(&first.path().join("f"), 5);
        write_bytes(&second.path().join("g"), 7);
        let (service, mut events) = service();

        let a = service.add_project(NewProject::from_path(first.path())).unwrap();
        let b = service.add_project(NewProject::from_path(second.path())).unwrap();
        events.recv().await.unwrap();
        events.recv().await.unwrap();

        write_bytes(&second.path().join("h"), 100);
        let bulk = service.recalculate_all_sizes().unwrap();
        assert_eq!(bulk.len(), 2);

        let mut results = bulk.wait_all().await;
        results.sort_by_key(|(id, _)| *id);
        assert_eq!(
            results,
            vec![
                (a.id, FolderSize::Measured(5)),
                (b.id, FolderSize::Measured(107))
            ]
        );
        assert!(events.recv().await.is_some());
        assert!(events.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_delete_and_mark_opened() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _events) = service();

        let project = service
            .add_project(NewProject::from_path(temp_dir.path()))
            .unwrap();
        let opened = service.mark_opened(project.id).unwrap();
        assert!(opened.last_opened.is_some());

        service.delete_project(project.id).unwrap();
        assert!(service.projects().unwrap().is_empty());
        assert!(matches!(
            service.project(project.id),
            Err(ServiceError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn test_formatted_size_and_is_directory() {
        let temp_dir = TempDir::new().unwrap();
        let (service, _events) = service();

        assert_eq!(service.formatted_size(-1), "Error");
        assert_eq!(service.formatted_size(0), "0 B");
        assert!(service.is_directory(temp_dir.path()));
        assert!(!service.is_directory(&temp_dir.path().join("file")));
    }
}
