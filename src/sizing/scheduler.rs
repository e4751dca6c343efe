//! Size scheduler
//!
//! Core rule: every scheduled measurement ends with exactly one size write and
//! exactly one event, whatever happens to the walk. A timeout or a scan error
//! stores the failure sentinel instead of a size.
//!
//! The walk runs on the blocking pool and cannot be preempted. When it loses
//! the race, its cancel flag is raised so it stops at the next entry, and its
//! future is dropped, so a late result has nowhere to go.

use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::events::ProjectSizeUpdated;
use super::measurer::FolderMeasurer;
use crate::core::{FolderSize, ProjectId, ProjectRecord, SchedulerConfig};
use crate::storage::{ProjectStore, StoreError};

/// Handle to one scheduled measurement
///
/// Dropping it does not stop the measurement.
pub struct MeasurementHandle {
    id: ProjectId,
    handle: JoinHandle<FolderSize>,
}

impl MeasurementHandle {
    pub fn project_id(&self) -> ProjectId {
        self.id
    }

    /// Wait for the committed outcome
    pub async fn wait(self) -> FolderSize {
        match self.handle.await {
            Ok(size) => size,
            Err(e) => {
                log::error!("Size task for project {} stopped: {}", self.id, e);
                FolderSize::Failed
            }
        }
    }
}

/// Handles for a "recalculate all" run
pub struct BulkMeasurement {
    handles: Vec<MeasurementHandle>,
}

impl BulkMeasurement {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every measurement, in completion order
    pub async fn wait_all(self) -> Vec<(ProjectId, FolderSize)> {
        let mut pending: FuturesUnordered<_> = self
            .handles
            .into_iter()
            .map(|handle| async move {
                let id = handle.project_id();
                (id, handle.wait().await)
            })
            .collect();

        let mut results = Vec::new();
        while let Some(result) = pending.next().await {
            results.push(result);
        }
        results
    }
}

struct SchedulerInner {
    store: Arc<ProjectStore>,
    measurer: Arc<dyn FolderMeasurer>,
    config: SchedulerConfig,
    events: mpsc::UnboundedSender<ProjectSizeUpdated>,
}

/// Schedules folder measurements and publishes their outcomes
///
/// Cheap to clone. Scheduling methods spawn Tokio tasks and must be called
/// from within a runtime.
#[derive(Clone)]
pub struct SizeScheduler {
    inner: Arc<SchedulerInner>,
}

impl SizeScheduler {
    /// Create a scheduler and the receiving end of its event channel
    pub fn new(
        store: Arc<ProjectStore>,
        measurer: impl FolderMeasurer,
        config: SchedulerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ProjectSizeUpdated>) {
        let (events, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            inner: Arc::new(SchedulerInner {
                store,
                measurer: Arc::new(measurer),
                config,
                events,
            }),
        };
        (scheduler, rx)
    }

    pub fn config(&self) -> SchedulerConfig {
        self.inner.config
    }

    /// Measure one project in the background
    ///
    /// Waits the initial delay first so the caller's own response goes out
    /// before any size event. Re-scheduling a project that is already being
    /// measured starts a second, independent measurement; whichever commits
    /// last wins.
    pub fn schedule_measurement(&self, id: ProjectId, path: PathBuf) -> MeasurementHandle {
        let inner = self.inner.clone();
        let delay = inner.config.initial_delay;
        let timeout = inner.config.single_timeout;
        let handle = tokio::spawn(async move { inner.run(id, path, delay, timeout).await });
        MeasurementHandle { id, handle }
    }

    /// Measure every given project concurrently
    ///
    /// Each project gets its own timeout and its own event; one failure does
    /// not affect the others.
    pub fn recalculate(&self, records: Vec<ProjectRecord>) -> BulkMeasurement {
        log::info!("Recalculating folder sizes for {} projects", records.len());

        let timeout = self.inner.config.bulk_timeout;
        let handles = records
            .into_iter()
            .map(|record| {
                let inner = self.inner.clone();
                let id = record.id;
                let handle = tokio::spawn(async move {
                    inner.run(record.id, record.path, Duration::ZERO, timeout).await
                });
                MeasurementHandle { id, handle }
            })
            .collect();

        BulkMeasurement { handles }
    }

    /// Read all project records once and measure them concurrently
    pub fn recalculate_all(&self) -> Result<BulkMeasurement, StoreError> {
        let records = self.inner.store.project_records()?;
        Ok(self.recalculate(records))
    }
}

impl SchedulerInner {
    async fn run(
        &self,
        id: ProjectId,
        path: PathBuf,
        delay: Duration,
        timeout: Duration,
    ) -> FolderSize {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let size = self.measure_with_timeout(id, &path, timeout).await;
        self.commit(id, size).await;
        size
    }

    async fn measure_with_timeout(
        &self,
        id: ProjectId,
        path: &Path,
        timeout: Duration,
    ) -> FolderSize {
        let cancel = Arc::new(AtomicBool::new(false));
        let started = Instant::now();
        log::debug!("Measuring project {} at {}", id, path.display());

        let measurement = self.measurer.measure(path.to_path_buf(), cancel.clone());
        match tokio::time::timeout(timeout, measurement).await {
            Ok(Ok(bytes)) => {
                log::info!(
                    "Measured project {}: {} bytes in {:?}",
                    id,
                    bytes,
                    started.elapsed()
                );
                FolderSize::Measured(bytes)
            }
            Ok(Err(e)) => {
                log::warn!("Could not measure project {}: {}", id, e);
                FolderSize::Failed
            }
            Err(_) => {
                cancel.store(true, Ordering::SeqCst);
                log::warn!(
                    "Measuring project {} timed out after {:?}: {}",
                    id,
                    timeout,
                    path.display()
                );
                FolderSize::Failed
            }
        }
    }

    /// Store the outcome, then announce it
    ///
    /// The write waits on the store lock and SQLite's busy timeout, so it runs
    /// on the blocking pool and leaves other timeout races undisturbed.
    async fn commit(&self, id: ProjectId, size: FolderSize) {
        let store = self.store.clone();
        let write = tokio::task::spawn_blocking(move || store.persist_folder_size(id, size));

        match write.await {
            Ok(Ok(())) => {}
            Ok(Err(StoreError::NotFound(_))) => {
                log::debug!("Project {} was removed before its size was saved", id);
            }
            Ok(Err(e)) => {
                log::error!("Failed to save folder size for project {}: {}", id, e);
            }
            Err(e) => {
                log::error!("Size write for project {} stopped: {}", id, e);
            }
        }

        let event = ProjectSizeUpdated {
            id,
            folder_size: size,
        };
        if self.events.send(event).is_err() {
            log::debug!("No listener for size updates (project {})", id);
        }
    }
}
