//! The measurement seam used by the scheduler

use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::core::{ScanError, ScanOptions, scan_folder_size};

/// Something that can measure a folder
///
/// The scheduler passes a fresh cancel flag with every call and raises it if
/// the measurement loses the race against its timeout.
pub trait FolderMeasurer: Send + Sync + 'static {
    fn measure(
        &self,
        path: PathBuf,
        cancel: Arc<AtomicBool>,
    ) -> BoxFuture<'static, Result<u64, ScanError>>;
}

impl<F> FolderMeasurer for F
where
    F: Fn(PathBuf, Arc<AtomicBool>) -> BoxFuture<'static, Result<u64, ScanError>>
        + Send
        + Sync
        + 'static,
{
    fn measure(
        &self,
        path: PathBuf,
        cancel: Arc<AtomicBool>,
    ) -> BoxFuture<'static, Result<u64, ScanError>> {
        self(path, cancel)
    }
}

/// Measures folders by walking them on disk
#[derive(Debug, Clone, Default)]
pub struct WalkingMeasurer {
    options: ScanOptions,
}

impl WalkingMeasurer {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }
}

impl FolderMeasurer for WalkingMeasurer {
    fn measure(
        &self,
        path: PathBuf,
        cancel: Arc<AtomicBool>,
    ) -> BoxFuture<'static, Result<u64, ScanError>> {
        scan_folder_size(path, self.options.clone(), cancel).boxed()
    }
}
