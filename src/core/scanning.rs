//! Recursive folder size measurement
//!
//! This module walks a project folder and sums the byte length of every file
//! the [`ScanOptions`] admit. The walk is tolerant: an unreadable
//! subdirectory, a broken symlink or a file deleted mid-walk contributes zero
//! and the walk carries on. Only a bad root is an error, so callers can tell
//! "empty folder" apart from "wrong path".

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use super::policy::{ScanOptions, SkipPolicy};

/// Why a folder could not be measured
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Folder does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Cannot read folder {}: {source}", .path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Scan task stopped unexpectedly: {0}")]
    Interrupted(String),
}

/// Check that the root exists, is a directory, and can be listed
fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = fs::metadata(root).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ScanError::RootNotFound(root.to_path_buf()),
        _ => ScanError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        },
    })?;

    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    fs::read_dir(root).map_err(|source| ScanError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    Ok(())
}

fn admits_entry(entry: &DirEntry, policy: &SkipPolicy) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    let name = entry.file_name().to_string_lossy();
    if entry.file_type().is_dir() {
        policy.admits_dir(&name)
    } else {
        policy.admits_file(&name)
    }
}

/// Measure a folder on the current thread
///
/// The root is depth 0. Files directly inside a directory at `max_depth` are
/// still counted, but that directory's subdirectories are not entered.
/// Symlinks are followed; loops are reported by the walker and skipped.
///
/// `cancel` is checked before every entry. Once set, the walk stops with
/// [`ScanError::Cancelled`].
pub fn measure_folder(
    root: &Path,
    options: &ScanOptions,
    cancel: &AtomicBool,
) -> Result<u64, ScanError> {
    check_root(root)?;

    let walker = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(options.max_depth.saturating_add(1))
        .into_iter()
        .filter_entry(|entry| admits_entry(entry, &options.policy));

    let mut total: u64 = 0;
    for entry in walker {
        if cancel.load(Ordering::Relaxed) {
            return Err(ScanError::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::trace!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !options.matches_extension(entry.path()) {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => total = total.saturating_add(metadata.len()),
            Err(e) => log::trace!("Cannot stat {}: {}", entry.path().display(), e),
        }
    }

    Ok(total)
}

/// Measure a folder without blocking the async runtime
///
/// The walk runs on Tokio's blocking pool. Dropping the returned future does
/// not stop the walk; raise `cancel` for that.
pub async fn scan_folder_size(
    root: PathBuf,
    options: ScanOptions,
    cancel: Arc<AtomicBool>,
) -> Result<u64, ScanError> {
    tokio::task::spawn_blocking(move || measure_folder(&root, &options, &cancel))
        .await
        .map_err(|e| ScanError::Interrupted(e.to_string()))?
}

/// Check whether a path is an existing directory
pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Absolute, normalized form of a project folder path
///
/// Existing paths are canonicalized, so symlinks, `.` and `..` resolve to
/// the real folder. Missing paths are made absolute against the current
/// directory, with `.` components and trailing separators dropped.
pub fn resolve_folder_path(path: &Path) -> std::io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(resolved) => Ok(resolved),
        Err(_) => Ok(std::path::absolute(path)?.components().collect()),
    }
}
