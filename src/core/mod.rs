//! Core types and folder measurement
//!
//! This module contains:
//! - Project records and the folder size value type
//! - Skip rules and options for folder scans
//! - The recursive folder size walker
//! - Size formatting for display
//! - Application settings

mod format;
mod policy;
mod project;
mod scanning;
mod state;

pub use format::format_size;
pub use policy::{DEFAULT_MAX_DEPTH, ScanOptions, SkipPolicy};
pub use project::{
    FolderSize, NewProject, Project, ProjectId, ProjectRecord, ProjectUpdate, join_tags,
    split_tags,
};
pub use scanning::{
    ScanError, is_directory, measure_folder, resolve_folder_path, scan_folder_size,
};
pub use state::{AppSettings, SchedulerConfig};
