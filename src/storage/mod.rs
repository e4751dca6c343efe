//! Project persistence
//!
//! One SQLite file holds the `projects` table. Every read and write goes
//! through [`ProjectStore`], which serializes access to its single connection.

mod schema;
mod store;

use std::path::PathBuf;
use thiserror::Error;

use crate::core::ProjectId;

pub use store::ProjectStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Project {0} not found")]
    NotFound(ProjectId),

    #[error("A project already exists for {}", .0.display())]
    DuplicatePath(PathBuf),
}
