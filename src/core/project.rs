//! Project records and folder size values
//!
//! A project is a bookmarked folder. The size subsystem only ever sees the
//! `(id, path)` pair ([`ProjectRecord`]); the rest of [`Project`] belongs to
//! the bookmarking layer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::format::format_size;

/// Database id of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last known on-disk size of a project folder
///
/// Persisted as a single integer column:
/// - `0` = not measured yet
/// - `-1` = the last measurement failed or timed out
/// - `>0` = bytes from the last successful measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderSize {
    #[default]
    Pending,
    Measured(u64),
    Failed,
}

impl FolderSize {
    /// Raw value stored in the `folderSize` column
    pub const FAILED_SENTINEL: i64 = -1;

    /// Decode the stored column value
    ///
    /// Any negative value is treated as a failure.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => Self::Pending,
            n if n < 0 => Self::Failed,
            n => Self::Measured(n as u64),
        }
    }

    /// Encode for the `folderSize` column and for size events
    ///
    /// Sizes beyond `i64::MAX` saturate.
    pub fn to_raw(self) -> i64 {
        match self {
            Self::Pending => 0,
            Self::Failed => Self::FAILED_SENTINEL,
            Self::Measured(bytes) => i64::try_from(bytes).unwrap_or(i64::MAX),
        }
    }

    /// Text shown next to a project in a list
    pub fn label(self) -> String {
        match self {
            Self::Pending => "Calculating…".to_string(),
            Self::Failed => "Error".to_string(),
            Self::Measured(_) => format_size(self.to_raw()),
        }
    }
}

impl Serialize for FolderSize {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_raw())
    }
}

impl<'de> Deserialize<'de> for FolderSize {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_raw)
    }
}

/// The part of a project the size scheduler works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub path: PathBuf,
}

/// A bookmarked project folder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub path: PathBuf,
    pub tags: Vec<String>,
    pub date_added: NaiveDateTime,
    pub last_opened: Option<NaiveDateTime>,
    pub is_favorite: bool,
    pub folder_size: FolderSize,
    pub is_archived: bool,
}

impl Project {
    pub fn record(&self) -> ProjectRecord {
        ProjectRecord {
            id: self.id,
            path: self.path.clone(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Input for creating a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    /// Display name; defaults to the folder name
    pub name: Option<String>,
    pub path: PathBuf,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewProject {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Name to store: the explicit one, else the last path component
    pub fn resolved_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => folder_name(&self.path),
        }
    }
}

/// Partial update of the user-editable project fields
///
/// The folder size is deliberately absent: only the size scheduler writes it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
    pub is_archived: Option<bool>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.tags.is_none()
            && self.is_favorite.is_none()
            && self.is_archived.is_none()
    }
}

/// Join tags into the comma-separated column format
///
/// Tags are trimmed; empty tags and commas inside tags are dropped.
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.replace(',', "").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Split the tags column back into a list
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
