//! Size update events delivered to the UI layer

use serde::{Deserialize, Serialize};

use crate::core::{FolderSize, ProjectId};

/// A project's folder size changed
///
/// Sent once per measurement, after the new value has been written to the
/// store. Each event supersedes earlier ones for the same id. Serializes as
/// `{"id": 3, "folderSize": 4096}`, with `-1` for a failed measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSizeUpdated {
    pub id: ProjectId,
    pub folder_size: FolderSize,
}
