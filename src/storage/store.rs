//! SQLite-backed project store

use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params, params_from_iter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::StoreError;
use super::schema;
use crate::core::{
    FolderSize, NewProject, Project, ProjectId, ProjectRecord, ProjectUpdate, join_tags,
    split_tags,
};

const PROJECT_COLUMNS: &str =
    "id, name, path, tags, dateAdded, lastOpened, isFavorite, folderSize, isArchived";

/// Shared handle to the project database
///
/// Holds one connection behind a mutex, so writes from concurrent size
/// measurements and from the bookmarking layer never interleave mid-statement.
/// Each statement commits on its own; a write is visible to every reader as
/// soon as the method returns.
pub struct ProjectStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl ProjectStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        schema::apply_pragmas(&conn)?;
        schema::migrate(&conn)?;

        log::debug!("Opened project database at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a statement half-applied
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert a project with an unmeasured folder size
    pub fn insert_project(&self, new: &NewProject) -> Result<Project, StoreError> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO projects (name, path, tags, folderSize) VALUES (?1, ?2, ?3, ?4)",
            params![
                new.resolved_name(),
                path_to_column(&new.path),
                join_tags(&new.tags),
                FolderSize::Pending.to_raw(),
            ],
        );

        match result {
            Ok(_) => {}
            Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                return Err(StoreError::DuplicatePath(new.path.clone()));
            }
            Err(e) => return Err(e.into()),
        }

        let id = ProjectId(conn.last_insert_rowid());
        load_project(&conn, id)
    }

    /// All projects, newest first
    pub fn projects(&self) -> Result<Vec<Project>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects ORDER BY dateAdded DESC, id DESC",
            PROJECT_COLUMNS
        ))?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    pub fn project(&self, id: ProjectId) -> Result<Project, StoreError> {
        load_project(&self.conn(), id)
    }

    /// The `(id, path)` pairs used for bulk size recalculation
    pub fn project_records(&self) -> Result<Vec<ProjectRecord>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, path FROM projects ORDER BY id")?;
        let records = stmt
            .query_map([], |row| {
                Ok(ProjectRecord {
                    id: ProjectId(row.get(0)?),
                    path: PathBuf::from(row.get::<_, String>(1)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Write the outcome of a size measurement
    ///
    /// Only the size column is touched, so edits to other fields made while
    /// the measurement ran are kept.
    pub fn persist_folder_size(&self, id: ProjectId, size: FolderSize) -> Result<(), StoreError> {
        let changed = self.conn().execute(
            "UPDATE projects SET folderSize = ?1 WHERE id = ?2",
            params![size.to_raw(), id.0],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Apply the given field changes and return the updated project
    pub fn update_project(
        &self,
        id: ProjectId,
        update: &ProjectUpdate,
    ) -> Result<Project, StoreError> {
        let conn = self.conn();
        if update.is_empty() {
            return load_project(&conn, id);
        }

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if let Some(name) = &update.name {
            assignments.push("name = ?");
            values.push(Value::Text(name.trim().to_string()));
        }
        if let Some(tags) = &update.tags {
            assignments.push("tags = ?");
            values.push(Value::Text(join_tags(tags)));
        }
        if let Some(favorite) = update.is_favorite {
            assignments.push("isFavorite = ?");
            values.push(Value::Integer(favorite as i64));
        }
        if let Some(archived) = update.is_archived {
            assignments.push("isArchived = ?");
            values.push(Value::Integer(archived as i64));
        }
        values.push(Value::Integer(id.0));

        let sql = format!("UPDATE projects SET {} WHERE id = ?", assignments.join(", "));
        let changed = conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        load_project(&conn, id)
    }

    pub fn delete_project(&self, id: ProjectId) -> Result<(), StoreError> {
        let changed = self
            .conn()
            .execute("DELETE FROM projects WHERE id = ?1", params![id.0])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Stamp the project as opened now
    pub fn mark_opened(&self, id: ProjectId) -> Result<Project, StoreError> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE projects SET lastOpened = CURRENT_TIMESTAMP WHERE id = ?1",
            params![id.0],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        load_project(&conn, id)
    }
}

fn path_to_column(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn load_project(conn: &Connection, id: ProjectId) -> Result<Project, StoreError> {
    conn.query_row(
        &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS),
        params![id.0],
        project_from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(id))
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let tags: Option<String> = row.get(3)?;
    Ok(Project {
        id: ProjectId(row.get(0)?),
        name: row.get(1)?,
        path: PathBuf::from(row.get::<_, String>(2)?),
        tags: tags.as_deref().map(split_tags).unwrap_or_default(),
        date_added: row.get(4)?,
        last_opened: row.get(5)?,
        is_favorite: row.get::<_, Option<i64>>(6)?.unwrap_or(0) != 0,
        folder_size: FolderSize::from_raw(row.get::<_, Option<i64>>(7)?.unwrap_or(0)),
        is_archived: row.get::<_, Option<i64>>(8)?.unwrap_or(0) != 0,
    })
}
