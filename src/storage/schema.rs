//! Table definition and in-place upgrades for older databases

use rusqlite::Connection;
use std::collections::HashSet;

const CREATE_PROJECTS_SQL: &str = "
    CREATE TABLE IF NOT EXISTS projects (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        path        TEXT UNIQUE NOT NULL,
        tags        TEXT DEFAULT '',
        dateAdded   DATETIME DEFAULT CURRENT_TIMESTAMP,
        lastOpened  DATETIME,
        isFavorite  INTEGER DEFAULT 0,
        folderSize  INTEGER DEFAULT 0,
        isArchived  INTEGER DEFAULT 0
    );
";

/// Columns added after the first release, with the DDL that adds them
const ADDED_COLUMNS: &[(&str, &str)] = &[
    (
        "folderSize",
        "ALTER TABLE projects ADD COLUMN folderSize INTEGER DEFAULT 0",
    ),
    (
        "isArchived",
        "ALTER TABLE projects ADD COLUMN isArchived INTEGER DEFAULT 0",
    ),
];

/// Pragmas for file-backed databases
pub(super) fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )
}

fn existing_columns(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("PRAGMA table_info(projects)")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(names)
}

/// Create the table if missing and add any columns an older file lacks
pub(super) fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_PROJECTS_SQL)?;

    let columns = existing_columns(conn)?;
    for (name, ddl) in ADDED_COLUMNS {
        if !columns.contains(*name) {
            log::info!("Upgrading projects table: adding column {}", name);
            conn.execute(ddl, [])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let columns = existing_columns(&conn).unwrap();
        for name in [
            "id", "name", "path", "tags", "dateAdded", "lastOpened", "isFavorite", "folderSize",
            "isArchived",
        ] {
            assert!(columns.contains(name), "missing column {}", name);
        }
    }

    #[test]
    fn test_migrate_adds_missing_columns() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                path TEXT UNIQUE NOT NULL,
                tags TEXT DEFAULT '',
                dateAdded DATETIME DEFAULT CURRENT_TIMESTAMP,
                lastOpened DATETIME,
                isFavorite INTEGER DEFAULT 0
            );
            INSERT INTO projects (name, path) VALUES ('old', '/old');",
        )
        .unwrap();

        migrate(&conn).unwrap();

        let (size, archived): (i64, i64) = conn
            .query_row(
                "SELECT folderSize, isArchived FROM projects WHERE path = '/old'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(size, 0);
        assert_eq!(archived, 0);
    }

    #[test]
    fn test_migrate_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
    }
}
