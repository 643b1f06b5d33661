//! Storage layer for the Time-Line tracker.
//!
//! Provides persistence for projects, intervals and settings using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The tracker drives it from a single thread; it is opened once at startup
//! and closed when dropped.
//!
//! # Schema
//!
//! Three tables, each identified by SQLite's implicit `rowid`:
//!
//! - `times(project_id, date_start, date_end, duration)`: one row per session.
//!   Timestamps are unix seconds in UTC and `duration = date_end - date_start`.
//! - `projects(name)`: names are unique ignoring ASCII case, enforced on insert
//!   by the tracker rather than by a constraint.
//! - `settings(name, value)`: key/value pairs, looked up ignoring ASCII case.
//!
//! Deleting a project removes its `times` rows first and then the project row,
//! inside one transaction. There are no foreign keys.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use tl_core::{
    Interval, IntervalId, Project, ProjectFilter, ProjectId, ProjectName, Store, StoreError,
    StoreResult, TimeRange,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The file could not be used as a database at all.
    #[error("database is unusable: {0}")]
    Unusable(#[source] rusqlite::Error),
    /// An update targeted an interval that does not exist.
    #[error("interval {0} not found")]
    MissingInterval(IntervalId),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::MissingInterval(id) => Self::MissingInterval(id),
            other => Self::backend(other),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for the schema.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// A throwaway table is created and dropped first so an unreadable file
    /// fails here instead of on the first real write. This is idempotent -
    /// safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS probe (name VARCHAR(255));
                DROP TABLE IF EXISTS probe;
                ",
            )
            .map_err(DbError::Unusable)?;

        self.conn.execute_batch(
            "
            PRAGMA encoding = 'UTF-8';

            -- times: one row per session, unix seconds UTC
            CREATE TABLE IF NOT EXISTS times (
                project_id INTEGER,
                date_start INTEGER,
                date_end INTEGER,
                duration INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_times_project ON times(project_id);
            CREATE INDEX IF NOT EXISTS idx_times_start ON times(date_start);

            CREATE TABLE IF NOT EXISTS projects (
                name VARCHAR(255)
            );

            CREATE TABLE IF NOT EXISTS settings (
                name VARCHAR(255),
                value VARCHAR(255)
            );
            ",
        )?;
        Ok(())
    }

    /// Lists all projects ordered by name, ignoring case.
    pub fn list_projects(&self) -> Result<Vec<Project>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT rowid, name
            FROM projects
            ORDER BY name COLLATE NOCASE ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Project {
                id: ProjectId(row.get(0)?),
                name: row.get(1)?,
            })
        })?;
        let mut projects = Vec::new();
        for row in rows {
            projects.push(row?);
        }
        Ok(projects)
    }

    /// Finds a project by name, ignoring case.
    pub fn find_project(&self, name: &str) -> Result<Option<Project>, DbError> {
        let project = self
            .conn
            .query_row(
                "
                SELECT rowid, name
                FROM projects
                WHERE name = ?1 COLLATE NOCASE
                ORDER BY rowid ASC
                LIMIT 1
                ",
                params![name],
                |row| {
                    Ok(Project {
                        id: ProjectId(row.get(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(project)
    }

    /// Inserts a project and returns its row id.
    pub fn insert_project(&mut self, name: &ProjectName) -> Result<ProjectId, DbError> {
        self.conn.execute(
            "INSERT INTO projects (name) VALUES (?1)",
            params![name.as_str()],
        )?;
        Ok(ProjectId(self.conn.last_insert_rowid()))
    }

    /// Deletes a project's intervals, then the project.
    ///
    /// Returns the number of intervals removed.
    pub fn delete_project(&mut self, id: ProjectId) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM times WHERE project_id = ?1", params![id.0])?;
        tx.execute("DELETE FROM projects WHERE rowid = ?1", params![id.0])?;
        tx.commit()?;
        Ok(removed)
    }

    /// Inserts an open interval starting and ending at `start`.
    pub fn insert_interval(&mut self, project: ProjectId, start: i64) -> Result<IntervalId, DbError> {
        self.conn.execute(
            "
            INSERT INTO times (project_id, date_start, date_end, duration)
            VALUES (?1, ?2, ?2, 0)
            ",
            params![project.0, start],
        )?;
        let id = IntervalId(self.conn.last_insert_rowid());
        tracing::debug!(%id, %project, start, "inserted interval");
        Ok(id)
    }

    /// Rewrites an interval's end and duration.
    pub fn update_interval(
        &mut self,
        id: IntervalId,
        end: i64,
        duration: i64,
    ) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "
            UPDATE times
            SET date_end = ?1, duration = ?2
            WHERE rowid = ?3
            ",
            params![end, duration, id.0],
        )?;
        if changed == 0 {
            return Err(DbError::MissingInterval(id));
        }
        tracing::debug!(%id, end, duration, "updated interval");
        Ok(())
    }

    /// Lists intervals overlapping an inclusive range, ordered by start.
    ///
    /// An interval overlaps when `date_start <= range.end` and
    /// `date_end >= range.start`.
    pub fn intervals_overlapping(
        &self,
        filter: ProjectFilter,
        range: TimeRange,
    ) -> Result<Vec<Interval>, DbError> {
        let project: Option<i64> = match filter {
            ProjectFilter::All => None,
            ProjectFilter::Project(id) => Some(id.0),
        };
        let mut stmt = self.conn.prepare(
            "
            SELECT rowid, project_id, date_start, date_end, duration
            FROM times
            WHERE (?1 IS NULL OR project_id = ?1)
              AND date_start <= ?3
              AND date_end >= ?2
            ORDER BY date_start ASC, rowid ASC
            ",
        )?;
        let rows = stmt.query_map(params![project, range.start(), range.end()], |row| {
            Ok(Interval {
                id: IntervalId(row.get(0)?),
                project_id: ProjectId(row.get(1)?),
                start: row.get(2)?,
                end: row.get(3)?,
                duration: row.get(4)?,
            })
        })?;
        let mut intervals = Vec::new();
        for row in rows {
            intervals.push(row?);
        }
        Ok(intervals)
    }

    /// Counts stored intervals.
    pub fn interval_count(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM times", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Reads a setting, ignoring case in the key.
    pub fn setting(&self, name: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row(
                "
                SELECT value
                FROM settings
                WHERE name = ?1 COLLATE NOCASE
                ORDER BY rowid ASC
                LIMIT 1
                ",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Overwrites a setting in place, inserting it when absent.
    pub fn put_setting(&mut self, name: &str, value: &str) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE settings SET value = ?2 WHERE name = ?1 COLLATE NOCASE",
            params![name, value],
        )?;
        if changed == 0 {
            tx.execute(
                "INSERT INTO settings (name, value) VALUES (?1, ?2)",
                params![name, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl Store for Database {
    fn list_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(Self::list_projects(self)?)
    }

    fn find_project(&self, name: &str) -> StoreResult<Option<Project>> {
        Ok(Self::find_project(self, name)?)
    }

    fn insert_project(&mut self, name: &ProjectName) -> StoreResult<ProjectId> {
        Ok(Self::insert_project(self, name)?)
    }

    fn delete_project(&mut self, id: ProjectId) -> StoreResult<usize> {
        Ok(Self::delete_project(self, id)?)
    }

    fn insert_interval(&mut self, project: ProjectId, start: i64) -> StoreResult<IntervalId> {
        Ok(Self::insert_interval(self, project, start)?)
    }

    fn update_interval(&mut self, id: IntervalId, end: i64, duration: i64) -> StoreResult<()> {
        Ok(Self::update_interval(self, id, end, duration)?)
    }

    fn intervals_overlapping(
        &self,
        filter: ProjectFilter,
        range: TimeRange,
    ) -> StoreResult<Vec<Interval>> {
        Ok(Self::intervals_overlapping(self, filter, range)?)
    }

    fn interval_count(&self) -> StoreResult<usize> {
        Ok(Self::interval_count(self)?)
    }

    fn setting(&self, name: &str) -> StoreResult<Option<String>> {
        Ok(Self::setting(self, name)?)
    }

    fn put_setting(&mut self, name: &str, value: &str) -> StoreResult<()> {
        Ok(Self::put_setting(self, name, value)?)
    }
}
