//! Persistence interface consumed by the session controller and report engine.

use thiserror::Error;

use crate::types::{Interval, IntervalId, Project, ProjectFilter, ProjectId, ProjectName, TimeRange};

/// Setting key that remembers the last selected project id.
pub const LAST_PROJECT_SETTING: &str = "last_project";

/// Errors surfaced by a [`Store`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update targeted an interval row that no longer exists.
    #[error("interval {0} not found")]
    MissingInterval(IntervalId),
    /// The backing database rejected the operation.
    #[error("database error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl StoreError {
    /// Wraps a backend-specific error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage for projects, intervals and settings.
///
/// Every write is committed before the call returns. Name lookups for
/// projects and settings ignore ASCII case.
pub trait Store {
    /// Lists all projects ordered by name, ignoring case.
    fn list_projects(&self) -> StoreResult<Vec<Project>>;

    /// Finds a project by name, ignoring case.
    fn find_project(&self, name: &str) -> StoreResult<Option<Project>>;

    /// Inserts a project and returns its id.
    fn insert_project(&mut self, name: &ProjectName) -> StoreResult<ProjectId>;

    /// Deletes a project's intervals and then the project itself.
    ///
    /// Returns the number of intervals removed.
    fn delete_project(&mut self, id: ProjectId) -> StoreResult<usize>;

    /// Inserts an open interval with `end == start` and zero duration.
    fn insert_interval(&mut self, project: ProjectId, start: i64) -> StoreResult<IntervalId>;

    /// Rewrites the end and duration of an existing interval.
    fn update_interval(&mut self, id: IntervalId, end: i64, duration: i64) -> StoreResult<()>;

    /// Lists intervals admitted by `filter` whose span overlaps `range`, ordered by start.
    fn intervals_overlapping(
        &self,
        filter: ProjectFilter,
        range: TimeRange,
    ) -> StoreResult<Vec<Interval>>;

    /// Counts all stored intervals.
    fn interval_count(&self) -> StoreResult<usize>;

    /// Reads a setting value.
    fn setting(&self, name: &str) -> StoreResult<Option<String>>;

    /// Inserts or overwrites a setting value.
    fn put_setting(&mut self, name: &str, value: &str) -> StoreResult<()>;
}
