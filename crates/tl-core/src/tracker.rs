//! Session controller.
//!
//! [`Tracker`] owns the store handle, the clock, the project list and the
//! current [`SessionState`]. The shell calls into it for every user action
//! and once per tick while a session runs; it reads back [`Notice`]s for
//! live elapsed time and for failures that happened outside a direct call.

use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::project::ProjectList;
use crate::report::{Report, ReportQuery, generate_report};
use crate::session::{ActiveSession, DEFAULT_CHECKPOINT_INTERVAL_SECS, Notice, SessionState};
use crate::store::{LAST_PROJECT_SETTING, Store, StoreError};
use crate::types::{Interval, IntervalId, ProjectId, ProjectName, ValidationError};

/// Errors returned by [`Tracker`] operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no projects exist; add a project first")]
    NoProjects,
    #[error("unknown project id {0}")]
    UnknownProject(ProjectId),
    #[error("a session is already running")]
    AlreadyRunning,
    #[error("failed to write to the store: {0}")]
    StoreWrite(#[source] StoreError),
    #[error("failed to read from the store: {0}")]
    StoreRead(#[source] StoreError),
}

/// Tunables for the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    /// Minimum seconds between checkpoint writes; values below 1 are raised to 1.
    pub checkpoint_interval_secs: i64,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            checkpoint_interval_secs: DEFAULT_CHECKPOINT_INTERVAL_SECS,
        }
    }
}

/// Controller for projects, timing sessions and reports.
pub struct Tracker<S, C = SystemClock> {
    store: S,
    clock: C,
    projects: ProjectList,
    selected: Option<ProjectId>,
    state: SessionState,
    checkpoint_interval: i64,
    notices: Vec<Notice>,
}

impl<S: Store, C: Clock> Tracker<S, C> {
    /// Loads projects and the last selection from the store.
    pub fn new(store: S, clock: C, options: TrackerOptions) -> Result<Self, TrackerError> {
        let mut tracker = Self {
            store,
            clock,
            projects: ProjectList::default(),
            selected: None,
            state: SessionState::Idle,
            checkpoint_interval: options.checkpoint_interval_secs.max(1),
            notices: Vec::new(),
        };
        tracker.reload_projects()?;
        tracker.selected = tracker.load_last_selection()?;
        Ok(tracker)
    }

    pub const fn projects(&self) -> &ProjectList {
        &self.projects
    }

    pub const fn selected(&self) -> Option<ProjectId> {
        self.selected
    }

    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    pub const fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Seconds elapsed in the running session, if any.
    pub fn elapsed(&self) -> Option<i64> {
        self.state
            .active()
            .map(|session| session.elapsed(self.clock.now()))
    }

    /// Drains queued notices in the order they were raised.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Adds a project, or reuses one whose name matches ignoring case, and selects it.
    pub fn add_project(&mut self, name: &str) -> Result<ProjectId, TrackerError> {
        let name = ProjectName::new(name)?;
        let existing = self
            .store
            .find_project(name.as_str())
            .map_err(TrackerError::StoreRead)?;
        let id = match existing {
            Some(project) => {
                tracing::debug!(id = %project.id, name = %project.name, "project already exists");
                project.id
            }
            None => {
                let id = self
                    .store
                    .insert_project(&name)
                    .map_err(TrackerError::StoreWrite)?;
                tracing::info!(%id, %name, "added project");
                id
            }
        };
        self.reload_projects()?;
        self.select_project(id)?;
        Ok(id)
    }

    /// Selects a project and remembers the choice for the next run.
    pub fn select_project(&mut self, id: ProjectId) -> Result<(), TrackerError> {
        if !self.projects.contains(id) {
            return Err(TrackerError::UnknownProject(id));
        }
        self.store
            .put_setting(LAST_PROJECT_SETTING, &id.to_string())
            .map_err(TrackerError::StoreWrite)?;
        self.selected = Some(id);
        Ok(())
    }

    /// Deletes a project with all of its intervals.
    ///
    /// `None` means nothing is selected and is ignored. A session running on
    /// the project is stopped first. Returns the number of intervals removed.
    pub fn delete_project(&mut self, id: Option<ProjectId>) -> Result<usize, TrackerError> {
        let Some(id) = id else {
            return Ok(0);
        };
        if !self.projects.contains(id) {
            return Err(TrackerError::UnknownProject(id));
        }
        if self.state.active().is_some_and(|s| s.project_id == id) {
            self.force_stop();
        }

        let removed = self
            .store
            .delete_project(id)
            .map_err(TrackerError::StoreWrite)?;
        tracing::info!(%id, removed, "deleted project");
        self.reload_projects()?;

        if self.selected == Some(id) {
            self.selected = None;
            if let Some(first) = self.projects.first().map(|p| p.id) {
                self.select_project(first)?;
            }
        }
        Ok(removed)
    }

    /// Starts a session on the selected project, or on the first one if none is selected.
    pub fn start(&mut self) -> Result<IntervalId, TrackerError> {
        let project = self
            .selected
            .or_else(|| self.projects.first().map(|p| p.id))
            .ok_or(TrackerError::NoProjects)?;
        self.start_session(project)
    }

    /// Starts a session on `project`, inserting its interval row.
    ///
    /// If the insert fails the tracker stays idle.
    pub fn start_session(&mut self, project: ProjectId) -> Result<IntervalId, TrackerError> {
        if self.state.is_running() {
            return Err(TrackerError::AlreadyRunning);
        }
        if self.projects.is_empty() {
            return Err(TrackerError::NoProjects);
        }
        if !self.projects.contains(project) {
            return Err(TrackerError::UnknownProject(project));
        }

        let now = self.clock.now();
        match self.store.insert_interval(project, now) {
            Ok(interval_id) => {
                self.state = SessionState::Running(ActiveSession {
                    interval_id,
                    project_id: project,
                    start: now,
                    last_write: now,
                });
                tracing::info!(%project, %interval_id, start = now, "session started");
                Ok(interval_id)
            }
            Err(err) => {
                self.state = SessionState::Idle;
                tracing::warn!(%project, error = %err, "failed to record session start");
                Err(TrackerError::StoreWrite(err))
            }
        }
    }

    /// Advances a running session by one tick.
    ///
    /// Emits [`Notice::Elapsed`] and writes a checkpoint when one is due. A
    /// failed checkpoint stops the session and emits [`Notice::Error`].
    /// Returns the elapsed seconds, or `None` when idle.
    pub fn tick(&mut self) -> Option<i64> {
        let SessionState::Running(session) = self.state else {
            return None;
        };
        let now = self.clock.now();
        let elapsed = session.elapsed(now);
        self.notices.push(Notice::Elapsed(elapsed));

        if session.checkpoint_due(now, self.checkpoint_interval) {
            match self.write_interval(&session, now) {
                Ok(_) => {
                    tracing::debug!(interval_id = %session.interval_id, elapsed, "checkpoint");
                    self.state = SessionState::Running(ActiveSession {
                        last_write: now,
                        ..session
                    });
                }
                Err(err) => {
                    self.state = SessionState::Idle;
                    tracing::warn!(interval_id = %session.interval_id, error = %err, "checkpoint failed");
                    self.notices.push(Notice::Error(format!(
                        "checkpoint failed, session stopped: {err}"
                    )));
                }
            }
        }
        Some(elapsed)
    }

    /// Stops the running session with a final write.
    ///
    /// The tracker is idle afterwards even when the write fails. Returns the
    /// interval as persisted, or `None` when no session was running.
    pub fn stop_session(&mut self) -> Result<Option<Interval>, TrackerError> {
        let SessionState::Running(session) = self.state else {
            return Ok(None);
        };
        self.state = SessionState::Idle;
        let now = self.clock.now();
        let interval = self
            .write_interval(&session, now)
            .map_err(TrackerError::StoreWrite)?;
        tracing::info!(
            interval_id = %interval.id,
            duration = interval.duration,
            "session stopped"
        );
        Ok(Some(interval))
    }

    /// Stops any running session on shutdown; failures become notices.
    pub fn close(&mut self) {
        self.force_stop();
    }

    /// Builds a structured report.
    pub fn report(&self, query: &ReportQuery) -> Result<Report, TrackerError> {
        generate_report(&self.store, query).map_err(TrackerError::StoreRead)
    }

    /// Builds a report rendered as text.
    pub fn generate_report(&self, query: &ReportQuery) -> Result<String, TrackerError> {
        self.report(query).map(|report| report.to_string())
    }

    fn force_stop(&mut self) {
        if let Err(err) = self.stop_session() {
            tracing::warn!(error = %err, "final session write failed");
            self.notices.push(Notice::Error(err.to_string()));
        }
    }

    fn write_interval(&mut self, session: &ActiveSession, now: i64) -> Result<Interval, StoreError> {
        let end = session.end_at(now);
        let duration = end - session.start;
        self.store
            .update_interval(session.interval_id, end, duration)?;
        Ok(Interval {
            id: session.interval_id,
            project_id: session.project_id,
            start: session.start,
            end,
            duration,
        })
    }

    fn reload_projects(&mut self) -> Result<(), TrackerError> {
        let projects = self
            .store
            .list_projects()
            .map_err(TrackerError::StoreRead)?;
        self.projects = ProjectList::new(projects);
        Ok(())
    }

    fn load_last_selection(&self) -> Result<Option<ProjectId>, TrackerError> {
        let Some(raw) = self
            .store
            .setting(LAST_PROJECT_SETTING)
            .map_err(TrackerError::StoreRead)?
        else {
            return Ok(None);
        };
        let selected = raw
            .trim()
            .parse::<i64>()
            .ok()
            .map(ProjectId)
            .filter(|id| self.projects.contains(*id));
        if selected.is_none() {
            tracing::debug!(value = %raw, "ignoring stale last project setting");
        }
        Ok(selected)
    }
}
