//! Timing session state.

use crate::types::{IntervalId, ProjectId};

/// Default number of seconds between checkpoint writes of a running session.
pub const DEFAULT_CHECKPOINT_INTERVAL_SECS: i64 = 60;

/// An open session backed by one interval row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSession {
    pub interval_id: IntervalId,
    pub project_id: ProjectId,
    pub start: i64,
    /// Time of the insert or the most recent checkpoint write.
    pub last_write: i64,
}

impl ActiveSession {
    /// Seconds elapsed at `now`, never negative.
    pub const fn elapsed(&self, now: i64) -> i64 {
        let elapsed = now - self.start;
        if elapsed < 0 { 0 } else { elapsed }
    }

    /// End timestamp to persist at `now`, clamped so it never precedes `start`.
    pub const fn end_at(&self, now: i64) -> i64 {
        if now < self.start { self.start } else { now }
    }

    /// Whether a checkpoint is due at `now`.
    pub const fn checkpoint_due(&self, now: i64, interval: i64) -> bool {
        now - self.last_write >= interval
    }
}

/// Whether a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Running(ActiveSession),
}

impl SessionState {
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub const fn active(&self) -> Option<&ActiveSession> {
        match self {
            Self::Idle => None,
            Self::Running(session) => Some(session),
        }
    }
}

/// Messages for the shell produced while the controller runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Seconds elapsed in the running session, emitted on every tick.
    Elapsed(i64),
    /// A recoverable failure the user should see.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(start: i64) -> ActiveSession {
        ActiveSession {
            interval_id: IntervalId(1),
            project_id: ProjectId(1),
            start,
            last_write: start,
        }
    }

    #[test]
    fn elapsed_is_clamped() {
        let s = session(1000);
        assert_eq!(s.elapsed(1125), 125);
        assert_eq!(s.elapsed(900), 0);
    }

    #[test]
    fn end_never_precedes_start() {
        let s = session(1000);
        assert_eq!(s.end_at(1010), 1010);
        assert_eq!(s.end_at(990), 1000);
    }

    #[test]
    fn checkpoint_due_after_interval() {
        let s = session(1000);
        assert!(!s.checkpoint_due(1059, 60));
        assert!(s.checkpoint_due(1060, 60));
    }

    #[test]
    fn default_state_is_idle() {
        let state = SessionState::default();
        assert!(!state.is_running());
        assert!(state.active().is_none());
    }
}
