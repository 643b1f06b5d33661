//! Core domain logic for the Time-Line tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Sessions: the start/tick/stop state machine with periodic checkpoints
//! - Reports: per-day and total aggregation of recorded intervals
//! - Storage: the [`Store`] trait that backends implement

pub mod clock;
pub mod format;
pub mod project;
pub mod report;
pub mod session;
pub mod store;
mod tracker;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use format::format_hms;
pub use project::ProjectList;
pub use report::{DayTotal, Report, ReportQuery, build_report, generate_report};
pub use session::{ActiveSession, DEFAULT_CHECKPOINT_INTERVAL_SECS, Notice, SessionState};
pub use store::{LAST_PROJECT_SETTING, Store, StoreError, StoreResult};
pub use tracker::{Tracker, TrackerError, TrackerOptions};
pub use types::{
    Interval, IntervalId, Project, ProjectFilter, ProjectId, ProjectName, TimeRange,
    ValidationError,
};
