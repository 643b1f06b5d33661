//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum project name length, matching the `VARCHAR(255)` column.
pub const MAX_PROJECT_NAME_LEN: usize = 255;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty after trimming.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The provided value exceeds the storable length.
    #[error("{field} cannot be longer than {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// A range ends before it starts.
    #[error("range end {end} is before range start {start}")]
    InvertedRange { start: i64, end: i64 },
}

/// Store-assigned identity of a project row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned identity of an interval row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalId(pub i64);

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A trimmed, non-empty project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectName(String);

impl ProjectName {
    /// Creates a project name after trimming surrounding whitespace.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "project name",
            });
        }
        if trimmed.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "project name",
                max: MAX_PROJECT_NAME_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectName> for String {
    fn from(name: ProjectName) -> Self {
        name.0
    }
}

/// A named project that intervals are recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

/// One recorded stretch of work on a project.
///
/// Timestamps are unix seconds in UTC. `duration` always equals
/// `end - start` once the row has been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub id: IntervalId,
    pub project_id: ProjectId,
    pub start: i64,
    pub end: i64,
    pub duration: i64,
}

/// Which projects a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum ProjectFilter {
    /// Every project.
    #[default]
    All,
    /// A single project.
    Project(ProjectId),
}

impl ProjectFilter {
    /// Returns true when the filter admits intervals of `project`.
    pub fn matches(self, project: ProjectId) -> bool {
        match self {
            Self::All => true,
            Self::Project(id) => id == project,
        }
    }
}

/// Inclusive range of unix-second timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Creates a range, rejecting one that ends before it starts.
    pub const fn new(start: i64, end: i64) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn start(&self) -> i64 {
        self.start
    }

    pub const fn end(&self) -> i64 {
        self.end
    }

    /// Returns true when `[start, end]` shares at least one instant with this range.
    pub const fn overlaps(&self, start: i64, end: i64) -> bool {
        start <= self.end && end >= self.start
    }
}

/// Unchecked wire form of [`TimeRange`].
#[derive(Deserialize)]
struct RawTimeRange {
    start: i64,
    end: i64,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = ValidationError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}
