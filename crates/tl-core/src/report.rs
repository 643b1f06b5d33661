//! Report engine: aggregates stored intervals into per-day and total durations.
//!
//! Days are UTC calendar days keyed by each interval's start timestamp.
//! An interval that overlaps the range is counted in full, even when it
//! started before `range_start` or ends after `range_end`.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::format::format_hms;
use crate::store::{Store, StoreResult};
use crate::types::{Interval, ProjectFilter, TimeRange};

/// Seconds in one UTC day.
pub const SECONDS_PER_DAY: i64 = 86_400;

const SEPARATOR_WIDTH: usize = 36;

/// Parameters of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    pub filter: ProjectFilter,
    pub range: TimeRange,
    /// Emit one line per day before the total.
    pub per_day: bool,
    /// With `per_day`, also emit days without recorded time.
    pub include_empty_days: bool,
}

/// Summed time for one UTC day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    /// `None` when nothing was recorded on that day.
    pub seconds: Option<i64>,
}

/// Aggregated report ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub filter: ProjectFilter,
    pub range: TimeRange,
    /// Per-day lines, absent when the query did not ask for them.
    pub days: Option<Vec<DayTotal>>,
    pub total_seconds: i64,
}

/// Queries the store and aggregates the matching intervals.
pub fn generate_report<S: Store + ?Sized>(store: &S, query: &ReportQuery) -> StoreResult<Report> {
    let intervals = store.intervals_overlapping(query.filter, query.range)?;
    tracing::debug!(
        matched = intervals.len(),
        start = query.range.start(),
        end = query.range.end(),
        "aggregating report"
    );
    Ok(build_report(&intervals, query))
}

/// Aggregates already-selected intervals.
///
/// Callers pass the intervals that overlap `query.range`; this function does
/// not filter them again.
pub fn build_report(intervals: &[Interval], query: &ReportQuery) -> Report {
    let mut by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut total_seconds = 0;
    for interval in intervals {
        total_seconds += interval.duration;
        if let Some(day) = utc_day(interval.start) {
            *by_day.entry(day).or_default() += interval.duration;
        }
    }

    let days = query.per_day.then(|| {
        if query.include_empty_days {
            calendar_days(query.range)
                .into_iter()
                .map(|date| DayTotal {
                    date,
                    seconds: by_day.get(&date).copied(),
                })
                .collect()
        } else {
            by_day
                .iter()
                .map(|(date, seconds)| DayTotal {
                    date: *date,
                    seconds: Some(*seconds),
                })
                .collect()
        }
    });

    Report {
        filter: query.filter,
        range: query.range,
        days,
        total_seconds,
    }
}

/// Days visited by stepping one day at a time from the range start while
/// strictly before the range end.
fn calendar_days(range: TimeRange) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut cursor = range.start();
    while cursor < range.end() {
        let Some(day) = utc_day(cursor) else { break };
        days.push(day);
        let Some(next) = cursor.checked_add(SECONDS_PER_DAY) else {
            break;
        };
        cursor = next;
    }
    days
}

fn utc_day(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(days) = &self.days {
            for day in days {
                match day.seconds {
                    Some(seconds) => writeln!(f, "{}: {}", day.date, format_hms(seconds))?,
                    None => writeln!(f, "{}: none", day.date)?,
                }
            }
            writeln!(f, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        }
        writeln!(f, "Total time: {}", format_hms(self.total_seconds))?;
        writeln!(f)?;
        writeln!(f, "Dates are in UTC")
    }
}
