//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use regex::Regex;

use tl_core::{Clock, Project, ProjectId, Store, Tracker};

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Which end of a range a date argument describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    /// A bare date means 00:00:00 of that day.
    Start,
    /// A bare date means 23:59:59 of that day.
    End,
}

/// Parse a datetime string as either ISO 8601 or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    // Try ISO 8601 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use a date (e.g., 2026-01-15), ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 days ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    // Safe to create Duration now that we've validated the range
    let duration = Duration::minutes(n * minutes_per_unit);
    Ok(now - duration)
}

/// Parse a range argument into unix seconds.
///
/// A bare `YYYY-MM-DD` date expands to the start or end of that UTC day;
/// anything else goes through [`parse_datetime`].
pub fn parse_range_bound(s: &str, bound: RangeBound, now: DateTime<Utc>) -> anyhow::Result<i64> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return day_bound(date, bound);
    }
    Ok(parse_datetime(s, now)?.timestamp())
}

/// Unix seconds of the first or last second of a UTC day.
pub fn day_bound(date: NaiveDate, bound: RangeBound) -> anyhow::Result<i64> {
    let time = match bound {
        RangeBound::Start => NaiveTime::MIN,
        RangeBound::End => {
            NaiveTime::from_hms_opt(23, 59, 59).context("invalid end-of-day time")?
        }
    };
    Ok(date.and_time(time).and_utc().timestamp())
}

/// Resolve a project name to its entry, ignoring case.
pub fn resolve_project<S: Store, C: Clock>(
    tracker: &Tracker<S, C>,
    name: &str,
) -> anyhow::Result<Project> {
    tracker
        .projects()
        .find(name)
        .cloned()
        .with_context(|| format!("project not found: {}", name.trim()))
}

/// Display name of a project id, falling back to the id itself.
pub fn project_label<S: Store, C: Clock>(tracker: &Tracker<S, C>, id: ProjectId) -> String {
    tracker
        .projects()
        .get(id)
        .map_or_else(|| format!("#{id}"), |p| p.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 29, 16, 0, 0).unwrap()
    }

    #[test]
    fn parses_rfc3339() {
        let parsed = parse_datetime("2025-01-01T10:30:00Z", now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_relative_time() {
        let parsed = parse_datetime("2 days ago", now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 27, 16, 0, 0).unwrap());
        let parsed = parse_datetime("1 hour ago", now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 29, 15, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("yesterday-ish", now()).is_err());
        assert!(parse_datetime("999999999 weeks ago", now()).is_err());
    }

    #[test]
    fn bare_dates_expand_to_day_bounds() {
        let start = parse_range_bound("2025-01-01", RangeBound::Start, now()).unwrap();
        let end = parse_range_bound("2025-01-01", RangeBound::End, now()).unwrap();
        assert_eq!(start, 1_735_689_600);
        assert_eq!(end, 1_735_689_600 + 86_399);
    }

    #[test]
    fn timestamps_pass_through_bounds() {
        let start =
            parse_range_bound("2025-01-01T00:00:10Z", RangeBound::Start, now()).unwrap();
        assert_eq!(start, 1_735_689_610);
    }
}
