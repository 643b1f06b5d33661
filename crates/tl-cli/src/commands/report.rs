//! Report command for summing recorded time.
//!
//! This module implements `tl report` with a project filter (defaulting to
//! the selected project), a date range (defaulting to the last seven UTC
//! days) and output formats (human-readable, JSON).

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use clap::Args;
use serde::Serialize;

use tl_core::{Clock, ProjectFilter, Report, ReportQuery, Store, TimeRange, Tracker, format_hms};

use super::util::{RangeBound, day_bound, parse_range_bound, project_label, resolve_project};

/// Days covered by the default range, today included.
const DEFAULT_RANGE_DAYS: i64 = 7;

/// Arguments of `tl report`.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Only count time recorded against this project (defaults to the selected one).
    #[arg(short, long)]
    pub project: Option<String>,

    /// Count time of all projects.
    #[arg(long, conflicts_with = "project")]
    pub all: bool,

    /// Range start: a date (start of day), RFC 3339 timestamp, or "N days ago".
    #[arg(long)]
    pub from: Option<String>,

    /// Range end: a date (end of day), RFC 3339 timestamp, or "N days ago".
    #[arg(long)]
    pub to: Option<String>,

    /// Print only the total, without per-day lines.
    #[arg(long)]
    pub totals_only: bool,

    /// Omit days without recorded time.
    #[arg(long)]
    pub skip_empty: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Translates command arguments into a report query.
pub fn build_query<S: Store, C: Clock>(
    args: &ReportArgs,
    tracker: &Tracker<S, C>,
    now: DateTime<Utc>,
) -> Result<ReportQuery> {
    let filter = match (&args.project, tracker.selected()) {
        (Some(name), _) => ProjectFilter::Project(resolve_project(tracker, name)?.id),
        (None, Some(selected)) if !args.all => ProjectFilter::Project(selected),
        (None, _) => ProjectFilter::All,
    };

    let today = now.date_naive();
    let start = match &args.from {
        Some(from) => parse_range_bound(from, RangeBound::Start, now)?,
        None => day_bound(
            today - Duration::days(DEFAULT_RANGE_DAYS - 1),
            RangeBound::Start,
        )?,
    };
    let end = match &args.to {
        Some(to) => parse_range_bound(to, RangeBound::End, now)?,
        None => day_bound(today, RangeBound::End)?,
    };

    Ok(ReportQuery {
        filter,
        range: TimeRange::new(start, end)?,
        per_day: !args.totals_only,
        include_empty_days: !args.skip_empty,
    })
}

/// Runs the report command.
pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    tracker: &Tracker<S, C>,
    args: &ReportArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let query = build_query(args, tracker, now)?;
    let report = tracker.report(&query)?;

    if args.json {
        let project = match query.filter {
            ProjectFilter::Project(id) => Some(project_label(tracker, id)),
            ProjectFilter::All => None,
        };
        writeln!(writer, "{}", format_report_json(&report, project)?)?;
    } else {
        write!(writer, "{report}")?;
    }
    Ok(())
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    /// Project name, or null when all projects are counted.
    pub project: Option<String>,
    pub range: JsonRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<JsonDay>>,
    pub total_seconds: i64,
    pub total: String,
}

#[derive(Debug, Serialize)]
pub struct JsonRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize)]
pub struct JsonDay {
    pub date: String,
    pub seconds: Option<i64>,
    pub time: Option<String>,
}

/// Formats a report as JSON.
pub fn format_report_json(report: &Report, project: Option<String>) -> Result<String> {
    let json = JsonReport {
        project,
        range: JsonRange {
            start: rfc3339(report.range.start()),
            end: rfc3339(report.range.end()),
        },
        days: report.days.as_ref().map(|days| {
            days.iter()
                .map(|day| JsonDay {
                    date: day.date.format("%Y-%m-%d").to_string(),
                    seconds: day.seconds,
                    time: day.seconds.map(format_hms),
                })
                .collect()
        }),
        total_seconds: report.total_seconds,
        total: format_hms(report.total_seconds),
    };

    Ok(serde_json::to_string_pretty(&json)?)
}

fn rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0).map_or_else(
        || timestamp.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}
