//! Project commands: add, list, select and delete.

use std::io::{BufRead, Write};

use anyhow::Result;
use serde::Serialize;

use tl_core::{Clock, Notice, Store, Tracker};

use super::util::resolve_project;

/// Project entry for JSON output.
#[derive(Debug, Serialize)]
pub struct ProjectEntry {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

/// Adds a project, reusing an existing one that matches ignoring case, and selects it.
pub fn add<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    tracker: &mut Tracker<S, C>,
    name: &str,
) -> Result<()> {
    let existed = tracker.projects().find(name).is_some();
    let id = tracker.add_project(name)?;
    let project = resolve_project(tracker, name)?;
    if existed {
        writeln!(writer, "Selected existing project {} (id {id})", project.name)?;
    } else {
        writeln!(writer, "Added project {} (id {id})", project.name)?;
    }
    Ok(())
}

/// Lists projects, marking the selected one.
pub fn list<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    tracker: &Tracker<S, C>,
    json: bool,
) -> Result<()> {
    let selected = tracker.selected();
    if json {
        let entries: Vec<ProjectEntry> = tracker
            .projects()
            .iter()
            .map(|p| ProjectEntry {
                id: p.id.0,
                name: p.name.clone(),
                selected: Some(p.id) == selected,
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if tracker.projects().is_empty() {
        writeln!(writer, "No projects.")?;
        writeln!(writer)?;
        writeln!(writer, "Hint: Run 'tl project add <name>' to create one.")?;
        return Ok(());
    }

    for project in tracker.projects().iter() {
        let marker = if Some(project.id) == selected { '*' } else { ' ' };
        writeln!(writer, "{marker} {} (id {})", project.name, project.id)?;
    }
    Ok(())
}

/// Selects the project `tl start` uses by default.
pub fn select<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    tracker: &mut Tracker<S, C>,
    name: &str,
) -> Result<()> {
    let project = resolve_project(tracker, name)?;
    tracker.select_project(project.id)?;
    writeln!(writer, "Selected project {}", project.name)?;
    Ok(())
}

/// Deletes a project and its records after confirmation.
pub fn delete<R: BufRead, W: Write, S: Store, C: Clock>(
    reader: &mut R,
    writer: &mut W,
    tracker: &mut Tracker<S, C>,
    name: &str,
    yes: bool,
) -> Result<()> {
    let project = resolve_project(tracker, name)?;

    if !yes {
        write!(
            writer,
            "Delete project {} and all of its records? [y/N] ",
            project.name
        )?;
        writer.flush()?;
        let mut answer = String::new();
        reader.read_line(&mut answer)?;
        if !matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            writeln!(writer, "Cancelled.")?;
            return Ok(());
        }
    }

    let removed = tracker.delete_project(Some(project.id))?;
    for notice in tracker.take_notices() {
        if let Notice::Error(message) = notice {
            writeln!(writer, "error: {message}")?;
        }
    }
    writeln!(
        writer,
        "Deleted project {} and {removed} record(s).",
        project.name
    )?;
    Ok(())
}
