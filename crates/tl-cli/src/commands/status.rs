//! Status command for showing where records live and how many there are.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use tl_core::{Clock, Store, Tracker};

use super::util::project_label;

pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    tracker: &Tracker<S, C>,
    database_path: &Path,
) -> Result<()> {
    let records = tracker.store().interval_count()?;

    writeln!(writer, "Time-Line status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Projects: {}", tracker.projects().len())?;
    match tracker.selected() {
        Some(id) => writeln!(writer, "Selected: {}", project_label(tracker, id))?,
        None => writeln!(writer, "Selected: (none)")?,
    }
    writeln!(writer, "Records: {records}")?;

    Ok(())
}
