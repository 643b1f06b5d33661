//! Start command: times a session in the foreground.
//!
//! The main thread owns the tracker and waits on a channel with a timeout.
//! Every timeout is a tick; a [`ShellEvent::Stop`] (or the sender hanging up)
//! ends the session. Helper threads only read stdin or wait for termination
//! signals and forward `Stop`.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use chrono::DateTime;

use tl_core::{Clock, Notice, Store, Tracker, format_hms};

use super::util::{project_label, resolve_project};

/// Interval between ticks of a running session.
pub const TICK: Duration = Duration::from_secs(1);

/// Events the shell forwards to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    Stop,
}

/// Spawns the threads that feed [`ShellEvent::Stop`] into the session loop.
///
/// Stop is sent once stdin yields a line or closes, and on SIGINT, SIGTERM
/// or SIGHUP so closing the terminal still gets the final write.
pub fn spawn_stop_listeners() -> Result<Receiver<ShellEvent>> {
    let (tx, rx) = mpsc::channel();
    spawn_signal_listener(tx.clone())?;
    spawn_stdin_listener(tx);
    Ok(rx)
}

fn spawn_stdin_listener(tx: Sender<ShellEvent>) {
    thread::spawn(move || {
        let mut line = String::new();
        if let Err(err) = io::stdin().lock().read_line(&mut line) {
            tracing::debug!(error = %err, "stdin read failed");
        }
        // The receiver may already be gone if the session stopped on its own.
        let _ = tx.send(ShellEvent::Stop);
    });
}

#[cfg(unix)]
fn spawn_signal_listener(tx: Sender<ShellEvent>) -> Result<()> {
    use anyhow::Context;
    use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;
    thread::spawn(move || {
        for signal in signals.forever() {
            tracing::debug!(signal, "termination signal received");
            if tx.send(ShellEvent::Stop).is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_signal_listener(_tx: Sender<ShellEvent>) -> Result<()> {
    Ok(())
}

/// Runs a session until a stop event arrives.
///
/// A checkpoint failure ends the session early; the error is printed and
/// the command still succeeds.
pub fn run<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    tracker: &mut Tracker<S, C>,
    project: Option<&str>,
    events: &Receiver<ShellEvent>,
    tick: Duration,
) -> Result<()> {
    match project {
        Some(name) => {
            let project = resolve_project(tracker, name)?;
            tracker.start_session(project.id)?;
        }
        None => {
            tracker.start()?;
        }
    }

    let Some(session) = tracker.state().active().copied() else {
        anyhow::bail!("session did not start");
    };
    let label = project_label(tracker, session.project_id);
    let started = DateTime::from_timestamp(session.start, 0).map_or_else(
        || session.start.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    writeln!(writer, "Started {label} at {started}. Press Enter to stop.")?;
    writer.flush()?;

    let mut ticked = false;
    loop {
        match events.recv_timeout(tick) {
            Ok(ShellEvent::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                tracker.tick();
                ticked = true;
                write_notices(writer, tracker)?;
                if !tracker.is_running() {
                    return Ok(());
                }
            }
        }
    }

    if ticked {
        writeln!(writer)?;
    }
    if let Some(interval) = tracker.stop_session()? {
        writeln!(
            writer,
            "Stopped {label} after {}.",
            format_hms(interval.duration)
        )?;
    }
    Ok(())
}

fn write_notices<W: Write, S: Store, C: Clock>(
    writer: &mut W,
    tracker: &mut Tracker<S, C>,
) -> Result<()> {
    for notice in tracker.take_notices() {
        match notice {
            Notice::Elapsed(seconds) => write!(writer, "\r{}", format_hms(seconds))?,
            Notice::Error(message) => writeln!(writer, "\nerror: {message}")?,
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use insta::assert_snapshot;
    use tl_core::{ManualClock, ProjectFilter, TimeRange, TrackerOptions};
    use tl_db::Database;

    /// Clock that moves forward by a fixed step every time it is read.
    struct SteppingClock {
        now: Cell<i64>,
        step: i64,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> i64 {
            let now = self.now.get();
            self.now.set(now + self.step);
            now
        }
    }

    // 2025-01-01T00:00:00Z
    const DAY1: i64 = 1_735_689_600;

    #[test]
    fn stop_event_ends_session_and_persists_interval() {
        let clock = SteppingClock {
            now: Cell::new(DAY1 + 1_000),
            step: 125,
        };
        let db = Database::open_in_memory().unwrap();
        let mut tracker = Tracker::new(db, &clock, TrackerOptions::default()).unwrap();
        tracker.add_project("Work").unwrap();

        let (tx, rx) = mpsc::channel();
        tx.send(ShellEvent::Stop).unwrap();

        let mut output = Vec::new();
        run(&mut output, &mut tracker, None, &rx, TICK).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
Started Work at 2025-01-01 00:16:40 UTC. Press Enter to stop.
Stopped Work after 00:02:05.
");

        let range = TimeRange::new(DAY1, DAY1 + 86_400).unwrap();
        let intervals = tracker
            .store()
            .intervals_overlapping(ProjectFilter::All, range)
            .unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start, DAY1 + 1_000);
        assert_eq!(intervals[0].end, DAY1 + 1_125);
        assert_eq!(intervals[0].duration, 125);
        assert!(!tracker.is_running());
    }

    #[test]
    fn ticks_until_stop_arrives() {
        let clock = SteppingClock {
            now: Cell::new(DAY1),
            step: 1,
        };
        let db = Database::open_in_memory().unwrap();
        let mut tracker = Tracker::new(db, &clock, TrackerOptions::default()).unwrap();
        tracker.add_project("Work").unwrap();

        let (tx, rx) = mpsc::channel();
        let sender = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            tx.send(ShellEvent::Stop).unwrap();
        });

        let mut output = Vec::new();
        run(&mut output, &mut tracker, Some("work"), &rx, Duration::from_millis(1)).unwrap();
        sender.join().unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("\r00:00:0"));
        assert!(output.ends_with(".\n"));
        assert!(!tracker.is_running());
    }

    #[test]
    fn closed_channel_stops_session() {
        let clock = ManualClock::new(DAY1);
        let db = Database::open_in_memory().unwrap();
        let mut tracker = Tracker::new(db, &clock, TrackerOptions::default()).unwrap();
        tracker.add_project("Work").unwrap();

        let (tx, rx) = mpsc::channel::<ShellEvent>();
        drop(tx);

        let mut output = Vec::new();
        run(&mut output, &mut tracker, None, &rx, TICK).unwrap();
        assert!(String::from_utf8(output).unwrap().contains("Stopped Work after 00:00:00."));
        assert_eq!(tracker.store().interval_count().unwrap(), 1);
    }

    #[test]
    fn start_without_projects_fails() {
        let clock = ManualClock::new(DAY1);
        let db = Database::open_in_memory().unwrap();
        let mut tracker = Tracker::new(db, &clock, TrackerOptions::default()).unwrap();

        let (_tx, rx) = mpsc::channel();
        let mut output = Vec::new();
        let err = run(&mut output, &mut tracker, None, &rx, TICK).unwrap_err();
        assert_eq!(err.to_string(), "no projects exist; add a project first");
        assert!(output.is_empty());
    }

    #[test]
    fn start_unknown_project_fails() {
        let clock = ManualClock::new(DAY1);
        let db = Database::open_in_memory().unwrap();
        let mut tracker = Tracker::new(db, &clock, TrackerOptions::default()).unwrap();
        tracker.add_project("Work").unwrap();

        let (_tx, rx) = mpsc::channel();
        let mut output = Vec::new();
        let err = run(&mut output, &mut tracker, Some("Home"), &rx, TICK).unwrap_err();
        assert_eq!(err.to_string(), "project not found: Home");
        assert!(!tracker.is_running());
    }
}
