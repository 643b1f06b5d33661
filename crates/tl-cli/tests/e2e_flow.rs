//! End-to-end tests driving the built `tl` binary.
//!
//! Each test points the database at a temp directory through
//! `TIMELINE_DATABASE_PATH` and isolates HOME so no user config is read.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use tempfile::TempDir;

fn tl_binary() -> String {
    env!("CARGO_BIN_EXE_tl").to_string()
}

fn db_path(temp: &Path) -> PathBuf {
    temp.join("data").join("records.db")
}

/// Spawns `tl` with `args` and piped stdio, isolated to `temp`.
fn spawn_tl(temp: &Path, args: &[&str]) -> Child {
    Command::new(tl_binary())
        .env("HOME", temp)
        .env("TIMELINE_DATABASE_PATH", db_path(temp))
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("RUST_LOG")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn tl")
}

/// Runs `tl` with `args`, feeding `input` on stdin.
fn tl(temp: &Path, args: &[&str], input: &str) -> Output {
    let mut child = spawn_tl(temp, args);

    let mut stdin = child.stdin.take().unwrap();
    // The child may exit before reading; a broken pipe is fine here.
    let _ = stdin.write_all(input.as_bytes());
    drop(stdin);

    child.wait_with_output().expect("failed to wait for tl")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "tl should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_add_and_list_projects() {
    let temp = TempDir::new().unwrap();

    let output = tl(temp.path(), &["project", "add", "Work"], "");
    assert_success(&output);
    assert_eq!(stdout(&output), "Added project Work (id 1)\n");

    let output = tl(temp.path(), &["project", "add", "home"], "");
    assert_success(&output);

    // Adding again with different case reuses the project
    let output = tl(temp.path(), &["project", "add", "WORK"], "");
    assert_success(&output);
    assert_eq!(stdout(&output), "Selected existing project Work (id 1)\n");

    let output = tl(temp.path(), &["project", "list"], "");
    assert_success(&output);
    assert_eq!(stdout(&output), "  home (id 2)\n* Work (id 1)\n");

    assert!(db_path(temp.path()).exists());
}

#[test]
fn test_start_report_and_status() {
    let temp = TempDir::new().unwrap();
    assert_success(&tl(temp.path(), &["project", "add", "Work"], ""));

    // A line on stdin stops the session right away
    let output = tl(temp.path(), &["start"], "\n");
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.starts_with("Started Work at "), "unexpected output: {text}");
    assert!(text.contains("Stopped Work after 00:00:0"), "unexpected output: {text}");

    let output = tl(temp.path(), &["report", "--totals-only"], "");
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.starts_with("Total time: 00:00:0"), "unexpected output: {text}");
    assert!(text.ends_with("\nDates are in UTC\n"));

    let output = tl(temp.path(), &["report", "--json", "--project", "work"], "");
    assert_success(&output);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["project"], "Work");
    assert_eq!(value["days"].as_array().unwrap().len(), 7);

    let output = tl(temp.path(), &["status"], "");
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.contains("Projects: 1"));
    assert!(text.contains("Selected: Work"));
    assert!(text.contains("Records: 1"));
}

#[test]
fn test_delete_project_with_confirmation() {
    let temp = TempDir::new().unwrap();
    assert_success(&tl(temp.path(), &["project", "add", "Work"], ""));
    assert_success(&tl(temp.path(), &["start"], ""));

    let output = tl(temp.path(), &["project", "delete", "work"], "n\n");
    assert_success(&output);
    assert!(stdout(&output).ends_with("Cancelled.\n"));

    let output = tl(temp.path(), &["project", "delete", "work", "--yes"], "");
    assert_success(&output);
    assert_eq!(stdout(&output), "Deleted project Work and 1 record(s).\n");

    let output = tl(temp.path(), &["project", "list"], "");
    assert!(stdout(&output).starts_with("No projects."));
}

#[test]
fn test_start_without_projects_fails() {
    let temp = TempDir::new().unwrap();

    let output = tl(temp.path(), &["start"], "\n");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no projects exist"), "unexpected stderr: {stderr}");
}

#[test]
fn test_unusable_database_fails_to_open() {
    let temp = TempDir::new().unwrap();
    let path = db_path(temp.path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "this is not a sqlite database".repeat(200)).unwrap();

    let output = tl(temp.path(), &["status"], "");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open database"), "unexpected stderr: {stderr}");
}

#[cfg(unix)]
#[test]
fn test_interrupt_stops_session_with_final_write() {
    use std::thread;
    use std::time::Duration;

    let temp = TempDir::new().unwrap();
    assert_success(&tl(temp.path(), &["project", "add", "Work"], ""));

    // Keep stdin open so only the signal can stop the session
    let mut child = spawn_tl(temp.path(), &["start"]);
    let stdin = child.stdin.take();
    thread::sleep(Duration::from_millis(2_500));

    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success());

    let output = child.wait_with_output().expect("failed to wait for tl");
    drop(stdin);
    assert_success(&output);
    let text = stdout(&output);
    assert!(text.contains("Stopped Work after 00:00:0"), "unexpected output: {text}");

    // Well under one checkpoint period, so only the final write records this
    let output = tl(temp.path(), &["report", "--json", "--totals-only"], "");
    assert_success(&output);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value["total_seconds"].as_i64().unwrap() >= 2, "unexpected report: {value}");
}
