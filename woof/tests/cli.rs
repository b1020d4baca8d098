//! CLI tests: spawn the woof binary and check exit codes and output.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use woof::core::marker::COMPLETION_MARKER;
use woof::exit_codes;

fn woof(dir: &Path, args: &[&str]) -> Output {
    woof_with_path(dir, args, None)
}

/// Run woof with `bin` prepended to `PATH` so a fake agent can stand in.
fn woof_with_path(dir: &Path, args: &[&str], bin: Option<&Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_woof"));
    cmd.current_dir(dir).args(args).env_remove("WOOF_LOG");
    if let Some(bin) = bin {
        let path = std::env::var("PATH").unwrap_or_default();
        cmd.env("PATH", format!("{}:{path}", bin.display()));
    }
    cmd.output().expect("run woof")
}

/// Run woof with `PATH` pointing at an empty directory, so no agent resolves.
fn woof_without_agents(dir: &Path, args: &[&str]) -> Output {
    let empty = dir.join("empty-bin");
    fs::create_dir_all(&empty).expect("mkdir");
    Command::new(env!("CARGO_BIN_EXE_woof"))
        .current_dir(dir)
        .args(args)
        .env_remove("WOOF_LOG")
        .env("PATH", &empty)
        .output()
        .expect("run woof")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_task(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let tasks = dir.join("tasks");
    fs::create_dir_all(&tasks).expect("mkdir");
    let path = tasks.join(name);
    fs::write(&path, contents).expect("write task");
    path
}

/// Install an executable named `claude` that runs `script`.
fn fake_claude(dir: &Path, script: &str) -> PathBuf {
    let bin = dir.join("bin");
    fs::create_dir_all(&bin).expect("mkdir");
    let path = bin.join("claude");
    fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write agent");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    bin
}

#[test]
fn new_list_done_round_trip() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path();

    let created = woof(dir, &["new", "Add health check", "--label", "api"]);
    assert_eq!(created.status.code(), Some(exit_codes::OK));
    assert!(dir.join("tasks/add-health-check.md").is_file());

    let listed = woof(dir, &["list", "--json"]);
    assert_eq!(listed.status.code(), Some(exit_codes::OK));
    let tasks: serde_json::Value = serde_json::from_slice(&listed.stdout).expect("json");
    assert_eq!(tasks[0]["title"], "Add health check");
    assert_eq!(tasks[0]["status"], "todo");
    assert_eq!(tasks[0]["labels"][0], "api");

    let done = woof(dir, &["done", "tasks/add-health-check.md"]);
    assert_eq!(done.status.code(), Some(exit_codes::OK));

    let open = woof(dir, &["list", "--json"]);
    let tasks: serde_json::Value = serde_json::from_slice(&open.stdout).expect("json");
    assert_eq!(tasks.as_array().map(Vec::len), Some(0));

    let all = woof(dir, &["list", "--all"]);
    assert!(stdout(&all).contains("Add health check [api] (done)"));
}

#[test]
fn missing_tasks_dir_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = woof(temp.path(), &["list"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stdout(&output).contains("error: tasks directory"));
}

#[test]
fn label_and_file_together_are_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_task(temp.path(), "a.md", "# A\n");
    let output = woof(temp.path(), &["run", "--label", "x", "--file", "tasks/a.md"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stdout(&output).contains("--label and --file cannot be used together"));
}

#[test]
fn non_numeric_iteration_count_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_task(temp.path(), "a.md", "# A\n");
    let output = woof(temp.path(), &["run", "-n", "lots"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stdout(&output).contains("invalid iteration count 'lots'"));
}

#[test]
fn file_with_wrong_extension_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_task(temp.path(), "notes.txt", "# A\n");
    let output = woof(temp.path(), &["run", "--file", "tasks/notes.txt"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(stdout(&output).contains("expected a .md file"));
}

#[test]
fn dry_run_prints_the_prompt() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_task(temp.path(), "a.md", "# Write docs\n");
    let output = woof(temp.path(), &["run", "--dry-run"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let text = stdout(&output);
    assert!(text.contains("tasks/a.md"));
    assert!(text.contains(COMPLETION_MARKER));
}

#[test]
fn run_stops_when_the_agent_prints_the_marker() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_task(temp.path(), "a.md", "# A\n");
    let bin = fake_claude(temp.path(), &format!("echo '{COMPLETION_MARKER}'"));
    let output = woof_with_path(temp.path(), &["run", "-n", "5"], Some(&bin));
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("All tasks complete after 1 iteration"));
}

#[test]
fn repeated_agent_failures_exit_with_agent_failed() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_task(temp.path(), "a.md", "# A\n");
    fs::create_dir_all(temp.path().join(".woof")).expect("mkdir");
    fs::write(
        temp.path().join(".woof/config.toml"),
        "max_iterations = 0\nmax_consecutive_failures = 2\n",
    )
    .expect("write config");
    let bin = fake_claude(temp.path(), "echo 'starting' >&2; echo 'rate limited' >&2; exit 1");
    let output = woof_with_path(temp.path(), &["run"], Some(&bin));
    assert_eq!(output.status.code(), Some(exit_codes::AGENT_FAILED));
    let text = stdout(&output);
    assert!(text.contains("Iteration 1: agent exited with code 1: rate limited"));
    assert!(text.contains("Stopped after 2 failed agent runs in a row"));
}

#[test]
fn missing_agent_is_reported_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_task(temp.path(), "a.md", "# A\n");
    let output = woof_without_agents(temp.path(), &["run", "-n", "2"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    let text = stdout(&output);
    assert_eq!(text.matches("error:").count(), 1, "stdout: {text}");
    assert!(text.contains("error: iteration 1 failed: spawn claude"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("ERROR"), "stderr: {stderr}");
}
