//! Process launcher tests against real `sh` children.
//!
//! These cover the pipe plumbing that unit tests with scripted launchers
//! cannot: concurrent drains, exit codes, and closing stdout early.

use woof::core::marker::COMPLETION_MARKER;
use woof::io::launcher::{Launcher, ProcessLauncher};
use woof::io::process::LaunchOptions;

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

#[test]
fn non_zero_exit_is_a_result_not_an_error() {
    let result = ProcessLauncher
        .run_piped(&sh("echo partial; exit 42"), &LaunchOptions::default())
        .expect("run");
    assert_eq!(result.code(), Some(42));
    assert!(!result.success());
    assert_eq!(result.stdout_text(), "partial\n");
}

#[test]
fn large_stderr_does_not_deadlock_stdout() {
    // 1 MiB on stderr before anything on stdout: far beyond a pipe buffer.
    let script = "head -c 1048576 /dev/zero >&2; echo done";
    let result = ProcessLauncher
        .run_piped(&sh(script), &LaunchOptions::default())
        .expect("run");
    assert_eq!(result.stderr.len(), 1_048_576);
    assert_eq!(result.stdout_text(), "done\n");
}

#[test]
fn interleaved_streams_keep_their_own_order() {
    let script = "for i in 1 2 3; do echo out$i; echo err$i >&2; done";
    let result = ProcessLauncher
        .run_piped(&sh(script), &LaunchOptions::default())
        .expect("run");
    assert_eq!(result.stdout_text(), "out1\nout2\nout3\n");
    assert_eq!(result.stderr_text(), "err1\nerr2\nerr3\n");
}

#[test]
fn marker_closes_stdout_early() {
    // The pipe is closed before the child writes again, so "never" is lost.
    let script = format!("echo working; echo '{COMPLETION_MARKER}'; sleep 1; echo never");
    let options = LaunchOptions {
        stop_on_marker: true,
        ..LaunchOptions::default()
    };
    let result = ProcessLauncher.run_piped(&sh(&script), &options).expect("run");
    assert!(result.stopped_early);
    assert!(result.stdout_text().contains(COMPLETION_MARKER));
    assert!(!result.stdout_text().contains("never"));
}

#[test]
fn marker_is_ignored_without_early_stop() {
    let script = format!("echo '{COMPLETION_MARKER}'; echo after");
    let result = ProcessLauncher
        .run_piped(&sh(&script), &LaunchOptions::default())
        .expect("run");
    assert!(!result.stopped_early);
    assert!(result.stdout_text().ends_with("after\n"));
}

#[test]
fn missing_program_is_a_spawn_error() {
    let argv = vec!["woof-no-such-agent".to_string(), "-p".to_string()];
    let err = ProcessLauncher
        .run_piped(&argv, &LaunchOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("woof-no-such-agent"));
}
