//! Helpers for running agent processes with piped or inherited stdio.

use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, instrument};

use crate::core::marker::contains_marker;
use crate::io::drain::{drain_stream, drain_to_end};

/// Captured child process output.
#[derive(Debug)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// stdout was closed early after the completion marker was seen.
    pub stopped_early: bool,
}

impl CommandResult {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// How a piped child is wired up.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Working directory; inherits the parent's when `None`.
    pub workdir: Option<PathBuf>,
    /// Send stderr straight to the terminal instead of capturing it.
    pub inherit_stderr: bool,
    /// Copy stdout chunks to our stdout as they arrive.
    pub mirror_stdout: bool,
    /// Stop reading stdout once the completion marker has been captured.
    pub stop_on_marker: bool,
}

/// Run `argv` with stdin closed and stdout (and usually stderr) captured.
///
/// stderr is drained on its own thread while stdout is drained here, so a
/// child that fills one pipe while we read the other cannot deadlock us.
/// The exit status is collected only after both drains finish. A non-zero
/// exit is returned, not treated as an error.
#[instrument(skip_all, fields(program = argv.first().map(String::as_str).unwrap_or_default(), inherit_stderr = options.inherit_stderr))]
pub fn run_piped(argv: &[String], options: &LaunchOptions) -> Result<CommandResult> {
    let mut cmd = build_command(argv, options.workdir.as_deref())?;
    cmd.stdin(Stdio::null()).stdout(Stdio::piped());
    if options.inherit_stderr {
        cmd.stderr(Stdio::inherit());
    } else {
        cmd.stderr(Stdio::piped());
    }

    debug!("spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            debug!(err = %e, "failed to spawn command");
            return Err(e).with_context(|| format!("spawn {}", argv[0]));
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr_handle = child
        .stderr
        .take()
        .map(|stderr| thread::spawn(move || drain_to_end(stderr)));

    let mirror = options.mirror_stdout.then(io::stdout);
    let stop_on_marker = options.stop_on_marker;
    // Dropping the reader at the end of the drain closes our end of the pipe.
    let drained = drain_stream(stdout, mirror, |buf| stop_on_marker && contains_marker(buf));
    let drained = match drained {
        Ok(drained) => drained,
        Err(err) => {
            debug!(err = %err, "stdout drain failed, killing child");
            let _ = child.kill();
            let _ = child.wait();
            if let Some(handle) = stderr_handle {
                let _ = handle.join();
            }
            return Err(err).context("drain stdout");
        }
    };

    let stderr = match stderr_handle {
        Some(handle) => join_output(handle).context("drain stderr")?,
        None => Vec::new(),
    };

    let status = child.wait().context("wait for command")?;
    debug!(
        exit_code = ?status.code(),
        stdout_bytes = drained.bytes.len(),
        stderr_bytes = stderr.len(),
        stopped_early = drained.stopped_early,
        "command finished"
    );
    Ok(CommandResult {
        status,
        stdout: drained.bytes,
        stderr,
        stopped_early: drained.stopped_early,
    })
}

/// Run `argv` sharing all three streams with this terminal.
///
/// Stand-in for a pseudo-terminal: the agent talks to the user directly and
/// nothing is captured.
#[instrument(skip_all, fields(program = argv.first().map(String::as_str).unwrap_or_default()))]
pub fn run_inherited(argv: &[String], workdir: Option<&Path>) -> Result<ExitStatus> {
    let mut cmd = build_command(argv, workdir)?;
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    debug!("spawning interactive child process");
    let status = cmd
        .status()
        .with_context(|| format!("spawn {}", argv[0]))?;
    debug!(exit_code = ?status.code(), "interactive command finished");
    Ok(status)
}

fn build_command(argv: &[String], workdir: Option<&Path>) -> Result<Command> {
    let Some((program, args)) = argv.split_first() else {
        bail!("empty command line");
    };
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = workdir {
        cmd.current_dir(dir);
    }
    Ok(cmd)
}

fn join_output(handle: thread::JoinHandle<Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}
