//! The iteration loop behind `woof run`.
//!
//! Each iteration spawns the agent once, drains its output, and checks the
//! captured stdout for the completion marker. The loop ends on the marker,
//! when the iteration ceiling is reached, or (when configured) after too many
//! failed runs in a row. Spawn and drain errors abort immediately.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::marker::contains_marker;
use crate::core::settings::NotificationMode;
use crate::io::launcher::Launcher;
use crate::io::notify::{NOTIFICATION_TITLE, Notifier};
use crate::io::process::LaunchOptions;
use crate::ui::spinner::Spinner;
use crate::ui::{Surface, truncate_to_width};

/// Reason why `run_loop` stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStop {
    /// The agent printed the completion marker during `iteration`.
    Completed { iteration: u32 },
    /// The ceiling was reached without the marker.
    Exhausted { iterations: u32 },
    /// Too many consecutive non-zero exits.
    FailureLimit { consecutive: u32 },
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOutcome {
    pub iterations: u32,
    pub stop: LoopStop,
}

/// Error context for an iteration that could not run.
///
/// The loop has already shown the user a framed error line naming the
/// iteration, so callers should not report it a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationFailed {
    pub iteration: u32,
}

impl fmt::Display for IterationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "iteration {}", self.iteration)
    }
}

impl std::error::Error for IterationFailed {}

/// Longest stderr excerpt appended to a failed iteration's summary.
const STDERR_TAIL_WIDTH: usize = 120;

/// Everything the loop needs to know about one invocation.
#[derive(Debug, Clone)]
pub struct LoopRequest {
    /// Full agent command line, prompt included.
    pub argv: Vec<String>,
    /// 0 means unlimited.
    pub max_iterations: u32,
    pub notifications: NotificationMode,
    pub verbose: bool,
    /// 0 disables the consecutive-failure stop.
    pub max_consecutive_failures: u32,
    pub workdir: Option<PathBuf>,
}

/// Mutable bookkeeping for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    pub iteration: u32,
    pub max_iterations: u32,
    pub completed: bool,
    pub notifications: NotificationMode,
    pub consecutive_failures: u32,
}

impl RunState {
    pub fn new(max_iterations: u32, notifications: NotificationMode) -> Self {
        Self {
            max_iterations,
            notifications,
            ..Self::default()
        }
    }

    /// Another iteration fits under the ceiling.
    pub fn has_budget(&self) -> bool {
        self.max_iterations == 0 || self.iteration < self.max_iterations
    }

    /// `Iteration 2/5`, or `Iteration 2` when unlimited.
    pub fn label(&self) -> String {
        if self.max_iterations == 0 {
            format!("Iteration {}", self.iteration)
        } else {
            format!("Iteration {}/{}", self.iteration, self.max_iterations)
        }
    }
}

/// Drive the agent until it signals completion or a stop condition hits.
///
/// Output goes to `surface`; the spinner (skipped in verbose mode) writes
/// through a clone of its writer.
#[instrument(skip_all, fields(max_iterations = request.max_iterations, verbose = request.verbose))]
pub fn run_loop<L, N, W>(
    launcher: &L,
    notifier: &N,
    request: &LoopRequest,
    surface: &mut Surface<W>,
) -> Result<LoopOutcome>
where
    L: Launcher,
    N: Notifier,
    W: Write + Clone + Send + 'static,
{
    let options = LaunchOptions {
        workdir: request.workdir.clone(),
        inherit_stderr: request.verbose,
        mirror_stdout: request.verbose,
        stop_on_marker: true,
    };
    let mut state = RunState::new(request.max_iterations, request.notifications);
    let mut stop = None;

    while state.has_budget() {
        state.iteration += 1;
        let label = state.label();
        let spinner = if request.verbose {
            surface.info(&label)?;
            None
        } else {
            Some(Spinner::start(
                surface.writer().clone(),
                surface.is_tty(),
                format!("{label}: agent working"),
            ))
        };

        let result = match launcher.run_piped(&request.argv, &options) {
            Ok(result) => result,
            Err(err) => {
                let message = format!("iteration {} failed: {err:#}", state.iteration);
                match spinner {
                    Some(spinner) => spinner.stop_with_error(&message),
                    None => surface.error(&message)?,
                }
                debug!(iteration = state.iteration, error = %err, "agent launch failed");
                return Err(err).context(IterationFailed {
                    iteration: state.iteration,
                });
            }
        };

        state.completed = contains_marker(&result.stdout);
        let failed = !state.completed && !result.success();
        let summary = if state.completed {
            state.consecutive_failures = 0;
            format!("{label}: completion signalled")
        } else if result.success() {
            state.consecutive_failures = 0;
            format!("{label}: finished")
        } else {
            state.consecutive_failures += 1;
            let code = result
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("code {c}"));
            match last_stderr_line(&result.stderr) {
                Some(line) => format!("{label}: agent exited with {code}: {line}"),
                None => format!("{label}: agent exited with {code}"),
            }
        };

        // Diagnostics only after the spinner has released its row.
        match (spinner, failed) {
            (Some(spinner), true) => spinner.stop_with_warning(&summary),
            (Some(spinner), false) => spinner.stop(&summary),
            (None, true) => surface.warn(&summary)?,
            (None, false) => surface.success(&summary)?,
        }
        info!(
            iteration = state.iteration,
            completed = state.completed,
            code = ?result.code(),
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            stopped_early = result.stopped_early,
            "iteration finished"
        );

        if state.notifications == NotificationMode::Individual {
            notifier.notify(NOTIFICATION_TITLE, &summary);
        }

        if state.completed {
            stop = Some(LoopStop::Completed {
                iteration: state.iteration,
            });
            break;
        }
        if request.max_consecutive_failures > 0
            && state.consecutive_failures >= request.max_consecutive_failures
        {
            stop = Some(LoopStop::FailureLimit {
                consecutive: state.consecutive_failures,
            });
            break;
        }
    }

    let stop = stop.unwrap_or(LoopStop::Exhausted {
        iterations: state.iteration,
    });
    let outcome = LoopOutcome {
        iterations: state.iteration,
        stop,
    };
    let summary = describe_outcome(&outcome);
    if state.notifications == NotificationMode::All {
        notifier.notify(NOTIFICATION_TITLE, &summary);
    }
    surface.outro(&summary)?;
    surface.flush()?;
    Ok(outcome)
}

/// Last non-blank line the agent wrote to stderr, cut to fit one row.
fn last_stderr_line(stderr: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| truncate_to_width(line, STDERR_TAIL_WIDTH))
}

/// One-line summary shown after the loop.
pub fn describe_outcome(outcome: &LoopOutcome) -> String {
    let plural = |n: u32| if n == 1 { "iteration" } else { "iterations" };
    match outcome.stop {
        LoopStop::Completed { iteration } => {
            format!("All tasks complete after {iteration} {}", plural(iteration))
        }
        LoopStop::Exhausted { iterations } => format!(
            "Stopped after {iterations} {} without the completion signal",
            plural(iterations)
        ),
        LoopStop::FailureLimit { consecutive } => {
            format!("Stopped after {consecutive} failed agent runs in a row")
        }
    }
}
