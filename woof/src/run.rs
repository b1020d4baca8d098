//! Orchestration for `woof run`.
//!
//! Validates arguments, gathers the task files, renders the agent prompt and
//! then either prints it (dry run), hands the terminal to the agent
//! (interactive), or enters the iteration loop.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::core::plan::{Target, describe_ceiling, iteration_ceiling, parse_iteration_override};
use crate::core::settings::Settings;
use crate::io::launcher::Launcher;
use crate::io::notify::Notifier;
use crate::io::prompt::{PromptInputs, build_prompt};
use crate::io::tasks::{TaskFile, load_task, scan_tasks, select_tasks, validate_task_path};
use crate::looping::{LoopOutcome, LoopRequest, run_loop};
use crate::ui::Surface;

/// Raw `woof run` arguments as parsed from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunArgs {
    pub label: Option<String>,
    pub file: Option<PathBuf>,
    /// Kept as text so a bad value gets our own message.
    pub max_iterations: Option<String>,
    pub dry_run: bool,
    pub interactive: bool,
}

/// Arguments that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub target: Target,
    pub max_iterations: Option<u32>,
    pub dry_run: bool,
    pub interactive: bool,
}

impl RunArgs {
    pub fn validate(&self) -> Result<RunPlan> {
        let target = match (&self.label, &self.file) {
            (Some(_), Some(_)) => bail!("--label and --file cannot be used together"),
            (None, Some(file)) => Target::File(validate_task_path(file)?),
            (label, None) => Target::Pool {
                label: label.clone(),
            },
        };
        let max_iterations = self
            .max_iterations
            .as_deref()
            .map(parse_iteration_override)
            .transpose()?;
        Ok(RunPlan {
            target,
            max_iterations,
            dry_run: self.dry_run,
            interactive: self.interactive,
        })
    }
}

/// How a `woof run` invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// No open task matched; nothing was spawned.
    NothingToDo,
    /// The command line and prompt were printed instead of running.
    DryRun { argv: Vec<String> },
    /// One interactive session; `None` when killed by a signal.
    Interactive { code: Option<i32> },
    Loop(LoopOutcome),
}

/// Execute a validated run.
pub fn run_command<L, N, W>(
    settings: &Settings,
    plan: &RunPlan,
    launcher: &L,
    notifier: &N,
    surface: &mut Surface<W>,
    today: &str,
) -> Result<RunReport>
where
    L: Launcher,
    N: Notifier,
    W: Write + Clone + Send + 'static,
{
    let tasks = gather_tasks(settings, &plan.target)?;
    if tasks.is_empty() {
        let scope = match &plan.target {
            Target::Pool { label: Some(label) } => format!(" labelled '{label}'"),
            _ => String::new(),
        };
        surface.info(&format!("No open tasks{scope} in {}", settings.tasks_dir.display()))?;
        return Ok(RunReport::NothingToDo);
    }

    let prompt = build_prompt(&PromptInputs {
        tasks: &tasks,
        single_file: matches!(plan.target, Target::File(_)),
        today,
    })?;

    let backend = settings.backend;
    if plan.dry_run {
        let argv = if plan.interactive {
            backend.interactive_command(&prompt, &settings.backend_config)
        } else {
            backend.loop_command(&prompt, &settings.backend_config)
        };
        surface.intro("woof (dry run)")?;
        surface.info(&format!("Would run {backend} with {} task(s)", tasks.len()))?;
        for task in &tasks {
            surface.info(&format!("  {}", task.describe()))?;
        }
        surface.write_str(&format!("\n{prompt}\n"))?;
        surface.outro("Nothing was run")?;
        surface.flush()?;
        return Ok(RunReport::DryRun { argv });
    }

    if plan.interactive {
        let argv = backend.interactive_command(&prompt, &settings.backend_config);
        surface.intro("woof")?;
        surface.info(&format!("Starting an interactive {backend} session"))?;
        surface.flush()?;
        let status = launcher.run_inherited(&argv, None)?;
        info!(code = ?status.code(), "interactive session ended");
        let code = status.code();
        match code {
            Some(0) => surface.outro("Session ended")?,
            Some(c) => surface.warn(&format!("{backend} exited with code {c}"))?,
            None => surface.warn(&format!("{backend} was terminated by a signal"))?,
        }
        surface.flush()?;
        return Ok(RunReport::Interactive { code });
    }

    let max_iterations =
        iteration_ceiling(&plan.target, settings.max_iterations, plan.max_iterations);
    surface.intro("woof")?;
    surface.info(&format!(
        "{} · {} open task(s) · max iterations: {}",
        backend,
        tasks.len(),
        describe_ceiling(max_iterations)
    ))?;
    let request = LoopRequest {
        argv: backend.loop_command(&prompt, &settings.backend_config),
        max_iterations,
        notifications: settings.notifications,
        verbose: settings.verbose,
        max_consecutive_failures: settings.max_consecutive_failures,
        workdir: None,
    };
    let outcome = run_loop(launcher, notifier, &request, surface)?;
    Ok(RunReport::Loop(outcome))
}

fn gather_tasks(settings: &Settings, target: &Target) -> Result<Vec<TaskFile>> {
    let tasks = match target {
        Target::Pool { label } => {
            let all = scan_tasks(&settings.tasks_dir)?;
            select_tasks(&all, label.as_deref(), false)
        }
        Target::File(path) => vec![load_task(path)?],
    };
    debug!(count = tasks.len(), "gathered tasks");
    Ok(tasks)
}
