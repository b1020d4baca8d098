//! woof: loop AI coding agents over a queue of markdown task files.
//!
//! Tasks live in `tasks/` (configurable in `.woof/config.toml`). `woof run`
//! starts the configured agent CLI again and again until it prints the
//! completion marker or the iteration ceiling is reached.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use woof::core::backend::Backend;
use woof::core::settings::{NotificationMode, Overrides, Settings};
use woof::exit_codes;
use woof::init::{InitOutcome, init_command};
use woof::io::config::{config_path, load_config};
use woof::io::launcher::ProcessLauncher;
use woof::io::notify::DesktopNotifier;
use woof::io::tasks::{create_task, mark_done, scan_tasks, select_tasks, validate_task_path};
use woof::looping::{IterationFailed, LoopStop};
use woof::logging;
use woof::run::{RunArgs, RunReport, run_command};
use woof::ui::Surface;
use woof::ui::prompt::{Prompter, TextPrompt};

#[derive(Parser)]
#[command(
    name = "woof",
    version,
    about = "Loop AI coding agents over markdown task files"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a few questions and write `.woof/config.toml`.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Create a task file in the tasks directory.
    New {
        /// Task title; prompted for when omitted.
        title: Option<String>,
        /// Label to attach (repeatable).
        #[arg(short, long = "label", value_name = "LABEL")]
        labels: Vec<String>,
    },
    /// List task files.
    List {
        /// Only tasks carrying this label.
        #[arg(short, long)]
        label: Option<String>,
        /// Include finished tasks.
        #[arg(short, long)]
        all: bool,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Mark a task file as done.
    Done {
        /// Path to the task file.
        file: PathBuf,
    },
    /// Run the agent over open tasks until it signals completion.
    Run(RunCli),
}

#[derive(Args)]
struct RunCli {
    /// Only tasks carrying this label.
    #[arg(short, long)]
    label: Option<String>,
    /// Work on one task file (defaults to a single iteration).
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Iteration ceiling; 0 runs until the agent signals completion.
    #[arg(
        short = 'n',
        long = "max-iterations",
        value_name = "N",
        allow_hyphen_values = true
    )]
    max_iterations: Option<String>,
    /// Agent CLI to use instead of the configured one.
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,
    /// Notification mode for this run.
    #[arg(long, value_enum, value_name = "MODE")]
    notify: Option<NotificationMode>,
    /// Stream agent output instead of showing a spinner.
    #[arg(short, long)]
    verbose: bool,
    /// Print the prompt and command without running anything.
    #[arg(long)]
    dry_run: bool,
    /// Run the agent once, attached to this terminal.
    #[arg(short, long)]
    interactive: bool,
}

impl Cli {
    /// Verbose runs log at `info`, whether `--verbose` or the config asked.
    fn log_verbose(&self, root: &Path) -> bool {
        match &self.command {
            Command::Run(run) => run.verbose || configured_verbose(root),
            _ => false,
        }
    }
}

/// An unreadable config counts as quiet; `run` reports it properly later.
fn configured_verbose(root: &Path) -> bool {
    load_config(&config_path(root)).is_ok_and(|config| config.verbose)
}

fn main() {
    let cli = Cli::parse();
    let verbose = std::env::current_dir()
        .is_ok_and(|root| cli.log_verbose(&root));
    logging::init(verbose);
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            if !already_reported(&err) {
                report_fatal(&err);
            }
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn dispatch(cli: Cli) -> Result<i32> {
    let root = std::env::current_dir().context("resolve working directory")?;
    debug!(root = %root.display(), "starting");
    match cli.command {
        Command::Init { force } => cmd_init(&root, force),
        Command::New { title, labels } => cmd_new(&root, title, &labels),
        Command::List { label, all, json } => cmd_list(&root, label.as_deref(), all, json),
        Command::Done { file } => cmd_done(&file),
        Command::Run(run) => cmd_run(&root, run),
    }
}

/// The run loop prints its own framed error before handing the failure back.
fn already_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<IterationFailed>().is_some()
}

fn report_fatal(err: &anyhow::Error) {
    let mut surface = Surface::stdout();
    if surface.error(&format!("{err:#}")).is_err() {
        eprintln!("error: {err:#}");
    }
    let _ = surface.flush();
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn load_settings(root: &Path, overrides: &Overrides) -> Result<Settings> {
    let config = load_config(&config_path(root))?;
    Ok(config.resolve(root, overrides))
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let mut prompter = Prompter::stdio()?;
    match init_command(&mut prompter, root, force)? {
        InitOutcome::Written { .. } => Ok(exit_codes::OK),
        InitOutcome::Cancelled => Ok(exit_codes::CANCELLED),
    }
}

fn cmd_new(root: &Path, title: Option<String>, labels: &[String]) -> Result<i32> {
    let settings = load_settings(root, &Overrides::default())?;
    let title = match title {
        Some(title) => title,
        None => {
            let mut prompter = Prompter::stdio()
                .context("a task title is required when stdin is not a terminal")?;
            let not_blank = |value: &str| {
                if value.trim().is_empty() {
                    Err("title cannot be empty".to_string())
                } else {
                    Ok(())
                }
            };
            let prompt = TextPrompt::new("Task title").validate(&not_blank);
            match prompter.text(&prompt)? {
                Some(title) => title,
                None => return Ok(exit_codes::CANCELLED),
            }
        }
    };
    let path = create_task(&settings.tasks_dir, &title, labels, &today())?;
    let mut surface = Surface::stdout();
    surface.success(&format!("Created {}", path.display()))?;
    Ok(exit_codes::OK)
}

fn cmd_list(root: &Path, label: Option<&str>, all: bool, json: bool) -> Result<i32> {
    let settings = load_settings(root, &Overrides::default())?;
    let tasks = select_tasks(&scan_tasks(&settings.tasks_dir)?, label, all);
    if json {
        let payload = serde_json::to_string_pretty(&tasks).context("serialize tasks")?;
        println!("{payload}");
        return Ok(exit_codes::OK);
    }
    let mut surface = Surface::stdout();
    if tasks.is_empty() {
        surface.info("No matching tasks")?;
    }
    for task in &tasks {
        surface.info(&format!("{}  {}", task.name, task.describe()))?;
    }
    surface.flush()?;
    Ok(exit_codes::OK)
}

fn cmd_done(file: &Path) -> Result<i32> {
    let path = validate_task_path(file)?;
    let task = mark_done(&path, &today())?;
    let mut surface = Surface::stdout();
    surface.success(&format!("Marked {} done", task.name))?;
    Ok(exit_codes::OK)
}

fn cmd_run(root: &Path, run: RunCli) -> Result<i32> {
    let args = RunArgs {
        label: run.label,
        file: run.file,
        max_iterations: run.max_iterations,
        dry_run: run.dry_run,
        interactive: run.interactive,
    };
    let plan = args.validate()?;
    let settings = load_settings(
        root,
        &Overrides {
            backend: run.backend,
            max_iterations: plan.max_iterations,
            notifications: run.notify,
            verbose: run.verbose,
        },
    )?;
    let mut surface = Surface::stdout();
    let report = run_command(
        &settings,
        &plan,
        &ProcessLauncher,
        &DesktopNotifier,
        &mut surface,
        &today(),
    )?;
    Ok(match report {
        RunReport::NothingToDo | RunReport::DryRun { .. } => exit_codes::OK,
        RunReport::Interactive { code: Some(0) } => exit_codes::OK,
        RunReport::Interactive { .. } => exit_codes::AGENT_FAILED,
        RunReport::Loop(outcome) => match outcome.stop {
            LoopStop::FailureLimit { .. } => exit_codes::AGENT_FAILED,
            LoopStop::Completed { .. } | LoopStop::Exhausted { .. } => exit_codes::OK,
        },
    })
}
