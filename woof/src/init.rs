//! Interactive `woof init`: asks a few questions and writes `.woof/config.toml`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::core::backend::Backend;
use crate::core::plan::parse_iteration_override;
use crate::core::settings::NotificationMode;
use crate::io::config::{WoofConfig, config_path, load_config, write_config};
use crate::ui::keys::KeyInput;
use crate::ui::prompt::{Prompter, TerminalMode, TextPrompt};
use crate::ui::select::SelectOption;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Written { path: PathBuf, config: WoofConfig },
    /// The user backed out; nothing was written.
    Cancelled,
}

/// Run the setup questions in `root`.
///
/// Refuses to replace an existing config unless `force` is set; with `force`
/// the current values become the defaults.
pub fn init_command<I, M, W>(
    prompter: &mut Prompter<I, M, W>,
    root: &Path,
    force: bool,
) -> Result<InitOutcome>
where
    I: KeyInput,
    M: TerminalMode,
    W: Write,
{
    let path = config_path(root);
    let current = if path.exists() {
        if !force {
            bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        load_config(&path)?
    } else {
        WoofConfig::default()
    };

    prompter.surface().intro("woof init")?;
    let Some(config) = ask(prompter, &current)? else {
        prompter.surface().warn("Setup cancelled")?;
        prompter.surface().flush()?;
        return Ok(InitOutcome::Cancelled);
    };

    write_config(&path, &config)?;
    let tasks_dir = root.join(&config.tasks_dir);
    fs::create_dir_all(&tasks_dir)
        .with_context(|| format!("create directory {}", tasks_dir.display()))?;
    info!(path = %path.display(), backend = %config.backend, "wrote config");

    let surface = prompter.surface();
    surface.success(&format!("Wrote {}", path.display()))?;
    surface.outro(&format!(
        "Add tasks to {}/ with `woof new`, then `woof run`",
        config.tasks_dir.display()
    ))?;
    surface.flush()?;
    Ok(InitOutcome::Written { path, config })
}

/// `None` as soon as any question is cancelled.
fn ask<I, M, W>(
    prompter: &mut Prompter<I, M, W>,
    current: &WoofConfig,
) -> Result<Option<WoofConfig>>
where
    I: KeyInput,
    M: TerminalMode,
    W: Write,
{
    let mut backends: Vec<SelectOption<Backend>> = Backend::ALL
        .iter()
        .map(|b| SelectOption::new(b.as_str(), *b))
        .collect();
    // Current backend first so Enter keeps it.
    backends.sort_by_key(|o| o.value != current.backend);
    let Some(backend) = prompter.autocomplete("Agent backend", &backends)? else {
        return Ok(None);
    };

    let iterations_initial = current.max_iterations.to_string();
    let validate_iterations = |value: &str| {
        parse_iteration_override(value)
            .map(|_| ())
            .map_err(|_| "enter a whole number (0 = unlimited)".to_string())
    };
    let Some(iterations) = prompter.text(
        &TextPrompt::new("Max iterations per run")
            .initial(&iterations_initial)
            .validate(&validate_iterations),
    )?
    else {
        return Ok(None);
    };
    let max_iterations = parse_iteration_override(&iterations)?;

    let modes: Vec<SelectOption<NotificationMode>> = NotificationMode::ALL
        .iter()
        .map(|m| SelectOption::new(notification_label(*m), *m))
        .collect();
    let initial = NotificationMode::ALL
        .iter()
        .position(|m| *m == current.notifications)
        .unwrap_or(0);
    let Some(notifications) = prompter.select("Desktop notifications", &modes, initial)? else {
        return Ok(None);
    };

    let Some(verbose) = prompter.confirm("Stream agent output by default?", current.verbose)? else {
        return Ok(None);
    };

    let tasks_initial = current.tasks_dir.display().to_string();
    let validate_dir = |value: &str| {
        if value.trim().is_empty() {
            Err("tasks directory cannot be empty".to_string())
        } else {
            Ok(())
        }
    };
    let Some(tasks_dir) = prompter.text(
        &TextPrompt::new("Tasks directory")
            .initial(&tasks_initial)
            .validate(&validate_dir),
    )?
    else {
        return Ok(None);
    };

    Ok(Some(WoofConfig {
        backend,
        max_iterations,
        notifications,
        verbose,
        tasks_dir: PathBuf::from(tasks_dir.trim()),
        ..current.clone()
    }))
}

fn notification_label(mode: NotificationMode) -> &'static str {
    match mode {
        NotificationMode::Disabled => "disabled",
        NotificationMode::All => "all (once, when the run ends)",
        NotificationMode::Individual => "individual (after every iteration)",
    }
}
