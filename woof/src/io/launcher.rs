//! Launcher abstraction for agent invocation.
//!
//! The [`Launcher`] trait decouples the run loop from real process spawning.
//! Tests use scripted launchers that return predetermined output without
//! starting anything.

use std::path::Path;
use std::process::ExitStatus;

use anyhow::Result;

use crate::io::process::{self, CommandResult, LaunchOptions};

pub trait Launcher {
    /// Run with stdin closed and stdout captured. See [`process::run_piped`].
    fn run_piped(&self, argv: &[String], options: &LaunchOptions) -> Result<CommandResult>;

    /// Run sharing the terminal. See [`process::run_inherited`].
    fn run_inherited(&self, argv: &[String], workdir: Option<&Path>) -> Result<ExitStatus>;
}

/// Launcher that spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn run_piped(&self, argv: &[String], options: &LaunchOptions) -> Result<CommandResult> {
        process::run_piped(argv, options)
    }

    fn run_inherited(&self, argv: &[String], workdir: Option<&Path>) -> Result<ExitStatus> {
        process::run_inherited(argv, workdir)
    }
}
