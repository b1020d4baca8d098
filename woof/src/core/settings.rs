//! Resolved, read-only settings for one invocation.
//!
//! Built once in `main` from the config file plus CLI overrides and passed
//! explicitly to every entry point.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::backend::{Backend, BackendConfig};

/// When desktop notifications fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    /// Never notify.
    #[default]
    Disabled,
    /// Once, after the loop ends.
    All,
    /// After every iteration.
    Individual,
}

impl NotificationMode {
    pub const ALL: [NotificationMode; 3] = [
        NotificationMode::Disabled,
        NotificationMode::All,
        NotificationMode::Individual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationMode::Disabled => "disabled",
            NotificationMode::All => "all",
            NotificationMode::Individual => "individual",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: Backend,
    /// Iteration ceiling for pool runs; 0 means unlimited.
    pub max_iterations: u32,
    pub notifications: NotificationMode,
    pub verbose: bool,
    pub tasks_dir: PathBuf,
    /// Stop after this many non-zero exits in a row without the marker; 0 disables.
    pub max_consecutive_failures: u32,
    /// Config for the selected backend.
    pub backend_config: BackendConfig,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub backend: Option<Backend>,
    pub max_iterations: Option<u32>,
    pub notifications: Option<NotificationMode>,
    /// `--verbose` can only switch verbosity on.
    pub verbose: bool,
}
