//! What a `woof run` invocation works on and for how long.

use std::path::PathBuf;

use anyhow::{Result, anyhow};

/// Which task files the agent is pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every open task in the tasks directory, optionally narrowed by label.
    Pool { label: Option<String> },
    /// One explicitly named task file.
    File(PathBuf),
}

/// Iteration ceiling for `target`.
///
/// An explicit override always wins. Targeting a single file defaults to one
/// iteration so a run on one file cannot loop forever by accident.
pub fn iteration_ceiling(target: &Target, configured: u32, explicit: Option<u32>) -> u32 {
    match (explicit, target) {
        (Some(n), _) => n,
        (None, Target::File(_)) => 1,
        (None, Target::Pool { .. }) => configured,
    }
}

/// Parse an iteration override; `0` means unlimited.
pub fn parse_iteration_override(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    trimmed.parse::<u32>().map_err(|_| {
        anyhow!("invalid iteration count '{trimmed}': expected a non-negative integer")
    })
}

/// Human label for an iteration ceiling.
pub fn describe_ceiling(max_iterations: u32) -> String {
    if max_iterations == 0 {
        "unlimited".to_string()
    } else {
        max_iterations.to_string()
    }
}
