//! Project configuration stored under `.woof/config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::backend::{Backend, BackendConfig};
use crate::core::settings::{NotificationMode, Overrides, Settings};

pub const CONFIG_DIR: &str = ".woof";
pub const CONFIG_FILE: &str = "config.toml";

/// `<root>/.woof/config.toml`
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// On-disk configuration (TOML).
///
/// Meant to be edited by humans. Missing fields fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WoofConfig {
    /// Agent CLI to drive.
    pub backend: Backend,

    /// Iteration ceiling for pool runs; 0 means run until the agent signals completion.
    pub max_iterations: u32,

    pub notifications: NotificationMode,

    /// Mirror agent output instead of showing a spinner.
    pub verbose: bool,

    /// Directory holding task files, relative to the project root.
    pub tasks_dir: PathBuf,

    /// Abort after this many consecutive non-zero exits; 0 keeps looping.
    pub max_consecutive_failures: u32,

    /// Per-backend settings keyed by backend name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub backends: BTreeMap<String, BackendConfig>,
}

impl Default for WoofConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Claude,
            max_iterations: 10,
            notifications: NotificationMode::Disabled,
            verbose: false,
            tasks_dir: PathBuf::from("tasks"),
            max_consecutive_failures: 0,
            backends: BTreeMap::new(),
        }
    }
}

impl WoofConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tasks_dir.as_os_str().is_empty() {
            return Err(anyhow!("tasks_dir must not be empty"));
        }
        for (name, backend) in &self.backends {
            if !Backend::ALL.iter().any(|b| b.as_str() == name) {
                return Err(anyhow!(
                    "unknown backend table [backends.{name}] (expected claude, codex or opencode)"
                ));
            }
            if backend.extra_args.iter().any(|arg| arg.trim().is_empty()) {
                return Err(anyhow!(
                    "backends.{name}.extra_args must not contain empty strings"
                ));
            }
        }
        Ok(())
    }

    /// Config for `backend`, or the default when the table is absent.
    pub fn backend_config(&self, backend: Backend) -> BackendConfig {
        self.backends
            .get(backend.as_str())
            .cloned()
            .unwrap_or_default()
    }

    /// Merge command-line overrides into the read-only settings for this run.
    pub fn resolve(&self, root: &Path, overrides: &Overrides) -> Settings {
        let backend = overrides.backend.unwrap_or(self.backend);
        let tasks_dir = if self.tasks_dir.is_absolute() {
            self.tasks_dir.clone()
        } else {
            root.join(&self.tasks_dir)
        };
        Settings {
            backend,
            max_iterations: overrides.max_iterations.unwrap_or(self.max_iterations),
            notifications: overrides.notifications.unwrap_or(self.notifications),
            verbose: overrides.verbose || self.verbose,
            tasks_dir,
            max_consecutive_failures: self.max_consecutive_failures,
            backend_config: self.backend_config(backend),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `WoofConfig::default()`.
pub fn load_config(path: &Path) -> Result<WoofConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        let cfg = WoofConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: WoofConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &WoofConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    if !buf.ends_with('\n') {
        buf.push('\n');
    }
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, WoofConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = config_path(temp.path());
        let mut cfg = WoofConfig {
            backend: Backend::Codex,
            notifications: NotificationMode::Individual,
            ..WoofConfig::default()
        };
        cfg.backends.insert(
            "codex".to_string(),
            BackendConfig {
                model: Some("o3".to_string()),
                extra_args: vec!["--full-auto".to_string()],
            },
        );
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "backend = \"opencode\"\nmax_iterations = 0\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.backend, Backend::Opencode);
        assert_eq!(cfg.max_iterations, 0);
        assert_eq!(cfg.tasks_dir, PathBuf::from("tasks"));
    }

    #[test]
    fn unknown_backend_table_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[backends.gemini]\nmodel = \"x\"\n").expect("write");
        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unknown backend table"));
    }

    #[test]
    fn unknown_backend_name_fails_to_parse() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "backend = \"gemini\"\n").expect("write");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut cfg = WoofConfig::default();
        cfg.backends.insert(
            "opencode".to_string(),
            BackendConfig {
                model: Some("big".to_string()),
                extra_args: Vec::new(),
            },
        );
        let root = Path::new("/project");
        let settings = cfg.resolve(
            root,
            &Overrides {
                backend: Some(Backend::Opencode),
                max_iterations: Some(2),
                notifications: Some(NotificationMode::All),
                verbose: true,
            },
        );
        assert_eq!(settings.backend, Backend::Opencode);
        assert_eq!(settings.max_iterations, 2);
        assert_eq!(settings.notifications, NotificationMode::All);
        assert!(settings.verbose);
        assert_eq!(settings.tasks_dir, PathBuf::from("/project/tasks"));
        assert_eq!(settings.backend_config.model.as_deref(), Some("big"));
    }

    #[test]
    fn no_overrides_keeps_file_values() {
        let cfg = WoofConfig {
            verbose: true,
            ..WoofConfig::default()
        };
        let settings = cfg.resolve(Path::new("."), &Overrides::default());
        assert_eq!(settings.backend, Backend::Claude);
        assert_eq!(settings.max_iterations, 10);
        assert!(settings.verbose);
        assert_eq!(settings.backend_config, BackendConfig::default());
    }
}
