//! Argument vectors for each supported agent CLI.
//!
//! Pure data mapping: nothing here spawns processes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported agent command-line tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Claude,
    Codex,
    Opencode,
}

/// Per-backend knobs from the `[backends.<name>]` config table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Model name passed through the backend's model flag.
    pub model: Option<String>,
    /// Extra arguments inserted before the prompt.
    pub extra_args: Vec<String>,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Claude, Backend::Codex, Backend::Opencode];

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Claude => "claude",
            Backend::Codex => "codex",
            Backend::Opencode => "opencode",
        }
    }

    /// Executable name looked up on `PATH`.
    pub fn program(self) -> &'static str {
        self.as_str()
    }

    fn model_flag(self) -> &'static str {
        match self {
            Backend::Claude | Backend::Opencode => "--model",
            Backend::Codex => "-m",
        }
    }

    /// Non-interactive invocation used once per loop iteration.
    pub fn loop_command(self, prompt: &str, config: &BackendConfig) -> Vec<String> {
        let mut argv = vec![self.program().to_string()];
        match self {
            Backend::Claude => {
                argv.push("-p".to_string());
                argv.push(prompt.to_string());
                argv.push("--dangerously-skip-permissions".to_string());
                self.push_config(&mut argv, config);
            }
            Backend::Codex => {
                argv.extend(
                    ["exec", "--sandbox", "danger-full-access"]
                        .iter()
                        .map(|s| s.to_string()),
                );
                self.push_config(&mut argv, config);
                argv.push(prompt.to_string());
            }
            Backend::Opencode => {
                argv.push("run".to_string());
                self.push_config(&mut argv, config);
                argv.push(prompt.to_string());
            }
        }
        argv
    }

    /// Invocation that hands the terminal to the agent's own interactive UI.
    pub fn interactive_command(self, prompt: &str, config: &BackendConfig) -> Vec<String> {
        let mut argv = vec![self.program().to_string()];
        self.push_config(&mut argv, config);
        if self == Backend::Opencode {
            argv.push("--prompt".to_string());
        }
        argv.push(prompt.to_string());
        argv
    }

    fn push_config(self, argv: &mut Vec<String>, config: &BackendConfig) {
        if let Some(model) = config.model.as_deref().filter(|m| !m.trim().is_empty()) {
            argv.push(self.model_flag().to_string());
            argv.push(model.to_string());
        }
        argv.extend(config.extra_args.iter().cloned());
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: Option<&str>, extra: &[&str]) -> BackendConfig {
        BackendConfig {
            model: model.map(str::to_string),
            extra_args: extra.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn claude_loop_command_prints_and_skips_permissions() {
        let argv = Backend::Claude.loop_command("do it", &config(Some("sonnet"), &["--verbose"]));
        assert_eq!(
            argv,
            vec![
                "claude",
                "-p",
                "do it",
                "--dangerously-skip-permissions",
                "--model",
                "sonnet",
                "--verbose"
            ]
        );
    }

    #[test]
    fn codex_loop_command_uses_exec_with_prompt_last() {
        let argv = Backend::Codex.loop_command("do it", &config(Some("o3"), &[]));
        assert_eq!(
            argv,
            vec![
                "codex",
                "exec",
                "--sandbox",
                "danger-full-access",
                "-m",
                "o3",
                "do it"
            ]
        );
    }

    #[test]
    fn opencode_loop_command_uses_run() {
        let argv = Backend::Opencode.loop_command("do it", &BackendConfig::default());
        assert_eq!(argv, vec!["opencode", "run", "do it"]);
    }

    #[test]
    fn interactive_commands_pass_prompt_positionally() {
        let cfg = config(None, &["--flag"]);
        assert_eq!(
            Backend::Claude.interactive_command("p", &cfg),
            vec!["claude", "--flag", "p"]
        );
        assert_eq!(
            Backend::Codex.interactive_command("p", &cfg),
            vec!["codex", "--flag", "p"]
        );
        assert_eq!(
            Backend::Opencode.interactive_command("p", &cfg),
            vec!["opencode", "--flag", "--prompt", "p"]
        );
    }

    #[test]
    fn blank_model_is_ignored() {
        let argv = Backend::Opencode.loop_command("p", &config(Some("  "), &[]));
        assert_eq!(argv, vec!["opencode", "run", "p"]);
    }

    #[test]
    fn names_round_trip_through_serde() {
        for backend in Backend::ALL {
            let json = serde_json::to_string(&backend).expect("serialize");
            assert_eq!(json, format!("\"{backend}\""));
            let parsed: Backend = serde_json::from_str(&json).expect("parse");
            assert_eq!(parsed, backend);
        }
    }
}
