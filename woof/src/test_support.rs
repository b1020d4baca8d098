//! Scripted stand-ins for the terminal, child processes and notifications.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::Level;

use crate::core::marker::contains_marker;
use crate::io::launcher::Launcher;
use crate::io::notify::Notifier;
use crate::io::process::{CommandResult, LaunchOptions};
use crate::ui::Surface;
use crate::ui::keys::KeyInput;
use crate::ui::prompt::{Prompter, TerminalMode};

/// Clonable in-memory writer; every clone appends to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct SharedBuf {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    pub fn contents(&self) -> String {
        let bytes = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a thread-local subscriber recording events at `level` and
/// above; returns `f`'s value and the formatted log.
pub fn capture_logs<T>(level: Level, f: impl FnOnce() -> T) -> (T, String) {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, buf.contents())
}

/// Key source replaying a fixed byte script, then end of input.
#[derive(Debug, Clone)]
pub struct ScriptedKeys {
    bytes: VecDeque<u8>,
}

impl ScriptedKeys {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.iter().copied().collect(),
        }
    }
}

impl KeyInput for ScriptedKeys {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }

    fn read_byte_within(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
        Ok(self.bytes.pop_front())
    }
}

/// Terminal mode that only counts transitions.
#[derive(Debug, Clone, Default)]
pub struct RecordingMode {
    raw: bool,
    enters: usize,
    restores: usize,
    fail_enter: bool,
}

impl RecordingMode {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mode whose `enter_raw` always fails.
    pub fn failing() -> Self {
        Self {
            fail_enter: true,
            ..Self::default()
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn enters(&self) -> usize {
        self.enters
    }

    pub fn restores(&self) -> usize {
        self.restores
    }
}

impl TerminalMode for RecordingMode {
    fn enter_raw(&mut self) -> io::Result<()> {
        if self.fail_enter {
            return Err(io::Error::other("not a terminal"));
        }
        self.raw = true;
        self.enters += 1;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if self.raw {
            self.raw = false;
            self.restores += 1;
        }
        Ok(())
    }
}

/// A prompter over scripted keys and a TTY surface pinned to `columns`.
pub fn scripted_prompter(
    bytes: &[u8],
    columns: u16,
) -> (Prompter<ScriptedKeys, RecordingMode, SharedBuf>, SharedBuf) {
    let out = SharedBuf::default();
    let surface = Surface::new(out.clone(), true).with_columns(columns);
    let prompter = Prompter::new(ScriptedKeys::new(bytes), RecordingMode::new(), surface);
    (prompter, out)
}

/// Outcome of one scripted child run.
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    SpawnError(String),
}

impl ScriptedRun {
    pub fn exit(code: i32, stdout: &str) -> Self {
        ScriptedRun::Exit {
            code,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// Exit with `code` after writing `stderr` and nothing on stdout.
    pub fn failing(code: i32, stderr: &str) -> Self {
        ScriptedRun::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

/// Launcher that replays queued outcomes, then repeats `fallback`.
#[derive(Debug)]
pub struct ScriptedLauncher {
    queue: RefCell<VecDeque<ScriptedRun>>,
    fallback: ScriptedRun,
    calls: RefCell<Vec<Vec<String>>>,
    options: RefCell<Vec<LaunchOptions>>,
}

impl ScriptedLauncher {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self::with_fallback(runs, ScriptedRun::exit(0, ""))
    }

    pub fn with_fallback(runs: Vec<ScriptedRun>, fallback: ScriptedRun) -> Self {
        Self {
            queue: RefCell::new(runs.into()),
            fallback,
            calls: RefCell::new(Vec::new()),
            options: RefCell::new(Vec::new()),
        }
    }

    /// Every argv passed in, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Options of each piped call.
    pub fn options(&self) -> Vec<LaunchOptions> {
        self.options.borrow().clone()
    }

    fn next(&self, argv: &[String]) -> ScriptedRun {
        self.calls.borrow_mut().push(argv.to_vec());
        self.queue
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Launcher for ScriptedLauncher {
    fn run_piped(&self, argv: &[String], options: &LaunchOptions) -> Result<CommandResult> {
        self.options.borrow_mut().push(options.clone());
        match self.next(argv) {
            ScriptedRun::Exit {
                code,
                stdout,
                stderr,
            } => {
                let stdout = stdout.into_bytes();
                Ok(CommandResult {
                    status: exit_status(code),
                    stopped_early: options.stop_on_marker && contains_marker(&stdout),
                    stdout,
                    stderr: stderr.into_bytes(),
                })
            }
            ScriptedRun::SpawnError(msg) => Err(anyhow!(msg)),
        }
    }

    fn run_inherited(&self, argv: &[String], _workdir: Option<&Path>) -> Result<ExitStatus> {
        match self.next(argv) {
            ScriptedRun::Exit { code, .. } => Ok(exit_status(code)),
            ScriptedRun::SpawnError(msg) => Err(anyhow!(msg)),
        }
    }
}

/// Notifier that records every request.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        self.sent
            .borrow_mut()
            .push((title.to_string(), message.to_string()));
    }
}
