//! Interactive prompt widgets: text input and yes/no confirmation.
//!
//! Each widget call opens a [`Session`], which switches the terminal into
//! prompt mode and restores it when dropped. Submit, cancel, `?` on an I/O
//! error and unwinding all pass through that `Drop`, so the shell is never
//! left in raw mode.
//!
//! Cancellation (Ctrl-C, bare Escape, end of input) is `Ok(None)`; an empty
//! submission is `Ok(Some(String::new()))`.

use std::io::{IsTerminal, Write};
use std::os::fd::RawFd;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::ui::keys::{Key, KeyInput, StdinKeys, read_key};
use crate::ui::{ConsoleOut, Style, Surface, display_width, sys, visual_rows};

/// Switches the input side of the terminal in and out of prompt mode.
pub trait TerminalMode {
    fn enter_raw(&mut self) -> std::io::Result<()>;
    fn restore(&mut self) -> std::io::Result<()>;
}

/// Prompt mode on the stdin descriptor via termios.
pub struct StdinMode {
    fd: RawFd,
    saved: Option<libc::termios>,
}

impl StdinMode {
    pub fn new() -> Self {
        Self {
            fd: sys::STDIN_FD,
            saved: None,
        }
    }
}

impl Default for StdinMode {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalMode for StdinMode {
    fn enter_raw(&mut self) -> std::io::Result<()> {
        let original = sys::get_termios(self.fd)?;
        sys::set_termios(self.fd, &sys::prompt_mode(&original))?;
        self.saved = Some(original);
        Ok(())
    }

    fn restore(&mut self) -> std::io::Result<()> {
        if let Some(original) = self.saved.take() {
            sys::set_termios(self.fd, &original)?;
        }
        Ok(())
    }
}

pub(crate) const ACTIVE: &str = "◆";
pub(crate) const SUBMITTED: &str = "◇";
pub(crate) const INVALID: &str = "▲";

/// Entry point for all widgets: key source, mode control and output surface.
pub struct Prompter<I, M, W> {
    pub(crate) input: I,
    pub(crate) mode: M,
    pub(crate) surface: Surface<W>,
}

impl Prompter<StdinKeys, StdinMode, ConsoleOut> {
    /// Prompter bound to the process terminal. Fails when stdin is not a TTY.
    pub fn stdio() -> Result<Self> {
        if !std::io::stdin().is_terminal() {
            bail!("interactive prompts need a terminal on stdin");
        }
        Ok(Self::new(StdinKeys::new(), StdinMode::new(), Surface::stdout()))
    }
}

impl<I: KeyInput, M: TerminalMode, W: Write> Prompter<I, M, W> {
    pub fn new(input: I, mode: M, surface: Surface<W>) -> Self {
        Self {
            input,
            mode,
            surface,
        }
    }

    pub fn surface(&mut self) -> &mut Surface<W> {
        &mut self.surface
    }

    pub fn mode(&self) -> &M {
        &self.mode
    }

    /// Single-line text input.
    pub fn text(&mut self, prompt: &TextPrompt<'_>) -> Result<Option<String>> {
        let mut session = Session::open(self)?;
        if let Some(initial) = prompt.initial {
            session.buffer.push_str(initial);
        }
        render_text(&mut session, prompt)?;

        loop {
            match session.key()? {
                Key::Char(ch) => {
                    session.buffer.push(ch);
                    render_text(&mut session, prompt)?;
                }
                Key::Backspace => {
                    session.buffer.pop();
                    render_text(&mut session, prompt)?;
                }
                Key::Enter => {
                    if let Some(validate) = prompt.validate
                        && let Err(message) = validate(&session.buffer)
                    {
                        debug!(%message, "text input rejected");
                        render_invalid(&mut session, &message)?;
                        continue;
                    }
                    session.clear_previous()?;
                    let value = std::mem::take(&mut session.buffer);
                    session.settle(prompt.message, &value)?;
                    return Ok(Some(value));
                }
                key if key.is_cancel() => {
                    session.clear_previous()?;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Yes/no question. Enter picks `default`.
    pub fn confirm(&mut self, message: &str, default: bool) -> Result<Option<bool>> {
        let mut session = Session::open(self)?;
        let hint = if default { "(Y/n)" } else { "(y/N)" };
        let tty = session.prompter.surface.is_tty();
        let plain = format!("{ACTIVE}  {message} {hint} ");
        let styled = format!(
            "{}  {message} {} ",
            session.prompter.surface.paint(Style::Cyan, ACTIVE),
            crate::ui::paint(Style::Dim, hint, tty)
        );
        session.draw(&styled, display_width(&plain))?;

        loop {
            let answer = match session.key()? {
                Key::Char('y' | 'Y') => true,
                Key::Char('n' | 'N') => false,
                Key::Enter => default,
                key if key.is_cancel() => {
                    session.clear_previous()?;
                    return Ok(None);
                }
                _ => continue,
            };
            session.clear_previous()?;
            session.settle(message, if answer { "Yes" } else { "No" })?;
            return Ok(Some(answer));
        }
    }
}

/// Validation hook for [`TextPrompt`]: `Err` carries the message shown inline.
pub type Validator<'a> = &'a dyn Fn(&str) -> Result<(), String>;

/// Options for [`Prompter::text`].
#[derive(Clone, Copy)]
pub struct TextPrompt<'a> {
    pub message: &'a str,
    pub placeholder: Option<&'a str>,
    pub initial: Option<&'a str>,
    pub validate: Option<Validator<'a>>,
}

impl<'a> TextPrompt<'a> {
    pub fn new(message: &'a str) -> Self {
        Self {
            message,
            placeholder: None,
            initial: None,
            validate: None,
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn initial(mut self, initial: &'a str) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn validate(mut self, validate: Validator<'a>) -> Self {
        self.validate = Some(validate);
        self
    }
}

/// Per-invocation widget state. Restores the terminal mode on drop.
pub(crate) struct Session<'p, I: KeyInput, M: TerminalMode, W: Write> {
    pub(crate) prompter: &'p mut Prompter<I, M, W>,
    pub(crate) buffer: String,
    pub(crate) index: usize,
    /// Rows the last in-place render occupies; the cursor sits on the last one.
    pub(crate) prev_rows: usize,
    cursor_hidden: bool,
}

impl<'p, I: KeyInput, M: TerminalMode, W: Write> Session<'p, I, M, W> {
    pub(crate) fn open(prompter: &'p mut Prompter<I, M, W>) -> Result<Self> {
        prompter
            .mode
            .enter_raw()
            .context("switch terminal to prompt mode")?;
        Ok(Self {
            prompter,
            buffer: String::new(),
            index: 0,
            prev_rows: 1,
            cursor_hidden: false,
        })
    }

    pub(crate) fn key(&mut self) -> Result<Key> {
        read_key(&mut self.prompter.input).context("read key")
    }

    pub(crate) fn surface(&mut self) -> &mut Surface<W> {
        &mut self.prompter.surface
    }

    pub(crate) fn hide_cursor(&mut self) -> Result<()> {
        self.prompter.surface.hide_cursor()?;
        self.cursor_hidden = true;
        Ok(())
    }

    /// Erase exactly the rows the previous in-place render occupied.
    pub(crate) fn clear_previous(&mut self) -> Result<()> {
        self.prompter.surface.clear_rows(self.prev_rows)?;
        Ok(())
    }

    /// Replace the previous in-place render with `styled`, which is
    /// `plain_width` columns wide once escapes are stripped.
    pub(crate) fn draw(&mut self, styled: &str, plain_width: usize) -> Result<()> {
        let width = self.prompter.surface.width();
        self.clear_previous()?;
        self.prompter.surface.write_str(styled)?;
        self.prompter.surface.flush()?;
        self.prev_rows = visual_rows(plain_width, width);
        Ok(())
    }

    /// Print the submitted value as one settled line.
    pub(crate) fn settle(&mut self, message: &str, value: &str) -> Result<()> {
        let surface = &mut self.prompter.surface;
        let line = format!(
            "{}  {message} {}\n",
            surface.paint(Style::Green, SUBMITTED),
            surface.paint(Style::Dim, value)
        );
        surface.write_str(&line)?;
        surface.flush()?;
        Ok(())
    }
}

impl<I: KeyInput, M: TerminalMode, W: Write> Drop for Session<'_, I, M, W> {
    fn drop(&mut self) {
        if self.cursor_hidden {
            let _ = self.prompter.surface.show_cursor();
        }
        let _ = self.prompter.surface.flush();
        if let Err(err) = self.prompter.mode.restore() {
            debug!(err = %err, "failed to restore terminal mode");
        }
    }
}

fn render_text<I: KeyInput, M: TerminalMode, W: Write>(
    session: &mut Session<'_, I, M, W>,
    prompt: &TextPrompt<'_>,
) -> Result<()> {
    let prefix = format!("{ACTIVE}  {} ", prompt.message);
    let (body_plain, body_styled) = if session.buffer.is_empty() {
        let placeholder = prompt.placeholder.unwrap_or_default();
        (
            placeholder.to_string(),
            session.surface().paint(Style::Dim, placeholder),
        )
    } else {
        (session.buffer.clone(), session.buffer.clone())
    };
    let styled = format!(
        "{}  {} {body_styled}",
        session.surface().paint(Style::Cyan, ACTIVE),
        prompt.message
    );
    let plain_width = display_width(&prefix) + display_width(&body_plain);
    session.draw(&styled, plain_width)
}

fn render_invalid<I: KeyInput, M: TerminalMode, W: Write>(
    session: &mut Session<'_, I, M, W>,
    message: &str,
) -> Result<()> {
    let plain = format!("{INVALID}  {message}");
    let styled = format!(
        "{}  {}",
        session.surface().paint(Style::Yellow, INVALID),
        session.surface().paint(Style::Yellow, message)
    );
    session.draw(&styled, display_width(&plain))
}
