//! List widgets: arrow-key single-select and filtered autocomplete.
//!
//! Both draw a header line followed by one line per visible option, each
//! newline-terminated, and erase exactly what they drew before redrawing.

use std::io::Write;

use anyhow::Result;

use crate::ui::keys::{Key, KeyInput};
use crate::ui::prompt::{ACTIVE, Prompter, Session, TerminalMode};
use crate::ui::{Style, display_width, truncate_to_width, visual_rows};

/// Label/value pair offered by [`Prompter::select`] and [`Prompter::autocomplete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption<T> {
    pub label: String,
    pub value: T,
}

impl<T> SelectOption<T> {
    pub fn new(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Options whose label contains `query`, ignoring case, in original order.
pub fn filter_options<'o, T>(
    options: &'o [SelectOption<T>],
    query: &str,
) -> Vec<&'o SelectOption<T>> {
    let needle = query.to_lowercase();
    options
        .iter()
        .filter(|option| option.label.to_lowercase().contains(&needle))
        .collect()
}

impl<I: KeyInput, M: TerminalMode, W: Write> Prompter<I, M, W> {
    /// Pick one option with Up/Down and Enter. Movement clamps at both ends.
    pub fn select<T: Clone>(
        &mut self,
        message: &str,
        options: &[SelectOption<T>],
        initial: usize,
    ) -> Result<Option<T>> {
        if options.is_empty() {
            return Ok(None);
        }
        let mut session = Session::open(self)?;
        session.index = initial.min(options.len() - 1);
        session.hide_cursor()?;

        let header_rows = draw_header(&mut session, message, None)?;
        let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
        let mut drawn = draw_options(&mut session, &labels)?;

        loop {
            match session.key()? {
                Key::Up => session.index = session.index.saturating_sub(1),
                Key::Down => {
                    if session.index + 1 < options.len() {
                        session.index += 1;
                    }
                }
                Key::Enter => {
                    session.surface().erase_lines(drawn + header_rows)?;
                    let chosen = &options[session.index];
                    session.settle(message, &chosen.label)?;
                    return Ok(Some(chosen.value.clone()));
                }
                key if key.is_cancel() => {
                    session.surface().erase_lines(drawn + header_rows)?;
                    return Ok(None);
                }
                _ => continue,
            }
            session.surface().erase_lines(drawn)?;
            drawn = draw_options(&mut session, &labels)?;
        }
    }

    /// Type to narrow `options` by case-insensitive substring, then pick one.
    ///
    /// Every edit re-filters and moves the highlight back to the first match.
    /// Enter with no matches does nothing.
    pub fn autocomplete<T: Clone>(
        &mut self,
        message: &str,
        options: &[SelectOption<T>],
    ) -> Result<Option<T>> {
        if options.is_empty() {
            return Ok(None);
        }
        let mut session = Session::open(self)?;
        session.hide_cursor()?;

        let mut filtered = filter_options(options, "");
        let mut drawn = draw_autocomplete(&mut session, message, &filtered)?;

        loop {
            match session.key()? {
                Key::Char(ch) => {
                    session.buffer.push(ch);
                    filtered = filter_options(options, &session.buffer);
                    session.index = 0;
                }
                Key::Backspace => {
                    session.buffer.pop();
                    filtered = filter_options(options, &session.buffer);
                    session.index = 0;
                }
                Key::Up => session.index = session.index.saturating_sub(1),
                Key::Down => {
                    if session.index + 1 < filtered.len() {
                        session.index += 1;
                    }
                }
                Key::Enter => {
                    let Some(chosen) = filtered.get(session.index) else {
                        continue;
                    };
                    session.surface().erase_lines(drawn)?;
                    session.settle(message, &chosen.label)?;
                    return Ok(Some(chosen.value.clone()));
                }
                key if key.is_cancel() => {
                    session.surface().erase_lines(drawn)?;
                    return Ok(None);
                }
                _ => continue,
            }
            session.surface().erase_lines(drawn)?;
            drawn = draw_autocomplete(&mut session, message, &filtered)?;
        }
    }
}

/// Draw the header line (with an optional query) and return its row count.
fn draw_header<I: KeyInput, M: TerminalMode, W: Write>(
    session: &mut Session<'_, I, M, W>,
    message: &str,
    query: Option<&str>,
) -> Result<usize> {
    let width = session.surface().width();
    let query = query.unwrap_or_default();
    let plain = format!("{ACTIVE}  {message} {query}");
    let line = format!(
        "{}  {message} {query}\n",
        session.surface().paint(Style::Cyan, ACTIVE)
    );
    session.surface().write_str(&line)?;
    Ok(visual_rows(display_width(&plain), width))
}

/// Draw one line per label, highlighting `session.index`. Returns lines drawn.
fn draw_options<I: KeyInput, M: TerminalMode, W: Write>(
    session: &mut Session<'_, I, M, W>,
    labels: &[&str],
) -> Result<usize> {
    let width = session.surface().width();
    let mut block = String::new();
    for (idx, label) in labels.iter().enumerate() {
        // Keep each option on one row so the erase count stays exact.
        let label = truncate_to_width(label, width.saturating_sub(5).max(1));
        let line = if idx == session.index {
            format!(
                "   {} {}\n",
                session.surface().paint(Style::Cyan, "●"),
                label
            )
        } else {
            format!(
                "   {}\n",
                session.surface().paint(Style::Dim, &format!("○ {label}"))
            )
        };
        block.push_str(&line);
    }
    session.surface().write_str(&block)?;
    session.surface().flush()?;
    Ok(labels.len())
}

fn draw_autocomplete<T, I: KeyInput, M: TerminalMode, W: Write>(
    session: &mut Session<'_, I, M, W>,
    message: &str,
    filtered: &[&SelectOption<T>],
) -> Result<usize> {
    let query = session.buffer.clone();
    let header_rows = draw_header(session, message, Some(&query))?;
    let labels: Vec<&str> = filtered.iter().map(|o| o.label.as_str()).collect();
    let option_rows = draw_options(session, &labels)?;
    Ok(header_rows + option_rows)
}
