//! Terminal output primitives shared by the prompt widgets and the spinner.
//!
//! This module is the single source of truth for escape sequences and row
//! geometry. Every styled write is gated on the surface's TTY flag: when the
//! output is piped, only plain text is emitted.

pub mod keys;
pub mod prompt;
pub mod select;
pub mod spinner;
pub mod sys;

use std::io::{self, IsTerminal, Write};

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Column count assumed when the terminal cannot be queried.
pub const FALLBACK_COLUMNS: u16 = 80;

pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
/// Return to column 0 and erase the whole row.
pub const CLEAR_LINE: &str = "\r\x1b[2K";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Bold,
    Dim,
    Inverse,
    Red,
    Green,
    Yellow,
    Cyan,
    Gray,
}

impl Style {
    fn sgr(self) -> &'static str {
        match self {
            Style::Bold => "\x1b[1m",
            Style::Dim => "\x1b[2m",
            Style::Inverse => "\x1b[7m",
            Style::Red => "\x1b[31m",
            Style::Green => "\x1b[32m",
            Style::Yellow => "\x1b[33m",
            Style::Cyan => "\x1b[36m",
            Style::Gray => "\x1b[90m",
        }
    }
}

/// Wrap `text` in the style's SGR codes, or return it untouched off a TTY.
pub fn paint(style: Style, text: &str, tty: bool) -> String {
    if !tty || text.is_empty() {
        return text.to_string();
    }
    format!("{}{text}{RESET}", style.sgr())
}

/// Rows a line of `len` display columns occupies at `width` columns.
///
/// Never returns zero: empty content still owns the row the cursor sits on.
pub fn visual_rows(len: usize, width: usize) -> usize {
    if len == 0 || width == 0 {
        return 1;
    }
    len.div_ceil(width)
}

/// Display width of plain (escape-free) text.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Cut `text` so it fits in `max` display columns.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if display_width(text) <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    let budget = max.saturating_sub(1);
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    if max > 0 {
        out.push('…');
    }
    out
}

pub fn cursor_up(n: usize) -> String {
    if n == 0 {
        String::new()
    } else {
        format!("\x1b[{n}A")
    }
}

pub fn cursor_down(n: usize) -> String {
    if n == 0 {
        String::new()
    } else {
        format!("\x1b[{n}B")
    }
}

/// Escape sequence that erases `rows` rows ending at the cursor's row.
///
/// With `rows <= 1` only the current row is cleared. Otherwise the cursor
/// moves up `rows - 1`, clears each row top to bottom, and is left at column
/// 0 of the top row, where the next render starts.
pub fn clear_rows_sequence(rows: usize) -> String {
    if rows <= 1 {
        return CLEAR_LINE.to_string();
    }
    let mut seq = cursor_up(rows - 1);
    for row in 0..rows {
        seq.push_str(CLEAR_LINE);
        if row + 1 < rows {
            seq.push_str(&cursor_down(1));
        }
    }
    seq.push_str(&cursor_up(rows - 1));
    seq
}

/// Escape sequence that erases `lines` newline-terminated lines above the cursor.
///
/// The cursor ends at column 0 of the first erased line.
pub fn erase_lines_sequence(lines: usize) -> String {
    let mut seq = String::new();
    for _ in 0..lines {
        seq.push_str(&cursor_up(1));
        seq.push_str(CLEAR_LINE);
    }
    seq
}

/// Framed single-line message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Intro,
    Info,
    Success,
    Warn,
    Error,
    Outro,
}

/// Render one framed line (without the trailing newline).
pub fn frame_line(kind: LineKind, text: &str, tty: bool) -> String {
    if !tty {
        return match kind {
            LineKind::Warn => format!("warning: {text}"),
            LineKind::Error => format!("error: {text}"),
            _ => text.to_string(),
        };
    }
    let (glyph, style) = match kind {
        LineKind::Intro => ("┌", Style::Gray),
        LineKind::Info => ("●", Style::Cyan),
        LineKind::Success => ("◆", Style::Green),
        LineKind::Warn => ("▲", Style::Yellow),
        LineKind::Error => ("■", Style::Red),
        LineKind::Outro => ("└", Style::Gray),
    };
    let body = match kind {
        LineKind::Intro => paint(Style::Inverse, &format!(" {text} "), tty),
        LineKind::Error => paint(Style::Red, text, tty),
        _ => text.to_string(),
    };
    format!("{}  {body}", paint(style, glyph, tty))
}

/// Width of the terminal attached to stdout, or [`FALLBACK_COLUMNS`].
pub fn terminal_width(tty: bool) -> usize {
    if !tty {
        return usize::from(FALLBACK_COLUMNS);
    }
    usize::from(sys::window_columns(sys::STDOUT_FD).unwrap_or(FALLBACK_COLUMNS))
}

/// Cloneable handle to the process stdout.
///
/// The spinner thread and the main thread each hold one; writes go through
/// the global `io::stdout()` lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOut;

impl Write for ConsoleOut {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// Output destination plus the TTY flag every rendering decision gates on.
#[derive(Debug)]
pub struct Surface<W> {
    out: W,
    tty: bool,
    columns: Option<u16>,
}

impl Surface<ConsoleOut> {
    pub fn stdout() -> Self {
        Self::new(ConsoleOut, io::stdout().is_terminal())
    }
}

impl<W: Write> Surface<W> {
    pub fn new(out: W, tty: bool) -> Self {
        Self {
            out,
            tty,
            columns: None,
        }
    }

    /// Pin the column count instead of querying the terminal.
    pub fn with_columns(mut self, columns: u16) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn is_tty(&self) -> bool {
        self.tty
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn width(&self) -> usize {
        match self.columns {
            Some(columns) => usize::from(columns),
            None => terminal_width(self.tty),
        }
    }

    pub fn paint(&self, style: Style, text: &str) -> String {
        paint(style, text, self.tty)
    }

    pub fn write_str(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn clear_rows(&mut self, rows: usize) -> io::Result<()> {
        if !self.tty {
            return Ok(());
        }
        let seq = clear_rows_sequence(rows);
        self.write_str(&seq)
    }

    pub fn erase_lines(&mut self, lines: usize) -> io::Result<()> {
        if !self.tty || lines == 0 {
            return Ok(());
        }
        let seq = erase_lines_sequence(lines);
        self.write_str(&seq)
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        if self.tty {
            self.write_str(HIDE_CURSOR)?;
        }
        Ok(())
    }

    pub fn show_cursor(&mut self) -> io::Result<()> {
        if self.tty {
            self.write_str(SHOW_CURSOR)?;
        }
        Ok(())
    }

    pub fn line(&mut self, kind: LineKind, text: &str) -> io::Result<()> {
        let line = frame_line(kind, text, self.tty);
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    pub fn intro(&mut self, title: &str) -> io::Result<()> {
        self.line(LineKind::Intro, title)
    }

    pub fn info(&mut self, text: &str) -> io::Result<()> {
        self.line(LineKind::Info, text)
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        self.line(LineKind::Success, text)
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        self.line(LineKind::Warn, text)
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        self.line(LineKind::Error, text)
    }

    pub fn outro(&mut self, text: &str) -> io::Result<()> {
        self.line(LineKind::Outro, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SharedBuf;

    #[test]
    fn visual_rows_ceiling_divides() {
        assert_eq!(visual_rows(1, 80), 1);
        assert_eq!(visual_rows(80, 80), 1);
        assert_eq!(visual_rows(81, 80), 2);
        assert_eq!(visual_rows(160, 80), 2);
        assert_eq!(visual_rows(161, 80), 3);
        assert_eq!(visual_rows(7, 1), 7);
    }

    #[test]
    fn visual_rows_is_never_zero() {
        for width in [0, 1, 5, 80, 200] {
            assert_eq!(visual_rows(0, width), 1);
        }
        for len in [0, 1, 79, 500] {
            assert_eq!(visual_rows(len, 0), 1);
        }
    }

    #[test]
    fn clear_single_row_only_touches_current_line() {
        assert_eq!(clear_rows_sequence(0), CLEAR_LINE);
        assert_eq!(clear_rows_sequence(1), CLEAR_LINE);
    }

    #[test]
    fn clear_multiple_rows_walks_down_then_returns_to_top() {
        let seq = clear_rows_sequence(3);
        assert_eq!(
            seq,
            "\x1b[2A\r\x1b[2K\x1b[1B\r\x1b[2K\x1b[1B\r\x1b[2K\x1b[2A"
        );
        assert_eq!(seq.matches("\x1b[2K").count(), 3);
    }

    #[test]
    fn clear_then_redraw_emits_one_clear_per_previous_row() {
        let buf = SharedBuf::default();
        let mut surface = Surface::new(buf.clone(), true).with_columns(10);
        let content = "abcdefghijklmnopqrstuvw";
        let rows = visual_rows(display_width(content), surface.width());
        assert_eq!(rows, 3);

        surface.clear_rows(rows).expect("clear");
        surface.write_str(content).expect("write");
        let out = buf.contents();
        assert_eq!(out.matches("\x1b[2K").count(), 3);
        assert!(out.ends_with(content));
    }

    #[test]
    fn erase_lines_moves_up_once_per_line() {
        let seq = erase_lines_sequence(2);
        assert_eq!(seq, "\x1b[1A\r\x1b[2K\x1b[1A\r\x1b[2K");
        assert_eq!(erase_lines_sequence(0), "");
    }

    #[test]
    fn non_tty_surface_writes_plain_framed_lines() {
        let buf = SharedBuf::default();
        let mut surface = Surface::new(buf.clone(), false);
        surface.intro("woof").expect("intro");
        surface.warn("careful").expect("warn");
        surface.error("broken").expect("error");
        surface.clear_rows(4).expect("clear");
        assert_eq!(buf.contents(), "woof\nwarning: careful\nerror: broken\n");
    }

    #[test]
    fn tty_lines_carry_glyphs_and_color() {
        let line = frame_line(LineKind::Warn, "careful", true);
        assert!(line.contains("▲"));
        assert!(line.contains("\x1b[33m"));
        assert!(line.ends_with("careful"));
    }

    #[test]
    fn paint_is_plain_off_tty() {
        assert_eq!(paint(Style::Bold, "x", false), "x");
        assert_eq!(paint(Style::Bold, "x", true), "\x1b[1mx\x1b[0m");
    }

    #[test]
    fn truncate_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        let cut = truncate_to_width("a long option label", 8);
        assert_eq!(display_width(&cut), 8);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn non_tty_width_falls_back_to_eighty() {
        let surface = Surface::new(Vec::new(), false);
        assert_eq!(surface.width(), 80);
    }
}
