//! Background "working" indicator.
//!
//! The animation thread only reads the running flag and the message; the
//! owner is the only writer of both. Off a TTY no thread is started and the
//! message is printed once.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::ui::{CLEAR_LINE, HIDE_CURSOR, LineKind, SHOW_CURSOR, Style, frame_line, paint};
use crate::ui::{terminal_width, truncate_to_width};

pub const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const FRAME_INTERVAL: Duration = Duration::from_millis(80);

pub struct Spinner<W: Write + Send + 'static> {
    out: Arc<Mutex<W>>,
    tty: bool,
    running: Arc<AtomicBool>,
    message: Arc<Mutex<String>>,
    handle: Option<JoinHandle<()>>,
}

impl<W: Write + Send + 'static> Spinner<W> {
    /// Start animating `message` on `out`.
    pub fn start(out: W, tty: bool, message: impl Into<String>) -> Self {
        let message = message.into();
        let out = Arc::new(Mutex::new(out));
        let running = Arc::new(AtomicBool::new(true));
        let shared_message = Arc::new(Mutex::new(message.clone()));

        let handle = if tty {
            {
                let mut out = lock(&out);
                let _ = out.write_all(HIDE_CURSOR.as_bytes());
                let _ = out.flush();
            }
            let columns = terminal_width(tty);
            let out = Arc::clone(&out);
            let running = Arc::clone(&running);
            let shared_message = Arc::clone(&shared_message);
            Some(thread::spawn(move || {
                animate(&out, &running, &shared_message, columns);
            }))
        } else {
            let mut out = lock(&out);
            let _ = writeln!(out, "{message}");
            let _ = out.flush();
            None
        };

        Self {
            out,
            tty,
            running,
            message: shared_message,
            handle,
        }
    }

    /// Replace the message shown from the next frame on.
    pub fn set_message(&self, message: impl Into<String>) {
        *lock(&self.message) = message.into();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the animation and print `final_message` as a framed line.
    pub fn stop(mut self, final_message: &str) {
        self.finish(Some((LineKind::Success, final_message)));
    }

    pub fn stop_with_warning(mut self, message: &str) {
        self.finish(Some((LineKind::Warn, message)));
    }

    /// Stop the animation and print `message` as a framed error line.
    pub fn stop_with_error(mut self, message: &str) {
        self.finish(Some((LineKind::Error, message)));
    }

    fn finish(&mut self, line: Option<(LineKind, &str)>) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            debug!("spinner thread panicked");
        }
        let mut out = lock(&self.out);
        if self.tty {
            let _ = out.write_all(CLEAR_LINE.as_bytes());
            let _ = out.write_all(SHOW_CURSOR.as_bytes());
        }
        if let Some((kind, text)) = line {
            let _ = writeln!(out, "{}", frame_line(kind, text, self.tty));
        }
        let _ = out.flush();
    }
}

impl<W: Write + Send + 'static> Drop for Spinner<W> {
    fn drop(&mut self) {
        if self.is_running() {
            self.finish(None);
        }
    }
}

fn animate<W: Write>(
    out: &Mutex<W>,
    running: &AtomicBool,
    message: &Mutex<String>,
    columns: usize,
) {
    let mut frame = 0usize;
    while running.load(Ordering::SeqCst) {
        let text = lock(message).clone();
        let text = truncate_to_width(&text, columns.saturating_sub(3));
        {
            let mut out = lock(out);
            let glyph = paint(Style::Cyan, FRAMES[frame % FRAMES.len()], true);
            let _ = write!(out, "{CLEAR_LINE}{glyph} {text}");
            let _ = out.flush();
        }
        frame = frame.wrapping_add(1);
        thread::sleep(FRAME_INTERVAL);
    }
}

/// A panicking writer must not take the cursor restore down with it.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
