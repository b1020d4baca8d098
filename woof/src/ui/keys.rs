//! Key decoding for the prompt widgets.

use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

use crate::ui::sys;

/// How long to wait for the rest of an escape sequence before treating ESC as bare.
pub const ESCAPE_TIMEOUT: Duration = Duration::from_millis(25);

/// One decoded key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
    CtrlC,
    /// The input stream closed.
    Eof,
}

impl Key {
    /// Keys that abort the active widget.
    pub fn is_cancel(self) -> bool {
        matches!(self, Key::Escape | Key::CtrlC | Key::Eof)
    }
}

/// Byte source the widgets read from.
pub trait KeyInput {
    /// Block until one byte arrives. `None` means end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Read one byte if it arrives within `timeout`.
    fn read_byte_within(&mut self, timeout: Duration) -> io::Result<Option<u8>>;
}

/// Keys read directly from the stdin descriptor.
#[derive(Debug)]
pub struct StdinKeys {
    fd: RawFd,
}

impl StdinKeys {
    pub fn new() -> Self {
        Self { fd: sys::STDIN_FD }
    }
}

impl Default for StdinKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyInput for StdinKeys {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        sys::read_byte(self.fd)
    }

    fn read_byte_within(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        if sys::poll_readable(self.fd, millis)? {
            sys::read_byte(self.fd)
        } else {
            Ok(None)
        }
    }
}

/// Read the next recognised key, discarding bytes that map to nothing.
pub fn read_key<I: KeyInput + ?Sized>(input: &mut I) -> io::Result<Key> {
    loop {
        let Some(byte) = input.read_byte()? else {
            return Ok(Key::Eof);
        };
        let key = match byte {
            0x03 => Some(Key::CtrlC),
            b'\r' | b'\n' => Some(Key::Enter),
            0x7f | 0x08 => Some(Key::Backspace),
            0x1b => read_escape(input)?,
            0x20..=0x7e => Some(Key::Char(char::from(byte))),
            0xc0..=0xf7 => read_utf8(input, byte)?,
            _ => None,
        };
        if let Some(key) = key {
            return Ok(key);
        }
    }
}

fn read_escape<I: KeyInput + ?Sized>(input: &mut I) -> io::Result<Option<Key>> {
    let Some(next) = input.read_byte_within(ESCAPE_TIMEOUT)? else {
        return Ok(Some(Key::Escape));
    };
    match next {
        b'[' | b'O' => {}
        0x1b => return Ok(Some(Key::Escape)),
        // Alt+key and friends.
        _ => return Ok(None),
    }
    let Some(final_byte) = input.read_byte_within(ESCAPE_TIMEOUT)? else {
        return Ok(Some(Key::Escape));
    };
    let key = match final_byte {
        b'A' => Some(Key::Up),
        b'B' => Some(Key::Down),
        b'C' => Some(Key::Right),
        b'D' => Some(Key::Left),
        0x30..=0x3f => {
            // Parameterised sequence such as `ESC [ 3 ~`; swallow up to its final byte.
            while let Some(b) = input.read_byte_within(ESCAPE_TIMEOUT)? {
                if (0x40..=0x7e).contains(&b) {
                    break;
                }
            }
            None
        }
        _ => None,
    };
    Ok(key)
}

fn read_utf8<I: KeyInput + ?Sized>(input: &mut I, lead: u8) -> io::Result<Option<Key>> {
    let len = match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    };
    let mut bytes = vec![lead];
    for _ in 1..len {
        match input.read_byte()? {
            Some(b) if b & 0xc0 == 0x80 => bytes.push(b),
            _ => return Ok(None),
        }
    }
    Ok(std::str::from_utf8(&bytes)
        .ok()
        .and_then(|s| s.chars().next())
        .map(Key::Char))
}
