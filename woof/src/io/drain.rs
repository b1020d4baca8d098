//! Chunked pipe consumer with optional mirroring and early stop.

use std::io::{self, Read, Write};

use anyhow::{Context, Result};

pub const CHUNK_SIZE: usize = 8192;

/// Everything read from one stream.
#[derive(Debug, Default)]
pub struct Drained {
    pub bytes: Vec<u8>,
    /// The stop predicate fired before end of stream.
    pub stopped_early: bool,
}

/// Read `reader` to EOF in fixed-size chunks.
///
/// Each chunk is appended, then mirrored to `mirror` if present, then
/// `should_stop` sees the whole accumulated buffer. A stop takes effect only
/// after the current chunk is fully appended.
pub fn drain_stream<R, W, F>(
    mut reader: R,
    mut mirror: Option<W>,
    mut should_stop: F,
) -> Result<Drained>
where
    R: Read,
    W: Write,
    F: FnMut(&[u8]) -> bool,
{
    let mut drained = Drained::default();
    let mut chunk = [0u8; CHUNK_SIZE];

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err).context("read output"),
        };
        drained.bytes.extend_from_slice(&chunk[..n]);
        if let Some(out) = mirror.as_mut() {
            out.write_all(&chunk[..n]).context("mirror output")?;
            out.flush().context("flush mirrored output")?;
        }
        if should_stop(&drained.bytes) {
            drained.stopped_early = true;
            break;
        }
    }

    Ok(drained)
}

/// Read `reader` to EOF with no mirroring and no early stop.
pub fn drain_to_end<R: Read>(reader: R) -> Result<Vec<u8>> {
    Ok(drain_stream(reader, None::<io::Sink>, |_| false)?.bytes)
}
