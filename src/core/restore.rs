//! Purpose: Split a newline-delimited restore stream into size-bounded chunks.
//! Exports: `stream_chunks`, `DEFAULT_MAX_RESTORE_SIZE`.
//! Role: Pure chunking over `BufRead`; the caller turns each chunk into one invocation.
//! Invariants: Lines are never split across chunks; order is preserved.
//! Invariants: A chunk exceeds `max_chunk` only when a single line does.
//! Invariants: The final buffer is always handed to the sink, even when empty.
//! Invariants: The first sink error stops the stream.
use std::io::BufRead;

use tracing::debug;

use crate::core::error::{Error, ErrorKind};

/// Pipe capacity the tool's stdin can absorb in one session.
pub const DEFAULT_MAX_RESTORE_SIZE: usize = 1 << 16;

/// Feed `reader` to `sink` in chunks of at most `max_chunk` bytes.
///
/// Returns the number of chunks delivered.
pub fn stream_chunks<R, F>(mut reader: R, max_chunk: usize, mut sink: F) -> Result<usize, Error>
where
    R: BufRead,
    F: FnMut(&[u8]) -> Result<(), Error>,
{
    let mut buf = Vec::with_capacity(max_chunk.min(DEFAULT_MAX_RESTORE_SIZE));
    let mut line = Vec::new();
    let mut chunks = 0usize;

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(err.to_string())
                .with_source(err)
        })?;
        if read == 0 {
            break;
        }
        if !buf.is_empty() && buf.len() + line.len() > max_chunk {
            debug!(chunk = chunks, bytes = buf.len(), "restore chunk");
            sink(&buf)?;
            chunks += 1;
            buf.clear();
        }
        buf.extend_from_slice(&line);
    }

    debug!(chunk = chunks, bytes = buf.len(), "restore final chunk");
    sink(&buf)?;
    Ok(chunks + 1)
}
