//! Reply codec
//!
//! Accumulation of inbound replies and decoding to caller-facing strings.
//!
//! ## Reply Format
//! ```text
//! ┌─────────────────────────────────┬─────────────┐
//! │        ASCII reply text         │ \r and/or \n │
//! └─────────────────────────────────┴─────────────┘
//! ```
//!
//! Two read strategies exist. Serial lines are read one byte at a time up to
//! `\n`, so nothing after the terminator is consumed. TCP replies are read in
//! bounded chunks and the accumulated buffer's trailing byte is checked after
//! each chunk, since one reply may span several segments.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::BytesMut;

use crate::error::{Result, SdiError};
use super::{CR, LF};

/// Whether a byte terminates a reply
pub fn is_terminator(byte: u8) -> bool {
    byte == CR || byte == LF
}

/// Whether an accumulated buffer's trailing byte is a terminator
pub fn ends_with_terminator(buf: &[u8]) -> bool {
    buf.last().copied().map(is_terminator).unwrap_or(false)
}

/// Whether a reply ended in a bare `\r`, leaving a possible `\n` in flight
pub fn ends_with_bare_cr(buf: &[u8]) -> bool {
    buf.last() == Some(&CR)
}

/// Decode a raw reply, stripping terminators and surrounding whitespace
pub fn decode_reply(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

/// Read once, retrying on `Interrupted`
fn read_some<R: Read + ?Sized>(
    reader: &mut R,
    buf: &mut [u8],
    timeout: Option<Duration>,
) -> Result<usize> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(SdiError::from_read(e, timeout)),
        }
    }
}

fn too_long(max_len: usize) -> SdiError {
    SdiError::Protocol(format!("reply exceeds {} bytes", max_len))
}

/// Read a reply line byte by byte up to and including `\n`
///
/// `timeout` is only used to label a timeout error; the reader applies it.
pub fn read_line<R: Read + ?Sized>(
    reader: &mut R,
    max_len: usize,
    timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        if read_some(reader, &mut byte, timeout)? == 0 {
            return Err(SdiError::closed("reply terminator"));
        }
        line.push(byte[0]);

        if line.len() > max_len {
            return Err(too_long(max_len));
        }
        if byte[0] == LF {
            return Ok(line);
        }
    }
}

/// Read a reply in chunks of at most `chunk_size` until the buffer ends
/// with `\r` or `\n`
///
/// Set `skip_leading_lf` when the previous reply on this channel ended in a
/// bare `\r`: a `\n` at the very start of the accumulation is then the tail
/// of a `\r\n` split across segments and is dropped. Otherwise a lone `\n`
/// is an empty reply.
pub fn read_chunked<R: Read + ?Sized>(
    reader: &mut R,
    chunk_size: usize,
    max_len: usize,
    timeout: Option<Duration>,
    skip_leading_lf: bool,
) -> Result<Vec<u8>> {
    let mut reply = BytesMut::with_capacity(chunk_size);
    let mut chunk = vec![0u8; chunk_size];
    let mut at_start = skip_leading_lf;

    loop {
        let n = read_some(reader, &mut chunk, timeout)?;
        if n == 0 {
            return Err(SdiError::closed("reply terminator"));
        }

        let mut data = &chunk[..n];
        if at_start {
            at_start = false;
            if data[0] == LF {
                data = &data[1..];
                if data.is_empty() {
                    continue;
                }
            }
        }

        reply.extend_from_slice(data);
        if reply.len() > max_len {
            return Err(too_long(max_len));
        }
        if ends_with_terminator(&reply) {
            return Ok(reply.to_vec());
        }
    }
}
