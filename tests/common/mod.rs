//! Shared test helpers
//!
//! A scripted in-memory transport standing in for a serial port or socket.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read};
use std::time::Duration;

use sdi_client::protocol::{ends_with_bare_cr, read_chunked, LF};
use sdi_client::{Result, SdiError, Transport};

/// One scripted outcome of a physical read
#[derive(Debug, Clone)]
pub enum ReadStep {
    /// Bytes available; split across reads if the caller's buffer is small
    Data(Vec<u8>),

    /// The read timeout elapses
    Timeout,

    /// The channel fails with this error kind
    Fail(io::ErrorKind),
}

/// Queue of read outcomes; an empty queue reads as a closed channel
#[derive(Debug, Default)]
pub struct ScriptedReads {
    steps: VecDeque<ReadStep>,
}

impl Read for ScriptedReads {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            None => Ok(0),
            Some(ReadStep::Timeout) => Err(io::Error::new(io::ErrorKind::WouldBlock, "timed out")),
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            Some(ReadStep::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.push_front(ReadStep::Data(bytes.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

/// In-memory transport with scripted reads and recorded writes
#[derive(Debug)]
pub struct ScriptedTransport {
    reads: ScriptedReads,

    /// Everything written, in order
    pub written: Vec<u8>,

    /// Answer each written command with itself terminated by `\r`
    echo: bool,

    timeout: Option<Duration>,

    /// Every value passed to `set_timeout`
    pub timeout_history: Vec<Option<Duration>>,

    /// Make `set_timeout` fail from now on
    pub fail_set_timeout: bool,

    pub closed: bool,

    /// Last reply ended in a bare `\r`
    pending_lf: bool,
}

impl ScriptedTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            reads: ScriptedReads::default(),
            written: Vec::new(),
            echo: false,
            timeout,
            timeout_history: Vec::new(),
            fail_set_timeout: false,
            closed: false,
            pending_lf: false,
        }
    }

    pub fn echoing(timeout: Option<Duration>) -> Self {
        let mut transport = Self::new(timeout);
        transport.echo = true;
        transport
    }

    pub fn push(&mut self, step: ReadStep) -> &mut Self {
        self.reads.steps.push_back(step);
        self
    }

    pub fn push_data(&mut self, bytes: &[u8]) -> &mut Self {
        self.push(ReadStep::Data(bytes.to_vec()))
    }

    /// Written bytes split into lines
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written)
            .split_terminator('\n')
            .map(str::to_string)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed").into());
        }
        self.written.extend_from_slice(bytes);
        if self.echo {
            let mut reply: Vec<u8> = bytes.iter().copied().filter(|b| *b != LF).collect();
            reply.push(b'\r');
            self.reads.steps.push_back(ReadStep::Data(reply));
        }
        Ok(())
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.reads
            .read(buf)
            .map_err(|e| SdiError::from_read(e, self.timeout))
    }

    fn read_reply(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let skip = std::mem::take(&mut self.pending_lf);
        let reply = read_chunked(&mut self.reads, 512, max_len, self.timeout, skip)?;
        self.pending_lf = ends_with_bare_cr(&reply);
        Ok(reply)
    }

    fn take_pending_lf(&mut self) -> bool {
        std::mem::take(&mut self.pending_lf)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        if self.fail_set_timeout {
            return Err(io::Error::new(io::ErrorKind::Other, "scripted set_timeout failure").into());
        }
        self.timeout_history.push(timeout);
        self.timeout = timeout;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
