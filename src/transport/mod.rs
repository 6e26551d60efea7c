//! Transport Module
//!
//! Byte-oriented duplex channels to an instrument.
//!
//! ## Variants
//! - `SerialTransport`: serial port, replies read byte-wise up to `\n`
//! - `TcpTransport`: TCP socket, replies read in bounded chunks until the
//!   buffer ends with `\r` or `\n`
//!
//! A transport owns exactly one channel and serves at most one in-flight
//! query. Nothing is buffered between calls.

mod serial;
mod tcp;

use std::time::Duration;

use crate::config::{Config, Endpoint};
use crate::error::Result;

pub use serial::SerialTransport;
pub use tcp::TcpTransport;

/// Duplex byte channel with a mutable read timeout
pub trait Transport: Send {
    /// Write all bytes, failing with an I/O error on a partial or broken write
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read whatever is available (up to `buf.len()`)
    ///
    /// Fails with `Timeout` when the current timeout elapses with no data.
    /// `Ok(0)` means the peer closed the channel.
    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Read one terminated reply, terminator included
    fn read_reply(&mut self, max_len: usize) -> Result<Vec<u8>>;

    /// Current read timeout, `None` blocks indefinitely
    fn timeout(&self) -> Option<Duration>;

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;

    /// Release the channel; later calls fail with `NotConnected`
    fn close(&mut self) -> Result<()>;

    /// Whether the last reply ended in a bare `\r` whose `\n` may still be
    /// in flight. Clears the flag.
    fn take_pending_lf(&mut self) -> bool {
        false
    }

    /// Target description for logging
    fn describe(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_raw(buf)
    }

    fn read_reply(&mut self, max_len: usize) -> Result<Vec<u8>> {
        (**self).read_reply(max_len)
    }

    fn timeout(&self) -> Option<Duration> {
        (**self).timeout()
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_timeout(timeout)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn take_pending_lf(&mut self) -> bool {
        (**self).take_pending_lf()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Open the transport named by the config's endpoint
pub fn open(config: &Config) -> Result<Box<dyn Transport>> {
    config.validate()?;

    let transport: Box<dyn Transport> = match &config.endpoint {
        Endpoint::Serial { port, baud_rate } => {
            Box::new(SerialTransport::open(port, *baud_rate, config.timeout)?)
        }
        Endpoint::Tcp { host, port } => Box::new(TcpTransport::connect(
            host,
            *port,
            config.timeout,
            config.chunk_size,
        )?),
    };

    tracing::debug!("Opened transport {}", transport.describe());
    Ok(transport)
}

pub(crate) fn not_connected(target: &str) -> crate::error::SdiError {
    std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        format!("transport {} is closed", target),
    )
    .into()
}
