//! Serial transport
//!
//! Replies are newline-terminated, so one byte-wise line read per query is
//! enough and nothing past the terminator is consumed.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::{Result, SdiError};
use crate::protocol::read_line;
use super::{not_connected, Transport};

/// Port timeout standing in for "block indefinitely"
///
/// Kept under `u32::MAX` milliseconds so every platform backend accepts it.
const INDEFINITE: Duration = Duration::from_secs(24 * 24 * 60 * 60);

/// Serial port channel to an instrument
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,

    /// Port name and baud rate for logging
    target: String,

    /// Logical timeout; `None` is mapped to `INDEFINITE` on the port
    timeout: Option<Duration>,
}

impl SerialTransport {
    /// Open and configure a serial port
    ///
    /// No baud-rate negotiation happens; `baud_rate` should match the
    /// instrument's default.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Option<Duration>) -> Result<Self> {
        let target = format!("{}@{}", port_name, baud_rate);

        let port = serialport::new(port_name, baud_rate)
            .timeout(Self::port_timeout(timeout))
            .open()
            .map_err(|e| SdiError::Connect {
                target: target.clone(),
                source: io::Error::from(e),
            })?;

        tracing::debug!("Serial port {} opened", target);

        Ok(Self {
            port: Some(port),
            target,
            timeout,
        })
    }

    fn port_timeout(timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or(INDEFINITE)
    }

    fn port(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        match self.port.as_mut() {
            Some(port) => Ok(port),
            None => Err(not_connected(&self.target)),
        }
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port()?;
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        let timeout = self.timeout;
        let port = self.port()?;
        loop {
            match port.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SdiError::from_read(e, timeout)),
            }
        }
    }

    fn read_reply(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let timeout = self.timeout;
        let port = self.port()?;
        read_line(port, max_len, timeout)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.port()?
            .set_timeout(Self::port_timeout(timeout))
            .map_err(io::Error::from)?;
        self.timeout = timeout;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            tracing::debug!("Serial port {} closed", self.target);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("serial {}", self.target)
    }
}
