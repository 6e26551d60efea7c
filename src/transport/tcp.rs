//! TCP transport
//!
//! Connects eagerly. A reply may be split across segments, so it is
//! accumulated chunk by chunk until the buffer's last byte is a terminator.
//! A reply that stops at a bare `\r` may leave its `\n` for the next read;
//! the transport remembers that and drops the stray byte once.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Result, SdiError};
use crate::protocol::{ends_with_bare_cr, read_chunked};
use super::{not_connected, Transport};

/// TCP socket channel to an instrument
pub struct TcpTransport {
    stream: Option<TcpStream>,

    /// Peer address for logging
    peer_addr: String,

    timeout: Option<Duration>,

    /// Bounded read size per `recv`
    chunk_size: usize,

    /// Last reply ended in a bare `\r`
    pending_lf: bool,
}

impl TcpTransport {
    /// Connect to `host:port`, trying each resolved address in turn
    ///
    /// The timeout bounds the connect attempt as well as later reads
    /// and writes.
    pub fn connect(
        host: &str,
        port: u16,
        timeout: Option<Duration>,
        chunk_size: usize,
    ) -> Result<Self> {
        let target = format!("{}:{}", host, port);
        let connect_err = |source: io::Error| SdiError::Connect {
            target: target.clone(),
            source,
        };

        let addrs = (host, port).to_socket_addrs().map_err(connect_err)?;

        let mut last_err = None;
        let mut connected = None;
        for addr in addrs {
            let attempt = match timeout {
                Some(t) => TcpStream::connect_timeout(&addr, t),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        let stream = match connected {
            Some(stream) => stream,
            None => {
                return Err(connect_err(last_err.unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::AddrNotAvailable, "no addresses resolved")
                })))
            }
        };

        Self::from_stream(stream, timeout, chunk_size)
    }

    /// Wrap an already connected stream
    pub fn from_stream(
        stream: TcpStream,
        timeout: Option<Duration>,
        chunk_size: usize,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Commands are tiny; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            stream: Some(stream),
            peer_addr,
            timeout,
            chunk_size,
            pending_lf: false,
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Read and write timeouts as currently set on the socket
    pub fn socket_timeouts(&self) -> Result<(Option<Duration>, Option<Duration>)> {
        match self.stream.as_ref() {
            Some(stream) => Ok((stream.read_timeout()?, stream.write_timeout()?)),
            None => Err(not_connected(&self.peer_addr)),
        }
    }

    fn stream(&mut self) -> Result<&mut TcpStream> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => Err(not_connected(&self.peer_addr)),
        }
    }
}

impl Transport for TcpTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let stream = self.stream()?;
        stream.write_all(bytes)?;
        stream.flush()?;
        Ok(())
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> Result<usize> {
        let timeout = self.timeout;
        let stream = self.stream()?;
        loop {
            match stream.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SdiError::from_read(e, timeout)),
            }
        }
    }

    fn read_reply(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let (timeout, chunk_size) = (self.timeout, self.chunk_size);
        let skip_leading_lf = std::mem::take(&mut self.pending_lf);
        let stream = self.stream()?;
        let reply = read_chunked(stream, chunk_size, max_len, timeout, skip_leading_lf)?;
        self.pending_lf = ends_with_bare_cr(&reply);
        Ok(reply)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        let stream = self.stream()?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)?;
        self.timeout = timeout;
        Ok(())
    }

    fn take_pending_lf(&mut self) -> bool {
        std::mem::take(&mut self.pending_lf)
    }

    fn close(&mut self) -> Result<()> {
        self.pending_lf = false;
        if let Some(stream) = self.stream.take() {
            // Peer may already be gone
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                tracing::debug!("Shutdown of {} failed: {}", self.peer_addr, e);
            }
            tracing::debug!("Connection to {} closed", self.peer_addr);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("tcp {}", self.peer_addr)
    }
}
