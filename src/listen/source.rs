//! Frame sources
//!
//! Where a listen session gets its 2-byte state frames from.

use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use crate::config::{Config, ListenOptions};
use crate::error::{Result, SdiError};
use crate::protocol::{LineFrameAssembler, StateFrame, LF};
use crate::transport::Transport;

/// A state frame and who sent it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub frame: StateFrame,

    /// Sender address (UDP only)
    pub source: Option<SocketAddr>,
}

/// Producer of state frames for a listen session
pub trait FrameSource {
    /// Prepare to receive (raise the timeout, bind a socket)
    fn arm(&mut self) -> Result<()>;

    /// Wait up to one poll slice for a frame
    ///
    /// `Ok(None)` means the slice elapsed with no complete frame.
    fn next_frame(&mut self) -> Result<Option<ReceivedFrame>>;

    /// Undo `arm`. Must be safe to call when not armed.
    fn disarm(&mut self) -> Result<()>;

    /// Source description for logging
    fn describe(&self) -> String;
}

// =============================================================================
// Serial Line Source
// =============================================================================

/// Frames read from the command transport's line
///
/// Arming saves the transport timeout and replaces it with the poll interval;
/// disarming (or dropping) puts the saved value back exactly once.
pub struct LineFrameSource<'a, T: Transport> {
    transport: &'a mut T,
    poll_interval: Option<Duration>,

    /// Timeout in force before `arm`, present only while armed
    saved_timeout: Option<Option<Duration>>,

    /// Drop one leading `\n` left over from the last reply's split `\r\n`
    skip_lf: bool,

    assembler: LineFrameAssembler,
}

impl<'a, T: Transport> LineFrameSource<'a, T> {
    pub fn new(transport: &'a mut T, options: ListenOptions) -> Self {
        Self {
            transport,
            poll_interval: options.poll_interval,
            saved_timeout: None,
            skip_lf: false,
            assembler: LineFrameAssembler::new(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.saved_timeout.is_some()
    }
}

impl<T: Transport> FrameSource for LineFrameSource<'_, T> {
    fn arm(&mut self) -> Result<()> {
        if self.is_armed() {
            return Err(SdiError::InvalidState("line source already armed".to_string()));
        }

        let previous = self.transport.timeout();
        self.transport.set_timeout(self.poll_interval)?;
        self.saved_timeout = Some(previous);
        self.skip_lf = self.transport.take_pending_lf();

        tracing::debug!(
            "Armed {} (timeout {:?} saved, polling every {:?})",
            self.transport.describe(),
            previous,
            self.poll_interval
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<ReceivedFrame>> {
        let mut byte = [0u8; 1];

        loop {
            match self.transport.read_raw(&mut byte) {
                Ok(0) if self.assembler.is_mid_frame() => {
                    self.assembler.reset();
                    return Err(SdiError::Protocol(
                        "short notification frame: channel closed mid-frame".to_string(),
                    ));
                }
                Ok(0) => return Err(SdiError::closed("notification frame")),
                Ok(_) => {
                    if std::mem::take(&mut self.skip_lf) && byte[0] == LF {
                        tracing::trace!("Dropped split reply terminator before first frame");
                        continue;
                    }
                    if let Some(frame) = self.assembler.push(byte[0])? {
                        return Ok(Some(ReceivedFrame { frame, source: None }));
                    }
                }
                // Partial frame bytes stay in the assembler for the next slice
                Err(e) if e.is_timeout() => return Ok(None),
                Err(e) => return Err(e),
            }
        }
    }

    fn disarm(&mut self) -> Result<()> {
        if let Some(previous) = self.saved_timeout.take() {
            self.assembler.reset();
            self.skip_lf = false;
            self.transport.set_timeout(previous)?;
            tracing::debug!(
                "Disarmed {} (timeout restored to {:?})",
                self.transport.describe(),
                previous
            );
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.transport.describe()
    }
}

impl<T: Transport> Drop for LineFrameSource<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.disarm() {
            tracing::warn!("Failed to restore transport timeout: {}", e);
        }
    }
}

// =============================================================================
// UDP Source
// =============================================================================

/// Largest datagram accepted; anything other than 2 bytes is rejected
const DATAGRAM_BUF: usize = 64;

/// Frames received as UDP datagrams, one frame per datagram
pub struct UdpFrameSource {
    bind_addr: String,
    poll_interval: Option<Duration>,
    socket: Option<UdpSocket>,
    armed: bool,
}

impl UdpFrameSource {
    /// Source that binds `bind_addr` (`host:port`) when armed
    pub fn new(bind_addr: impl Into<String>, options: ListenOptions) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            poll_interval: options.poll_interval,
            socket: None,
            armed: false,
        }
    }

    /// Source on the config's UDP interface address and port
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.udp_bind(), config.listen)
    }

    /// Source on an already bound socket
    pub fn from_socket(socket: UdpSocket, options: ListenOptions) -> Result<Self> {
        let bind_addr = socket.local_addr()?.to_string();
        Ok(Self {
            bind_addr,
            poll_interval: options.poll_interval,
            socket: Some(socket),
            armed: false,
        })
    }

    /// Bound address, once a socket exists
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }
}

impl FrameSource for UdpFrameSource {
    fn arm(&mut self) -> Result<()> {
        if self.armed {
            return Err(SdiError::InvalidState("udp source already armed".to_string()));
        }

        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => UdpSocket::bind(&self.bind_addr).map_err(|source| SdiError::Connect {
                target: self.bind_addr.clone(),
                source,
            })?,
        };
        // std rejects a zero timeout; None blocks
        socket.set_read_timeout(self.poll_interval)?;

        tracing::debug!(
            "Listening for notifications on udp {}",
            socket
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| self.bind_addr.clone())
        );
        self.socket = Some(socket);
        self.armed = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<ReceivedFrame>> {
        let socket = match self.socket.as_ref() {
            Some(socket) if self.armed => socket,
            _ => return Err(SdiError::InvalidState("udp source not armed".to_string())),
        };

        let mut buf = [0u8; DATAGRAM_BUF];
        match socket.recv_from(&mut buf) {
            Ok((n, addr)) => {
                let frame = StateFrame::from_bytes(&buf[..n]).map_err(|e| {
                    tracing::warn!("Malformed datagram from {}: {}", addr, e);
                    e
                })?;
                Ok(Some(ReceivedFrame {
                    frame,
                    source: Some(addr),
                }))
            }
            Err(e) => match SdiError::from_read(e, self.poll_interval) {
                SdiError::Timeout(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    fn disarm(&mut self) -> Result<()> {
        if self.armed {
            self.armed = false;
            self.socket = None;
            tracing::debug!("Closed udp notification socket {}", self.bind_addr);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("udp {}", self.bind_addr)
    }
}
