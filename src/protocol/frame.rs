//! State notification frames
//!
//! ## Frame Format
//! ```text
//! ┌──────────────┬──────────────┐
//! │ Previous (1) │ Current (1)  │
//! └──────────────┴──────────────┘
//! ```
//!
//! No header, no checksum, no length prefix. Over UDP one datagram carries
//! exactly one frame. Over serial the frame is followed by a line terminator.

use crate::edge::{decode, Edge, Snapshot};
use crate::error::{Result, SdiError};
use super::{CR, LF};

/// Size of a state frame on the wire
pub const FRAME_LEN: usize = 2;

/// One state-change notification: the snapshot before and after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateFrame {
    pub previous: Snapshot,
    pub current: Snapshot,
}

impl StateFrame {
    pub fn new(previous: u8, current: u8) -> Self {
        Self {
            previous: Snapshot(previous),
            current: Snapshot(current),
        }
    }

    /// Decode a frame, rejecting anything that is not exactly 2 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FRAME_LEN {
            return Err(SdiError::Protocol(format!(
                "state frame must be {} bytes, got {}",
                FRAME_LEN,
                bytes.len()
            )));
        }
        Ok(Self::new(bytes[0], bytes[1]))
    }

    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        [self.previous.0, self.current.0]
    }

    /// Channel transitions between the two snapshots
    pub fn edges(&self) -> Vec<Edge> {
        decode(self.previous, self.current)
    }
}

/// Assembles serial notification lines: 2 payload bytes then `\n` or `\r\n`
///
/// Payload bytes are taken by position, so `0x0A` and `0x0D` are valid
/// snapshot values.
#[derive(Debug, Default)]
pub struct LineFrameAssembler {
    pending: Vec<u8>,
}

impl LineFrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte, returning a frame once its terminator arrives
    pub fn push(&mut self, byte: u8) -> Result<Option<StateFrame>> {
        self.pending.push(byte);
        if self.pending.len() <= FRAME_LEN {
            return Ok(None);
        }

        match byte {
            LF => {
                let frame = StateFrame::new(self.pending[0], self.pending[1]);
                self.pending.clear();
                Ok(Some(frame))
            }
            CR if self.pending.len() == FRAME_LEN + 1 => Ok(None),
            other => {
                self.pending.clear();
                Err(SdiError::Protocol(format!(
                    "malformed notification line: unexpected byte 0x{:02x} after payload",
                    other
                )))
            }
        }
    }

    /// Whether a frame is partially received
    pub fn is_mid_frame(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
