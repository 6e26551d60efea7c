//! Listen Module
//!
//! Passive monitoring of unsolicited 2-byte state frames.
//!
//! ## State Machine
//! ```text
//!   Idle ──run()──▶ Armed ──first frame──▶ Receiving
//!                     │                        │
//!                     └──cancel / error────────┴──▶ Stopped
//! ```
//! - Arming saves the transport timeout (serial) or binds a socket (UDP)
//! - Every exit path disarms, so the saved timeout is restored exactly once
//! - The cancel token is checked between poll slices
//! - A malformed or short frame ends the session

mod source;

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Local};
use crossbeam::channel::{self, Receiver};
use serde::Serialize;

use crate::edge::{EdgeEvent, Snapshot};
use crate::error::{Result, SdiError};

pub use source::{FrameSource, LineFrameSource, ReceivedFrame, UdpFrameSource};

/// Shared stop flag for listen sessions
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request every session holding this token to stop
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Listen session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Armed,
    Receiving,
    Stopped,
}

/// One decoded frame, as delivered to the consumer
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub received_at: DateTime<Local>,

    /// Sender address (UDP only)
    pub source: Option<SocketAddr>,

    pub previous: Snapshot,
    pub current: Snapshot,

    /// Transitions in channel order, stamped with `received_at`
    pub edges: Vec<EdgeEvent>,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.received_at.format("%Y-%m-%d %H:%M:%S%.6f"))?;
        if let Some(addr) = self.source {
            write!(f, " {}", addr.ip())?;
        }
        write!(f, " 0x{:x} -> 0x{:x} {{", self.previous, self.current)?;
        for (i, edge) in self.edges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", edge.channel, edge.direction)?;
        }
        write!(f, "}}")
    }
}

/// Counters for a session that ended by cancellation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenSummary {
    /// Frames decoded
    pub frames: u64,

    /// Edge events delivered
    pub edges: u64,
}

/// Receive loop turning frames into notifications until cancelled
pub struct ListenSession<S: FrameSource> {
    source: S,
    state: SessionState,
    summary: ListenSummary,
}

impl<S: FrameSource> ListenSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: SessionState::Idle,
            summary: ListenSummary::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run until `cancel` fires, the source fails, or `sink` fails
    ///
    /// Blocks the calling thread. The source is disarmed on every exit path
    /// before this returns. A session runs once; `Stopped` is terminal.
    pub fn run<F>(&mut self, cancel: &CancelToken, mut sink: F) -> Result<ListenSummary>
    where
        F: FnMut(Notification) -> Result<()>,
    {
        if self.state != SessionState::Idle {
            return Err(SdiError::InvalidState(format!(
                "listen session is {:?}, expected Idle",
                self.state
            )));
        }

        // Step 1: Arm (Idle → Armed)
        if let Err(e) = self.source.arm() {
            self.state = SessionState::Stopped;
            if let Err(restore_err) = self.source.disarm() {
                tracing::warn!("Disarm after failed arm also failed: {}", restore_err);
            }
            return Err(e);
        }
        self.state = SessionState::Armed;
        tracing::debug!("Listen session armed on {}", self.source.describe());

        // Step 2: Receive until cancelled or failed
        let outcome = self.receive(cancel, &mut sink);

        // Step 3: Always disarm (→ Stopped)
        let restored = self.source.disarm();
        self.state = SessionState::Stopped;

        match (outcome, restored) {
            (Ok(()), Ok(())) => {
                tracing::debug!(
                    "Listen session on {} stopped: {} frames, {} edges",
                    self.source.describe(),
                    self.summary.frames,
                    self.summary.edges
                );
                Ok(self.summary)
            }
            (Ok(()), Err(restore_err)) => Err(restore_err),
            (Err(e), Ok(())) => {
                tracing::debug!("Listen session on {} failed: {}", self.source.describe(), e);
                Err(e)
            }
            (Err(e), Err(restore_err)) => {
                tracing::warn!("Failed to disarm {}: {}", self.source.describe(), restore_err);
                Err(e)
            }
        }
    }

    fn receive<F>(&mut self, cancel: &CancelToken, sink: &mut F) -> Result<()>
    where
        F: FnMut(Notification) -> Result<()>,
    {
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }

            let received = match self.source.next_frame()? {
                Some(received) => received,
                None => continue,
            };
            if self.state == SessionState::Armed {
                self.state = SessionState::Receiving;
            }

            let received_at = Local::now();
            let edges: Vec<EdgeEvent> = received
                .frame
                .edges()
                .into_iter()
                .map(|edge| edge.at(received_at))
                .collect();

            self.summary.frames += 1;
            self.summary.edges += edges.len() as u64;

            let notification = Notification {
                received_at,
                source: received.source,
                previous: received.frame.previous,
                current: received.frame.current,
                edges,
            };
            tracing::trace!("Frame: {}", notification);

            sink(notification)?;
        }
    }
}

impl<S: FrameSource + Send + 'static> ListenSession<S> {
    /// Run on a background thread, delivering notifications over a channel
    ///
    /// If the handle is dropped without joining, the session ends with
    /// `ConsumerDisconnected` at the next frame.
    pub fn spawn(mut self, cancel: CancelToken) -> Result<ListenHandle> {
        let (tx, rx) = channel::unbounded();
        let name = format!("listen-{}", self.source.describe());

        let thread = thread::Builder::new().name(name).spawn(move || {
            self.run(&cancel, |notification| {
                tx.send(notification)
                    .map_err(|_| SdiError::ConsumerDisconnected)
            })
        })?;

        Ok(ListenHandle { events: rx, thread })
    }
}

/// A session running on its own thread
pub struct ListenHandle {
    events: Receiver<Notification>,
    thread: JoinHandle<Result<ListenSummary>>,
}

impl ListenHandle {
    /// Notifications in frame-arrival order
    pub fn events(&self) -> &Receiver<Notification> {
        &self.events
    }

    /// Wait for the session to stop
    ///
    /// Call `cancel` on the session's token first, or this blocks until the
    /// source fails.
    pub fn join(self) -> Result<ListenSummary> {
        let ListenHandle { events, thread } = self;
        let result = thread
            .join()
            .map_err(|_| SdiError::InvalidState("listen thread panicked".to_string()))?;
        drop(events);
        result
    }
}
