//! Command Client
//!
//! Synchronous query/response over an exclusively owned transport.
//!
//! ## Contract
//! - `query` frames the command, writes it, reads one reply and returns it
//!   with terminators and surrounding whitespace stripped
//! - One query at a time per handle; replies stay ordered with their queries
//! - Timeouts and broken channels are surfaced, never retried
//!
//! Higher-level operations (trigger, save, per-setting get/set) are command
//! strings passed through `query`; see the `catalog` module.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::{Config, ListenOptions};
use crate::error::Result;
use crate::listen::{LineFrameSource, ListenSession};
use crate::protocol::{command_kind, decode_reply, encode_command};
use crate::transport::{self, Transport};

/// Default reply size cap (in bytes)
pub const DEFAULT_MAX_REPLY_LEN: usize = 4096;

/// Anything that can answer a command with a reply string
pub trait Query {
    fn query(&mut self, command: &str) -> Result<String>;
}

/// Sends commands and collects replies over one transport
pub struct CommandClient<T: Transport> {
    transport: T,

    /// Cap on accumulated reply bytes
    max_reply_len: usize,
}

impl CommandClient<Box<dyn Transport>> {
    /// Open the configured transport and wrap it
    pub fn connect(config: &Config) -> Result<Self> {
        let transport = transport::open(config)?;
        Ok(Self::new(transport).with_max_reply_len(config.max_reply_len))
    }
}

impl<T: Transport> CommandClient<T> {
    /// Wrap an open transport
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            max_reply_len: DEFAULT_MAX_REPLY_LEN,
        }
    }

    /// Set the reply size cap (in bytes)
    pub fn with_max_reply_len(mut self, len: usize) -> Self {
        self.max_reply_len = len;
        self
    }

    /// Send a command and return its reply
    ///
    /// Fails with `Timeout` if no terminator arrives within the transport's
    /// timeout, and with `Io` if the channel breaks.
    pub fn query(&mut self, command: &str) -> Result<String> {
        let frame = encode_command(command)?;

        tracing::trace!(
            "→ {} {:?} ({:?})",
            self.transport.describe(),
            command,
            command_kind(command)
        );
        self.transport.write_all(&frame)?;

        let raw = self.transport.read_reply(self.max_reply_len)?;
        let reply = decode_reply(&raw);
        tracing::trace!("← {} {:?}", self.transport.describe(), reply);

        Ok(reply)
    }

    /// Current transport read timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.transport.timeout()
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.transport.set_timeout(timeout)
    }

    /// Borrow the transport for a listen session on the same line
    ///
    /// The session holds the transport mutably, so no query can be issued
    /// until it is dropped.
    pub fn listen(&mut self, options: ListenOptions) -> ListenSession<LineFrameSource<'_, T>> {
        ListenSession::new(LineFrameSource::new(&mut self.transport, options))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the channel and drop the client
    pub fn close(mut self) -> Result<()> {
        self.transport.close()
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Wrap in a mutex so several threads can share the handle
    pub fn shared(self) -> SharedClient<T> {
        SharedClient {
            inner: Arc::new(Mutex::new(self)),
        }
    }
}

impl<T: Transport> Query for CommandClient<T> {
    fn query(&mut self, command: &str) -> Result<String> {
        CommandClient::query(self, command)
    }
}

/// A client shared across threads, queries serialized per handle
pub struct SharedClient<T: Transport> {
    inner: Arc<Mutex<CommandClient<T>>>,
}

impl<T: Transport> SharedClient<T> {
    /// Query while holding the handle's lock
    pub fn query(&self, command: &str) -> Result<String> {
        self.inner.lock().query(command)
    }

    /// Run several commands back to back without another thread interleaving
    pub fn with_client<R>(&self, f: impl FnOnce(&mut CommandClient<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<T: Transport> Clone for SharedClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> Query for SharedClient<T> {
    fn query(&mut self, command: &str) -> Result<String> {
        SharedClient::query(self, command)
    }
}

impl<Q: Query + ?Sized> Query for &mut Q {
    fn query(&mut self, command: &str) -> Result<String> {
        (**self).query(command)
    }
}
