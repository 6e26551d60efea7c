//! Configuration for the instrument client
//!
//! Centralized configuration with sensible defaults. Nothing here is
//! persisted; callers build a `Config` from their own flags or files.

use std::time::Duration;

use crate::error::{Result, SdiError};

/// Default TCP port of the instrument command socket
pub const DEFAULT_TCP_PORT: u16 = 18;

/// Default UDP port for state-change notifications
pub const DEFAULT_UDP_PORT: u16 = 5000;

/// Default serial baud rate (instrument default)
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Where the command channel lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Serial line, e.g. `/dev/ttyACM0` or `COM3`
    Serial { port: String, baud_rate: u32 },

    /// TCP socket on the instrument's LAN interface
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Human-readable target used in logs and connect errors
    pub fn target(&self) -> String {
        match self {
            Endpoint::Serial { port, baud_rate } => format!("{}@{}", port, baud_rate),
            Endpoint::Tcp { host, port } => format!("{}:{}", host, port),
        }
    }
}

/// Options for a listen session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenOptions {
    /// Read slice while armed. Each elapsed slice returns control to the
    /// loop so the cancel token is checked. `None` blocks until a frame.
    pub poll_interval: Option<Duration>,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            poll_interval: Some(Duration::from_millis(100)),
        }
    }
}

/// Main configuration for an instrument connection
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Transport Configuration
    // -------------------------------------------------------------------------
    /// Command channel endpoint
    pub endpoint: Endpoint,

    /// Per-read timeout. `None` blocks indefinitely.
    pub timeout: Option<Duration>,

    // -------------------------------------------------------------------------
    // Reply Configuration
    // -------------------------------------------------------------------------
    /// Max accumulated reply size before giving up (in bytes)
    pub max_reply_len: usize,

    /// Bounded read size for the TCP transport (in bytes)
    pub chunk_size: usize,

    // -------------------------------------------------------------------------
    // Notification Configuration
    // -------------------------------------------------------------------------
    /// Listen session options
    pub listen: ListenOptions,

    /// Interface address the UDP notification socket binds to
    pub udp_bind_addr: String,

    /// UDP notification port
    pub udp_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::Tcp {
                host: "127.0.0.1".to_string(),
                port: DEFAULT_TCP_PORT,
            },
            timeout: Some(Duration::from_secs(1)),
            max_reply_len: 4096,
            chunk_size: 512,
            listen: ListenOptions::default(),
            udp_bind_addr: "0.0.0.0".to_string(),
            udp_port: DEFAULT_UDP_PORT,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config for values no transport can honor
    pub fn validate(&self) -> Result<()> {
        match &self.endpoint {
            Endpoint::Serial { port, baud_rate } => {
                if port.is_empty() {
                    return Err(SdiError::Config("serial port name is empty".to_string()));
                }
                if *baud_rate == 0 {
                    return Err(SdiError::Config("baud rate must be non-zero".to_string()));
                }
            }
            Endpoint::Tcp { host, .. } => {
                if host.is_empty() {
                    return Err(SdiError::Config("host name is empty".to_string()));
                }
            }
        }

        // std sockets reject a zero read timeout
        if self.timeout == Some(Duration::ZERO) {
            return Err(SdiError::Config(
                "timeout must be non-zero (use None to block)".to_string(),
            ));
        }
        if self.listen.poll_interval == Some(Duration::ZERO) {
            return Err(SdiError::Config("poll interval must be non-zero".to_string()));
        }
        if self.max_reply_len == 0 {
            return Err(SdiError::Config("max reply length must be non-zero".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(SdiError::Config("chunk size must be non-zero".to_string()));
        }

        Ok(())
    }

    /// `host:port` the UDP notification socket binds to
    pub fn udp_bind(&self) -> String {
        format!("{}:{}", self.udp_bind_addr, self.udp_port)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Talk to the instrument over a serial port
    pub fn serial(mut self, port: impl Into<String>) -> Self {
        self.config.endpoint = Endpoint::Serial {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        };
        self
    }

    /// Set the serial baud rate (ignored for TCP endpoints)
    pub fn baud_rate(mut self, rate: u32) -> Self {
        if let Endpoint::Serial { baud_rate, .. } = &mut self.config.endpoint {
            *baud_rate = rate;
        }
        self
    }

    /// Talk to the instrument over TCP
    pub fn tcp(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.endpoint = Endpoint::Tcp {
            host: host.into(),
            port,
        };
        self
    }

    /// Set the read timeout (in milliseconds, 0 blocks indefinitely)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout = if ms > 0 {
            Some(Duration::from_millis(ms))
        } else {
            None
        };
        self
    }

    /// Set the maximum reply size (in bytes)
    pub fn max_reply_len(mut self, len: usize) -> Self {
        self.config.max_reply_len = len;
        self
    }

    /// Set the TCP read chunk size (in bytes)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the listen poll interval (in milliseconds, 0 blocks until a frame)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.listen.poll_interval = if ms > 0 {
            Some(Duration::from_millis(ms))
        } else {
            None
        };
        self
    }

    /// Set the UDP notification bind address and port
    pub fn udp_bind(mut self, addr: impl Into<String>, port: u16) -> Self {
        self.config.udp_bind_addr = addr.into();
        self.config.udp_port = port;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
