//! # sdi-client
//!
//! Client library for bench instruments that speak ASCII, SCPI-like commands:
//! - Query/response over a serial line or a TCP socket
//! - Reply framing with `\r`/`\n` termination and read timeouts
//! - Passive listening for 2-byte state-change frames (serial or UDP)
//! - Edge decoding of channel snapshots into RISING/FALLING events
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────┐
//! │  Instrument/Catalog  │        │    ListenSession     │
//! │  (get/set/dump)      │        │ (cancel, restore)    │
//! └──────────┬───────────┘        └───────┬──────┬───────┘
//!            │ query(cmd)                 │      │
//! ┌──────────▼───────────┐   borrows      │      │
//! │    CommandClient     │◀───────────────┘      │
//! └──────────┬───────────┘                       │
//!            │                                   │
//! ┌──────────▼───────────┐             ┌─────────▼────────┐
//! │ Transport            │             │  UdpFrameSource  │
//! │ (Serial | Tcp)       │             │  (port 5000)     │
//! └──────────────────────┘             └─────────┬────────┘
//!                                                │ frames
//!                                      ┌─────────▼────────┐
//!                                      │   edge::decode   │
//!                                      └──────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod transport;
pub mod client;
pub mod edge;
pub mod listen;
pub mod catalog;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{SdiError, Result};
pub use config::{Config, Endpoint, ListenOptions};
pub use client::{CommandClient, Query, SharedClient};
pub use edge::{decode, Channel, Direction, Edge, EdgeEvent, Snapshot};
pub use listen::{CancelToken, ListenSession, Notification, SessionState};
pub use transport::Transport;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of sdi-client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
