//! Protocol Module
//!
//! Defines the wire protocol spoken by the instruments.
//!
//! ## Command Path (serial or TCP)
//! ```text
//! → ":PULS1:DEL?\n"
//! ← "0.040000\r\n"
//! ```
//! - Outbound: ASCII command + `\n`, no escaping
//! - Inbound: ASCII reply terminated by `\r` or `\n`
//!
//! ## Notification Path (serial line or UDP datagram)
//! ```text
//! ┌──────────────┬──────────────┐
//! │ Previous (1) │ Current (1)  │
//! └──────────────┴──────────────┘
//! ```

mod command;
mod codec;
mod frame;

/// Carriage return
pub const CR: u8 = b'\r';

/// Line feed
pub const LF: u8 = b'\n';

pub use command::{command_kind, encode_command, validate_command, CommandKind, QUERY_SUFFIX};
pub use codec::{
    decode_reply, ends_with_bare_cr, ends_with_terminator, is_terminator, read_chunked, read_line,
};
pub use frame::{LineFrameAssembler, StateFrame, FRAME_LEN};
