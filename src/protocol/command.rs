//! Command definitions
//!
//! Outbound commands are ASCII lines. Queries end with `?`; actions and
//! assignments carry a value or nothing.

use crate::error::{Result, SdiError};
use super::LF;

/// Suffix that marks a query command
pub const QUERY_SUFFIX: char = '?';

/// Command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `*IDN?`, `:TRIG:EDGE?`
    Query,

    /// `*TRG`, `:PULS1:DEL 0.04`
    Action,
}

/// Classify a command by its suffix
pub fn command_kind(command: &str) -> CommandKind {
    if command.trim_end().ends_with(QUERY_SUFFIX) {
        CommandKind::Query
    } else {
        CommandKind::Action
    }
}

/// Check that a command can be framed as a single line
pub fn validate_command(command: &str) -> Result<()> {
    if command.is_empty() {
        return Err(SdiError::InvalidCommand("empty command".to_string()));
    }
    if let Some(pos) = command.find(['\r', '\n']) {
        return Err(SdiError::InvalidCommand(format!(
            "embedded line terminator at byte {}",
            pos
        )));
    }
    if !command.is_ascii() {
        return Err(SdiError::InvalidCommand(format!(
            "non-ASCII command: {:?}",
            command
        )));
    }
    Ok(())
}

/// Encode a command to its wire frame
///
/// Format: command text + `\n`
pub fn encode_command(command: &str) -> Result<Vec<u8>> {
    validate_command(command)?;

    let mut frame = Vec::with_capacity(command.len() + 1);
    frame.extend_from_slice(command.as_bytes());
    frame.push(LF);
    Ok(frame)
}
