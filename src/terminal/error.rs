//! Terminal protocol error types.

use thiserror::Error;

use super::command::CommandKind;

/// Errors that can occur while talking to the terminal.
///
/// A terminal that answers with an unexpected status text is not an error:
/// that surfaces as an unsuccessful [`OperationResult`](super::OperationResult).
#[derive(Error, Debug)]
pub enum TerminalError {
    /// Socket connect, write or read failed.
    #[error("Transport error talking to {addr}: {source}")]
    Transport {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Connect, write or read did not complete within the configured timeout.
    #[error("Timeout talking to {addr}: {source}")]
    Timeout {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Caller-supplied data cannot produce a valid command.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Value does not fit its fixed-width field.
    #[error("Field {field} value '{value}' exceeds {width} digits")]
    FieldOverflow {
        field: &'static str,
        value: String,
        width: usize,
    },

    /// Value is empty or not digit-only.
    #[error("Field {field} value '{value}' must be digits only")]
    InvalidField { field: &'static str, value: String },

    /// Command does not fit the 2-byte length header.
    #[error("Command too large for frame: {0} bytes")]
    FrameTooLarge(usize),

    /// Command contains characters outside 7-bit ASCII.
    #[error("Command contains non-ASCII characters")]
    NonAscii,

    /// The active protocol revision has no template or response rule for this command.
    #[error("Command {0} is not supported by the configured protocol revision")]
    Unsupported(CommandKind),

    /// Command template is malformed for its kind.
    #[error("Invalid template for {kind}: {reason}")]
    InvalidTemplate { kind: CommandKind, reason: String },
}

impl TerminalError {
    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether this error comes from the network rather than from the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }

    /// Classify an I/O error against the peer address.
    pub(crate) fn from_io(addr: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => Self::Timeout {
                addr: addr.to_string(),
                source,
            },
            _ => Self::Transport {
                addr: addr.to_string(),
                source,
            },
        }
    }
}

/// Result type for terminal operations.
pub type Result<T> = std::result::Result<T, TerminalError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_timed_out_maps_to_timeout() {
        let err = TerminalError::from_io("10.0.0.1:45000", Error::new(ErrorKind::TimedOut, "slow"));
        assert!(matches!(&err, TerminalError::Timeout { source, .. } if source.kind() == ErrorKind::TimedOut));
        assert!(err.is_transport());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_refused_maps_to_transport() {
        let err = TerminalError::from_io("10.0.0.1:45000", Error::new(ErrorKind::ConnectionRefused, "no"));
        assert!(matches!(err, TerminalError::Transport { .. }));
        assert!(err.to_string().contains("10.0.0.1:45000"));
    }

    #[test]
    fn test_validation_is_not_transport() {
        assert!(!TerminalError::validation("missing POS id").is_transport());
    }
}
