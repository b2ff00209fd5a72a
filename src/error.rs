//! Error types and handling.

use thiserror::Error;

use crate::config::ConfigError;
use crate::terminal::TerminalError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Terminal communication or request error
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Correlation token file could not be read or written
    #[error("Token file error: {0}")]
    Token(#[from] serde_json::Error),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid command-line input
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Whether the terminal could not be reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Terminal(e) if e.is_transport())
    }
}
