//! PostClaw error type.

use thiserror::Error;

/// Errors shared by every PostClaw crate.
#[derive(Debug, Error)]
pub enum PostClawError {
    /// Missing or malformed configuration. Fatal at startup.
    #[error("Config error: {0}")]
    Config(String),

    /// Messaging transport failure (send, poll, download).
    #[error("Channel error: {0}")]
    Channel(String),

    /// Object store upload failure.
    #[error("Upload error: {0}")]
    Upload(String),
}

pub type Result<T> = std::result::Result<T, PostClawError>;
