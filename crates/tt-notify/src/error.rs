// error.rs - Error types for mail delivery.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or sending mail.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A sender or recipient is not a valid mailbox.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A message needs at least one recipient.
    #[error("message has no recipients")]
    NoRecipients,

    /// The message could not be assembled.
    #[error("failed to build message: {0}")]
    Build(String),

    /// The transport refused or failed the submission.
    #[error("mail transport error: {0}")]
    Transport(String),

    /// Writing to the outbox file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize an outbox entry.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
