// error.rs - Error types for identity and provisioning.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by user directories and the provisioner.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize an account record.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `create_user` was called for a username that already has an account.
    #[error("user account already exists: {0}")]
    UserExists(String),

    /// The username cannot be stored.
    #[error("invalid username {username:?}: {reason}")]
    InvalidUsername {
        username: String,
        reason: &'static str,
    },

    /// The directory service rejected or failed the call.
    #[error("directory service error: {0}")]
    Provider(String),
}
