// error.rs - Error types for the record store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize a record.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A conditional update targeted a record that does not exist.
    #[error("item {key} not found in {table}")]
    NotFound { table: String, key: String },

    /// The key (or table name) cannot be used as a storage name.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// An item handed to `put` lacks a string value for the key attribute.
    #[error("item for {table} is missing key attribute {attribute}")]
    MissingKeyAttribute { table: String, attribute: String },

    /// A value that must be a JSON object was something else.
    #[error("expected a JSON object: {0}")]
    NotAnObject(String),
}
