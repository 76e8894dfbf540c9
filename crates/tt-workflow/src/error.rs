// error.rs - Workflow errors and their classification.
//
// Display strings are the messages clients see in `{"error": ...}`
// bodies, so they are phrased for the caller rather than for logs.

use thiserror::Error;
use tt_identity::IdentityError;
use tt_store::StoreError;

/// Broad class of a failure; decides the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid input (400).
    Validation,
    /// Caller lacks the required role (403).
    Forbidden,
    /// Wrong verb for the operation (405).
    MethodNotAllowed,
    /// Referenced record is absent where existence is required (404).
    NotFound,
    /// The store, directory, or another collaborator failed (500).
    Dependency,
}

impl ErrorKind {
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::NotFound => 404,
            ErrorKind::Dependency => 500,
        }
    }
}

/// Errors returned by workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    NotFound(String),

    /// Provisioning one assignee failed; the whole request is aborted.
    #[error("Error handling user {email}: {source}")]
    Provisioning {
        email: String,
        #[source]
        source: IdentityError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl WorkflowError {
    pub fn missing_field(field: &str) -> Self {
        WorkflowError::Validation(format!("Missing required field: {field}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::Forbidden(_) => ErrorKind::Forbidden,
            WorkflowError::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            WorkflowError::NotFound(_) => ErrorKind::NotFound,
            // A key that cannot be stored came from the request.
            WorkflowError::Store(StoreError::InvalidKey { .. }) => ErrorKind::Validation,
            WorkflowError::Provisioning { .. }
            | WorkflowError::Store(_)
            | WorkflowError::Identity(_) => ErrorKind::Dependency,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}
