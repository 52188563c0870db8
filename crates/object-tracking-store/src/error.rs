//! Error types for the provisioning layer.

use object_tracking_core::NameError;
use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during provisioning operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A user with the same name already exists in the authentication database.
    #[error("user already exists: {0}")]
    UserExists(String),

    /// The collection (namespace) already exists.
    #[error("namespace already exists: {0}")]
    NamespaceExists(String),

    /// The collection (namespace) does not exist.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// An index with the same name or keys but different options already exists.
    #[error("index conflict on {namespace}: {message}")]
    IndexConflict {
        /// The namespace the index was declared on.
        namespace: String,
        /// The server's explanation.
        message: String,
    },

    /// The connected principal is not allowed to run the command.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// Any other server or driver error.
    #[error("database error: {0}")]
    Database(String),

    /// A server reply could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A name reported by the server failed validation.
    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),
}

impl StoreError {
    /// Returns true if the server rejected the operation because the entity
    /// it would create already exists.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::UserExists(_) | Self::NamespaceExists(_) | Self::IndexConflict { .. }
        )
    }
}
