//! Name validation errors.

use thiserror::Error;

/// A result type using `NameError`.
pub type Result<T> = std::result::Result<T, NameError>;

/// Errors produced when validating a database, collection, or user name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// The name is empty.
    #[error("{kind} name must not be empty")]
    Empty {
        /// Which kind of name was rejected.
        kind: &'static str,
    },

    /// The name exceeds the server's length limit.
    #[error("{kind} name is too long: {len} bytes (max {max})")]
    TooLong {
        /// Which kind of name was rejected.
        kind: &'static str,
        /// Length of the rejected name in bytes.
        len: usize,
        /// Maximum allowed length in bytes.
        max: usize,
    },

    /// The name contains a character the server does not accept.
    #[error("{kind} name {name:?} contains invalid character {ch:?}")]
    InvalidChar {
        /// Which kind of name was rejected.
        kind: &'static str,
        /// The rejected name.
        name: String,
        /// The offending character.
        ch: char,
    },

    /// The collection name falls in the server-reserved `system.` namespace.
    #[error("collection name {0:?} is reserved")]
    Reserved(String),
}
