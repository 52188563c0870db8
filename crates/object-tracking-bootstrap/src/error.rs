//! Error types for the bootstrap procedure.

use object_tracking_core::NameError;
use object_tracking_store::StoreError;
use thiserror::Error;

/// A result type using `BootstrapError`.
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Errors that can occur while planning, running, or verifying a bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A configured name is not acceptable to the server.
    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    /// Storage layer error outside of a plan step.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A plan step failed; later steps were not executed.
    #[error("step {position} ({step}) failed: {source}")]
    Step {
        /// One-based position of the failed step in the plan.
        position: usize,
        /// Description of the failed step.
        step: String,
        /// The underlying storage error.
        #[source]
        source: StoreError,
    },

    /// The server state does not match the plan.
    #[error("verification found {count} discrepancies")]
    Verification {
        /// Number of discrepancies found.
        count: usize,
    },
}

impl BootstrapError {
    /// Returns the storage error behind this error, if any.
    #[must_use]
    pub const fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(e) | Self::Step { source: e, .. } => Some(e),
            _ => None,
        }
    }

    /// Returns true if the server rejected a step because its entity exists.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_duplicate)
    }

    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::InvalidName(_) => 2,
            Self::Store(StoreError::Connection(_))
            | Self::Step {
                source: StoreError::Connection(_),
                ..
            } => 3,
            Self::Verification { .. } => 4,
            Self::Store(_) | Self::Step { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(BootstrapError::Config("bad".into()).exit_code(), 2);
        assert_eq!(
            BootstrapError::Store(StoreError::Connection("timeout".into())).exit_code(),
            3
        );
        assert_eq!(
            BootstrapError::Step {
                position: 1,
                step: "create user admin@admin".into(),
                source: StoreError::Connection("timeout".into()),
            }
            .exit_code(),
            3
        );
        assert_eq!(BootstrapError::Verification { count: 2 }.exit_code(), 4);
        assert_eq!(
            BootstrapError::Step {
                position: 1,
                step: "create user admin@admin".into(),
                source: StoreError::UserExists("admin@admin".into()),
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn duplicate_detection_through_step() {
        let err = BootstrapError::Step {
            position: 3,
            step: "create collection objects".into(),
            source: StoreError::NamespaceExists("object_tracking.objects".into()),
        };
        assert!(err.is_duplicate());
        assert_eq!(
            err.to_string(),
            "step 3 (create collection objects) failed: namespace already exists: object_tracking.objects"
        );

        assert!(!BootstrapError::Verification { count: 1 }.is_duplicate());
    }
}
