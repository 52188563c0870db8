//! MongoDB provisioning layer for the object-tracking bootstrap.
//!
//! This crate provides the [`Provisioner`] trait, the administrative seam
//! between the bootstrap procedure and the database server, and its
//! [`MongoProvisioner`] implementation.
//!
//! # Architecture
//!
//! The bootstrap declares the following in the `object_tracking` database:
//!
//! - `objects`: indexed by `status`
//! - `events`: indexed by `object_id` + `timestamp` (desc), and by `event_type`
//! - `zones`: indexed by `active`
//! - `zone_events`: indexed by `object_id` + `timestamp` (desc), and by
//!   `zone_id` + `timestamp` (desc)
//!
//! plus an `admin` principal in the `admin` database. See [`schema`].
//!
//! # Example
//!
//! ```no_run
//! use object_tracking_store::{schema, MongoProvisioner, Provisioner};
//! use object_tracking_core::DatabaseName;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provisioner = MongoProvisioner::connect(
//!     "mongodb://localhost:27017/",
//!     "object-tracking-bootstrap",
//!     Duration::from_secs(30),
//! )
//! .await?;
//!
//! let db = DatabaseName::new(schema::APP_DATABASE)?;
//! for name in provisioner.list_collections(&db).await? {
//!     println!("{name}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! Enable the `test-utils` feature for [`MemoryProvisioner`], an in-memory
//! implementation that reproduces the server's duplicate-entity semantics.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod mongo;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use mongodb::bson;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryProvisioner;
pub use mongo::MongoProvisioner;
pub use types::{IndexField, IndexInfo, IndexSpec, RoleGrant, SortOrder, UserInfo, UserPrincipal};

use async_trait::async_trait;
use object_tracking_core::{CollectionName, DatabaseName, UserName};

/// Administrative operations against a database server.
///
/// Every method maps to a single server command. Implementations report
/// server-side conflicts as typed errors and never retry or swallow them.
#[async_trait]
pub trait Provisioner: Send + Sync {
    // =========================================================================
    // Principals
    // =========================================================================

    /// Create a user principal in its authentication database.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserExists` if the user already exists.
    async fn create_user(&self, principal: &UserPrincipal) -> Result<()>;

    /// Look up a user principal.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    async fn user_info(&self, auth_db: &DatabaseName, user: &UserName) -> Result<Option<UserInfo>>;

    // =========================================================================
    // Collections
    // =========================================================================

    /// Create a collection without options or validators.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NamespaceExists` if the collection already exists.
    async fn create_collection(&self, db: &DatabaseName, collection: &CollectionName)
        -> Result<()>;

    /// List the user collections in a database, excluding `system.*`.
    ///
    /// A database that does not exist has no collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    async fn list_collections(&self, db: &DatabaseName) -> Result<Vec<CollectionName>>;

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Build a secondary index and return its name.
    ///
    /// Declaring an index identical to an existing one succeeds without
    /// creating a duplicate. The collection is created implicitly if absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::IndexConflict` if an index with the same name or
    /// keys but a different definition exists.
    async fn create_index(&self, db: &DatabaseName, index: &IndexSpec) -> Result<String>;

    /// List the indexes of a collection, including `_id_`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NamespaceNotFound` if the collection does not exist.
    async fn list_indexes(
        &self,
        db: &DatabaseName,
        collection: &CollectionName,
    ) -> Result<Vec<IndexInfo>>;
}
