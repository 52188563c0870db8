//! Core types for the object-tracking bootstrap.
//!
//! This crate provides the foundational types shared by the storage layer and
//! the bootstrap binary:
//!
//! - **Names**: Validated MongoDB database, collection, and user names
//! - **Credentials**: A password wrapper that never prints its contents
//! - **Error types**: Name validation errors
//!
//! # Example
//!
//! ```
//! use object_tracking_core::{CollectionName, DatabaseName, Password};
//!
//! let db = DatabaseName::new("object_tracking").unwrap();
//! let coll = CollectionName::new("zone_events").unwrap();
//! assert_eq!(format!("{db}.{coll}"), "object_tracking.zone_events");
//!
//! let pwd = Password::new("adminpassword");
//! assert_eq!(format!("{pwd:?}"), "Password(<redacted>)");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod names;
pub mod secret;

pub use error::{NameError, Result};
pub use names::{CollectionName, DatabaseName, UserName};
pub use secret::Password;
