//! Bootstrap procedure for the object-tracking MongoDB database.
//!
//! A run executes a fixed [`Plan`], in order, against a
//! [`Provisioner`](object_tracking_store::Provisioner):
//!
//! 1. Create the `admin` user in the `admin` database with
//!    `userAdminAnyDatabase`, `readWriteAnyDatabase`, and `dbAdminAnyDatabase`
//! 2. Select the `object_tracking` database
//! 3. Create the `objects`, `events`, `zones`, and `zone_events` collections
//! 4. Build the six secondary indexes declared in
//!    [`object_tracking_store::schema`]
//!
//! The first step the server rejects aborts the run. [`verify`] compares an
//! existing server against the plan without modifying it.
//!
//! # Example
//!
//! ```no_run
//! use object_tracking_bootstrap::{procedure, BootstrapConfig, Plan};
//! use object_tracking_store::MongoProvisioner;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BootstrapConfig::default();
//! let plan = Plan::from_config(&config)?;
//! let provisioner = MongoProvisioner::connect(
//!     &config.mongodb_uri,
//!     &config.app_name,
//!     config.server_selection_timeout(),
//! )
//! .await?;
//!
//! let report = procedure::run(&provisioner, &plan).await?;
//! println!("{} steps completed", report.steps_completed);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod plan;
pub mod procedure;
pub mod verify;

pub use config::BootstrapConfig;
pub use error::{BootstrapError, Result};
pub use plan::{Plan, Step};
pub use procedure::BootstrapReport;
pub use verify::{verify, Discrepancy, VerifyReport};
