//! Executes a bootstrap plan against a provisioner.
//!
//! Steps run strictly in order, each awaited before the next. The first
//! failing step aborts the run; nothing is retried or rolled back.

use chrono::{DateTime, Utc};
use object_tracking_core::DatabaseName;
use object_tracking_store::{schema, Provisioner, StoreError};
use serde::Serialize;

use crate::error::{BootstrapError, Result};
use crate::plan::{Plan, Step};

/// Outcome of a successful bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapReport {
    /// Database selected when the run finished.
    pub database: DatabaseName,
    /// Number of steps executed.
    pub steps_completed: usize,
    /// Collections created, as namespaces.
    pub collections: Vec<String>,
    /// Indexes the server reported, as `<namespace>.<index name>`.
    pub indexes: Vec<String>,
    /// When the first step started.
    pub started_at: DateTime<Utc>,
    /// When the last step finished.
    pub finished_at: DateTime<Utc>,
}

/// Run every step of `plan` in order.
///
/// The database context starts at the admin database and changes only on a
/// `UseDatabase` step.
///
/// # Errors
///
/// Returns `BootstrapError::Step` for the first step the server rejects;
/// later steps are not executed.
pub async fn run<P>(provisioner: &P, plan: &Plan) -> Result<BootstrapReport>
where
    P: Provisioner + ?Sized,
{
    let started_at = Utc::now();
    let total = plan.steps().len();
    let mut database = DatabaseName::new(schema::ADMIN_DATABASE)?;
    let mut collections = Vec::new();
    let mut indexes = Vec::new();

    for (i, step) in plan.steps().iter().enumerate() {
        let position = i + 1;
        tracing::info!(position, total, step = %step, "Executing step");

        let outcome: std::result::Result<(), StoreError> = match step {
            Step::CreateUser { principal } => provisioner.create_user(principal).await,
            Step::UseDatabase { database: next } => {
                database = next.clone();
                Ok(())
            }
            Step::CreateCollection { collection } => provisioner
                .create_collection(&database, collection)
                .await
                .map(|()| collections.push(database.namespace(collection))),
            Step::CreateIndex { index } => {
                provisioner.create_index(&database, index).await.map(|name| {
                    tracing::debug!(collection = %index.collection, index = %name, "Index ready");
                    indexes.push(format!("{}.{name}", database.namespace(&index.collection)));
                })
            }
        };

        if let Err(source) = outcome {
            tracing::error!(
                position,
                total,
                step = %step,
                error = %source,
                duplicate = source.is_duplicate(),
                "Step failed, aborting remaining steps"
            );
            return Err(BootstrapError::Step {
                position,
                step: step.to_string(),
                source,
            });
        }
    }

    let report = BootstrapReport {
        database,
        steps_completed: total,
        collections,
        indexes,
        started_at,
        finished_at: Utc::now(),
    };
    tracing::info!(
        database = %report.database,
        steps = report.steps_completed,
        collections = report.collections.len(),
        indexes = report.indexes.len(),
        "Bootstrap complete"
    );

    Ok(report)
}
