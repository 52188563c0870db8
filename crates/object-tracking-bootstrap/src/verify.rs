//! Read-only comparison of server state against a bootstrap plan.
//!
//! Verification checks the administrative user's roles, the exact set of
//! collections in the application database, and the exact set of indexes on
//! each collection (declared indexes plus `_id_`).

use std::collections::BTreeSet;
use std::fmt;

use object_tracking_core::{CollectionName, DatabaseName};
use object_tracking_store::{schema, Provisioner, RoleGrant};
use serde::Serialize;

use crate::error::Result;
use crate::plan::Plan;

/// One mismatch between the planned and the actual server state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// The administrative user does not exist.
    MissingUser {
        /// `user@auth_db`.
        user: String,
    },
    /// The administrative user holds different roles.
    RoleMismatch {
        /// `user@auth_db`.
        user: String,
        /// Roles the plan grants.
        expected: Vec<RoleGrant>,
        /// Roles the server reports.
        actual: Vec<RoleGrant>,
    },
    /// A planned collection does not exist.
    MissingCollection {
        /// `<database>.<collection>`.
        namespace: String,
    },
    /// A collection exists that the plan does not declare.
    UnexpectedCollection {
        /// `<database>.<collection>`.
        namespace: String,
    },
    /// No index covers exactly the planned keys.
    MissingIndex {
        /// `<database>.<collection>`.
        namespace: String,
        /// The planned key document.
        keys: String,
    },
    /// An index exists that the plan does not declare.
    UnexpectedIndex {
        /// `<database>.<collection>`.
        namespace: String,
        /// Index name.
        name: String,
        /// The index's key document.
        keys: String,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUser { user } => write!(f, "user {user} does not exist"),
            Self::RoleMismatch {
                user,
                expected,
                actual,
            } => {
                let join = |roles: &[RoleGrant]| {
                    roles
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                write!(
                    f,
                    "user {user} has roles [{}], expected [{}]",
                    join(actual),
                    join(expected)
                )
            }
            Self::MissingCollection { namespace } => {
                write!(f, "collection {namespace} does not exist")
            }
            Self::UnexpectedCollection { namespace } => {
                write!(f, "collection {namespace} is not declared")
            }
            Self::MissingIndex { namespace, keys } => {
                write!(f, "index {keys} is missing on {namespace}")
            }
            Self::UnexpectedIndex {
                namespace,
                name,
                keys,
            } => write!(f, "index {name} {keys} on {namespace} is not declared"),
        }
    }
}

/// Result of a verification pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    /// Number of individual checks performed.
    pub checks: usize,
    /// Mismatches found, in check order.
    pub discrepancies: Vec<Discrepancy>,
}

impl VerifyReport {
    /// Returns true if the server state matches the plan.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }

    fn record(&mut self, discrepancy: Option<Discrepancy>) {
        self.checks += 1;
        if let Some(d) = discrepancy {
            tracing::warn!(discrepancy = %d, "Verification mismatch");
            self.discrepancies.push(d);
        }
    }
}

/// Compare the server state against `plan` without modifying anything.
///
/// # Errors
///
/// Returns an error if the server cannot be queried. Mismatches are not
/// errors; they are returned in the report.
pub async fn verify<P>(provisioner: &P, plan: &Plan) -> Result<VerifyReport>
where
    P: Provisioner + ?Sized,
{
    let mut report = VerifyReport::default();

    if let Some(principal) = plan.principal() {
        let user = format!("{}@{}", principal.user, principal.auth_db);
        let discrepancy = match provisioner
            .user_info(&principal.auth_db, &principal.user)
            .await?
        {
            None => Some(Discrepancy::MissingUser { user }),
            Some(info) if !info.has_exact_roles(&principal.roles) => {
                Some(Discrepancy::RoleMismatch {
                    user,
                    expected: principal.roles.clone(),
                    actual: info.roles,
                })
            }
            Some(_) => None,
        };
        report.record(discrepancy);
    }

    let database = match plan.database() {
        Some(db) => db.clone(),
        None => DatabaseName::new(schema::ADMIN_DATABASE)?,
    };

    let expected: BTreeSet<&CollectionName> = plan
        .collections()
        .chain(plan.indexes().map(|index| &index.collection))
        .collect();
    let actual: BTreeSet<CollectionName> = provisioner
        .list_collections(&database)
        .await?
        .into_iter()
        .collect();

    for collection in &expected {
        let namespace = database.namespace(collection);
        if !actual.contains(*collection) {
            report.record(Some(Discrepancy::MissingCollection { namespace }));
            continue;
        }
        report.record(None);

        let wanted: Vec<_> = plan
            .indexes()
            .filter(|index| &index.collection == *collection)
            .collect();
        let indexes = provisioner.list_indexes(&database, collection).await?;

        for wanted_index in &wanted {
            let found = indexes.iter().any(|index| wanted_index.matches_keys(&index.keys));
            report.record((!found).then(|| Discrepancy::MissingIndex {
                namespace: namespace.clone(),
                keys: wanted_index.keys().to_string(),
            }));
        }
        for index in indexes.iter().filter(|index| !index.is_primary()) {
            let declared = wanted.iter().any(|w| w.matches_keys(&index.keys));
            report.record((!declared).then(|| Discrepancy::UnexpectedIndex {
                namespace: namespace.clone(),
                name: index.name.clone(),
                keys: index.keys.to_string(),
            }));
        }
    }

    for collection in actual.iter().filter(|c| !expected.contains(c)) {
        report.record(Some(Discrepancy::UnexpectedCollection {
            namespace: database.namespace(collection),
        }));
    }

    tracing::info!(
        database = %database,
        checks = report.checks,
        discrepancies = report.discrepancies.len(),
        "Verification finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootstrapConfig;
    use crate::procedure;
    use object_tracking_core::UserName;
    use object_tracking_store::bson::doc;
    use object_tracking_store::{IndexInfo, MemoryProvisioner};

    fn default_plan() -> Plan {
        Plan::from_config(&BootstrapConfig::default()).unwrap()
    }

    fn app_db() -> DatabaseName {
        DatabaseName::new("object_tracking").unwrap()
    }

    async fn provisioned() -> MemoryProvisioner {
        let server = MemoryProvisioner::new();
        procedure::run(&server, &default_plan()).await.unwrap();
        server
    }

    #[tokio::test]
    async fn provisioned_server_is_clean() {
        let server = provisioned().await;
        let report = verify(&server, &default_plan()).await.unwrap();

        assert!(report.is_clean(), "{:?}", report.discrepancies);
        // user, 4 collections, then each declared index both ways
        assert_eq!(report.checks, 17);
    }

    #[tokio::test]
    async fn zone_events_has_exactly_declared_indexes() {
        let server = provisioned().await;
        let zone_events = CollectionName::new("zone_events").unwrap();

        let indexes = server.list_indexes(&app_db(), &zone_events).await.unwrap();
        let keys: Vec<_> = indexes.iter().map(|i| (i.name.as_str(), i.keys.clone())).collect();

        assert_eq!(
            keys,
            vec![
                ("_id_", doc! { "_id": 1 }),
                ("object_id_1_timestamp_-1", doc! { "object_id": 1, "timestamp": -1 }),
                ("zone_id_1_timestamp_-1", doc! { "zone_id": 1, "timestamp": -1 }),
            ]
        );
    }

    #[tokio::test]
    async fn empty_server_reports_everything_missing() {
        let server = MemoryProvisioner::new();
        let report = verify(&server, &default_plan()).await.unwrap();

        assert_eq!(report.discrepancies.len(), 5);
        assert_eq!(
            report.discrepancies[0],
            Discrepancy::MissingUser {
                user: "admin@admin".into()
            }
        );
        assert!(report.discrepancies[1..]
            .iter()
            .all(|d| matches!(d, Discrepancy::MissingCollection { .. })));
    }

    #[tokio::test]
    async fn detects_role_mismatch() {
        let server = provisioned().await;
        let admin = DatabaseName::new("admin").unwrap();
        let user = UserName::new("admin").unwrap();
        server.set_roles(&admin, &user, vec![RoleGrant::new("read", &admin)]);

        let report = verify(&server, &default_plan()).await.unwrap();
        assert_eq!(report.discrepancies.len(), 1);
        assert_eq!(
            report.discrepancies[0].to_string(),
            "user admin@admin has roles [read@admin], expected [userAdminAnyDatabase@admin, \
             readWriteAnyDatabase@admin, dbAdminAnyDatabase@admin]"
        );
    }

    #[tokio::test]
    async fn detects_extra_index_and_collection() {
        let server = provisioned().await;
        let events = CollectionName::new("events").unwrap();
        server.seed_index(
            &app_db(),
            &events,
            IndexInfo {
                name: "timestamp_1".into(),
                keys: doc! { "timestamp": 1 },
            },
        );
        server
            .create_collection(&app_db(), &CollectionName::new("positions").unwrap())
            .await
            .unwrap();

        let report = verify(&server, &default_plan()).await.unwrap();
        assert_eq!(
            report.discrepancies,
            vec![
                Discrepancy::UnexpectedIndex {
                    namespace: "object_tracking.events".into(),
                    name: "timestamp_1".into(),
                    keys: "{ \"timestamp\": 1 }".into(),
                },
                Discrepancy::UnexpectedCollection {
                    namespace: "object_tracking.positions".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn detects_missing_index() {
        let server = MemoryProvisioner::new();
        let plan = default_plan();
        let principal = plan.principal().unwrap();
        server.create_user(principal).await.unwrap();
        for collection in plan.collections() {
            server.create_collection(&app_db(), collection).await.unwrap();
        }

        let report = verify(&server, &plan).await.unwrap();
        assert_eq!(report.discrepancies.len(), 6);
        assert!(report.discrepancies.contains(&Discrepancy::MissingIndex {
            namespace: "object_tracking.zones".into(),
            keys: "{ \"active\": 1 }".into(),
        }));
    }

    #[tokio::test]
    async fn query_failure_is_an_error() {
        let server = provisioned().await;
        server.set_unavailable(true);

        let err = verify(&server, &default_plan()).await.unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
