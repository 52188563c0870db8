//! The ordered list of administrative operations a bootstrap run executes.

use std::fmt;

use object_tracking_core::{CollectionName, DatabaseName, Password};
use object_tracking_store::{schema, IndexSpec, UserPrincipal};
use serde::Serialize;

use crate::config::BootstrapConfig;
use crate::error::Result;

/// A single administrative operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Create the administrative principal.
    CreateUser {
        /// The principal to create.
        principal: UserPrincipal,
    },
    /// Select the database the following steps act on.
    UseDatabase {
        /// The database to select.
        database: DatabaseName,
    },
    /// Create a collection without options.
    CreateCollection {
        /// The collection to create.
        collection: CollectionName,
    },
    /// Build a secondary index.
    CreateIndex {
        /// The index to build.
        index: IndexSpec,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateUser { principal } => {
                write!(f, "create user {}@{} with roles [", principal.user, principal.auth_db)?;
                for (i, grant) in principal.roles.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{grant}")?;
                }
                f.write_str("]")
            }
            Self::UseDatabase { database } => write!(f, "use database {database}"),
            Self::CreateCollection { collection } => write!(f, "create collection {collection}"),
            Self::CreateIndex { index } => write!(f, "create index on {index}"),
        }
    }
}

/// The complete bootstrap plan.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    steps: Vec<Step>,
}

impl Plan {
    /// Build the object-tracking plan for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured database name is invalid.
    pub fn from_config(config: &BootstrapConfig) -> Result<Self> {
        let database = DatabaseName::new(config.database.as_str())?;
        Self::object_tracking(database, config.admin_password.clone())
    }

    /// Build the object-tracking plan: the admin user, then the database,
    /// its collections, and its indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if a declared name is invalid.
    pub fn object_tracking(database: DatabaseName, admin_password: Password) -> Result<Self> {
        let mut steps = vec![
            Step::CreateUser {
                principal: schema::admin_principal(admin_password)?,
            },
            Step::UseDatabase { database },
        ];
        steps.extend(
            schema::collections()?
                .into_iter()
                .map(|collection| Step::CreateCollection { collection }),
        );
        steps.extend(
            schema::indexes()?
                .into_iter()
                .map(|index| Step::CreateIndex { index }),
        );

        Ok(Self { steps })
    }

    /// The steps, in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The administrative principal the plan creates, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&UserPrincipal> {
        self.steps.iter().find_map(|step| match step {
            Step::CreateUser { principal } => Some(principal),
            _ => None,
        })
    }

    /// The application database the plan selects, if any.
    #[must_use]
    pub fn database(&self) -> Option<&DatabaseName> {
        self.steps.iter().find_map(|step| match step {
            Step::UseDatabase { database } => Some(database),
            _ => None,
        })
    }

    /// The collections the plan creates, in order.
    pub fn collections(&self) -> impl Iterator<Item = &CollectionName> {
        self.steps.iter().filter_map(|step| match step {
            Step::CreateCollection { collection } => Some(collection),
            _ => None,
        })
    }

    /// The indexes the plan builds, in order.
    pub fn indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.steps.iter().filter_map(|step| match step {
            Step::CreateIndex { index } => Some(index),
            _ => None,
        })
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>2}. {step}", i + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootstrapError;

    fn default_plan() -> Plan {
        Plan::from_config(&BootstrapConfig::default()).unwrap()
    }

    #[test]
    fn step_order() {
        let plan = default_plan();
        let steps: Vec<String> = plan.steps().iter().map(ToString::to_string).collect();

        assert_eq!(
            steps,
            vec![
                "create user admin@admin with roles [userAdminAnyDatabase@admin, \
                 readWriteAnyDatabase@admin, dbAdminAnyDatabase@admin]",
                "use database object_tracking",
                "create collection objects",
                "create collection events",
                "create collection zones",
                "create collection zone_events",
                "create index on objects { \"status\": 1 }",
                "create index on zones { \"active\": 1 }",
                "create index on zone_events { \"object_id\": 1, \"timestamp\": -1 }",
                "create index on zone_events { \"zone_id\": 1, \"timestamp\": -1 }",
                "create index on events { \"object_id\": 1, \"timestamp\": -1 }",
                "create index on events { \"event_type\": 1 }",
            ]
        );
    }

    #[test]
    fn accessors() {
        let plan = default_plan();
        assert_eq!(plan.principal().unwrap().user.as_str(), "admin");
        assert_eq!(plan.database().unwrap().as_str(), "object_tracking");
        assert_eq!(plan.collections().count(), 4);
        assert_eq!(plan.indexes().count(), 6);
    }

    #[test]
    fn database_override() {
        let config = BootstrapConfig {
            database: "tracking_staging".into(),
            ..Default::default()
        };
        let plan = Plan::from_config(&config).unwrap();
        assert_eq!(plan.database().unwrap().as_str(), "tracking_staging");
    }

    #[test]
    fn invalid_database_rejected() {
        let config = BootstrapConfig {
            database: "object.tracking".into(),
            ..Default::default()
        };
        let err = Plan::from_config(&config).unwrap_err();
        assert!(matches!(err, BootstrapError::InvalidName(_)));
    }

    #[test]
    fn json_redacts_password() {
        let json = serde_json::to_value(default_plan()).unwrap();
        let first = &json["steps"][0];

        assert_eq!(first["op"], "create_user");
        assert_eq!(first["principal"]["password"], "<redacted>");
        assert_eq!(json["steps"][1]["database"], "object_tracking");
        assert_eq!(json["steps"][6]["index"]["fields"][0]["name"], "status");
        assert_eq!(json["steps"][8]["index"]["fields"][1]["order"], "descending");
        assert!(!json.to_string().contains("adminpassword"));
    }
}
