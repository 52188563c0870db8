//! MongoDB provisioning implementation.
//!
//! This module provides the `MongoProvisioner` implementation of the
//! `Provisioner` trait on top of the official `mongodb` driver.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::ClientOptions;
use mongodb::{Client, IndexModel};
use object_tracking_core::{CollectionName, DatabaseName, UserName};

use crate::error::{Result, StoreError};
use crate::schema::ADMIN_DATABASE;
use crate::types::{IndexInfo, IndexSpec, UserInfo, UserPrincipal};
use crate::Provisioner;

/// Server error codes the bootstrap distinguishes.
mod code {
    pub const UNAUTHORIZED: i32 = 13;
    pub const NAMESPACE_NOT_FOUND: i32 = 26;
    pub const NAMESPACE_EXISTS: i32 = 48;
    pub const INDEX_OPTIONS_CONFLICT: i32 = 85;
    pub const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
    pub const USER_EXISTS: i32 = 51003;
}

/// Map a driver error onto a `StoreError`.
///
/// `subject` names the entity the failed command targeted (user, namespace).
fn classify(err: &MongoError, subject: &str) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => match command.code {
            code::USER_EXISTS => StoreError::UserExists(subject.to_string()),
            code::NAMESPACE_EXISTS => StoreError::NamespaceExists(subject.to_string()),
            code::NAMESPACE_NOT_FOUND => StoreError::NamespaceNotFound(subject.to_string()),
            code::INDEX_OPTIONS_CONFLICT | code::INDEX_KEY_SPECS_CONFLICT => {
                StoreError::IndexConflict {
                    namespace: subject.to_string(),
                    message: command.message.clone(),
                }
            }
            code::UNAUTHORIZED => StoreError::Unauthorized(command.message.clone()),
            _ => StoreError::Database(err.to_string()),
        },
        ErrorKind::Authentication { .. } => StoreError::Unauthorized(err.to_string()),
        ErrorKind::ServerSelection { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::Io(_) => StoreError::Connection(err.to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}

/// MongoDB-backed provisioning implementation.
#[derive(Debug, Clone)]
pub struct MongoProvisioner {
    client: Client,
}

impl MongoProvisioner {
    /// Create a client for the given connection string.
    ///
    /// The driver connects lazily; call [`MongoProvisioner::ping`] to check
    /// that the server is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed or resolved.
    pub async fn connect(
        uri: &str,
        app_name: &str,
        server_selection_timeout: Duration,
    ) -> Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| classify(&e, "connection string"))?;
        options.app_name = Some(app_name.to_string());
        options.server_selection_timeout = Some(server_selection_timeout);

        let client = Client::with_options(options).map_err(|e| classify(&e, "client"))?;
        Ok(Self { client })
    }

    /// Round-trip a `ping` to the server.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if no server can be selected in time.
    pub async fn ping(&self) -> Result<()> {
        self.client
            .database(ADMIN_DATABASE)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| classify(&e, "ping"))?;
        Ok(())
    }
}

#[async_trait]
impl Provisioner for MongoProvisioner {
    // =========================================================================
    // Principals
    // =========================================================================

    async fn create_user(&self, principal: &UserPrincipal) -> Result<()> {
        let subject = format!("{}@{}", principal.user, principal.auth_db);
        let roles: Vec<Document> = principal
            .roles
            .iter()
            .map(|grant| doc! { "role": grant.role.as_str(), "db": grant.db.as_str() })
            .collect();

        tracing::debug!(user = %subject, roles = roles.len(), "createUser");

        self.client
            .database(principal.auth_db.as_str())
            .run_command(doc! {
                "createUser": principal.user.as_str(),
                "pwd": principal.password.expose(),
                "roles": roles,
            })
            .await
            .map_err(|e| classify(&e, &subject))?;

        Ok(())
    }

    async fn user_info(&self, auth_db: &DatabaseName, user: &UserName) -> Result<Option<UserInfo>> {
        let subject = format!("{user}@{auth_db}");
        let reply = self
            .client
            .database(auth_db.as_str())
            .run_command(doc! {
                "usersInfo": { "user": user.as_str(), "db": auth_db.as_str() },
            })
            .await
            .map_err(|e| classify(&e, &subject))?;

        let users = reply
            .get_array("users")
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        match users.first() {
            None => Ok(None),
            Some(Bson::Document(entry)) => bson::from_document(entry.clone())
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            Some(other) => Err(StoreError::Serialization(format!(
                "unexpected usersInfo entry: {other}"
            ))),
        }
    }

    // =========================================================================
    // Collections
    // =========================================================================

    async fn create_collection(
        &self,
        db: &DatabaseName,
        collection: &CollectionName,
    ) -> Result<()> {
        let namespace = db.namespace(collection);
        tracing::debug!(namespace = %namespace, "createCollection");

        self.client
            .database(db.as_str())
            .create_collection(collection.as_str())
            .await
            .map_err(|e| classify(&e, &namespace))
    }

    async fn list_collections(&self, db: &DatabaseName) -> Result<Vec<CollectionName>> {
        let names = self
            .client
            .database(db.as_str())
            .list_collection_names()
            .await
            .map_err(|e| classify(&e, db.as_str()))?;

        let mut collections = names
            .into_iter()
            .filter(|name| !name.starts_with("system."))
            .map(|name| CollectionName::new(name).map_err(StoreError::from))
            .collect::<Result<Vec<_>>>()?;
        collections.sort();

        Ok(collections)
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    async fn create_index(&self, db: &DatabaseName, index: &IndexSpec) -> Result<String> {
        let namespace = db.namespace(&index.collection);
        let keys = index.keys();
        tracing::debug!(namespace = %namespace, keys = %keys, "createIndexes");

        let model = IndexModel::builder().keys(keys).build();
        let result = self
            .client
            .database(db.as_str())
            .collection::<Document>(index.collection.as_str())
            .create_index(model)
            .await
            .map_err(|e| classify(&e, &namespace))?;

        Ok(result.index_name)
    }

    async fn list_indexes(
        &self,
        db: &DatabaseName,
        collection: &CollectionName,
    ) -> Result<Vec<IndexInfo>> {
        let namespace = db.namespace(collection);
        let cursor = self
            .client
            .database(db.as_str())
            .collection::<Document>(collection.as_str())
            .list_indexes()
            .await
            .map_err(|e| classify(&e, &namespace))?;

        let models: Vec<IndexModel> = cursor
            .try_collect()
            .await
            .map_err(|e| classify(&e, &namespace))?;

        Ok(models
            .into_iter()
            .map(|model| IndexInfo {
                name: model
                    .options
                    .and_then(|options| options.name)
                    .unwrap_or_default(),
                keys: model.keys,
            })
            .collect())
    }
}
