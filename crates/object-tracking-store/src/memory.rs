//! In-memory provisioning implementation for tests.
//!
//! `MemoryProvisioner` keeps users, collections, and indexes in memory and
//! answers the way a MongoDB server does: duplicate users and collections
//! are rejected, identical index declarations are no-ops, and `create_index`
//! creates its collection implicitly.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use mongodb::bson::doc;
use object_tracking_core::{CollectionName, DatabaseName, UserName};
use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::types::{IndexInfo, IndexSpec, RoleGrant, UserInfo, UserPrincipal};
use crate::Provisioner;

/// A provisioner that stores server state in memory.
#[derive(Default)]
pub struct MemoryProvisioner {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    /// Users keyed by `(auth_db, user)`.
    users: HashMap<(String, String), UserInfo>,
    /// Databases -> collections -> indexes.
    databases: BTreeMap<String, BTreeMap<String, Vec<IndexInfo>>>,
    /// Mutating commands, in the order they were received.
    operations: Vec<String>,
    unavailable: bool,
}

impl State {
    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            return Err(StoreError::Connection(
                "server selection timeout: no available servers".to_string(),
            ));
        }
        Ok(())
    }

    fn collection_mut(&mut self, db: &str, collection: &str) -> &mut Vec<IndexInfo> {
        self.databases
            .entry(db.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_insert_with(|| {
                vec![IndexInfo {
                    name: IndexInfo::PRIMARY.to_string(),
                    keys: doc! { "_id": 1 },
                }]
            })
    }
}

impl MemoryProvisioner {
    /// Create an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent command fail with `StoreError::Connection`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Mutating commands received so far, e.g. `createCollection object_tracking.zones`.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().operations.clone()
    }

    /// Number of users across all authentication databases.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.state.lock().users.len()
    }

    /// Place an index directly in the catalog, bypassing conflict checks.
    ///
    /// The collection is created if absent. Useful to model state left behind
    /// by other tools.
    pub fn seed_index(&self, db: &DatabaseName, collection: &CollectionName, index: IndexInfo) {
        self.state
            .lock()
            .collection_mut(db.as_str(), collection.as_str())
            .push(index);
    }

    /// Replace the roles of an existing user.
    pub fn set_roles(&self, auth_db: &DatabaseName, user: &UserName, roles: Vec<RoleGrant>) {
        let key = (auth_db.as_str().to_string(), user.as_str().to_string());
        if let Some(info) = self.state.lock().users.get_mut(&key) {
            info.roles = roles;
        }
    }
}

#[async_trait]
impl Provisioner for MemoryProvisioner {
    async fn create_user(&self, principal: &UserPrincipal) -> Result<()> {
        let mut state = self.state.lock();
        state.check_available()?;

        let subject = format!("{}@{}", principal.user, principal.auth_db);
        state.operations.push(format!("createUser {subject}"));

        let key = (
            principal.auth_db.as_str().to_string(),
            principal.user.as_str().to_string(),
        );
        if state.users.contains_key(&key) {
            return Err(StoreError::UserExists(subject));
        }

        state.users.insert(
            key,
            UserInfo {
                user: principal.user.as_str().to_string(),
                db: principal.auth_db.as_str().to_string(),
                roles: principal.roles.clone(),
            },
        );
        Ok(())
    }

    async fn user_info(&self, auth_db: &DatabaseName, user: &UserName) -> Result<Option<UserInfo>> {
        let state = self.state.lock();
        state.check_available()?;

        let key = (auth_db.as_str().to_string(), user.as_str().to_string());
        Ok(state.users.get(&key).cloned())
    }

    async fn create_collection(
        &self,
        db: &DatabaseName,
        collection: &CollectionName,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.check_available()?;

        let namespace = db.namespace(collection);
        state.operations.push(format!("createCollection {namespace}"));

        let exists = state
            .databases
            .get(db.as_str())
            .is_some_and(|collections| collections.contains_key(collection.as_str()));
        if exists {
            return Err(StoreError::NamespaceExists(namespace));
        }

        state.collection_mut(db.as_str(), collection.as_str());
        Ok(())
    }

    async fn list_collections(&self, db: &DatabaseName) -> Result<Vec<CollectionName>> {
        let state = self.state.lock();
        state.check_available()?;

        state
            .databases
            .get(db.as_str())
            .map(|collections| {
                collections
                    .keys()
                    .map(|name| CollectionName::new(name.clone()).map_err(StoreError::from))
                    .collect()
            })
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_index(&self, db: &DatabaseName, index: &IndexSpec) -> Result<String> {
        let mut state = self.state.lock();
        state.check_available()?;

        let namespace = db.namespace(&index.collection);
        state
            .operations
            .push(format!("createIndex {namespace} {}", index.keys()));

        let name = index.default_name();
        let indexes = state.collection_mut(db.as_str(), index.collection.as_str());

        if let Some(existing) = indexes.iter().find(|i| i.name == name) {
            if index.matches_keys(&existing.keys) {
                return Ok(name);
            }
            return Err(StoreError::IndexConflict {
                namespace,
                message: format!("an index named {name} exists with different keys"),
            });
        }
        if let Some(existing) = indexes.iter().find(|i| index.matches_keys(&i.keys)) {
            return Err(StoreError::IndexConflict {
                namespace,
                message: format!("index already exists with a different name: {}", existing.name),
            });
        }

        indexes.push(IndexInfo {
            name: name.clone(),
            keys: index.keys(),
        });
        Ok(name)
    }

    async fn list_indexes(
        &self,
        db: &DatabaseName,
        collection: &CollectionName,
    ) -> Result<Vec<IndexInfo>> {
        let state = self.state.lock();
        state.check_available()?;

        state
            .databases
            .get(db.as_str())
            .and_then(|collections| collections.get(collection.as_str()))
            .cloned()
            .ok_or_else(|| StoreError::NamespaceNotFound(db.namespace(collection)))
    }
}
