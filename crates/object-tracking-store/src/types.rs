//! Administrative entities declared against the server.
//!
//! These types describe the principal, indexes, and catalog entries the
//! bootstrap creates and later reads back for verification.

use std::fmt;

use mongodb::bson::{Bson, Document};
use object_tracking_core::{CollectionName, DatabaseName, Password, UserName};
use serde::{Deserialize, Serialize};

/// A role granted to a principal, scoped to a database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Role name (e.g. `readWriteAnyDatabase`).
    pub role: String,
    /// Database the role is scoped to.
    pub db: String,
}

impl RoleGrant {
    /// Create a role grant.
    #[must_use]
    pub fn new(role: impl Into<String>, db: &DatabaseName) -> Self {
        Self {
            role: role.into(),
            db: db.as_str().to_string(),
        }
    }
}

impl fmt::Display for RoleGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.db)
    }
}

/// A user principal to be created.
#[derive(Debug, Clone, Serialize)]
pub struct UserPrincipal {
    /// User name.
    pub user: UserName,
    /// Credential; serialized and printed redacted.
    pub password: Password,
    /// Authentication database the user is created in.
    pub auth_db: DatabaseName,
    /// Roles granted on creation.
    pub roles: Vec<RoleGrant>,
}

/// A user as reported by the server's `usersInfo` command.
///
/// The password is never returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    /// User name.
    pub user: String,
    /// Authentication database.
    pub db: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

impl UserInfo {
    /// Check that the user holds exactly the given roles, in any order.
    #[must_use]
    pub fn has_exact_roles(&self, expected: &[RoleGrant]) -> bool {
        let mut actual = self.roles.clone();
        let mut expected = expected.to_vec();
        actual.sort();
        actual.dedup();
        expected.sort();
        expected.dedup();
        actual == expected
    }
}

/// Per-field sort direction of an index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending (`1`).
    Ascending,
    /// Descending (`-1`).
    Descending,
}

impl SortOrder {
    /// The numeric direction used in index key documents.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    /// Interpret a key-document value as a direction.
    ///
    /// The server may report directions as any numeric type. Special index
    /// kinds (`"text"`, `"2dsphere"`, `"hashed"`) and zero yield `None`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_bson(value: &Bson) -> Option<Self> {
        let n = match value {
            Bson::Int32(v) => f64::from(*v),
            Bson::Int64(v) => *v as f64,
            Bson::Double(v) => *v,
            _ => return None,
        };
        if n > 0.0 {
            Some(Self::Ascending)
        } else if n < 0.0 {
            Some(Self::Descending)
        } else {
            None
        }
    }
}

/// One field of an index key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexField {
    /// Document field name.
    pub name: String,
    /// Sort direction.
    pub order: SortOrder,
}

impl IndexField {
    /// An ascending key field.
    #[must_use]
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: SortOrder::Ascending,
        }
    }

    /// A descending key field.
    #[must_use]
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: SortOrder::Descending,
        }
    }
}

/// A secondary index declaration on a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    /// Collection the index is built on.
    pub collection: CollectionName,
    /// Key fields, in key order.
    pub fields: Vec<IndexField>,
}

impl IndexSpec {
    /// Declare an index on `collection` over `fields`.
    #[must_use]
    pub fn new(collection: CollectionName, fields: Vec<IndexField>) -> Self {
        Self { collection, fields }
    }

    /// The key document, e.g. `{ object_id: 1, timestamp: -1 }`.
    #[must_use]
    pub fn keys(&self) -> Document {
        let mut keys = Document::new();
        for field in &self.fields {
            keys.insert(field.name.clone(), field.order.as_i32());
        }
        keys
    }

    /// The name the server assigns when none is given, e.g.
    /// `object_id_1_timestamp_-1`.
    #[must_use]
    pub fn default_name(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("{}_{}", f.name, f.order.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Check whether a key document reported by the server covers exactly
    /// these fields, in this order, with these directions.
    #[must_use]
    pub fn matches_keys(&self, keys: &Document) -> bool {
        keys.len() == self.fields.len()
            && keys.iter().zip(&self.fields).all(|((name, value), field)| {
                *name == field.name && SortOrder::from_bson(value) == Some(field.order)
            })
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.collection, self.keys())
    }
}

/// An index as reported by the server's index catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    /// Index name.
    pub name: String,
    /// Key document.
    pub keys: Document,
}

impl IndexInfo {
    /// Name of the primary-key index every collection carries.
    pub const PRIMARY: &'static str = "_id_";

    /// Returns true for the default `_id_` index.
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.name == Self::PRIMARY
    }
}
