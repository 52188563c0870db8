//! Validated MongoDB names.
//!
//! Database, collection, and user names are checked against the server's
//! naming rules when constructed, so a malformed name is rejected before any
//! command is sent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{NameError, Result};

/// Characters the server rejects in database names.
const DATABASE_FORBIDDEN: &[char] = &['/', '\\', '.', ' ', '"', '$', '\0'];

/// Maximum database name length in bytes.
const DATABASE_MAX_LEN: usize = 63;

/// Maximum `<database>.<collection>` namespace length in bytes.
const NAMESPACE_MAX_LEN: usize = 255;

fn check_not_empty(kind: &'static str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(NameError::Empty { kind });
    }
    Ok(())
}

fn check_chars(kind: &'static str, name: &str, forbidden: &[char]) -> Result<()> {
    match name.chars().find(|c| forbidden.contains(c)) {
        Some(ch) => Err(NameError::InvalidChar {
            kind,
            name: name.to_string(),
            ch,
        }),
        None => Ok(()),
    }
}

/// The name of a database.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatabaseName(String);

impl DatabaseName {
    /// Validate and wrap a database name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, longer than 63 bytes, or
    /// contains one of `/\. "$` or a NUL byte.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_not_empty("database", &name)?;
        if name.len() > DATABASE_MAX_LEN {
            return Err(NameError::TooLong {
                kind: "database",
                len: name.len(),
                max: DATABASE_MAX_LEN,
            });
        }
        check_chars("database", &name, DATABASE_FORBIDDEN)?;
        Ok(Self(name))
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the `<database>.<collection>` namespace string.
    #[must_use]
    pub fn namespace(&self, collection: &CollectionName) -> String {
        format!("{}.{}", self.0, collection.0)
    }
}

impl fmt::Debug for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatabaseName({})", self.0)
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DatabaseName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for DatabaseName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DatabaseName> for String {
    fn from(name: DatabaseName) -> Self {
        name.0
    }
}

impl AsRef<str> for DatabaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The name of a collection within a database.
///
/// Names in the server-reserved `system.` namespace are rejected.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(String);

impl CollectionName {
    /// Validate and wrap a collection name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, contains `$` or a NUL byte,
    /// starts with `system.`, or is too long to form a namespace.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_not_empty("collection", &name)?;
        if name.starts_with("system.") {
            return Err(NameError::Reserved(name));
        }
        // Leaves room for the shortest possible "<db>." prefix.
        if name.len() > NAMESPACE_MAX_LEN - 2 {
            return Err(NameError::TooLong {
                kind: "collection",
                len: name.len(),
                max: NAMESPACE_MAX_LEN - 2,
            });
        }
        check_chars("collection", &name, &['$', '\0'])?;
        Ok(Self(name))
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionName({})", self.0)
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CollectionName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for CollectionName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CollectionName> for String {
    fn from(name: CollectionName) -> Self {
        name.0
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The name of a user principal.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Validate and wrap a user name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains a NUL byte.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_not_empty("user", &name)?;
        check_chars("user", &name, &['\0'])?;
        Ok(Self(name))
    }

    /// Return the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserName({})", self.0)
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}
