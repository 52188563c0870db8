//! Schema declarations for the object-tracking database.
//!
//! This module names the administrative principal, the application database,
//! its collections, and the secondary indexes built on them.

use object_tracking_core::{CollectionName, DatabaseName, Password, UserName};

use crate::error::Result;
use crate::types::{IndexField, IndexSpec, RoleGrant, UserPrincipal};

/// Authentication database the administrative user is created in.
pub const ADMIN_DATABASE: &str = "admin";

/// Default application database.
pub const APP_DATABASE: &str = "object_tracking";

/// Default administrative user name.
pub const ADMIN_USER: &str = "admin";

/// Default administrative password.
pub const ADMIN_PASSWORD: &str = "adminpassword";

/// Collection names in the application database.
pub mod coll {
    /// Tracked objects and their latest status.
    pub const OBJECTS: &str = "objects";

    /// Object events, keyed by `object_id` and ordered by `timestamp`.
    pub const EVENTS: &str = "events";

    /// Zone definitions; inactive zones are soft-deleted via `active`.
    pub const ZONES: &str = "zones";

    /// Zone entry/exit events.
    pub const ZONE_EVENTS: &str = "zone_events";
}

/// Roles granted to the administrative user, all scoped to [`ADMIN_DATABASE`].
pub mod roles {
    /// User and role administration on every database.
    pub const USER_ADMIN_ANY_DATABASE: &str = "userAdminAnyDatabase";

    /// Read and write on every database.
    pub const READ_WRITE_ANY_DATABASE: &str = "readWriteAnyDatabase";

    /// Database administration on every database.
    pub const DB_ADMIN_ANY_DATABASE: &str = "dbAdminAnyDatabase";
}

/// Returns all collection names, in creation order.
#[must_use]
pub fn all_collections() -> Vec<&'static str> {
    vec![coll::OBJECTS, coll::EVENTS, coll::ZONES, coll::ZONE_EVENTS]
}

/// Returns the validated collection names, in creation order.
///
/// # Errors
///
/// Returns an error if a declared name fails validation.
pub fn collections() -> Result<Vec<CollectionName>> {
    all_collections()
        .into_iter()
        .map(|name| CollectionName::new(name).map_err(Into::into))
        .collect()
}

/// Returns the secondary index declarations, in creation order.
///
/// # Errors
///
/// Returns an error if a declared collection name fails validation.
pub fn indexes() -> Result<Vec<IndexSpec>> {
    let objects = CollectionName::new(coll::OBJECTS)?;
    let events = CollectionName::new(coll::EVENTS)?;
    let zones = CollectionName::new(coll::ZONES)?;
    let zone_events = CollectionName::new(coll::ZONE_EVENTS)?;

    Ok(vec![
        IndexSpec::new(objects, vec![IndexField::asc("status")]),
        IndexSpec::new(zones, vec![IndexField::asc("active")]),
        IndexSpec::new(
            zone_events.clone(),
            vec![IndexField::asc("object_id"), IndexField::desc("timestamp")],
        ),
        IndexSpec::new(
            zone_events,
            vec![IndexField::asc("zone_id"), IndexField::desc("timestamp")],
        ),
        IndexSpec::new(
            events.clone(),
            vec![IndexField::asc("object_id"), IndexField::desc("timestamp")],
        ),
        IndexSpec::new(events, vec![IndexField::asc("event_type")]),
    ])
}

/// Returns the roles granted to the administrative user.
///
/// # Errors
///
/// Returns an error if the admin database name fails validation.
pub fn admin_roles() -> Result<Vec<RoleGrant>> {
    let admin = DatabaseName::new(ADMIN_DATABASE)?;
    Ok(vec![
        RoleGrant::new(roles::USER_ADMIN_ANY_DATABASE, &admin),
        RoleGrant::new(roles::READ_WRITE_ANY_DATABASE, &admin),
        RoleGrant::new(roles::DB_ADMIN_ANY_DATABASE, &admin),
    ])
}

/// Returns the administrative principal with the given password.
///
/// # Errors
///
/// Returns an error if a declared name fails validation.
pub fn admin_principal(password: Password) -> Result<UserPrincipal> {
    Ok(UserPrincipal {
        user: UserName::new(ADMIN_USER)?,
        password,
        auth_db: DatabaseName::new(ADMIN_DATABASE)?,
        roles: admin_roles()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn declared_names_are_valid() {
        assert_eq!(collections().unwrap().len(), 4);
        assert!(DatabaseName::new(APP_DATABASE).is_ok());
        assert!(DatabaseName::new(ADMIN_DATABASE).is_ok());
    }

    #[test]
    fn collection_order() {
        assert_eq!(
            all_collections(),
            vec!["objects", "events", "zones", "zone_events"]
        );
    }

    #[test]
    fn index_table() {
        let declared: Vec<_> = indexes()
            .unwrap()
            .into_iter()
            .map(|index| (index.collection.to_string(), index.keys()))
            .collect();

        assert_eq!(
            declared,
            vec![
                ("objects".to_string(), doc! { "status": 1 }),
                ("zones".to_string(), doc! { "active": 1 }),
                ("zone_events".to_string(), doc! { "object_id": 1, "timestamp": -1 }),
                ("zone_events".to_string(), doc! { "zone_id": 1, "timestamp": -1 }),
                ("events".to_string(), doc! { "object_id": 1, "timestamp": -1 }),
                ("events".to_string(), doc! { "event_type": 1 }),
            ]
        );
    }

    #[test]
    fn admin_principal_roles() {
        let principal = admin_principal(Password::new(ADMIN_PASSWORD)).unwrap();
        assert_eq!(principal.user.as_str(), "admin");
        assert_eq!(principal.auth_db.as_str(), "admin");
        assert_eq!(principal.password.expose(), "adminpassword");

        let roles: Vec<_> = principal.roles.iter().map(ToString::to_string).collect();
        assert_eq!(
            roles,
            vec![
                "userAdminAnyDatabase@admin",
                "readWriteAnyDatabase@admin",
                "dbAdminAnyDatabase@admin",
            ]
        );
    }
}
