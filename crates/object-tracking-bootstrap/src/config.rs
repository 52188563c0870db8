//! Bootstrap configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an optional
//! JSON file, and command-line flags or their environment variables.

use std::path::Path;
use std::time::Duration;

use object_tracking_core::Password;
use object_tracking_store::schema;
use serde::Deserialize;

use crate::error::{BootstrapError, Result};

/// Configuration for a bootstrap run.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// MongoDB connection string.
    #[serde(default = "BootstrapConfig::default_mongodb_uri")]
    pub mongodb_uri: String,

    /// Application database to provision.
    #[serde(default = "BootstrapConfig::default_database")]
    pub database: String,

    /// Password for the administrative user.
    #[serde(default = "BootstrapConfig::default_admin_password")]
    pub admin_password: Password,

    /// Application name reported to the server.
    #[serde(default = "BootstrapConfig::default_app_name")]
    pub app_name: String,

    /// How long the driver waits for a usable server, in seconds.
    #[serde(default = "BootstrapConfig::default_server_selection_timeout")]
    pub server_selection_timeout_seconds: u64,
}

impl BootstrapConfig {
    fn default_mongodb_uri() -> String {
        "mongodb://localhost:27017/".to_string()
    }

    fn default_database() -> String {
        schema::APP_DATABASE.to_string()
    }

    fn default_admin_password() -> Password {
        Password::new(schema::ADMIN_PASSWORD)
    }

    fn default_app_name() -> String {
        "object-tracking-bootstrap".to_string()
    }

    const fn default_server_selection_timeout() -> u64 {
        30
    }

    /// Load configuration from a JSON file, or defaults when no path is given.
    ///
    /// Fields missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Config` if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path).map_err(|e| {
            BootstrapError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            BootstrapError::Config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Get the server selection timeout as a `Duration`.
    #[must_use]
    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_seconds)
    }

    /// Check values that cannot be expressed by the type alone.
    ///
    /// # Errors
    ///
    /// Returns `BootstrapError::Config` for an empty connection string or
    /// password, or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.mongodb_uri.trim().is_empty() {
            return Err(BootstrapError::Config("mongodb_uri must not be empty".into()));
        }
        if self.admin_password.is_empty() {
            return Err(BootstrapError::Config("admin_password must not be empty".into()));
        }
        if self.server_selection_timeout_seconds == 0 {
            return Err(BootstrapError::Config(
                "server_selection_timeout_seconds must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            mongodb_uri: Self::default_mongodb_uri(),
            database: Self::default_database(),
            admin_password: Self::default_admin_password(),
            app_name: Self::default_app_name(),
            server_selection_timeout_seconds: Self::default_server_selection_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = BootstrapConfig::default();
        assert_eq!(config.mongodb_uri, "mongodb://localhost:27017/");
        assert_eq!(config.database, "object_tracking");
        assert_eq!(config.admin_password.expose(), "adminpassword");
        assert_eq!(config.server_selection_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_without_path_uses_defaults() {
        let config = BootstrapConfig::load(None).unwrap();
        assert_eq!(config.database, "object_tracking");
    }

    #[test]
    fn load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "mongodb_uri": "mongodb://mongo:27017/", "server_selection_timeout_seconds": 5 }}"#
        )
        .unwrap();

        let config = BootstrapConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.mongodb_uri, "mongodb://mongo:27017/");
        assert_eq!(config.server_selection_timeout(), Duration::from_secs(5));
        assert_eq!(config.database, "object_tracking");
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "databse": "typo" }}"#).unwrap();

        let err = BootstrapConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(_)));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BootstrapConfig::load(Some(dir.path().join("absent.json").as_path())).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = BootstrapConfig {
            server_selection_timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BootstrapConfig {
            admin_password: Password::new(""),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BootstrapConfig {
            mongodb_uri: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
