use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the persistence layer.
///
/// `PathResolution`, `Connection`, `Migration`, `SchemaAhead` and `Seed` are
/// fatal during startup. The remaining variants are returned to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Path resolution error: {0}")]
    PathResolution(String),
    #[error("Failed to open database connection")]
    Connection(#[source] libsql::Error),
    #[error("Migration {version} ({name}) failed")]
    Migration {
        version: i64,
        name: String,
        #[source]
        source: libsql::Error,
    },
    #[error("Database schema version {found} is newer than the latest known migration {latest}")]
    SchemaAhead { found: i64, latest: i64 },
    #[error("Seeding setting {key} failed")]
    Seed {
        key: String,
        #[source]
        source: Box<StoreError>,
    },
    #[error("Failed to read settings")]
    SettingsRead(#[source] libsql::Error),
    #[error("Failed to write setting")]
    SettingsWrite(#[source] libsql::Error),
    #[error("Invalid path {path}")]
    InvalidPath {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl From<ConfigError> for StoreError {
    fn from(err: ConfigError) -> Self {
        StoreError::PathResolution(err.to_string())
    }
}

impl StoreError {
    /// Whether this error must abort process startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StoreError::PathResolution(_)
                | StoreError::Connection(_)
                | StoreError::Migration { .. }
                | StoreError::SchemaAhead { .. }
                | StoreError::Seed { .. }
        )
    }
}
