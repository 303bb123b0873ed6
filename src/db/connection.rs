//! Database location, mode selection and connection setup.

use crate::config::{Config, ConnectionMode};
use crate::error::StoreError;
use libsql::{Builder, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle to the local database file, optionally replicating a remote one.
///
/// Every call to [`Database::connect`] returns a fresh connection so
/// concurrent callers never share statement state. Local connections get the
/// foreign-key and busy-timeout pragmas; replica connections delegate writes
/// to the remote and are returned as is.
pub struct Database {
    inner: libsql::Database,
    path: PathBuf,
    mode: ConnectionMode,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Open the application database using the process environment.
pub async fn open() -> Result<Database, StoreError> {
    let config = Config::from_env()?;
    open_with_config(&config).await
}

/// Open the database described by `config`, creating its directory first.
pub async fn open_with_config(config: &Config) -> Result<Database, StoreError> {
    let data_dir = config.data_dir();
    ensure_data_dir(&data_dir)?;

    let db_path = config.database_path();
    match &config.mode {
        ConnectionMode::EmbeddedReplica(remote) => {
            info!(
                url = %remote.url,
                local_db = %db_path.display(),
                "Remote sync credentials found (auth token present), using embedded replica"
            );
        }
        ConnectionMode::Local => {
            info!(local_db = %db_path.display(), "Using local-only database");
        }
    }

    Database::open_at(&db_path, config.mode.clone()).await
}

impl Database {
    /// Open the database file at `path` in the given mode and check it answers.
    pub async fn open_at(path: &Path, mode: ConnectionMode) -> Result<Self, StoreError> {
        let path_str = path.to_str().ok_or_else(|| {
            StoreError::PathResolution(format!("{} is not valid UTF-8", path.display()))
        })?;

        let inner = match &mode {
            ConnectionMode::Local => {
                info!("Opening database in local-only mode...");
                Builder::new_local(path_str)
                    .build()
                    .await
                    .map_err(StoreError::Connection)?
            }
            ConnectionMode::EmbeddedReplica(remote) => {
                info!("Opening database in embedded replica mode...");
                Builder::new_remote_replica(
                    path_str,
                    remote.url.clone(),
                    remote.auth_token.clone(),
                )
                .build()
                .await
                .map_err(StoreError::Connection)?
            }
        };

        let db = Database {
            inner,
            path: path.to_path_buf(),
            mode,
        };

        if db.mode.is_replica() {
            db.sync().await?;
        }

        db.ping().await?;
        info!("Database connection successful");
        Ok(db)
    }

    /// Get a new connection, with pragmas applied in local mode.
    pub async fn connect(&self) -> Result<Connection, libsql::Error> {
        let conn = self.inner.connect()?;
        if !self.mode.is_replica() {
            configure_connection(&conn).await?;
        }
        Ok(conn)
    }

    /// Pull the latest frames from the remote. No-op in local mode.
    pub async fn sync(&self) -> Result<Option<u64>, StoreError> {
        if !self.mode.is_replica() {
            return Ok(None);
        }

        let replicated = self.inner.sync().await.map_err(StoreError::Connection)?;
        info!(frame_no = ?replicated.frame_no(), "Replica synced with remote");
        Ok(replicated.frame_no())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> &ConnectionMode {
        &self.mode
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let conn = self.connect().await.map_err(StoreError::Connection)?;
        let mut rows = conn
            .query("SELECT 1", ())
            .await
            .map_err(StoreError::Connection)?;
        rows.next().await.map_err(StoreError::Connection)?;
        Ok(())
    }
}

/// Create the application data directory, private to the current user.
pub fn ensure_data_dir(dir: &Path) -> Result<(), StoreError> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder.create(dir).map_err(|e| {
        StoreError::PathResolution(format!("create app directory {}: {}", dir.display(), e))
    })
}

async fn configure_connection(conn: &Connection) -> Result<(), libsql::Error> {
    conn.execute("PRAGMA foreign_keys = ON", ()).await?;

    // busy_timeout reports the new value as a row
    let mut rows = conn.query("PRAGMA busy_timeout = 5000", ()).await?;
    while rows.next().await?.is_some() {}

    debug!("Connection pragmas configured");
    Ok(())
}
