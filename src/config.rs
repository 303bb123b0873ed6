use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const DATABASE_URL_ENV: &str = "TURSO_DATABASE_URL";
pub const AUTH_TOKEN_ENV: &str = "TURSO_AUTH_TOKEN";

/// Application data directory, relative to the user's home.
pub const APP_DIR_NAME: &str = ".downbeat";
pub const DATABASE_FILE_NAME: &str = "downbeat.db";

/// Credentials for keeping the local file as a replica of a remote database.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteSync {
    pub url: String,
    pub auth_token: String,
}

impl fmt::Debug for RemoteSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSync")
            .field("url", &self.url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    Local,
    EmbeddedReplica(RemoteSync),
}

impl ConnectionMode {
    pub fn is_replica(&self) -> bool {
        matches!(self, ConnectionMode::EmbeddedReplica(_))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub home_dir: PathBuf,
    pub mode: ConnectionMode,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine the user's home directory")]
    HomeDirUnavailable,
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_err() {
            tracing::debug!("No .env file found, using process environment");
        }

        let home_dir = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .ok_or(ConfigError::HomeDirUnavailable)?;

        Ok(Self::from_env_map(std::env::vars().collect(), home_dir))
    }

    pub fn from_env_map(env_map: HashMap<String, String>, home_dir: PathBuf) -> Self {
        let mode = select_mode(
            env_map.get(DATABASE_URL_ENV).map(|s| s.as_str()),
            env_map.get(AUTH_TOKEN_ENV).map(|s| s.as_str()),
        );

        Config { home_dir, mode }
    }

    pub fn data_dir(&self) -> PathBuf {
        data_dir_in(&self.home_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(DATABASE_FILE_NAME)
    }
}

pub fn data_dir_in(home_dir: &Path) -> PathBuf {
    home_dir.join(APP_DIR_NAME)
}

/// Pick the connection mode from the two optional remote settings.
///
/// Sync is enabled only when both values are non-blank. A lone value is
/// almost certainly a misconfiguration, so it is reported and ignored.
pub fn select_mode(url: Option<&str>, auth_token: Option<&str>) -> ConnectionMode {
    let url = url.map(str::trim).filter(|s| !s.is_empty());
    let auth_token = auth_token.map(str::trim).filter(|s| !s.is_empty());

    match (url, auth_token) {
        (Some(url), Some(auth_token)) => ConnectionMode::EmbeddedReplica(RemoteSync {
            url: url.to_string(),
            auth_token: auth_token.to_string(),
        }),
        (Some(_), None) => {
            warn!(
                "{} is set but {} is missing; falling back to local-only mode",
                DATABASE_URL_ENV, AUTH_TOKEN_ENV
            );
            ConnectionMode::Local
        }
        (None, Some(_)) => {
            warn!(
                "{} is set but {} is missing; falling back to local-only mode",
                AUTH_TOKEN_ENV, DATABASE_URL_ENV
            );
            ConnectionMode::Local
        }
        (None, None) => ConnectionMode::Local,
    }
}

/// Default folder for downloaded music when the user has not chosen one.
pub fn default_download_dir() -> PathBuf {
    let audio_dir = directories::UserDirs::new()
        .and_then(|dirs| dirs.audio_dir().map(Path::to_path_buf));
    if let Some(audio) = audio_dir {
        return audio.join("Downbeat");
    }

    let home = directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_default();
    home.join("Music").join("Downbeat")
}
