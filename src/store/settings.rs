//! Typed settings on top of the generic key/value table.
//!
//! All defaulting and parsing of raw values happens here so that the rest of
//! the application only ever sees [`GeneralSettings`].

use crate::config::default_download_dir;
use crate::db::{Queries, UserSetting};
use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};

pub const DOWNLOAD_LOCATION: &str = "download_location";
pub const AUDIO_QUALITY: &str = "audio_quality";
pub const THEME: &str = "theme";
pub const CONCURRENT_DOWNLOADS: &str = "concurrent_downloads";

pub const MIN_CONCURRENT_DOWNLOADS: u32 = 1;
pub const MAX_CONCURRENT_DOWNLOADS: u32 = 10;
const FALLBACK_CONCURRENT_DOWNLOADS: u32 = 3;

/// A known setting together with the value seeded on first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingDefinition {
    pub key: &'static str,
    pub default_value: &'static str,
    pub description: &'static str,
}

/// Every known setting. New entries are seeded automatically.
pub const DEFAULT_SETTINGS: &[SettingDefinition] = &[
    SettingDefinition {
        key: DOWNLOAD_LOCATION,
        default_value: "",
        description: "Where downloaded files are saved",
    },
    SettingDefinition {
        key: AUDIO_QUALITY,
        default_value: "high",
        description: "Default audio quality: low, medium, high",
    },
    SettingDefinition {
        key: THEME,
        default_value: "dark",
        description: "UI theme: light, dark, system",
    },
    SettingDefinition {
        key: CONCURRENT_DOWNLOADS,
        default_value: "3",
        description: "Maximum simultaneous downloads (1-10)",
    },
];

/// Look up the seeded default for `key`.
pub fn default_value(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS
        .iter()
        .find(|def| def.key == key)
        .map(|def| def.default_value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQuality {
    Low,
    Medium,
    High,
}

impl AudioQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            AudioQuality::Low => "low",
            AudioQuality::Medium => "medium",
            AudioQuality::High => "high",
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioQuality {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(AudioQuality::Low),
            "medium" => Ok(AudioQuality::Medium),
            "high" => Ok(AudioQuality::High),
            other => Err(StoreError::InvalidValue(
                AUDIO_QUALITY.to_string(),
                format!("must be low, medium, or high, got {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(StoreError::InvalidValue(
                THEME.to_string(),
                format!("must be light, dark, or system, got {}", other),
            )),
        }
    }
}

/// Snapshot of the user's general preferences.
///
/// Quality and theme stay as raw strings so values written by a newer build
/// pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub download_location: String,
    pub audio_quality: String,
    pub theme: String,
    pub concurrent_downloads: u32,
}

impl GeneralSettings {
    /// Build the typed view from raw rows.
    ///
    /// Missing or empty values fall back to their defaults; an unparsable or
    /// out-of-range download limit falls back to 3.
    pub fn from_rows(rows: &[UserSetting], default_download_dir: &str) -> Self {
        let map: HashMap<&str, &str> = rows
            .iter()
            .map(|row| (row.key.as_str(), row.value.as_str()))
            .collect();

        GeneralSettings {
            download_location: string_or(&map, DOWNLOAD_LOCATION, default_download_dir),
            audio_quality: string_or(&map, AUDIO_QUALITY, definition_default(AUDIO_QUALITY)),
            theme: string_or(&map, THEME, definition_default(THEME)),
            concurrent_downloads: concurrent_downloads_or_default(&map),
        }
    }
}

fn definition_default(key: &str) -> &'static str {
    default_value(key).unwrap_or_default()
}

fn string_or(map: &HashMap<&str, &str>, key: &str, fallback: &str) -> String {
    match map.get(key) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => fallback.to_string(),
    }
}

fn concurrent_downloads_or_default(map: &HashMap<&str, &str>) -> u32 {
    let Some(raw) = map.get(CONCURRENT_DOWNLOADS) else {
        return FALLBACK_CONCURRENT_DOWNLOADS;
    };

    match raw.trim().parse::<u32>() {
        Ok(n) if (MIN_CONCURRENT_DOWNLOADS..=MAX_CONCURRENT_DOWNLOADS).contains(&n) => n,
        _ => {
            warn!(value = %raw, "Ignoring invalid concurrent_downloads, using default");
            FALLBACK_CONCURRENT_DOWNLOADS
        }
    }
}

/// Settings capability used by the seeder and the application layer.
#[async_trait]
pub trait SettingStore: Send + Sync {
    async fn get_general_settings(&self) -> Result<GeneralSettings, StoreError>;

    /// Create `path` if needed, then remember it as the download folder.
    async fn update_download_location(&self, path: &str) -> Result<(), StoreError>;

    /// Insert or overwrite a raw setting.
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` only if `key` has no row yet. Returns whether it was written.
    async fn insert_setting_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    /// True when at least one setting row exists.
    async fn has_settings(&self) -> Result<bool, StoreError>;

    async fn update_audio_quality(&self, quality: AudioQuality) -> Result<(), StoreError> {
        self.set_setting(AUDIO_QUALITY, quality.as_str()).await
    }

    async fn update_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.set_setting(THEME, theme.as_str()).await
    }

    async fn update_concurrent_downloads(&self, count: u32) -> Result<(), StoreError> {
        if !(MIN_CONCURRENT_DOWNLOADS..=MAX_CONCURRENT_DOWNLOADS).contains(&count) {
            return Err(StoreError::InvalidValue(
                CONCURRENT_DOWNLOADS.to_string(),
                format!(
                    "must be between {} and {}, got {}",
                    MIN_CONCURRENT_DOWNLOADS, MAX_CONCURRENT_DOWNLOADS, count
                ),
            ));
        }
        self.set_setting(CONCURRENT_DOWNLOADS, &count.to_string())
            .await
    }
}

/// [`SettingStore`] backed by the `user_settings` table.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    queries: Queries,
    default_download_dir: PathBuf,
}

impl SettingsRepository {
    pub fn new(queries: Queries) -> Self {
        Self::with_default_download_dir(queries, default_download_dir())
    }

    /// Use `dir` instead of the platform music folder when no location is set.
    pub fn with_default_download_dir(queries: Queries, dir: PathBuf) -> Self {
        SettingsRepository {
            queries,
            default_download_dir: dir,
        }
    }
}

#[async_trait]
impl SettingStore for SettingsRepository {
    async fn get_general_settings(&self) -> Result<GeneralSettings, StoreError> {
        let rows = self
            .queries
            .list_user_settings()
            .await
            .map_err(StoreError::SettingsRead)?;

        Ok(GeneralSettings::from_rows(
            &rows,
            &self.default_download_dir.to_string_lossy(),
        ))
    }

    async fn update_download_location(&self, path: &str) -> Result<(), StoreError> {
        if path.trim().is_empty() {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "download location is empty",
                ),
            });
        }

        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| StoreError::InvalidPath {
                path: path.to_string(),
                source,
            })?;

        self.set_setting(DOWNLOAD_LOCATION, path).await?;
        info!(path = %path, "Download location updated");
        Ok(())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        debug!(key = %key, "Writing setting");
        self.queries
            .set_user_setting(key, value)
            .await
            .map_err(StoreError::SettingsWrite)
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.queries
            .get_user_setting(key)
            .await
            .map_err(StoreError::SettingsRead)
    }

    async fn insert_setting_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.queries
            .insert_user_setting_if_absent(key, value)
            .await
            .map_err(StoreError::SettingsWrite)
    }

    async fn has_settings(&self) -> Result<bool, StoreError> {
        self.queries
            .has_user_settings()
            .await
            .map_err(StoreError::SettingsRead)
    }
}
