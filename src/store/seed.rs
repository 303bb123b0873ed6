//! First-run seeding of default settings.

use crate::error::StoreError;
use crate::store::settings::{SettingStore, DEFAULT_SETTINGS};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The settings table was empty; this many defaults were written.
    Seeded(usize),
    /// Settings existed but this many known keys were missing and were added.
    Backfilled(usize),
    AlreadySeeded,
}

/// Make sure every default setting has a row.
///
/// An empty table gets every default in list order. Otherwise only keys with
/// no row are inserted; existing values are never overwritten. Stops at the
/// first failed write. Safe to call on every launch.
pub async fn seed(settings: &dyn SettingStore) -> Result<SeedOutcome, StoreError> {
    info!("Seeding database...");

    if settings.has_settings().await? {
        let added = backfill_missing(settings).await?;
        if added == 0 {
            info!("Database already seeded, skipping");
            return Ok(SeedOutcome::AlreadySeeded);
        }
        info!(count = added, "Added missing default settings");
        return Ok(SeedOutcome::Backfilled(added));
    }

    for definition in DEFAULT_SETTINGS {
        settings
            .set_setting(definition.key, definition.default_value)
            .await
            .map_err(|source| seed_error(definition.key, source))?;
    }

    info!(count = DEFAULT_SETTINGS.len(), "Seeded user settings");
    Ok(SeedOutcome::Seeded(DEFAULT_SETTINGS.len()))
}

async fn backfill_missing(settings: &dyn SettingStore) -> Result<usize, StoreError> {
    let mut added = 0usize;
    for definition in DEFAULT_SETTINGS {
        let inserted = settings
            .insert_setting_if_absent(definition.key, definition.default_value)
            .await
            .map_err(|source| seed_error(definition.key, source))?;
        if inserted {
            debug!(key = definition.key, "Seeded missing setting");
            added += 1;
        }
    }
    Ok(added)
}

fn seed_error(key: &str, source: StoreError) -> StoreError {
    StoreError::Seed {
        key: key.to_string(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserSetting;
    use crate::store::settings::GeneralSettings;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory settings that can be told to fail on a given key.
    #[derive(Default)]
    struct FakeSettings {
        rows: Mutex<Vec<(String, String)>>,
        fail_on: Option<&'static str>,
    }

    impl FakeSettings {
        fn with_rows(pairs: &[(&str, &str)]) -> Self {
            FakeSettings {
                rows: Mutex::new(
                    pairs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                fail_on: None,
            }
        }

        fn snapshot(&self) -> Vec<(String, String)> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SettingStore for FakeSettings {
        async fn get_general_settings(&self) -> Result<GeneralSettings, StoreError> {
            let rows: Vec<UserSetting> = self
                .snapshot()
                .into_iter()
                .map(|(key, value)| UserSetting { key, value })
                .collect();
            Ok(GeneralSettings::from_rows(&rows, "/fake/music"))
        }

        async fn update_download_location(&self, path: &str) -> Result<(), StoreError> {
            self.set_setting("download_location", path).await
        }

        async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.fail_on == Some(key) {
                return Err(StoreError::InvalidValue(
                    key.to_string(),
                    "injected failure".to_string(),
                ));
            }
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|(k, _)| k == key) {
                Some(row) => row.1 = value.to_string(),
                None => rows.push((key.to_string(), value.to_string())),
            }
            Ok(())
        }

        async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self
                .snapshot()
                .into_iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v))
        }

        async fn insert_setting_if_absent(
            &self,
            key: &str,
            value: &str,
        ) -> Result<bool, StoreError> {
            if self.get_setting(key).await?.is_some() {
                return Ok(false);
            }
            self.set_setting(key, value).await?;
            Ok(true)
        }

        async fn has_settings(&self) -> Result<bool, StoreError> {
            Ok(!self.rows.lock().unwrap().is_empty())
        }
    }

    #[tokio::test]
    async fn test_seeds_every_default_in_order() {
        let fake = FakeSettings::default();
        let outcome = seed(&fake).await.unwrap();
        assert_eq!(outcome, SeedOutcome::Seeded(DEFAULT_SETTINGS.len()));

        let expected: Vec<(String, String)> = DEFAULT_SETTINGS
            .iter()
            .map(|d| (d.key.to_string(), d.default_value.to_string()))
            .collect();
        assert_eq!(fake.snapshot(), expected);
    }

    #[tokio::test]
    async fn test_existing_values_are_never_overwritten() {
        let fake = FakeSettings::with_rows(&[("theme", "light")]);
        assert_eq!(
            seed(&fake).await.unwrap(),
            SeedOutcome::Backfilled(DEFAULT_SETTINGS.len() - 1)
        );
        assert_eq!(
            fake.get_setting("theme").await.unwrap().as_deref(),
            Some("light")
        );
        assert_eq!(fake.snapshot().len(), DEFAULT_SETTINGS.len());
    }

    #[tokio::test]
    async fn test_complete_install_is_noop() {
        let pairs: Vec<(&str, &str)> = DEFAULT_SETTINGS
            .iter()
            .map(|d| (d.key, "user value"))
            .collect();
        let fake = FakeSettings::with_rows(&pairs);
        let before = fake.snapshot();

        assert_eq!(seed(&fake).await.unwrap(), SeedOutcome::AlreadySeeded);
        assert_eq!(fake.snapshot(), before);
    }

    #[tokio::test]
    async fn test_backfill_failure_names_key() {
        let fake = FakeSettings {
            fail_on: Some("concurrent_downloads"),
            ..FakeSettings::with_rows(&[("theme", "light")])
        };

        match seed(&fake).await {
            Err(StoreError::Seed { key, .. }) => assert_eq!(key, "concurrent_downloads"),
            other => panic!("Expected Seed error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_seed_twice_is_noop() {
        let fake = FakeSettings::default();
        seed(&fake).await.unwrap();
        let first = fake.snapshot();

        assert_eq!(seed(&fake).await.unwrap(), SeedOutcome::AlreadySeeded);
        assert_eq!(fake.snapshot(), first);
    }

    #[tokio::test]
    async fn test_seed_stops_at_first_failure() {
        let fake = FakeSettings {
            fail_on: Some("theme"),
            ..FakeSettings::default()
        };

        match seed(&fake).await {
            Err(StoreError::Seed { key, .. }) => assert_eq!(key, "theme"),
            other => panic!("Expected Seed error, got {:?}", other),
        }

        let written: Vec<String> = fake.snapshot().into_iter().map(|(k, _)| k).collect();
        assert_eq!(written, vec!["download_location", "audio_quality"]);
    }
}
