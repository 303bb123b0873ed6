use downbeat_store::config::{default_download_dir, Config};
use downbeat_store::db::{current_version, MIGRATIONS};
use downbeat_store::{
    run_migrations, seed, startup_with_config, SeedOutcome, SettingStore, Store,
};
use std::collections::HashMap;
use tempfile::TempDir;

fn local_config(home: &TempDir) -> Config {
    Config::from_env_map(HashMap::new(), home.path().to_path_buf())
}

#[tokio::test]
async fn test_fresh_startup_returns_defaults() {
    let home = TempDir::new().unwrap();
    let store = startup_with_config(&local_config(&home))
        .await
        .expect("startup failed");

    let settings = store.settings.get_general_settings().await.unwrap();
    assert_eq!(
        settings.download_location,
        default_download_dir().to_string_lossy()
    );
    assert_eq!(settings.audio_quality, "high");
    assert_eq!(settings.theme, "dark");
    assert_eq!(settings.concurrent_downloads, 3);

    assert!(home.path().join(".downbeat").join("downbeat.db").exists());
    store.close();
}

#[tokio::test]
async fn test_restart_keeps_user_changes() {
    let home = TempDir::new().unwrap();
    let config = local_config(&home);

    let store = startup_with_config(&config).await.unwrap();
    store.settings.set_setting("theme", "light").await.unwrap();
    store.close();

    let store = startup_with_config(&config).await.expect("second startup failed");
    let settings = store.settings.get_general_settings().await.unwrap();
    assert_eq!(settings.theme, "light");
    assert_eq!(settings.audio_quality, "high");
    store.close();
}

#[tokio::test]
async fn test_startup_steps_are_idempotent() {
    let home = TempDir::new().unwrap();
    let store = startup_with_config(&local_config(&home)).await.unwrap();

    run_migrations(store.database())
        .await
        .expect("second migration run failed");
    assert_eq!(
        current_version(store.database()).await.unwrap(),
        MIGRATIONS.len() as i64
    );

    assert_eq!(
        seed(store.settings.as_ref()).await.unwrap(),
        SeedOutcome::AlreadySeeded
    );
}

#[tokio::test]
async fn test_seed_writes_one_row_per_default() {
    let home = TempDir::new().unwrap();
    let db = downbeat_store::db::open_with_config(&local_config(&home))
        .await
        .unwrap();
    run_migrations(&db).await.unwrap();
    let store = Store::new(db);

    assert!(!store.settings.has_settings().await.unwrap());
    assert_eq!(
        seed(store.settings.as_ref()).await.unwrap(),
        SeedOutcome::Seeded(downbeat_store::store::DEFAULT_SETTINGS.len())
    );

    for definition in downbeat_store::store::DEFAULT_SETTINGS {
        assert_eq!(
            store.settings.get_setting(definition.key).await.unwrap(),
            Some(definition.default_value.to_string()),
            "{}",
            definition.key
        );
    }
}

#[tokio::test]
async fn test_existing_install_gets_new_default_keys() {
    let home = TempDir::new().unwrap();
    let db = downbeat_store::db::open_with_config(&local_config(&home))
        .await
        .unwrap();
    run_migrations(&db).await.unwrap();
    let store = Store::new(db);

    // an install from before concurrent_downloads existed
    store
        .settings
        .set_setting("download_location", "/srv/music")
        .await
        .unwrap();
    store.settings.set_setting("audio_quality", "low").await.unwrap();
    store.settings.set_setting("theme", "light").await.unwrap();

    assert_eq!(
        seed(store.settings.as_ref()).await.unwrap(),
        SeedOutcome::Backfilled(1)
    );
    assert_eq!(
        store
            .settings
            .get_setting("concurrent_downloads")
            .await
            .unwrap()
            .as_deref(),
        Some("3")
    );

    let settings = store.settings.get_general_settings().await.unwrap();
    assert_eq!(settings.download_location, "/srv/music");
    assert_eq!(settings.audio_quality, "low");
    assert_eq!(settings.theme, "light");

    assert_eq!(
        seed(store.settings.as_ref()).await.unwrap(),
        SeedOutcome::AlreadySeeded
    );
}
