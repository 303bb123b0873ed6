pub mod config;
pub mod db;
pub mod error;
pub mod startup;
pub mod store;

pub use config::{Config, ConnectionMode, RemoteSync};
pub use db::{open, run_migrations, Database};
pub use error::StoreError;
pub use startup::{startup, startup_with_config};
pub use store::{
    seed, AudioQuality, GeneralSettings, SeedOutcome, SettingStore, SettingsRepository, Store,
    Theme,
};
