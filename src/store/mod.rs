//! Typed stores and the facade that hands them to the application.

pub mod seed;
pub mod settings;

pub use seed::{seed, SeedOutcome};
pub use settings::{
    AudioQuality, GeneralSettings, SettingDefinition, SettingStore, SettingsRepository, Theme,
    DEFAULT_SETTINGS,
};

use crate::db::{Database, Queries};
use std::sync::Arc;
use tracing::{debug, info};

/// Every typed store, wired against one shared database.
///
/// Cloning is cheap and clones share the same database.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    pub settings: Arc<dyn SettingStore>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("db", &self.db).finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(db: Database) -> Self {
        let db = Arc::new(db);
        let queries = Queries::new(db.clone());
        Store {
            settings: Arc::new(SettingsRepository::new(queries)),
            db,
        }
    }

    /// Build a store with explicitly constructed typed stores.
    pub fn with_settings(db: Arc<Database>, settings: Arc<dyn SettingStore>) -> Self {
        Store { db, settings }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Release the database. No store operation is valid afterwards.
    pub fn close(self) {
        let Store { db, settings } = self;
        drop(settings);
        match Arc::try_unwrap(db) {
            Ok(db) => {
                drop(db);
                info!("Database closed");
            }
            Err(_) => {
                debug!("Other store handles remain; database closes with the last one");
            }
        }
    }
}
