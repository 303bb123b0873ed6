//! Startup sequence: open, migrate, seed.

use crate::config::Config;
use crate::db::{self, run_migrations};
use crate::error::StoreError;
use crate::store::{seed, Store};

/// Run the full startup sequence against the process environment.
pub async fn startup() -> Result<Store, StoreError> {
    let config = Config::from_env()?;
    startup_with_config(&config).await
}

/// Open the database for `config`, bring its schema up to date and seed it.
///
/// The returned store is ready for use by the application.
pub async fn startup_with_config(config: &Config) -> Result<Store, StoreError> {
    let database = db::open_with_config(config).await?;
    run_migrations(&database).await?;

    let store = Store::new(database);
    seed(store.settings.as_ref()).await?;
    Ok(store)
}
