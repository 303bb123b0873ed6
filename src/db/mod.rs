//! Database module for the local (optionally replicated) settings database.
//!
//! This module provides:
//! - Connection setup with local-only or embedded replica mode
//! - Embedded schema migrations tracked by a version ledger
//! - The key/value query layer used by the typed stores

pub mod connection;
pub mod migrations;
pub mod queries;

pub use connection::{open, open_with_config, Database};
pub use migrations::{current_version, run_migrations, Migration, MIGRATIONS};
pub use queries::{Queries, UserSetting};
