//! Embedded schema migrations and the version ledger that tracks them.

use crate::db::Database;
use crate::error::StoreError;
use libsql::{params, Connection};
use tracing::{info, warn};

const LEDGER_TABLE: &str = "schema_migrations";

/// A forward-only schema change, compiled into the binary.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Every migration this build knows about, in application order.
///
/// Versions start at 1 and increase by one. Append only.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_user_settings",
        sql: include_str!("migrations/0001_create_user_settings.sql"),
    },
    Migration {
        version: 2,
        name: "add_user_settings_updated_at",
        sql: include_str!("migrations/0002_add_user_settings_updated_at.sql"),
    },
];

/// Apply all pending embedded migrations.
pub async fn run_migrations(db: &Database) -> Result<(), StoreError> {
    info!("Running database migrations...");
    let applied = apply_migrations(db, MIGRATIONS).await?;
    info!(applied, "Migrations completed successfully");
    Ok(())
}

/// Highest migration version recorded in the ledger, 0 when none.
pub async fn current_version(db: &Database) -> Result<i64, StoreError> {
    let conn = db.connect().await.map_err(ledger_error)?;
    ensure_ledger(&conn).await?;
    read_watermark(&conn).await
}

/// Apply every migration in `migrations` above the ledger watermark.
///
/// Each migration commits together with its ledger row. The first failure
/// stops the run; migrations committed before it stay applied.
pub(crate) async fn apply_migrations(
    db: &Database,
    migrations: &[Migration],
) -> Result<usize, StoreError> {
    debug_assert!(
        migrations
            .iter()
            .enumerate()
            .all(|(i, m)| m.version == i as i64 + 1),
        "migration versions must be 1..=N in order"
    );

    let conn = db.connect().await.map_err(ledger_error)?;
    ensure_ledger(&conn).await?;

    let watermark = read_watermark(&conn).await?;
    let latest = migrations.last().map(|m| m.version).unwrap_or(0);
    if watermark > latest {
        warn!(watermark, latest, "Database was migrated by a newer build");
        return Err(StoreError::SchemaAhead {
            found: watermark,
            latest,
        });
    }

    let mut applied = 0usize;
    for migration in migrations.iter().filter(|m| m.version > watermark) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        apply_one(&conn, migration).await?;
        applied += 1;
    }

    Ok(applied)
}

async fn apply_one(conn: &Connection, migration: &Migration) -> Result<(), StoreError> {
    let fail = |source: libsql::Error| StoreError::Migration {
        version: migration.version,
        name: migration.name.to_string(),
        source,
    };

    let tx = conn.transaction().await.map_err(fail)?;

    let result = async {
        tx.execute_batch(migration.sql).await?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![
                migration.version,
                migration.name,
                chrono::Utc::now().timestamp_millis()
            ],
        )
        .await?;
        Ok::<(), libsql::Error>(())
    }
    .await;

    match result {
        Ok(()) => tx.commit().await.map_err(fail),
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed migration also failed");
            }
            Err(fail(e))
        }
    }
}

async fn ensure_ledger(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY NOT NULL,
            name       TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )
        "#,
        (),
    )
    .await
    .map_err(ledger_error)?;
    Ok(())
}

async fn read_watermark(conn: &Connection) -> Result<i64, StoreError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", ())
        .await
        .map_err(ledger_error)?;

    match rows.next().await.map_err(ledger_error)? {
        Some(row) => row.get::<i64>(0).map_err(ledger_error),
        None => Ok(0),
    }
}

fn ledger_error(source: libsql::Error) -> StoreError {
    StoreError::Migration {
        version: 0,
        name: LEDGER_TABLE.to_string(),
        source,
    }
}
