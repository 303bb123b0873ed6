//! Key/value query layer over the `user_settings` table.

use crate::db::Database;
use libsql::params;
use std::sync::Arc;

/// One raw row of the settings table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSetting {
    pub key: String,
    pub value: String,
}

/// Queries shared by every typed store, bound to one database.
#[derive(Debug, Clone)]
pub struct Queries {
    db: Arc<Database>,
}

impl Queries {
    pub fn new(db: Arc<Database>) -> Self {
        Queries { db }
    }

    /// List every setting row, ordered by key.
    pub async fn list_user_settings(&self) -> Result<Vec<UserSetting>, libsql::Error> {
        let conn = self.db.connect().await?;
        let mut rows = conn
            .query("SELECT key, value FROM user_settings ORDER BY key", ())
            .await?;

        let mut settings = Vec::new();
        while let Some(row) = rows.next().await? {
            settings.push(UserSetting {
                key: row.get(0)?,
                value: row.get(1)?,
            });
        }
        Ok(settings)
    }

    pub async fn get_user_setting(&self, key: &str) -> Result<Option<String>, libsql::Error> {
        let conn = self.db.connect().await?;
        let mut rows = conn
            .query("SELECT value FROM user_settings WHERE key = ?1", params![key])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Insert or overwrite a setting in a single statement.
    pub async fn set_user_setting(&self, key: &str, value: &str) -> Result<(), libsql::Error> {
        let conn = self.db.connect().await?;
        conn.execute(
            r#"
            INSERT INTO user_settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, chrono::Utc::now().timestamp_millis()],
        )
        .await?;
        Ok(())
    }

    /// Insert a setting only when `key` has no row yet.
    ///
    /// Returns whether a row was written.
    pub async fn insert_user_setting_if_absent(
        &self,
        key: &str,
        value: &str,
    ) -> Result<bool, libsql::Error> {
        let conn = self.db.connect().await?;
        let inserted = conn
            .execute(
                r#"
                INSERT INTO user_settings (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO NOTHING
                "#,
                params![key, value, chrono::Utc::now().timestamp_millis()],
            )
            .await?;
        Ok(inserted > 0)
    }

    pub async fn has_user_settings(&self) -> Result<bool, libsql::Error> {
        let conn = self.db.connect().await?;
        let mut rows = conn
            .query("SELECT EXISTS (SELECT 1 FROM user_settings)", ())
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? != 0),
            None => Ok(false),
        }
    }
}
