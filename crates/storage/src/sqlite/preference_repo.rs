use std::collections::HashMap;

use chrono::Utc;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::ser;
use crate::repository::{PreferenceRepository, StorageError};

#[async_trait::async_trait]
impl PreferenceRepository for SqliteRepository {
    async fn get_preference(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        row.map(|row| row.try_get::<String, _>("value").map_err(ser))
            .transpose()
    }

    async fn list_preferences(&self, prefix: &str) -> Result<HashMap<String, String>, StorageError> {
        // substr avoids LIKE wildcards in keys such as `sound_isMuted`.
        let rows = sqlx::query(
            "SELECT key, value FROM preferences WHERE substr(key, 1, length(?1)) = ?1",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok((
                    row.try_get::<String, _>("key").map_err(ser)?,
                    row.try_get::<String, _>("value").map_err(ser)?,
                ))
            })
            .collect()
    }

    async fn set_preferences(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let now = Utc::now();
        for (key, value) in entries {
            sqlx::query(
                r"
                INSERT INTO preferences (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                ",
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }
        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
