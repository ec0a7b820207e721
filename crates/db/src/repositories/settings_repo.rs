//! Repository for the key-value `settings` table.

use sqlx::PgExecutor;

use crate::models::setting::Setting;

/// Provides access to calendar settings rows.
pub struct SettingsRepo;

impl SettingsRepo {
    pub async fn list(executor: impl PgExecutor<'_>) -> Result<Vec<Setting>, sqlx::Error> {
        sqlx::query_as::<_, Setting>("SELECT key, value, updated_at FROM settings ORDER BY key")
            .fetch_all(executor)
            .await
    }

    /// Insert the given defaults, keeping any value already stored.
    ///
    /// Returns the number of keys that were missing.
    pub async fn seed_missing(
        executor: impl PgExecutor<'_>,
        defaults: &[(&str, String)],
    ) -> Result<u64, sqlx::Error> {
        let (keys, values): (Vec<&str>, Vec<&str>) =
            defaults.iter().map(|(k, v)| (*k, v.as_str())).unzip();
        let result = sqlx::query(
            "INSERT INTO settings (key, value) \
             SELECT * FROM UNNEST($1::TEXT[], $2::TEXT[]) \
             ON CONFLICT (key) DO NOTHING",
        )
        .bind(&keys)
        .bind(&values)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert or overwrite one setting.
    pub async fn upsert(
        executor: impl PgExecutor<'_>,
        key: &str,
        value: &str,
    ) -> Result<Setting, sqlx::Error> {
        sqlx::query_as::<_, Setting>(
            "INSERT INTO settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value \
             RETURNING key, value, updated_at",
        )
        .bind(key)
        .bind(value)
        .fetch_one(executor)
        .await
    }
}
