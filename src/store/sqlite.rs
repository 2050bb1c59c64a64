//! SQLite dedup store.
//!
//! Schema (compatible with databases written by earlier deployments):
//!
//! ```sql
//! CREATE TABLE posted (url TEXT PRIMARY KEY, source TEXT, created_at TEXT)
//! ```
//!
//! `created_at` holds an RFC 3339 UTC timestamp. Inserts use
//! `INSERT OR IGNORE`, which is atomic per key even if several cycles
//! ever share the file.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::DedupStore;
use crate::error::StoreError;
use crate::models::PublishedRecord;

/// File-backed store, opened at startup and kept for the process lifetime.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the file cannot be opened or the
    /// schema cannot be created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let store = Self::connect(options).await?;
        info!(path = %path.display(), "Opened dedup store");
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        // A single long-lived connection: accesses are sequential, and an
        // in-memory database only exists on the connection that created it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posted (
                url TEXT PRIMARY KEY,
                source TEXT,
                created_at TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Close the pool, flushing pending writes.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl DedupStore for SqliteStore {
    async fn seen(&self, url: &str) -> Result<bool, StoreError> {
        let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM posted WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn mark_seen(
        &self,
        url: &str,
        source_name: &str,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO posted (url, source, created_at) VALUES (?, ?, ?)")
                .bind(url)
                .bind(source_name)
                .bind(at.to_rfc3339())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn record(&self, url: &str) -> Result<Option<PublishedRecord>, StoreError> {
        let row: Option<(String, Option<String>, Option<String>)> =
            sqlx::query_as("SELECT url, source, created_at FROM posted WHERE url = ?")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        let Some((url, source, created_at)) = row else {
            return Ok(None);
        };
        let created_at = created_at.unwrap_or_default();
        let published_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|_| StoreError::InvalidTimestamp {
                url: url.clone(),
                value: created_at.clone(),
            })?
            .with_timezone(&Utc);

        Ok(Some(PublishedRecord {
            url,
            source_name: source.unwrap_or_default(),
            published_at,
        }))
    }

    async fn count(&self, source_name: Option<&str>) -> Result<u64, StoreError> {
        let n: i64 = match source_name {
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posted")
                    .fetch_one(&self.pool)
                    .await?
            }
            Some(name) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posted WHERE source = ?")
                    .bind(name)
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(n.max(0) as u64)
    }
}
