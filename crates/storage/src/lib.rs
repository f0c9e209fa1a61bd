use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Slot key for the most recent user-selected file.
pub const UPLOADED_IMAGE_SLOT: &str = "uploadedImage";
/// Slot key for the most recent camera capture.
pub const CAPTURED_PHOTO_SLOT: &str = "capturedPhoto";

/// Local key-value store for encoded capture images. Each fixed slot holds at
/// most one data URL; a new write overwrites the previous value. Nothing ever
/// deletes a slot; the database outlives individual app runs.
#[derive(Clone)]
pub struct CaptureStore {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub slot: String,
    pub data_url: String,
    pub stored_at: DateTime<Utc>,
}

impl CaptureStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS captured_images (
                slot      TEXT PRIMARY KEY,
                data_url  TEXT NOT NULL,
                stored_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure captured_images table exists")?;
        Ok(())
    }

    /// Upserts a slot. The previous value for the slot, if any, is replaced.
    pub async fn put_image(&self, slot: &str, data_url: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO captured_images (slot, data_url, stored_at)
             VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(slot) DO UPDATE SET
                data_url = excluded.data_url,
                stored_at = CURRENT_TIMESTAMP",
        )
        .bind(slot)
        .bind(data_url)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to store image for slot '{slot}'"))?;
        Ok(())
    }

    pub async fn load_image(&self, slot: &str) -> Result<Option<StoredImage>> {
        let row = sqlx::query(
            "SELECT slot, data_url, stored_at FROM captured_images WHERE slot = ?",
        )
        .bind(slot)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredImage {
            slot: r.get::<String, _>(0),
            data_url: r.get::<String, _>(1),
            stored_at: r.get::<DateTime<Utc>, _>(2),
        }))
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
