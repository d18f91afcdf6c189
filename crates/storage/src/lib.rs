use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

use shared::domain::CartItem;

const CART_KEY: &str = "cart";

/// Client-local durable state for one scan station. Values are whole JSON
/// documents keyed by name and rewritten on every mutation; there are no
/// partial updates and no versioning.
#[derive(Clone)]
pub struct CartStore {
    pool: Pool<Sqlite>,
}

impl CartStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        let store = Self { pool };
        store.ensure_state_table().await?;
        Ok(store)
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn ensure_state_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS client_state (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("failed to ensure client_state table exists")?;

        Ok(())
    }

    /// The cart as last saved, in saved order. An absent key is an empty
    /// cart.
    pub async fn load_cart(&self) -> Result<Vec<CartItem>> {
        let row = sqlx::query("SELECT value FROM client_state WHERE key = ?")
            .bind(CART_KEY)
            .fetch_optional(&self.pool)
            .await
            .context("failed to load cart state")?;

        let Some(row) = row else {
            return Ok(Vec::new());
        };

        let raw: String = row.try_get("value")?;
        serde_json::from_str(&raw).context("persisted cart is not valid JSON")
    }

    /// Overwrite the whole persisted sequence.
    pub async fn save_cart(&self, items: &[CartItem]) -> Result<()> {
        let value = serde_json::to_string(items).context("failed to serialize cart")?;
        sqlx::query(
            r#"
            INSERT INTO client_state (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE
            SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(CART_KEY)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("failed to persist cart state")?;

        Ok(())
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
