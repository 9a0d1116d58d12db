use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;

/// Key-value settings backed by the settings table, cached in memory.
/// Admin edits go through `set_multiple` which refreshes the cache.
#[derive(Debug, Clone)]
pub struct SettingsService {
    pool: PgPool,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl SettingsService {
    pub async fn new(pool: PgPool) -> Result<Self> {
        let service = Self {
            pool,
            cache: Arc::new(RwLock::new(HashMap::new())),
        };

        service.reload_cache().await?;
        Ok(service)
    }

    pub async fn reload_cache(&self) -> Result<()> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch settings from DB")?;

        let mut cache = self.cache.write().await;
        cache.clear();
        for (key, value) in rows {
            cache.insert(key, value);
        }

        info!("Settings cache reloaded with {} items", cache.len());
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let cache = self.cache.read().await;
        cache.get(key).cloned()
    }

    pub async fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get(key).await.unwrap_or_else(|| default.to_string())
    }

    /// Numeric settings fall back to the default when missing or unparseable.
    pub async fn get_decimal(&self, key: &str, default: Decimal) -> Decimal {
        match self.get(key).await {
            Some(raw) => Decimal::from_str(raw.trim()).unwrap_or(default),
            None => default,
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .context("Failed to update setting in DB")?;

        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), value.to_string());

        Ok(())
    }

    pub async fn set_multiple(&self, settings: HashMap<String, String>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in &settings {
            sqlx::query(
                "INSERT INTO settings (key, value) VALUES ($1, $2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .context(format!("Failed to update setting {}", key))?;
        }

        tx.commit().await?;

        let mut cache = self.cache.write().await;
        for (key, value) in settings {
            cache.insert(key, value);
        }

        Ok(())
    }

    pub async fn all(&self) -> HashMap<String, String> {
        self.cache.read().await.clone()
    }
}
