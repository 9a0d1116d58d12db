use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::country::Country;

#[derive(Debug, Clone)]
pub struct CountryRepository {
    pool: PgPool,
}

impl CountryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Default listing: soft-deleted rows are excluded.
    pub async fn list_active(&self) -> Result<Vec<Country>> {
        sqlx::query_as::<_, Country>(
            "SELECT * FROM countries WHERE is_active = TRUE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch active countries")
    }

    pub async fn list_all(&self) -> Result<Vec<Country>> {
        sqlx::query_as::<_, Country>("SELECT * FROM countries ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch countries")
    }

    /// Lookup by id intentionally ignores the active flag so historical
    /// orders can still resolve their country.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Country>> {
        sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch country by ID")
    }

    pub async fn get_by_code(&self, iso_code: &str) -> Result<Option<Country>> {
        sqlx::query_as::<_, Country>("SELECT * FROM countries WHERE iso_code = UPPER($1)")
            .bind(iso_code)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch country by code")
    }

    pub async fn create(
        &self,
        name: &str,
        iso_code: &str,
        phone_code: Option<&str>,
    ) -> Result<Country> {
        sqlx::query_as::<_, Country>(
            r#"
            INSERT INTO countries (name, iso_code, phone_code)
            VALUES ($1, UPPER($2), $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(iso_code)
        .bind(phone_code)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert country")
    }

    pub async fn update(
        &self,
        id: i64,
        name: &str,
        phone_code: Option<&str>,
        is_active: bool,
    ) -> Result<u64> {
        let done = sqlx::query(
            "UPDATE countries SET name = $1, phone_code = $2, is_active = $3 WHERE id = $4",
        )
        .bind(name)
        .bind(phone_code)
        .bind(is_active)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update country")?;
        Ok(done.rows_affected())
    }

    /// Soft delete: the row stays retrievable by id/code.
    pub async fn deactivate(&self, id: i64) -> Result<u64> {
        let done = sqlx::query("UPDATE countries SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}
