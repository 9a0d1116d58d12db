use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::server::Server;

#[derive(Debug, Clone)]
pub struct ServerRepository {
    pool: PgPool,
}

impl ServerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserted inside the payment-confirmation transaction.
    pub async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        user_id: i64,
        plan_id: i64,
        hostname: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO servers (order_id, user_id, plan_id, hostname, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .bind(plan_id)
        .bind(hostname)
        .bind(expires_at)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to insert server record")?;
        Ok(id)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Server>> {
        sqlx::query_as::<_, Server>("SELECT * FROM servers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch server by ID")
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Server>> {
        sqlx::query_as::<_, Server>(
            "SELECT * FROM servers WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch user servers")
    }

    pub async fn list_all(&self) -> Result<Vec<Server>> {
        sqlx::query_as::<_, Server>("SELECT * FROM servers ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch servers")
    }

    pub async fn set_status(&self, id: i64, status: &str, ip_address: Option<&str>) -> Result<u64> {
        let done = sqlx::query(
            r#"
            UPDATE servers
            SET status = $1,
                ip_address = COALESCE($2, ip_address),
                provisioned_at = CASE
                    WHEN $1 = 'active' AND provisioned_at IS NULL THEN CURRENT_TIMESTAMP
                    ELSE provisioned_at
                END
            WHERE id = $3
            "#,
        )
        .bind(status)
        .bind(ip_address)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to update server status")?;
        Ok(done.rows_affected())
    }
}
