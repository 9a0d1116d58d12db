use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::invoice::Invoice;

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        order_id: i64,
        user_id: i64,
        invoice_number: &str,
        amount: Decimal,
        tax_amount: Decimal,
        total: Decimal,
        due_date: DateTime<Utc>,
    ) -> Result<Invoice> {
        sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (order_id, user_id, invoice_number, amount, tax_amount, total, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(user_id)
        .bind(invoice_number)
        .bind(amount)
        .bind(tax_amount)
        .bind(total)
        .bind(due_date)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert invoice")
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch invoice by ID")
    }

    pub async fn get_by_order(&self, order_id: i64) -> Result<Option<Invoice>> {
        sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE order_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch invoice by order")
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Invoice>> {
        sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch user invoices")
    }

    pub async fn list_all(&self, limit: i64) -> Result<Vec<Invoice>> {
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch invoices")
    }

    pub async fn mark_paid(&self, tx: &mut Transaction<'_, Postgres>, order_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE invoices
            SET status = 'paid', paid_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status = 'unpaid'
            "#,
        )
        .bind(order_id)
        .execute(&mut **tx)
        .await
        .context("Failed to mark invoice paid")?;
        Ok(())
    }

    pub async fn set_status(&self, id: i64, status: &str) -> Result<u64> {
        let done = sqlx::query("UPDATE invoices SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }
}
