use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::order::{Order, OrderAddon, OrderService};

/// Amounts computed by the pricing step, persisted verbatim.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub plan_id: i64,
    pub billing_cycle: String,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub item_id: i64,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(
        &self,
        order: &NewOrder,
        addons: &[NewOrderLine],
        services: &[NewOrderLine],
    ) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders
                (user_id, plan_id, billing_cycle, total_amount, discount_amount, tax_amount, grand_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(order.user_id)
        .bind(order.plan_id)
        .bind(&order.billing_cycle)
        .bind(order.total_amount)
        .bind(order.discount_amount)
        .bind(order.tax_amount)
        .bind(order.grand_total)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert order")?;

        for line in addons {
            sqlx::query(
                "INSERT INTO order_addons (order_id, addon_id, name, price) VALUES ($1, $2, $3, $4)",
            )
            .bind(created.id)
            .bind(line.item_id)
            .bind(&line.name)
            .bind(line.price)
            .execute(&mut *tx)
            .await
            .context("Failed to insert order addon line")?;
        }

        for line in services {
            sqlx::query(
                "INSERT INTO order_services (order_id, service_id, name, price) VALUES ($1, $2, $3, $4)",
            )
            .bind(created.id)
            .bind(line.item_id)
            .bind(&line.name)
            .bind(line.price)
            .execute(&mut *tx)
            .await
            .context("Failed to insert order service line")?;
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Order>> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch order by ID")
    }

    pub async fn get_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Order>> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE gateway_order_id = $1")
            .bind(gateway_order_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch order by gateway ID")
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Order>> {
        sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch user orders")
    }

    pub async fn list_all(&self, limit: i64) -> Result<Vec<Order>> {
        sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch orders")
    }

    pub async fn addon_lines(&self, order_id: i64) -> Result<Vec<OrderAddon>> {
        sqlx::query_as::<_, OrderAddon>("SELECT * FROM order_addons WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch order addon lines")
    }

    pub async fn service_lines(&self, order_id: i64) -> Result<Vec<OrderService>> {
        sqlx::query_as::<_, OrderService>("SELECT * FROM order_services WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch order service lines")
    }

    pub async fn set_gateway_order_id(&self, id: i64, gateway_order_id: &str) -> Result<()> {
        sqlx::query("UPDATE orders SET gateway_order_id = $1 WHERE id = $2 AND payment_status = 'pending'")
            .bind(gateway_order_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to store gateway order id")?;
        Ok(())
    }

    /// Flip to paid/active within the caller's transaction. Returns false if
    /// the order was not in a payable state (already paid, cancelled...).
    pub async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<bool> {
        let done = sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = 'paid',
                status = 'active',
                paid_at = CURRENT_TIMESTAMP,
                service_starts_at = $1,
                service_ends_at = $2
            WHERE id = $3 AND payment_status = 'pending' AND status = 'pending'
            "#,
        )
        .bind(starts_at)
        .bind(ends_at)
        .bind(id)
        .execute(&mut **tx)
        .await
        .context("Failed to mark order paid")?;
        Ok(done.rows_affected() > 0)
    }

    pub async fn mark_failed(&self, id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE orders SET payment_status = 'failed' WHERE id = $1 AND payment_status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn cancel(&self, id: i64) -> Result<u64> {
        let done = sqlx::query(
            "UPDATE orders SET status = 'cancelled' WHERE id = $1 AND payment_status = 'pending' AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    /// Refunds touch only the refund fields; the paid amounts stay frozen.
    /// The balance predicate makes concurrent refunds safe: whichever UPDATE
    /// runs second sees the bumped `refunded_amount` and matches no row.
    pub async fn record_refund(&self, id: i64, amount: Decimal, full: bool) -> Result<u64> {
        let payment_status = if full { "refunded" } else { "partially_refunded" };
        let done = sqlx::query(
            r#"
            UPDATE orders
            SET refunded_amount = refunded_amount + $1,
                payment_status = $2,
                status = CASE WHEN $3 THEN 'cancelled' ELSE status END
            WHERE id = $4
              AND payment_status IN ('paid', 'partially_refunded')
              AND refunded_amount + $1 <= grand_total
            "#,
        )
        .bind(amount)
        .bind(payment_status)
        .bind(full)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to record refund")?;
        Ok(done.rows_affected())
    }
}
