use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::catalog::{Addon, HostingPlan, PlanPrice, ServiceItem};

#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attach_prices(&self, plans: &mut [HostingPlan]) -> Result<()> {
        for plan in plans.iter_mut() {
            plan.prices = sqlx::query_as::<_, PlanPrice>(
                "SELECT * FROM plan_prices WHERE plan_id = $1 ORDER BY price",
            )
            .bind(plan.id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch plan prices")?;
        }
        Ok(())
    }

    pub async fn list_active_plans(&self) -> Result<Vec<HostingPlan>> {
        let mut plans = sqlx::query_as::<_, HostingPlan>(
            "SELECT * FROM hosting_plans WHERE is_active = TRUE ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch active plans")?;
        self.attach_prices(&mut plans).await?;
        Ok(plans)
    }

    pub async fn list_all_plans(&self) -> Result<Vec<HostingPlan>> {
        let mut plans =
            sqlx::query_as::<_, HostingPlan>("SELECT * FROM hosting_plans ORDER BY sort_order, id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to fetch plans")?;
        self.attach_prices(&mut plans).await?;
        Ok(plans)
    }

    pub async fn get_plan_by_id(&self, id: i64) -> Result<Option<HostingPlan>> {
        let plan = sqlx::query_as::<_, HostingPlan>("SELECT * FROM hosting_plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch plan by ID")?;

        match plan {
            Some(mut plan) => {
                self.attach_prices(std::slice::from_mut(&mut plan)).await?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    pub async fn get_plan_price(
        &self,
        plan_id: i64,
        billing_cycle: &str,
    ) -> Result<Option<PlanPrice>> {
        sqlx::query_as::<_, PlanPrice>(
            "SELECT * FROM plan_prices WHERE plan_id = $1 AND billing_cycle = $2",
        )
        .bind(plan_id)
        .bind(billing_cycle)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch plan price")
    }

    pub async fn create_plan(
        &self,
        name: &str,
        slug: &str,
        plan_type: &str,
        description: Option<&str>,
        sort_order: i64,
        prices: &[(String, Decimal, Decimal)],
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let plan_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO hosting_plans (name, slug, plan_type, description, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(plan_type)
        .bind(description)
        .bind(sort_order)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert plan")?;

        for (cycle, price, discount) in prices {
            sqlx::query(
                "INSERT INTO plan_prices (plan_id, billing_cycle, price, discount_percent) VALUES ($1, $2, $3, $4)",
            )
            .bind(plan_id)
            .bind(cycle)
            .bind(price)
            .bind(discount)
            .execute(&mut *tx)
            .await
            .context("Failed to insert plan price")?;
        }

        tx.commit().await?;
        Ok(plan_id)
    }

    pub async fn update_plan(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        is_active: bool,
        sort_order: i64,
        prices: &[(String, Decimal, Decimal)],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE hosting_plans SET name = $1, description = $2, is_active = $3, sort_order = $4 WHERE id = $5",
        )
        .bind(name)
        .bind(description)
        .bind(is_active)
        .bind(sort_order)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update plan")?;

        // Price rows are replaced wholesale; orders carry their own snapshots.
        sqlx::query("DELETE FROM plan_prices WHERE plan_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (cycle, price, discount) in prices {
            sqlx::query(
                "INSERT INTO plan_prices (plan_id, billing_cycle, price, discount_percent) VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(cycle)
            .bind(price)
            .bind(discount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn deactivate_plan(&self, id: i64) -> Result<u64> {
        let done = sqlx::query("UPDATE hosting_plans SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    pub async fn list_active_addons(&self) -> Result<Vec<Addon>> {
        sqlx::query_as::<_, Addon>("SELECT * FROM addons WHERE is_active = TRUE ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch addons")
    }

    pub async fn list_all_addons(&self) -> Result<Vec<Addon>> {
        sqlx::query_as::<_, Addon>("SELECT * FROM addons ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch addons")
    }

    pub async fn get_addon(&self, id: i64) -> Result<Option<Addon>> {
        sqlx::query_as::<_, Addon>("SELECT * FROM addons WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch addon")
    }

    pub async fn create_addon(
        &self,
        name: &str,
        description: Option<&str>,
        price: Decimal,
    ) -> Result<Addon> {
        sqlx::query_as::<_, Addon>(
            "INSERT INTO addons (name, description, price) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert addon")
    }

    pub async fn update_addon(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        price: Decimal,
        is_active: bool,
    ) -> Result<u64> {
        let done = sqlx::query(
            "UPDATE addons SET name = $1, description = $2, price = $3, is_active = $4 WHERE id = $5",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    pub async fn list_active_services(&self) -> Result<Vec<ServiceItem>> {
        sqlx::query_as::<_, ServiceItem>(
            "SELECT * FROM service_items WHERE is_active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch services")
    }

    pub async fn list_all_services(&self) -> Result<Vec<ServiceItem>> {
        sqlx::query_as::<_, ServiceItem>("SELECT * FROM service_items ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch services")
    }

    pub async fn get_service(&self, id: i64) -> Result<Option<ServiceItem>> {
        sqlx::query_as::<_, ServiceItem>("SELECT * FROM service_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch service")
    }

    pub async fn create_service(
        &self,
        name: &str,
        description: Option<&str>,
        price: Decimal,
    ) -> Result<ServiceItem> {
        sqlx::query_as::<_, ServiceItem>(
            "INSERT INTO service_items (name, description, price) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert service")
    }

    pub async fn update_service(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
        price: Decimal,
        is_active: bool,
    ) -> Result<u64> {
        let done = sqlx::query(
            "UPDATE service_items SET name = $1, description = $2, price = $3, is_active = $4 WHERE id = $5",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }
}
