use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::referral::{CommissionRule, ReferralEarning, ReferralPayout};

#[derive(Debug, Clone)]
pub struct ReferralRepository {
    pool: PgPool,
}

impl ReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn active_rules(&self) -> Result<Vec<CommissionRule>> {
        sqlx::query_as::<_, CommissionRule>(
            "SELECT * FROM commission_rules WHERE is_active = TRUE ORDER BY level, priority DESC, id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch commission rules")
    }

    pub async fn list_rules(&self) -> Result<Vec<CommissionRule>> {
        sqlx::query_as::<_, CommissionRule>(
            "SELECT * FROM commission_rules ORDER BY level, priority DESC, id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch commission rules")
    }

    pub async fn create_rule(
        &self,
        level: i32,
        product_type: Option<&str>,
        rate: Decimal,
        priority: i32,
    ) -> Result<CommissionRule> {
        sqlx::query_as::<_, CommissionRule>(
            r#"
            INSERT INTO commission_rules (level, product_type, rate, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(level)
        .bind(product_type)
        .bind(rate)
        .bind(priority)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert commission rule")
    }

    pub async fn update_rule(
        &self,
        id: i64,
        rate: Decimal,
        priority: i32,
        is_active: bool,
    ) -> Result<u64> {
        let done = sqlx::query(
            "UPDATE commission_rules SET rate = $1, priority = $2, is_active = $3 WHERE id = $4",
        )
        .bind(rate)
        .bind(priority)
        .bind(is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    pub async fn delete_rule(&self, id: i64) -> Result<u64> {
        let done = sqlx::query("DELETE FROM commission_rules WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected())
    }

    /// The (order_id, level) unique constraint is the real guard; this check
    /// keeps recomputation from even attempting duplicate inserts.
    pub async fn earnings_exist_for_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM referral_earnings WHERE order_id = $1)",
        )
        .bind(order_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(exists)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_earning(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        referrer_id: i64,
        referred_user_id: i64,
        order_id: i64,
        level: i32,
        rate: Decimal,
        order_amount: Decimal,
        amount: Decimal,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO referral_earnings
                (referrer_id, referred_user_id, order_id, level, rate, order_amount, amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(referrer_id)
        .bind(referred_user_id)
        .bind(order_id)
        .bind(level)
        .bind(rate)
        .bind(order_amount)
        .bind(amount)
        .execute(&mut **tx)
        .await
        .context("Failed to insert referral earning")?;
        Ok(())
    }

    pub async fn list_earnings_by_referrer(&self, referrer_id: i64) -> Result<Vec<ReferralEarning>> {
        sqlx::query_as::<_, ReferralEarning>(
            "SELECT * FROM referral_earnings WHERE referrer_id = $1 ORDER BY created_at DESC",
        )
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch referral earnings")
    }

    pub async fn get_earning(&self, id: i64) -> Result<Option<ReferralEarning>> {
        sqlx::query_as::<_, ReferralEarning>("SELECT * FROM referral_earnings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch referral earning")
    }

    pub async fn approve_earning(&self, id: i64) -> Result<u64> {
        let done = sqlx::query(
            "UPDATE referral_earnings SET status = 'approved' WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }

    pub async fn approved_total(&self, user_id: i64) -> Result<Decimal> {
        let total: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(amount) FROM referral_earnings WHERE referrer_id = $1 AND status = 'approved' AND payout_id IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total.unwrap_or_default())
    }

    /// Bundle all unattached approved earnings into one payout row.
    pub async fn create_payout(
        &self,
        user_id: i64,
        gross: Decimal,
        tax: Decimal,
        net: Decimal,
    ) -> Result<ReferralPayout> {
        let mut tx = self.pool.begin().await?;

        // Lock the rows first; FOR UPDATE does not combine with aggregates.
        let locked: Vec<(i64, Decimal)> = sqlx::query_as(
            "SELECT id, amount FROM referral_earnings WHERE referrer_id = $1 AND status = 'approved' AND payout_id IS NULL FOR UPDATE",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let gross_check: Decimal = locked.iter().map(|(_, amount)| *amount).sum();
        if gross_check != gross {
            return Err(anyhow::anyhow!(
                "Approved balance changed while requesting payout"
            ));
        }

        let payout = sqlx::query_as::<_, ReferralPayout>(
            r#"
            INSERT INTO referral_payouts (user_id, gross_amount, tax_amount, net_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(gross)
        .bind(tax)
        .bind(net)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert payout")?;

        sqlx::query(
            "UPDATE referral_earnings SET payout_id = $1 WHERE referrer_id = $2 AND status = 'approved' AND payout_id IS NULL",
        )
        .bind(payout.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(payout)
    }

    pub async fn get_payout(&self, id: i64) -> Result<Option<ReferralPayout>> {
        sqlx::query_as::<_, ReferralPayout>("SELECT * FROM referral_payouts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch payout")
    }

    pub async fn list_payouts_by_user(&self, user_id: i64) -> Result<Vec<ReferralPayout>> {
        sqlx::query_as::<_, ReferralPayout>(
            "SELECT * FROM referral_payouts WHERE user_id = $1 ORDER BY requested_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch user payouts")
    }

    pub async fn list_payouts_all(&self) -> Result<Vec<ReferralPayout>> {
        sqlx::query_as::<_, ReferralPayout>(
            "SELECT * FROM referral_payouts ORDER BY requested_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch payouts")
    }

    /// Paid: bundled earnings flip to paid. Rejected: they detach and return
    /// to the approved pool.
    pub async fn process_payout(&self, id: i64, status: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let done = sqlx::query(
            r#"
            UPDATE referral_payouts
            SET status = $1, processed_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status IN ('requested', 'processing')
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to update payout")?;

        if done.rows_affected() > 0 {
            match status {
                "paid" => {
                    sqlx::query(
                        "UPDATE referral_earnings SET status = 'paid', paid_at = CURRENT_TIMESTAMP WHERE payout_id = $1",
                    )
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                }
                "rejected" => {
                    sqlx::query("UPDATE referral_earnings SET payout_id = NULL WHERE payout_id = $1")
                        .bind(id)
                        .execute(&mut *tx)
                        .await?;
                }
                _ => {}
            }
        }

        tx.commit().await?;
        Ok(done.rows_affected())
    }
}
