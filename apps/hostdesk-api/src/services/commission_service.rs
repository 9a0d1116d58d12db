use std::sync::Arc;

use anyhow::{Context, Result};
use hostdesk_db::models::order::Order;
use hostdesk_db::models::referral::MAX_REFERRAL_DEPTH;
use hostdesk_db::repositories::catalog_repo::CatalogRepository;
use hostdesk_db::repositories::referral_repo::ReferralRepository;
use hostdesk_db::repositories::user_repo::UserRepository;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, warn};

use super::commission::{commission_amount, next_referrer, select_rule, CommissionBasis};
use crate::settings::SettingsService;

/// Creates referral earnings when an order is confirmed paid. Best-effort:
/// the caller logs and moves on if this fails, payment confirmation never
/// rolls back over commissions.
pub struct CommissionService {
    pool: PgPool,
    users: UserRepository,
    referrals: ReferralRepository,
    catalog: CatalogRepository,
    settings: Arc<SettingsService>,
}

impl CommissionService {
    pub fn new(
        pool: PgPool,
        users: UserRepository,
        referrals: ReferralRepository,
        catalog: CatalogRepository,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            pool,
            users,
            referrals,
            catalog,
            settings,
        }
    }

    /// Returns the number of earning rows created. Zero is normal: no
    /// referrer chain, or earnings already exist for this order.
    pub async fn record_for_order(&self, order: &Order) -> Result<usize> {
        let chain = self.resolve_chain(order.user_id).await?;
        if chain.is_empty() {
            debug!(order_id = order.id, "No referrer chain, no commissions");
            return Ok(0);
        }

        let plan = self
            .catalog
            .get_plan_by_id(order.plan_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Order {} references missing plan", order.id))?;

        let rules = self.referrals.active_rules().await?;
        let basis_amount = match self.commission_basis().await {
            CommissionBasis::Gross => order.grand_total,
            CommissionBasis::Net => order.total_amount - order.discount_amount,
        };

        let mut tx = self.pool.begin().await?;

        if self
            .referrals
            .earnings_exist_for_order(&mut tx, order.id)
            .await?
        {
            debug!(order_id = order.id, "Earnings already recorded for order");
            return Ok(0);
        }

        let mut created = 0;
        for (idx, referrer_id) in chain.iter().enumerate() {
            let level = (idx + 1) as i32;

            let rate = match select_rule(&rules, level, &plan.plan_type) {
                Some(rule) => rule.rate,
                None => match self.default_rate(level).await {
                    Some(rate) => rate,
                    None => {
                        warn!(
                            order_id = order.id,
                            level, "No commission rule or default rate, skipping level"
                        );
                        continue;
                    }
                },
            };

            let amount = commission_amount(basis_amount, rate);
            self.referrals
                .insert_earning(
                    &mut tx,
                    *referrer_id,
                    order.user_id,
                    order.id,
                    level,
                    rate,
                    basis_amount,
                    amount,
                )
                .await?;
            created += 1;
        }

        tx.commit().await.context("Failed to commit earnings")?;
        Ok(created)
    }

    /// Up to three ancestors of the purchaser, nearest first. Stops on a
    /// missing link or a circular assignment.
    async fn resolve_chain(&self, purchaser_id: i64) -> Result<Vec<i64>> {
        let mut chain = Vec::with_capacity(MAX_REFERRAL_DEPTH);
        let mut current = purchaser_id;

        while chain.len() < MAX_REFERRAL_DEPTH {
            let candidate = self.users.referrer_of(current).await?;
            match next_referrer(&chain, purchaser_id, candidate) {
                Some(referrer) => {
                    chain.push(referrer);
                    current = referrer;
                }
                None => {
                    if candidate.is_some() {
                        warn!(
                            purchaser_id,
                            "Circular referral assignment detected, truncating chain"
                        );
                    }
                    break;
                }
            }
        }

        Ok(chain)
    }

    async fn commission_basis(&self) -> CommissionBasis {
        let raw = self.settings.get_or_default("commission_basis", "gross").await;
        CommissionBasis::parse(&raw)
    }

    async fn default_rate(&self, level: i32) -> Option<Decimal> {
        let key = format!("referral_default_rate_l{}", level);
        let raw = self.settings.get(&key).await?;
        raw.trim().parse().ok()
    }
}
