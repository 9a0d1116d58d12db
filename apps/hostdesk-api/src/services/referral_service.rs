use std::sync::Arc;

use anyhow::Result;
use hostdesk_db::models::referral::{ReferralEarning, ReferralPayout};
use hostdesk_db::models::user::User;
use hostdesk_db::repositories::referral_repo::ReferralRepository;
use hostdesk_db::repositories::user_repo::UserRepository;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::pricing::percent_of;
use crate::settings::SettingsService;

#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("Nothing to pay out")]
    NothingApproved,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralSummary {
    pub referral_code: String,
    pub referred_users: i64,
    pub approved_balance: Decimal,
}

pub struct ReferralService {
    users: UserRepository,
    referrals: ReferralRepository,
    settings: Arc<SettingsService>,
}

impl ReferralService {
    pub fn new(
        users: UserRepository,
        referrals: ReferralRepository,
        settings: Arc<SettingsService>,
    ) -> Self {
        Self {
            users,
            referrals,
            settings,
        }
    }

    pub async fn summary(&self, user: &User) -> Result<ReferralSummary> {
        let referred_users = self.users.referral_count(user.id).await?;
        let approved_balance = self.referrals.approved_total(user.id).await?;
        Ok(ReferralSummary {
            referral_code: user.referral_code.clone(),
            referred_users,
            approved_balance,
        })
    }

    pub async fn earnings(&self, user_id: i64) -> Result<Vec<ReferralEarning>> {
        self.referrals.list_earnings_by_referrer(user_id).await
    }

    /// Bundles every unattached approved earning into a withdrawal request.
    /// Tax is withheld at `payout_tax_percent`.
    pub async fn request_payout(&self, user_id: i64) -> Result<ReferralPayout, PayoutError> {
        let gross = self.referrals.approved_total(user_id).await?;
        if gross <= Decimal::ZERO {
            return Err(PayoutError::NothingApproved);
        }

        let tax_percent = self
            .settings
            .get_decimal("payout_tax_percent", Decimal::ZERO)
            .await;
        let (tax, net) = payout_split(gross, tax_percent);

        let payout = self.referrals.create_payout(user_id, gross, tax, net).await?;
        info!(user_id, payout_id = payout.id, %gross, %net, "Payout requested");
        Ok(payout)
    }
}

/// gross -> (withheld tax, net). Net absorbs the rounding so the two parts
/// always sum back to gross.
pub fn payout_split(gross: Decimal, tax_percent: Decimal) -> (Decimal, Decimal) {
    let tax = percent_of(gross, tax_percent);
    (tax, gross - tax)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn payout_split_withholds_tax() {
        let (tax, net) = payout_split(d("700.00"), d("10.00"));
        assert_eq!(tax, d("70.00"));
        assert_eq!(net, d("630.00"));
    }

    #[test]
    fn payout_split_parts_sum_to_gross() {
        for gross in ["0.01", "99.99", "1234.57", "10000.00"] {
            let gross = d(gross);
            let (tax, net) = payout_split(gross, d("10.00"));
            assert_eq!(tax + net, gross);
        }
    }

    #[test]
    fn zero_tax_passes_gross_through() {
        let (tax, net) = payout_split(d("500.00"), Decimal::ZERO);
        assert_eq!(tax, d("0.00"));
        assert_eq!(net, d("500.00"));
    }
}
