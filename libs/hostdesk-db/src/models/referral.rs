use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const EARNING_PENDING: &str = "pending";
pub const EARNING_APPROVED: &str = "approved";
pub const EARNING_PAID: &str = "paid";

pub const PAYOUT_REQUESTED: &str = "requested";
pub const PAYOUT_PROCESSING: &str = "processing";
pub const PAYOUT_PAID: &str = "paid";
pub const PAYOUT_REJECTED: &str = "rejected";

/// The referrer chain is capped at this depth; `ReferralEarning.level` is
/// always in 1..=MAX_REFERRAL_DEPTH.
pub const MAX_REFERRAL_DEPTH: usize = 3;

/// Data-driven commission policy: (level, product type) -> rate percent.
/// `product_type = NULL` matches any plan type; on a tie the higher priority
/// wins.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommissionRule {
    pub id: i64,
    pub level: i32,
    pub product_type: Option<String>,
    pub rate: Decimal,
    pub priority: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One row per qualifying order per resolved referral level. Only `status`,
/// `payout_id` and `paid_at` ever mutate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferralEarning {
    pub id: i64,
    pub referrer_id: i64,
    pub referred_user_id: i64,
    pub order_id: i64,
    pub level: i32,
    pub rate: Decimal,
    pub order_amount: Decimal,
    pub amount: Decimal,
    pub status: String,
    pub payout_id: Option<i64>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Aggregates a user's approved earnings into one withdrawal request.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReferralPayout {
    pub id: i64,
    pub user_id: i64,
    pub gross_amount: Decimal,
    pub tax_amount: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}
