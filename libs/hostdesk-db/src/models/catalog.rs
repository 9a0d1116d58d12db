use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HostingPlan {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub plan_type: String, // 'shared', 'vps', 'dedicated', 'reseller'
    pub description: Option<String>,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub prices: Vec<PlanPrice>,
}

/// One row per billing cycle a plan is offered at. The discount tier lives
/// here so longer cycles can undercut the monthly rate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanPrice {
    pub id: i64,
    pub plan_id: i64,
    pub billing_cycle: String,
    pub price: Decimal,
    pub discount_percent: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Addon {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
