use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_PAID: &str = "paid";
pub const PAYMENT_FAILED: &str = "failed";
pub const PAYMENT_REFUNDED: &str = "refunded";
pub const PAYMENT_PARTIALLY_REFUNDED: &str = "partially_refunded";

pub const ORDER_PENDING: &str = "pending";
pub const ORDER_ACTIVE: &str = "active";
pub const ORDER_CANCELLED: &str = "cancelled";
pub const ORDER_COMPLETED: &str = "completed";
pub const ORDER_EXPIRED: &str = "expired";

/// Subscription renewal period. Stored as text in the orders and plan_prices
/// tables; parsed into this enum wherever the month count matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
    Biennial,
    Triennial,
}

impl BillingCycle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "semiannual" => Some(Self::Semiannual),
            "annual" => Some(Self::Annual),
            "biennial" => Some(Self::Biennial),
            "triennial" => Some(Self::Triennial),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Semiannual => "semiannual",
            Self::Annual => "annual",
            Self::Biennial => "biennial",
            Self::Triennial => "triennial",
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Semiannual => 6,
            Self::Annual => 12,
            Self::Biennial => 24,
            Self::Triennial => 36,
        }
    }
}

/// Immutable once paid, except the refund fields and the order status.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub billing_cycle: String,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
    pub refunded_amount: Decimal,
    pub payment_status: String,
    pub status: String,
    pub gateway_order_id: Option<String>,
    pub service_starts_at: Option<DateTime<Utc>>,
    pub service_ends_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Point-in-time price snapshot so historical invoices survive catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderAddon {
    pub id: i64,
    pub order_id: i64,
    pub addon_id: i64,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderService {
    pub id: i64,
    pub order_id: i64,
    pub service_id: i64,
    pub name: String,
    pub price: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_cycle_round_trips_through_text() {
        for s in [
            "monthly",
            "quarterly",
            "semiannual",
            "annual",
            "biennial",
            "triennial",
        ] {
            let cycle = BillingCycle::parse(s).unwrap();
            assert_eq!(cycle.as_str(), s);
        }
        assert!(BillingCycle::parse("weekly").is_none());
    }

    #[test]
    fn billing_cycle_month_counts() {
        assert_eq!(BillingCycle::Monthly.months(), 1);
        assert_eq!(BillingCycle::Quarterly.months(), 3);
        assert_eq!(BillingCycle::Semiannual.months(), 6);
        assert_eq!(BillingCycle::Annual.months(), 12);
        assert_eq!(BillingCycle::Biennial.months(), 24);
        assert_eq!(BillingCycle::Triennial.months(), 36);
    }
}
