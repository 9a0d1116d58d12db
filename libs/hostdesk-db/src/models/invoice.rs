use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const INVOICE_UNPAID: &str = "unpaid";
pub const INVOICE_PAID: &str = "paid";
pub const INVOICE_CANCELLED: &str = "cancelled";
pub const INVOICE_REFUNDED: &str = "refunded";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub invoice_number: String,
    pub amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub status: String,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
