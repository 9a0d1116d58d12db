use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const SERVER_PROVISIONING: &str = "provisioning";
pub const SERVER_ACTIVE: &str = "active";
pub const SERVER_SUSPENDED: &str = "suspended";
pub const SERVER_TERMINATED: &str = "terminated";

/// Provisioning record created once an order is marked paid.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Server {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub hostname: String,
    pub ip_address: Option<String>,
    pub status: String,
    pub provisioned_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
