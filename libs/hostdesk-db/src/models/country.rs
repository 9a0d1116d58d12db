use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Soft-deleted countries keep their row (`is_active = false`) so historical
/// orders can still resolve them by id or ISO code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub iso_code: String,
    pub phone_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
