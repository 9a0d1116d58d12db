use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const TICKET_OPEN: &str = "open";
pub const TICKET_ANSWERED: &str = "answered";
pub const TICKET_CUSTOMER_REPLY: &str = "customer_reply";
pub const TICKET_CLOSED: &str = "closed";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub department: String,
    pub priority: String, // 'low', 'medium', 'high'
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketReply {
    pub id: i64,
    pub ticket_id: i64,
    pub user_id: i64,
    pub message: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}
