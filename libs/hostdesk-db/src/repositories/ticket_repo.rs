use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::ticket::{Ticket, TicketReply};

#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        subject: &str,
        department: &str,
        priority: &str,
        message: &str,
    ) -> Result<Ticket> {
        let mut tx = self.pool.begin().await?;

        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (user_id, subject, department, priority)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(subject)
        .bind(department)
        .bind(priority)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert ticket")?;

        sqlx::query(
            "INSERT INTO ticket_replies (ticket_id, user_id, message, is_staff) VALUES ($1, $2, $3, FALSE)",
        )
        .bind(ticket.id)
        .bind(user_id)
        .bind(message)
        .execute(&mut *tx)
        .await
        .context("Failed to insert opening message")?;

        tx.commit().await?;
        Ok(ticket)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Ticket>> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch ticket by ID")
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Ticket>> {
        sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch user tickets")
    }

    pub async fn list_all(&self) -> Result<Vec<Ticket>> {
        sqlx::query_as::<_, Ticket>("SELECT * FROM tickets ORDER BY updated_at DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch tickets")
    }

    /// Inserts a reply and moves the ticket into the matching waiting state.
    pub async fn add_reply(
        &self,
        ticket_id: i64,
        user_id: i64,
        message: &str,
        is_staff: bool,
    ) -> Result<TicketReply> {
        let mut tx = self.pool.begin().await?;

        let reply = sqlx::query_as::<_, TicketReply>(
            r#"
            INSERT INTO ticket_replies (ticket_id, user_id, message, is_staff)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(message)
        .bind(is_staff)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to insert ticket reply")?;

        let status = if is_staff { "answered" } else { "customer_reply" };
        sqlx::query(
            "UPDATE tickets SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status <> 'closed'",
        )
        .bind(status)
        .bind(ticket_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reply)
    }

    pub async fn list_replies(&self, ticket_id: i64) -> Result<Vec<TicketReply>> {
        sqlx::query_as::<_, TicketReply>(
            "SELECT * FROM ticket_replies WHERE ticket_id = $1 ORDER BY created_at",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch ticket replies")
    }

    pub async fn set_status(&self, id: i64, status: &str) -> Result<u64> {
        let done = sqlx::query(
            "UPDATE tickets SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected())
    }
}
