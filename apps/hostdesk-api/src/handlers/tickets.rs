use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use hostdesk_db::models::ticket::{Ticket, TICKET_CLOSED};
use serde::Deserialize;

use crate::api::Claims;
use crate::handlers::{internal_error, json_message};
use crate::AppState;

const DEPARTMENTS: &[&str] = &["billing", "technical", "sales", "abuse"];
const PRIORITIES: &[&str] = &["low", "medium", "high"];

#[derive(Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    #[serde(default = "default_department")]
    pub department: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub message: String,
}

#[derive(Deserialize)]
pub struct ReplyRequest {
    pub message: String,
}

fn default_department() -> String {
    "technical".to_string()
}

fn default_priority() -> String {
    "medium".to_string()
}

async fn owned_ticket(
    state: &AppState,
    claims: &Claims,
    ticket_id: i64,
) -> Result<Ticket, axum::response::Response> {
    let user_id = claims.user_id().map_err(|s| s.into_response())?;
    match state.tickets.get_by_id(ticket_id).await {
        Ok(Some(ticket)) if ticket.user_id == user_id => Ok(ticket),
        Ok(_) => Err(json_message(StatusCode::NOT_FOUND, "Ticket not found")),
        Err(err) => Err(internal_error(err)),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTicketRequest>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    if payload.subject.trim().is_empty() || payload.message.trim().is_empty() {
        return json_message(StatusCode::BAD_REQUEST, "Subject and message are required");
    }
    if !DEPARTMENTS.contains(&payload.department.as_str()) {
        return json_message(StatusCode::BAD_REQUEST, "Unknown department");
    }
    if !PRIORITIES.contains(&payload.priority.as_str()) {
        return json_message(StatusCode::BAD_REQUEST, "Unknown priority");
    }

    match state
        .tickets
        .create(
            user_id,
            payload.subject.trim(),
            &payload.department,
            &payload.priority,
            payload.message.trim(),
        )
        .await
    {
        Ok(ticket) => (StatusCode::CREATED, Json(ticket)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    match state.tickets.list_by_user(user_id).await {
        Ok(tickets) => Json(tickets).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let ticket = match owned_ticket(&state, &claims, id).await {
        Ok(ticket) => ticket,
        Err(resp) => return resp,
    };

    match state.tickets.list_replies(ticket.id).await {
        Ok(replies) => Json(serde_json::json!({
            "ticket": ticket,
            "replies": replies,
        }))
        .into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn reply(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ReplyRequest>,
) -> impl IntoResponse {
    let ticket = match owned_ticket(&state, &claims, id).await {
        Ok(ticket) => ticket,
        Err(resp) => return resp,
    };

    if ticket.status == TICKET_CLOSED {
        return json_message(StatusCode::BAD_REQUEST, "Ticket is closed");
    }
    if payload.message.trim().is_empty() {
        return json_message(StatusCode::BAD_REQUEST, "Message is required");
    }

    match state
        .tickets
        .add_reply(ticket.id, ticket.user_id, payload.message.trim(), false)
        .await
    {
        Ok(reply) => (StatusCode::CREATED, Json(reply)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn close(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let ticket = match owned_ticket(&state, &claims, id).await {
        Ok(ticket) => ticket,
        Err(resp) => return resp,
    };

    match state.tickets.set_status(ticket.id, TICKET_CLOSED).await {
        Ok(_) => json_message(StatusCode::OK, "Ticket closed"),
        Err(err) => internal_error(err),
    }
}
