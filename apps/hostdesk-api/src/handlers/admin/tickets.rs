use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use hostdesk_db::models::ticket::{TICKET_ANSWERED, TICKET_CLOSED, TICKET_OPEN};
use serde::Deserialize;

use crate::api::Claims;
use crate::handlers::{internal_error, json_message};
use crate::AppState;

#[derive(Deserialize)]
pub struct ReplyRequest {
    pub message: String,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.tickets.list_all().await {
        Ok(tickets) => Json(tickets).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let ticket = match state.tickets.get_by_id(id).await {
        Ok(Some(ticket)) => ticket,
        Ok(None) => return json_message(StatusCode::NOT_FOUND, "Ticket not found"),
        Err(err) => return internal_error(err),
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
    let staff_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    if payload.message.trim().is_empty() {
        return json_message(StatusCode::BAD_REQUEST, "Message is required");
    }

    if let Ok(None) = state.tickets.get_by_id(id).await {
        return json_message(StatusCode::NOT_FOUND, "Ticket not found");
    }

    match state
        .tickets
        .add_reply(id, staff_id, payload.message.trim(), true)
        .await
    {
        Ok(reply) => (StatusCode::CREATED, Json(reply)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusRequest>,
) -> impl IntoResponse {
    let allowed = [TICKET_OPEN, TICKET_ANSWERED, TICKET_CLOSED];
    if !allowed.contains(&payload.status.as_str()) {
        return json_message(StatusCode::BAD_REQUEST, "Unknown ticket status");
    }

    match state.tickets.set_status(id, &payload.status).await {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Ticket not found"),
        Ok(_) => json_message(StatusCode::OK, "Ticket status updated"),
        Err(err) => internal_error(err),
    }
}
