use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use hostdesk_db::models::server;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::handlers::orders::order_error_response;
use crate::handlers::{internal_error, json_message};
use crate::AppState;

const DEFAULT_LIST_LIMIT: i64 = 200;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct RefundRequest {
    /// Omitted = refund the full remaining balance.
    pub amount: Option<Decimal>,
}

#[derive(Deserialize)]
pub struct ServerStatusRequest {
    pub status: String,
    pub ip_address: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 1000);
    match state.orders.list_all(limit).await {
        Ok(orders) => Json(orders).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let order = match state.orders.get_by_id(id).await {
        Ok(Some(order)) => order,
        Ok(None) => return json_message(StatusCode::NOT_FOUND, "Order not found"),
        Err(err) => return internal_error(err),
    };

    let addons = match state.orders.addon_lines(order.id).await {
        Ok(lines) => lines,
        Err(err) => return internal_error(err),
    };
    let services = match state.orders.service_lines(order.id).await {
        Ok(lines) => lines,
        Err(err) => return internal_error(err),
    };
    let invoice = match state.order_service.invoice_for_order(order.id).await {
        Ok(invoice) => invoice,
        Err(err) => return internal_error(err),
    };

    Json(serde_json::json!({
        "order": order,
        "addons": addons,
        "services": services,
        "invoice": invoice,
    }))
    .into_response()
}

/// Manual confirmation, e.g. after an offline bank transfer. Runs the same
/// paid path as the gateway callbacks, commissions included.
pub async fn mark_paid(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    if let Ok(None) = state.orders.get_by_id(id).await {
        return json_message(StatusCode::NOT_FOUND, "Order not found");
    }

    match state.order_service.confirm_paid(id).await {
        Ok(true) => json_message(StatusCode::OK, "Order marked paid"),
        Ok(false) => json_message(StatusCode::BAD_REQUEST, "Order is not awaiting payment"),
        Err(err) => internal_error(err),
    }
}

pub async fn refund(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RefundRequest>,
) -> impl IntoResponse {
    let order = match state.orders.get_by_id(id).await {
        Ok(Some(order)) => order,
        Ok(None) => return json_message(StatusCode::NOT_FOUND, "Order not found"),
        Err(err) => return internal_error(err),
    };

    match state.order_service.refund(&order, payload.amount).await {
        Ok(()) => json_message(StatusCode::OK, "Refund recorded"),
        Err(err) => order_error_response(err),
    }
}

pub async fn list_servers(State(state): State<AppState>) -> impl IntoResponse {
    match state.servers.list_all().await {
        Ok(servers) => Json(servers).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn set_server_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ServerStatusRequest>,
) -> impl IntoResponse {
    let allowed = [
        server::SERVER_PROVISIONING,
        server::SERVER_ACTIVE,
        server::SERVER_SUSPENDED,
        server::SERVER_TERMINATED,
    ];
    if !allowed.contains(&payload.status.as_str()) {
        return json_message(StatusCode::BAD_REQUEST, "Unknown server status");
    }

    match state
        .servers
        .set_status(id, &payload.status, payload.ip_address.as_deref())
        .await
    {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Server not found"),
        Ok(_) => json_message(StatusCode::OK, "Server status updated"),
        Err(err) => internal_error(err),
    }
}
