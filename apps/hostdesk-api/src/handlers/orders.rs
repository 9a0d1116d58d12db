use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use hostdesk_db::models::order::Order;
use serde::Deserialize;

use crate::api::Claims;
use crate::handlers::{internal_error, json_message};
use crate::services::order_service::OrderError;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub plan_id: i64,
    pub billing_cycle: String,
    #[serde(default)]
    pub addon_ids: Vec<i64>,
    #[serde(default)]
    pub service_ids: Vec<i64>,
}

pub(crate) fn order_error_response(err: OrderError) -> axum::response::Response {
    match err {
        OrderError::PlanNotFound => json_message(StatusCode::NOT_FOUND, "Plan not found"),
        OrderError::Other(inner) => internal_error(inner),
        other => json_message(StatusCode::BAD_REQUEST, &other.to_string()),
    }
}

/// Loads an order and checks it belongs to the token's user.
pub(crate) async fn owned_order(
    state: &AppState,
    claims: &Claims,
    order_id: i64,
) -> Result<Order, axum::response::Response> {
    let user_id = claims.user_id().map_err(|s| s.into_response())?;
    match state.orders.get_by_id(order_id).await {
        Ok(Some(order)) if order.user_id == user_id => Ok(order),
        Ok(_) => Err(json_message(StatusCode::NOT_FOUND, "Order not found")),
        Err(err) => Err(internal_error(err)),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    match state
        .order_service
        .create_order(
            user_id,
            payload.plan_id,
            &payload.billing_cycle,
            &payload.addon_ids,
            &payload.service_ids,
        )
        .await
    {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(err) => order_error_response(err),
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

    match state.orders.list_by_user(user_id).await {
        Ok(orders) => Json(orders).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let order = match owned_order(&state, &claims, id).await {
        Ok(order) => order,
        Err(resp) => return resp,
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

pub async fn cancel(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let order = match owned_order(&state, &claims, id).await {
        Ok(order) => order,
        Err(resp) => return resp,
    };

    match state.orders.cancel(order.id).await {
        Ok(0) => json_message(StatusCode::BAD_REQUEST, "Order can no longer be cancelled"),
        Ok(_) => json_message(StatusCode::OK, "Order cancelled"),
        Err(err) => internal_error(err),
    }
}

pub async fn checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let order = match owned_order(&state, &claims, id).await {
        Ok(order) => order,
        Err(resp) => return resp,
    };

    match state.order_service.checkout(&order).await {
        Ok(session) => Json(session).into_response(),
        Err(err) => order_error_response(err),
    }
}
