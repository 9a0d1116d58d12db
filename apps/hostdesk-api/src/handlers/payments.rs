use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::Extension;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::Claims;
use crate::handlers::orders::owned_order;
use crate::handlers::{internal_error, json_message};
use crate::AppState;

const WEBHOOK_SIGNATURE_HEADER: &str = "x-razorpay-signature";

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub order_id: i64,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// Browser checkout callback: the client posts the payment id and signature
/// it got from the gateway widget.
pub async fn verify(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<VerifyRequest>,
) -> impl IntoResponse {
    let order = match owned_order(&state, &claims, payload.order_id).await {
        Ok(order) => order,
        Err(resp) => return resp,
    };

    let Some(gateway_order_id) = order.gateway_order_id.as_deref() else {
        return json_message(StatusCode::BAD_REQUEST, "Order has no checkout in progress");
    };

    let gateway = state.order_service.gateway().await;
    if !gateway.verify_checkout_signature(
        gateway_order_id,
        &payload.gateway_payment_id,
        &payload.signature,
    ) {
        warn!(order_id = order.id, "Checkout signature verification failed");
        return json_message(StatusCode::BAD_REQUEST, "Invalid payment signature");
    }

    match state.order_service.confirm_paid(order.id).await {
        Ok(confirmed) => Json(serde_json::json!({
            "order_id": order.id,
            "payment_status": "paid",
            "newly_confirmed": confirmed,
        }))
        .into_response(),
        Err(err) => internal_error(err),
    }
}

/// Gateway server-to-server events. Signature covers the raw body, so this
/// handler takes `Bytes` rather than a typed extractor.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let Some(signature) = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return json_message(StatusCode::BAD_REQUEST, "Missing signature header");
    };

    let gateway = state.order_service.gateway().await;
    if !gateway.verify_webhook_signature(&body, signature) {
        warn!("Webhook signature verification failed");
        return json_message(StatusCode::UNAUTHORIZED, "Invalid webhook signature");
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(_) => return json_message(StatusCode::BAD_REQUEST, "Invalid webhook body"),
    };

    let event_name = event.get("event").and_then(|v| v.as_str()).unwrap_or("");
    let gateway_order_id = event
        .pointer("/payload/payment/entity/order_id")
        .and_then(|v| v.as_str());

    match (event_name, gateway_order_id) {
        ("payment.captured", Some(gateway_order_id)) => {
            let order = match state.orders.get_by_gateway_order_id(gateway_order_id).await {
                Ok(Some(order)) => order,
                Ok(None) => {
                    warn!(gateway_order_id, "Webhook for unknown gateway order");
                    return json_message(StatusCode::NOT_FOUND, "Unknown order");
                }
                Err(err) => return internal_error(err),
            };

            match state.order_service.confirm_paid(order.id).await {
                Ok(confirmed) => {
                    info!(order_id = order.id, confirmed, "Webhook payment.captured");
                    json_message(StatusCode::OK, "ok")
                }
                Err(err) => internal_error(err),
            }
        }
        ("payment.failed", Some(gateway_order_id)) => {
            let order = match state.orders.get_by_gateway_order_id(gateway_order_id).await {
                Ok(Some(order)) => order,
                Ok(None) => return json_message(StatusCode::OK, "ok"),
                Err(err) => return internal_error(err),
            };

            if let Err(err) = state.order_service.mark_failed(order.id).await {
                return internal_error(err);
            }
            info!(order_id = order.id, "Webhook payment.failed");
            json_message(StatusCode::OK, "ok")
        }
        // Unhandled events are acknowledged so the gateway stops retrying.
        _ => json_message(StatusCode::OK, "ignored"),
    }
}
