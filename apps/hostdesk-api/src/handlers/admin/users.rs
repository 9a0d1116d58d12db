use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::handlers::{internal_error, json_message};
use crate::AppState;

#[derive(Deserialize)]
pub struct SetReferrerRequest {
    pub referrer_id: i64,
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.users.list_all().await {
        Ok(users) => Json(users).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let user = match state.users.get_by_id(id).await {
        Ok(Some(user)) => user,
        Ok(None) => return json_message(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => return internal_error(err),
    };

    let orders = match state.orders.list_by_user(user.id).await {
        Ok(orders) => orders,
        Err(err) => return internal_error(err),
    };
    let earnings = match state.referrals.list_earnings_by_referrer(user.id).await {
        Ok(earnings) => earnings,
        Err(err) => return internal_error(err),
    };
    let referred = match state.users.referral_count(user.id).await {
        Ok(count) => count,
        Err(err) => return internal_error(err),
    };

    Json(serde_json::json!({
        "user": user,
        "orders": orders,
        "earnings": earnings,
        "referred_users": referred,
    }))
    .into_response()
}

/// Relink a user's referrer. Cycle and self-reference checks live in the
/// user service.
pub async fn set_referrer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SetReferrerRequest>,
) -> impl IntoResponse {
    if let Ok(None) = state.users.get_by_id(id).await {
        return json_message(StatusCode::NOT_FOUND, "User not found");
    }

    match state
        .user_service
        .link_referrer(id, payload.referrer_id)
        .await
    {
        Ok(()) => json_message(StatusCode::OK, "Referrer updated"),
        Err(err) => json_message(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}
