use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;

use crate::api::Claims;
use crate::handlers::{internal_error, json_message};
use crate::services::referral_service::PayoutError;
use crate::AppState;

pub async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    let user = match state.users.get_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return json_message(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => return internal_error(err),
    };

    match state.referral_service.summary(&user).await {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn earnings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    match state.referral_service.earnings(user_id).await {
        Ok(earnings) => Json(earnings).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn list_payouts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    match state.referrals.list_payouts_by_user(user_id).await {
        Ok(payouts) => Json(payouts).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn request_payout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    match state.referral_service.request_payout(user_id).await {
        Ok(payout) => (StatusCode::CREATED, Json(payout)).into_response(),
        Err(PayoutError::NothingApproved) => {
            json_message(StatusCode::BAD_REQUEST, "No approved earnings to pay out")
        }
        Err(PayoutError::Other(err)) => internal_error(err),
    }
}
