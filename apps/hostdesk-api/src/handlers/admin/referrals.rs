use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use hostdesk_db::models::referral::{PAYOUT_PAID, PAYOUT_PROCESSING, PAYOUT_REJECTED};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::handlers::{internal_error, json_message};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub level: i32,
    pub product_type: Option<String>,
    pub rate: Decimal,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Deserialize)]
pub struct UpdateRuleRequest {
    pub rate: Decimal,
    pub priority: i32,
    pub is_active: bool,
}

#[derive(Deserialize)]
pub struct ProcessPayoutRequest {
    /// processing | paid | rejected
    pub status: String,
}

fn rate_in_range(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate <= Decimal::from(100)
}

pub async fn list_rules(State(state): State<AppState>) -> impl IntoResponse {
    match state.referrals.list_rules().await {
        Ok(rules) => Json(rules).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn create_rule(
    State(state): State<AppState>,
    Json(payload): Json<CreateRuleRequest>,
) -> impl IntoResponse {
    if !(1..=3).contains(&payload.level) {
        return json_message(StatusCode::BAD_REQUEST, "Level must be 1, 2 or 3");
    }
    if !rate_in_range(payload.rate) {
        return json_message(StatusCode::BAD_REQUEST, "Rate must be within 0-100");
    }

    match state
        .referrals
        .create_rule(
            payload.level,
            payload.product_type.as_deref(),
            payload.rate,
            payload.priority,
        )
        .await
    {
        Ok(rule) => (StatusCode::CREATED, Json(rule)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRuleRequest>,
) -> impl IntoResponse {
    if !rate_in_range(payload.rate) {
        return json_message(StatusCode::BAD_REQUEST, "Rate must be within 0-100");
    }

    match state
        .referrals
        .update_rule(id, payload.rate, payload.priority, payload.is_active)
        .await
    {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Rule not found"),
        Ok(_) => json_message(StatusCode::OK, "Rule updated"),
        Err(err) => internal_error(err),
    }
}

pub async fn delete_rule(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.referrals.delete_rule(id).await {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Rule not found"),
        Ok(_) => json_message(StatusCode::OK, "Rule deleted"),
        Err(err) => internal_error(err),
    }
}

pub async fn approve_earning(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.referrals.approve_earning(id).await {
        Ok(0) => json_message(
            StatusCode::BAD_REQUEST,
            "Earning not found or not pending",
        ),
        Ok(_) => json_message(StatusCode::OK, "Earning approved"),
        Err(err) => internal_error(err),
    }
}

pub async fn list_payouts(State(state): State<AppState>) -> impl IntoResponse {
    match state.referrals.list_payouts_all().await {
        Ok(payouts) => Json(payouts).into_response(),
        Err(err) => internal_error(err),
    }
}

/// `paid` flips the bundled earnings to paid; `rejected` releases them back
/// to the approved pool.
pub async fn process_payout(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProcessPayoutRequest>,
) -> impl IntoResponse {
    let allowed = [PAYOUT_PROCESSING, PAYOUT_PAID, PAYOUT_REJECTED];
    if !allowed.contains(&payload.status.as_str()) {
        return json_message(StatusCode::BAD_REQUEST, "Unknown payout status");
    }

    match state.referrals.process_payout(id, &payload.status).await {
        Ok(0) => json_message(
            StatusCode::BAD_REQUEST,
            "Payout not found or already finalized",
        ),
        Ok(_) => json_message(StatusCode::OK, "Payout processed"),
        Err(err) => internal_error(err),
    }
}
