use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::handlers::{internal_error, json_message};
use crate::AppState;

pub async fn list_plans(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.list_active_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn get_plan(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.catalog.get_plan_by_id(id).await {
        Ok(Some(plan)) if plan.is_active => Json(plan).into_response(),
        Ok(_) => json_message(StatusCode::NOT_FOUND, "Plan not found"),
        Err(err) => internal_error(err),
    }
}

pub async fn list_addons(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.list_active_addons().await {
        Ok(addons) => Json(addons).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.list_active_services().await {
        Ok(services) => Json(services).into_response(),
        Err(err) => internal_error(err),
    }
}
