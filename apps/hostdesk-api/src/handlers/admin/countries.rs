use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::handlers::{internal_error, json_message};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateCountryRequest {
    pub name: String,
    pub iso_code: String,
    pub phone_code: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateCountryRequest {
    pub name: String,
    pub phone_code: Option<String>,
    pub is_active: bool,
}

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.countries.list_all().await {
        Ok(countries) => Json(countries).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCountryRequest>,
) -> impl IntoResponse {
    let iso = payload.iso_code.trim().to_uppercase();
    if payload.name.trim().is_empty() || iso.len() != 2 {
        return json_message(
            StatusCode::BAD_REQUEST,
            "Name and a 2-letter ISO code are required",
        );
    }

    match state
        .countries
        .create(payload.name.trim(), &iso, payload.phone_code.as_deref())
        .await
    {
        Ok(country) => (StatusCode::CREATED, Json(country)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCountryRequest>,
) -> impl IntoResponse {
    match state
        .countries
        .update(
            id,
            payload.name.trim(),
            payload.phone_code.as_deref(),
            payload.is_active,
        )
        .await
    {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Country not found"),
        Ok(_) => json_message(StatusCode::OK, "Country updated"),
        Err(err) => internal_error(err),
    }
}

/// Soft delete: the row stays resolvable by id/code for historical orders.
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.countries.deactivate(id).await {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Country not found"),
        Ok(_) => json_message(StatusCode::OK, "Country deactivated"),
        Err(err) => internal_error(err),
    }
}
