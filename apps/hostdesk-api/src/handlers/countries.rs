use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::handlers::{internal_error, json_message};
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    match state.countries.list_active().await {
        Ok(countries) => Json(countries).into_response(),
        Err(err) => internal_error(err),
    }
}

/// Lookup by ISO code; deliberately ignores the active flag so historical
/// orders can still resolve a retired country.
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match state.countries.get_by_code(&code).await {
        Ok(Some(country)) => Json(country).into_response(),
        Ok(None) => json_message(StatusCode::NOT_FOUND, "Country not found"),
        Err(err) => internal_error(err),
    }
}
