use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;

use crate::api::Claims;
use crate::handlers::{internal_error, json_message};
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    match state.invoices.list_by_user(user_id).await {
        Ok(invoices) => Json(invoices).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    match state.invoices.get_by_id(id).await {
        Ok(Some(invoice)) if invoice.user_id == user_id => Json(invoice).into_response(),
        Ok(_) => json_message(StatusCode::NOT_FOUND, "Invoice not found"),
        Err(err) => internal_error(err),
    }
}
