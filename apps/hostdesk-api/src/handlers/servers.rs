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

    match state.servers.list_by_user(user_id).await {
        Ok(servers) => Json(servers).into_response(),
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

    match state.servers.get_by_id(id).await {
        Ok(Some(server)) if server.user_id == user_id => Json(server).into_response(),
        Ok(_) => json_message(StatusCode::NOT_FOUND, "Server not found"),
        Err(err) => internal_error(err),
    }
}
