pub mod admin;
pub mod auth;
pub mod catalog;
pub mod countries;
pub mod invoices;
pub mod orders;
pub mod payments;
pub mod referrals;
pub mod servers;
pub mod tickets;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

/// Log the error and hide the details from the client.
pub(crate) fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!(error = ?err, "Request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

pub(crate) fn json_message(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(serde_json::json!({ "message": message })),
    )
        .into_response()
}
