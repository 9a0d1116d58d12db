use std::collections::HashMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::handlers::{internal_error, json_message};
use crate::AppState;

/// Secrets never leave the server; they are write-only from the admin's
/// point of view.
const REDACTED_KEYS: &[&str] = &["razorpay_key_secret", "razorpay_webhook_secret"];

pub async fn get(State(state): State<AppState>) -> impl IntoResponse {
    let mut settings = state.settings.all().await;
    for key in REDACTED_KEYS {
        if settings.contains_key(*key) {
            settings.insert(key.to_string(), "********".to_string());
        }
    }
    Json(settings).into_response()
}

pub async fn save(
    State(state): State<AppState>,
    Json(payload): Json<HashMap<String, String>>,
) -> impl IntoResponse {
    if payload.is_empty() {
        return json_message(StatusCode::BAD_REQUEST, "No settings provided");
    }

    // Drop redacted placeholders so a round-tripped form cannot clobber a
    // stored secret.
    let updates: HashMap<String, String> = payload
        .into_iter()
        .filter(|(_, value)| value != "********")
        .collect();

    match state.settings.set_multiple(updates).await {
        Ok(()) => json_message(StatusCode::OK, "Settings saved"),
        Err(err) => internal_error(err),
    }
}
