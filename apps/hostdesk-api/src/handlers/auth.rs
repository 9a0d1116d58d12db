use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::api::issue_token;
use crate::handlers::{internal_error, json_message};
use crate::services::user_service::RegisterError;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub referral_code: Option<String>,
    pub country_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: hostdesk_db::models::user::User,
}

const MIN_PASSWORD_LEN: usize = 8;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return json_message(StatusCode::BAD_REQUEST, "A valid email is required");
    }
    if payload.full_name.trim().is_empty() {
        return json_message(StatusCode::BAD_REQUEST, "Full name is required");
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return json_message(
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters",
        );
    }

    let user = match state
        .user_service
        .register(
            &payload.email,
            &payload.full_name,
            &payload.password,
            payload.referral_code.as_deref(),
            payload.country_id,
        )
        .await
    {
        Ok(user) => user,
        Err(RegisterError::EmailTaken) => {
            return json_message(StatusCode::BAD_REQUEST, "Email is already registered")
        }
        Err(RegisterError::UnknownReferralCode) => {
            return json_message(StatusCode::BAD_REQUEST, "Unknown referral code")
        }
        Err(RegisterError::Other(err)) => return internal_error(err),
    };

    let token = match issue_token(user.id, &user.role, &state.session_secret) {
        Ok(token) => token,
        Err(err) => return internal_error(err),
    };

    (StatusCode::CREATED, Json(AuthResponse { token, user })).into_response()
}

pub async fn profile(
    State(state): State<AppState>,
    axum::Extension(claims): axum::Extension<crate::api::Claims>,
) -> impl IntoResponse {
    let user_id = match claims.user_id() {
        Ok(id) => id,
        Err(status) => return status.into_response(),
    };

    match state.users.get_by_id(user_id).await {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => json_message(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => internal_error(err),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = match state
        .user_service
        .authenticate(&payload.email, &payload.password)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return json_message(StatusCode::UNAUTHORIZED, "Invalid email or password"),
        Err(err) => return internal_error(err),
    };

    let token = match issue_token(user.id, &user.role, &state.session_secret) {
        Ok(token) => token,
        Err(err) => return internal_error(err),
    };

    Json(AuthResponse { token, user }).into_response()
}
