use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use hostdesk_db::models::order::BillingCycle;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::handlers::{internal_error, json_message};
use crate::AppState;

const PLAN_TYPES: &[&str] = &["shared", "vps", "dedicated", "reseller"];

#[derive(Deserialize)]
pub struct PriceInput {
    pub billing_cycle: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_percent: Decimal,
}

#[derive(Deserialize)]
pub struct CreatePlanRequest {
    pub name: String,
    pub slug: String,
    pub plan_type: String,
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    pub prices: Vec<PriceInput>,
}

#[derive(Deserialize)]
pub struct UpdatePlanRequest {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i64,
    pub prices: Vec<PriceInput>,
}

#[derive(Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
}

fn validate_prices(prices: &[PriceInput]) -> Result<Vec<(String, Decimal, Decimal)>, String> {
    if prices.is_empty() {
        return Err("At least one price row is required".to_string());
    }
    let mut rows = Vec::with_capacity(prices.len());
    for p in prices {
        if BillingCycle::parse(&p.billing_cycle).is_none() {
            return Err(format!("Unknown billing cycle '{}'", p.billing_cycle));
        }
        if p.price < Decimal::ZERO
            || p.discount_percent < Decimal::ZERO
            || p.discount_percent > Decimal::from(100)
        {
            return Err("Price must be >= 0 and discount within 0-100".to_string());
        }
        rows.push((p.billing_cycle.clone(), p.price, p.discount_percent));
    }
    Ok(rows)
}

pub async fn list_plans(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.list_all_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn create_plan(
    State(state): State<AppState>,
    Json(payload): Json<CreatePlanRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() || payload.slug.trim().is_empty() {
        return json_message(StatusCode::BAD_REQUEST, "Name and slug are required");
    }
    if !PLAN_TYPES.contains(&payload.plan_type.as_str()) {
        return json_message(StatusCode::BAD_REQUEST, "Unknown plan type");
    }
    let prices = match validate_prices(&payload.prices) {
        Ok(rows) => rows,
        Err(msg) => return json_message(StatusCode::BAD_REQUEST, &msg),
    };

    match state
        .catalog
        .create_plan(
            payload.name.trim(),
            payload.slug.trim(),
            &payload.plan_type,
            payload.description.as_deref(),
            payload.sort_order,
            &prices,
        )
        .await
    {
        Ok(id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "id": id })),
        )
            .into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn update_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePlanRequest>,
) -> impl IntoResponse {
    let prices = match validate_prices(&payload.prices) {
        Ok(rows) => rows,
        Err(msg) => return json_message(StatusCode::BAD_REQUEST, &msg),
    };

    if let Ok(None) = state.catalog.get_plan_by_id(id).await {
        return json_message(StatusCode::NOT_FOUND, "Plan not found");
    }

    match state
        .catalog
        .update_plan(
            id,
            payload.name.trim(),
            payload.description.as_deref(),
            payload.is_active,
            payload.sort_order,
            &prices,
        )
        .await
    {
        Ok(()) => json_message(StatusCode::OK, "Plan updated"),
        Err(err) => internal_error(err),
    }
}

pub async fn delete_plan(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.catalog.deactivate_plan(id).await {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Plan not found"),
        Ok(_) => json_message(StatusCode::OK, "Plan deactivated"),
        Err(err) => internal_error(err),
    }
}

pub async fn list_addons(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.list_all_addons().await {
        Ok(addons) => Json(addons).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn create_addon(
    State(state): State<AppState>,
    Json(payload): Json<ItemRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() || payload.price < Decimal::ZERO {
        return json_message(StatusCode::BAD_REQUEST, "Name and a non-negative price required");
    }

    match state
        .catalog
        .create_addon(payload.name.trim(), payload.description.as_deref(), payload.price)
        .await
    {
        Ok(addon) => (StatusCode::CREATED, Json(addon)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn update_addon(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateItemRequest>,
) -> impl IntoResponse {
    match state
        .catalog
        .update_addon(
            id,
            payload.name.trim(),
            payload.description.as_deref(),
            payload.price,
            payload.is_active,
        )
        .await
    {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Addon not found"),
        Ok(_) => json_message(StatusCode::OK, "Addon updated"),
        Err(err) => internal_error(err),
    }
}

pub async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.list_all_services().await {
        Ok(services) => Json(services).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<ItemRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() || payload.price < Decimal::ZERO {
        return json_message(StatusCode::BAD_REQUEST, "Name and a non-negative price required");
    }

    match state
        .catalog
        .create_service(payload.name.trim(), payload.description.as_deref(), payload.price)
        .await
    {
        Ok(service) => (StatusCode::CREATED, Json(service)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateItemRequest>,
) -> impl IntoResponse {
    match state
        .catalog
        .update_service(
            id,
            payload.name.trim(),
            payload.description.as_deref(),
            payload.price,
            payload.is_active,
        )
        .await
    {
        Ok(0) => json_message(StatusCode::NOT_FOUND, "Service not found"),
        Ok(_) => json_message(StatusCode::OK, "Service updated"),
        Err(err) => internal_error(err),
    }
}
