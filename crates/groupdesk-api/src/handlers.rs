//! Route handlers.
//!
//! Every handler answers `{ "success": true, ... }`; failures go through
//! `ApiError` and answer `{ "success": false, "error": ... }`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use groupdesk_core::{AdvisorId, CommissionRate, EarningsPeriod, GroupTradeIntent};

use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub commission_rate: Option<CommissionRate>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub advisor_code: String,
}

#[derive(Debug, Deserialize)]
pub struct UnlinkRequest {
    pub advisor_id: AdvisorId,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub commission_rate: Option<CommissionRate>,
}

#[derive(Debug, Deserialize)]
pub struct EarningsQuery {
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params
        .map(|Query(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// # POST /api/advisors/register
pub async fn register(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let request = body(payload)?;
    state.desk.authenticate(user_id).await?;

    let advisor = state
        .desk
        .registry
        .register_advisor(user_id, request.commission_rate, request.description)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Advisor registered successfully",
            "advisor": {
                "id": advisor.id,
                "advisor_code": advisor.advisor_code,
                "commission_rate": advisor.commission_rate,
                "description": advisor.description,
            }
        })),
    ))
}

/// # POST /api/advisors/link-client
pub async fn link_client(
    State(state): State<AppState>,
    Caller(client_id): Caller,
    payload: Result<Json<LinkRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let request = body(payload)?;
    state.desk.authenticate(client_id).await?;

    let receipt = state
        .desk
        .registry
        .link_client_to_advisor(client_id, &request.advisor_code)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Successfully linked to advisor",
        "link_id": receipt.link.id,
        "advisor": receipt.advisor,
    })))
}

/// # POST /api/advisors/unlink-client
pub async fn unlink_client(
    State(state): State<AppState>,
    Caller(client_id): Caller,
    payload: Result<Json<UnlinkRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let request = body(payload)?;
    state.desk.authenticate(client_id).await?;

    state
        .desk
        .registry
        .unlink_client_from_advisor(client_id, request.advisor_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Successfully unlinked from advisor",
    })))
}

/// # POST /api/advisors/group-trade
pub async fn group_trade(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    payload: Result<Json<GroupTradeIntent>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let advisor = state.desk.require_advisor(user_id).await?;
    let intent = body(payload)?;

    let outcome = state
        .desk
        .executor
        .execute_group_trade(advisor.id, intent)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Group trade executed successfully",
        "result": outcome,
    })))
}

/// # GET /api/advisors/earnings?period=30d
pub async fn earnings(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    params: Result<Query<EarningsQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let advisor = state.desk.require_advisor(user_id).await?;
    let period = match query(params)?.period {
        Some(raw) => raw.parse::<EarningsPeriod>()?,
        None => state.desk.default_period(),
    };

    let report = state
        .desk
        .ledger
        .get_advisor_earnings(advisor.id, period)
        .await?;

    Ok(Json(json!({ "success": true, "earnings": report })))
}

/// # GET /api/advisors/clients
pub async fn clients(
    State(state): State<AppState>,
    Caller(user_id): Caller,
) -> ApiResult<Json<Value>> {
    let advisor = state.desk.require_advisor(user_id).await?;
    let clients = state.desk.clients(advisor.id).await?;
    Ok(Json(json!({ "success": true, "clients": clients })))
}

/// # GET /api/advisors/group-trades?page=1&limit=20
pub async fn group_trades(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    params: Result<Query<Pagination>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let advisor = state.desk.require_advisor(user_id).await?;
    let pagination = query(params)?;

    let history = state
        .desk
        .executor
        .history(
            advisor.id,
            pagination.page.unwrap_or(1),
            pagination.limit.unwrap_or(state.config.default_page_size),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "history": history.trades,
        "pagination": {
            "page": history.page,
            "limit": history.limit,
            "total": history.total,
            "total_pages": history.total_pages,
        }
    })))
}

/// # GET /api/advisors/stats/overview
pub async fn stats_overview(
    State(state): State<AppState>,
    Caller(user_id): Caller,
) -> ApiResult<Json<Value>> {
    let advisor = state.desk.require_advisor(user_id).await?;
    let stats = state.desk.stats(&advisor).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// # PUT /api/advisors/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let advisor = state.desk.require_advisor(user_id).await?;
    let request = body(payload)?;

    let updated = state
        .desk
        .registry
        .update_profile(advisor.id, request.description, request.commission_rate)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Advisor profile updated successfully",
        "advisor": updated,
    })))
}

/// # GET /api/advisors/{code}
/// Public; no identity required.
pub async fn advisor_profile(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Value>> {
    let profile = state.desk.registry.get_advisor_by_code(&code).await?;
    Ok(Json(json!({ "success": true, "advisor": profile })))
}

/// # GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// # GET /metrics
pub async fn metrics() -> impl IntoResponse {
    match groupdesk_telemetry::gather_text() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
