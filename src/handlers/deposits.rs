use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Actor, RequestStatus};
use crate::error::AppError;
use crate::handlers::{Decline, Pagination, Payload, VersionedAction};
use crate::services::deposits::NewDeposit;
use crate::services::DepositService;
use crate::AppState;

/// Filters shared by the deposit and withdrawal listings.
#[derive(Debug, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub account_id: Option<Uuid>,
}

pub async fn submit_deposit(
    State(state): State<AppState>,
    actor: Actor,
    Payload(input): Payload<NewDeposit>,
) -> Result<impl IntoResponse, AppError> {
    let deposit = DepositService::new(state.db.clone()).submit(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(deposit)))
}

pub async fn list_deposits(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<RequestFilter>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let deposits = DepositService::new(state.db.clone())
        .list(&actor, filter.status, filter.account_id, page.limit(), page.offset())
        .await?;
    Ok(Json(deposits))
}

pub async fn get_deposit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let deposit = DepositService::new(state.db.clone()).get(&actor, id).await?;
    Ok(Json(deposit))
}

pub async fn approve_deposit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(action): Payload<VersionedAction>,
) -> Result<impl IntoResponse, AppError> {
    let deposit = DepositService::new(state.db.clone())
        .approve(&actor, id, action.expected_version)
        .await?;
    Ok(Json(deposit))
}

pub async fn decline_deposit(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(decline): Payload<Decline>,
) -> Result<impl IntoResponse, AppError> {
    let deposit = DepositService::new(state.db.clone())
        .decline(&actor, id, decline.expected_version, &decline.reason)
        .await?;
    Ok(Json(deposit))
}
