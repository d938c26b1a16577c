use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::domain::Actor;
use crate::error::AppError;
use crate::handlers::deposits::RequestFilter;
use crate::handlers::{Decline, Pagination, Payload, VersionedAction};
use crate::services::withdrawals::NewWithdrawal;
use crate::services::WithdrawalService;
use crate::AppState;

pub async fn submit_withdrawal(
    State(state): State<AppState>,
    actor: Actor,
    Payload(input): Payload<NewWithdrawal>,
) -> Result<impl IntoResponse, AppError> {
    let withdrawal = WithdrawalService::new(state.db.clone()).submit(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(withdrawal)))
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<RequestFilter>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let withdrawals = WithdrawalService::new(state.db.clone())
        .list(&actor, filter.status, filter.account_id, page.limit(), page.offset())
        .await?;
    Ok(Json(withdrawals))
}

pub async fn get_withdrawal(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let withdrawal = WithdrawalService::new(state.db.clone()).get(&actor, id).await?;
    Ok(Json(withdrawal))
}

pub async fn approve_withdrawal(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(action): Payload<VersionedAction>,
) -> Result<impl IntoResponse, AppError> {
    let approval = WithdrawalService::new(state.db.clone())
        .approve(&actor, id, action.expected_version)
        .await?;
    Ok(Json(approval))
}

pub async fn decline_withdrawal(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(decline): Payload<Decline>,
) -> Result<impl IntoResponse, AppError> {
    let withdrawal = WithdrawalService::new(state.db.clone())
        .decline(&actor, id, decline.expected_version, &decline.reason)
        .await?;
    Ok(Json(withdrawal))
}
