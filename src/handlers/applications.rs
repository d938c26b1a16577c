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
use crate::handlers::{Pagination, Payload, VersionedAction};
use crate::services::applications::{NewApplication, Review};
use crate::services::ApplicationService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<RequestStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FundRequest {
    pub account_ids: Vec<Uuid>,
}

pub async fn submit_application(
    State(state): State<AppState>,
    actor: Actor,
    Payload(input): Payload<NewApplication>,
) -> Result<impl IntoResponse, AppError> {
    let application = ApplicationService::new(state.db.clone()).submit(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn list_applications(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<ApplicationFilter>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let applications = ApplicationService::new(state.db.clone())
        .list(&actor, filter.status, page.limit(), page.offset())
        .await?;
    Ok(Json(applications))
}

pub async fn get_application(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let application = ApplicationService::new(state.db.clone()).get(&actor, id).await?;
    Ok(Json(application))
}

pub async fn review_application(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(review): Payload<Review>,
) -> Result<impl IntoResponse, AppError> {
    let application = ApplicationService::new(state.db.clone())
        .review(&actor, id, review)
        .await?;
    Ok(Json(application))
}

pub async fn fund_application(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(request): Payload<FundRequest>,
) -> Result<impl IntoResponse, AppError> {
    let instruction = ApplicationService::new(state.db.clone())
        .instruct_funding(&actor, id, &request.account_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(instruction)))
}

pub async fn settle_application(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(action): Payload<VersionedAction>,
) -> Result<impl IntoResponse, AppError> {
    let settlement = ApplicationService::new(state.db.clone())
        .settle(&actor, id, action.expected_version)
        .await?;
    Ok(Json(settlement))
}

pub async fn list_allocations(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let allocations = ApplicationService::new(state.db.clone()).allocations(&actor, id).await?;
    Ok(Json(allocations))
}
