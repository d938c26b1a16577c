use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Actor, NotificationKind, NotificationStatus};
use crate::error::AppError;
use crate::handlers::{Pagination, Payload, VersionedAction};
use crate::services::payments::ProcessPayment;
use crate::services::PaymentService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PaymentFilter {
    pub status: Option<NotificationStatus>,
    pub kind: Option<NotificationKind>,
}

pub async fn list_payments(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<PaymentFilter>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let notifications = PaymentService::new(state.db.clone())
        .list(&actor, filter.status, filter.kind, page.limit(), page.offset())
        .await?;
    Ok(Json(notifications))
}

pub async fn payment_summary(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let summary = PaymentService::new(state.db.clone()).summary(&actor).await?;
    Ok(Json(summary))
}

pub async fn get_payment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let notification = PaymentService::new(state.db.clone()).get(&actor, id).await?;
    Ok(Json(notification))
}

pub async fn process_payment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(input): Payload<ProcessPayment>,
) -> Result<impl IntoResponse, AppError> {
    let notification = PaymentService::new(state.db.clone())
        .process(&actor, id, input)
        .await?;
    Ok(Json(notification))
}

pub async fn cancel_payment(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Payload(action): Payload<VersionedAction>,
) -> Result<impl IntoResponse, AppError> {
    let notification = PaymentService::new(state.db.clone())
        .cancel(&actor, id, action.expected_version)
        .await?;
    Ok(Json(notification))
}
