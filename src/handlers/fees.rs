use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::Actor;
use crate::error::AppError;
use crate::handlers::Payload;
use crate::services::FeeService;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssessFees {
    pub month: String,
}

#[derive(Debug, Deserialize)]
pub struct FeeFilter {
    pub month: Option<String>,
    pub account_id: Option<Uuid>,
}

fn service(state: &AppState) -> FeeService {
    FeeService::new(state.db.clone(), state.config.management_fee_rate.clone())
}

pub async fn assess_fees(
    State(state): State<AppState>,
    actor: Actor,
    Payload(input): Payload<AssessFees>,
) -> Result<impl IntoResponse, AppError> {
    let fees = service(&state).assess(&actor, &input.month).await?;
    Ok((StatusCode::CREATED, Json(fees)))
}

pub async fn list_fees(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<FeeFilter>,
) -> Result<impl IntoResponse, AppError> {
    let fees = service(&state)
        .list(&actor, filter.month.as_deref(), filter.account_id)
        .await?;
    Ok(Json(fees))
}
