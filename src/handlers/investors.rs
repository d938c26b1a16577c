use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::Actor;
use crate::error::AppError;
use crate::handlers::{Pagination, Payload};
use crate::services::investors::NewInvestor;
use crate::services::{InvestorService, LedgerService};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAccount {
    pub account_name: String,
}

pub async fn create_investor(
    State(state): State<AppState>,
    actor: Actor,
    Payload(input): Payload<NewInvestor>,
) -> Result<impl IntoResponse, AppError> {
    let profile = InvestorService::new(state.db.clone()).create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn list_investors(
    State(state): State<AppState>,
    actor: Actor,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let profiles = InvestorService::new(state.db.clone())
        .list(&actor, page.limit(), page.offset())
        .await?;
    Ok(Json(profiles))
}

pub async fn get_investor(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let investor = InvestorService::new(state.db.clone()).get(&actor, id).await?;
    Ok(Json(investor))
}

pub async fn open_account(
    State(state): State<AppState>,
    actor: Actor,
    Path(profile_id): Path<Uuid>,
    Payload(input): Payload<OpenAccount>,
) -> Result<impl IntoResponse, AppError> {
    let account = InvestorService::new(state.db.clone())
        .open_account(&actor, profile_id, &input.account_name)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_account(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let account = InvestorService::new(state.db.clone()).get_account(&actor, id).await?;
    Ok(Json(account))
}

pub async fn list_account_transactions(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let entries = LedgerService::new(state.db.clone())
        .list_transactions(&actor, id, page.limit(), page.offset())
        .await?;
    Ok(Json(entries))
}

pub async fn verify_account(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let reconciliation = LedgerService::new(state.db.clone()).verify_account(&actor, id).await?;
    Ok(Json(reconciliation))
}
