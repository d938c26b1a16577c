pub mod applications;
pub mod deposits;
pub mod fees;
pub mod investors;
pub mod payments;
pub mod withdrawals;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequest, Path, Query, State},
    http::{Request, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::audit;
use crate::domain::{Actor, Permission};
use crate::error::AppError;
use crate::health::{check_health, PostgresChecker};
use crate::services::{authorize, SummaryService};
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Body of a transition that only needs the version the caller saw.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionedAction {
    pub expected_version: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Decline {
    pub expected_version: i32,
    pub reason: String,
}

/// JSON body extractor whose rejections use the service error format.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S, Body> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Payload(value))
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let postgres = PostgresChecker::new(state.db.clone());
    let response = check_health(&[&postgres], state.started_at).await;

    let status_code = if response.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

pub async fn summary(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse, AppError> {
    let summary = SummaryService::new(state.db.clone()).portfolio(&actor).await?;
    Ok(Json(summary))
}

/// Audit rows of one record, oldest first.
pub async fn audit_trail(
    State(state): State<AppState>,
    actor: Actor,
    Path(entity_id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    authorize(&actor, Permission::ViewFund)?;
    let entries = audit::get_audit_logs(&state.db, entity_id, page.limit(), page.offset()).await?;
    Ok(Json(entries))
}
