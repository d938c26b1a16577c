use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Whether repeating the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Conflict(_) | AppError::Unavailable(_))
    }

    /// Maps a missing row to `NotFound` with a readable subject.
    pub fn not_found(
        subject: &str,
        id: impl std::fmt::Display,
    ) -> impl FnOnce(sqlx::Error) -> AppError {
        let message = format!("{} {} not found", subject, id);
        move |e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(message),
            other => AppError::from(other),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => {
                return AppError::NotFound("record not found".to_string());
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                return AppError::Unavailable(e.to_string());
            }
            _ => {}
        }

        if let sqlx::Error::Database(db) = &e {
            let code = db.code().map(|c| c.into_owned());
            let message = db.message().to_string();
            match code.as_deref() {
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    return AppError::Conflict(
                        "the record was changed concurrently, refresh and retry".to_string(),
                    );
                }
                Some(UNIQUE_VIOLATION) => return AppError::Conflict(message),
                Some(CHECK_VIOLATION) | Some(NUMERIC_VALUE_OUT_OF_RANGE) => {
                    return AppError::Validation(message);
                }
                _ => {}
            }
        }

        AppError::Database(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
            "retryable": self.is_retryable(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::Validation("Invalid input".to_string());
        assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_conflict_error_is_retryable() {
        let error = AppError::Conflict("version mismatch".to_string());
        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_not_found_error_status_code() {
        let error = AppError::NotFound("Resource not found".to_string());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let error = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let error = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(error.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_not_found_helper_names_subject() {
        let id = uuid::Uuid::nil();
        let error = AppError::not_found("Deposit request", id)(sqlx::Error::RowNotFound);
        assert_eq!(
            error.to_string(),
            format!("Not found: Deposit request {} not found", id)
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let error: AppError = ValidationError::new("amount", "must be greater than zero").into();
        assert_eq!(error.to_string(), "Validation error: amount: must be greater than zero");
    }

    #[test]
    fn test_forbidden_and_unauthorized_status_codes() {
        assert_eq!(
            AppError::Forbidden("role".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Unauthorized("missing actor".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_conflict_error_response() {
        let response = AppError::Conflict("stale".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_database_error_response() {
        let error = AppError::Database(sqlx::Error::WorkerCrashed);
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
