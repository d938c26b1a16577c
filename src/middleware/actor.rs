//! Caller attribution from request headers.
//!
//! The caller names itself with `X-Actor-Email` and `X-Actor-Role`. Nothing
//! here proves the claim; it scopes operations by role and records who acted.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::domain::{Actor, Role};
use crate::error::AppError;
use crate::validation::validate_email;

pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = header(parts, ACTOR_EMAIL_HEADER).ok_or_else(|| {
            AppError::Unauthorized(format!("missing {} header", ACTOR_EMAIL_HEADER))
        })?;
        let email = validate_email(email)
            .map_err(|_| AppError::Unauthorized(format!("invalid {} header", ACTOR_EMAIL_HEADER)))?;

        let role = header(parts, ACTOR_ROLE_HEADER)
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", ACTOR_ROLE_HEADER)))?
            .parse::<Role>()
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        Ok(Actor::new(email, role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(email: Option<&str>, role: Option<&str>) -> Result<Actor, AppError> {
        let mut builder = Request::builder().uri("/");
        if let Some(email) = email {
            builder = builder.header(ACTOR_EMAIL_HEADER, email);
        }
        if let Some(role) = role {
            builder = builder.header(ACTOR_ROLE_HEADER, role);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_actor_from_headers() {
        let actor = extract(Some("Ops@Fund.example"), Some("bim_admin")).await.unwrap();
        assert_eq!(actor, Actor::new("ops@fund.example", Role::BimAdmin));
    }

    #[tokio::test]
    async fn missing_or_unknown_role_is_unauthorized() {
        assert!(matches!(
            extract(Some("ops@fund.example"), None).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            extract(Some("ops@fund.example"), Some("root")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            extract(None, Some("ic")).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
