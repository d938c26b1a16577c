//! The request lifecycle. Every operation that changes state runs in one
//! database transaction and writes its audit rows inside it.

pub mod applications;
pub mod deposits;
pub mod fees;
pub mod investors;
pub mod ledger;
pub mod payments;
pub mod summary;
pub mod withdrawals;

pub use applications::ApplicationService;
pub use deposits::DepositService;
pub use fees::FeeService;
pub use investors::InvestorService;
pub use ledger::LedgerService;
pub use payments::{PaymentService, PaymentSummary};
pub use summary::SummaryService;
pub use withdrawals::WithdrawalService;

use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::models::InvestorProfile;
use crate::db::queries;
use crate::domain::{Actor, Permission};
use crate::error::AppError;

pub(crate) fn authorize(actor: &Actor, permission: Permission) -> Result<(), AppError> {
    if actor.may(permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' may not perform {:?}",
            actor.role, permission
        )))
    }
}

/// Confines investors to accounts held under their own profile.
pub(crate) async fn ensure_account_access<'e, E: PgExecutor<'e>>(
    executor: E,
    actor: &Actor,
    account_id: Uuid,
) -> Result<(), AppError> {
    let Some(email) = actor.owner_scope() else {
        return Ok(());
    };

    let owner = queries::account_owner_email(executor, account_id)
        .await
        .map_err(AppError::not_found("Investor account", account_id))?;
    if owner != email {
        tracing::warn!(
            %account_id,
            actor = %actor.email,
            "access to another investor's account refused"
        );
        return Err(AppError::Forbidden(format!(
            "account {} belongs to another investor",
            account_id
        )));
    }

    Ok(())
}

pub(crate) fn ensure_profile_access(
    actor: &Actor,
    profile: &InvestorProfile,
) -> Result<(), AppError> {
    match actor.owner_scope() {
        Some(email) if email != profile.email => Err(AppError::Forbidden(format!(
            "investor profile {} belongs to another investor",
            profile.id
        ))),
        _ => Ok(()),
    }
}

/// Builds the error for a conditional update that matched no row although
/// the record exists.
pub(crate) fn stale(
    subject: &str,
    id: Uuid,
    status: &str,
    version: i32,
    expected_status: &str,
    expected_version: Option<i32>,
) -> AppError {
    if status != expected_status {
        tracing::warn!(%id, subject, status, expected_status, "transition rejected");
        return AppError::Conflict(format!(
            "{} {} is {}, expected {}",
            subject, id, status, expected_status
        ));
    }

    tracing::warn!(%id, subject, version, ?expected_version, "stale version");
    AppError::Conflict(format!(
        "{} {} was changed concurrently (now at version {}), refresh and retry",
        subject, id, version
    ))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn authorize_rejects_other_roles() {
        let investor = Actor::new("ana@example.com", Role::Investor);
        assert!(authorize(&investor, Permission::SubmitRequest).is_ok());

        let err = authorize(&investor, Permission::ReviewRequest).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn stale_reports_status_mismatch_before_version() {
        let id = uuid::Uuid::nil();
        let err = stale("Deposit request", id, "approved", 2, "pending", Some(1));
        assert_eq!(
            err.to_string(),
            format!("Conflict: Deposit request {} is approved, expected pending", id)
        );
        assert!(err.is_retryable());
    }
}
