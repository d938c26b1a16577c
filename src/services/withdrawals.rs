use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_NOTIFICATION, ENTITY_WITHDRAWAL};
use crate::db::models::{InvestorAccount, PaymentNotification, WithdrawalRequest};
use crate::db::queries;
use crate::domain::{Actor, NotificationKind, Permission, Priority, RequestStatus};
use crate::error::AppError;
use crate::services::{authorize, ensure_account_access, stale, to_json};
use crate::validation::{clean_text, validate_money, REASON_MAX_LEN};

const SUBJECT: &str = "Withdrawal request";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewWithdrawal {
    pub account_id: Uuid,
    pub amount: BigDecimal,
    pub urgency: Priority,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalApproval {
    pub withdrawal: WithdrawalRequest,
    pub notification: PaymentNotification,
}

fn ensure_covered(account: &InvestorAccount, amount: &BigDecimal) -> Result<(), AppError> {
    if amount > &account.current_balance {
        return Err(AppError::Validation(format!(
            "insufficient funds: account {} has {}, requested {}",
            account.account_number, account.current_balance, amount
        )));
    }
    Ok(())
}

pub struct WithdrawalService {
    pool: PgPool,
}

impl WithdrawalService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(
        &self,
        actor: &Actor,
        input: NewWithdrawal,
    ) -> Result<WithdrawalRequest, AppError> {
        authorize(actor, Permission::SubmitRequest)?;
        validate_money("amount", &input.amount)?;

        let mut tx = self.pool.begin().await?;
        let account = queries::get_account(&mut *tx, input.account_id)
            .await
            .map_err(AppError::not_found("Investor account", input.account_id))?;
        ensure_account_access(&mut *tx, actor, input.account_id).await?;
        ensure_covered(&account, &input.amount)?;

        let withdrawal = queries::insert_withdrawal(
            &mut *tx,
            input.account_id,
            &input.amount,
            input.urgency.as_str(),
            &actor.email,
        )
        .await?;
        AuditLog::log_creation(
            &mut tx,
            withdrawal.id,
            ENTITY_WITHDRAWAL,
            to_json(&withdrawal)?,
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            withdrawal_id = %withdrawal.id,
            withdrawal_number = %withdrawal.withdrawal_number,
            amount = %withdrawal.amount,
            "withdrawal request submitted"
        );
        Ok(withdrawal)
    }

    /// Approves a pending withdrawal and raises its payment notification.
    /// No money moves until the notification is processed.
    pub async fn approve(
        &self,
        actor: &Actor,
        id: Uuid,
        expected_version: i32,
    ) -> Result<WithdrawalApproval, AppError> {
        authorize(actor, Permission::ReviewRequest)?;

        let mut tx = self.pool.begin().await?;
        let claimed = queries::transition_withdrawal(
            &mut *tx,
            id,
            Some(expected_version),
            RequestStatus::Pending.as_str(),
            RequestStatus::Approved.as_str(),
            &actor.email,
            None,
        )
        .await?;

        let withdrawal = match claimed {
            Some(withdrawal) => withdrawal,
            None => return Err(reject(&mut tx, id, expected_version).await),
        };

        let account = queries::get_account(&mut *tx, withdrawal.account_id).await?;
        ensure_covered(&account, &withdrawal.amount)?;

        let notification = queries::insert_notification(
            &mut *tx,
            NotificationKind::Withdrawal.as_str(),
            None,
            Some(id),
            &withdrawal.amount,
            &withdrawal.urgency,
        )
        .await?;

        AuditLog::log_transition(
            &mut tx,
            id,
            ENTITY_WITHDRAWAL,
            RequestStatus::Pending.as_str(),
            RequestStatus::Approved.as_str(),
            &actor.email,
        )
        .await?;
        AuditLog::log_creation(
            &mut tx,
            notification.id,
            ENTITY_NOTIFICATION,
            to_json(&notification)?,
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            withdrawal_id = %id,
            notification_id = %notification.id,
            from = "pending",
            to = "approved",
            actor = %actor.email,
            "withdrawal approved"
        );
        Ok(WithdrawalApproval {
            withdrawal,
            notification,
        })
    }

    pub async fn decline(
        &self,
        actor: &Actor,
        id: Uuid,
        expected_version: i32,
        reason: &str,
    ) -> Result<WithdrawalRequest, AppError> {
        authorize(actor, Permission::ReviewRequest)?;
        let reason = clean_text("reason", reason, REASON_MAX_LEN)?;

        let mut tx = self.pool.begin().await?;
        let claimed = queries::transition_withdrawal(
            &mut *tx,
            id,
            Some(expected_version),
            RequestStatus::Pending.as_str(),
            RequestStatus::Declined.as_str(),
            &actor.email,
            Some(&reason),
        )
        .await?;

        let withdrawal = match claimed {
            Some(withdrawal) => withdrawal,
            None => return Err(reject(&mut tx, id, expected_version).await),
        };

        AuditLog::log_transition(
            &mut tx,
            id,
            ENTITY_WITHDRAWAL,
            RequestStatus::Pending.as_str(),
            RequestStatus::Declined.as_str(),
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            withdrawal_id = %id,
            from = "pending",
            to = "declined",
            actor = %actor.email,
            "withdrawal declined"
        );
        Ok(withdrawal)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<WithdrawalRequest, AppError> {
        let request = queries::get_withdrawal(&self.pool, id)
            .await
            .map_err(AppError::not_found(SUBJECT, id))?;
        ensure_account_access(&self.pool, actor, request.account_id).await?;
        Ok(request)
    }

    /// Investors only see requests against their own accounts.
    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
        account_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WithdrawalRequest>, AppError> {
        let status = status.map(|s| s.as_str());
        let owner = actor.owner_scope();
        Ok(queries::list_withdrawals(&self.pool, status, account_id, owner, limit, offset).await?)
    }
}

async fn reject(
    tx: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    expected_version: i32,
) -> AppError {
    match queries::get_withdrawal(&mut **tx, id).await {
        Ok(current) => stale(
            SUBJECT,
            id,
            &current.status,
            current.version,
            RequestStatus::Pending.as_str(),
            Some(expected_version),
        ),
        Err(e) => AppError::not_found(SUBJECT, id)(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn account(balance: &str) -> InvestorAccount {
        let balance = BigDecimal::from_str(balance).unwrap();
        InvestorAccount {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            account_name: "Growth".to_string(),
            account_number: "ACC-10000001".to_string(),
            total_invested: balance.clone(),
            total_withdrawn: BigDecimal::from(0),
            total_interest: BigDecimal::from(0),
            total_fees: BigDecimal::from(0),
            current_balance: balance,
            total_realised_interest: BigDecimal::from(0),
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn balance_must_cover_withdrawal() {
        let account = account("8000.00");
        assert!(ensure_covered(&account, &BigDecimal::from(8000)).is_ok());

        let err = ensure_covered(&account, &BigDecimal::from_str("8000.01").unwrap()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[test]
    fn urgency_parses_from_body() {
        let id = Uuid::nil();
        let body = format!(r#"{{"account_id": "{}", "amount": "150.50", "urgency": "high"}}"#, id);
        let parsed: NewWithdrawal = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.urgency, Priority::High);
        assert_eq!(parsed.amount, BigDecimal::from_str("150.50").unwrap());
    }
}
