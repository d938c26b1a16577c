use bigdecimal::BigDecimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_DEPOSIT};
use crate::db::models::DepositRequest;
use crate::db::queries;
use crate::domain::{Actor, EntryKind, Permission, RequestStatus};
use crate::error::AppError;
use crate::services::ledger::{post_entry, Posting};
use crate::services::{authorize, ensure_account_access, stale, to_json};
use crate::validation::{
    clean_optional_text, clean_text, validate_money, REASON_MAX_LEN, REFERENCE_MAX_LEN,
};

const SUBJECT: &str = "Deposit request";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewDeposit {
    pub account_id: Uuid,
    pub amount: BigDecimal,
    pub reference: Option<String>,
}

pub struct DepositService {
    pool: PgPool,
}

impl DepositService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(
        &self,
        actor: &Actor,
        input: NewDeposit,
    ) -> Result<DepositRequest, AppError> {
        authorize(actor, Permission::SubmitRequest)?;
        validate_money("amount", &input.amount)?;
        let reference =
            clean_optional_text("reference", input.reference.as_deref(), REFERENCE_MAX_LEN)?;

        let mut tx = self.pool.begin().await?;
        queries::get_account(&mut *tx, input.account_id)
            .await
            .map_err(AppError::not_found("Investor account", input.account_id))?;
        ensure_account_access(&mut *tx, actor, input.account_id).await?;
        let deposit = queries::insert_deposit(
            &mut *tx,
            input.account_id,
            &input.amount,
            reference.as_deref(),
            &actor.email,
        )
        .await?;
        AuditLog::log_creation(
            &mut tx,
            deposit.id,
            ENTITY_DEPOSIT,
            to_json(&deposit)?,
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            deposit_id = %deposit.id,
            account_id = %deposit.account_id,
            amount = %deposit.amount,
            "deposit request submitted"
        );
        Ok(deposit)
    }

    /// Approves a pending deposit and credits the account in the same unit.
    pub async fn approve(
        &self,
        actor: &Actor,
        id: Uuid,
        expected_version: i32,
    ) -> Result<DepositRequest, AppError> {
        authorize(actor, Permission::ReviewRequest)?;

        let mut tx = self.pool.begin().await?;
        let claimed = queries::transition_deposit(
            &mut *tx,
            id,
            expected_version,
            RequestStatus::Pending.as_str(),
            RequestStatus::Approved.as_str(),
            &actor.email,
            None,
        )
        .await?;

        let deposit = match claimed {
            Some(deposit) => deposit,
            None => return Err(reject(&mut tx, id, expected_version).await),
        };

        let (_, entry) = post_entry(
            &mut tx,
            &Posting {
                account_id: deposit.account_id,
                kind: EntryKind::Funding,
                amount: &deposit.amount,
                source_type: ENTITY_DEPOSIT,
                source_id: deposit.id,
            },
            actor,
        )
        .await?;
        let deposit = queries::link_deposit_transaction(&mut *tx, id, entry.id).await?;

        AuditLog::log_transition(
            &mut tx,
            id,
            ENTITY_DEPOSIT,
            RequestStatus::Pending.as_str(),
            RequestStatus::Approved.as_str(),
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            deposit_id = %id,
            transaction_id = %entry.id,
            from = "pending",
            to = "approved",
            actor = %actor.email,
            "deposit approved"
        );
        Ok(deposit)
    }

    pub async fn decline(
        &self,
        actor: &Actor,
        id: Uuid,
        expected_version: i32,
        reason: &str,
    ) -> Result<DepositRequest, AppError> {
        authorize(actor, Permission::ReviewRequest)?;
        let reason = clean_text("reason", reason, REASON_MAX_LEN)?;

        let mut tx = self.pool.begin().await?;
        let claimed = queries::transition_deposit(
            &mut *tx,
            id,
            expected_version,
            RequestStatus::Pending.as_str(),
            RequestStatus::Declined.as_str(),
            &actor.email,
            Some(&reason),
        )
        .await?;

        let deposit = match claimed {
            Some(deposit) => deposit,
            None => return Err(reject(&mut tx, id, expected_version).await),
        };

        AuditLog::log_transition(
            &mut tx,
            id,
            ENTITY_DEPOSIT,
            RequestStatus::Pending.as_str(),
            RequestStatus::Declined.as_str(),
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            deposit_id = %id,
            from = "pending",
            to = "declined",
            actor = %actor.email,
            "deposit declined"
        );
        Ok(deposit)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<DepositRequest, AppError> {
        let request = queries::get_deposit(&self.pool, id)
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
    ) -> Result<Vec<DepositRequest>, AppError> {
        let status = status.map(|s| s.as_str());
        let owner = actor.owner_scope();
        Ok(queries::list_deposits(&self.pool, status, account_id, owner, limit, offset).await?)
    }
}

async fn reject(
    tx: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    expected_version: i32,
) -> AppError {
    match queries::get_deposit(&mut **tx, id).await {
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
