//! Ledger posting and verification.
//!
//! `post_entry` is the only code path that changes an account balance. It
//! applies the entry to the account totals and appends the immutable entry
//! within the caller's transaction.

use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_ACCOUNT};
use crate::db::models::{InvestorAccount, Transaction};
use crate::db::queries::{self, NewEntry};
use crate::domain::ledger::replay;
use crate::domain::{Actor, EntryKind, Permission, Reconciliation};
use crate::error::AppError;
use crate::services::{authorize, ensure_account_access};

/// A balance change waiting to be written.
#[derive(Debug, Clone)]
pub struct Posting<'a> {
    pub account_id: Uuid,
    pub kind: EntryKind,
    pub amount: &'a BigDecimal,
    pub source_type: &'a str,
    pub source_id: Uuid,
}

/// Applies `posting` to its account and appends the ledger entry.
///
/// A debit that would overdraw the account fails with a validation error
/// and leaves the caller's transaction to be rolled back.
pub async fn post_entry(
    tx: &mut SqlxTransaction<'_, Postgres>,
    posting: &Posting<'_>,
    actor: &Actor,
) -> Result<(InvestorAccount, Transaction), AppError> {
    let updated =
        queries::apply_entry_to_account(&mut **tx, posting.account_id, posting.kind, posting.amount)
            .await?;

    let account = match updated {
        Some(account) => account,
        None => {
            let account = queries::get_account(&mut **tx, posting.account_id)
                .await
                .map_err(AppError::not_found("Investor account", posting.account_id))?;
            tracing::warn!(
                account_id = %account.id,
                balance = %account.current_balance,
                requested = %posting.amount,
                "debit rejected"
            );
            return Err(AppError::Validation(format!(
                "insufficient funds: account {} has {}, requested {}",
                account.account_number, account.current_balance, posting.amount
            )));
        }
    };

    let entry = queries::insert_transaction(
        &mut **tx,
        &NewEntry {
            account_id: posting.account_id,
            kind: posting.kind,
            amount: posting.amount,
            balance_after: &account.current_balance,
            source_type: posting.source_type,
            source_id: posting.source_id,
            created_by: &actor.email,
        },
    )
    .await?;

    let previous = if posting.kind.is_credit() {
        &account.current_balance - posting.amount
    } else {
        &account.current_balance + posting.amount
    };
    AuditLog::log_field_update(
        tx,
        account.id,
        ENTITY_ACCOUNT,
        "current_balance",
        serde_json::Value::from(previous.to_string()),
        serde_json::Value::from(account.current_balance.to_string()),
        &actor.email,
    )
    .await?;

    tracing::debug!(
        account_id = %account.id,
        kind = posting.kind.as_str(),
        amount = %posting.amount,
        balance_after = %account.current_balance,
        "ledger entry posted"
    );

    Ok((account, entry))
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountReconciliation {
    pub account_id: Uuid,
    pub account_number: String,
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
}

pub struct LedgerService {
    pool: PgPool,
}

impl LedgerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replays an account's ledger and compares it with the stored totals.
    pub async fn verify_account(
        &self,
        actor: &Actor,
        account_id: Uuid,
    ) -> Result<AccountReconciliation, AppError> {
        authorize(actor, Permission::ViewFund)?;
        self.reconcile(account_id).await
    }

    /// Verifies every account, oldest first.
    pub async fn verify_all(&self, actor: &Actor) -> Result<Vec<AccountReconciliation>, AppError> {
        authorize(actor, Permission::ViewFund)?;
        let ids = queries::list_account_ids(&self.pool).await?;
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            results.push(self.reconcile(id).await?);
        }
        Ok(results)
    }

    async fn reconcile(&self, account_id: Uuid) -> Result<AccountReconciliation, AppError> {
        let mut tx = self.pool.begin().await?;
        // Account row and entries must come from one snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let account = queries::get_account(&mut *tx, account_id)
            .await
            .map_err(AppError::not_found("Investor account", account_id))?;
        let entries = queries::account_ledger(&mut *tx, account_id).await?;
        tx.commit().await?;

        let kinds = entries
            .iter()
            .map(|entry| entry.entry_kind())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let replayed = replay(kinds.into_iter().zip(entries.iter().map(|entry| &entry.amount)));

        let reconciliation = Reconciliation::new(account.balances(), replayed, entries.len());
        if reconciliation.consistent {
            tracing::info!(%account_id, entries = entries.len(), "ledger verified");
        } else {
            tracing::warn!(
                %account_id,
                stored = %account.current_balance,
                replayed = %reconciliation.replayed.current_balance,
                "ledger discrepancy"
            );
        }

        Ok(AccountReconciliation {
            account_id,
            account_number: account.account_number,
            reconciliation,
        })
    }

    pub async fn list_transactions(
        &self,
        actor: &Actor,
        account_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        queries::get_account(&self.pool, account_id)
            .await
            .map_err(AppError::not_found("Investor account", account_id))?;
        ensure_account_access(&self.pool, actor, account_id).await?;
        Ok(queries::list_transactions(&self.pool, account_id, limit, offset).await?)
    }
}
