use bigdecimal::{BigDecimal, Zero};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_FEE};
use crate::db::models::ManagementFee;
use crate::db::queries;
use crate::domain::money::management_fee;
use crate::domain::{Actor, EntryKind, Permission};
use crate::error::AppError;
use crate::services::ledger::{post_entry, Posting};
use crate::services::{authorize, to_json};
use crate::validation::validate_month;

pub struct FeeService {
    pool: PgPool,
    /// Percent of the balance charged per month.
    rate: BigDecimal,
}

impl FeeService {
    pub fn new(pool: PgPool, rate: BigDecimal) -> Self {
        Self { pool, rate }
    }

    /// Charges the monthly fee on every account not yet assessed for `month`.
    ///
    /// Each account is its own unit of work. Accounts assessed before the
    /// call, or concurrently with it, are skipped.
    pub async fn assess(&self, actor: &Actor, month: &str) -> Result<Vec<ManagementFee>, AppError> {
        authorize(actor, Permission::AssessFees)?;
        validate_month(month)?;
        let month = month.trim();

        let due = queries::list_accounts_due_fee(&self.pool, month).await?;
        let mut fees = Vec::new();
        for account in due {
            if let Some(fee) = self.assess_account(actor, account.id, month).await? {
                fees.push(fee);
            }
        }

        tracing::info!(
            month,
            assessed = fees.len(),
            actor = %actor.email,
            "management fees assessed"
        );
        Ok(fees)
    }

    async fn assess_account(
        &self,
        actor: &Actor,
        account_id: Uuid,
        month: &str,
    ) -> Result<Option<ManagementFee>, AppError> {
        let mut tx = self.pool.begin().await?;
        let account = queries::lock_account(&mut *tx, account_id)
            .await
            .map_err(AppError::not_found("Investor account", account_id))?;

        let amount = management_fee(&account.current_balance, &self.rate);
        if amount <= BigDecimal::zero() {
            return Ok(None);
        }

        let fee_id = Uuid::new_v4();
        let (_, entry) = post_entry(
            &mut tx,
            &Posting {
                account_id,
                kind: EntryKind::Fee,
                amount: &amount,
                source_type: ENTITY_FEE,
                source_id: fee_id,
            },
            actor,
        )
        .await?;

        let inserted = queries::insert_fee(
            &mut *tx,
            fee_id,
            account_id,
            month,
            &account.current_balance,
            &self.rate,
            &amount,
            entry.id,
        )
        .await?;

        // Dropping the transaction rolls the debit back.
        let Some(fee) = inserted else {
            tracing::debug!(%account_id, month, "fee already assessed");
            return Ok(None);
        };

        AuditLog::log_creation(&mut tx, fee.id, ENTITY_FEE, to_json(&fee)?, &actor.email).await?;
        tx.commit().await?;

        tracing::info!(%account_id, month, amount = %fee.fee_amount, "management fee charged");
        Ok(Some(fee))
    }

    /// Investors only see fees charged to their own accounts.
    pub async fn list(
        &self,
        actor: &Actor,
        month: Option<&str>,
        account_id: Option<Uuid>,
    ) -> Result<Vec<ManagementFee>, AppError> {
        if let Some(month) = month {
            validate_month(month)?;
        }
        let month = month.map(str::trim);
        Ok(queries::list_fees(&self.pool, month, account_id, actor.owner_scope()).await?)
    }
}
