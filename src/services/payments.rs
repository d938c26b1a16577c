//! Payment notifications: the single gate through which money leaves the
//! fund. Processing a notification disburses an RFF or pays out a withdrawal.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_APPLICATION, ENTITY_NOTIFICATION, ENTITY_WITHDRAWAL};
use crate::db::models::PaymentNotification;
use crate::db::queries;
use crate::domain::{
    Actor, AllocationStatus, EntryKind, NotificationKind, NotificationStatus, Permission,
    RequestStatus,
};
use crate::error::AppError;
use crate::services::ledger::{post_entry, Posting};
use crate::services::{authorize, stale};
use crate::validation::{clean_optional_text, REFERENCE_MAX_LEN};

const SUBJECT: &str = "Payment notification";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessPayment {
    pub expected_version: i32,
    /// Where the proof of payment is stored. Opaque to this service.
    pub proof_reference: Option<String>,
}

/// Notification counts for the payment officer's queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub pending: i64,
    pub processed: i64,
    pub cancelled: i64,
}

impl PaymentSummary {
    pub(crate) fn from_counts(counts: &[(String, i64)]) -> Self {
        let mut summary = PaymentSummary::default();
        for (status, count) in counts {
            match status.parse::<NotificationStatus>() {
                Ok(NotificationStatus::Pending) => summary.pending = *count,
                Ok(NotificationStatus::Processed) => summary.processed = *count,
                Ok(NotificationStatus::Cancelled) => summary.cancelled = *count,
                Err(e) => tracing::warn!(error = %e, "ignoring notification count"),
            }
        }
        summary
    }
}

pub struct PaymentService {
    pool: PgPool,
}

impl PaymentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Marks a notification processed and moves the money it stands for.
    ///
    /// For a withdrawal the account is debited only if the balance still
    /// covers the amount; otherwise nothing changes and the notification
    /// stays pending.
    pub async fn process(
        &self,
        actor: &Actor,
        id: Uuid,
        input: ProcessPayment,
    ) -> Result<PaymentNotification, AppError> {
        authorize(actor, Permission::ProcessPayment)?;
        let proof = clean_optional_text(
            "proof_reference",
            input.proof_reference.as_deref(),
            REFERENCE_MAX_LEN,
        )?;

        let mut tx = self.pool.begin().await?;
        let notification = claim(
            &mut tx,
            id,
            input.expected_version,
            NotificationStatus::Processed,
            &actor.email,
            proof.as_deref(),
        )
        .await?;

        match notification_kind(&notification)? {
            NotificationKind::Withdrawal => {
                let withdrawal_id = linked_id(notification.withdrawal_id, id)?;
                let withdrawal = queries::transition_withdrawal(
                    &mut *tx,
                    withdrawal_id,
                    None,
                    RequestStatus::Approved.as_str(),
                    RequestStatus::Processed.as_str(),
                    &actor.email,
                    None,
                )
                .await?
                .ok_or_else(|| no_longer_approved(withdrawal_id))?;

                let (account, entry) = post_entry(
                    &mut tx,
                    &Posting {
                        account_id: withdrawal.account_id,
                        kind: EntryKind::Withdrawal,
                        amount: &withdrawal.amount,
                        source_type: ENTITY_WITHDRAWAL,
                        source_id: withdrawal.id,
                    },
                    actor,
                )
                .await?;
                queries::link_withdrawal_transaction(&mut *tx, withdrawal_id, entry.id).await?;

                AuditLog::log_transition(
                    &mut tx,
                    withdrawal_id,
                    ENTITY_WITHDRAWAL,
                    RequestStatus::Approved.as_str(),
                    RequestStatus::Processed.as_str(),
                    &actor.email,
                )
                .await?;
                tracing::info!(
                    %withdrawal_id,
                    account_id = %account.id,
                    balance_after = %account.current_balance,
                    "withdrawal paid out"
                );
            }
            NotificationKind::RffFunding => {
                let rff_id = linked_id(notification.rff_id, id)?;
                queries::mark_application_funded(&mut *tx, rff_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Conflict(format!(
                            "funding application {} is not awaiting disbursement",
                            rff_id
                        ))
                    })?;
                let disbursed = queries::transition_allocations(
                    &mut *tx,
                    rff_id,
                    AllocationStatus::Pending.as_str(),
                    AllocationStatus::Disbursed.as_str(),
                )
                .await?;
                if disbursed.is_empty() {
                    return Err(AppError::Conflict(format!(
                        "funding application {} has no pending allocations",
                        rff_id
                    )));
                }

                AuditLog::log_field_update(
                    &mut tx,
                    rff_id,
                    ENTITY_APPLICATION,
                    "is_funded",
                    serde_json::Value::Bool(false),
                    serde_json::Value::Bool(true),
                    &actor.email,
                )
                .await?;
                tracing::info!(%rff_id, allocations = disbursed.len(), "funding disbursed");
            }
        }

        AuditLog::log_transition(
            &mut tx,
            id,
            ENTITY_NOTIFICATION,
            NotificationStatus::Pending.as_str(),
            NotificationStatus::Processed.as_str(),
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            notification_id = %id,
            kind = %notification.kind,
            from = "pending",
            to = "processed",
            actor = %actor.email,
            "payment processed"
        );
        Ok(notification)
    }

    /// Cancels a pending notification. A cancelled withdrawal is final; a
    /// cancelled RFF disbursement releases its allocations so funding can be
    /// instructed again.
    pub async fn cancel(
        &self,
        actor: &Actor,
        id: Uuid,
        expected_version: i32,
    ) -> Result<PaymentNotification, AppError> {
        authorize(actor, Permission::ProcessPayment)?;

        let mut tx = self.pool.begin().await?;
        let notification = claim(
            &mut tx,
            id,
            expected_version,
            NotificationStatus::Cancelled,
            &actor.email,
            None,
        )
        .await?;

        match notification_kind(&notification)? {
            NotificationKind::Withdrawal => {
                let withdrawal_id = linked_id(notification.withdrawal_id, id)?;
                queries::transition_withdrawal(
                    &mut *tx,
                    withdrawal_id,
                    None,
                    RequestStatus::Approved.as_str(),
                    RequestStatus::Cancelled.as_str(),
                    &actor.email,
                    None,
                )
                .await?
                .ok_or_else(|| no_longer_approved(withdrawal_id))?;
                AuditLog::log_transition(
                    &mut tx,
                    withdrawal_id,
                    ENTITY_WITHDRAWAL,
                    RequestStatus::Approved.as_str(),
                    RequestStatus::Cancelled.as_str(),
                    &actor.email,
                )
                .await?;
            }
            NotificationKind::RffFunding => {
                let rff_id = linked_id(notification.rff_id, id)?;
                let released = queries::transition_allocations(
                    &mut *tx,
                    rff_id,
                    AllocationStatus::Pending.as_str(),
                    AllocationStatus::Cancelled.as_str(),
                )
                .await?;
                tracing::debug!(%rff_id, allocations = released.len(), "allocations released");
            }
        }

        AuditLog::log_transition(
            &mut tx,
            id,
            ENTITY_NOTIFICATION,
            NotificationStatus::Pending.as_str(),
            NotificationStatus::Cancelled.as_str(),
            &actor.email,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            notification_id = %id,
            kind = %notification.kind,
            from = "pending",
            to = "cancelled",
            actor = %actor.email,
            "payment cancelled"
        );
        Ok(notification)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<PaymentNotification, AppError> {
        authorize(actor, Permission::ViewFund)?;
        queries::get_notification(&self.pool, id)
            .await
            .map_err(AppError::not_found(SUBJECT, id))
    }

    /// High priority first, then oldest first.
    pub async fn list(
        &self,
        actor: &Actor,
        status: Option<NotificationStatus>,
        kind: Option<NotificationKind>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentNotification>, AppError> {
        authorize(actor, Permission::ViewFund)?;
        let status = status.map(|s| s.as_str());
        let kind = kind.map(|k| k.as_str());
        Ok(queries::list_notifications(&self.pool, status, kind, limit, offset).await?)
    }

    pub async fn summary(&self, actor: &Actor) -> Result<PaymentSummary, AppError> {
        authorize(actor, Permission::ViewFund)?;
        let counts = queries::count_notifications_by_status(&self.pool).await?;
        Ok(PaymentSummary::from_counts(&counts))
    }
}

async fn claim(
    tx: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    expected_version: i32,
    to: NotificationStatus,
    actor: &str,
    proof_reference: Option<&str>,
) -> Result<PaymentNotification, AppError> {
    let closed = queries::close_notification(
        &mut **tx,
        id,
        expected_version,
        to.as_str(),
        actor,
        proof_reference,
    )
    .await?;
    if let Some(notification) = closed {
        return Ok(notification);
    }

    let current = queries::get_notification(&mut **tx, id)
        .await
        .map_err(AppError::not_found(SUBJECT, id))?;
    Err(stale(
        SUBJECT,
        id,
        &current.status,
        current.version,
        NotificationStatus::Pending.as_str(),
        Some(expected_version),
    ))
}

fn notification_kind(notification: &PaymentNotification) -> Result<NotificationKind, AppError> {
    notification
        .kind
        .parse()
        .map_err(|e: crate::domain::ParseStatusError| AppError::Internal(e.to_string()))
}

fn no_longer_approved(withdrawal_id: Uuid) -> AppError {
    AppError::Conflict(format!("withdrawal {} is no longer approved", withdrawal_id))
}

fn linked_id(linked: Option<Uuid>, notification_id: Uuid) -> Result<Uuid, AppError> {
    linked.ok_or_else(|| {
        AppError::Internal(format!(
            "payment notification {} has no linked record",
            notification_id
        ))
    })
}
