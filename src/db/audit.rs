//! Audit trail written inside the same database transaction as the change
//! it records.

use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

use crate::db::models::AuditEntry;

pub const ENTITY_APPLICATION: &str = "rff_application";
pub const ENTITY_ACCOUNT: &str = "investor_account";
pub const ENTITY_PROFILE: &str = "investor_profile";
pub const ENTITY_DEPOSIT: &str = "deposit_request";
pub const ENTITY_WITHDRAWAL: &str = "withdrawal_request";
pub const ENTITY_NOTIFICATION: &str = "payment_notification";
pub const ENTITY_FEE: &str = "management_fee";

pub struct AuditLog;

impl AuditLog {
    pub async fn log_creation(
        executor: &mut SqlxTransaction<'_, Postgres>,
        entity_id: Uuid,
        entity_type: &str,
        new_val: Value,
        actor: &str,
    ) -> sqlx::Result<()> {
        Self::insert(executor, entity_id, entity_type, "created", None, Some(new_val), actor).await
    }

    pub async fn log_transition(
        executor: &mut SqlxTransaction<'_, Postgres>,
        entity_id: Uuid,
        entity_type: &str,
        from: &str,
        to: &str,
        actor: &str,
    ) -> sqlx::Result<()> {
        Self::insert(
            executor,
            entity_id,
            entity_type,
            "status_changed",
            Some(Value::from(from)),
            Some(Value::from(to)),
            actor,
        )
        .await
    }

    pub async fn log_field_update(
        executor: &mut SqlxTransaction<'_, Postgres>,
        entity_id: Uuid,
        entity_type: &str,
        field: &str,
        old_val: Value,
        new_val: Value,
        actor: &str,
    ) -> sqlx::Result<()> {
        let action = format!("{}_updated", field);
        Self::insert(executor, entity_id, entity_type, &action, Some(old_val), Some(new_val), actor)
            .await
    }

    async fn insert(
        executor: &mut SqlxTransaction<'_, Postgres>,
        entity_id: Uuid,
        entity_type: &str,
        action: &str,
        old_val: Option<Value>,
        new_val: Option<Value>,
        actor: &str,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, entity_id, entity_type, action, old_val, new_val, actor)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entity_id)
        .bind(entity_type)
        .bind(action)
        .bind(old_val)
        .bind(new_val)
        .bind(actor)
        .execute(&mut **executor)
        .await?;

        Ok(())
    }
}

pub async fn get_audit_logs(
    pool: &PgPool,
    entity_id: Uuid,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<AuditEntry>> {
    sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT * FROM audit_logs
        WHERE entity_id = $1
        ORDER BY timestamp ASC, id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(entity_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
